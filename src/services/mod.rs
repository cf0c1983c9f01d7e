pub mod assignment_import;
pub(crate) mod assignment_store;
pub mod assignment_validation;
pub(crate) mod attempt_lifecycle;
pub mod attempts;
pub mod authoring;
pub mod grading;
pub mod scoring;
