pub(crate) mod answers;
pub(crate) mod assignments;
pub(crate) mod attempts;
pub(crate) mod questions;
