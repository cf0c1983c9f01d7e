pub mod assignment;
pub mod attempt;
pub mod points;

pub use assignment::{Assignment, Availability, Choice, Question};
pub use attempt::{Answer, AnswerResponse, Attempt};
pub use points::{Points, PointsError};
