use std::fmt;

use thiserror::Error;

/// Why a new attempt could not be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptDenial {
    NotOpenYet,
    Closed,
    LimitReached { used: i64, max: i32 },
}

impl fmt::Display for AttemptDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotOpenYet => f.write_str("This assignment is not open yet."),
            Self::Closed => f.write_str("This assignment is closed. You cannot start a new attempt."),
            Self::LimitReached { used, max } => {
                write!(f, "You have reached the attempt limit ({used} / {max}).")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum GradebookError {
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("{}", format_position(.line, .message))]
    Format { line: Option<usize>, message: String },
    #[error("{0}")]
    AttemptNotAllowed(AttemptDenial),
    #[error("{0}")]
    InvalidState(String),
    #[error("Time is over")]
    TimeExpired,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

pub type GradebookResult<T> = Result<T, GradebookError>;

impl GradebookError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }

    pub(crate) fn format_at(line: usize, message: impl Into<String>) -> Self {
        Self::Format { line: Some(line), message: message.into() }
    }

    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format { line: None, message: message.into() }
    }
}

fn format_position(line: &Option<usize>, message: &str) -> String {
    match line {
        Some(line) => format!("line {line}: {message}"),
        None => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denial_messages_match_student_notices() {
        assert_eq!(
            AttemptDenial::LimitReached { used: 1, max: 1 }.to_string(),
            "You have reached the attempt limit (1 / 1)."
        );
        assert_eq!(AttemptDenial::NotOpenYet.to_string(), "This assignment is not open yet.");
    }

    #[test]
    fn format_error_includes_line_when_known() {
        assert_eq!(GradebookError::format_at(4, "Missing Title").to_string(), "line 4: Missing Title");
        assert_eq!(GradebookError::format("Empty file").to_string(), "Empty file");
    }

    #[test]
    fn validation_error_joins_messages() {
        let err = GradebookError::Validation(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "validation failed: a; b");
    }
}
