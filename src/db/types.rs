use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "questionkind", rename_all = "lowercase")]
pub enum QuestionKind {
    Mcq,
    Essay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "assignmentkind", rename_all = "lowercase")]
pub enum AssignmentKind {
    Mcq,
    Essay,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "attemptstatus", rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Submitted,
    Graded,
}

impl QuestionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mcq => "mcq",
            Self::Essay => "essay",
        }
    }
}

impl AssignmentKind {
    /// Mixed when both question kinds are present, otherwise the single kind seen.
    pub fn from_question_kinds(kinds: impl IntoIterator<Item = QuestionKind>) -> Option<Self> {
        let (mut has_mcq, mut has_essay) = (false, false);
        for kind in kinds {
            match kind {
                QuestionKind::Mcq => has_mcq = true,
                QuestionKind::Essay => has_essay = true,
            }
        }

        match (has_mcq, has_essay) {
            (true, true) => Some(Self::Mixed),
            (true, false) => Some(Self::Mcq),
            (false, true) => Some(Self::Essay),
            (false, false) => None,
        }
    }
}

impl AttemptStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Submitted => "submitted",
            Self::Graded => "graded",
        }
    }

    pub fn is_finished(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}
