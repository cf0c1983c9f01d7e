use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::types::{AttemptStatus, QuestionKind};
use crate::domain::{AnswerResponse, Points};

/// One response from the take view. Length and membership are checked when it is applied.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveAnswerInput {
    pub question_id: String,
    #[serde(default)]
    pub selected_choice_id: Option<String>,
    #[serde(default)]
    pub text_answer: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EssayGradeInput {
    pub question_id: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    #[validate(length(max = 8000, message = "Comment must be at most 8000 characters."))]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct GradeSubmission {
    #[serde(default)]
    #[validate(nested)]
    pub essays: Vec<EssayGradeInput>,
    #[serde(default)]
    #[validate(length(max = 8000, message = "Teacher comment must be at most 8000 characters."))]
    pub teacher_comment: Option<String>,
}

/// Per-part scores of one attempt, as shown in history and submission lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub mcq_correct: usize,
    pub mcq_total: usize,
    pub mcq_score: Points,
    pub mcq_max: Points,
    /// `None` while essays still await grading.
    pub essay_score: Option<Points>,
    pub essay_max: Points,
    pub final_score: Option<Points>,
    pub final_max: Points,
}

#[derive(Debug, Clone, Serialize)]
pub struct TakeAttemptView {
    pub attempt_id: String,
    pub assignment_id: String,
    pub title: String,
    pub description: Option<String>,
    pub attempt_number: i32,
    pub status: AttemptStatus,
    pub started_at: String,
    pub due_at: String,
    pub expired: bool,
    pub answered_count: usize,
    pub question_count: usize,
    pub questions: Vec<TakeQuestionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TakeQuestionView {
    pub question_id: String,
    pub order: i32,
    pub kind: QuestionKind,
    pub prompt: String,
    pub points: Points,
    pub choices: Vec<TakeChoiceView>,
    pub response: AnswerResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct TakeChoiceView {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptSummary {
    pub attempt_id: String,
    pub attempt_number: i32,
    pub started_at: String,
    pub submitted_at: Option<String>,
    pub duration_minutes: i32,
    pub status: AttemptStatus,
    pub requires_manual_grading: bool,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptHistory {
    pub assignment_id: String,
    pub title: String,
    pub max_attempts: i32,
    pub review_open: bool,
    pub attempts: Vec<AttemptSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionItem {
    pub user_id: String,
    #[serde(flatten)]
    pub attempt: AttemptSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionsView {
    pub assignment_id: String,
    pub title: String,
    pub total_points: i32,
    pub submissions: Vec<SubmissionItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GradeAttemptView {
    pub assignment_id: String,
    pub title: String,
    pub attempt_id: String,
    pub attempt_number: i32,
    pub user_id: String,
    pub started_at: String,
    pub submitted_at: Option<String>,
    pub status: AttemptStatus,
    pub breakdown: ScoreBreakdown,
    pub essays: Vec<GradeEssayItem>,
    pub teacher_comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GradeEssayItem {
    pub question_id: String,
    pub order: i32,
    pub prompt: String,
    pub max_points: Points,
    pub student_answer: Option<String>,
    pub score: Option<Points>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptReview {
    pub assignment_id: String,
    pub title: String,
    pub attempt_id: String,
    pub attempt_number: i32,
    pub status: AttemptStatus,
    pub submitted_at: Option<String>,
    pub breakdown: ScoreBreakdown,
    pub teacher_comment: Option<String>,
    pub questions: Vec<ReviewQuestion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewQuestion {
    pub question_id: String,
    pub order: i32,
    pub kind: QuestionKind,
    pub prompt: String,
    pub points: Points,
    pub choices: Vec<ReviewChoice>,
    pub text_answer: Option<String>,
    pub is_correct: Option<bool>,
    pub points_awarded: Option<Points>,
    pub teacher_comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewChoice {
    pub id: String,
    pub text: String,
    pub is_correct: bool,
    pub selected: bool,
}
