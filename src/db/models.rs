use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{AssignmentKind, AttemptStatus, QuestionKind};

#[derive(Debug, Clone, FromRow)]
pub(crate) struct AssignmentRow {
    pub(crate) id: String,
    pub(crate) class_id: String,
    pub(crate) created_by: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    #[allow(dead_code)]
    pub(crate) kind: AssignmentKind,
    pub(crate) duration_minutes: i32,
    pub(crate) max_attempts: i32,
    pub(crate) total_points: i32,
    pub(crate) open_at: Option<PrimitiveDateTime>,
    pub(crate) close_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct QuestionRow {
    pub(crate) id: String,
    pub(crate) assignment_id: String,
    pub(crate) kind: QuestionKind,
    pub(crate) prompt: String,
    pub(crate) points: f64,
    pub(crate) order_index: i32,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct ChoiceRow {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) text: String,
    pub(crate) is_correct: bool,
    pub(crate) order_index: i32,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct AttemptRow {
    pub(crate) id: String,
    pub(crate) assignment_id: String,
    pub(crate) user_id: String,
    pub(crate) attempt_number: i32,
    pub(crate) duration_minutes: i32,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) submitted_at: Option<PrimitiveDateTime>,
    pub(crate) status: AttemptStatus,
    pub(crate) requires_manual_grading: bool,
    pub(crate) max_score: f64,
    pub(crate) auto_score: Option<f64>,
    pub(crate) final_score: Option<f64>,
    pub(crate) teacher_comment: Option<String>,
    #[allow(dead_code)]
    pub(crate) created_at: PrimitiveDateTime,
    #[allow(dead_code)]
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct AnswerRow {
    #[allow(dead_code)]
    pub(crate) id: String,
    pub(crate) attempt_id: String,
    pub(crate) question_id: String,
    pub(crate) selected_choice_id: Option<String>,
    pub(crate) text_answer: Option<String>,
    pub(crate) is_correct: Option<bool>,
    pub(crate) points_awarded: Option<f64>,
    pub(crate) teacher_comment: Option<String>,
    #[allow(dead_code)]
    pub(crate) updated_at: PrimitiveDateTime,
}
