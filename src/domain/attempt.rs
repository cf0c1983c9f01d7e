use serde::Serialize;
use time::{Duration, PrimitiveDateTime};

use crate::db::models::{AnswerRow, AttemptRow};
use crate::db::types::AttemptStatus;
use crate::domain::Points;
use crate::errors::GradebookResult;

#[derive(Debug, Clone)]
pub struct Attempt {
    pub id: String,
    pub assignment_id: String,
    pub user_id: String,
    pub attempt_number: i32,
    pub duration_minutes: i32,
    pub started_at: PrimitiveDateTime,
    pub submitted_at: Option<PrimitiveDateTime>,
    pub status: AttemptStatus,
    pub requires_manual_grading: bool,
    pub max_score: Points,
    pub auto_score: Option<Points>,
    pub final_score: Option<Points>,
    pub teacher_comment: Option<String>,
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub question_id: String,
    pub response: AnswerResponse,
    pub is_correct: Option<bool>,
    pub points_awarded: Option<Points>,
    pub teacher_comment: Option<String>,
}

/// What the student has put down for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AnswerResponse {
    Unanswered,
    Choice(String),
    Text(String),
}

impl Attempt {
    pub(crate) fn from_rows(row: AttemptRow, answer_rows: Vec<AnswerRow>) -> GradebookResult<Self> {
        let answers = answer_rows
            .into_iter()
            .map(Answer::from_row)
            .collect::<GradebookResult<Vec<_>>>()?;

        Ok(Self {
            max_score: Points::from_stored(row.max_score, "assignment_attempts.max_score")?,
            auto_score: row
                .auto_score
                .map(|value| Points::from_stored(value, "assignment_attempts.auto_score"))
                .transpose()?,
            final_score: row
                .final_score
                .map(|value| Points::from_stored(value, "assignment_attempts.final_score"))
                .transpose()?,
            id: row.id,
            assignment_id: row.assignment_id,
            user_id: row.user_id,
            attempt_number: row.attempt_number,
            duration_minutes: row.duration_minutes,
            started_at: row.started_at,
            submitted_at: row.submitted_at,
            status: row.status,
            requires_manual_grading: row.requires_manual_grading,
            teacher_comment: row.teacher_comment,
            answers,
        })
    }

    pub fn deadline(&self) -> PrimitiveDateTime {
        self.started_at + Duration::minutes(i64::from(self.duration_minutes))
    }

    pub fn is_expired(&self, now: PrimitiveDateTime) -> bool {
        now > self.deadline()
    }

    pub fn answer(&self, question_id: &str) -> Option<&Answer> {
        self.answers.iter().find(|answer| answer.question_id == question_id)
    }

    pub fn answer_mut(&mut self, question_id: &str) -> Option<&mut Answer> {
        self.answers.iter_mut().find(|answer| answer.question_id == question_id)
    }

    /// Returns the answer for a question, seeding an empty one when missing.
    pub(crate) fn answer_entry(&mut self, question_id: &str) -> &mut Answer {
        let index = match self.answers.iter().position(|answer| answer.question_id == question_id)
        {
            Some(index) => index,
            None => {
                self.answers.push(Answer::empty(question_id));
                self.answers.len() - 1
            }
        };
        &mut self.answers[index]
    }
}

impl Answer {
    pub fn empty(question_id: &str) -> Self {
        Self {
            question_id: question_id.to_string(),
            response: AnswerResponse::Unanswered,
            is_correct: None,
            points_awarded: None,
            teacher_comment: None,
        }
    }

    fn from_row(row: AnswerRow) -> GradebookResult<Self> {
        Ok(Self {
            points_awarded: row
                .points_awarded
                .map(|value| Points::from_stored(value, "assignment_answers.points_awarded"))
                .transpose()?,
            response: AnswerResponse::from_columns(row.selected_choice_id, row.text_answer),
            question_id: row.question_id,
            is_correct: row.is_correct,
            teacher_comment: row.teacher_comment,
        })
    }
}

impl AnswerResponse {
    pub(crate) fn from_columns(selected_choice_id: Option<String>, text: Option<String>) -> Self {
        match (selected_choice_id, text) {
            (_, Some(text)) => Self::Text(text),
            (Some(choice_id), None) => Self::Choice(choice_id),
            (None, None) => Self::Unanswered,
        }
    }

    pub fn selected_choice_id(&self) -> Option<&str> {
        match self {
            Self::Choice(choice_id) => Some(choice_id.as_str()),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn is_answered(&self) -> bool {
        match self {
            Self::Unanswered => false,
            Self::Choice(_) => true,
            Self::Text(text) => !text.trim().is_empty(),
        }
    }
}
