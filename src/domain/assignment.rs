use std::collections::HashMap;

use serde::Serialize;
use time::PrimitiveDateTime;

use crate::db::models::{AssignmentRow, ChoiceRow, QuestionRow};
use crate::db::types::{AssignmentKind, QuestionKind};
use crate::domain::Points;
use crate::errors::GradebookResult;

/// An assignment with its questions in order.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub id: String,
    pub class_id: String,
    pub created_by: String,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub max_attempts: i32,
    pub total_points: i32,
    pub open_at: Option<PrimitiveDateTime>,
    pub close_at: Option<PrimitiveDateTime>,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone)]
pub struct Question {
    pub id: String,
    pub kind: QuestionKind,
    pub prompt: String,
    pub points: Points,
    pub order: i32,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone)]
pub struct Choice {
    pub id: String,
    pub text: String,
    pub is_correct: bool,
    pub order: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    NotOpen,
    Open,
    Closed,
}

impl Assignment {
    pub(crate) fn from_rows(
        row: AssignmentRow,
        question_rows: Vec<QuestionRow>,
        choice_rows: Vec<ChoiceRow>,
    ) -> GradebookResult<Self> {
        let mut choices_by_question: HashMap<String, Vec<Choice>> = HashMap::new();
        for choice in choice_rows {
            choices_by_question.entry(choice.question_id).or_default().push(Choice {
                id: choice.id,
                text: choice.text,
                is_correct: choice.is_correct,
                order: choice.order_index,
            });
        }

        let mut questions = Vec::with_capacity(question_rows.len());
        for question in question_rows {
            let mut choices = choices_by_question.remove(&question.id).unwrap_or_default();
            choices.sort_by_key(|choice| choice.order);
            questions.push(Question {
                points: Points::from_stored(question.points, "assignment_questions.points")?,
                id: question.id,
                kind: question.kind,
                prompt: question.prompt,
                order: question.order_index,
                choices,
            });
        }
        questions.sort_by_key(|question| question.order);

        Ok(Self {
            id: row.id,
            class_id: row.class_id,
            created_by: row.created_by,
            title: row.title,
            description: row.description,
            duration_minutes: row.duration_minutes,
            max_attempts: row.max_attempts,
            total_points: row.total_points,
            open_at: row.open_at,
            close_at: row.close_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            questions,
        })
    }

    /// Derived from the question list; `None` only for an assignment without questions.
    pub fn kind(&self) -> Option<AssignmentKind> {
        AssignmentKind::from_question_kinds(self.questions.iter().map(|question| question.kind))
    }

    pub fn max_score(&self) -> Points {
        self.questions.iter().map(|question| question.points).sum()
    }

    pub fn has_essay(&self) -> bool {
        self.questions.iter().any(|question| question.kind == QuestionKind::Essay)
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == question_id)
    }

    pub fn questions_of(&self, kind: QuestionKind) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(move |question| question.kind == kind)
    }

    /// The window is inclusive at both ends; a missing bound is unbounded.
    pub fn availability(&self, now: PrimitiveDateTime) -> Availability {
        if self.open_at.is_some_and(|open_at| now < open_at) {
            return Availability::NotOpen;
        }
        if self.close_at.is_some_and(|close_at| now > close_at) {
            return Availability::Closed;
        }
        Availability::Open
    }

    /// Finished attempts may be reviewed only once the close instant has passed.
    pub fn review_open(&self, now: PrimitiveDateTime) -> bool {
        self.close_at.is_some_and(|close_at| close_at <= now)
    }
}

impl Question {
    pub fn correct_choice_id(&self) -> Option<&str> {
        self.choices.iter().find(|choice| choice.is_correct).map(|choice| choice.id.as_str())
    }

    pub fn choice(&self, choice_id: &str) -> Option<&Choice> {
        self.choices.iter().find(|choice| choice.id == choice_id)
    }
}
