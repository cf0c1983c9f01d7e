use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use validator::Validate;

use crate::db::types::{AssignmentKind, QuestionKind};
use crate::domain::{Assignment, Availability, Points};

pub const DEFAULT_DURATION_MINUTES: i32 = 30;
pub const DEFAULT_MAX_ATTEMPTS: i32 = 1;
pub const DEFAULT_TOTAL_POINTS: i32 = 100;
const NEW_QUESTION_CHOICES: usize = 4;

/// Editable form of an assignment, shared by the authoring form and the text import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AssignmentDraft {
    #[validate(length(max = 160, message = "Title must be at most 160 characters."))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 400, message = "Description must be at most 400 characters."))]
    pub description: Option<String>,
    #[serde(default = "default_duration_minutes")]
    #[validate(range(min = 1, max = 600, message = "Duration must be between 1 and 600 minutes."))]
    pub duration_minutes: i32,
    #[serde(default = "default_max_attempts")]
    #[validate(range(min = 1, max = 20, message = "Max attempts must be between 1 and 20."))]
    pub max_attempts: i32,
    #[serde(default = "default_total_points")]
    pub total_points: i32,
    #[serde(default)]
    pub open_at: Option<PrimitiveDateTime>,
    #[serde(default)]
    pub close_at: Option<PrimitiveDateTime>,
    #[serde(default)]
    #[validate(nested)]
    pub questions: Vec<QuestionDraft>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct QuestionDraft {
    pub kind: QuestionKind,
    #[validate(length(max = 1000, message = "Prompt must be at most 1000 characters."))]
    pub prompt: String,
    pub points: f64,
    #[serde(default)]
    #[validate(nested)]
    pub choices: Vec<ChoiceDraft>,
    #[serde(default)]
    pub correct_index: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ChoiceDraft {
    #[validate(length(max = 400, message = "Choice text must be at most 400 characters."))]
    pub text: String,
}

fn default_duration_minutes() -> i32 {
    DEFAULT_DURATION_MINUTES
}

fn default_max_attempts() -> i32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_total_points() -> i32 {
    DEFAULT_TOTAL_POINTS
}

impl AssignmentDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            duration_minutes: DEFAULT_DURATION_MINUTES,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            total_points: DEFAULT_TOTAL_POINTS,
            open_at: None,
            close_at: None,
            questions: Vec::new(),
        }
    }

    pub fn kind(&self) -> Option<AssignmentKind> {
        AssignmentKind::from_question_kinds(self.questions.iter().map(|question| question.kind))
    }

    pub fn apply(&mut self, op: DesignerOp) {
        match op {
            DesignerOp::AddQuestion => self.questions.push(QuestionDraft::blank_mcq()),
            DesignerOp::RemoveQuestion { question } => {
                if question < self.questions.len() {
                    self.questions.remove(question);
                }
            }
            DesignerOp::AddChoice { question } => {
                if let Some(question) = self.questions.get_mut(question) {
                    question.choices.push(ChoiceDraft::default());
                }
            }
            DesignerOp::RemoveChoice { question, choice } => {
                if let Some(question) = self.questions.get_mut(question) {
                    if choice < question.choices.len() {
                        question.choices.remove(choice);
                        let len = question.choices.len() as i32;
                        if question.correct_index >= len {
                            question.correct_index = (len - 1).max(0);
                        }
                    }
                }
            }
        }
    }
}

impl QuestionDraft {
    pub fn blank_mcq() -> Self {
        Self {
            kind: QuestionKind::Mcq,
            prompt: String::new(),
            points: 1.0,
            choices: vec![ChoiceDraft::default(); NEW_QUESTION_CHOICES],
            correct_index: 0,
        }
    }

    /// The points value when it is non-negative and on a half step.
    pub fn checked_points(&self) -> Option<Points> {
        Points::from_f64(self.points).filter(|points| !points.is_negative())
    }

    /// The question as it is stored: trimmed text, and no choices on essays.
    pub fn normalized(&self) -> Self {
        let is_mcq = self.kind == QuestionKind::Mcq;
        Self {
            kind: self.kind,
            prompt: self.prompt.trim().to_string(),
            points: self.checked_points().map_or(self.points, Points::as_f64),
            choices: if is_mcq {
                self.choices
                    .iter()
                    .map(|choice| ChoiceDraft { text: choice.text.trim().to_string() })
                    .collect()
            } else {
                Vec::new()
            },
            correct_index: if is_mcq { self.correct_index } else { 0 },
        }
    }
}

/// Structural edits on an in-memory draft. Out-of-range indices are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum DesignerOp {
    #[serde(rename = "add-q")]
    AddQuestion,
    #[serde(rename = "remove-q")]
    RemoveQuestion { question: usize },
    AddChoice { question: usize },
    RemoveChoice { question: usize, choice: usize },
}

#[derive(Debug, Clone, Serialize)]
pub struct TeacherAssignmentItem {
    pub id: String,
    pub title: String,
    pub kind: Option<AssignmentKind>,
    pub question_count: usize,
    pub total_points: i32,
    pub duration_minutes: i32,
    pub max_attempts: i32,
    pub open_at: Option<String>,
    pub close_at: Option<String>,
    pub availability: Availability,
    pub attempt_count: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentAssignmentItem {
    pub id: String,
    pub class_id: String,
    pub title: String,
    pub kind: Option<AssignmentKind>,
    pub duration_minutes: i32,
    pub open_at: Option<String>,
    pub close_at: Option<String>,
    pub availability: Availability,
    pub attempts_used: i64,
    pub max_attempts: i32,
    pub has_in_progress: bool,
}

impl From<&Assignment> for AssignmentDraft {
    /// Recovers an editable draft, the correct index coming from the choice flags.
    fn from(assignment: &Assignment) -> Self {
        Self {
            title: assignment.title.clone(),
            description: assignment.description.clone(),
            duration_minutes: assignment.duration_minutes,
            max_attempts: assignment.max_attempts,
            total_points: assignment.total_points,
            open_at: assignment.open_at,
            close_at: assignment.close_at,
            questions: assignment
                .questions
                .iter()
                .map(|question| QuestionDraft {
                    kind: question.kind,
                    prompt: question.prompt.clone(),
                    points: question.points.as_f64(),
                    choices: question
                        .choices
                        .iter()
                        .map(|choice| ChoiceDraft { text: choice.text.clone() })
                        .collect(),
                    correct_index: question
                        .choices
                        .iter()
                        .position(|choice| choice.is_correct)
                        .map_or(0, |index| index as i32),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft_with_choices(count: usize, correct_index: i32) -> AssignmentDraft {
        let mut draft = AssignmentDraft::new("Quiz");
        let mut question = QuestionDraft::blank_mcq();
        question.choices = vec![ChoiceDraft::default(); count];
        question.correct_index = correct_index;
        draft.questions.push(question);
        draft
    }

    #[test]
    fn add_question_seeds_blank_mcq() {
        let mut draft = AssignmentDraft::new("Quiz");
        draft.apply(DesignerOp::AddQuestion);

        assert_eq!(draft.questions.len(), 1);
        assert_eq!(draft.questions[0].kind, QuestionKind::Mcq);
        assert_eq!(draft.questions[0].choices.len(), 4);
        assert_eq!(draft.questions[0].points, 1.0);
    }

    #[test]
    fn remove_choice_clamps_correct_index() {
        let mut draft = draft_with_choices(3, 2);
        draft.apply(DesignerOp::RemoveChoice { question: 0, choice: 1 });

        assert_eq!(draft.questions[0].choices.len(), 2);
        assert_eq!(draft.questions[0].correct_index, 1);

        draft.apply(DesignerOp::RemoveChoice { question: 0, choice: 0 });
        draft.apply(DesignerOp::RemoveChoice { question: 0, choice: 0 });
        assert!(draft.questions[0].choices.is_empty());
        assert_eq!(draft.questions[0].correct_index, 0);
    }

    #[test]
    fn normalized_trims_text_and_drops_essay_choices() {
        let mut essay = QuestionDraft::blank_mcq();
        essay.kind = QuestionKind::Essay;
        essay.prompt = "  Explain  ".to_string();
        essay.correct_index = 2;

        let normalized = essay.normalized();
        assert_eq!(normalized.prompt, "Explain");
        assert!(normalized.choices.is_empty());
        assert_eq!(normalized.correct_index, 0);

        let mut mcq = QuestionDraft::blank_mcq();
        mcq.choices[1].text = " b ".to_string();
        mcq.correct_index = 1;
        let normalized = mcq.normalized();
        assert_eq!(normalized.choices[1].text, "b");
        assert_eq!(normalized.correct_index, 1);
    }

    #[test]
    fn out_of_range_ops_are_ignored() {
        let mut draft = draft_with_choices(2, 0);
        let before = draft.clone();

        draft.apply(DesignerOp::RemoveQuestion { question: 5 });
        draft.apply(DesignerOp::AddChoice { question: 5 });
        draft.apply(DesignerOp::RemoveChoice { question: 0, choice: 9 });

        assert_eq!(draft, before);
    }

    #[test]
    fn designer_ops_deserialize_from_form_names() {
        let op: DesignerOp = serde_json::from_str(r#"{"op":"add-q"}"#).unwrap();
        assert_eq!(op, DesignerOp::AddQuestion);
        let op: DesignerOp =
            serde_json::from_str(r#"{"op":"remove-choice","question":1,"choice":2}"#).unwrap();
        assert_eq!(op, DesignerOp::RemoveChoice { question: 1, choice: 2 });
    }

    #[test]
    fn checked_points_rejects_negative_and_off_step() {
        let mut question = QuestionDraft::blank_mcq();
        question.points = 2.5;
        assert_eq!(question.checked_points(), Some(Points::from_halves(5)));
        question.points = -1.0;
        assert_eq!(question.checked_points(), None);
        question.points = 0.3;
        assert_eq!(question.checked_points(), None);
    }

    #[test]
    fn draft_defaults_apply_when_fields_missing() {
        let draft: AssignmentDraft = serde_json::from_str(r#"{"title":"Quiz"}"#).unwrap();
        assert_eq!(draft.duration_minutes, 30);
        assert_eq!(draft.max_attempts, 1);
        assert_eq!(draft.total_points, 100);
    }
}
