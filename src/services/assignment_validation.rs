use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::db::types::QuestionKind;
use crate::domain::Points;
use crate::errors::{GradebookError, GradebookResult};
use crate::schemas::AssignmentDraft;

pub(crate) const MIN_TOTAL_POINTS: i32 = 1;
pub(crate) const MAX_TOTAL_POINTS: i32 = 100;
pub(crate) const MIN_MCQ_CHOICES: usize = 2;

/// Every authoring rule the draft breaks, field-shape errors first.
pub fn validate_draft(draft: &AssignmentDraft) -> Vec<String> {
    let mut errors = Vec::new();

    if let Err(field_errors) = draft.validate() {
        collect_field_errors("", &field_errors, &mut errors);
        errors.sort();
    }

    if draft.title.trim().is_empty() {
        errors.push("Title is required.".to_string());
    }

    if let (Some(open_at), Some(close_at)) = (draft.open_at, draft.close_at) {
        if close_at <= open_at {
            errors.push("Close date must be after open date.".to_string());
        }
    }

    if !(MIN_TOTAL_POINTS..=MAX_TOTAL_POINTS).contains(&draft.total_points) {
        errors.push(format!(
            "Total points must be between {MIN_TOTAL_POINTS} and {MAX_TOTAL_POINTS}."
        ));
    }

    if draft.questions.is_empty() {
        errors.push("At least one question is required.".to_string());
        return errors;
    }

    let mut total = Some(Points::ZERO);
    for (index, question) in draft.questions.iter().enumerate() {
        let number = index + 1;

        if question.prompt.trim().is_empty() {
            errors.push(format!("Question {number}: prompt is required."));
        }

        match question.checked_points() {
            Some(points) => total = total.map(|sum| sum + points),
            None => {
                errors.push(format!(
                    "Question {number}: points must be a multiple of 0.5 and not negative."
                ));
                total = None;
            }
        }

        if question.kind == QuestionKind::Mcq {
            if question.choices.len() < MIN_MCQ_CHOICES {
                errors.push(format!(
                    "Question {number}: MCQ must have at least {MIN_MCQ_CHOICES} choices."
                ));
            }
            if question.correct_index < 0 || question.correct_index as usize >= question.choices.len()
            {
                errors.push(format!("Question {number}: select a valid correct answer."));
            }
            if question.choices.iter().any(|choice| choice.text.trim().is_empty()) {
                errors.push(format!("Question {number}: choice text cannot be empty."));
            }
        }
    }

    if let Some(total) = total {
        let declared = Points::whole(i64::from(draft.total_points));
        if total != declared {
            errors.push(format!(
                "Total points must equal {}. Current total: {total}.",
                draft.total_points
            ));
        }
    }

    errors
}

pub fn ensure_valid(draft: &AssignmentDraft) -> GradebookResult<()> {
    let errors = validate_draft(draft);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(GradebookError::Validation(errors))
    }
}

pub(crate) fn collect_field_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path =
            if prefix.is_empty() { field.to_string() } else { format!("{prefix}.{field}") };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    let message = error
                        .message
                        .as_ref()
                        .map(|message| message.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    out.push(format!("{path}: {message}"));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_field_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_field_errors(&format!("{path}[{index}]"), inner, out);
                }
            }
        }
    }
}
