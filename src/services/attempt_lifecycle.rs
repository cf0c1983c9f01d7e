use time::PrimitiveDateTime;

use crate::db::types::AttemptStatus;
use crate::domain::{Answer, AnswerResponse, Assignment, Attempt, Availability};
use crate::errors::{AttemptDenial, GradebookError, GradebookResult};
use crate::services::scoring;

pub(crate) const MAX_TEXT_ANSWER_CHARS: usize = 8000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SubmitOutcome {
    AlreadyFinished,
    Graded,
    AwaitingManualGrading,
}

/// Gate for creating a new attempt. The limit is reported before the window.
pub(crate) fn check_can_start(
    assignment: &Assignment,
    attempts_used: i64,
    now: PrimitiveDateTime,
) -> Result<(), AttemptDenial> {
    if attempts_used >= i64::from(assignment.max_attempts) {
        return Err(AttemptDenial::LimitReached {
            used: attempts_used,
            max: assignment.max_attempts,
        });
    }

    match assignment.availability(now) {
        Availability::NotOpen => Err(AttemptDenial::NotOpenYet),
        Availability::Closed => Err(AttemptDenial::Closed),
        Availability::Open => Ok(()),
    }
}

pub(crate) fn new_attempt(
    assignment: &Assignment,
    id: String,
    user_id: &str,
    attempts_used: i64,
    now: PrimitiveDateTime,
) -> Attempt {
    Attempt {
        id,
        assignment_id: assignment.id.clone(),
        user_id: user_id.to_string(),
        attempt_number: i32::try_from(attempts_used + 1).unwrap_or(i32::MAX),
        duration_minutes: assignment.duration_minutes,
        started_at: now,
        submitted_at: None,
        status: AttemptStatus::InProgress,
        requires_manual_grading: assignment.has_essay(),
        max_score: assignment.max_score(),
        auto_score: None,
        final_score: None,
        teacher_comment: None,
        answers: assignment.questions.iter().map(|question| Answer::empty(&question.id)).collect(),
    }
}

/// Records a student's response. Returns whether the stored response changed.
pub(crate) fn apply_answer(
    attempt: &mut Attempt,
    assignment: &Assignment,
    question_id: &str,
    selected_choice_id: Option<&str>,
    text_answer: Option<&str>,
    now: PrimitiveDateTime,
) -> GradebookResult<bool> {
    if attempt.status != AttemptStatus::InProgress {
        return Err(GradebookError::InvalidState("Attempt is not in progress".to_string()));
    }
    if attempt.is_expired(now) {
        return Err(GradebookError::TimeExpired);
    }

    let question = assignment
        .question(question_id)
        .ok_or_else(|| GradebookError::NotFound("Question not found".to_string()))?;

    let response = match (selected_choice_id, text_answer) {
        (_, Some(text)) => {
            if text.chars().count() > MAX_TEXT_ANSWER_CHARS {
                return Err(GradebookError::validation(format!(
                    "Answer text must be at most {MAX_TEXT_ANSWER_CHARS} characters."
                )));
            }
            AnswerResponse::Text(text.to_string())
        }
        (Some(choice_id), None) => {
            if question.choice(choice_id).is_none() {
                return Err(GradebookError::validation(
                    "Selected choice does not belong to this question.",
                ));
            }
            AnswerResponse::Choice(choice_id.to_string())
        }
        (None, None) => return Ok(false),
    };

    let answer = attempt.answer_entry(question_id);
    if answer.response == response {
        return Ok(false);
    }
    answer.response = response;
    Ok(true)
}

/// Grades the MCQ part and closes the attempt; a finished attempt is left untouched.
pub(crate) fn submit(
    attempt: &mut Attempt,
    assignment: &Assignment,
    now: PrimitiveDateTime,
) -> SubmitOutcome {
    if attempt.status != AttemptStatus::InProgress {
        return SubmitOutcome::AlreadyFinished;
    }

    let auto_score = scoring::auto_grade_mcq(attempt, assignment);
    attempt.submitted_at = Some(now);

    if attempt.requires_manual_grading {
        attempt.status = AttemptStatus::Submitted;
        attempt.final_score = None;
        SubmitOutcome::AwaitingManualGrading
    } else {
        attempt.status = AttemptStatus::Graded;
        attempt.final_score = Some(auto_score);
        SubmitOutcome::Graded
    }
}
