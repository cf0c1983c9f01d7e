use std::collections::HashMap;

use sqlx::PgConnection;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::{AssignmentRow, AttemptRow};
use crate::db::types::QuestionKind;
use crate::domain::{Answer, Assignment, Attempt};
use crate::errors::{GradebookError, GradebookResult};
use crate::repositories;
use crate::schemas::QuestionDraft;

pub(crate) fn assignment_not_found() -> GradebookError {
    GradebookError::NotFound("Assignment not found".to_string())
}

pub(crate) fn attempt_not_found() -> GradebookError {
    GradebookError::NotFound("Attempt not found".to_string())
}

/// Loads an assignment with its questions and choices.
pub(crate) async fn load_assignment(
    conn: &mut PgConnection,
    assignment_id: &str,
) -> GradebookResult<Assignment> {
    let row = repositories::assignments::find_by_id(&mut *conn, assignment_id)
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to fetch assignment"))?
        .ok_or_else(assignment_not_found)?;
    complete_assignment(conn, row).await
}

/// Same as [`load_assignment`] but holds a row lock for the rest of the transaction.
pub(crate) async fn lock_assignment(
    conn: &mut PgConnection,
    assignment_id: &str,
) -> GradebookResult<Assignment> {
    let row = repositories::assignments::find_by_id_for_update(&mut *conn, assignment_id)
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to lock assignment"))?
        .ok_or_else(assignment_not_found)?;
    complete_assignment(conn, row).await
}

async fn complete_assignment(
    conn: &mut PgConnection,
    row: AssignmentRow,
) -> GradebookResult<Assignment> {
    let questions = repositories::questions::list_by_assignment(&mut *conn, &row.id)
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to fetch questions"))?;
    let choices = repositories::questions::list_choices_by_assignment(&mut *conn, &row.id)
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to fetch choices"))?;
    Assignment::from_rows(row, questions, choices)
}

/// Assignments with their questions but without choices; enough for list views.
pub(crate) async fn load_outlines(
    conn: &mut PgConnection,
    rows: Vec<AssignmentRow>,
) -> GradebookResult<Vec<Assignment>> {
    let ids: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();
    let question_rows = repositories::questions::list_by_assignments(&mut *conn, &ids)
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to fetch questions"))?;

    let mut by_assignment: HashMap<String, Vec<_>> = HashMap::new();
    for question in question_rows {
        by_assignment.entry(question.assignment_id.clone()).or_default().push(question);
    }

    rows.into_iter()
        .map(|row| {
            let questions = by_assignment.remove(&row.id).unwrap_or_default();
            Assignment::from_rows(row, questions, Vec::new())
        })
        .collect()
}

/// Writes a validated question list in order, normalised with [`QuestionDraft::normalized`].
pub(crate) async fn insert_questions(
    conn: &mut PgConnection,
    assignment_id: &str,
    questions: &[QuestionDraft],
) -> GradebookResult<()> {
    for (index, question) in questions.iter().map(QuestionDraft::normalized).enumerate() {
        let question_id = Uuid::new_v4().to_string();
        let points = question
            .checked_points()
            .ok_or_else(|| GradebookError::validation("Question points are invalid."))?;

        repositories::questions::create(
            &mut *conn,
            repositories::questions::CreateQuestion {
                id: &question_id,
                assignment_id,
                kind: question.kind,
                prompt: &question.prompt,
                points: points.as_f64(),
                order_index: index as i32 + 1,
            },
        )
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to create question"))?;

        if question.kind != QuestionKind::Mcq {
            continue;
        }
        for (choice_index, choice) in question.choices.iter().enumerate() {
            repositories::questions::create_choice(
                &mut *conn,
                repositories::questions::CreateChoice {
                    id: &Uuid::new_v4().to_string(),
                    question_id: &question_id,
                    text: &choice.text,
                    is_correct: choice_index as i32 == question.correct_index,
                    order_index: choice_index as i32 + 1,
                },
            )
            .await
            .map_err(|e| GradebookError::internal(e, "Failed to create choice"))?;
        }
    }

    Ok(())
}

pub(crate) async fn load_attempt(
    conn: &mut PgConnection,
    attempt_id: &str,
) -> GradebookResult<Attempt> {
    let row = repositories::attempts::find_by_id(&mut *conn, attempt_id)
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to fetch attempt"))?
        .ok_or_else(attempt_not_found)?;
    let answers = repositories::answers::list_by_attempt(&mut *conn, attempt_id)
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to fetch answers"))?;
    Attempt::from_rows(row, answers)
}

/// Loads an attempt under a row lock so concurrent saves and submissions serialise.
pub(crate) async fn lock_attempt(
    conn: &mut PgConnection,
    attempt_id: &str,
) -> GradebookResult<Attempt> {
    let row = repositories::attempts::find_by_id_for_update(&mut *conn, attempt_id)
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to lock attempt"))?
        .ok_or_else(attempt_not_found)?;
    let answers = repositories::answers::list_by_attempt(&mut *conn, attempt_id)
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to fetch answers"))?;
    Attempt::from_rows(row, answers)
}

/// Attempts with their answers, keeping the order of `rows`.
pub(crate) async fn load_attempts(
    conn: &mut PgConnection,
    rows: Vec<AttemptRow>,
) -> GradebookResult<Vec<Attempt>> {
    let ids: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();
    let answer_rows = repositories::answers::list_by_attempts(&mut *conn, &ids)
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to fetch answers"))?;

    let mut by_attempt: HashMap<String, Vec<_>> = HashMap::new();
    for answer in answer_rows {
        by_attempt.entry(answer.attempt_id.clone()).or_default().push(answer);
    }

    rows.into_iter()
        .map(|row| {
            let answers = by_attempt.remove(&row.id).unwrap_or_default();
            Attempt::from_rows(row, answers)
        })
        .collect()
}

/// Persists the attempt's status, scores and every answer.
pub(crate) async fn save_attempt(
    conn: &mut PgConnection,
    attempt: &Attempt,
    now: PrimitiveDateTime,
) -> GradebookResult<()> {
    repositories::attempts::update_outcome(
        &mut *conn,
        &attempt.id,
        repositories::attempts::UpdateOutcome {
            status: attempt.status,
            submitted_at: attempt.submitted_at,
            auto_score: attempt.auto_score.map(|points| points.as_f64()),
            final_score: attempt.final_score.map(|points| points.as_f64()),
            teacher_comment: attempt.teacher_comment.as_deref(),
            updated_at: now,
        },
    )
    .await
    .map_err(|e| GradebookError::internal(e, "Failed to update attempt"))?;

    for answer in &attempt.answers {
        save_answer(conn, &attempt.id, answer, now).await?;
    }
    Ok(())
}

pub(crate) async fn save_answer(
    conn: &mut PgConnection,
    attempt_id: &str,
    answer: &Answer,
    now: PrimitiveDateTime,
) -> GradebookResult<()> {
    repositories::answers::upsert(
        &mut *conn,
        repositories::answers::UpsertAnswer {
            id: &Uuid::new_v4().to_string(),
            attempt_id,
            question_id: &answer.question_id,
            selected_choice_id: answer.response.selected_choice_id(),
            text_answer: answer.response.text(),
            is_correct: answer.is_correct,
            points_awarded: answer.points_awarded.map(|points| points.as_f64()),
            teacher_comment: answer.teacher_comment.as_deref(),
            updated_at: now,
        },
    )
    .await
    .map_err(|e| GradebookError::internal(e, "Failed to save answer"))
}
