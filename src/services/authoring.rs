use std::collections::HashMap;

use uuid::Uuid;

use crate::core::config::Settings;
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::{format_optional, format_primitive, primitive_now_utc};
use crate::db::types::AssignmentKind;
use crate::domain::Assignment;
use crate::errors::{GradebookError, GradebookResult};
use crate::repositories;
use crate::schemas::{AssignmentDraft, QuestionDraft, TeacherAssignmentItem};
use crate::services::assignment_import::{export_text, parse_assignment_text, ImportOptions};
use crate::services::assignment_store::{
    assignment_not_found, insert_questions, load_assignment, load_outlines, lock_assignment,
};
use crate::services::assignment_validation::ensure_valid;

pub(crate) fn ensure_owner(assignment: &Assignment, teacher_id: &str) -> GradebookResult<()> {
    if assignment.created_by != teacher_id {
        return Err(GradebookError::Forbidden("You do not own this assignment".to_string()));
    }
    Ok(())
}

fn draft_kind(draft: &AssignmentDraft) -> GradebookResult<AssignmentKind> {
    draft.kind().ok_or_else(|| GradebookError::validation("At least one question is required."))
}

fn normalized_description(draft: &AssignmentDraft) -> Option<&str> {
    draft.description.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

/// Validates a draft and stores it with its questions in one transaction.
pub async fn create_assignment(
    state: &AppState,
    teacher_id: &str,
    class_id: &str,
    draft: &AssignmentDraft,
) -> GradebookResult<Assignment> {
    ensure_valid(draft)?;
    let kind = draft_kind(draft)?;
    let now = primitive_now_utc();
    let assignment_id = Uuid::new_v4().to_string();

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to start transaction"))?;

    repositories::assignments::create(
        &mut *tx,
        repositories::assignments::CreateAssignment {
            id: &assignment_id,
            class_id,
            created_by: teacher_id,
            title: draft.title.trim(),
            description: normalized_description(draft),
            kind,
            duration_minutes: draft.duration_minutes,
            max_attempts: draft.max_attempts,
            total_points: draft.total_points,
            open_at: draft.open_at,
            close_at: draft.close_at,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| GradebookError::internal(e, "Failed to create assignment"))?;

    insert_questions(&mut tx, &assignment_id, &draft.questions).await?;
    let assignment = load_assignment(&mut tx, &assignment_id).await?;

    tx.commit().await.map_err(|e| GradebookError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(
        assignment_id = %assignment.id,
        class_id,
        kind = ?kind,
        questions = assignment.questions.len(),
        "Assignment created"
    );
    Ok(assignment)
}

/// Replaces metadata and, while nobody has started an attempt, the question set.
pub async fn update_assignment(
    state: &AppState,
    teacher_id: &str,
    assignment_id: &str,
    draft: &AssignmentDraft,
) -> GradebookResult<Assignment> {
    ensure_valid(draft)?;
    let kind = draft_kind(draft)?;
    let now = primitive_now_utc();

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to start transaction"))?;

    let current = lock_assignment(&mut tx, assignment_id).await?;
    ensure_owner(&current, teacher_id)?;

    let incoming: Vec<QuestionDraft> =
        draft.questions.iter().map(QuestionDraft::normalized).collect();
    let questions_changed = AssignmentDraft::from(&current).questions != incoming;
    if questions_changed {
        let attempts = repositories::assignments::count_attempts(&mut *tx, assignment_id)
            .await
            .map_err(|e| GradebookError::internal(e, "Failed to count attempts"))?;
        if attempts > 0 {
            return Err(GradebookError::Conflict(
                "Questions cannot be changed after students have started attempts".to_string(),
            ));
        }

        repositories::questions::delete_by_assignment(&mut *tx, assignment_id)
            .await
            .map_err(|e| GradebookError::internal(e, "Failed to replace questions"))?;
        insert_questions(&mut tx, assignment_id, &draft.questions).await?;
    }

    repositories::assignments::update(
        &mut *tx,
        assignment_id,
        repositories::assignments::UpdateAssignment {
            title: draft.title.trim(),
            description: normalized_description(draft),
            kind,
            duration_minutes: draft.duration_minutes,
            max_attempts: draft.max_attempts,
            total_points: draft.total_points,
            open_at: draft.open_at,
            close_at: draft.close_at,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| GradebookError::internal(e, "Failed to update assignment"))?;

    let assignment = load_assignment(&mut tx, assignment_id).await?;
    tx.commit().await.map_err(|e| GradebookError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(assignment_id, questions_changed, "Assignment updated");
    Ok(assignment)
}

/// Deletes an assignment together with its questions, attempts and answers.
pub async fn delete_assignment(
    state: &AppState,
    teacher_id: &str,
    assignment_id: &str,
) -> GradebookResult<()> {
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to start transaction"))?;

    let row = repositories::assignments::find_by_id_for_update(&mut *tx, assignment_id)
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to fetch assignment"))?
        .ok_or_else(assignment_not_found)?;
    if row.created_by != teacher_id {
        return Err(GradebookError::Forbidden("You do not own this assignment".to_string()));
    }

    repositories::assignments::delete_by_id(&mut *tx, assignment_id)
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to delete assignment"))?;
    tx.commit().await.map_err(|e| GradebookError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(assignment_id, "Assignment deleted");
    Ok(())
}

/// The stored assignment as an editable draft.
pub async fn load_draft(
    state: &AppState,
    teacher_id: &str,
    assignment_id: &str,
) -> GradebookResult<AssignmentDraft> {
    let mut conn = state
        .db()
        .acquire()
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to acquire connection"))?;
    let assignment = load_assignment(&mut conn, assignment_id).await?;
    ensure_owner(&assignment, teacher_id)?;
    Ok(AssignmentDraft::from(&assignment))
}

pub async fn list_for_teacher(
    state: &AppState,
    teacher_id: &str,
    class_id: &str,
) -> GradebookResult<Vec<TeacherAssignmentItem>> {
    let mut conn = state
        .db()
        .acquire()
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to acquire connection"))?;

    let rows =
        repositories::assignments::list_by_class_and_creator(&mut *conn, class_id, teacher_id)
            .await
            .map_err(|e| GradebookError::internal(e, "Failed to list assignments"))?;
    let ids: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();
    let counts: HashMap<String, i64> =
        repositories::assignments::count_attempts_by_assignments(&mut *conn, &ids)
            .await
            .map_err(|e| GradebookError::internal(e, "Failed to count attempts"))?
            .into_iter()
            .map(|row| (row.assignment_id, row.attempt_count))
            .collect();
    let assignments = load_outlines(&mut conn, rows).await?;

    let now = primitive_now_utc();
    Ok(assignments
        .into_iter()
        .map(|assignment| TeacherAssignmentItem {
            kind: assignment.kind(),
            question_count: assignment.questions.len(),
            availability: assignment.availability(now),
            attempt_count: counts.get(&assignment.id).copied().unwrap_or(0),
            open_at: format_optional(assignment.open_at),
            close_at: format_optional(assignment.close_at),
            created_at: format_primitive(assignment.created_at),
            total_points: assignment.total_points,
            duration_minutes: assignment.duration_minutes,
            max_attempts: assignment.max_attempts,
            title: assignment.title,
            id: assignment.id,
        })
        .collect())
}

fn import_options(settings: &Settings) -> ImportOptions {
    ImportOptions { utc_offset: settings.import().utc_offset }
}

/// Parses an uploaded text file into a validated draft. Nothing is stored.
pub fn import_assignment_text(settings: &Settings, raw: &str) -> GradebookResult<AssignmentDraft> {
    let max_bytes = settings.import().max_bytes;
    if raw.len() > max_bytes {
        metrics::record_import("too_large");
        return Err(GradebookError::format(format!(
            "File is too large ({} bytes, limit {max_bytes})",
            raw.len()
        )));
    }

    let draft = match parse_assignment_text(raw, &import_options(settings)) {
        Ok(draft) => draft,
        Err(err) => {
            metrics::record_import("format_error");
            tracing::info!(error = %err, "Assignment import rejected");
            return Err(err);
        }
    };

    if let Err(err) = ensure_valid(&draft) {
        metrics::record_import("invalid");
        return Err(err);
    }

    metrics::record_import("ok");
    tracing::info!(questions = draft.questions.len(), "Assignment import parsed");
    Ok(draft)
}

/// The stored assignment in the import text format.
pub async fn export_assignment_text(
    state: &AppState,
    teacher_id: &str,
    assignment_id: &str,
) -> GradebookResult<String> {
    let draft = load_draft(state, teacher_id, assignment_id).await?;
    Ok(export_text(&draft, &import_options(state.settings())))
}
