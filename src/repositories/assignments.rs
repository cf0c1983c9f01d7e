use time::PrimitiveDateTime;

use crate::db::models::AssignmentRow;
use crate::db::types::AssignmentKind;

pub(crate) const COLUMNS: &str = "\
    id, class_id, created_by, title, description, kind, duration_minutes, max_attempts, \
    total_points, open_at, close_at, created_at, updated_at";

pub(crate) struct CreateAssignment<'a> {
    pub(crate) id: &'a str,
    pub(crate) class_id: &'a str,
    pub(crate) created_by: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) kind: AssignmentKind,
    pub(crate) duration_minutes: i32,
    pub(crate) max_attempts: i32,
    pub(crate) total_points: i32,
    pub(crate) open_at: Option<PrimitiveDateTime>,
    pub(crate) close_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) struct UpdateAssignment<'a> {
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) kind: AssignmentKind,
    pub(crate) duration_minutes: i32,
    pub(crate) max_attempts: i32,
    pub(crate) total_points: i32,
    pub(crate) open_at: Option<PrimitiveDateTime>,
    pub(crate) close_at: Option<PrimitiveDateTime>,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AttemptCountRow {
    pub(crate) assignment_id: String,
    pub(crate) attempt_count: i64,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    assignment: CreateAssignment<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO assignments (
            id, class_id, created_by, title, description, kind, duration_minutes,
            max_attempts, total_points, open_at, close_at, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13)",
    )
    .bind(assignment.id)
    .bind(assignment.class_id)
    .bind(assignment.created_by)
    .bind(assignment.title)
    .bind(assignment.description)
    .bind(assignment.kind)
    .bind(assignment.duration_minutes)
    .bind(assignment.max_attempts)
    .bind(assignment.total_points)
    .bind(assignment.open_at)
    .bind(assignment.close_at)
    .bind(assignment.created_at)
    .bind(assignment.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    assignment: UpdateAssignment<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE assignments SET
            title = $1, description = $2, kind = $3, duration_minutes = $4, max_attempts = $5,
            total_points = $6, open_at = $7, close_at = $8, updated_at = $9
        WHERE id = $10",
    )
    .bind(assignment.title)
    .bind(assignment.description)
    .bind(assignment.kind)
    .bind(assignment.duration_minutes)
    .bind(assignment.max_attempts)
    .bind(assignment.total_points)
    .bind(assignment.open_at)
    .bind(assignment.close_at)
    .bind(assignment.updated_at)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn delete_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM assignments WHERE id = $1").bind(id).execute(executor).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<AssignmentRow>, sqlx::Error> {
    sqlx::query_as::<_, AssignmentRow>(&format!("SELECT {COLUMNS} FROM assignments WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Locks the assignment row until the surrounding transaction ends.
pub(crate) async fn find_by_id_for_update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<AssignmentRow>, sqlx::Error> {
    sqlx::query_as::<_, AssignmentRow>(&format!(
        "SELECT {COLUMNS} FROM assignments WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn list_by_class_and_creator(
    executor: impl sqlx::PgExecutor<'_>,
    class_id: &str,
    created_by: &str,
) -> Result<Vec<AssignmentRow>, sqlx::Error> {
    sqlx::query_as::<_, AssignmentRow>(&format!(
        "SELECT {COLUMNS} FROM assignments \
         WHERE class_id = $1 AND created_by = $2 \
         ORDER BY created_at DESC"
    ))
    .bind(class_id)
    .bind(created_by)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_by_classes(
    executor: impl sqlx::PgExecutor<'_>,
    class_ids: &[String],
) -> Result<Vec<AssignmentRow>, sqlx::Error> {
    sqlx::query_as::<_, AssignmentRow>(&format!(
        "SELECT {COLUMNS} FROM assignments \
         WHERE class_id = ANY($1) \
         ORDER BY open_at ASC NULLS LAST, created_at DESC"
    ))
    .bind(class_ids)
    .fetch_all(executor)
    .await
}

pub(crate) async fn count_attempts(
    executor: impl sqlx::PgExecutor<'_>,
    assignment_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM assignment_attempts WHERE assignment_id = $1")
        .bind(assignment_id)
        .fetch_one(executor)
        .await
}

pub(crate) async fn count_attempts_by_assignments(
    executor: impl sqlx::PgExecutor<'_>,
    assignment_ids: &[String],
) -> Result<Vec<AttemptCountRow>, sqlx::Error> {
    sqlx::query_as::<_, AttemptCountRow>(
        "SELECT assignment_id, COUNT(*) AS attempt_count FROM assignment_attempts \
         WHERE assignment_id = ANY($1) \
         GROUP BY assignment_id",
    )
    .bind(assignment_ids)
    .fetch_all(executor)
    .await
}
