use time::PrimitiveDateTime;

use crate::db::models::AttemptRow;
use crate::db::types::AttemptStatus;

pub(crate) const COLUMNS: &str = "\
    id, assignment_id, user_id, attempt_number, duration_minutes, started_at, submitted_at, \
    status, requires_manual_grading, max_score, auto_score, final_score, teacher_comment, \
    created_at, updated_at";

pub(crate) struct CreateAttempt<'a> {
    pub(crate) id: &'a str,
    pub(crate) assignment_id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) attempt_number: i32,
    pub(crate) duration_minutes: i32,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) status: AttemptStatus,
    pub(crate) requires_manual_grading: bool,
    pub(crate) max_score: f64,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) struct UpdateOutcome<'a> {
    pub(crate) status: AttemptStatus,
    pub(crate) submitted_at: Option<PrimitiveDateTime>,
    pub(crate) auto_score: Option<f64>,
    pub(crate) final_score: Option<f64>,
    pub(crate) teacher_comment: Option<&'a str>,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserAttemptStatsRow {
    pub(crate) assignment_id: String,
    pub(crate) attempts_used: i64,
    pub(crate) has_in_progress: bool,
}

/// Serialises attempt creation for one (assignment, user) pair until the transaction ends.
pub(crate) async fn acquire_user_lock(
    executor: impl sqlx::PgExecutor<'_>,
    assignment_id: &str,
    user_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(format!("assignment_attempt:{assignment_id}:{user_id}"))
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn find_in_progress(
    executor: impl sqlx::PgExecutor<'_>,
    assignment_id: &str,
    user_id: &str,
) -> Result<Option<AttemptRow>, sqlx::Error> {
    sqlx::query_as::<_, AttemptRow>(&format!(
        "SELECT {COLUMNS} FROM assignment_attempts \
         WHERE assignment_id = $1 AND user_id = $2 AND status = $3"
    ))
    .bind(assignment_id)
    .bind(user_id)
    .bind(AttemptStatus::InProgress)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn count_by_assignment_and_user(
    executor: impl sqlx::PgExecutor<'_>,
    assignment_id: &str,
    user_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM assignment_attempts WHERE assignment_id = $1 AND user_id = $2",
    )
    .bind(assignment_id)
    .bind(user_id)
    .fetch_one(executor)
    .await
}

/// Returns false when a unique index rejected the row.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    attempt: CreateAttempt<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO assignment_attempts (
            id, assignment_id, user_id, attempt_number, duration_minutes, started_at, status,
            requires_manual_grading, max_score, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$10)
        ON CONFLICT DO NOTHING",
    )
    .bind(attempt.id)
    .bind(attempt.assignment_id)
    .bind(attempt.user_id)
    .bind(attempt.attempt_number)
    .bind(attempt.duration_minutes)
    .bind(attempt.started_at)
    .bind(attempt.status)
    .bind(attempt.requires_manual_grading)
    .bind(attempt.max_score)
    .bind(attempt.created_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<AttemptRow>, sqlx::Error> {
    sqlx::query_as::<_, AttemptRow>(&format!(
        "SELECT {COLUMNS} FROM assignment_attempts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn find_by_id_for_update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<AttemptRow>, sqlx::Error> {
    sqlx::query_as::<_, AttemptRow>(&format!(
        "SELECT {COLUMNS} FROM assignment_attempts WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn update_outcome(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    outcome: UpdateOutcome<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE assignment_attempts SET
            status = $1, submitted_at = $2, auto_score = $3, final_score = $4,
            teacher_comment = $5, updated_at = $6
        WHERE id = $7",
    )
    .bind(outcome.status)
    .bind(outcome.submitted_at)
    .bind(outcome.auto_score)
    .bind(outcome.final_score)
    .bind(outcome.teacher_comment)
    .bind(outcome.updated_at)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Newest first by submission time, falling back to the start time.
pub(crate) async fn list_by_assignment_and_user(
    executor: impl sqlx::PgExecutor<'_>,
    assignment_id: &str,
    user_id: &str,
) -> Result<Vec<AttemptRow>, sqlx::Error> {
    sqlx::query_as::<_, AttemptRow>(&format!(
        "SELECT {COLUMNS} FROM assignment_attempts \
         WHERE assignment_id = $1 AND user_id = $2 \
         ORDER BY COALESCE(submitted_at, started_at) DESC, attempt_number DESC"
    ))
    .bind(assignment_id)
    .bind(user_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_by_assignment(
    executor: impl sqlx::PgExecutor<'_>,
    assignment_id: &str,
) -> Result<Vec<AttemptRow>, sqlx::Error> {
    sqlx::query_as::<_, AttemptRow>(&format!(
        "SELECT {COLUMNS} FROM assignment_attempts \
         WHERE assignment_id = $1 \
         ORDER BY COALESCE(submitted_at, started_at) DESC, attempt_number DESC"
    ))
    .bind(assignment_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn stats_for_user(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    assignment_ids: &[String],
) -> Result<Vec<UserAttemptStatsRow>, sqlx::Error> {
    sqlx::query_as::<_, UserAttemptStatsRow>(
        "SELECT assignment_id, COUNT(*) AS attempts_used, \
                BOOL_OR(status = 'in_progress') AS has_in_progress \
         FROM assignment_attempts \
         WHERE user_id = $1 AND assignment_id = ANY($2) \
         GROUP BY assignment_id",
    )
    .bind(user_id)
    .bind(assignment_ids)
    .fetch_all(executor)
    .await
}
