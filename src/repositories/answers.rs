use time::PrimitiveDateTime;

use crate::db::models::AnswerRow;

pub(crate) const COLUMNS: &str = "\
    id, attempt_id, question_id, selected_choice_id, text_answer, is_correct, points_awarded, \
    teacher_comment, updated_at";

pub(crate) struct UpsertAnswer<'a> {
    pub(crate) id: &'a str,
    pub(crate) attempt_id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) selected_choice_id: Option<&'a str>,
    pub(crate) text_answer: Option<&'a str>,
    pub(crate) is_correct: Option<bool>,
    pub(crate) points_awarded: Option<f64>,
    pub(crate) teacher_comment: Option<&'a str>,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Inserts or replaces the answer for (attempt, question). The stored id is kept on update.
pub(crate) async fn upsert(
    executor: impl sqlx::PgExecutor<'_>,
    answer: UpsertAnswer<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO assignment_answers (
            id, attempt_id, question_id, selected_choice_id, text_answer, is_correct,
            points_awarded, teacher_comment, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
        ON CONFLICT (attempt_id, question_id) DO UPDATE SET
            selected_choice_id = EXCLUDED.selected_choice_id,
            text_answer = EXCLUDED.text_answer,
            is_correct = EXCLUDED.is_correct,
            points_awarded = EXCLUDED.points_awarded,
            teacher_comment = EXCLUDED.teacher_comment,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(answer.id)
    .bind(answer.attempt_id)
    .bind(answer.question_id)
    .bind(answer.selected_choice_id)
    .bind(answer.text_answer)
    .bind(answer.is_correct)
    .bind(answer.points_awarded)
    .bind(answer.teacher_comment)
    .bind(answer.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn list_by_attempt(
    executor: impl sqlx::PgExecutor<'_>,
    attempt_id: &str,
) -> Result<Vec<AnswerRow>, sqlx::Error> {
    sqlx::query_as::<_, AnswerRow>(&format!(
        "SELECT {COLUMNS} FROM assignment_answers WHERE attempt_id = $1"
    ))
    .bind(attempt_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_by_attempts(
    executor: impl sqlx::PgExecutor<'_>,
    attempt_ids: &[String],
) -> Result<Vec<AnswerRow>, sqlx::Error> {
    sqlx::query_as::<_, AnswerRow>(&format!(
        "SELECT {COLUMNS} FROM assignment_answers WHERE attempt_id = ANY($1)"
    ))
    .bind(attempt_ids)
    .fetch_all(executor)
    .await
}
