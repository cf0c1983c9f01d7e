use crate::db::models::{ChoiceRow, QuestionRow};
use crate::db::types::QuestionKind;

pub(crate) const COLUMNS: &str = "id, assignment_id, kind, prompt, points, order_index";
pub(crate) const CHOICE_COLUMNS: &str = "c.id, c.question_id, c.text, c.is_correct, c.order_index";

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) assignment_id: &'a str,
    pub(crate) kind: QuestionKind,
    pub(crate) prompt: &'a str,
    pub(crate) points: f64,
    pub(crate) order_index: i32,
}

pub(crate) struct CreateChoice<'a> {
    pub(crate) id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) text: &'a str,
    pub(crate) is_correct: bool,
    pub(crate) order_index: i32,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    question: CreateQuestion<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO assignment_questions (id, assignment_id, kind, prompt, points, order_index)
        VALUES ($1,$2,$3,$4,$5,$6)",
    )
    .bind(question.id)
    .bind(question.assignment_id)
    .bind(question.kind)
    .bind(question.prompt)
    .bind(question.points)
    .bind(question.order_index)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn create_choice(
    executor: impl sqlx::PgExecutor<'_>,
    choice: CreateChoice<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO assignment_choices (id, question_id, text, is_correct, order_index)
        VALUES ($1,$2,$3,$4,$5)",
    )
    .bind(choice.id)
    .bind(choice.question_id)
    .bind(choice.text)
    .bind(choice.is_correct)
    .bind(choice.order_index)
    .execute(executor)
    .await?;
    Ok(())
}

/// Removes every question of an assignment; choices go with them.
pub(crate) async fn delete_by_assignment(
    executor: impl sqlx::PgExecutor<'_>,
    assignment_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM assignment_questions WHERE assignment_id = $1")
        .bind(assignment_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn list_by_assignment(
    executor: impl sqlx::PgExecutor<'_>,
    assignment_id: &str,
) -> Result<Vec<QuestionRow>, sqlx::Error> {
    sqlx::query_as::<_, QuestionRow>(&format!(
        "SELECT {COLUMNS} FROM assignment_questions \
         WHERE assignment_id = $1 ORDER BY order_index ASC"
    ))
    .bind(assignment_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_by_assignments(
    executor: impl sqlx::PgExecutor<'_>,
    assignment_ids: &[String],
) -> Result<Vec<QuestionRow>, sqlx::Error> {
    sqlx::query_as::<_, QuestionRow>(&format!(
        "SELECT {COLUMNS} FROM assignment_questions \
         WHERE assignment_id = ANY($1) ORDER BY assignment_id, order_index ASC"
    ))
    .bind(assignment_ids)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_choices_by_assignment(
    executor: impl sqlx::PgExecutor<'_>,
    assignment_id: &str,
) -> Result<Vec<ChoiceRow>, sqlx::Error> {
    sqlx::query_as::<_, ChoiceRow>(&format!(
        "SELECT {CHOICE_COLUMNS} FROM assignment_choices c \
         JOIN assignment_questions q ON q.id = c.question_id \
         WHERE q.assignment_id = $1 \
         ORDER BY q.order_index, c.order_index"
    ))
    .bind(assignment_id)
    .fetch_all(executor)
    .await
}
