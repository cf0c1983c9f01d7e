use std::collections::HashMap;

use uuid::Uuid;

use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::{format_optional, format_primitive, primitive_now_utc};
use crate::db::types::AttemptStatus;
use crate::domain::{Answer, AnswerResponse, Assignment, Attempt};
use crate::errors::{GradebookError, GradebookResult};
use crate::repositories;
use crate::schemas::{
    AttemptHistory, AttemptSummary, SaveAnswerInput, StudentAssignmentItem, TakeAttemptView,
    TakeChoiceView, TakeQuestionView,
};
use crate::services::assignment_store::{
    attempt_not_found, load_assignment, load_attempt, load_attempts, load_outlines, lock_attempt,
    save_answer as store_answer, save_attempt,
};
use crate::services::attempt_lifecycle::{self, SubmitOutcome};
use crate::services::scoring;

fn ensure_attempt_owner(attempt: &Attempt, user_id: &str) -> GradebookResult<()> {
    if attempt.user_id != user_id {
        return Err(attempt_not_found());
    }
    Ok(())
}

/// Returns the caller's in-progress attempt or opens a new one.
///
/// Runs under a per-(assignment, user) advisory lock; a concurrent insert that wins the
/// unique index is re-read and returned.
pub async fn start_or_resume(
    state: &AppState,
    assignment_id: &str,
    user_id: &str,
) -> GradebookResult<Attempt> {
    let now = primitive_now_utc();

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to start transaction"))?;

    repositories::attempts::acquire_user_lock(&mut *tx, assignment_id, user_id)
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to acquire attempt lock"))?;

    let assignment = load_assignment(&mut tx, assignment_id).await?;

    let existing = repositories::attempts::find_in_progress(&mut *tx, assignment_id, user_id)
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to fetch attempt"))?;
    if let Some(row) = existing {
        let attempt_id = row.id.clone();
        let attempt = load_attempt(&mut tx, &attempt_id).await?;
        tx.commit().await.map_err(|e| GradebookError::internal(e, "Failed to commit transaction"))?;
        metrics::record_attempt_event("resumed");
        return Ok(attempt);
    }

    let used =
        repositories::attempts::count_by_assignment_and_user(&mut *tx, assignment_id, user_id)
            .await
            .map_err(|e| GradebookError::internal(e, "Failed to count attempts"))?;

    if let Err(denial) = attempt_lifecycle::check_can_start(&assignment, used, now) {
        metrics::record_attempt_event("denied");
        tracing::info!(assignment_id, user_id, reason = %denial, "Attempt denied");
        return Err(GradebookError::AttemptNotAllowed(denial));
    }

    let attempt = attempt_lifecycle::new_attempt(
        &assignment,
        Uuid::new_v4().to_string(),
        user_id,
        used,
        now,
    );
    let inserted = repositories::attempts::create(
        &mut *tx,
        repositories::attempts::CreateAttempt {
            id: &attempt.id,
            assignment_id,
            user_id,
            attempt_number: attempt.attempt_number,
            duration_minutes: attempt.duration_minutes,
            started_at: attempt.started_at,
            status: attempt.status,
            requires_manual_grading: attempt.requires_manual_grading,
            max_score: attempt.max_score.as_f64(),
            created_at: now,
        },
    )
    .await
    .map_err(|e| GradebookError::internal(e, "Failed to create attempt"))?;

    if !inserted {
        let row = repositories::attempts::find_in_progress(&mut *tx, assignment_id, user_id)
            .await
            .map_err(|e| GradebookError::internal(e, "Failed to fetch attempt"))?
            .ok_or_else(|| {
                GradebookError::Conflict("An attempt for this assignment was just created".to_string())
            })?;
        let attempt = load_attempt(&mut tx, &row.id).await?;
        tx.commit().await.map_err(|e| GradebookError::internal(e, "Failed to commit transaction"))?;
        return Ok(attempt);
    }

    for answer in &attempt.answers {
        store_answer(&mut tx, &attempt.id, answer, now).await?;
    }
    tx.commit().await.map_err(|e| GradebookError::internal(e, "Failed to commit transaction"))?;

    metrics::record_attempt_event("started");
    tracing::info!(
        attempt_id = %attempt.id,
        assignment_id,
        attempt_number = attempt.attempt_number,
        "Attempt started"
    );
    Ok(attempt)
}

/// Stores one response of an in-progress attempt and returns the saved answer.
pub async fn save_answer(
    state: &AppState,
    attempt_id: &str,
    user_id: &str,
    input: &SaveAnswerInput,
) -> GradebookResult<Answer> {
    let now = primitive_now_utc();

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to start transaction"))?;

    let mut attempt = lock_attempt(&mut tx, attempt_id).await?;
    ensure_attempt_owner(&attempt, user_id)?;
    let assignment = load_assignment(&mut tx, &attempt.assignment_id).await?;

    let changed = attempt_lifecycle::apply_answer(
        &mut attempt,
        &assignment,
        &input.question_id,
        input.selected_choice_id.as_deref(),
        input.text_answer.as_deref(),
        now,
    )?;

    let answer = attempt
        .answer(&input.question_id)
        .cloned()
        .unwrap_or_else(|| Answer::empty(&input.question_id));
    if changed {
        store_answer(&mut tx, &attempt.id, &answer, now).await?;
    }
    tx.commit().await.map_err(|e| GradebookError::internal(e, "Failed to commit transaction"))?;

    tracing::debug!(attempt_id, question_id = %input.question_id, changed, "Answer saved");
    Ok(answer)
}

/// Submits an attempt. Finishing an already finished attempt returns it unchanged.
pub async fn finish(state: &AppState, attempt_id: &str, user_id: &str) -> GradebookResult<Attempt> {
    let now = primitive_now_utc();

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to start transaction"))?;

    let mut attempt = lock_attempt(&mut tx, attempt_id).await?;
    ensure_attempt_owner(&attempt, user_id)?;
    let assignment = load_assignment(&mut tx, &attempt.assignment_id).await?;

    let outcome = attempt_lifecycle::submit(&mut attempt, &assignment, now);
    if outcome != SubmitOutcome::AlreadyFinished {
        save_attempt(&mut tx, &attempt, now).await?;
    }
    tx.commit().await.map_err(|e| GradebookError::internal(e, "Failed to commit transaction"))?;

    if outcome != SubmitOutcome::AlreadyFinished {
        metrics::record_attempt_event("submitted");
        tracing::info!(
            attempt_id,
            assignment_id = %attempt.assignment_id,
            status = attempt.status.as_str(),
            auto_score = ?attempt.auto_score.map(|points| points.as_f64()),
            "Attempt submitted"
        );
    }
    Ok(attempt)
}

/// The attempt as the student sees it while answering. Correct choices are not exposed.
pub async fn take_view(
    state: &AppState,
    attempt_id: &str,
    user_id: &str,
) -> GradebookResult<TakeAttemptView> {
    let mut conn = state
        .db()
        .acquire()
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to acquire connection"))?;

    let attempt = load_attempt(&mut conn, attempt_id).await?;
    ensure_attempt_owner(&attempt, user_id)?;
    let assignment = load_assignment(&mut conn, &attempt.assignment_id).await?;

    Ok(build_take_view(&attempt, &assignment, primitive_now_utc()))
}

pub(crate) fn build_take_view(
    attempt: &Attempt,
    assignment: &Assignment,
    now: time::PrimitiveDateTime,
) -> TakeAttemptView {
    let questions: Vec<TakeQuestionView> = assignment
        .questions
        .iter()
        .map(|question| TakeQuestionView {
            question_id: question.id.clone(),
            order: question.order,
            kind: question.kind,
            prompt: question.prompt.clone(),
            points: question.points,
            choices: question
                .choices
                .iter()
                .map(|choice| TakeChoiceView { id: choice.id.clone(), text: choice.text.clone() })
                .collect(),
            response: attempt
                .answer(&question.id)
                .map(|answer| answer.response.clone())
                .unwrap_or(AnswerResponse::Unanswered),
        })
        .collect();

    TakeAttemptView {
        attempt_id: attempt.id.clone(),
        assignment_id: assignment.id.clone(),
        title: assignment.title.clone(),
        description: assignment.description.clone(),
        attempt_number: attempt.attempt_number,
        status: attempt.status,
        started_at: format_primitive(attempt.started_at),
        due_at: format_primitive(attempt.deadline()),
        expired: attempt.status == AttemptStatus::InProgress && attempt.is_expired(now),
        answered_count: questions.iter().filter(|question| question.response.is_answered()).count(),
        question_count: questions.len(),
        questions,
    }
}

pub(crate) fn summarize(attempt: &Attempt, assignment: &Assignment) -> AttemptSummary {
    AttemptSummary {
        attempt_id: attempt.id.clone(),
        attempt_number: attempt.attempt_number,
        started_at: format_primitive(attempt.started_at),
        submitted_at: format_optional(attempt.submitted_at),
        duration_minutes: attempt.duration_minutes,
        status: attempt.status,
        requires_manual_grading: attempt.requires_manual_grading,
        breakdown: scoring::breakdown(attempt, assignment),
    }
}

/// The caller's attempts at one assignment, newest first.
pub async fn history(
    state: &AppState,
    assignment_id: &str,
    user_id: &str,
) -> GradebookResult<AttemptHistory> {
    let mut conn = state
        .db()
        .acquire()
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to acquire connection"))?;

    let assignment = load_assignment(&mut conn, assignment_id).await?;
    let rows = repositories::attempts::list_by_assignment_and_user(&mut *conn, assignment_id, user_id)
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to list attempts"))?;
    let attempts = load_attempts(&mut conn, rows).await?;

    Ok(AttemptHistory {
        assignment_id: assignment.id.clone(),
        title: assignment.title.clone(),
        max_attempts: assignment.max_attempts,
        review_open: assignment.review_open(primitive_now_utc()),
        attempts: attempts.iter().map(|attempt| summarize(attempt, &assignment)).collect(),
    })
}

/// Assignments of the given classes with the caller's attempt usage.
pub async fn list_for_student(
    state: &AppState,
    user_id: &str,
    class_ids: &[String],
) -> GradebookResult<Vec<StudentAssignmentItem>> {
    if class_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut conn = state
        .db()
        .acquire()
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to acquire connection"))?;

    let rows = repositories::assignments::list_by_classes(&mut *conn, class_ids)
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to list assignments"))?;
    let ids: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();
    let stats: HashMap<String, (i64, bool)> =
        repositories::attempts::stats_for_user(&mut *conn, user_id, &ids)
            .await
            .map_err(|e| GradebookError::internal(e, "Failed to count attempts"))?
            .into_iter()
            .map(|row| (row.assignment_id, (row.attempts_used, row.has_in_progress)))
            .collect();
    let assignments = load_outlines(&mut conn, rows).await?;

    let now = primitive_now_utc();
    Ok(assignments
        .into_iter()
        .map(|assignment| {
            let (attempts_used, has_in_progress) =
                stats.get(&assignment.id).copied().unwrap_or((0, false));
            StudentAssignmentItem {
                kind: assignment.kind(),
                availability: assignment.availability(now),
                open_at: format_optional(assignment.open_at),
                close_at: format_optional(assignment.close_at),
                attempts_used,
                has_in_progress,
                duration_minutes: assignment.duration_minutes,
                max_attempts: assignment.max_attempts,
                title: assignment.title,
                class_id: assignment.class_id,
                id: assignment.id,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use super::*;
    use crate::db::types::QuestionKind;
    use crate::domain::{Availability, Points};
    use crate::errors::AttemptDenial;
    use crate::services::authoring::create_assignment;
    use crate::test_support::fixtures::{mcq_draft, mixed_draft};
    use crate::test_support::setup_test_context;

    fn choose(question_id: &str, choice_id: &str) -> SaveAnswerInput {
        SaveAnswerInput {
            question_id: question_id.to_string(),
            selected_choice_id: Some(choice_id.to_string()),
            text_answer: None,
        }
    }

    fn write(question_id: &str, text: &str) -> SaveAnswerInput {
        SaveAnswerInput {
            question_id: question_id.to_string(),
            selected_choice_id: None,
            text_answer: Some(text.to_string()),
        }
    }

    fn correct_choice(assignment: &Assignment, index: usize) -> (String, String) {
        let question = &assignment.questions[index];
        (question.id.clone(), question.correct_choice_id().unwrap_or_default().to_string())
    }

    fn wrong_choice(assignment: &Assignment, index: usize) -> (String, String) {
        let question = &assignment.questions[index];
        let choice = question.choices.iter().find(|choice| !choice.is_correct).expect("wrong choice");
        (question.id.clone(), choice.id.clone())
    }

    #[tokio::test]
    async fn mcq_only_attempt_is_graded_on_finish() {
        let Some(ctx) = setup_test_context().await else {
            return;
        };
        let assignment = create_assignment(&ctx.state, "teacher-1", "class-1", &mcq_draft(&[2.0, 3.0]))
            .await
            .expect("create");

        let attempt = start_or_resume(&ctx.state, &assignment.id, "student-1").await.expect("start");
        assert_eq!(attempt.attempt_number, 1);
        assert_eq!(attempt.answers.len(), 2);

        let (q1, right) = correct_choice(&assignment, 0);
        let (q2, wrong) = wrong_choice(&assignment, 1);
        save_answer(&ctx.state, &attempt.id, "student-1", &choose(&q1, &right)).await.expect("q1");
        save_answer(&ctx.state, &attempt.id, "student-1", &choose(&q2, &wrong)).await.expect("q2");

        let finished = finish(&ctx.state, &attempt.id, "student-1").await.expect("finish");
        assert_eq!(finished.status, AttemptStatus::Graded);
        assert_eq!(finished.auto_score, Some(Points::whole(2)));
        assert_eq!(finished.final_score, Some(Points::whole(2)));

        let again = finish(&ctx.state, &attempt.id, "student-1").await.expect("finish twice");
        assert_eq!(again.submitted_at, finished.submitted_at);

        let mut conn = ctx.state.db().acquire().await.expect("conn");
        let stored = load_attempt(&mut conn, &attempt.id).await.expect("reload");
        assert_eq!(stored.started_at, attempt.started_at);
        assert_eq!(stored.submitted_at, finished.submitted_at);
    }

    #[tokio::test]
    async fn blank_save_keeps_stored_answer() {
        let Some(ctx) = setup_test_context().await else {
            return;
        };
        let assignment = create_assignment(&ctx.state, "teacher-1", "class-1", &mcq_draft(&[1.0]))
            .await
            .expect("create");
        let attempt = start_or_resume(&ctx.state, &assignment.id, "student-1").await.expect("start");
        let (q1, right) = correct_choice(&assignment, 0);
        save_answer(&ctx.state, &attempt.id, "student-1", &choose(&q1, &right)).await.expect("save");

        let blank =
            SaveAnswerInput { question_id: q1.clone(), selected_choice_id: None, text_answer: None };
        let kept = save_answer(&ctx.state, &attempt.id, "student-1", &blank).await.expect("blank");
        assert_eq!(kept.response, AnswerResponse::Choice(right.clone()));

        let finished = finish(&ctx.state, &attempt.id, "student-1").await.expect("finish");
        assert_eq!(finished.final_score, Some(Points::whole(1)));
    }

    #[tokio::test]
    async fn resume_returns_same_attempt_and_limit_applies() {
        let Some(ctx) = setup_test_context().await else {
            return;
        };
        let assignment = create_assignment(&ctx.state, "teacher-1", "class-1", &mcq_draft(&[2.0, 3.0]))
            .await
            .expect("create");

        let first = start_or_resume(&ctx.state, &assignment.id, "student-1").await.expect("start");
        let resumed = start_or_resume(&ctx.state, &assignment.id, "student-1").await.expect("resume");
        assert_eq!(first.id, resumed.id);

        finish(&ctx.state, &first.id, "student-1").await.expect("finish");
        let err = start_or_resume(&ctx.state, &assignment.id, "student-1").await.unwrap_err();
        assert!(matches!(
            err,
            GradebookError::AttemptNotAllowed(AttemptDenial::LimitReached { used: 1, max: 1 })
        ));
    }

    #[tokio::test]
    async fn concurrent_starts_yield_one_attempt() {
        let Some(ctx) = setup_test_context().await else {
            return;
        };
        let mut draft = mcq_draft(&[1.0]);
        draft.max_attempts = 5;
        let assignment =
            create_assignment(&ctx.state, "teacher-1", "class-1", &draft).await.expect("create");

        let (a, b, c) = tokio::join!(
            start_or_resume(&ctx.state, &assignment.id, "student-1"),
            start_or_resume(&ctx.state, &assignment.id, "student-1"),
            start_or_resume(&ctx.state, &assignment.id, "student-1"),
        );
        let (a, b, c) = (a.expect("first"), b.expect("second"), c.expect("third"));
        assert_eq!(a.id, b.id);
        assert_eq!(a.id, c.id);
        assert_eq!(a.attempt_number, 1);

        let stored: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM assignment_attempts WHERE assignment_id = $1 AND user_id = $2",
        )
        .bind(&assignment.id)
        .bind("student-1")
        .fetch_one(ctx.state.db())
        .await
        .expect("count");
        assert_eq!(stored, 1);
    }

    #[tokio::test]
    async fn in_progress_row_created_outside_the_lock_is_resumed() {
        let Some(ctx) = setup_test_context().await else {
            return;
        };
        let assignment = create_assignment(&ctx.state, "teacher-1", "class-1", &mcq_draft(&[1.0]))
            .await
            .expect("create");
        let now = primitive_now_utc();

        let inserted = repositories::attempts::create(
            ctx.state.db(),
            repositories::attempts::CreateAttempt {
                id: "external-attempt",
                assignment_id: &assignment.id,
                user_id: "student-1",
                attempt_number: 1,
                duration_minutes: assignment.duration_minutes,
                started_at: now,
                status: AttemptStatus::InProgress,
                requires_manual_grading: false,
                max_score: 1.0,
                created_at: now,
            },
        )
        .await
        .expect("insert");
        assert!(inserted);

        let duplicate = repositories::attempts::create(
            ctx.state.db(),
            repositories::attempts::CreateAttempt {
                id: "second-attempt",
                assignment_id: &assignment.id,
                user_id: "student-1",
                attempt_number: 2,
                duration_minutes: assignment.duration_minutes,
                started_at: now,
                status: AttemptStatus::InProgress,
                requires_manual_grading: false,
                max_score: 1.0,
                created_at: now,
            },
        )
        .await
        .expect("insert duplicate");
        assert!(!duplicate);

        let resumed = start_or_resume(&ctx.state, &assignment.id, "student-1").await.expect("resume");
        assert_eq!(resumed.id, "external-attempt");
    }

    #[tokio::test]
    async fn window_gates_new_attempts() {
        let Some(ctx) = setup_test_context().await else {
            return;
        };
        let now = primitive_now_utc();

        let mut future = mcq_draft(&[1.0]);
        future.open_at = Some(now + Duration::days(1));
        let future = create_assignment(&ctx.state, "teacher-1", "class-1", &future).await.expect("future");
        let err = start_or_resume(&ctx.state, &future.id, "student-1").await.unwrap_err();
        assert!(matches!(err, GradebookError::AttemptNotAllowed(AttemptDenial::NotOpenYet)));

        let mut past = mcq_draft(&[1.0]);
        past.open_at = Some(now - Duration::days(2));
        past.close_at = Some(now - Duration::days(1));
        let past = create_assignment(&ctx.state, "teacher-1", "class-1", &past).await.expect("past");
        let err = start_or_resume(&ctx.state, &past.id, "student-1").await.unwrap_err();
        assert!(matches!(err, GradebookError::AttemptNotAllowed(AttemptDenial::Closed)));
    }

    #[tokio::test]
    async fn save_answer_checks_owner_and_membership() {
        let Some(ctx) = setup_test_context().await else {
            return;
        };
        let assignment = create_assignment(&ctx.state, "teacher-1", "class-1", &mixed_draft())
            .await
            .expect("create");
        let attempt = start_or_resume(&ctx.state, &assignment.id, "student-1").await.expect("start");
        let (q1, right) = correct_choice(&assignment, 0);
        let (q2, _) = correct_choice(&assignment, 1);

        let err = save_answer(&ctx.state, &attempt.id, "student-2", &choose(&q1, &right))
            .await
            .unwrap_err();
        assert!(matches!(err, GradebookError::NotFound(_)));

        let err = save_answer(&ctx.state, &attempt.id, "student-1", &choose("missing", &right))
            .await
            .unwrap_err();
        assert!(matches!(err, GradebookError::NotFound(_)));

        let err = save_answer(&ctx.state, &attempt.id, "student-1", &choose(&q2, &right))
            .await
            .unwrap_err();
        assert!(matches!(err, GradebookError::Validation(_)));

        let essay_id = assignment.questions[2].id.clone();
        let saved = save_answer(&ctx.state, &attempt.id, "student-1", &write(&essay_id, "draft"))
            .await
            .expect("essay");
        assert_eq!(saved.response, AnswerResponse::Text("draft".to_string()));
    }

    #[tokio::test]
    async fn expired_attempt_rejects_saves_but_finishes() {
        let Some(ctx) = setup_test_context().await else {
            return;
        };
        let assignment = create_assignment(&ctx.state, "teacher-1", "class-1", &mcq_draft(&[1.0]))
            .await
            .expect("create");
        let attempt = start_or_resume(&ctx.state, &assignment.id, "student-1").await.expect("start");

        sqlx::query("UPDATE assignment_attempts SET started_at = started_at - INTERVAL '2 hours' WHERE id = $1")
            .bind(&attempt.id)
            .execute(ctx.state.db())
            .await
            .expect("backdate");

        let view = take_view(&ctx.state, &attempt.id, "student-1").await.expect("view");
        assert!(view.expired);

        let (q1, right) = correct_choice(&assignment, 0);
        let err = save_answer(&ctx.state, &attempt.id, "student-1", &choose(&q1, &right))
            .await
            .unwrap_err();
        assert!(matches!(err, GradebookError::TimeExpired));

        let finished = finish(&ctx.state, &attempt.id, "student-1").await.expect("finish");
        assert_eq!(finished.status, AttemptStatus::Graded);
        assert_eq!(finished.final_score, Some(Points::ZERO));
    }

    #[tokio::test]
    async fn take_view_hides_correctness_and_counts_answers() {
        let Some(ctx) = setup_test_context().await else {
            return;
        };
        let assignment = create_assignment(&ctx.state, "teacher-1", "class-1", &mixed_draft())
            .await
            .expect("create");
        let attempt = start_or_resume(&ctx.state, &assignment.id, "student-1").await.expect("start");
        let (q1, right) = correct_choice(&assignment, 0);
        save_answer(&ctx.state, &attempt.id, "student-1", &choose(&q1, &right)).await.expect("save");

        let view = take_view(&ctx.state, &attempt.id, "student-1").await.expect("view");
        assert_eq!(view.question_count, 3);
        assert_eq!(view.answered_count, 1);
        assert!(!view.expired);
        assert_eq!(view.questions[2].kind, QuestionKind::Essay);

        let json = serde_json::to_value(&view).expect("json");
        assert!(!json.to_string().contains("is_correct"));
    }

    #[tokio::test]
    async fn history_and_student_list_reflect_attempts() {
        let Some(ctx) = setup_test_context().await else {
            return;
        };
        let mut draft = mixed_draft();
        draft.max_attempts = 2;
        let assignment =
            create_assignment(&ctx.state, "teacher-1", "class-1", &draft).await.expect("create");

        let first = start_or_resume(&ctx.state, &assignment.id, "student-1").await.expect("start");
        finish(&ctx.state, &first.id, "student-1").await.expect("finish");
        let second = start_or_resume(&ctx.state, &assignment.id, "student-1").await.expect("again");
        assert_eq!(second.attempt_number, 2);

        let history = history(&ctx.state, &assignment.id, "student-1").await.expect("history");
        assert_eq!(history.attempts.len(), 2);
        assert_eq!(history.attempts[0].attempt_id, second.id);
        assert_eq!(history.attempts[1].attempt_id, first.id);
        assert_eq!(history.attempts[1].status, AttemptStatus::Submitted);
        assert_eq!(history.attempts[1].breakdown.essay_score, None);
        assert!(!history.review_open);

        let items = list_for_student(&ctx.state, "student-1", &["class-1".to_string()])
            .await
            .expect("list");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].attempts_used, 2);
        assert!(items[0].has_in_progress);
        assert_eq!(items[0].availability, Availability::Open);

        let none = list_for_student(&ctx.state, "student-1", &[]).await.expect("empty");
        assert!(none.is_empty());
    }
}
