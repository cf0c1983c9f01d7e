use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::{format_optional, format_primitive, primitive_now_utc};
use crate::db::types::QuestionKind;
use crate::domain::Attempt;
use crate::errors::{GradebookError, GradebookResult};
use crate::repositories;
use crate::schemas::{
    AttemptReview, GradeAttemptView, GradeEssayItem, GradeSubmission, ReviewChoice,
    ReviewQuestion, SubmissionItem, SubmissionsView,
};
use crate::services::assignment_store::{
    attempt_not_found, load_assignment, load_attempt, load_attempts, lock_attempt, save_attempt,
};
use crate::services::attempts::summarize;
use crate::services::authoring::ensure_owner;
use crate::services::scoring;

/// Stores a teacher's essay scores and comments; the attempt ends up Graded.
pub async fn record_essay_grades(
    state: &AppState,
    teacher_id: &str,
    attempt_id: &str,
    grades: &GradeSubmission,
) -> GradebookResult<Attempt> {
    let now = primitive_now_utc();

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to start transaction"))?;

    let mut attempt = lock_attempt(&mut tx, attempt_id).await?;
    let assignment = load_assignment(&mut tx, &attempt.assignment_id).await?;
    ensure_owner(&assignment, teacher_id)?;

    let final_score = scoring::apply_essay_grades(&mut attempt, &assignment, grades)?;
    save_attempt(&mut tx, &attempt, now).await?;

    tx.commit().await.map_err(|e| GradebookError::internal(e, "Failed to commit transaction"))?;

    metrics::record_essay_grades();
    tracing::info!(
        attempt_id,
        assignment_id = %assignment.id,
        teacher_id,
        final_score = final_score.as_f64(),
        "Essay grades recorded"
    );
    Ok(attempt)
}

pub async fn grade_view(
    state: &AppState,
    teacher_id: &str,
    attempt_id: &str,
) -> GradebookResult<GradeAttemptView> {
    let mut conn = state
        .db()
        .acquire()
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to acquire connection"))?;

    let attempt = load_attempt(&mut conn, attempt_id).await?;
    let assignment = load_assignment(&mut conn, &attempt.assignment_id).await?;
    ensure_owner(&assignment, teacher_id)?;

    let essays = assignment
        .questions_of(QuestionKind::Essay)
        .map(|question| {
            let answer = attempt.answer(&question.id);
            GradeEssayItem {
                question_id: question.id.clone(),
                order: question.order,
                prompt: question.prompt.clone(),
                max_points: question.points,
                student_answer: answer
                    .and_then(|answer| answer.response.text())
                    .map(str::to_string),
                score: answer.and_then(|answer| answer.points_awarded),
                comment: answer.and_then(|answer| answer.teacher_comment.clone()),
            }
        })
        .collect();

    Ok(GradeAttemptView {
        breakdown: scoring::breakdown(&attempt, &assignment),
        assignment_id: assignment.id.clone(),
        title: assignment.title.clone(),
        attempt_id: attempt.id.clone(),
        attempt_number: attempt.attempt_number,
        user_id: attempt.user_id.clone(),
        started_at: format_primitive(attempt.started_at),
        submitted_at: format_optional(attempt.submitted_at),
        status: attempt.status,
        essays,
        teacher_comment: attempt.teacher_comment.clone(),
    })
}

/// Every attempt at the teacher's assignment, newest first.
pub async fn submissions(
    state: &AppState,
    teacher_id: &str,
    assignment_id: &str,
) -> GradebookResult<SubmissionsView> {
    let mut conn = state
        .db()
        .acquire()
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to acquire connection"))?;

    let assignment = load_assignment(&mut conn, assignment_id).await?;
    ensure_owner(&assignment, teacher_id)?;

    let rows = repositories::attempts::list_by_assignment(&mut *conn, assignment_id)
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to list attempts"))?;
    let attempts = load_attempts(&mut conn, rows).await?;

    Ok(SubmissionsView {
        assignment_id: assignment.id.clone(),
        title: assignment.title.clone(),
        total_points: assignment.total_points,
        submissions: attempts
            .iter()
            .map(|attempt| SubmissionItem {
                user_id: attempt.user_id.clone(),
                attempt: summarize(attempt, &assignment),
            })
            .collect(),
    })
}

/// A student's finished attempt with correct answers revealed.
///
/// Only available once the assignment's close instant has passed.
pub async fn review(
    state: &AppState,
    attempt_id: &str,
    user_id: &str,
) -> GradebookResult<AttemptReview> {
    let mut conn = state
        .db()
        .acquire()
        .await
        .map_err(|e| GradebookError::internal(e, "Failed to acquire connection"))?;

    let attempt = load_attempt(&mut conn, attempt_id).await?;
    if attempt.user_id != user_id {
        return Err(attempt_not_found());
    }
    let assignment = load_assignment(&mut conn, &attempt.assignment_id).await?;

    if !assignment.review_open(primitive_now_utc()) {
        return Err(GradebookError::Forbidden(
            "Review is available after the assignment closes".to_string(),
        ));
    }
    if !attempt.status.is_finished() {
        return Err(GradebookError::InvalidState("Attempt has not been submitted yet".to_string()));
    }

    let questions = assignment
        .questions
        .iter()
        .map(|question| {
            let answer = attempt.answer(&question.id);
            let selected = answer.and_then(|answer| answer.response.selected_choice_id());
            ReviewQuestion {
                question_id: question.id.clone(),
                order: question.order,
                kind: question.kind,
                prompt: question.prompt.clone(),
                points: question.points,
                choices: question
                    .choices
                    .iter()
                    .map(|choice| ReviewChoice {
                        id: choice.id.clone(),
                        text: choice.text.clone(),
                        is_correct: choice.is_correct,
                        selected: selected == Some(choice.id.as_str()),
                    })
                    .collect(),
                text_answer: answer.and_then(|answer| answer.response.text()).map(str::to_string),
                is_correct: answer.and_then(|answer| answer.is_correct),
                points_awarded: answer.and_then(|answer| answer.points_awarded),
                teacher_comment: answer.and_then(|answer| answer.teacher_comment.clone()),
            }
        })
        .collect();

    Ok(AttemptReview {
        breakdown: scoring::breakdown(&attempt, &assignment),
        assignment_id: assignment.id.clone(),
        title: assignment.title.clone(),
        attempt_id: attempt.id.clone(),
        attempt_number: attempt.attempt_number,
        status: attempt.status,
        submitted_at: format_optional(attempt.submitted_at),
        teacher_comment: attempt.teacher_comment.clone(),
        questions,
    })
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use super::*;
    use crate::db::types::AttemptStatus;
    use crate::domain::{Assignment, Points};
    use crate::schemas::{EssayGradeInput, SaveAnswerInput};
    use crate::services::attempts::{finish, save_answer, start_or_resume};
    use crate::services::authoring::create_assignment;
    use crate::test_support::fixtures::mixed_draft;
    use crate::test_support::{setup_test_context, TestContext};

    fn essay_grade(question_id: &str, score: f64, comment: Option<&str>) -> GradeSubmission {
        GradeSubmission {
            essays: vec![EssayGradeInput {
                question_id: question_id.to_string(),
                score: Some(score),
                comment: comment.map(str::to_string),
            }],
            teacher_comment: None,
        }
    }

    /// Mixed assignment with one submitted attempt: first MCQ right, second wrong, essay written.
    async fn submitted_attempt(ctx: &TestContext) -> (Assignment, Attempt) {
        let assignment = create_assignment(&ctx.state, "teacher-1", "class-1", &mixed_draft())
            .await
            .expect("create");
        let attempt = start_or_resume(&ctx.state, &assignment.id, "student-1").await.expect("start");

        let answers = [
            (0, assignment.questions[0].correct_choice_id().map(str::to_string), None),
            (
                1,
                assignment.questions[1]
                    .choices
                    .iter()
                    .find(|choice| !choice.is_correct)
                    .map(|choice| choice.id.clone()),
                None,
            ),
            (2, None, Some("My essay".to_string())),
        ];
        for (index, selected_choice_id, text_answer) in answers {
            let input = SaveAnswerInput {
                question_id: assignment.questions[index].id.clone(),
                selected_choice_id,
                text_answer,
            };
            save_answer(&ctx.state, &attempt.id, "student-1", &input).await.expect("save");
        }

        let attempt = finish(&ctx.state, &attempt.id, "student-1").await.expect("finish");
        (assignment, attempt)
    }

    #[tokio::test]
    async fn essay_grading_completes_attempt() {
        let Some(ctx) = setup_test_context().await else {
            return;
        };
        let (assignment, attempt) = submitted_attempt(&ctx).await;
        assert_eq!(attempt.status, AttemptStatus::Submitted);
        assert_eq!(attempt.auto_score, Some(Points::whole(2)));
        assert_eq!(attempt.final_score, None);

        let essay_id = assignment.questions[2].id.clone();
        let graded = record_essay_grades(
            &ctx.state,
            "teacher-1",
            &attempt.id,
            &essay_grade(&essay_id, 4.5, Some("  Good  ")),
        )
        .await
        .expect("grade");
        assert_eq!(graded.status, AttemptStatus::Graded);
        assert_eq!(graded.final_score, Some(Points::from_halves(13)));

        let view = grade_view(&ctx.state, "teacher-1", &attempt.id).await.expect("view");
        assert_eq!(view.essays.len(), 1);
        assert_eq!(view.essays[0].student_answer.as_deref(), Some("My essay"));
        assert_eq!(view.essays[0].score, Some(Points::from_halves(9)));
        assert_eq!(view.essays[0].comment.as_deref(), Some("Good"));
        assert_eq!(view.breakdown.essay_score, Some(Points::from_halves(9)));
        assert_eq!(view.breakdown.mcq_correct, 1);
    }

    #[tokio::test]
    async fn invalid_scores_leave_attempt_untouched() {
        let Some(ctx) = setup_test_context().await else {
            return;
        };
        let (assignment, attempt) = submitted_attempt(&ctx).await;
        let essay_id = assignment.questions[2].id.clone();

        for score in [0.75, 5.5, -1.0] {
            let err = record_essay_grades(
                &ctx.state,
                "teacher-1",
                &attempt.id,
                &essay_grade(&essay_id, score, None),
            )
            .await
            .unwrap_err();
            assert!(matches!(err, GradebookError::Validation(_)), "score {score}");
        }

        let view = grade_view(&ctx.state, "teacher-1", &attempt.id).await.expect("view");
        assert_eq!(view.status, AttemptStatus::Submitted);
        assert_eq!(view.essays[0].score, None);
    }

    #[tokio::test]
    async fn grading_checks_owner_and_state() {
        let Some(ctx) = setup_test_context().await else {
            return;
        };
        let assignment = create_assignment(&ctx.state, "teacher-1", "class-1", &mixed_draft())
            .await
            .expect("create");
        let attempt = start_or_resume(&ctx.state, &assignment.id, "student-1").await.expect("start");
        let essay_id = assignment.questions[2].id.clone();

        let err = record_essay_grades(
            &ctx.state,
            "teacher-1",
            &attempt.id,
            &essay_grade(&essay_id, 1.0, None),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, GradebookError::InvalidState(_)));

        let err = record_essay_grades(
            &ctx.state,
            "teacher-2",
            &attempt.id,
            &essay_grade(&essay_id, 1.0, None),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, GradebookError::Forbidden(_)));

        let err = submissions(&ctx.state, "teacher-2", &assignment.id).await.unwrap_err();
        assert!(matches!(err, GradebookError::Forbidden(_)));
    }

    #[tokio::test]
    async fn submissions_list_every_attempt() {
        let Some(ctx) = setup_test_context().await else {
            return;
        };
        let (assignment, attempt) = submitted_attempt(&ctx).await;
        start_or_resume(&ctx.state, &assignment.id, "student-2").await.expect("second student");

        let view = submissions(&ctx.state, "teacher-1", &assignment.id).await.expect("submissions");
        assert_eq!(view.total_points, 10);
        assert_eq!(view.submissions.len(), 2);
        let submitted = view
            .submissions
            .iter()
            .find(|item| item.attempt.attempt_id == attempt.id)
            .expect("submitted attempt");
        assert_eq!(submitted.user_id, "student-1");
        assert_eq!(submitted.attempt.breakdown.mcq_score, Points::whole(2));
        assert_eq!(submitted.attempt.breakdown.essay_score, None);
    }

    #[tokio::test]
    async fn review_opens_after_close() {
        let Some(ctx) = setup_test_context().await else {
            return;
        };
        let (assignment, attempt) = submitted_attempt(&ctx).await;

        let err = review(&ctx.state, &attempt.id, "student-1").await.unwrap_err();
        assert!(matches!(err, GradebookError::Forbidden(_)));

        sqlx::query("UPDATE assignments SET close_at = $1 WHERE id = $2")
            .bind(primitive_now_utc() - Duration::minutes(1))
            .bind(&assignment.id)
            .execute(ctx.state.db())
            .await
            .expect("close assignment");

        let err = review(&ctx.state, &attempt.id, "student-2").await.unwrap_err();
        assert!(matches!(err, GradebookError::NotFound(_)));

        let reviewed = review(&ctx.state, &attempt.id, "student-1").await.expect("review");
        assert_eq!(reviewed.questions.len(), 3);
        let first = &reviewed.questions[0];
        assert_eq!(first.is_correct, Some(true));
        assert!(first.choices.iter().any(|choice| choice.selected && choice.is_correct));
        let second = &reviewed.questions[1];
        assert_eq!(second.is_correct, Some(false));
        assert!(second.choices.iter().any(|choice| choice.selected && !choice.is_correct));
        assert_eq!(reviewed.questions[2].text_answer.as_deref(), Some("My essay"));
    }
}
