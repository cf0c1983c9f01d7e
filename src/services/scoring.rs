use validator::Validate;

use crate::db::types::{AttemptStatus, QuestionKind};
use crate::domain::{Assignment, Attempt, Points, Question};
use crate::errors::{GradebookError, GradebookResult};
use crate::schemas::{GradeSubmission, ScoreBreakdown};
use crate::services::assignment_validation::collect_field_errors;

/// Marks every MCQ answer and stores the subtotal as the attempt's auto score.
/// Missing answers are created and graded as wrong.
pub fn auto_grade_mcq(attempt: &mut Attempt, assignment: &Assignment) -> Points {
    let mut total = Points::ZERO;

    for question in assignment.questions_of(QuestionKind::Mcq) {
        let correct_choice = question.correct_choice_id();
        let answer = attempt.answer_entry(&question.id);
        let is_correct = matches!(
            (answer.response.selected_choice_id(), correct_choice),
            (Some(selected), Some(correct)) if selected == correct
        );
        let awarded = if is_correct { question.points } else { Points::ZERO };

        answer.is_correct = Some(is_correct);
        answer.points_awarded = Some(awarded);
        total += awarded;
    }

    attempt.auto_score = Some(total);
    total
}

/// Applies a teacher's essay scores and recomputes the final score.
///
/// Every score is checked before anything is written, so a rejected submission leaves
/// the attempt untouched. Entries for unknown or non-essay questions are ignored.
pub fn apply_essay_grades(
    attempt: &mut Attempt,
    assignment: &Assignment,
    grades: &GradeSubmission,
) -> GradebookResult<Points> {
    if attempt.status == AttemptStatus::InProgress {
        return Err(GradebookError::InvalidState(
            "Attempt has not been submitted yet".to_string(),
        ));
    }

    let mut errors = Vec::new();
    if let Err(field_errors) = grades.validate() {
        collect_field_errors("", &field_errors, &mut errors);
        errors.sort();
    }

    let mut accepted = Vec::new();
    for entry in &grades.essays {
        let Some(question) = assignment
            .question(&entry.question_id)
            .filter(|question| question.kind == QuestionKind::Essay)
        else {
            continue;
        };

        let score = match entry.score {
            Some(raw) => match check_essay_score(question, raw) {
                Ok(points) => Some(points),
                Err(mut problems) => {
                    errors.append(&mut problems);
                    continue;
                }
            },
            None => None,
        };
        accepted.push((question, score, normalize_comment(entry.comment.as_deref())));
    }

    if !errors.is_empty() {
        return Err(GradebookError::Validation(errors));
    }

    for (question, score, comment) in accepted {
        let answer = attempt.answer_entry(&question.id);
        answer.points_awarded = score;
        answer.teacher_comment = comment;
    }
    attempt.teacher_comment = normalize_comment(grades.teacher_comment.as_deref());

    let essay_total: Points = assignment
        .questions_of(QuestionKind::Essay)
        .filter_map(|question| attempt.answer(&question.id).and_then(|answer| answer.points_awarded))
        .sum();
    let final_score = attempt.auto_score.unwrap_or(Points::ZERO) + essay_total;

    attempt.final_score = Some(final_score);
    attempt.status = AttemptStatus::Graded;
    Ok(final_score)
}

/// Per-part scores for display. The MCQ subtotal falls back to the per-answer data
/// when no auto score has been cached.
pub fn breakdown(attempt: &Attempt, assignment: &Assignment) -> ScoreBreakdown {
    let mcq_questions: Vec<&Question> = assignment.questions_of(QuestionKind::Mcq).collect();
    let mcq_max: Points = mcq_questions.iter().map(|question| question.points).sum();
    let essay_max: Points =
        assignment.questions_of(QuestionKind::Essay).map(|question| question.points).sum();

    let correct: Vec<&&Question> =
        mcq_questions.iter().filter(|question| answered_correctly(attempt, question)).collect();
    let mcq_score = attempt
        .auto_score
        .unwrap_or_else(|| correct.iter().map(|question| question.points).sum());

    let essay_score = if attempt.requires_manual_grading {
        match (attempt.status, attempt.final_score) {
            (AttemptStatus::Graded, Some(final_score)) => {
                Some((final_score - mcq_score).clamp(Points::ZERO, essay_max))
            }
            _ => None,
        }
    } else {
        Some(Points::ZERO)
    };

    ScoreBreakdown {
        mcq_correct: correct.len(),
        mcq_total: mcq_questions.len(),
        mcq_score,
        mcq_max,
        essay_score,
        essay_max,
        final_score: attempt.final_score,
        final_max: mcq_max + essay_max,
    }
}

fn answered_correctly(attempt: &Attempt, question: &Question) -> bool {
    let Some(answer) = attempt.answer(&question.id) else {
        return false;
    };
    match answer.is_correct {
        Some(is_correct) => is_correct,
        None => answer
            .response
            .selected_choice_id()
            .is_some_and(|selected| question.correct_choice_id() == Some(selected)),
    }
}

fn check_essay_score(question: &Question, raw: f64) -> Result<Points, Vec<String>> {
    let mut problems = Vec::new();
    if !(raw >= 0.0 && raw <= question.points.as_f64()) {
        problems.push(format!(
            "Question {}: score must be between 0 and {}.",
            question.order, question.points
        ));
    }
    let points = Points::from_f64(raw);
    if points.is_none() {
        problems.push(format!("Question {}: essay scores must be multiples of 0.5.", question.order));
    }

    match points {
        Some(points) if problems.is_empty() => Ok(points),
        _ => Err(problems),
    }
}

fn normalize_comment(comment: Option<&str>) -> Option<String> {
    comment.map(str::trim).filter(|value| !value.is_empty()).map(str::to_string)
}
