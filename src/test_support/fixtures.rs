use time::macros::datetime;
use time::PrimitiveDateTime;

use crate::db::types::QuestionKind;
use crate::domain::{Assignment, Attempt, Choice, Points, Question};
use crate::schemas::{AssignmentDraft, ChoiceDraft, QuestionDraft};
use crate::services::attempt_lifecycle::new_attempt;

const CREATED_AT: PrimitiveDateTime = datetime!(2025-01-01 00:00);

/// MCQ questions `q1..qn`; choice `q{n}-c1` is correct, `q{n}-c2` is not.
pub(crate) fn mcq_assignment(points: &[i64]) -> Assignment {
    mixed_assignment(points, &[])
}

/// MCQ questions first, then essays, numbered `q1..` in that order.
pub(crate) fn mixed_assignment(mcq_points: &[i64], essay_points: &[i64]) -> Assignment {
    let mut questions = Vec::new();

    for &points in mcq_points {
        let order = questions.len() as i32 + 1;
        let id = format!("q{order}");
        questions.push(Question {
            choices: vec![
                Choice { id: format!("{id}-c1"), text: "right".to_string(), is_correct: true, order: 1 },
                Choice { id: format!("{id}-c2"), text: "wrong".to_string(), is_correct: false, order: 2 },
            ],
            id,
            kind: QuestionKind::Mcq,
            prompt: format!("Question {order}"),
            points: Points::whole(points),
            order,
        });
    }
    for &points in essay_points {
        let order = questions.len() as i32 + 1;
        questions.push(Question {
            id: format!("q{order}"),
            kind: QuestionKind::Essay,
            prompt: format!("Essay {order}"),
            points: Points::whole(points),
            order,
            choices: Vec::new(),
        });
    }

    let total: i64 = mcq_points.iter().chain(essay_points).sum();
    Assignment {
        id: "a1".to_string(),
        class_id: "class-1".to_string(),
        created_by: "teacher-1".to_string(),
        title: "Quiz".to_string(),
        description: None,
        duration_minutes: 30,
        max_attempts: 1,
        total_points: total as i32,
        open_at: None,
        close_at: None,
        created_at: CREATED_AT,
        updated_at: CREATED_AT,
        questions,
    }
}

pub(crate) fn attempt_for(assignment: &Assignment, started_at: PrimitiveDateTime) -> Attempt {
    new_attempt(assignment, "attempt-1".to_string(), "student-1", 0, started_at)
}

pub(crate) fn mcq_draft(points: &[f64]) -> AssignmentDraft {
    draft_with(points.iter().enumerate().map(|(index, &points)| QuestionDraft {
        kind: QuestionKind::Mcq,
        prompt: format!("Question {}", index + 1),
        points,
        choices: vec![ChoiceDraft { text: "Yes".to_string() }, ChoiceDraft { text: "No".to_string() }],
        correct_index: 0,
    }))
}

pub(crate) fn essay_draft(points: &[f64]) -> AssignmentDraft {
    draft_with(points.iter().enumerate().map(|(index, &points)| QuestionDraft {
        kind: QuestionKind::Essay,
        prompt: format!("Essay {}", index + 1),
        points,
        choices: Vec::new(),
        correct_index: 0,
    }))
}

/// Two MCQ questions (2 and 3 points) followed by a 5 point essay.
pub(crate) fn mixed_draft() -> AssignmentDraft {
    let mut draft = mcq_draft(&[2.0, 3.0]);
    draft.questions.extend(essay_draft(&[5.0]).questions);
    draft.total_points = 10;
    draft
}

fn draft_with(questions: impl Iterator<Item = QuestionDraft>) -> AssignmentDraft {
    let mut draft = AssignmentDraft::new("Quiz");
    draft.questions = questions.collect();
    draft.total_points = draft.questions.iter().map(|question| question.points).sum::<f64>() as i32;
    draft
}
