use std::fmt::Write as _;

use time::macros::format_description;
use time::PrimitiveDateTime;

use super::{ImportOptions, ANSWER_LETTERS};
use crate::core::time::utc_to_local;
use crate::db::types::QuestionKind;
use crate::domain::Points;
use crate::schemas::AssignmentDraft;

/// Renders a draft in the import format. Line breaks inside texts become spaces.
pub fn export_text(draft: &AssignmentDraft, options: &ImportOptions) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Title: {}", single_line(&draft.title));
    if let Some(description) = draft.description.as_deref().filter(|value| !value.is_empty()) {
        let _ = writeln!(out, "Description: {}", single_line(description));
    }
    let _ = writeln!(out, "TotalPoints: {}", draft.total_points);
    let _ = writeln!(out, "Duration: {}", draft.duration_minutes);
    let _ = writeln!(out, "MaxAttempts: {}", draft.max_attempts);
    if let Some(open_at) = draft.open_at {
        let _ = writeln!(out, "OpenAt: {}", format_local(open_at, options));
    }
    if let Some(close_at) = draft.close_at {
        let _ = writeln!(out, "CloseAt: {}", format_local(close_at, options));
    }

    for question in &draft.questions {
        out.push('\n');
        let _ = writeln!(out, "Q: {}", single_line(&question.prompt));
        let _ = writeln!(out, "Type: {}", question.kind.as_str());
        let points = Points::from_f64(question.points)
            .map_or_else(|| question.points.to_string(), |points| points.to_string());
        let _ = writeln!(out, "Points: {points}");

        if question.kind == QuestionKind::Mcq && !question.choices.is_empty() {
            out.push_str("Choices:\n");
            for (index, choice) in question.choices.iter().enumerate() {
                match ANSWER_LETTERS.as_bytes().get(index) {
                    Some(letter) => {
                        let _ = writeln!(out, "{}) {}", *letter as char, single_line(&choice.text));
                    }
                    None => {
                        let _ = writeln!(out, "- {}", single_line(&choice.text));
                    }
                }
            }
            let _ = writeln!(out, "Answer: {}", answer_token(question.correct_index));
        }
    }

    out
}

fn answer_token(correct_index: i32) -> String {
    usize::try_from(correct_index)
        .ok()
        .and_then(|index| ANSWER_LETTERS.as_bytes().get(index))
        .map_or_else(|| (correct_index + 1).to_string(), |letter| (*letter as char).to_string())
}

fn format_local(value: PrimitiveDateTime, options: &ImportOptions) -> String {
    let local = utc_to_local(value, options.utc_offset);
    let format = format_description!("[day]/[month]/[year] [hour]:[minute]");
    local.format(format).unwrap_or_else(|_| local.to_string())
}

fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ").trim().to_string()
}
