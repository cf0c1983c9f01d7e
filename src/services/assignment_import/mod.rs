//! Line-oriented text format for bulk-authoring assignments.
//!
//! ```text
//! Title: Week 3 quiz
//! TotalPoints: 5
//! Duration: 20
//! OpenAt: 01/03/2025 08:00
//!
//! Q: 2 + 2 = ?
//! Points: 2
//! Choices:
//! A) 3
//! B) 4
//! Answer: B
//!
//! Q: Explain your reasoning.
//! Type: essay
//! Points: 3
//! ```

mod export;
mod lines;

use time::macros::format_description;
use time::{Date, PrimitiveDateTime, Time, UtcOffset};

use crate::core::time::local_to_utc;
use crate::db::types::QuestionKind;
use crate::domain::{Points, PointsError};
use crate::errors::{GradebookError, GradebookResult};
use crate::schemas::{AssignmentDraft, ChoiceDraft, QuestionDraft};
use crate::services::assignment_validation::{MAX_TOTAL_POINTS, MIN_MCQ_CHOICES, MIN_TOTAL_POINTS};

pub use export::export_text;
use lines::{tokenize, FieldKey, Line, LineKind, MetaKey};

const ANSWER_LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
    /// Offset the file's wall-clock dates are written in.
    pub utc_offset: UtcOffset,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self { utc_offset: UtcOffset::UTC }
    }
}

/// Parses the text format into a draft. Any failure discards the whole draft.
pub fn parse_assignment_text(raw: &str, options: &ImportOptions) -> GradebookResult<AssignmentDraft> {
    if raw.trim().is_empty() {
        return Err(GradebookError::format_at(1, "Empty file"));
    }

    let lines = tokenize(raw);
    let mut parser = Parser { lines: &lines, pos: 0, options };
    parser.parse()
}

struct Parser<'l, 'a> {
    lines: &'l [Line<'a>],
    pos: usize,
    options: &'l ImportOptions,
}

struct MetaState {
    total_points_line: Option<usize>,
}

impl<'l, 'a> Parser<'l, 'a> {
    fn peek(&self) -> Option<&'l Line<'a>> {
        self.lines.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'l Line<'a>> {
        let line = self.lines.get(self.pos)?;
        self.pos += 1;
        Some(line)
    }

    fn last_line_number(&self) -> usize {
        self.lines.last().map_or(1, |line| line.number)
    }

    fn skip_blank(&mut self) {
        while matches!(self.peek(), Some(Line { kind: LineKind::Blank, .. })) {
            self.pos += 1;
        }
    }

    fn parse(&mut self) -> GradebookResult<AssignmentDraft> {
        let mut draft = AssignmentDraft::new(String::new());
        let meta = self.parse_metadata(&mut draft)?;

        if draft.title.trim().is_empty() {
            let line = self.peek().map_or_else(|| self.last_line_number(), |line| line.number);
            return Err(GradebookError::format_at(line, "Missing Title"));
        }

        loop {
            self.skip_blank();
            let Some(header) = self.advance() else {
                break;
            };
            let LineKind::Question(prompt) = header.kind else {
                return Err(GradebookError::format_at(header.number, "Expected a 'Q:' line"));
            };
            let question = self.parse_question(header.number, prompt)?;
            draft.questions.push(question);
        }

        if draft.questions.is_empty() {
            return Err(GradebookError::format_at(
                self.last_line_number(),
                "At least one question is required",
            ));
        }

        let total: Points = draft
            .questions
            .iter()
            .filter_map(QuestionDraft::checked_points)
            .sum();
        if total != Points::whole(i64::from(draft.total_points)) {
            return Err(GradebookError::format_at(
                meta.total_points_line.unwrap_or(1),
                format!("Total points must be {}. Current total: {total}", draft.total_points),
            ));
        }

        Ok(draft)
    }

    fn parse_metadata(&mut self, draft: &mut AssignmentDraft) -> GradebookResult<MetaState> {
        let mut state = MetaState { total_points_line: None };

        while let Some(line) = self.peek() {
            if matches!(line.kind, LineKind::Question(_)) {
                break;
            }
            self.pos += 1;

            let LineKind::Meta(key, value) = line.kind else {
                continue;
            };
            match key {
                MetaKey::Title => draft.title = value.to_string(),
                MetaKey::Description => {
                    draft.description = (!value.is_empty()).then(|| value.to_string());
                }
                MetaKey::TotalPoints => {
                    let total = parse_int(value, "TotalPoints", line.number)?;
                    if !(MIN_TOTAL_POINTS..=MAX_TOTAL_POINTS).contains(&total) {
                        return Err(GradebookError::format_at(
                            line.number,
                            format!(
                                "TotalPoints must be between {MIN_TOTAL_POINTS} and {MAX_TOTAL_POINTS}"
                            ),
                        ));
                    }
                    draft.total_points = total;
                    state.total_points_line = Some(line.number);
                }
                MetaKey::Duration => {
                    draft.duration_minutes = parse_int(value, "Duration", line.number)?;
                }
                MetaKey::MaxAttempts => {
                    draft.max_attempts = parse_int(value, "MaxAttempts", line.number)?;
                }
                MetaKey::OpenAt => {
                    draft.open_at = self.parse_date(value, "OpenAt", line.number)?;
                }
                MetaKey::CloseAt => {
                    draft.close_at = self.parse_date(value, "CloseAt", line.number)?;
                }
            }
        }

        Ok(state)
    }

    fn parse_question(&mut self, header_line: usize, prompt: &str) -> GradebookResult<QuestionDraft> {
        let mut question = QuestionDraft {
            kind: QuestionKind::Mcq,
            prompt: prompt.to_string(),
            points: 1.0,
            choices: Vec::new(),
            correct_index: 0,
        };
        let mut answer_line = None;

        while let Some(line) = self.peek() {
            if matches!(line.kind, LineKind::Blank | LineKind::Question(_)) {
                break;
            }
            self.pos += 1;

            let LineKind::Field(key, value) = line.kind else {
                continue;
            };
            match key {
                FieldKey::Type => {
                    question.kind = if value.to_lowercase().starts_with("mcq") {
                        QuestionKind::Mcq
                    } else {
                        QuestionKind::Essay
                    };
                }
                FieldKey::Points => {
                    let points = Points::parse(value).map_err(|err| match err {
                        PointsError::Invalid => GradebookError::format_at(line.number, "Invalid Points"),
                        PointsError::Negative | PointsError::NotHalfStep => GradebookError::format_at(
                            line.number,
                            "Each question's Points must be non-negative and a multiple of 0.5",
                        ),
                    })?;
                    question.points = points.as_f64();
                }
                FieldKey::Choices => self.parse_choices(&mut question.choices)?,
                FieldKey::Answer => {
                    question.correct_index = parse_answer_index(value);
                    answer_line = Some(line.number);
                }
            }
        }

        if question.prompt.is_empty() {
            return Err(GradebookError::format_at(header_line, "A question is missing its prompt"));
        }

        match question.kind {
            QuestionKind::Mcq => {
                if question.choices.len() < MIN_MCQ_CHOICES {
                    return Err(GradebookError::format_at(
                        header_line,
                        format!("MCQ must have at least {MIN_MCQ_CHOICES} choices"),
                    ));
                }
                let in_range = usize::try_from(question.correct_index)
                    .is_ok_and(|index| index < question.choices.len());
                if !in_range {
                    return Err(GradebookError::format_at(
                        answer_line.unwrap_or(header_line),
                        "MCQ Answer index is invalid",
                    ));
                }
            }
            QuestionKind::Essay => {
                question.choices.clear();
                question.correct_index = 0;
            }
        }

        Ok(question)
    }

    fn parse_choices(&mut self, choices: &mut Vec<ChoiceDraft>) -> GradebookResult<()> {
        while let Some(line) = self.peek() {
            let LineKind::Choice(text) = line.kind else {
                break;
            };
            self.pos += 1;

            if text.is_empty() {
                return Err(GradebookError::format_at(line.number, "Choice text cannot be empty"));
            }
            choices.push(ChoiceDraft { text: text.to_string() });
        }
        Ok(())
    }

    fn parse_date(
        &self,
        value: &str,
        field: &str,
        line: usize,
    ) -> GradebookResult<Option<PrimitiveDateTime>> {
        if value.is_empty() {
            return Ok(None);
        }

        let with_time = format_description!("[day]/[month]/[year] [hour]:[minute]");
        let date_only = format_description!("[day]/[month]/[year]");
        let local = PrimitiveDateTime::parse(value, with_time)
            .or_else(|_| {
                Date::parse(value, date_only).map(|date| PrimitiveDateTime::new(date, Time::MIDNIGHT))
            })
            .map_err(|_| {
                GradebookError::format_at(line, format!("Invalid {field} format. Use dd/MM/yyyy HH:mm"))
            })?;

        Ok(Some(local_to_utc(local, self.options.utc_offset)))
    }
}

fn parse_int(value: &str, field: &str, line: usize) -> GradebookResult<i32> {
    value.parse::<i32>().map_err(|_| GradebookError::format_at(line, format!("Invalid {field}")))
}

/// A 1-based number (clamped to the first choice) or a letter; anything else is out of range.
fn parse_answer_index(value: &str) -> i32 {
    if let Ok(number) = value.parse::<i32>() {
        return number.max(1) - 1;
    }

    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) => ANSWER_LETTERS
            .find(letter.to_ascii_uppercase())
            .map_or(-1, |index| index as i32),
        _ => -1,
    }
}
