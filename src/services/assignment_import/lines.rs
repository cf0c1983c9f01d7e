/// Assignment-level keys accepted before the first question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum MetaKey {
    Title,
    Description,
    TotalPoints,
    Duration,
    MaxAttempts,
    OpenAt,
    CloseAt,
}

/// Keys accepted inside a question block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum FieldKey {
    Type,
    Points,
    Choices,
    Answer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum LineKind<'a> {
    Blank,
    Question(&'a str),
    Meta(MetaKey, &'a str),
    Field(FieldKey, &'a str),
    Choice(&'a str),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Line<'a> {
    pub(super) number: usize,
    pub(super) kind: LineKind<'a>,
}

const META_KEYS: &[(&str, MetaKey)] = &[
    ("Title:", MetaKey::Title),
    ("Description:", MetaKey::Description),
    ("TotalPoints:", MetaKey::TotalPoints),
    ("Duration:", MetaKey::Duration),
    ("MaxAttempts:", MetaKey::MaxAttempts),
    ("OpenAt:", MetaKey::OpenAt),
    ("CloseAt:", MetaKey::CloseAt),
];

const FIELD_KEYS: &[(&str, FieldKey)] = &[
    ("Type:", FieldKey::Type),
    ("Points:", FieldKey::Points),
    ("Choices:", FieldKey::Choices),
    ("Answer:", FieldKey::Answer),
];

pub(super) fn tokenize(raw: &str) -> Vec<Line<'_>> {
    raw.lines()
        .enumerate()
        .map(|(index, text)| Line { number: index + 1, kind: classify(text) })
        .collect()
}

fn classify(text: &str) -> LineKind<'_> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }

    if let Some(prompt) = strip_prefix_ignore_case(trimmed, "Q:") {
        return LineKind::Question(prompt.trim());
    }
    for (prefix, key) in META_KEYS {
        if let Some(value) = strip_prefix_ignore_case(trimmed, prefix) {
            return LineKind::Meta(*key, value.trim());
        }
    }
    for (prefix, key) in FIELD_KEYS {
        if let Some(value) = strip_prefix_ignore_case(trimmed, prefix) {
            return LineKind::Field(*key, value.trim());
        }
    }
    if let Some(text) = strip_choice_marker(trimmed) {
        return LineKind::Choice(text.trim());
    }

    LineKind::Other
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &text[prefix.len()..])
}

/// `- text`, `B) text` or `2) text`.
fn strip_choice_marker(text: &str) -> Option<&str> {
    if let Some(rest) = text.strip_prefix('-') {
        return Some(rest);
    }

    let mut chars = text.char_indices();
    let (_, marker) = chars.next()?;
    let (paren_at, paren) = chars.next()?;
    if paren == ')' && marker.is_alphanumeric() {
        return Some(&text[paren_at + 1..]);
    }
    None
}
