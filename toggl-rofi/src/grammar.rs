//! The one-line entry language: `<description> [@<project>] [#<tag> #<tag> ...]`.
//!
//! `\@`, `\#` and `\\` stand for the literal characters anywhere in the
//! line; every other backslash is kept as typed.

use std::fmt;
use thiserror::Error;

/// Separator between the fields of the canonical form.
const FIELD_SEPARATOR: &str = "    ";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("entry is empty")]
    Empty,
    #[error("entry has no description: {0:?}")]
    MissingDescription(String),
}

/// A successfully parsed entry line.
///
/// Only [`parse`] builds these, so every value has a non-empty description,
/// a lower-cased project and lower-cased, deduplicated, non-empty tags.
#[derive(Debug, Clone, Eq)]
pub struct ParsedEntry {
    original: String,
    description: String,
    project: Option<String>,
    tags: Vec<String>,
}

impl ParsedEntry {
    /// The text this entry was parsed from.
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// Equality ignores the original text.
impl PartialEq for ParsedEntry {
    fn eq(&self, other: &Self) -> bool {
        self.description == other.description
            && self.project == other.project
            && self.tags == other.tags
    }
}

impl fmt::Display for ParsedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize(self))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Char(char),
    At,
    Hash,
}

fn tokenize(raw: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some(&next @ ('@' | '#' | '\\')) => {
                    tokens.push(Token::Char(next));
                    chars.next();
                }
                _ => tokens.push(Token::Char('\\')),
            },
            '@' => tokens.push(Token::At),
            '#' => tokens.push(Token::Hash),
            c => tokens.push(Token::Char(c)),
        }
    }
    tokens
}

#[derive(Clone, Copy)]
enum Segment {
    Description,
    Project,
    Tags,
}

/// Parse one entry line.
pub fn parse(raw: &str) -> Result<ParsedEntry, ParseError> {
    if raw.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let tokens = tokenize(raw);
    // Without a project marker the first `#` ends the description.
    let has_project = tokens.contains(&Token::At);

    let mut description = String::new();
    let mut project: Option<String> = None;
    let mut raw_tags: Vec<String> = Vec::new();
    let mut segment = Segment::Description;

    for token in tokens {
        match (segment, token) {
            (Segment::Description, Token::At) => {
                segment = Segment::Project;
                project = Some(String::new());
            }
            (Segment::Description, Token::Hash) if !has_project => {
                segment = Segment::Tags;
                raw_tags.push(String::new());
            }
            (Segment::Description, Token::Hash) => description.push('#'),
            (Segment::Description, Token::Char(c)) => description.push(c),
            (Segment::Project, Token::Hash) | (Segment::Tags, Token::Hash) => {
                segment = Segment::Tags;
                raw_tags.push(String::new());
            }
            (Segment::Project, Token::At) => push_to(&mut project, '@'),
            (Segment::Project, Token::Char(c)) => push_to(&mut project, c),
            (Segment::Tags, Token::At) => push_to_last(&mut raw_tags, '@'),
            (Segment::Tags, Token::Char(c)) => push_to_last(&mut raw_tags, c),
        }
    }

    let description = description.trim().to_string();
    if description.is_empty() {
        return Err(ParseError::MissingDescription(raw.to_string()));
    }

    let project = project
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty());

    let mut tags: Vec<String> = Vec::with_capacity(raw_tags.len());
    for tag in raw_tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    Ok(ParsedEntry {
        original: raw.to_string(),
        description,
        project,
        tags,
    })
}

fn push_to(target: &mut Option<String>, c: char) {
    target.get_or_insert_with(String::new).push(c);
}

fn push_to_last(targets: &mut [String], c: char) {
    if let Some(last) = targets.last_mut() {
        last.push(c);
    }
}

/// Canonical form of an entry, suitable for seeding the edit filter.
pub fn serialize(entry: &ParsedEntry) -> String {
    format_fields(&entry.description, entry.project.as_deref(), &entry.tags)
}

/// Canonical text for raw field values, e.g. from a backend time entry.
pub fn format_fields<S: AsRef<str>>(description: &str, project: Option<&str>, tags: &[S]) -> String {
    let mut parts = vec![escape(description.trim())];

    if let Some(project) = project.map(str::trim).filter(|p| !p.is_empty()) {
        parts.push(format!("@{}", escape(project)));
    }

    let tags = tags
        .iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| !t.is_empty())
        .map(|t| format!("#{}", escape(t)))
        .collect::<Vec<_>>();
    if !tags.is_empty() {
        parts.push(tags.join(" "));
    }

    parts.join(FIELD_SEPARATOR)
}

fn escape(field: &str) -> String {
    let mut escaped = String::with_capacity(field.len());
    for c in field.chars() {
        if matches!(c, '\\' | '@' | '#') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
