//! Row filtering by wildcard pattern over name, PID and ports.
//!
//! Patterns are compiled once into a [`Matcher`] and applied per row. A pattern
//! without `*` is a case-insensitive substring test; with `*` the pieces between
//! stars must occur in order anywhere in the text, so `*` matches any run of
//! characters and adding one never narrows a match. `\*` is a literal star.

use crate::error::FilterPatternError;
use crate::snapshot::{ProcessRecord, Snapshot};
use serde::{Deserialize, Serialize};

/// Which columns a pattern is tested against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterFields {
    pub name: bool,
    pub pid: bool,
    pub port: bool,
    pub owner: bool,
}

impl Default for FilterFields {
    fn default() -> Self {
        Self {
            name: true,
            pid: true,
            port: true,
            owner: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPattern {
    pub text: String,
    pub fields: FilterFields,
}

impl FilterPattern {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fields: FilterFields::default(),
        }
    }

    pub fn with_fields(mut self, fields: FilterFields) -> Self {
        self.fields = fields;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Rule {
    All,
    Substring(String),
    /// Non-empty pieces that must appear in order, without overlapping
    Glob(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matcher {
    rule: Rule,
    fields: FilterFields,
}

impl Matcher {
    pub fn compile(pattern: &FilterPattern) -> Result<Self, FilterPatternError> {
        let text = pattern.text.trim();
        let rule = if text.is_empty() {
            Rule::All
        } else {
            let (segments, wildcard) = split_segments(&text.to_lowercase())?;
            if !wildcard {
                Rule::Substring(segments.concat())
            } else {
                let pieces: Vec<String> = segments.into_iter().filter(|s| !s.is_empty()).collect();
                if pieces.is_empty() {
                    Rule::All
                } else {
                    Rule::Glob(pieces)
                }
            }
        };
        Ok(Self {
            rule,
            fields: pattern.fields,
        })
    }

    /// Like [`compile`](Self::compile), but a malformed pattern falls back to a
    /// literal substring match.
    pub fn compile_lossy(pattern: &FilterPattern) -> Self {
        Self::compile(pattern).unwrap_or_else(|e| {
            tracing::debug!(pattern = %pattern.text, error = %e, "matching pattern literally");
            Self {
                rule: Rule::Substring(pattern.text.trim().to_lowercase()),
                fields: pattern.fields,
            }
        })
    }

    pub fn matches_all(&self) -> bool {
        self.rule == Rule::All
    }

    pub fn matches(&self, record: &ProcessRecord) -> bool {
        if self.matches_all() {
            return true;
        }
        if self.fields.name && self.matches_text(&record.name.to_lowercase()) {
            return true;
        }
        if self.fields.pid && self.matches_text(&record.pid.to_string()) {
            return true;
        }
        if self.fields.port && record.ports.iter().any(|p| self.matches_text(&p.to_string())) {
            return true;
        }
        self.fields.owner && self.matches_text(&record.owner.to_lowercase())
    }

    /// `text` must already be lowercase.
    fn matches_text(&self, text: &str) -> bool {
        match &self.rule {
            Rule::All => true,
            Rule::Substring(needle) => text.contains(needle.as_str()),
            Rule::Glob(segments) => glob_match(text, segments),
        }
    }
}

/// Rows of `snapshot` matching `pattern`, in snapshot order.
pub fn filter(snapshot: &Snapshot, pattern: &FilterPattern) -> Vec<ProcessRecord> {
    filter_with(snapshot, &Matcher::compile_lossy(pattern))
}

pub fn filter_with(snapshot: &Snapshot, matcher: &Matcher) -> Vec<ProcessRecord> {
    snapshot
        .processes
        .iter()
        .filter(|p| matcher.matches(p))
        .cloned()
        .collect()
}

/// Split on unescaped `*`. Returns the segments and whether any wildcard was seen.
fn split_segments(text: &str) -> Result<(Vec<String>, bool), FilterPatternError> {
    let mut segments = vec![String::new()];
    let mut wildcard = false;
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escaped = chars.next().ok_or(FilterPatternError::DanglingEscape)?;
                if let Some(last) = segments.last_mut() {
                    last.push(escaped);
                }
            }
            '*' => {
                wildcard = true;
                segments.push(String::new());
            }
            _ => {
                if let Some(last) = segments.last_mut() {
                    last.push(c);
                }
            }
        }
    }
    Ok((segments, wildcard))
}

fn glob_match(text: &str, pieces: &[String]) -> bool {
    let mut remaining = text;
    for piece in pieces {
        match remaining.find(piece.as_str()) {
            Some(at) => remaining = &remaining[at + piece.len()..],
            None => return false,
        }
    }
    true
}
