//! Line-level filtering before parsing.

use lh_error::{HarvestError, Result};
use serde::{Deserialize, Serialize};

/// Replaces a two-character escape marker with the character it stands for.
///
/// Some log writers substitute characters that are awkward in object keys or
/// field values; `~1` for `/` is the common case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscapeRule {
    /// Two-character marker, e.g. `~1`
    pub marker: String,

    /// Original character, e.g. `/`
    pub replacement: char,
}

impl EscapeRule {
    /// Create a rule. The marker must be exactly two characters.
    pub fn new(marker: impl Into<String>, replacement: char) -> Result<Self> {
        let marker = marker.into();
        if marker.chars().count() != 2 {
            return Err(HarvestError::Config(format!(
                "Escape marker must be two characters, got '{marker}'"
            )));
        }
        Ok(Self { marker, replacement })
    }

    /// Parse `MARKER=CHAR`, e.g. `~1=/`.
    pub fn parse(input: &str) -> Result<Self> {
        let (marker, replacement) = input
            .split_once('=')
            .ok_or_else(|| HarvestError::Config(format!("Invalid escape rule '{input}', expected MARKER=CHAR")))?;

        let mut chars = replacement.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::new(marker, c),
            _ => Err(HarvestError::Config(format!(
                "Escape replacement must be one character, got '{replacement}'"
            ))),
        }
    }

    fn apply(&self, line: &str) -> String {
        line.replace(&self.marker, self.replacement.encode_utf8(&mut [0; 4]))
    }
}

impl Default for EscapeRule {
    fn default() -> Self {
        Self {
            marker: "~1".to_string(),
            replacement: '/',
        }
    }
}

/// Drops non-record lines and undoes escape substitutions.
///
/// Dropped lines are not errors: blank lines and `#` directives such as
/// `#Fields:` are part of normal W3C output.
#[derive(Debug, Clone)]
pub struct RecordFilter {
    comment_marker: char,
    escapes: Vec<EscapeRule>,
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self {
            comment_marker: '#',
            escapes: vec![EscapeRule::default()],
        }
    }
}

impl RecordFilter {
    /// Create a filter with the default `#` comment marker and `~1` rule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the escape rules.
    pub fn with_escapes(mut self, escapes: Vec<EscapeRule>) -> Self {
        self.escapes = escapes;
        self
    }

    /// Set the comment marker.
    pub fn with_comment_marker(mut self, marker: char) -> Self {
        self.comment_marker = marker;
        self
    }

    /// Filter one raw line.
    ///
    /// The line may still carry its `\n` or `\r\n` terminator. Invalid UTF-8
    /// is replaced rather than rejected.
    ///
    /// # Returns
    ///
    /// The cleaned record text, or `None` if the line is not a record.
    pub fn filter(&self, line: &[u8]) -> Option<String> {
        let raw = String::from_utf8_lossy(line);
        let text = raw.strip_suffix('\n').unwrap_or(raw.as_ref());
        let text = text.strip_suffix('\r').unwrap_or(text);

        if text.is_empty() || text.starts_with(self.comment_marker) {
            return None;
        }

        Some(
            self.escapes
                .iter()
                .fold(text.to_string(), |acc, rule| rule.apply(&acc)),
        )
    }
}
