//! Type-ahead query patterns.
//!
//! A [`QueryPattern`] turns free text typed into a search box into a
//! tolerant matcher over display names:
//!
//! - every whitespace-separated word of the query must appear in the name,
//!   in the same relative order,
//! - each word must start at a word boundary of the name (so `sm` finds
//!   "John Smith" but not "Osmond"),
//! - matching is case-insensitive and any text may sit between words.
//!
//! Blank input produces [`QueryPattern::Any`], which passes every non-blank
//! name.
//!
//! # Example
//!
//! ```rust
//! # use taskbridge_directory::pattern::QueryPattern;
//! let pattern = QueryPattern::build("jo sm");
//! assert!(pattern.matches("John Smith"));
//! assert!(pattern.matches("Jonathan Smithson"));
//! assert!(!pattern.matches("Smith John"));
//! ```

use regex::{Regex, RegexBuilder};

/// A compiled type-ahead matcher.
#[derive(Debug, Clone)]
pub enum QueryPattern {
    /// No filter: the query was blank.
    Any,
    /// Ordered, word-anchored fragments.
    Words(Regex),
}

impl QueryPattern {
    /// Build a pattern from raw query text.
    ///
    /// Never fails: a query that cannot be compiled (for instance one that
    /// blows the regex size limit) degrades to [`QueryPattern::Any`].
    pub fn build(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Self::Any;
        }

        let expression = words_expression(trimmed);
        match RegexBuilder::new(&expression)
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
        {
            Ok(compiled) => {
                tracing::trace!(query = %trimmed, pattern = %expression, "query pattern built");
                Self::Words(compiled)
            }
            Err(e) => {
                tracing::warn!(
                    query = %trimmed,
                    error = %e,
                    "query pattern rejected, falling back to no filter"
                );
                Self::Any
            }
        }
    }

    /// Whether this is the "no filter" sentinel.
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Test a display name against the pattern.
    ///
    /// [`QueryPattern::Any`] accepts any name with non-whitespace content.
    /// [`QueryPattern::Words`] accepts a name as soon as one match is found
    /// anywhere in it.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Any => !name.trim().is_empty(),
            Self::Words(compiled) => compiled.is_match(name),
        }
    }

    /// The regex source, or `None` for [`QueryPattern::Any`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Any => None,
            Self::Words(compiled) => Some(compiled.as_str()),
        }
    }
}

/// Join escaped fragments with a lazy gap, anchoring each at a word start.
///
/// A fragment that itself starts with a non-word character (e.g. `@ann` or
/// `(contractor)`) has no boundary to respect and is left unanchored.
fn words_expression(trimmed: &str) -> String {
    trimmed
        .split_whitespace()
        .map(|fragment| {
            let escaped = regex::escape(fragment);
            if starts_with_word_char(fragment) {
                format!(r"\b{escaped}")
            } else {
                escaped
            }
        })
        .collect::<Vec<_>>()
        .join(".*?")
}

fn starts_with_word_char(fragment: &str) -> bool {
    fragment
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
