//! Capture-group extraction from response bodies.
//!
//! An [`ExtractionPattern`] is compiled once, before the dependent request is
//! looked up, so a malformed pattern never costs a resend. Patterns use
//! multi-line semantics: `^` and `$` match at line boundaries, which matters
//! for bodies such as `key=value` listings. `\n`, `\r\n` and `\r` all end a
//! line, and `.` matches neither `\r` nor `\n`, so CRLF bodies extract the
//! same values as LF bodies.
//!
//! Whether a pattern has a capture group is read from the compiled regex
//! rather than by scanning for parentheses, so escaped parentheses and
//! non-capturing groups `(?:...)` are handled exactly.
//!
//! # Examples
//!
//! ```rust
//! use response_regex::pattern::ExtractionPattern;
//!
//! # fn example() -> Result<(), response_regex::core::ExtractError> {
//! let pattern = ExtractionPattern::new(r"token=(\w+)")?;
//! assert_eq!(pattern.first_capture("token=ABC123"), Some("ABC123"));
//! # Ok(())
//! # }
//! ```

use regex::{Regex, RegexBuilder};
use tracing::trace;

use crate::constants::LOG_TARGET;
use crate::core::{ExtractError, PatternError};

/// A validated pattern with at least one capture group.
#[derive(Debug, Clone)]
pub struct ExtractionPattern {
    regex: Regex,
    original_pattern: String,
}

impl ExtractionPattern {
    /// Compile and validate a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidPattern`] if the pattern does not
    /// compile or has no capture group.
    pub fn new(pattern: &str) -> Result<Self, ExtractError> {
        let invalid = |reason: PatternError| ExtractError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        // `\r\n` and a lone `\r` end a line too, so `$` and `.` behave on CRLF bodies
        let regex = RegexBuilder::new(pattern)
            .multi_line(true)
            .crlf(true)
            .build()
            .map_err(|e| invalid(PatternError::Syntax(e)))?;

        // Group 0 is the whole match and always present.
        if regex.captures_len() < 2 {
            return Err(invalid(PatternError::NoCaptureGroup));
        }

        Ok(Self {
            regex,
            original_pattern: pattern.to_string(),
        })
    }

    /// Text of the first capture group of the first match.
    ///
    /// Later matches are ignored. Returns `None` when nothing matches or when
    /// the first group did not take part in the match, e.g. `(a)?b` against
    /// `"b"`.
    #[must_use]
    pub fn first_capture<'h>(&self, body: &'h str) -> Option<&'h str> {
        let captures = self.regex.captures(body)?;
        let group = captures.get(1);
        trace!(
            target: LOG_TARGET,
            pattern = %self.original_pattern,
            match_start = captures.get(0).map_or(0, |m| m.start()),
            captured = group.is_some(),
            "Ran extraction pattern"
        );
        group.map(|m| m.as_str())
    }

    /// Extract the first capture group from `body`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::NoMatch`] when [`first_capture`](Self::first_capture)
    /// finds nothing.
    pub fn extract(&self, body: &str) -> Result<String, ExtractError> {
        self.first_capture(body).map(str::to_string).ok_or(ExtractError::NoMatch)
    }

    /// The pattern as supplied.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.original_pattern
    }

    /// Number of explicit capture groups.
    #[must_use]
    pub fn capture_group_count(&self) -> usize {
        self.regex.captures_len() - 1
    }
}
