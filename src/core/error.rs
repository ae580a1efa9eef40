//! Error handling for the response regex tag
//!
//! Two layers, as elsewhere in this crate:
//! - [`ExtractError`] - the terminal failures of a single tag evaluation
//! - [`ErrorContext`] - a wrapper adding user-facing details and suggestions
//!
//! Every failure is terminal. Nothing here is retried; charset problems never
//! show up as errors because body decoding recovers from them locally.
//!
//! # Examples
//!
//! ```rust,no_run
//! use response_regex::core::{ExtractError, user_friendly_error};
//!
//! let error = ExtractError::RequestNotFound { id: "req_1".to_string() };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // colored error with suggestion on stderr
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Why a pattern was rejected before any request lookup.
#[derive(Error, Debug, Clone)]
pub enum PatternError {
    /// The pattern does not compile.
    #[error("{0}")]
    Syntax(#[from] regex::Error),

    /// The pattern compiles but has nothing to return.
    #[error("The regex must specify at least one capture group")]
    NoCaptureGroup,
}

/// Terminal failures of a tag evaluation.
///
/// Pattern and request id problems are reported before the request store is
/// touched. Response problems are reported after the cached lookup and any
/// resend have completed.
#[derive(Error, Debug, Clone)]
pub enum ExtractError {
    /// No request reference was supplied
    #[error("No request specified")]
    MissingRequestId,

    /// The request reference does not resolve in the request store
    #[error("Could not find request {id}")]
    RequestNotFound {
        /// The unresolved request id
        id: String,
    },

    /// The pattern failed to compile or lacks a capture group
    #[error("Invalid regex '{pattern}': {reason}")]
    InvalidPattern {
        /// Pattern as supplied by the user
        pattern: String,
        /// What is wrong with it
        reason: PatternError,
    },

    /// Neither the cache nor a resend produced a response
    #[error("No responses for request")]
    NoResponse,

    /// The response carries a transport error marker
    #[error("Failed to send dependent request {error}")]
    DependentRequestFailed {
        /// Error recorded by the transport
        error: String,
    },

    /// The response exists but never completed with a status code
    #[error("No successful responses for request")]
    NoSuccessfulResponse,

    /// The pattern ran but produced no usable capture
    #[error("The provided regex didn't match the response's body")]
    NoMatch,
}

impl ExtractError {
    /// Whether this failure was detected before any store access.
    #[must_use]
    pub const fn is_validation_error(&self) -> bool {
        matches!(self, Self::MissingRequestId | Self::InvalidPattern { .. })
    }
}

/// Error wrapper with user-facing details and a suggestion.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: anyhow::Error,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context without details or suggestion.
    #[must_use]
    pub const fn new(error: anyhow::Error) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr: error in red, details in yellow, suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {:#}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

/// Convert any error into an [`ErrorContext`] with suggestions where we know the cause.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let Some(extract_error) = error.downcast_ref::<ExtractError>() else {
        if error.downcast_ref::<toml::de::Error>().is_some() {
            return ErrorContext::new(error)
                .with_suggestion("Check the TOML syntax of the configuration file")
                .with_details("Supported keys are trigger_behavior and max_age_seconds");
        }
        if error.downcast_ref::<serde_json::Error>().is_some() {
            return ErrorContext::new(error)
                .with_suggestion("Check that the fixture file is valid JSON")
                .with_details("Fixtures hold requests, responses and optional resend responses");
        }
        return ErrorContext::new(error);
    };

    let (suggestion, details) = match extract_error {
        ExtractError::MissingRequestId => (
            "Select the request whose response should be used",
            "The tag has no request reference configured",
        ),
        ExtractError::RequestNotFound { .. } => (
            "Pick an existing request; the referenced one may have been deleted",
            "The request id does not resolve in the request store",
        ),
        ExtractError::InvalidPattern { reason: PatternError::NoCaptureGroup, .. } => (
            "Wrap the part of the pattern you want returned in parentheses, e.g. token=(\\w+)",
            "Only the text of the first capture group is returned",
        ),
        ExtractError::InvalidPattern { .. } => (
            "Fix the regex syntax; unbalanced parentheses and stray quantifiers are common causes",
            "The pattern is compiled before the dependent request is looked up",
        ),
        ExtractError::NoResponse => (
            "Send the dependent request once, or use a trigger behavior that resends it",
            "Previews never send requests, so a request without history has nothing to read",
        ),
        ExtractError::DependentRequestFailed { .. } => (
            "Check that the dependent request can be sent successfully on its own",
            "The transport recorded an error for the latest response",
        ),
        ExtractError::NoSuccessfulResponse => (
            "Resend the dependent request and wait for it to complete",
            "The latest response has no status code",
        ),
        ExtractError::NoMatch => (
            "Check the pattern against the dependent response's body",
            "Only the first match is used",
        ),
    };

    ErrorContext::new(error).with_suggestion(suggestion).with_details(details)
}
