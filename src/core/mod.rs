//! Core types for the response regex tag
//!
//! Error handling lives here so every other module reports failures the same
//! way:
//! - [`ExtractError`] - terminal failures of a tag evaluation
//! - [`PatternError`] - why a pattern was rejected
//! - [`ErrorContext`] and [`user_friendly_error`] - CLI-facing presentation

pub mod error;

pub use error::{ErrorContext, ExtractError, PatternError, user_friendly_error};
