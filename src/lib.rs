//! Response regex template tag
//!
//! A template tag for HTTP clients that pulls a value out of another request's
//! response: `{% responseRegex 'req_login', 'token=(\w+)', 'when-expired', 60 %}`
//! evaluates to the first capture group of the regex applied to the latest
//! response of `req_login`, resending the request first when it is missing or
//! stale.
//!
//! # Architecture Overview
//!
//! Evaluation is a short pipeline over host-provided services:
//!
//! 1. **Pattern** - compile the regex and require a capture group
//! 2. **Lookup** - resolve the request and its latest response in the environment
//! 3. **Policy** - decide whether to resend from the trigger behavior and max age
//! 4. **Guards** - never resend a request twice per render, never resend outside
//!    of a send render
//! 5. **Validation** - the response must exist, be error free and carry a status
//! 6. **Extraction** - decode the body by its charset and take the first capture
//!
//! The host (request storage, response storage and transport) sits behind the
//! traits in [`host`]; [`host::MemoryHost`] implements all of them for the CLI
//! and for tests.
//!
//! # Core Modules
//!
//! - [`tag`] - the [`ResponseRegex`](tag::ResponseRegex) engine, argument parsing
//!   and the tag definition
//! - [`policy`] - trigger behaviors and the resend decision
//! - [`chain`] - the request chain guarding against recursive resends
//! - [`pattern`] - capture group extraction
//! - [`decode`] - charset aware body decoding
//! - [`host`] - host traits, render context and the in-memory host
//! - [`models`] - requests, response descriptors and render purposes
//! - [`core`] - error types and user-facing error rendering
//! - [`config`] - defaults for absent tag arguments
//! - [`cli`] - the `response-regex` command line
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use response_regex::host::{MemoryHost, RenderContext};
//! use response_regex::models::{RenderPurpose, Request};
//! use response_regex::tag::ResponseRegex;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let host = Arc::new(MemoryHost::new());
//! host.add_request(Request::new("req_login", "Login"));
//!
//! let tag = ResponseRegex::new(host);
//! let mut ctx = RenderContext::new(RenderPurpose::Preview);
//! let args = [serde_json::json!("req_login"), serde_json::json!(r"token=(\w+)")];
//! match tag.run_with_args(&mut ctx, &args).await {
//!     Ok(token) => println!("{token}"),
//!     Err(e) => eprintln!("{e}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod chain;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod decode;
pub mod host;
pub mod models;
pub mod pattern;
pub mod policy;
pub mod tag;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
