//! Boundary to the host application.
//!
//! The tag does not store requests, persist responses, or talk to the
//! network. The host provides those through three traits:
//!
//! - [`RequestStore`] - resolve a request id to a stored request
//! - [`ResponseStore`] - latest response per request and environment, and its body
//! - [`Transport`] - send a request and wait for the response
//!
//! Async methods return [`BoxFuture`] so the traits stay object safe and the
//! engine can hold them behind `Arc<dyn ...>`.
//!
//! The [`RenderContext`] describes the render the tag is evaluated in. It is
//! the only state carried across nested renders: the request chain lives in
//! its extra info under [`REQUEST_CHAIN_KEY`].

pub mod memory;

use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::chain::RequestChain;
use crate::constants::{LOG_TARGET, REQUEST_CHAIN_KEY};
use crate::models::{ExtraInfo, RenderPurpose, Request, ResponseDescriptor};

pub use memory::{MemoryHost, SentRequest};

/// Lookup of stored request definitions.
pub trait RequestStore: Send + Sync {
    /// Resolve `id`, or `None` if no such request exists.
    fn get_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Option<Request>>;
}

/// Lookup of recorded responses.
pub trait ResponseStore: Send + Sync {
    /// Latest response recorded for `request_id` in `environment_id`.
    fn latest_for_request<'a>(
        &'a self,
        request_id: &'a str,
        environment_id: Option<&'a str>,
    ) -> BoxFuture<'a, Option<ResponseDescriptor>>;

    /// Raw body bytes of `response`; empty when the body is unavailable.
    fn body_buffer(&self, response: &ResponseDescriptor) -> Vec<u8>;
}

/// Sends requests on behalf of the tag.
///
/// Failures are not errors at this boundary: the transport records them in
/// [`ResponseDescriptor::error`] and the tag reports them after validation.
pub trait Transport: Send + Sync {
    /// Send `request`, exposing `extra_info` to the nested render of its template.
    fn send_request<'a>(
        &'a self,
        request: &'a Request,
        extra_info: Vec<ExtraInfo>,
    ) -> BoxFuture<'a, ResponseDescriptor>;
}

/// The template render a tag is evaluated in.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    purpose: RenderPurpose,
    environment_id: Option<String>,
    extra_info: HashMap<String, Value>,
}

impl RenderContext {
    /// Context for a root render with an empty request chain.
    #[must_use]
    pub fn new(purpose: RenderPurpose) -> Self {
        Self {
            purpose,
            ..Self::default()
        }
    }

    /// Context for a nested render seeded with the extra info of a resend.
    #[must_use]
    pub fn nested(purpose: RenderPurpose, extra_info: Vec<ExtraInfo>) -> Self {
        Self {
            purpose,
            environment_id: None,
            extra_info: extra_info.into_iter().map(|info| (info.name, info.value)).collect(),
        }
    }

    /// Scope response lookups to an environment.
    #[must_use]
    pub fn with_environment(mut self, environment_id: impl Into<String>) -> Self {
        self.environment_id = Some(environment_id.into());
        self
    }

    /// Add an extra info entry.
    #[must_use]
    pub fn with_extra_info(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra_info.insert(name.into(), value);
        self
    }

    /// Why this render is happening.
    #[must_use]
    pub const fn purpose(&self) -> RenderPurpose {
        self.purpose
    }

    /// Environment used for response lookups.
    #[must_use]
    pub fn environment_id(&self) -> Option<&str> {
        self.environment_id.as_deref()
    }

    /// Extra info entry by name.
    #[must_use]
    pub fn extra_info(&self, name: &str) -> Option<&Value> {
        self.extra_info.get(name)
    }

    /// Requests resent so far in this render pass.
    ///
    /// A missing or malformed entry yields an empty chain.
    #[must_use]
    pub fn request_chain(&self) -> RequestChain {
        match self.extra_info(REQUEST_CHAIN_KEY) {
            None => RequestChain::new(),
            Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
                debug!(target: LOG_TARGET, error = %e, "Ignoring malformed request chain");
                RequestChain::new()
            }),
        }
    }

    /// Store the grown chain so later tags in the same render see it.
    pub fn set_request_chain(&mut self, chain: &RequestChain) {
        self.extra_info.insert(REQUEST_CHAIN_KEY.to_string(), request_chain_value(chain));
    }
}

/// Extra info entry handing `chain` to the nested render of a resend.
#[must_use]
pub fn request_chain_info(chain: &RequestChain) -> ExtraInfo {
    ExtraInfo {
        name: REQUEST_CHAIN_KEY.to_string(),
        value: request_chain_value(chain),
    }
}

fn request_chain_value(chain: &RequestChain) -> Value {
    Value::Array(chain.iter().map(|id| Value::String(id.to_string())).collect())
}
