//! The response regex template tag.
//!
//! [`ResponseRegex`] evaluates one tag: it finds the dependent request's
//! latest response, resends the request when the trigger behavior asks for it,
//! and returns the first capture group of the pattern applied to the body.
//!
//! # Evaluation order
//!
//! 1. Compile and validate the pattern (`InvalidPattern`)
//! 2. Require a request id (`MissingRequestId`)
//! 3. Resolve the request (`RequestNotFound`)
//! 4. Fetch the latest response for the render's environment
//! 5. Apply the resend policy, then the cycle guard, then the render purpose
//! 6. Validate the response (`NoResponse`, `DependentRequestFailed`,
//!    `NoSuccessfulResponse`)
//! 7. Decode the body and extract (`NoMatch`)
//!
//! Steps 1 and 2 run before any store access so a broken tag never triggers
//! network activity.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use response_regex::host::{MemoryHost, RenderContext};
//! use response_regex::models::RenderPurpose;
//! use response_regex::policy::TriggerBehavior;
//! use response_regex::tag::ResponseRegex;
//!
//! # async fn example() -> Result<(), response_regex::core::ExtractError> {
//! let host = Arc::new(MemoryHost::new());
//! let tag = ResponseRegex::new(host);
//! let mut ctx = RenderContext::new(RenderPurpose::Send);
//! let token = tag
//!     .run(&mut ctx, Some("req_login"), r"token=(\w+)", TriggerBehavior::NoHistory, 60)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod args;
pub mod schema;

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::constants::LOG_TARGET;
use crate::core::ExtractError;
use crate::decode::decode_body;
use crate::host::{RenderContext, RequestStore, ResponseStore, Transport, request_chain_info};
use crate::models::ResponseDescriptor;
use crate::pattern::ExtractionPattern;
use crate::policy::{TriggerBehavior, max_age_from_seconds, should_resend_after};

pub use args::TagArgs;
pub use schema::TagDefinition;

/// Evaluates response regex tags against a host.
#[derive(Clone)]
pub struct ResponseRegex {
    requests: Arc<dyn RequestStore>,
    responses: Arc<dyn ResponseStore>,
    transport: Arc<dyn Transport>,
    config: EngineConfig,
}

impl std::fmt::Debug for ResponseRegex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseRegex").field("config", &self.config).finish_non_exhaustive()
    }
}

impl ResponseRegex {
    /// Use one host object for requests, responses and sending.
    pub fn new<H>(host: Arc<H>) -> Self
    where
        H: RequestStore + ResponseStore + Transport + 'static,
    {
        Self::from_parts(host.clone(), host.clone(), host)
    }

    /// Use separate host services.
    pub fn from_parts(
        requests: Arc<dyn RequestStore>,
        responses: Arc<dyn ResponseStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            requests,
            responses,
            transport,
            config: EngineConfig::default(),
        }
    }

    /// Replace the defaults used for absent tag arguments.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Defaults used for absent tag arguments.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate the tag.
    ///
    /// `ctx` is only appended to: a resend adds the request to the context's
    /// request chain so later tags in the same render see it.
    ///
    /// # Errors
    ///
    /// Returns the [`ExtractError`] describing why no value could be produced.
    pub async fn run(
        &self,
        ctx: &mut RenderContext,
        request_id: Option<&str>,
        pattern: &str,
        trigger_behavior: TriggerBehavior,
        max_age_seconds: u64,
    ) -> Result<String, ExtractError> {
        let args = TagArgs {
            request_id: request_id.filter(|id| !id.is_empty()).map(String::from),
            pattern: pattern.to_string(),
            trigger_behavior,
            max_age: max_age_from_seconds(max_age_seconds),
        };
        self.evaluate(ctx, &args, Utc::now()).await
    }

    /// Evaluate the tag from positional JSON arguments.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub async fn run_with_args(
        &self,
        ctx: &mut RenderContext,
        values: &[Value],
    ) -> Result<String, ExtractError> {
        let args = TagArgs::from_values(values, &self.config);
        self.evaluate(ctx, &args, Utc::now()).await
    }

    /// Evaluate the tag with an explicit clock.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub async fn evaluate(
        &self,
        ctx: &mut RenderContext,
        args: &TagArgs,
        now: DateTime<Utc>,
    ) -> Result<String, ExtractError> {
        let pattern = ExtractionPattern::new(&args.pattern)?;

        let request_id = args.request_id.as_deref().ok_or(ExtractError::MissingRequestId)?;

        let request = self.requests.get_by_id(request_id).await.ok_or_else(|| {
            ExtractError::RequestNotFound {
                id: request_id.to_string(),
            }
        })?;

        let mut response =
            self.responses.latest_for_request(&request.id, ctx.environment_id()).await;

        let mut resend = should_resend_after(args.trigger_behavior, response.as_ref(), args.max_age, now);
        debug!(
            target: LOG_TARGET,
            request = %request.id,
            behavior = %args.trigger_behavior,
            cached = response.is_some(),
            resend,
            "Evaluated resend policy"
        );

        let mut chain = ctx.request_chain();
        if !chain.allows(&request.id) {
            info!(target: LOG_TARGET, request = %request.id, "Preventing recursive render");
            resend = false;
        }

        if resend && ctx.purpose().is_send() {
            info!(target: LOG_TARGET, request = %request.id, name = %request.name, "Resending dependency");
            chain.push(request.id.clone());
            ctx.set_request_chain(&chain);
            let extra_info = vec![request_chain_info(&chain)];
            response = Some(self.transport.send_request(&request, extra_info).await);
        } else if resend {
            debug!(
                target: LOG_TARGET,
                request = %request.id,
                purpose = %ctx.purpose(),
                "Skipping resend outside of a send render"
            );
        }

        let response = validate_response(response)?;
        let bytes = self.responses.body_buffer(&response);
        let body = decode_body(&bytes, response.content_type.as_deref());
        pattern.extract(&body)
    }
}

/// Check that a response is usable for extraction.
///
/// # Errors
///
/// In order: [`ExtractError::NoResponse`] when there is none,
/// [`ExtractError::DependentRequestFailed`] when it carries a transport error,
/// [`ExtractError::NoSuccessfulResponse`] when it has no status code.
pub fn validate_response(
    response: Option<ResponseDescriptor>,
) -> Result<ResponseDescriptor, ExtractError> {
    let Some(response) = response else {
        info!(target: LOG_TARGET, "No response found");
        return Err(ExtractError::NoResponse);
    };

    if let Some(error) = &response.error {
        info!(target: LOG_TARGET, response = %response.id, %error, "Response error");
        return Err(ExtractError::DependentRequestFailed {
            error: error.clone(),
        });
    }

    if !response.has_status() {
        info!(target: LOG_TARGET, response = %response.id, "Invalid status code");
        return Err(ExtractError::NoSuccessfulResponse);
    }

    Ok(response)
}
