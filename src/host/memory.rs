//! In-memory host backed by a JSON fixture.
//!
//! [`MemoryHost`] implements every host trait, which makes it usable by the
//! CLI `run` command and by tests. Resends do not touch the network: each
//! request can have a canned resend response, and requests without one come
//! back with a transport error marker. Every send is recorded together with
//! the request chain it carried.
//!
//! # Fixture format
//!
//! ```json
//! {
//!   "requests": [{ "id": "req_login", "name": "Login" }],
//!   "responses": [{
//!     "id": "res_1",
//!     "request_id": "req_login",
//!     "created": "2024-05-01T12:00:00Z",
//!     "status_code": 200,
//!     "content_type": "text/plain; charset=utf-8",
//!     "body": "token=ABC123"
//!   }],
//!   "resend": {
//!     "req_login": { "status_code": 200, "body": "token=FRESH" }
//!   }
//! }
//! ```

use anyhow::{Context, Result};
use chrono::Utc;
use futures::future::{self, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

use super::{RequestStore, ResponseStore, Transport};
use crate::chain::RequestChain;
use crate::constants::{LOG_TARGET, REQUEST_CHAIN_KEY};
use crate::models::{ExtraInfo, Request, ResponseDescriptor};

/// A recorded response with its body inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseFixture {
    /// Response metadata
    #[serde(flatten)]
    pub descriptor: ResponseDescriptor,
    /// Body as text
    #[serde(default)]
    pub body: String,
}

/// What the transport returns when a request is resent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResendFixture {
    /// Status code of the fresh response
    #[serde(default)]
    pub status_code: u16,
    /// Transport error marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Content type of the fresh response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Environment the fresh response is recorded under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_id: Option<String>,
    /// Body of the fresh response
    #[serde(default)]
    pub body: String,
}

/// Contents of a fixture file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostFixture {
    /// Stored requests
    #[serde(default)]
    pub requests: Vec<Request>,
    /// Recorded responses
    #[serde(default)]
    pub responses: Vec<ResponseFixture>,
    /// Canned resend responses keyed by request id
    #[serde(default)]
    pub resend: HashMap<String, ResendFixture>,
}

/// One call to [`Transport::send_request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRequest {
    /// Request that was sent
    pub request_id: String,
    /// Chain handed to the nested render
    pub chain: RequestChain,
}

#[derive(Debug, Default)]
struct State {
    requests: HashMap<String, Request>,
    // insertion order breaks ties between equal timestamps
    responses: Vec<ResponseDescriptor>,
    bodies: HashMap<String, Vec<u8>>,
    resend: HashMap<String, ResendFixture>,
    sent: Vec<SentRequest>,
}

/// Request store, response store and transport in one, held in memory.
#[derive(Debug, Default)]
pub struct MemoryHost {
    state: Mutex<State>,
}

impl MemoryHost {
    /// Create an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a host from fixture contents.
    #[must_use]
    pub fn from_fixture(fixture: HostFixture) -> Self {
        let host = Self::new();
        for request in fixture.requests {
            host.add_request(request);
        }
        for response in fixture.responses {
            host.add_response(response.descriptor, response.body);
        }
        for (request_id, resend) in fixture.resend {
            host.set_resend_response(request_id, resend);
        }
        host
    }

    /// Load a JSON fixture file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid fixture.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read fixture from {}", path.display()))?;

        let fixture: HostFixture = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse fixture from {}", path.display()))?;

        Ok(Self::from_fixture(fixture))
    }

    /// Store a request definition, replacing one with the same id.
    pub fn add_request(&self, request: Request) {
        self.lock().requests.insert(request.id.clone(), request);
    }

    /// Record a response and its body.
    pub fn add_response(&self, response: ResponseDescriptor, body: impl Into<Vec<u8>>) {
        let mut state = self.lock();
        state.bodies.insert(response.id.clone(), body.into());
        state.responses.push(response);
    }

    /// Configure what resending `request_id` returns.
    pub fn set_resend_response(&self, request_id: impl Into<String>, resend: ResendFixture) {
        self.lock().resend.insert(request_id.into(), resend);
    }

    /// Every send so far, oldest first.
    #[must_use]
    pub fn sent_requests(&self) -> Vec<SentRequest> {
        self.lock().sent.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn latest(&self, request_id: &str, environment_id: Option<&str>) -> Option<ResponseDescriptor> {
        let state = self.lock();
        state
            .responses
            .iter()
            .filter(|r| r.request_id == request_id)
            .filter(|r| environment_id.is_none_or(|env| r.environment_id.as_deref() == Some(env)))
            .fold(None, |latest: Option<&ResponseDescriptor>, candidate| match latest {
                Some(current) if current.created > candidate.created => Some(current),
                _ => Some(candidate),
            })
            .cloned()
    }

    fn record_send(&self, request: &Request, extra_info: &[ExtraInfo]) -> ResponseDescriptor {
        let chain = extra_info
            .iter()
            .find(|info| info.name == REQUEST_CHAIN_KEY)
            .and_then(|info| serde_json::from_value(info.value.clone()).ok())
            .unwrap_or_default();

        let mut state = self.lock();
        state.sent.push(SentRequest {
            request_id: request.id.clone(),
            chain,
        });

        let resend = state.resend.get(&request.id).cloned().unwrap_or_else(|| ResendFixture {
            error: Some(format!("no resend response configured for request {}", request.id)),
            ..ResendFixture::default()
        });

        let response = ResponseDescriptor {
            id: format!("res_{}", uuid::Uuid::new_v4().simple()),
            request_id: request.id.clone(),
            environment_id: resend.environment_id,
            created: Utc::now(),
            status_code: resend.status_code,
            error: resend.error,
            content_type: resend.content_type,
        };

        debug!(
            target: LOG_TARGET,
            request = %request.id,
            response = %response.id,
            status = response.status_code,
            "Recorded resend"
        );

        state.bodies.insert(response.id.clone(), resend.body.into_bytes());
        state.responses.push(response.clone());
        response
    }
}

impl RequestStore for MemoryHost {
    fn get_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Option<Request>> {
        future::ready(self.lock().requests.get(id).cloned()).boxed()
    }
}

impl ResponseStore for MemoryHost {
    fn latest_for_request<'a>(
        &'a self,
        request_id: &'a str,
        environment_id: Option<&'a str>,
    ) -> BoxFuture<'a, Option<ResponseDescriptor>> {
        future::ready(self.latest(request_id, environment_id)).boxed()
    }

    fn body_buffer(&self, response: &ResponseDescriptor) -> Vec<u8> {
        self.lock().bodies.get(&response.id).cloned().unwrap_or_default()
    }
}

impl Transport for MemoryHost {
    fn send_request<'a>(
        &'a self,
        request: &'a Request,
        extra_info: Vec<ExtraInfo>,
    ) -> BoxFuture<'a, ResponseDescriptor> {
        future::ready(self.record_send(request, &extra_info)).boxed()
    }
}
