//! Test helpers shared by unit and integration tests.
//!
//! Available with `cfg(test)` or the `test-utils` feature.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use std::sync::{Arc, Once};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::host::MemoryHost;
use crate::host::memory::ResendFixture;
use crate::models::{Request, ResponseDescriptor};

static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` if given, otherwise
/// `RUST_LOG`; with neither, logging stays off.
///
/// ```rust,no_run
/// use tracing::Level;
///
/// response_regex::test_utils::init_test_logging(Some(Level::DEBUG));
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Fixed clock used by tests that pass an explicit evaluation time.
#[must_use]
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().unwrap_or_default()
}

/// Builder for a [`MemoryHost`] with a few requests and responses.
///
/// ```rust,no_run
/// use response_regex::test_utils::HostBuilder;
///
/// let host = HostBuilder::new()
///     .request("req_login")
///     .response("req_login", 30, "token=ABC")
///     .resend("req_login", 200, "token=NEW")
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct HostBuilder {
    host: MemoryHost,
    responses: usize,
}

impl HostBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a request named after its id.
    #[must_use]
    pub fn request(self, id: &str) -> Self {
        self.host.add_request(Request::new(id, id));
        self
    }

    /// Add a 200 UTF-8 response recorded `age_seconds` before [`test_now`].
    #[must_use]
    pub fn response(self, request_id: &str, age_seconds: i64, body: &str) -> Self {
        let descriptor = self.descriptor(request_id, age_seconds);
        self.push(descriptor, body.as_bytes())
    }

    /// Add a response with full control over the descriptor.
    #[must_use]
    pub fn raw_response(self, descriptor: ResponseDescriptor, body: &[u8]) -> Self {
        self.push(descriptor, body)
    }

    /// Descriptor for the next response of `request_id`.
    #[must_use]
    pub fn descriptor(&self, request_id: &str, age_seconds: i64) -> ResponseDescriptor {
        ResponseDescriptor {
            id: format!("res_{request_id}_{}", self.responses),
            request_id: request_id.to_string(),
            environment_id: None,
            created: test_now() - TimeDelta::seconds(age_seconds),
            status_code: 200,
            error: None,
            content_type: Some("text/plain; charset=utf-8".to_string()),
        }
    }

    /// Make resending `request_id` return `status_code` with `body`.
    #[must_use]
    pub fn resend(self, request_id: &str, status_code: u16, body: &str) -> Self {
        self.host.set_resend_response(
            request_id,
            ResendFixture {
                status_code,
                body: body.to_string(),
                ..ResendFixture::default()
            },
        );
        self
    }

    #[must_use]
    pub fn build(self) -> Arc<MemoryHost> {
        Arc::new(self.host)
    }

    fn push(mut self, descriptor: ResponseDescriptor, body: &[u8]) -> Self {
        self.host.add_response(descriptor, body.to_vec());
        self.responses += 1;
        self
    }
}
