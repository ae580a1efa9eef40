//! Data exchanged with the host application.
//!
//! These records are owned by the host's stores; the engine only reads them.
//! All of them serialize with serde so fixtures and hosts can describe them as
//! JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A stored request definition that other requests can depend on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Identifier the tag references
    pub id: String,
    /// Human readable name, used in log output only
    #[serde(default)]
    pub name: String,
}

impl Request {
    /// Create a request record.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// The latest stored result of sending a request.
///
/// A status code of `0` means the exchange was attempted but never completed.
/// The body is not part of the descriptor; it is read through
/// [`ResponseStore::body_buffer`](crate::host::ResponseStore::body_buffer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseDescriptor {
    /// Identifier of this response record
    pub id: String,
    /// Request this response belongs to
    pub request_id: String,
    /// Environment the request was sent in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_id: Option<String>,
    /// When the response was recorded
    pub created: DateTime<Utc>,
    /// HTTP status code, `0` when absent
    #[serde(default)]
    pub status_code: u16,
    /// Transport-level error marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Declared `Content-Type` header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl ResponseDescriptor {
    /// Whether a non-zero status code was recorded.
    #[must_use]
    pub const fn has_status(&self) -> bool {
        self.status_code != 0
    }

    /// Age of the response at `now`. Negative for responses dated in the future.
    #[must_use]
    pub fn age_at(&self, now: DateTime<Utc>) -> chrono::TimeDelta {
        now - self.created
    }
}

/// Why the current template render is happening.
///
/// Only [`RenderPurpose::Send`] renders may trigger network activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderPurpose {
    /// The rendered request is about to be sent
    Send,
    /// A preview in the editor
    Preview,
    /// Any other render, e.g. code generation
    #[default]
    General,
}

impl RenderPurpose {
    /// Whether this render precedes an actual send.
    #[must_use]
    pub const fn is_send(self) -> bool {
        matches!(self, Self::Send)
    }

    /// Wire name of the purpose.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Preview => "preview",
            Self::General => "general",
        }
    }
}

impl fmt::Display for RenderPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderPurpose {
    type Err = std::convert::Infallible;

    /// Unrecognized purposes never send.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "send" => Self::Send,
            "preview" => Self::Preview,
            _ => Self::General,
        })
    }
}

/// Named value passed along with a resend so nested renders can see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraInfo {
    /// Key the nested render looks the value up by
    pub name: String,
    /// Arbitrary JSON payload
    pub value: serde_json::Value,
}
