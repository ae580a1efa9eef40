//! Cycle guard for chained dependent requests.
//!
//! A resend renders the dependent request, which may itself contain response
//! tags that resend further requests. The [`RequestChain`] records every
//! request resent during one render pass so a request is never resent twice,
//! which would otherwise recurse forever on cyclic dependencies.
//!
//! The chain is created empty at the root render, grows by one id per resend
//! and is dropped when the render finishes. It travels with the
//! [`RenderContext`](crate::host::RenderContext) rather than living in global
//! state.

use serde::{Deserialize, Serialize};

/// Ordered ids of the requests resent during the current render pass.
///
/// Invariant: an id appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct RequestChain(Vec<String>);

impl RequestChain {
    /// Create an empty chain for a root render.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Whether `request_id` is already part of the chain.
    #[must_use]
    pub fn contains(&self, request_id: &str) -> bool {
        self.0.iter().any(|id| id == request_id)
    }

    /// Whether resending `request_id` is allowed.
    ///
    /// Returns `false` when the request is already in the chain, regardless of
    /// what the resend policy decided.
    #[must_use]
    pub fn allows(&self, request_id: &str) -> bool {
        !self.contains(request_id)
    }

    /// Append `request_id` before resending it.
    ///
    /// Returns `false` and leaves the chain untouched if the id is already
    /// present.
    pub fn push(&mut self, request_id: impl Into<String>) -> bool {
        let request_id = request_id.into();
        if self.contains(&request_id) {
            return false;
        }
        self.0.push(request_id);
        true
    }

    /// Ids in the order they were resent.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of resent requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing has been resent yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<String> for RequestChain {
    /// Duplicates are dropped, keeping the first occurrence.
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut chain = Self::new();
        for id in iter {
            chain.push(id);
        }
        chain
    }
}

impl From<Vec<String>> for RequestChain {
    fn from(ids: Vec<String>) -> Self {
        ids.into_iter().collect()
    }
}

impl From<RequestChain> for Vec<String> {
    fn from(chain: RequestChain) -> Self {
        chain.0
    }
}
