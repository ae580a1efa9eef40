//! Resend policy for dependent requests.
//!
//! Decides whether the cached response of a dependent request is fresh enough
//! to use. The decision only looks at the trigger behavior, whether a cached
//! response exists, its age, and the max age. It never depends on whether the
//! pattern will later match.
//!
//! | Behavior       | Resends when                                  |
//! |----------------|-----------------------------------------------|
//! | `never`        | never                                         |
//! | `no-history`   | there is no cached response                   |
//! | `when-expired` | no cached response, or it is older than max age |
//! | `always`       | always                                        |
//!
//! The cycle guard and the render purpose may still veto a resend after this
//! decision; see [`crate::chain`] and [`crate::tag`].

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::ResponseDescriptor;

/// When to resend the dependent request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", from = "String")]
pub enum TriggerBehavior {
    /// Always use the cached response
    #[default]
    Never,
    /// Resend only when no response has been recorded
    NoHistory,
    /// Resend when the cached response is older than the max age
    WhenExpired,
    /// Resend on every send render
    Always,
}

impl TriggerBehavior {
    /// All behaviors in the order the tag presents them.
    pub const ALL: [Self; 4] = [Self::Never, Self::NoHistory, Self::WhenExpired, Self::Always];

    /// Parse a wire value. Anything unrecognized, including an absent value,
    /// degrades to [`TriggerBehavior::Never`].
    #[must_use]
    pub fn from_value(value: Option<&str>) -> Self {
        match value {
            Some("no-history") => Self::NoHistory,
            Some("when-expired") => Self::WhenExpired,
            Some("always") => Self::Always,
            Some("never") | None => Self::Never,
            // unrecognized values fall back to the safe default
            Some(_) => Self::Never,
        }
    }

    /// Wire name of the behavior.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::NoHistory => "no-history",
            Self::WhenExpired => "when-expired",
            Self::Always => "always",
        }
    }

    /// Whether the max age setting has any effect.
    #[must_use]
    pub const fn uses_max_age(self) -> bool {
        matches!(self, Self::WhenExpired)
    }
}

impl From<String> for TriggerBehavior {
    fn from(value: String) -> Self {
        Self::from_value(Some(&value))
    }
}

impl FromStr for TriggerBehavior {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_value(Some(s)))
    }
}

impl fmt::Display for TriggerBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide whether the dependent request must be resent.
///
/// For [`TriggerBehavior::WhenExpired`] a response is stale only when its age
/// is strictly greater than `max_age_seconds`; an age exactly at the limit is
/// still fresh. Responses dated in the future count as fresh.
///
/// # Examples
///
/// ```rust
/// use chrono::Utc;
/// use response_regex::policy::{TriggerBehavior, should_resend};
///
/// assert!(!should_resend(TriggerBehavior::Never, None, 60, Utc::now()));
/// assert!(should_resend(TriggerBehavior::NoHistory, None, 60, Utc::now()));
/// ```
#[must_use]
pub fn should_resend(
    behavior: TriggerBehavior,
    cached: Option<&ResponseDescriptor>,
    max_age_seconds: u64,
    now: DateTime<Utc>,
) -> bool {
    should_resend_after(behavior, cached, max_age_from_seconds(max_age_seconds), now)
}

/// [`should_resend`] with a max age of sub-second precision.
#[must_use]
pub fn should_resend_after(
    behavior: TriggerBehavior,
    cached: Option<&ResponseDescriptor>,
    max_age: TimeDelta,
    now: DateTime<Utc>,
) -> bool {
    match behavior {
        TriggerBehavior::Never => false,
        TriggerBehavior::NoHistory => cached.is_none(),
        TriggerBehavior::WhenExpired => match cached {
            None => true,
            Some(response) => response.age_at(now) > max_age,
        },
        TriggerBehavior::Always => true,
    }
}

/// Max age for a whole number of seconds, saturating at [`TimeDelta::MAX`].
#[must_use]
pub fn max_age_from_seconds(seconds: u64) -> TimeDelta {
    i64::try_from(seconds).ok().and_then(TimeDelta::try_seconds).unwrap_or(TimeDelta::MAX)
}

/// Max age for fractional seconds, kept to the millisecond.
///
/// Returns `None` for negative or non-finite values.
#[must_use]
pub fn max_age_from_secs_f64(seconds: f64) -> Option<TimeDelta> {
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    // float to int casts saturate
    let millis = (seconds * 1000.0).round() as i64;
    Some(TimeDelta::try_milliseconds(millis).unwrap_or(TimeDelta::MAX))
}
