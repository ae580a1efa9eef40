//! Positional tag arguments as the host delivers them.
//!
//! Hosts pass tag arguments as a JSON array in the order of the tag
//! definition: request, regex, trigger behavior, max age. Values may be bare
//! or wrapped as `{ "value": ... }`. Parsing never fails; problems surface
//! later as [`ExtractError`](crate::core::ExtractError)s from the evaluation.

use chrono::TimeDelta;
use serde_json::Value;

use crate::config::EngineConfig;
use crate::policy::{TriggerBehavior, max_age_from_secs_f64, max_age_from_seconds};

/// Index of the request argument.
pub const REQUEST_ARG: usize = 0;
/// Index of the regex argument.
pub const PATTERN_ARG: usize = 1;
/// Index of the trigger behavior argument.
pub const TRIGGER_BEHAVIOR_ARG: usize = 2;
/// Index of the max age argument.
pub const MAX_AGE_ARG: usize = 3;

/// Arguments of one tag evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagArgs {
    /// Dependent request id; `None` when not configured
    pub request_id: Option<String>,
    /// Extraction pattern
    pub pattern: String,
    /// When to resend the dependent request
    pub trigger_behavior: TriggerBehavior,
    /// Max response age for [`TriggerBehavior::WhenExpired`], millisecond precision
    pub max_age: TimeDelta,
}

impl TagArgs {
    /// Arguments with the given request and pattern, other values from `config`.
    pub fn new(request_id: impl Into<String>, pattern: impl Into<String>, config: &EngineConfig) -> Self {
        let request_id = request_id.into();
        Self {
            request_id: (!request_id.is_empty()).then_some(request_id),
            pattern: pattern.into(),
            trigger_behavior: config.trigger_behavior,
            max_age: max_age_from_seconds(config.max_age_seconds),
        }
    }

    /// Set the trigger behavior.
    #[must_use]
    pub const fn with_trigger_behavior(mut self, behavior: TriggerBehavior) -> Self {
        self.trigger_behavior = behavior;
        self
    }

    /// Set the max age in whole seconds.
    #[must_use]
    pub fn with_max_age(mut self, seconds: u64) -> Self {
        self.max_age = max_age_from_seconds(seconds);
        self
    }

    /// Parse positional arguments, falling back to `config` for absent ones.
    ///
    /// - request: non-empty string, anything else means no request
    /// - regex: string, anything else is the empty pattern
    /// - trigger behavior: absent uses the configured default; any other
    ///   value goes through [`TriggerBehavior::from_value`]
    /// - max age: non-negative number or numeric string, otherwise the
    ///   configured default; fractions are kept to the millisecond
    #[must_use]
    pub fn from_values(values: &[Value], config: &EngineConfig) -> Self {
        let request_id = arg(values, REQUEST_ARG)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(String::from);

        let pattern = arg(values, PATTERN_ARG).and_then(Value::as_str).unwrap_or_default().to_string();

        let trigger_behavior = match arg(values, TRIGGER_BEHAVIOR_ARG) {
            None => config.trigger_behavior,
            Some(value) => TriggerBehavior::from_value(value.as_str()),
        };

        let max_age = arg(values, MAX_AGE_ARG)
            .and_then(parse_max_age)
            .unwrap_or_else(|| max_age_from_seconds(config.max_age_seconds));

        Self {
            request_id,
            pattern,
            trigger_behavior,
            max_age,
        }
    }
}

/// Argument at `index`, unwrapping `{ "value": ... }`. `null` counts as absent.
pub(crate) fn arg(values: &[Value], index: usize) -> Option<&Value> {
    let value = values.get(index)?;
    let value = value.get("value").unwrap_or(value);
    (!value.is_null()).then_some(value)
}

fn parse_max_age(value: &Value) -> Option<TimeDelta> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(max_age_from_seconds)
            .or_else(|| n.as_f64().and_then(max_age_from_secs_f64)),
        Value::String(s) => s.trim().parse().ok().and_then(max_age_from_secs_f64),
        _ => None,
    }
}
