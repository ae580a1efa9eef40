//! Declarative description of the tag for the host's configuration UI.
//!
//! Serializes to the JSON shape hosts use to build tag forms: one entry per
//! positional argument, with its type, default, help text and visibility
//! rule.

use serde::Serialize;
use serde_json::{Value, json};

use super::args::{MAX_AGE_ARG, TRIGGER_BEHAVIOR_ARG, arg};
use crate::constants::{DEFAULT_MAX_AGE_SECONDS, TAG_NAME};
use crate::policy::TriggerBehavior;

/// The tag as presented to users.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDefinition {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub args: Vec<ArgDefinition>,
}

/// One positional argument.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgDefinition {
    pub display_name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<&'static str>,
    #[serde(flatten)]
    pub kind: ArgKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// Shown only while another argument has a given value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shown_when: Option<ShownWhen>,
}

/// Input type of an argument.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ArgKind {
    /// Reference to a stored host model
    Model { model: &'static str },
    String,
    Enum { options: Vec<EnumOption> },
    Number,
}

/// Choice of an [`ArgKind::Enum`] argument.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumOption {
    pub display_name: &'static str,
    pub description: &'static str,
    pub value: &'static str,
}

/// Visibility rule: argument `arg_index` must equal `equals`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShownWhen {
    pub arg_index: usize,
    pub equals: &'static str,
    /// Value assumed when the other argument is unset
    pub default: &'static str,
}

impl ArgDefinition {
    /// Whether the argument should be shown given the current argument values.
    #[must_use]
    pub fn is_visible(&self, values: &[Value]) -> bool {
        let Some(rule) = &self.shown_when else {
            return true;
        };
        let current = arg(values, rule.arg_index).and_then(Value::as_str).unwrap_or(rule.default);
        current == rule.equals
    }
}

impl TagDefinition {
    /// Definition of the response regex tag.
    #[must_use]
    pub fn response_regex() -> Self {
        Self {
            name: TAG_NAME,
            display_name: "Response regex",
            description: "extract values from other request's responses based on a regex",
            args: vec![
                ArgDefinition {
                    display_name: "Request",
                    help: None,
                    kind: ArgKind::Model { model: "Request" },
                    default_value: None,
                    shown_when: None,
                },
                ArgDefinition {
                    display_name: "Regex",
                    help: Some("The result of the first capture group is returned"),
                    kind: ArgKind::String,
                    default_value: None,
                    shown_when: None,
                },
                ArgDefinition {
                    display_name: "Trigger Behavior",
                    help: Some("Configure when to resend the dependent request"),
                    kind: ArgKind::Enum {
                        options: TriggerBehavior::ALL.into_iter().map(behavior_option).collect(),
                    },
                    default_value: Some(json!(TriggerBehavior::Never.as_str())),
                    shown_when: None,
                },
                ArgDefinition {
                    display_name: "Max age (seconds)",
                    help: Some("The maximum age of a response to use before it expires"),
                    kind: ArgKind::Number,
                    default_value: Some(json!(DEFAULT_MAX_AGE_SECONDS)),
                    shown_when: Some(ShownWhen {
                        arg_index: TRIGGER_BEHAVIOR_ARG,
                        equals: TriggerBehavior::WhenExpired.as_str(),
                        default: TriggerBehavior::Never.as_str(),
                    }),
                },
            ],
        }
    }

    /// Whether the max age argument is shown for the current values.
    #[must_use]
    pub fn is_max_age_visible(&self, values: &[Value]) -> bool {
        self.args.get(MAX_AGE_ARG).is_some_and(|def| def.is_visible(values))
    }
}

fn behavior_option(behavior: TriggerBehavior) -> EnumOption {
    let (display_name, description) = match behavior {
        TriggerBehavior::Never => ("Never", "never resend request"),
        TriggerBehavior::NoHistory => ("No History", "resend when no responses present"),
        TriggerBehavior::WhenExpired => ("When Expired", "resend when existing response has expired"),
        TriggerBehavior::Always => ("Always", "resend request when needed"),
    };
    EnumOption {
        display_name,
        description,
        value: behavior.as_str(),
    }
}
