//! Evaluate the resend policy without a host.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use tracing::debug;

use super::{CliConfig, parse_behavior};
use crate::constants::LOG_TARGET;
use crate::models::ResponseDescriptor;
use crate::policy::{TriggerBehavior, should_resend};

/// Print `resend` or `reuse` for a cached response created at `--created`.
#[derive(Args)]
pub struct DecideCommand {
    /// Trigger behavior; defaults to the configured one
    #[arg(long, value_parser = parse_behavior)]
    behavior: Option<TriggerBehavior>,

    /// Creation time of the cached response (RFC 3339); omit when there is none
    #[arg(long)]
    created: Option<DateTime<Utc>>,

    /// Evaluation time (RFC 3339); defaults to the current time
    #[arg(long)]
    now: Option<DateTime<Utc>>,

    /// Max age in seconds; defaults to the configured one
    #[arg(long)]
    max_age: Option<u64>,
}

impl DecideCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let engine = config.load_engine_config().await?;
        let behavior = self.behavior.unwrap_or(engine.trigger_behavior);
        let max_age = self.max_age.unwrap_or(engine.max_age_seconds);
        let now = self.now.unwrap_or_else(Utc::now);

        let cached = self.created.map(|created| ResponseDescriptor {
            id: "cached".to_string(),
            request_id: String::new(),
            environment_id: None,
            created,
            status_code: 200,
            error: None,
            content_type: None,
        });

        let resend = should_resend(behavior, cached.as_ref(), max_age, now);
        debug!(target: LOG_TARGET, %behavior, max_age, cached = cached.is_some(), resend, "Decided");

        println!("{}", if resend { "resend" } else { "reuse" });
        Ok(())
    }
}
