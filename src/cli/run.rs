//! Evaluate the tag against a fixture host.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::{CliConfig, parse_behavior, parse_purpose};
use crate::chain::RequestChain;
use crate::constants::LOG_TARGET;
use crate::host::{MemoryHost, RenderContext};
use crate::models::RenderPurpose;
use crate::policy::{TriggerBehavior, max_age_from_seconds};
use crate::tag::{ResponseRegex, TagArgs};

/// Run one tag evaluation and print the extracted value.
///
/// Resends are served from the fixture's `resend` table; nothing is sent over
/// the network.
#[derive(Args)]
pub struct RunCommand {
    /// JSON fixture with requests, responses and resend responses
    #[arg(short, long)]
    fixture: PathBuf,

    /// Id of the dependent request
    #[arg(short, long)]
    request: Option<String>,

    /// Regex with at least one capture group
    #[arg(short, long)]
    pattern: String,

    /// Trigger behavior; defaults to the configured one
    #[arg(long, value_parser = parse_behavior)]
    behavior: Option<TriggerBehavior>,

    /// Max age in seconds; defaults to the configured one
    #[arg(long)]
    max_age: Option<u64>,

    /// Why the render happens (send, preview, general)
    #[arg(long, value_parser = parse_purpose, default_value = "send")]
    purpose: RenderPurpose,

    /// Environment used to look up responses
    #[arg(short, long)]
    environment: Option<String>,

    /// Requests already resent by enclosing renders
    #[arg(long, value_delimiter = ',')]
    chain: Vec<String>,
}

impl RunCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let engine = config.load_engine_config().await?;
        let host = Arc::new(MemoryHost::load(&self.fixture).await?);
        let tag = ResponseRegex::new(host.clone()).with_config(engine.clone());

        let mut ctx = RenderContext::new(self.purpose);
        if let Some(environment) = self.environment {
            ctx = ctx.with_environment(environment);
        }
        if !self.chain.is_empty() {
            ctx.set_request_chain(&self.chain.into_iter().collect::<RequestChain>());
        }

        let args = TagArgs {
            request_id: self.request.filter(|id| !id.is_empty()),
            pattern: self.pattern,
            trigger_behavior: self.behavior.unwrap_or(engine.trigger_behavior),
            max_age: max_age_from_seconds(self.max_age.unwrap_or(engine.max_age_seconds)),
        };

        let value = tag.evaluate(&mut ctx, &args, chrono::Utc::now()).await?;

        for sent in host.sent_requests() {
            info!(target: LOG_TARGET, request = %sent.request_id, chain = sent.chain.len(), "Resent");
        }
        println!("{value}");
        Ok(())
    }
}
