//! Command-line interface for exercising the response regex tag.
//!
//! The binary is a thin driver over the library: each subcommand maps to one
//! stage of tag evaluation so the stages can be tried in isolation.
//!
//! # Commands
//!
//! - `decide` - evaluate the resend policy for a cached response timestamp
//! - `extract` - decode a body and apply an extraction pattern
//! - `run` - evaluate the full tag against a JSON fixture host
//! - `describe` - print the tag definition consumed by host UIs
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - debug logging
//! - `--quiet` / `-q` - no logging
//! - `--config` / `-c` - engine configuration file
//!
//! Logs go to stderr; command results go to stdout.

mod decide;
mod describe;
mod extract;
mod run;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::EngineConfig;
use crate::constants::LOG_TARGET;
use crate::models::RenderPurpose;
use crate::policy::TriggerBehavior;

/// Settings derived from the global flags, applied before a command runs.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter directive; `None` disables logging.
    pub log_level: Option<String>,

    /// Engine configuration file overriding the default location.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Create a configuration with logging disabled and the default config path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the global tracing subscriber writing to stderr.
    ///
    /// `RUST_LOG` takes precedence over the level chosen by flags. Calling this
    /// more than once is harmless.
    pub fn init_logging(&self) {
        let Some(level) = &self.log_level else {
            return;
        };

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("{LOG_TARGET}={level}")));

        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false).without_time())
            .with(filter)
            .try_init();
    }

    /// Load the engine configuration this run should use.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing config file is unreadable or invalid.
    pub async fn load_engine_config(&self) -> Result<EngineConfig> {
        EngineConfig::load_with_optional(self.config_path.clone()).await
    }
}

/// Root command.
#[derive(Parser)]
#[command(
    name = "response-regex",
    about = "Extract values from dependent responses with a regex",
    version,
    long_about = "Evaluates the response regex template tag: decides whether a dependent \
                  request must be resent, validates its latest response, decodes the body \
                  and returns the first capture group of a pattern."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Disable logging
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the engine configuration file
    #[arg(short, long, global = true, env = "RESPONSE_REGEX_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether a cached response would be reused or resent
    Decide(decide::DecideCommand),

    /// Apply a pattern to a response body
    Extract(extract::ExtractCommand),

    /// Evaluate the tag against a fixture host
    Run(run::RunCommand),

    /// Print the tag definition as JSON
    Describe(describe::DescribeCommand),
}

impl Cli {
    /// Run the selected command with settings from the global flags.
    ///
    /// # Errors
    ///
    /// Returns the command's error; `main` renders it for the user.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translate the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("info".to_string())
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    /// Run the selected command with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns the command's error.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        match self.command {
            Commands::Decide(cmd) => cmd.execute(&config).await,
            Commands::Extract(cmd) => cmd.execute().await,
            Commands::Run(cmd) => cmd.execute(&config).await,
            Commands::Describe(cmd) => cmd.execute(),
        }
    }
}

/// Parse a trigger behavior flag, rejecting names the tag would silently treat as `never`.
pub(crate) fn parse_behavior(value: &str) -> Result<TriggerBehavior, String> {
    TriggerBehavior::ALL.into_iter().find(|b| b.as_str() == value).ok_or_else(|| {
        let names: Vec<_> = TriggerBehavior::ALL.iter().map(|b| b.as_str()).collect();
        format!("expected one of: {}", names.join(", "))
    })
}

/// Parse a render purpose flag.
pub(crate) fn parse_purpose(value: &str) -> Result<RenderPurpose, String> {
    [RenderPurpose::Send, RenderPurpose::Preview, RenderPurpose::General]
        .into_iter()
        .find(|p| p.as_str() == value)
        .ok_or_else(|| "expected one of: send, preview, general".to_string())
}
