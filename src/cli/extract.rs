//! Decode a body and apply an extraction pattern.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

use crate::decode::decode_body;
use crate::pattern::ExtractionPattern;

/// Print the first capture group of `--pattern` in a body.
#[derive(Args)]
pub struct ExtractCommand {
    /// Regex with at least one capture group
    #[arg(short, long)]
    pattern: String,

    /// Content-Type of the body, used to pick the charset
    #[arg(long)]
    content_type: Option<String>,

    /// Body file; reads stdin when omitted
    body: Option<PathBuf>,
}

impl ExtractCommand {
    pub async fn execute(self) -> Result<()> {
        // the pattern is checked before any input is read
        let pattern = ExtractionPattern::new(&self.pattern)?;

        let bytes = match &self.body {
            Some(path) => tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read body from {}", path.display()))?,
            None => {
                let mut buf = Vec::new();
                tokio::io::stdin().read_to_end(&mut buf).await.context("Failed to read body from stdin")?;
                buf
            }
        };

        let body = decode_body(&bytes, self.content_type.as_deref());
        println!("{}", pattern.extract(&body)?);
        Ok(())
    }
}
