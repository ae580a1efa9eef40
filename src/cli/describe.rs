//! Print the tag definition.

use anyhow::Result;
use clap::Args;

use crate::tag::TagDefinition;

/// Print the tag definition hosts use to render the tag form.
#[derive(Args)]
pub struct DescribeCommand {
    /// Print on a single line
    #[arg(long)]
    compact: bool,
}

impl DescribeCommand {
    pub fn execute(self) -> Result<()> {
        let definition = TagDefinition::response_regex();
        let json = if self.compact {
            serde_json::to_string(&definition)?
        } else {
            serde_json::to_string_pretty(&definition)?
        };
        println!("{json}");
        Ok(())
    }
}
