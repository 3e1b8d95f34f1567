//! `quill clean`

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use quill_core::config;
use quill_provision::StagingArea;

use super::home_dir;

/// Remove a staging directory left behind by an interrupted run.
#[derive(Args, Debug)]
pub struct CleanArgs {}

impl CleanArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let staging = config::staging_dir_at(&home);
        let removed = StagingArea::discard_stale(&staging)
            .with_context(|| format!("failed to remove {}", staging.display()))?;
        if removed {
            println!("{} Removed stale staging directory {}", "✓".green(), staging.display());
        } else {
            println!("Nothing to clean.");
        }
        Ok(())
    }
}
