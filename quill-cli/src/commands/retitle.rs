//! `quill retitle`: append note titles to timestamped file names.

use anyhow::{Context, Result};
use clap::Args;

use quill_core::config;
use quill_series::title;

use super::home_dir;

/// Arguments for `quill retitle`.
#[derive(Args, Debug)]
pub struct RetitleArgs {
    /// Show the renames without performing them.
    #[arg(long)]
    pub dry_run: bool,
}

impl RetitleArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let cfg = config::load_at(&home).context("failed to load config")?;
        let renames = title::retitle(&cfg.notes_dir, self.dry_run)
            .with_context(|| format!("retitle failed under {}", cfg.notes_dir.display()))?;

        let prefix = if self.dry_run { "[dry-run] " } else { "" };
        for r in &renames {
            let from = r.from.file_name().unwrap_or_default().to_string_lossy();
            let to = r.to.file_name().unwrap_or_default().to_string_lossy();
            println!("{prefix}{from} -> {to}");
        }
        if renames.is_empty() {
            println!("{prefix}No notes to retitle.");
        }
        Ok(())
    }
}
