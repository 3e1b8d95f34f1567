//! `quill init`

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use quill_core::config;
use quill_template::defaults;

use super::home_dir;

/// Write the default config and seed the default templates.
#[derive(Args, Debug)]
pub struct InitArgs {}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let (cfg, created) = config::init_at(&home).context("failed to write default config")?;
        let seeded = defaults::seed(&config::templates_root_at(&home))
            .context("failed to seed default templates")?;

        let path = config::config_path_at(&home);
        if created {
            println!("{} Wrote {}", "✓".green(), path.display());
        } else {
            println!("  Config already present: {}", path.display());
        }
        for file in &seeded {
            println!("{} Seeded {}", "✓".green(), file.display());
        }
        if seeded.is_empty() {
            println!("  Templates already installed.");
        }
        println!("  Notes:         {}", cfg.notes_dir.display());
        println!("  Relationships: {}", cfg.relationship_dir.display());
        println!("  Projects:      {}", cfg.projects_dir.display());
        Ok(())
    }
}
