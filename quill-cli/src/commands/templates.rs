//! `quill templates`: installed template kinds.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use quill_core::{config, types::TemplateKind};
use quill_template::{engine, Materializer};

use super::home_dir;

/// Arguments for `quill templates`.
#[derive(Args, Debug)]
pub struct TemplatesArgs {}

#[derive(Tabled)]
struct TemplateRow {
    #[tabled(rename = "kind")]
    kind: String,
    #[tabled(rename = "installed")]
    installed: String,
    #[tabled(rename = "files")]
    files: usize,
    #[tabled(rename = "path")]
    path: String,
}

impl TemplatesArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let materializer = Materializer::new(config::templates_root_at(&home));

        let mut rows = Vec::new();
        let mut missing = 0;
        for kind in TemplateKind::all() {
            let dir = materializer.template_dir(*kind);
            let (installed, files) = if dir.is_dir() {
                let files = engine::list_files(&dir)
                    .with_context(|| format!("failed to read {}", dir.display()))?;
                ("yes".green().to_string(), files.len())
            } else {
                missing += 1;
                ("no".red().to_string(), 0)
            };
            rows.push(TemplateRow {
                kind: kind.to_string(),
                installed,
                files,
                path: dir.display().to_string(),
            });
        }

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        if missing > 0 {
            println!("Run `quill init` to install the default templates.");
        }
        Ok(())
    }
}
