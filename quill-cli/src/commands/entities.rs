//! `quill entities`: tracked entities and their relationship logs.

use anyhow::{Context, Result};
use clap::Args;
use tabled::{settings::Style, Table, Tabled};

use quill_core::config;
use quill_series::{list_entities, EntitySummary};

use super::home_dir;

/// Arguments for `quill entities`.
#[derive(Args, Debug)]
pub struct EntitiesArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "entity")]
    name: String,
    #[tabled(rename = "documents")]
    documents: usize,
    #[tabled(rename = "latest")]
    latest: String,
}

impl EntitiesArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let cfg = config::load_at(&home).context("failed to load config")?;
        let entities = list_entities(&cfg.relationship_dir).with_context(|| {
            format!("failed to list entities under {}", cfg.relationship_dir.display())
        })?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&entities).context("failed to serialize entities")?
            );
            return Ok(());
        }

        if entities.is_empty() {
            println!("No entities under {}.", cfg.relationship_dir.display());
            println!("Run: quill new relationship-log --entity <name>");
            return Ok(());
        }
        println!("{}", table(&entities));
        Ok(())
    }
}

pub(crate) fn table(entities: &[EntitySummary]) -> Table {
    let rows: Vec<EntityRow> = entities
        .iter()
        .enumerate()
        .map(|(i, e)| EntityRow {
            index: i,
            name: e.name.to_string(),
            documents: e.documents,
            latest: e.latest.clone().unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table
}
