//! Quill: staged note and project provisioning CLI.
//!
//! # Usage
//!
//! ```text
//! quill init
//! quill new meeting|daily|relationship-log|project-scaffold [--entity <name>] [--name <name>] [--open] [--dry-run]
//! quill entities [--json]
//! quill templates
//! quill retitle [--dry-run]
//! quill clean
//! ```

mod commands;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    clean::CleanArgs, entities::EntitiesArgs, init::InitArgs, new::NewArgs,
    retitle::RetitleArgs, templates::TemplatesArgs,
};
use quill_core::types::TemplateKind;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "quill",
    version,
    about = "Provision notes, relationship logs and project scaffolds from templates",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the default config and seed the default templates.
    Init(InitArgs),

    /// Provision a new artifact from a template.
    New(NewArgs),

    /// List tracked entities and their relationship logs.
    Entities(EntitiesArgs),

    /// Show template kinds and whether each template is installed.
    Templates(TemplatesArgs),

    /// Append each note's title to its timestamped file name.
    Retitle(RetitleArgs),

    /// Remove a staging directory left behind by an interrupted run.
    Clean(CleanArgs),
}

// ---------------------------------------------------------------------------
// Shared TemplateKind argument
// ---------------------------------------------------------------------------

/// Thin wrapper so clap can parse `TemplateKind` from CLI args.
#[derive(Debug, Clone, Copy)]
pub struct TemplateKindArg(pub TemplateKind);

impl FromStr for TemplateKindArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse::<TemplateKind>().map(Self)
    }
}

impl fmt::Display for TemplateKindArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<TemplateKindArg> for TemplateKind {
    fn from(k: TemplateKindArg) -> Self {
        k.0
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::New(args) => args.run(),
        Commands::Entities(args) => args.run(),
        Commands::Templates(args) => args.run(),
        Commands::Retitle(args) => args.run(),
        Commands::Clean(args) => args.run(),
    }
}
