//! `quill new <KIND>`: provision one artifact.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Args;
use colored::Colorize;

use quill_core::{
    config::{self, Config},
    types::{EntityName, TemplateKind},
};
use quill_provision::{pipeline, ProvisionError, ProvisionReport, ProvisionRequest, RunContext};
use quill_series::{list_entities, EntitySummary};

use super::{entities, home_dir};
use crate::TemplateKindArg;

/// Arguments for `quill new`.
#[derive(Args, Debug)]
pub struct NewArgs {
    /// meeting | daily | relationship-log (kit) | project-scaffold (scaffold)
    pub kind: TemplateKindArg,

    /// Entity for a relationship log. Prompted for when omitted.
    #[arg(long, short = 'e')]
    pub entity: Option<String>,

    /// Project name for a scaffold. Defaults to `project_<timestamp>`.
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Open the new document in the configured editor.
    #[arg(long, short = 'o')]
    pub open: bool,

    /// Resolve the template and report where it would land, without writing.
    #[arg(long)]
    pub dry_run: bool,
}

impl NewArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let cfg = config::load_at(&home).context("failed to load config")?;
        let kind: TemplateKind = self.kind.into();

        let entity = match (kind, self.entity) {
            (TemplateKind::RelationshipLog, None) => {
                let known = list_entities(&cfg.relationship_dir).with_context(|| {
                    format!("failed to list entities under {}", cfg.relationship_dir.display())
                })?;
                let stdin = io::stdin();
                Some(choose_entity(&known, &mut stdin.lock(), &mut io::stdout())?)
            }
            (_, given) => given.map(EntityName::from),
        };

        let request = ProvisionRequest {
            kind,
            entity,
            project_name: self.name,
            dry_run: self.dry_run,
        };
        let ctx = RunContext::prepare(&home, &cfg, request, Local::now().naive_local())
            .with_context(|| format!("cannot provision {kind}"))?;
        let (report, leftover) = match pipeline::run(ctx) {
            Ok(report) => (report, None),
            Err(ProvisionError::TeardownFailed { report, source }) => (*report, Some(*source)),
            Err(err) => {
                return Err(anyhow::Error::new(err).context(format!("failed to provision {kind}")))
            }
        };

        print_report(&report);
        if report.promoted {
            if kind == TemplateKind::ProjectScaffold {
                git_init(&report.destination);
            }
            if self.open {
                let target = report
                    .primary_document()
                    .unwrap_or(report.destination.as_path());
                open_in_editor(&cfg, target)?;
            }
        }
        if let Some(err) = leftover {
            return Err(anyhow::Error::new(err)
                .context("staging directory was not removed; run `quill clean`"));
        }
        Ok(())
    }
}

fn print_report(report: &ProvisionReport) {
    let prefix = if report.promoted { "" } else { "[dry-run] " };
    if let Some(prev) = &report.predecessor {
        println!("{prefix}  Carried forward from {}", prev.display());
    }
    for file in &report.files {
        println!("{prefix}{} {}", "✓".green(), file.display());
    }
    println!(
        "{prefix}{} {} file(s) {} {}",
        report.kind.to_string().bold(),
        report.files.len(),
        if report.promoted { "written to" } else { "would be written to" },
        report.destination.display()
    );
}

/// Ask which entity a relationship log is for.
///
/// Accepts an index into `known` or `n` followed by a new name.
pub(crate) fn choose_entity(
    known: &[EntitySummary],
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<EntityName> {
    if !known.is_empty() {
        writeln!(out, "{}", entities::table(known))?;
        write!(out, "Select an entity by index, or `n` for a new one: ")?;
        out.flush()?;
        let answer = read_answer(input)?;
        if !answer.eq_ignore_ascii_case("n") {
            let index: usize = answer
                .parse()
                .with_context(|| format!("'{answer}' is neither an index nor `n`"))?;
            return match known.get(index) {
                Some(e) => Ok(e.name.clone()),
                None => bail!("no entity at index {index} (0..{})", known.len()),
            };
        }
    }
    write!(out, "New entity name: ")?;
    out.flush()?;
    let name = read_answer(input)?;
    if name.is_empty() {
        bail!("an entity name is required for a relationship log");
    }
    Ok(EntityName::from(name))
}

fn read_answer(input: &mut impl BufRead) -> Result<String> {
    let mut line = String::new();
    let read = input.read_line(&mut line).context("failed to read answer")?;
    if read == 0 {
        bail!("no answer given (end of input)");
    }
    Ok(line.trim().to_string())
}

fn git_init(dir: &Path) {
    match Command::new("git").arg("init").arg("--quiet").current_dir(dir).status() {
        Ok(status) if status.success() => {
            println!("{} Initialized git repository in {}", "✓".green(), dir.display());
        }
        Ok(status) => {
            tracing::warn!(%status, dir = %dir.display(), "git init failed");
            eprintln!("{} git init exited with {status}", "!".yellow());
        }
        Err(err) => {
            tracing::warn!(error = %err, "git not available");
            eprintln!("{} git init skipped: {err}", "!".yellow());
        }
    }
}

fn open_in_editor(cfg: &Config, target: &Path) -> Result<()> {
    let mut words = cfg.editor.split_whitespace();
    let program = words.next().context("no editor configured")?;
    Command::new(program)
        .args(words)
        .arg(target)
        .spawn()
        .with_context(|| format!("failed to launch editor '{}'", cfg.editor))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn summary(name: &str) -> EntitySummary {
        EntitySummary {
            name: EntityName::from(name),
            documents: 1,
            latest: Some("2024-01-01_09-00-00.md".to_string()),
        }
    }

    #[test]
    fn index_selects_existing_entity() {
        let known = vec![summary("alice"), summary("bob")];
        let mut out = Vec::new();
        let picked = choose_entity(&known, &mut Cursor::new("1\n"), &mut out).unwrap();
        assert_eq!(picked, EntityName::from("bob"));
        assert!(String::from_utf8(out).unwrap().contains("alice"));
    }

    #[test]
    fn n_prompts_for_new_name() {
        let known = vec![summary("alice")];
        let picked = choose_entity(&known, &mut Cursor::new("n\ncarol\n"), &mut Vec::new()).unwrap();
        assert_eq!(picked, EntityName::from("carol"));
    }

    #[test]
    fn empty_list_asks_for_name_directly() {
        let picked = choose_entity(&[], &mut Cursor::new("dave\n"), &mut Vec::new()).unwrap();
        assert_eq!(picked, EntityName::from("dave"));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let known = vec![summary("alice")];
        let err = choose_entity(&known, &mut Cursor::new("3\n"), &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("no entity at index 3"));
    }

    #[test]
    fn end_of_input_is_an_error() {
        assert!(choose_entity(&[], &mut Cursor::new(""), &mut Vec::new()).is_err());
    }
}
