//! The provisioning pipeline shared by every template kind.
//!
//! ```text
//! Idle → StagingBegun → Materialized → Promoted → TornDown
//!            │               │             │
//!            └───── failure ─┴─────────────┴──→ TornDown (run failed)
//! ```
//!
//! Within one run: extraction → substitution assembly → materialization →
//! promotion → teardown. Teardown runs exactly once whichever stage failed.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

use quill_core::{
    config::{self, Config},
    timestamp,
    types::{is_path_segment, ChainedFields, EntityName, Identity, TemplateKind},
};
use quill_template::{Materializer, SubstitutionContext};

use crate::error::ProvisionError;
use crate::staging::StagingArea;
use crate::writer;

// ---------------------------------------------------------------------------
// Request and context
// ---------------------------------------------------------------------------

/// What the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    pub kind: TemplateKind,
    /// Target entity; required for chained kinds.
    pub entity: Option<EntityName>,
    /// Project name for scaffolds; defaults to `project_<YYYYmmddHHMMSS>`.
    pub project_name: Option<String>,
    /// Stage and resolve, but do not promote.
    pub dry_run: bool,
}

impl ProvisionRequest {
    pub fn new(kind: TemplateKind) -> Self {
        ProvisionRequest {
            kind,
            entity: None,
            project_name: None,
            dry_run: false,
        }
    }
}

/// Resolved filesystem locations for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub templates_root: PathBuf,
    pub staging: PathBuf,
    pub destination: PathBuf,
    /// Series directory for chained kinds.
    pub series: Option<PathBuf>,
}

/// Everything one run needs, captured up front and passed by value.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub kind: TemplateKind,
    pub captured_at: NaiveDateTime,
    pub paths: RunPaths,
    pub identity: Identity,
    pub entity: Option<EntityName>,
    pub project_name: Option<String>,
    pub extra_tokens: BTreeMap<String, String>,
    pub dry_run: bool,
}

/// `<notes_dir>/YYYY/MM-Month/DD-Weekday/`
pub fn dated_dir(notes_dir: &Path, at: &NaiveDateTime) -> PathBuf {
    notes_dir
        .join(at.format("%Y").to_string())
        .join(at.format("%m-%B").to_string())
        .join(at.format("%d-%A").to_string())
}

impl RunContext {
    /// Resolve paths and names for `request` at the instant `captured_at`.
    pub fn prepare(
        home: &Path,
        config: &Config,
        request: ProvisionRequest,
        captured_at: NaiveDateTime,
    ) -> Result<Self, ProvisionError> {
        let kind = request.kind;
        let mut entity = None;
        let mut project_name = None;

        let destination = match kind {
            TemplateKind::Meeting | TemplateKind::Daily => {
                dated_dir(&config.notes_dir, &captured_at)
            }
            TemplateKind::RelationshipLog => {
                let name = request.entity.ok_or(ProvisionError::MissingInput {
                    kind,
                    what: "an entity name",
                })?;
                if !name.is_valid() {
                    return Err(ProvisionError::InvalidName {
                        what: "entity",
                        name: name.0,
                    });
                }
                let dir = quill_series::series_dir(&config.relationship_dir, &name);
                entity = Some(name);
                dir
            }
            TemplateKind::ProjectScaffold => {
                let name = request
                    .project_name
                    .unwrap_or_else(|| format!("project_{}", captured_at.format("%Y%m%d%H%M%S")));
                if !is_path_segment(&name) {
                    return Err(ProvisionError::InvalidName {
                        what: "project",
                        name,
                    });
                }
                let dir = config.projects_dir.join(&name);
                project_name = Some(name);
                dir
            }
        };

        let series = kind.is_chained().then(|| destination.clone());

        Ok(RunContext {
            kind,
            captured_at,
            paths: RunPaths {
                templates_root: config::templates_root_at(home),
                staging: config::staging_dir_at(home),
                destination,
                series,
            },
            identity: config.identity.clone(),
            entity,
            project_name,
            extra_tokens: config.tokens.clone(),
            dry_run: request.dry_run,
        })
    }

    fn substitution_context(&self, chained: Option<ChainedFields>) -> SubstitutionContext {
        let mut ctx = SubstitutionContext::new(self.kind, self.captured_at, self.identity.clone());
        ctx.entity = self.entity.clone();
        ctx.project_name = self.project_name.clone();
        ctx.chained = chained;
        ctx.extra = self.extra_tokens.clone();
        ctx
    }
}

// ---------------------------------------------------------------------------
// State and report
// ---------------------------------------------------------------------------

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    StagingBegun,
    Materialized,
    Promoted,
    TornDown,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Idle => "idle",
            RunState::StagingBegun => "staging-begun",
            RunState::Materialized => "materialized",
            RunState::Promoted => "promoted",
            RunState::TornDown => "torn-down",
        };
        f.write_str(s)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct ProvisionReport {
    pub kind: TemplateKind,
    pub destination: PathBuf,
    /// Promoted files (or, for a dry run, where they would go).
    pub files: Vec<PathBuf>,
    /// Document the chained fields were taken from.
    pub predecessor: Option<PathBuf>,
    /// States visited, in order.
    pub transitions: Vec<RunState>,
    pub promoted: bool,
}

impl ProvisionReport {
    /// The timestamp-named Markdown document of this run, if any.
    pub fn primary_document(&self) -> Option<&Path> {
        self.files
            .iter()
            .find(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.ends_with(".md") && timestamp::prefix_of(n).is_some())
                    .unwrap_or(false)
            })
            .map(PathBuf::as_path)
    }
}

struct Tracker {
    transitions: Vec<RunState>,
}

impl Tracker {
    fn enter(&mut self, state: RunState) {
        tracing::info!(%state, "provisioning state");
        self.transitions.push(state);
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Extraction, substitution, materialization, and promotion inside an
/// already-acquired staging area.
fn stages(
    ctx: &RunContext,
    staging: &StagingArea,
    tracker: &mut Tracker,
) -> Result<(Vec<PathBuf>, Option<PathBuf>), ProvisionError> {
    let (predecessor, chained) = match &ctx.paths.series {
        Some(dir) if quill_series::documents(dir)?.is_empty() => {
            tracing::info!(series = %dir.display(), "first document in series");
            (None, Some(ChainedFields::default()))
        }
        Some(dir) => {
            let (path, fields) = quill_series::extract_predecessor(dir)?;
            (Some(path), Some(fields))
        }
        None => (None, None),
    };

    let set = ctx.substitution_context(chained).to_substitutions();
    Materializer::new(&ctx.paths.templates_root).materialize(ctx.kind, &set, staging.path())?;
    tracker.enter(RunState::Materialized);

    if ctx.dry_run {
        writer::check_conflicts(staging.path(), &ctx.paths.destination)?;
        let files = quill_template::engine::list_files(staging.path())?
            .into_iter()
            .map(|rel| ctx.paths.destination.join(rel))
            .collect();
        return Ok((files, predecessor));
    }

    let files = writer::promote(staging.path(), &ctx.paths.destination)?;
    tracker.enter(RunState::Promoted);
    Ok((files, predecessor))
}

/// Run one provisioning pipeline for `ctx`.
///
/// Staging is torn down exactly once on every path. A teardown failure after
/// a failed stage is logged and the stage error is returned; after a
/// successful run it is [`ProvisionError::TeardownFailed`], carrying the report.
pub fn run(ctx: RunContext) -> Result<ProvisionReport, ProvisionError> {
    let mut tracker = Tracker {
        transitions: vec![RunState::Idle],
    };

    let staging = StagingArea::begin(&ctx.paths.staging)?;
    tracker.enter(RunState::StagingBegun);

    let outcome = stages(&ctx, &staging, &mut tracker);
    let teardown = staging.end();
    tracker.enter(RunState::TornDown);

    let outcome = outcome.map(|(files, predecessor)| ProvisionReport {
        kind: ctx.kind,
        destination: ctx.paths.destination,
        files,
        predecessor,
        transitions: tracker.transitions,
        promoted: !ctx.dry_run,
    });
    settle(outcome, teardown)
}

fn settle(
    outcome: Result<ProvisionReport, ProvisionError>,
    teardown: Result<(), ProvisionError>,
) -> Result<ProvisionReport, ProvisionError> {
    match (outcome, teardown) {
        (Ok(report), Ok(())) => Ok(report),
        (Ok(report), Err(err)) => {
            tracing::warn!(error = %err, "staging teardown failed after a successful run");
            Err(ProvisionError::TeardownFailed {
                report: Box::new(report),
                source: Box::new(err),
            })
        }
        (Err(err), Ok(())) => {
            tracing::error!(kind = %err.kind(), error = %err, "provisioning failed");
            Err(err)
        }
        (Err(err), Err(teardown_err)) => {
            tracing::warn!(error = %teardown_err, "staging teardown failed after a failed run");
            tracing::error!(kind = %err.kind(), error = %err, "provisioning failed");
            Err(err)
        }
    }
}

/// Load config from `home`, capture the current local time, and run.
pub fn run_at(home: &Path, request: ProvisionRequest) -> Result<ProvisionReport, ProvisionError> {
    let config = config::load_at(home)?;
    let captured_at = Local::now().naive_local();
    let ctx = RunContext::prepare(home, &config, request, captured_at)?;
    run(ctx)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn instant() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    #[test]
    fn dated_dir_uses_month_and_weekday_names() {
        let dir = dated_dir(Path::new("/notes"), &instant());
        assert_eq!(dir, PathBuf::from("/notes/2024/01-January/15-Monday"));
    }

    #[test]
    fn relationship_log_requires_entity() {
        let home = TempDir::new().unwrap();
        let cfg = Config::default_for(home.path());
        let err = RunContext::prepare(
            home.path(),
            &cfg,
            ProvisionRequest::new(TemplateKind::RelationshipLog),
            instant(),
        )
        .unwrap_err();
        assert!(matches!(err, ProvisionError::MissingInput { .. }), "got: {err}");
    }

    #[test]
    fn entity_with_separator_is_rejected() {
        let home = TempDir::new().unwrap();
        let cfg = Config::default_for(home.path());
        let mut req = ProvisionRequest::new(TemplateKind::RelationshipLog);
        req.entity = Some(EntityName::from("../escape"));
        let err = RunContext::prepare(home.path(), &cfg, req, instant()).unwrap_err();
        assert!(matches!(err, ProvisionError::InvalidName { what: "entity", .. }));
    }

    #[test]
    fn scaffold_name_defaults_from_instant() {
        let home = TempDir::new().unwrap();
        let cfg = Config::default_for(home.path());
        let ctx = RunContext::prepare(
            home.path(),
            &cfg,
            ProvisionRequest::new(TemplateKind::ProjectScaffold),
            instant(),
        )
        .unwrap();
        assert_eq!(ctx.project_name.as_deref(), Some("project_20240115103000"));
        assert_eq!(
            ctx.paths.destination,
            home.path().join("development").join("project_20240115103000")
        );
        assert!(ctx.paths.series.is_none());
    }

    #[test]
    fn relationship_paths_point_at_series() {
        let home = TempDir::new().unwrap();
        let cfg = Config::default_for(home.path());
        let mut req = ProvisionRequest::new(TemplateKind::RelationshipLog);
        req.entity = Some(EntityName::from("alice"));
        let ctx = RunContext::prepare(home.path(), &cfg, req, instant()).unwrap();
        let expected = home.path().join("Notes/Keeping_in_touch/alice");
        assert_eq!(ctx.paths.destination, expected);
        assert_eq!(ctx.paths.series, Some(expected));
        assert_eq!(ctx.paths.staging, home.path().join(".quill/.staging"));
    }

    fn report() -> ProvisionReport {
        ProvisionReport {
            kind: TemplateKind::Meeting,
            destination: PathBuf::from("/notes/2024/01-January/15-Monday"),
            files: vec![PathBuf::from("/notes/2024/01-January/15-Monday/a.md")],
            predecessor: None,
            transitions: vec![RunState::Idle, RunState::TornDown],
            promoted: true,
        }
    }

    fn teardown_error() -> ProvisionError {
        ProvisionError::Io {
            path: PathBuf::from("/home/.quill/.staging"),
            source: std::io::Error::other("busy"),
        }
    }

    #[test]
    fn teardown_failure_after_success_keeps_the_report() {
        let err = settle(Ok(report()), Err(teardown_error())).unwrap_err();
        assert!(matches!(err, ProvisionError::TeardownFailed { .. }), "got: {err}");
        assert_eq!(err.kind(), crate::ErrorKind::Environment);
        assert!(!err.is_partial());

        let kept = err.completed_report().expect("report kept");
        assert!(kept.promoted);
        assert_eq!(kept.files.len(), 1);
        let msg = err.to_string();
        assert!(msg.contains("15-Monday is complete"), "got: {msg}");
        assert!(msg.contains("quill clean"));
    }

    #[test]
    fn stage_error_wins_over_teardown_error() {
        let stage = ProvisionError::DestinationConflict {
            path: PathBuf::from("/notes/a.md"),
        };
        let err = settle(Err(stage), Err(teardown_error())).unwrap_err();
        assert!(matches!(err, ProvisionError::DestinationConflict { .. }), "got: {err}");
        assert!(err.completed_report().is_none());
    }

    #[test]
    fn run_state_display() {
        assert_eq!(RunState::StagingBegun.to_string(), "staging-begun");
        assert_eq!(RunState::TornDown.to_string(), "torn-down");
    }
}
