//! Error types for quill-provision.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use quill_core::{types::TemplateKind, ConfigError};
use quill_series::SeriesError;
use quill_template::TemplateError;

use crate::pipeline::ProvisionReport;

/// All errors that can arise from a provisioning run.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Template copy, rename, or rewrite failed.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Predecessor lookup or extraction failed.
    #[error("series error: {0}")]
    Series(#[from] SeriesError),

    /// A staging directory from an unfinished run is still present.
    #[error("staging directory {path} already exists; a previous run did not finish (run `quill clean`)")]
    StagingCollision { path: PathBuf },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The request is missing an input its kind requires.
    #[error("'{kind}' requires {what}")]
    MissingInput {
        kind: TemplateKind,
        what: &'static str,
    },

    /// A caller-supplied name cannot be used as a directory name.
    #[error("{what} '{name}' cannot be used as a directory name")]
    InvalidName { what: &'static str, name: String },

    /// A staged file would overwrite an existing file; nothing was written.
    #[error("destination file {path} already exists; nothing was written")]
    DestinationConflict { path: PathBuf },

    /// Copying into the destination failed partway. Not rolled back.
    #[error("promotion incomplete: inspect {destination} for partial state ({} file(s) written): {source}", .written.len())]
    Promotion {
        destination: PathBuf,
        written: Vec<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    /// A promoted file does not match its staged copy. Not rolled back.
    #[error("promotion incomplete: {path} does not match its staged copy; inspect {destination}")]
    VerificationMismatch { destination: PathBuf, path: PathBuf },

    /// Every stage succeeded but the staging directory could not be removed.
    /// The destination is complete; `report` describes it.
    #[error("{} is complete, but staging was not removed (run `quill clean`): {source}", .report.destination.display())]
    TeardownFailed {
        report: Box<ProvisionReport>,
        #[source]
        source: Box<ProvisionError>,
    },
}

/// Failure classes reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Staging collision, permission failure, missing template, bad input.
    Environment,
    /// Chaining required but the series is empty.
    NotFound,
    /// Predecessor document is missing an expected heading.
    MalformedDocument,
    /// Destination may hold a partial artifact.
    Promotion,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Environment => write!(f, "environment"),
            ErrorKind::NotFound => write!(f, "not found"),
            ErrorKind::MalformedDocument => write!(f, "malformed document"),
            ErrorKind::Promotion => write!(f, "promotion"),
        }
    }
}

impl ProvisionError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProvisionError::Series(SeriesError::NotFound { .. }) => ErrorKind::NotFound,
            ProvisionError::Series(SeriesError::MalformedDocument { .. }) => {
                ErrorKind::MalformedDocument
            }
            ProvisionError::Promotion { .. } | ProvisionError::VerificationMismatch { .. } => {
                ErrorKind::Promotion
            }
            ProvisionError::Series(SeriesError::Io { .. })
            | ProvisionError::Config(_)
            | ProvisionError::Template(_)
            | ProvisionError::StagingCollision { .. }
            | ProvisionError::Io { .. }
            | ProvisionError::MissingInput { .. }
            | ProvisionError::InvalidName { .. }
            | ProvisionError::DestinationConflict { .. }
            | ProvisionError::TeardownFailed { .. } => ErrorKind::Environment,
        }
    }

    /// The report of a run whose artifact is complete despite this error.
    pub fn completed_report(&self) -> Option<&ProvisionReport> {
        match self {
            ProvisionError::TeardownFailed { report, .. } => Some(&**report),
            _ => None,
        }
    }

    /// Whether durable state may have been partially mutated.
    pub fn is_partial(&self) -> bool {
        self.kind() == ErrorKind::Promotion
    }
}

/// Convenience constructor for [`ProvisionError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ProvisionError {
    ProvisionError::Io {
        path: path.into(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotion_errors_carry_a_distinct_prefix() {
        let err = ProvisionError::Promotion {
            destination: PathBuf::from("/notes/2024"),
            written: vec![PathBuf::from("/notes/2024/a.md")],
            source: std::io::Error::other("disk full"),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("promotion incomplete"), "got: {msg}");
        assert!(msg.contains("/notes/2024"));
        assert!(msg.contains("1 file(s) written"));
        assert!(err.is_partial());
    }

    #[test]
    fn classification_matches_failure_class() {
        let not_found = ProvisionError::Series(SeriesError::NotFound {
            dir: PathBuf::from("/kit/alice"),
        });
        assert_eq!(not_found.kind(), ErrorKind::NotFound);

        let collision = ProvisionError::StagingCollision {
            path: PathBuf::from("/home/.quill/.staging"),
        };
        assert_eq!(collision.kind(), ErrorKind::Environment);
        assert!(!collision.is_partial());

        let missing_template = ProvisionError::Template(TemplateError::TemplateNotFound {
            kind: TemplateKind::Daily,
            path: PathBuf::from("/t/daily"),
        });
        assert_eq!(missing_template.kind(), ErrorKind::Environment);
        assert!(missing_template.completed_report().is_none());
    }
}
