//! Error types for quill-template.

use std::path::PathBuf;

use quill_core::types::TemplateKind;
use thiserror::Error;

/// All errors that can arise while materializing a template.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// No template directory exists for the requested kind.
    #[error("no '{kind}' template at {path}")]
    TemplateNotFound { kind: TemplateKind, path: PathBuf },

    /// Filesystem error while copying, renaming, or rewriting.
    #[error("template io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A staged file name or file body is not valid UTF-8.
    #[error("{path} is not valid UTF-8")]
    Encoding { path: PathBuf },

    /// Substitution produced a name that already exists next to it.
    #[error("renaming would overwrite existing staged path {path}")]
    NameCollision { path: PathBuf },

    /// Substitution produced a file name containing a path separator or nothing at all.
    #[error("substitution produced invalid file name '{name}'")]
    InvalidName { name: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> TemplateError {
    TemplateError::Io {
        path: path.into(),
        source,
    }
}
