//! Entity series for `quill-series`.
//!
//! A series is the set of documents under `<relationship_dir>/<entity>/` whose
//! names start with the canonical timestamp and end in `.md`. Because the
//! timestamp is fixed-width, the lexicographically greatest name is the most
//! recent document; [`predecessor`] picks it and [`extract`] parses the
//! sections carried into the next document.

pub mod sections;
pub mod title;

use std::fs;
use std::path::{Path, PathBuf};

use quill_core::timestamp;
use quill_core::types::{ChainedFields, EntityName};
use serde::Serialize;
use thiserror::Error;

use crate::sections::MissingHeading;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Errors from series lookup and extraction.
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no documents in series at {dir}")]
    NotFound { dir: PathBuf },

    #[error("malformed document {path}: {source}")]
    MalformedDocument {
        path: PathBuf,
        #[source]
        source: MissingHeading,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SeriesError {
    SeriesError::Io {
        path: path.into(),
        source,
    }
}

/// One tracked entity and the state of its series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitySummary {
    pub name: EntityName,
    pub documents: usize,
    /// File name of the most recent document, if any.
    pub latest: Option<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// `<relationship_dir>/<entity>/`
pub fn series_dir(relationship_dir: &Path, entity: &EntityName) -> PathBuf {
    relationship_dir.join(&entity.0)
}

fn is_series_document(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".md") && timestamp::prefix_of(name).is_some()
}

/// All series documents in `dir`, oldest first. An absent directory is an
/// empty series.
pub fn documents(dir: &Path) -> Result<Vec<PathBuf>, SeriesError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut docs = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| io_err(dir, e))? {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        if path.is_file() && is_series_document(&path) {
            docs.push(path);
        }
    }
    docs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(docs)
}

/// The most recent document in `dir`.
///
/// Returns `SeriesError::NotFound` when the series is empty; callers creating
/// a first-of-series document should check [`documents`] instead.
pub fn predecessor(dir: &Path) -> Result<PathBuf, SeriesError> {
    documents(dir)?
        .pop()
        .ok_or_else(|| SeriesError::NotFound { dir: dir.to_path_buf() })
}

/// Parse the chained fields out of the document at `path`.
pub fn extract(path: &Path) -> Result<ChainedFields, SeriesError> {
    let text = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    sections::parse_sections(&text).map_err(|source| SeriesError::MalformedDocument {
        path: path.to_path_buf(),
        source,
    })
}

/// [`predecessor`] followed by [`extract`].
pub fn extract_predecessor(dir: &Path) -> Result<(PathBuf, ChainedFields), SeriesError> {
    let path = predecessor(dir)?;
    tracing::info!(predecessor = %path.display(), "extracting carried-forward fields");
    let fields = extract(&path)?;
    Ok((path, fields))
}

/// Every entity directory under `relationship_dir`, sorted by name.
///
/// Hidden directories are skipped. An absent root yields an empty list.
pub fn list_entities(relationship_dir: &Path) -> Result<Vec<EntitySummary>, SeriesError> {
    if !relationship_dir.exists() {
        return Ok(vec![]);
    }
    let mut entries: Vec<_> = fs::read_dir(relationship_dir)
        .map_err(|e| io_err(relationship_dir, e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
        .collect();
    entries.sort_by_key(|e| e.file_name());

    let mut result = Vec::with_capacity(entries.len());
    for entry in entries {
        let docs = documents(&entry.path())?;
        result.push(EntitySummary {
            name: EntityName::from(entry.file_name().to_string_lossy().into_owned()),
            documents: docs.len(),
            latest: docs
                .last()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned()),
        });
    }
    Ok(result)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
