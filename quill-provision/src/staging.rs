//! Staging area: the one ephemeral working directory of a provisioning run.
//!
//! `begin` → work inside [`StagingArea::path`] → `end`. If the value is dropped
//! without `end` (early return, panic unwinding), `Drop` removes the directory
//! best-effort, so no exit path leaves staging behind.
//!
//! There is no lock file: a run refuses to start while a staging directory
//! exists, and `quill clean` removes one left by a killed process.

use std::path::{Path, PathBuf};

use crate::error::{io_err, ProvisionError};

/// Exclusive handle on the staging directory for one run.
#[derive(Debug)]
pub struct StagingArea {
    path: PathBuf,
    released: bool,
}

impl StagingArea {
    /// Create a fresh, empty staging directory at `path`.
    ///
    /// Fails with [`ProvisionError::StagingCollision`] if it already exists and
    /// with [`ProvisionError::Io`] if it or its parent cannot be created.
    pub fn begin(path: impl Into<PathBuf>) -> Result<Self, ProvisionError> {
        let path = path.into();
        if path.exists() {
            return Err(ProvisionError::StagingCollision { path });
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        match std::fs::create_dir(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(ProvisionError::StagingCollision { path });
            }
            Err(e) => return Err(io_err(&path, e)),
        }
        tracing::debug!(path = %path.display(), "staging begun");
        Ok(StagingArea {
            path,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the staging directory and everything under it.
    pub fn end(mut self) -> Result<(), ProvisionError> {
        self.released = true;
        remove_tree(&self.path)?;
        tracing::debug!(path = %self.path.display(), "staging torn down");
        Ok(())
    }

    /// Remove a staging directory left behind by an unfinished run.
    ///
    /// Returns `true` if one existed.
    pub fn discard_stale(path: &Path) -> Result<bool, ProvisionError> {
        if !path.exists() {
            return Ok(false);
        }
        remove_tree(path)?;
        tracing::info!(path = %path.display(), "stale staging directory removed");
        Ok(true)
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = remove_tree(&self.path) {
            tracing::warn!(error = %err, "staging teardown on drop failed");
        }
    }
}

fn remove_tree(path: &Path) -> Result<(), ProvisionError> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_err(path, e)),
    }
}
