//! Template materializer: copy a template tree into staging, then resolve
//! tokens in file names and file contents.
//!
//! # Passes
//!
//! | Pass     | Scope                                   | Order                       |
//! |----------|-----------------------------------------|-----------------------------|
//! | copy     | every file and directory of the kind    | any                         |
//! | filename | final path segment of every staged path | post-order (children first) |
//! | content  | every staged regular file               | any                         |
//!
//! Renaming children before their parent means no path is ever visited under
//! a name that has already been replaced.

use std::path::{Path, PathBuf};

use quill_core::types::TemplateKind;

use crate::error::{io_err, TemplateError};
use crate::token::SubstitutionSet;

// ---------------------------------------------------------------------------
// Tree helpers
// ---------------------------------------------------------------------------

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, TemplateError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

/// Recursively copy `src` into `dst`, creating directories as needed.
///
/// Returns the number of files copied.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<usize, TemplateError> {
    std::fs::create_dir_all(dst).map_err(|e| io_err(dst, e))?;
    let mut copied = 0;
    for path in sorted_entries(src)? {
        let meta = std::fs::metadata(&path).map_err(|e| io_err(&path, e))?;
        let Some(name) = path.file_name() else { continue };
        let target = dst.join(name);
        if meta.is_dir() {
            copied += copy_tree(&path, &target)?;
        } else if meta.is_file() {
            std::fs::copy(&path, &target).map_err(|e| io_err(&target, e))?;
            tracing::debug!("staged: {}", target.display());
            copied += 1;
        }
    }
    Ok(copied)
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), TemplateError> {
    for path in sorted_entries(dir)? {
        let meta = std::fs::metadata(&path).map_err(|e| io_err(&path, e))?;
        if meta.is_dir() {
            collect_files(root, &path, out)?;
        } else if meta.is_file() {
            let rel = path.strip_prefix(root).unwrap_or(path.as_path());
            out.push(rel.to_path_buf());
        }
    }
    Ok(())
}

/// Every regular file under `root`, as sorted paths relative to `root`.
pub fn list_files(root: &Path) -> Result<Vec<PathBuf>, TemplateError> {
    let mut out = Vec::new();
    collect_files(root, root, &mut out)?;
    out.sort();
    Ok(out)
}

// ---------------------------------------------------------------------------
// Filename pass
// ---------------------------------------------------------------------------

fn rename_entry(path: &Path, set: &SubstitutionSet) -> Result<bool, TemplateError> {
    let Some(name) = path.file_name() else { return Ok(false) };
    let name = name
        .to_str()
        .ok_or_else(|| TemplateError::Encoding { path: path.to_path_buf() })?;
    let resolved = set.apply(name);
    if resolved == name {
        return Ok(false);
    }
    if resolved.is_empty() || resolved.contains('/') || resolved.contains('\\') {
        return Err(TemplateError::InvalidName { name: resolved });
    }
    let target = path.with_file_name(&resolved);
    if target.exists() {
        return Err(TemplateError::NameCollision { path: target });
    }
    std::fs::rename(path, &target).map_err(|e| io_err(path, e))?;
    tracing::debug!("renamed: {} -> {}", path.display(), resolved);
    Ok(true)
}

fn rename_children(dir: &Path, set: &SubstitutionSet) -> Result<usize, TemplateError> {
    let mut renamed = 0;
    for path in sorted_entries(dir)? {
        let meta = std::fs::symlink_metadata(&path).map_err(|e| io_err(&path, e))?;
        if meta.is_dir() {
            renamed += rename_children(&path, set)?;
        }
        if rename_entry(&path, set)? {
            renamed += 1;
        }
    }
    Ok(renamed)
}

/// Replace tokens in the final segment of every path under `root`.
///
/// `root` itself is never renamed. Returns the number of renamed paths;
/// a tree that no longer contains any token is left untouched.
pub fn rename_pass(root: &Path, set: &SubstitutionSet) -> Result<usize, TemplateError> {
    rename_children(root, set)
}

// ---------------------------------------------------------------------------
// Content pass
// ---------------------------------------------------------------------------

/// Replace tokens in the content of every regular file under `root`.
///
/// Returns the number of files whose content changed.
pub fn content_pass(root: &Path, set: &SubstitutionSet) -> Result<usize, TemplateError> {
    let mut rewritten = 0;
    for rel in list_files(root)? {
        let path = root.join(rel);
        let bytes = std::fs::read(&path).map_err(|e| io_err(&path, e))?;
        let text = String::from_utf8(bytes)
            .map_err(|_| TemplateError::Encoding { path: path.clone() })?;
        let resolved = set.apply(&text);
        if resolved != text {
            std::fs::write(&path, resolved).map_err(|e| io_err(&path, e))?;
            rewritten += 1;
        }
    }
    Ok(rewritten)
}

// ---------------------------------------------------------------------------
// Materializer
// ---------------------------------------------------------------------------

/// Stages template trees found under a template root.
#[derive(Debug, Clone)]
pub struct Materializer {
    templates_root: PathBuf,
}

impl Materializer {
    pub fn new(templates_root: impl Into<PathBuf>) -> Self {
        Materializer {
            templates_root: templates_root.into(),
        }
    }

    /// `<templates_root>/<kind>/`
    pub fn template_dir(&self, kind: TemplateKind) -> PathBuf {
        self.templates_root.join(kind.dir_name())
    }

    /// Copy the `kind` template into `staging` and resolve every token of `set`
    /// in names and contents.
    ///
    /// Returns the staged files relative to `staging`, after renaming.
    pub fn materialize(
        &self,
        kind: TemplateKind,
        set: &SubstitutionSet,
        staging: &Path,
    ) -> Result<Vec<PathBuf>, TemplateError> {
        let template_dir = self.template_dir(kind);
        if !template_dir.is_dir() {
            return Err(TemplateError::TemplateNotFound {
                kind,
                path: template_dir,
            });
        }

        let copied = copy_tree(&template_dir, staging)?;
        tracing::info!(kind = %kind, files = copied, "template copied to staging");

        let renamed = rename_pass(staging, set)?;
        tracing::info!(renamed, "placeholder filenames replaced");

        let rewritten = content_pass(staging, set)?;
        tracing::info!(rewritten, "placeholder contents replaced");

        list_files(staging)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
