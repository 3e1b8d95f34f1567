//! Promotion: copy a resolved staging tree into its destination.
//!
//! ## `promote` protocol
//!
//! 1. Walk the staged tree (directories and files).
//! 2. Refuse if any staged file already exists at its target path. Nothing
//!    has been written yet, so this failure leaves no trace.
//! 3. Create the destination and its missing ancestors.
//! 4. Copy each file to `<target>.quill.tmp`, then rename onto the target.
//! 5. SHA-256 every promoted file and compare with its staged copy.
//!
//! Failures in steps 3–5 are reported as partial: earlier files stay written.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{io_err, ProvisionError};

// ---------------------------------------------------------------------------
// Staged tree walk
// ---------------------------------------------------------------------------

/// A path under the staging root, relative to it.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Staged {
    Dir(PathBuf),
    File(PathBuf),
}

fn walk(root: &Path, dir: &Path, out: &mut Vec<Staged>) -> Result<(), ProvisionError> {
    let mut entries: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| io_err(dir, e))? {
        entries.push(entry.map_err(|e| io_err(dir, e))?.path());
    }
    entries.sort();
    for path in entries {
        let rel = path.strip_prefix(root).unwrap_or(path.as_path()).to_path_buf();
        if path.is_dir() {
            out.push(Staged::Dir(rel));
            walk(root, &path, out)?;
        } else if path.is_file() {
            out.push(Staged::File(rel));
        }
    }
    Ok(())
}

fn staged_tree(root: &Path) -> Result<Vec<Staged>, ProvisionError> {
    let mut out = Vec::new();
    walk(root, root, &mut out)?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// Hex SHA-256 of the file at `path`.
pub fn digest(path: &Path) -> Result<String, std::io::Error> {
    let bytes = std::fs::read(path)?;
    let mut h = Sha256::new();
    h.update(&bytes);
    Ok(hex::encode(h.finalize()))
}

// ---------------------------------------------------------------------------
// Atomic copy
// ---------------------------------------------------------------------------

fn copy_atomic(src: &Path, target: &Path) -> Result<(), std::io::Error> {
    let tmp = PathBuf::from(format!("{}.quill.tmp", target.display()));
    copy_atomic_with_tmp(src, target, &tmp)
}

fn copy_atomic_with_tmp(src: &Path, target: &Path, tmp: &Path) -> Result<(), std::io::Error> {
    let result = std::fs::copy(src, tmp).and_then(|_| std::fs::rename(tmp, target));
    if result.is_err() {
        let _ = std::fs::remove_file(tmp);
    }
    result
}

// ---------------------------------------------------------------------------
// promote
// ---------------------------------------------------------------------------

/// Fail if any staged file would land on an existing path, or any staged
/// directory on an existing non-directory.
pub fn check_conflicts(staging: &Path, destination: &Path) -> Result<(), ProvisionError> {
    if destination.exists() && !destination.is_dir() {
        return Err(ProvisionError::DestinationConflict {
            path: destination.to_path_buf(),
        });
    }
    for entry in staged_tree(staging)? {
        let (target, blocked) = match entry {
            Staged::File(rel) => {
                let target = destination.join(rel);
                let blocked = target.exists();
                (target, blocked)
            }
            Staged::Dir(rel) => {
                let target = destination.join(rel);
                let blocked = target.exists() && !target.is_dir();
                (target, blocked)
            }
        };
        if blocked {
            return Err(ProvisionError::DestinationConflict { path: target });
        }
    }
    Ok(())
}

/// Copy the staged tree under `staging` into `destination`.
///
/// Returns the promoted file paths (absolute, in staging order).
pub fn promote(staging: &Path, destination: &Path) -> Result<Vec<PathBuf>, ProvisionError> {
    let tree = staged_tree(staging)?;
    check_conflicts(staging, destination)?;

    let mut written: Vec<PathBuf> = Vec::new();
    let partial = |written: &Vec<PathBuf>, source: std::io::Error| ProvisionError::Promotion {
        destination: destination.to_path_buf(),
        written: written.clone(),
        source,
    };

    if let Err(e) = std::fs::create_dir_all(destination) {
        return Err(partial(&written, e));
    }

    for entry in &tree {
        match entry {
            Staged::Dir(rel) => {
                if let Err(e) = std::fs::create_dir_all(destination.join(rel)) {
                    return Err(partial(&written, e));
                }
            }
            Staged::File(rel) => {
                let target = destination.join(rel);
                if let Err(e) = copy_atomic(&staging.join(rel), &target) {
                    return Err(partial(&written, e));
                }
                tracing::debug!("promoted: {}", target.display());
                written.push(target);
            }
        }
    }

    verify(staging, destination, &tree, &written)?;
    tracing::info!(destination = %destination.display(), files = written.len(), "promotion verified");
    Ok(written)
}

fn verify(
    staging: &Path,
    destination: &Path,
    tree: &[Staged],
    written: &[PathBuf],
) -> Result<(), ProvisionError> {
    let partial = |source: std::io::Error| ProvisionError::Promotion {
        destination: destination.to_path_buf(),
        written: written.to_vec(),
        source,
    };
    for entry in tree {
        let Staged::File(rel) = entry else { continue };
        let staged = digest(&staging.join(rel)).map_err(partial)?;
        let target = destination.join(rel);
        let promoted = digest(&target).map_err(partial)?;
        if staged != promoted {
            return Err(ProvisionError::VerificationMismatch {
                destination: destination.to_path_buf(),
                path: target,
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn staged(root: &Path, files: &[(&str, &str)]) {
        for (rel, content) in files {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
    }

    #[test]
    fn promote_creates_missing_ancestors() {
        let staging = TempDir::new().unwrap();
        let dest_root = TempDir::new().unwrap();
        staged(staging.path(), &[("a.md", "A"), ("sub/b.md", "B")]);
        fs::create_dir(staging.path().join("empty")).unwrap();

        let dest = dest_root.path().join("2024").join("01-January").join("15-Monday");
        let written = promote(staging.path(), &dest).unwrap();

        assert_eq!(written, vec![dest.join("a.md"), dest.join("sub/b.md")]);
        assert_eq!(fs::read_to_string(dest.join("sub/b.md")).unwrap(), "B");
        assert!(dest.join("empty").is_dir());
    }

    #[test]
    fn conflict_is_detected_before_any_write() {
        let staging = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        staged(staging.path(), &[("a.md", "new"), ("z.md", "new")]);
        fs::write(dest.path().join("z.md"), "old").unwrap();

        let err = promote(staging.path(), dest.path()).unwrap_err();
        assert!(matches!(err, ProvisionError::DestinationConflict { .. }), "got: {err}");
        assert!(!dest.path().join("a.md").exists(), "nothing may be written on conflict");
        assert_eq!(fs::read_to_string(dest.path().join("z.md")).unwrap(), "old");
    }

    #[test]
    fn existing_directories_are_not_conflicts() {
        let staging = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        staged(staging.path(), &[("sub/new.md", "N")]);
        staged(dest.path(), &[("sub/other.md", "O")]);
        promote(staging.path(), dest.path()).unwrap();
        assert!(dest.path().join("sub/other.md").exists());
        assert!(dest.path().join("sub/new.md").exists());
    }

    #[test]
    fn file_in_place_of_staged_dir_is_a_conflict() {
        let staging = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        staged(staging.path(), &[("a.md", "A"), ("widget/__init__.py", "")]);
        fs::write(dest.path().join("widget"), "not a dir").unwrap();

        let err = promote(staging.path(), dest.path()).unwrap_err();
        match &err {
            ProvisionError::DestinationConflict { path } => {
                assert_eq!(path, &dest.path().join("widget"));
            }
            other => panic!("expected DestinationConflict, got: {other}"),
        }
        assert!(!err.is_partial());
        assert!(!dest.path().join("a.md").exists(), "nothing may be written on conflict");
    }

    #[test]
    fn destination_that_is_a_file_is_a_conflict() {
        let staging = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        staged(staging.path(), &[("a.md", "A")]);
        let dest = root.path().join("project");
        fs::write(&dest, "file").unwrap();

        let err = check_conflicts(staging.path(), &dest).unwrap_err();
        assert!(matches!(err, ProvisionError::DestinationConflict { .. }), "got: {err}");
    }

    #[test]
    fn partial_failure_reports_written_files() {
        let staging = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        // The name fits, but its `.quill.tmp` sibling exceeds NAME_MAX.
        let long = format!("{}.md", "b".repeat(246));
        staged(staging.path(), &[("a.md", "A"), (long.as_str(), "B")]);

        let err = promote(staging.path(), dest.path()).unwrap_err();
        match &err {
            ProvisionError::Promotion { written, .. } => {
                assert_eq!(written, &vec![dest.path().join("a.md")]);
            }
            other => panic!("expected Promotion, got: {other}"),
        }
        assert!(err.is_partial());
        assert!(err.to_string().contains("1 file(s) written"));
        assert!(dest.path().join("a.md").exists(), "partial promotion is not rolled back");
    }

    #[test]
    fn tmp_file_removed_after_copy() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src.md");
        let target = tmp.path().join("target.md");
        fs::write(&src, "data").unwrap();
        copy_atomic(&src, &target).unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "data");
        assert!(!tmp.path().join("target.md.quill.tmp").exists());
    }

    #[test]
    fn rename_failure_cleans_tmp_and_keeps_original() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src.md");
        fs::write(&src, "new").unwrap();
        // Renaming a file onto a non-empty directory fails on every platform.
        let target = tmp.path().join("occupied");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep.md"), "original").unwrap();
        let tmp_path = tmp.path().join("occupied.quill.tmp");

        copy_atomic_with_tmp(&src, &target, &tmp_path).expect_err("rename onto dir must fail");
        assert!(!tmp_path.exists(), ".quill.tmp should be cleaned up");
        assert_eq!(fs::read_to_string(target.join("keep.md")).unwrap(), "original");
    }

    #[test]
    fn copy_failure_removes_tmp() {
        let tmp = TempDir::new().unwrap();
        // A directory is not a copyable source.
        let src = tmp.path().join("src");
        fs::create_dir(&src).unwrap();
        let target = tmp.path().join("target.md");
        let tmp_path = tmp.path().join("target.md.quill.tmp");
        fs::write(&tmp_path, "left by an interrupted copy").unwrap();

        copy_atomic_with_tmp(&src, &target, &tmp_path).expect_err("copying a directory must fail");
        assert!(!tmp_path.exists(), ".quill.tmp should be cleaned up");
        assert!(!target.exists());
    }

    #[test]
    fn unreadable_promoted_file_is_a_promotion_error_with_written_list() {
        let staging = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        staged(staging.path(), &[("a.md", "A")]);
        let tree = staged_tree(staging.path()).unwrap();
        let written = vec![dest.path().join("a.md")];

        // Promoted copy vanished before verification.
        let err = verify(staging.path(), dest.path(), &tree, &written).unwrap_err();
        match &err {
            ProvisionError::Promotion { written: reported, .. } => assert_eq!(reported, &written),
            other => panic!("expected Promotion, got: {other}"),
        }
        assert!(err.is_partial());
        assert!(err.to_string().contains("1 file(s) written"));
    }

    #[test]
    fn mismatched_promoted_file_fails_verification() {
        let staging = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        staged(staging.path(), &[("a.md", "A")]);
        staged(dest.path(), &[("a.md", "tampered")]);
        let tree = staged_tree(staging.path()).unwrap();

        let err = verify(staging.path(), dest.path(), &tree, &[dest.path().join("a.md")]).unwrap_err();
        assert!(matches!(err, ProvisionError::VerificationMismatch { .. }), "got: {err}");
        assert!(err.to_string().starts_with("promotion incomplete"));
    }

    #[test]
    fn digest_is_content_addressed() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        fs::write(&a, "same").unwrap();
        fs::write(&b, "same").unwrap();
        assert_eq!(digest(&a).unwrap(), digest(&b).unwrap());
        assert_eq!(digest(&a).unwrap().len(), 64);
    }
}
