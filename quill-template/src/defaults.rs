//! Default templates baked into the binary at compile time via `include_str!`.
//!
//! `quill init` seeds these under the template root so a fresh install can
//! provision every kind. Existing files are never overwritten; users edit the
//! seeded copies freely.

use std::path::{Path, PathBuf};

use quill_core::types::TemplateKind;

use crate::error::{io_err, TemplateError};

/// `(kind, path relative to the kind's template dir, content)`
const DEFAULTS: &[(TemplateKind, &str, &str)] = &[
    (
        TemplateKind::Meeting,
        "{{ TIME STAMP }}.md",
        include_str!("templates/meeting.md"),
    ),
    (
        TemplateKind::Daily,
        "{{ TIME STAMP }}.md",
        include_str!("templates/daily.md"),
    ),
    (
        TemplateKind::RelationshipLog,
        "{{ TIME STAMP }}.md",
        include_str!("templates/relationship_log.md"),
    ),
    (
        TemplateKind::ProjectScaffold,
        "README.md",
        include_str!("templates/scaffold_readme.md"),
    ),
    (
        TemplateKind::ProjectScaffold,
        "LICENSE",
        include_str!("templates/scaffold_license.txt"),
    ),
    (
        TemplateKind::ProjectScaffold,
        ".gitignore",
        include_str!("templates/scaffold_gitignore.txt"),
    ),
    (
        TemplateKind::ProjectScaffold,
        "{{ ENV_NAME }}/__init__.py",
        include_str!("templates/scaffold_init.py"),
    ),
];

/// Embedded default files for `kind`: `(relative path, content)`.
pub fn defaults_for(kind: TemplateKind) -> impl Iterator<Item = (&'static str, &'static str)> {
    DEFAULTS
        .iter()
        .filter(move |(k, _, _)| *k == kind)
        .map(|(_, rel, content)| (*rel, *content))
}

/// Write every embedded default under `templates_root` that does not exist yet.
///
/// Returns the paths that were created.
pub fn seed(templates_root: &Path) -> Result<Vec<PathBuf>, TemplateError> {
    let mut created = Vec::new();
    for (kind, rel, content) in DEFAULTS {
        let path = templates_root.join(kind.dir_name()).join(rel);
        if path.exists() {
            continue;
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        std::fs::write(&path, content).map_err(|e| io_err(&path, e))?;
        created.push(path);
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn every_kind_has_a_default() {
        for kind in TemplateKind::all() {
            assert!(defaults_for(*kind).next().is_some(), "no default for {kind}");
        }
    }

    #[test]
    fn seed_does_not_overwrite_user_edits() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let first = seed(root).unwrap();
        assert_eq!(first.len(), DEFAULTS.len());

        let meeting = root.join("meeting").join("{{ TIME STAMP }}.md");
        fs::write(&meeting, "custom").unwrap();
        let second = seed(root).unwrap();
        assert!(second.is_empty());
        assert_eq!(fs::read_to_string(&meeting).unwrap(), "custom");
    }

    #[test]
    fn relationship_default_has_every_section_heading() {
        let (_, content) = defaults_for(TemplateKind::RelationshipLog).next().unwrap();
        for heading in ["### Check-in", "## Goals", "### Actions", "### Tags"] {
            assert!(
                content.lines().any(|l| l.trim_end() == heading),
                "missing {heading}"
            );
        }
    }

    #[test]
    fn no_crlf_in_any_default() {
        for (_, rel, content) in DEFAULTS {
            assert!(!content.contains('\r'), "{rel} contains CR");
        }
    }
}
