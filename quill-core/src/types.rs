//! Domain types shared by every quill crate.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a tracked entity (one subdirectory per contact).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityName(pub String);

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for EntityName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl EntityName {
    /// Whether this name can be used as a single directory name.
    pub fn is_valid(&self) -> bool {
        is_path_segment(&self.0)
    }
}

/// `true` for a non-empty, non-hidden name without path separators.
pub fn is_path_segment(name: &str) -> bool {
    !name.trim().is_empty() && !name.starts_with('.') && !name.contains(['/', '\\'])
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// The kind of artifact a template produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateKind {
    Meeting,
    RelationshipLog,
    Daily,
    ProjectScaffold,
}

impl TemplateKind {
    /// All template kinds in a stable order.
    pub fn all() -> &'static [TemplateKind] {
        &[
            TemplateKind::Meeting,
            TemplateKind::RelationshipLog,
            TemplateKind::Daily,
            TemplateKind::ProjectScaffold,
        ]
    }

    /// Directory name of this kind under the template root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            TemplateKind::Meeting => "meeting",
            TemplateKind::RelationshipLog => "relationship-log",
            TemplateKind::Daily => "daily",
            TemplateKind::ProjectScaffold => "project-scaffold",
        }
    }

    /// Whether new documents of this kind inherit fields from a predecessor.
    pub fn is_chained(&self) -> bool {
        matches!(self, TemplateKind::RelationshipLog)
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for TemplateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "meeting" => Ok(TemplateKind::Meeting),
            "relationship-log" | "kit" => Ok(TemplateKind::RelationshipLog),
            "daily" => Ok(TemplateKind::Daily),
            "project-scaffold" | "scaffold" => Ok(TemplateKind::ProjectScaffold),
            other => Err(format!(
                "unknown template kind '{other}'; expected: meeting, relationship-log (kit), daily, project-scaffold (scaffold)"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// Static identity of the person running quill, substituted into templates.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub contact: String,
}

/// Fields carried forward from the previous document of an entity series.
///
/// The default value (all empty) is what a first-of-series document gets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChainedFields {
    pub last_we_spoke: String,
    pub goals: String,
    pub proposed_actions: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
