//! User configuration stored as YAML.
//!
//! # Storage layout
//!
//! ```text
//! ~/.quill/
//!   config.yaml       (mode 0600, created by `quill init`)
//!   templates/
//!     <kind>/         (one template tree per kind)
//!   .staging/         (exists only while a provisioning run is in flight)
//! ```
//!
//! # API pattern
//!
//! Every function touching the filesystem has two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};
use crate::types::{Identity, TemplateKind};

const DEFAULT_NOTES_DIR: &str = "Notes";
const DEFAULT_RELATIONSHIP_DIR: &str = "Notes/Keeping_in_touch";
const DEFAULT_PROJECTS_DIR: &str = "development";
const DEFAULT_EDITOR: &str = "code";

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.quill/`
pub fn quill_root(home: &Path) -> PathBuf {
    home.join(".quill")
}

/// `<home>/.quill/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    quill_root(home).join("config.yaml")
}

/// `<home>/.quill/templates/`
pub fn templates_root_at(home: &Path) -> PathBuf {
    quill_root(home).join("templates")
}

/// `<home>/.quill/templates/<kind>/`
pub fn template_dir_at(home: &Path, kind: TemplateKind) -> PathBuf {
    templates_root_at(home).join(kind.dir_name())
}

/// `<home>/.quill/.staging/`
pub fn staging_dir_at(home: &Path) -> PathBuf {
    quill_root(home).join(".staging")
}

// ---------------------------------------------------------------------------
// 2. Config model
// ---------------------------------------------------------------------------

/// On-disk shape of `config.yaml`. Every field is optional; relative paths
/// are resolved against the home directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
    #[serde(default)]
    pub identity: Identity,
    #[serde(default)]
    pub tokens: BTreeMap<String, String>,
}

impl RawConfig {
    /// The config written by `quill init`: every default spelled out.
    pub fn with_defaults() -> Self {
        RawConfig {
            notes_dir: Some(PathBuf::from(DEFAULT_NOTES_DIR)),
            relationship_dir: Some(PathBuf::from(DEFAULT_RELATIONSHIP_DIR)),
            projects_dir: Some(PathBuf::from(DEFAULT_PROJECTS_DIR)),
            editor: Some(DEFAULT_EDITOR.to_string()),
            identity: Identity::default(),
            tokens: BTreeMap::new(),
        }
    }
}

/// Resolved configuration with absolute paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root of the dated note hierarchy (meetings, daily logs).
    pub notes_dir: PathBuf,
    /// Root of the per-entity relationship logs.
    pub relationship_dir: PathBuf,
    /// Where project scaffolds are created.
    pub projects_dir: PathBuf,
    /// Command used by `--open`.
    pub editor: String,
    pub identity: Identity,
    /// Extra literal tokens: `NAME` → value, substituted as `{{ NAME }}`.
    pub tokens: BTreeMap<String, String>,
}

impl Config {
    /// Resolve a [`RawConfig`] against `home`.
    pub fn resolve(raw: RawConfig, home: &Path) -> Self {
        let under_home = |p: Option<PathBuf>, default: &str| {
            let p = p.unwrap_or_else(|| PathBuf::from(default));
            if p.is_absolute() {
                p
            } else {
                home.join(p)
            }
        };
        Config {
            notes_dir: under_home(raw.notes_dir, DEFAULT_NOTES_DIR),
            relationship_dir: under_home(raw.relationship_dir, DEFAULT_RELATIONSHIP_DIR),
            projects_dir: under_home(raw.projects_dir, DEFAULT_PROJECTS_DIR),
            editor: raw.editor.unwrap_or_else(|| DEFAULT_EDITOR.to_string()),
            identity: raw.identity,
            tokens: raw.tokens,
        }
    }

    /// Defaults for `home` when no config file exists.
    pub fn default_for(home: &Path) -> Self {
        Config::resolve(RawConfig::default(), home)
    }
}

// ---------------------------------------------------------------------------
// 3. Load
// ---------------------------------------------------------------------------

/// Load `<home>/.quill/config.yaml`, falling back to defaults when absent.
///
/// Returns `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(home: &Path) -> Result<Config, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Ok(Config::default_for(home));
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    let raw: RawConfig =
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })?;
    Ok(Config::resolve(raw, home))
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Config, ConfigError> {
    load_at(&home()?)
}

// ---------------------------------------------------------------------------
// 4. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save `raw` to `<home>/.quill/config.yaml`.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_at(home: &Path, raw: &RawConfig) -> Result<(), ConfigError> {
    let root = quill_root(home);
    if !root.exists() {
        std::fs::create_dir_all(&root).map_err(|e| io_err(&root, e))?;
        set_dir_permissions(&root)?;
    }
    let path = config_path_at(home);
    let tmp_path = path.with_file_name("config.yaml.tmp");

    let yaml = serde_yaml::to_string(raw)?;
    std::fs::write(&tmp_path, yaml).map_err(|e| io_err(&tmp_path, e))?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// 5. Init
// ---------------------------------------------------------------------------

/// Write the default config if none exists, and create the template root.
///
/// Idempotent: an existing config is loaded and returned unchanged.
/// The boolean is `true` when a new config file was written.
pub fn init_at(home: &Path) -> Result<(Config, bool), ConfigError> {
    let templates = templates_root_at(home);
    std::fs::create_dir_all(&templates).map_err(|e| io_err(&templates, e))?;

    if config_path_at(home).exists() {
        return Ok((load_at(home)?, false));
    }
    let raw = RawConfig::with_defaults();
    save_at(home, &raw)?;
    Ok((Config::resolve(raw, home), true))
}

/// `init_at` convenience wrapper.
pub fn init() -> Result<(Config, bool), ConfigError> {
    init_at(&home()?)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// The current user's home directory.
fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
