//! Quill core library: domain types, configuration persistence, errors.
//!
//! Public API surface:
//! - [`types`]: template kinds, entity names, identity, chained fields
//! - [`timestamp`]: the canonical fixed-width document timestamp
//! - [`error`]: [`ConfigError`]
//! - [`config`]: load / save / init of `~/.quill/config.yaml`

pub mod config;
pub mod error;
pub mod timestamp;
pub mod types;

pub use config::Config;
pub use error::ConfigError;
pub use types::{ChainedFields, EntityName, Identity, TemplateKind};
