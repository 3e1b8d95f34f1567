//! # quill-template
//!
//! Literal-token template materialization.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use quill_template::{Materializer, SubstitutionContext};
//! use quill_core::types::{Identity, TemplateKind};
//!
//! fn stage(templates_root: &Path, staging: &Path) {
//!     let now = chrono::Local::now().naive_local();
//!     let ctx = SubstitutionContext::new(TemplateKind::Meeting, now, Identity::default());
//!     let set = ctx.to_substitutions();
//!     if let Ok(files) = Materializer::new(templates_root).materialize(TemplateKind::Meeting, &set, staging) {
//!         for file in files {
//!             println!("staged {}", file.display());
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod token;

pub use context::SubstitutionContext;
pub use engine::Materializer;
pub use error::TemplateError;
pub use token::{SubstitutionSet, Token};
