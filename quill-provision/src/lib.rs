//! # quill-provision
//!
//! Staged provisioning: stage a template, resolve it, promote it, tear down.
//!
//! Call [`pipeline::run_at`] to provision one artifact for a request, or build
//! a [`RunContext`] yourself and hand it to [`pipeline::run`].

pub mod error;
pub mod pipeline;
pub mod staging;
pub mod writer;

pub use error::{ErrorKind, ProvisionError};
pub use pipeline::{ProvisionReport, ProvisionRequest, RunContext, RunPaths, RunState};
pub use staging::StagingArea;
