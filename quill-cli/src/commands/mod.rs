pub mod clean;
pub mod entities;
pub mod init;
pub mod new;
pub mod retitle;
pub mod templates;

use std::path::PathBuf;

use anyhow::{Context, Result};

pub(crate) fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("could not determine home directory")
}
