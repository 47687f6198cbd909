//! Command implementations for the capi CLI
//!
//! Each command module provides a `run` function that executes the command logic.

pub mod check;
pub mod diff;
pub mod rules;

use std::path::{Path, PathBuf};

use anyhow::Context;
use capi_core::{DiffEngine, DiffOptions, DiffResult};

/// Diff two header trees on the blocking pool.
pub(crate) async fn diff_trees(old: &Path, new: &Path, options: DiffOptions) -> anyhow::Result<DiffResult> {
    let old_root: PathBuf = old.to_path_buf();
    let new_root: PathBuf = new.to_path_buf();
    tokio::task::spawn_blocking(move || DiffEngine::new(options).diff_dirs(&old_root, &new_root))
        .await
        .context("Diff worker panicked")?
        .with_context(|| format!("Failed to diff {} against {}", old.display(), new.display()))
}
