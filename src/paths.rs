use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::config;

pub fn home_dir() -> anyhow::Result<PathBuf> {
    if let Ok(v) = std::env::var("HOME") {
        if !v.is_empty() {
            return Ok(PathBuf::from(v));
        }
    }
    if let Ok(v) = std::env::var("USERPROFILE") {
        if !v.is_empty() {
            return Ok(PathBuf::from(v));
        }
    }
    anyhow::bail!("cannot determine home directory")
}

/// Cache directory for a hub model id, e.g. `~/.semantic-matcher/models/aari1995--German_Semantic_STS_V2`.
pub fn model_cache_dir(model_name: &str) -> anyhow::Result<PathBuf> {
    Ok(home_dir()?
        .join(config::embedding::MODEL_ROOT_REL)
        .join(model_dir_name(model_name)))
}

/// Hub ids contain '/', which must not create nested directories.
pub fn model_dir_name(model_name: &str) -> String {
    model_name.trim().replace(['/', '\\'], "--")
}

pub fn ensure_dir(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create dir {}", dir.display()))
}
