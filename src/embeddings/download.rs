// download.rs: Model file download from the Hugging Face hub with SHA256 reporting.
//
// Resolves a model id to ~/.semantic-matcher/models/<id>/ and downloads the three files
// candle needs on first use. When the caller pins digests, files are verified against them;
// otherwise the computed digest is logged so it can be pinned later.

use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use sha2::{Digest, Sha256};

use crate::{config, paths};

/// Expected SHA256 digests keyed by file name (e.g. "model.safetensors").
pub type PinnedDigests = HashMap<String, String>;

/// Check if all required model files exist in `dir`.
pub fn model_files_exist(dir: &Path) -> bool {
    config::embedding::MODEL_FILES.iter().all(|f| dir.join(f).exists())
}

/// Local directory for a model: `model_dir` as given, or the hub cache (downloading on first use).
pub fn resolve_model_dir(model_name: &str, model_dir: Option<&Path>, pinned: &PinnedDigests) -> anyhow::Result<PathBuf> {
    match model_dir {
        Some(dir) => {
            log::info!("Using local model directory {}", dir.display());
            if !model_files_exist(dir) {
                bail!(
                    "model directory {} must contain {}",
                    dir.display(),
                    config::embedding::MODEL_FILES.join(", ")
                );
            }
            Ok(dir.to_path_buf())
        }
        None => ensure_model_files(model_name, pinned),
    }
}

/// Download all model files for `model_name` if not already cached. Returns the model directory path.
pub fn ensure_model_files(model_name: &str, pinned: &PinnedDigests) -> anyhow::Result<PathBuf> {
    let dir = paths::model_cache_dir(model_name)?;

    if model_files_exist(&dir) {
        log::info!("Model files already cached at {}", dir.display());
        return Ok(dir);
    }

    log::info!("Downloading embedding model {} to {}", model_name, dir.display());
    paths::ensure_dir(&dir)?;

    for file in config::embedding::MODEL_FILES {
        let dest = dir.join(file);
        if dest.exists() {
            continue;
        }
        download_and_verify(&hub_file_url(model_name, file), &dest, pinned.get(file).map(String::as_str))?;
    }

    log::info!("Model download complete");
    Ok(dir)
}

/// `https://huggingface.co/<model>/resolve/main/<file>`
pub fn hub_file_url(model_name: &str, file: &str) -> String {
    format!(
        "{}/{}/resolve/{}/{}",
        config::download::HUB_BASE,
        model_name.trim().trim_matches('/'),
        config::download::HUB_REVISION,
        file
    )
}

/// Download a file from URL and check its SHA256 hash when one is pinned.
fn download_and_verify(url: &str, dest: &Path, expected_sha256: Option<&str>) -> anyhow::Result<()> {
    let filename = dest.file_name().unwrap_or_default().to_string_lossy();
    log::info!("Downloading {} from {}", filename, url);

    let resp = ureq::get(url)
        .timeout(std::time::Duration::from_secs(config::download::DOWNLOAD_TIMEOUT_SECS))
        .call()
        .with_context(|| format!("failed to download {url}"))?;

    let status = resp.status();
    if status != 200 {
        bail!("HTTP {status} downloading {url}");
    }

    let mut body = Vec::new();
    resp.into_reader()
        .read_to_end(&mut body)
        .with_context(|| format!("failed to read response body for {url}"))?;

    let actual_hash = sha256_hex(&body);
    let short = &actual_hash[..config::download::HASH_LOG_PREFIX_CHARS];
    match expected_sha256 {
        Some(expected) if !expected.eq_ignore_ascii_case(&actual_hash) => {
            bail!(
                "SHA256 mismatch for {}: expected {}, got {}",
                filename,
                expected,
                actual_hash
            );
        }
        Some(_) => log::info!("SHA256 verified for {} ({})", filename, short),
        None => log::warn!("No pinned SHA256 for {}; downloaded digest is {}", filename, actual_hash),
    }

    // Write atomically: write to .tmp, then rename
    let tmp_path = dest.with_extension("tmp");
    let mut file = fs::File::create(&tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;
    file.write_all(&body)?;
    file.flush()?;
    drop(file);

    fs::rename(&tmp_path, dest)
        .with_context(|| format!("failed to rename {} -> {}", tmp_path.display(), dest.display()))?;

    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
