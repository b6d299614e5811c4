//! Field registry sidecar files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use teztyt_core::merge::{FormDocument, MergedForm};

/// File name suffix of registry sidecars.
pub const SIDECAR_SUFFIX: &str = ".form.json";

/// Sidecar path of the document named `name` in `dir`.
pub fn sidecar_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}{SIDECAR_SUFFIX}"))
}

/// Write the sidecar of one document and return its path.
pub fn write_sidecar(dir: &Path, document: &FormDocument) -> Result<PathBuf> {
    let path = sidecar_path(dir, &document.name);
    let json = serde_json::to_string_pretty(document).context("failed to serialize form")?;
    std::fs::write(&path, json)
        .with_context(|| format!("failed to write form registry to {}", path.display()))?;
    Ok(path)
}

pub fn read_sidecar(path: &Path) -> Result<FormDocument> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read form registry from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse form registry {}", path.display()))
}

/// Read every `<prefix><test id>.form.json` in `dir`, ordered by test id.
pub fn collect_form_documents(dir: &Path, prefix: &str) -> Result<Vec<FormDocument>> {
    let mut found: Vec<(u32, PathBuf)> = Vec::new();
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let test_id = name
            .strip_suffix(SIDECAR_SUFFIX)
            .and_then(|stem| stem.strip_prefix(prefix))
            .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|id| id.parse::<u32>().ok());
        if let Some(test_id) = test_id {
            found.push((test_id, path));
        }
    }
    found.sort();

    found
        .iter()
        .map(|(_, path)| read_sidecar(path))
        .collect()
}

/// Write the merged registry next to the merged document.
pub fn write_merged(path: &Path, merged: &MergedForm) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(merged).context("failed to serialize merged form")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write merged form to {}", path.display()))
}
