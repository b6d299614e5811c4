//! The `teztyt merge` command.

use std::path::{Path, PathBuf};

use anyhow::Result;

use teztyt_core::config::load_config_from;
use teztyt_core::merge::{merge_forms, FormDocument};
use teztyt_forms::{collect_form_documents, write_merged};

pub fn execute(config_path: Option<PathBuf>, dir: PathBuf, out: PathBuf) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let documents = collect_form_documents(&dir, &config.out_file_prefix)?;
    anyhow::ensure!(
        !documents.is_empty(),
        "no form registries matching {}<n>.form.json in {}",
        config.out_file_prefix,
        dir.display()
    );
    merge_and_write(&documents, config.same_page_number.then_some(config.max_pages), &out)
}

/// Merge `documents` in order and write the merged registry to `out`.
///
/// With `pad_to`, every test is padded with blank pages up to that length.
pub fn merge_and_write(documents: &[FormDocument], pad_to: Option<u32>, out: &Path) -> Result<()> {
    let merged = merge_forms(documents, pad_to)?;
    write_merged(out, &merged)?;

    println!(
        "Merged {} document(s): {} page(s), {} field(s) -> {}",
        merged.parts.len(),
        merged.page_count,
        merged.registry.len(),
        out.display()
    );
    Ok(())
}
