//! The `teztyt validate` command.

use std::path::PathBuf;

use anyhow::Result;

use teztyt_core::bank::{load_problem_file, validate_bank};
use teztyt_core::config::load_config_from;
use teztyt_core::model::ProblemBank;

pub fn execute(config_path: Option<PathBuf>, files: Vec<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let rule = config.correctness_rule()?;

    let mut loaded = Vec::with_capacity(files.len());
    for path in &files {
        let file = load_problem_file(path, &rule)?;
        println!("Problem file: {} ({} problems)", file.source, file.len());
        loaded.push(file);
    }

    let warnings = validate_bank(&ProblemBank::new(loaded));
    for w in &warnings {
        let prefix = w
            .problem_id
            .as_ref()
            .map(|id| format!("  [{}:{id}]", w.source))
            .unwrap_or_else(|| format!("  [{}]", w.source));
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("All problem files valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
