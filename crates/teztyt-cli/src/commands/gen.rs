//! The `teztyt gen` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use teztyt_core::assembler::Selection;
use teztyt_core::bank::{load_bank, validate_bank};
use teztyt_core::config::load_config_from;
use teztyt_core::engine::{BatchGenerator, BatchOutcome, GenerationConfig};
use teztyt_core::solution;
use teztyt_forms::write_sidecar;
use teztyt_latex::{LatexComposer, LatexRenderer};

use super::ConsoleReporter;

#[allow(clippy::too_many_arguments)]
pub async fn execute(
    config_path: Option<PathBuf>,
    number: u32,
    files: Vec<PathBuf>,
    problems: String,
    out: PathBuf,
    merge: Option<PathBuf>,
    seed: Option<u64>,
) -> Result<()> {
    anyhow::ensure!(!files.is_empty(), "at least one problem file is required");

    let config = load_config_from(config_path.as_deref())?;
    let rule = config.correctness_rule()?;
    let bank = load_bank(&files, &rule)?;
    for w in validate_bank(&bank) {
        match &w.problem_id {
            Some(id) => tracing::warn!(source = %w.source, problem = %id, "{}", w.message),
            None => tracing::warn!(source = %w.source, "{}", w.message),
        }
    }

    let selection = Selection::from_json(&problems).context("invalid --problems")?;
    // `-n 0` is a single test built from the listed ids.
    let number = match (number, &selection) {
        (0, Selection::Explicit(_)) => 1,
        (0, Selection::ByCount(_)) => anyhow::bail!(
            "-n 0 needs an id-list selection such as [[\"a1\"], [\"b2\"]]; use -n 1 with counts"
        ),
        (n, _) => n,
    };

    let seed = seed.or(config.seed);
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    std::fs::create_dir_all(&out)
        .with_context(|| format!("failed to create {}", out.display()))?;

    let composer = LatexComposer::new(config.latex.clone(), config.form_fields.clone());
    let renderer = LatexRenderer::from_config(&out, &config);
    let generation = GenerationConfig {
        number,
        max_pages: config.max_pages,
        max_attempts: config.max_attempts,
        retry_strategy: config.retry_strategy,
        out_file_prefix: config.out_file_prefix.clone(),
    };

    eprintln!(
        "teztyt v{}: Generating {} test(s) from {} problem file(s), at most {} page(s) each",
        env!("CARGO_PKG_VERSION"),
        number,
        bank.len(),
        config.max_pages
    );
    if let Some(seed) = seed {
        eprintln!("Seed: {seed}");
    }
    eprintln!();

    let outcome = BatchGenerator::new(&bank, &composer, &renderer, generation)
        .run(&selection, rng, &ConsoleReporter)
        .await;

    // Accepted tests stay usable even when a later one failed.
    let solutions_path = config.solutions_path(&out);
    solution::save(&solutions_path, &outcome.solutions)?;
    eprintln!("Solutions saved to: {}", solutions_path.display());
    for test in &outcome.accepted {
        write_sidecar(&out, &test.form)?;
    }

    print_summary(&outcome);

    if let Some(failure) = outcome.failure {
        if failure.error.is_fatal() {
            eprintln!("Hint: check `[latex] pdflatex` in the config or set TEZTYT_PDFLATEX");
        }
        return Err(anyhow::Error::new(failure.error)
            .context(format!("generation stopped at test {}", failure.test_id)));
    }

    if let Some(merge_path) = merge {
        let documents: Vec<_> = outcome.accepted.iter().map(|t| t.form.clone()).collect();
        let pad_to = config.same_page_number.then_some(config.max_pages);
        super::merge::merge_and_write(&documents, pad_to, &merge_path)?;
    }

    Ok(())
}

fn print_summary(outcome: &BatchOutcome) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Test", "Pages", "Attempts", "Fields", "Document"]);

    for test in &outcome.accepted {
        let fields = test.form.registry.as_ref().map(|r| r.len()).unwrap_or(0);
        table.add_row(vec![
            Cell::new(test.test_id),
            Cell::new(test.page_count),
            Cell::new(test.attempts),
            Cell::new(fields),
            Cell::new(test.artifact.document.display()),
        ]);
    }

    eprintln!("\n{table}");
}
