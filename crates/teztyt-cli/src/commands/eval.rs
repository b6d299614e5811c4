//! The `teztyt eval` command.

use std::path::PathBuf;

use anyhow::Result;

use teztyt_core::config::load_config_from;
use teztyt_core::evaluate::{collect_documents, evaluate_batch};
use teztyt_core::report::EvaluationReport;
use teztyt_core::scoring::{proportional, ScoringRegistry};
use teztyt_core::solution;
use teztyt_forms::JsonFieldExtractor;
use teztyt_report::write_html_report;

use super::ConsoleReporter;

/// Custom scoring functions selectable by name from the config.
pub fn scoring_registry() -> ScoringRegistry {
    let mut registry = ScoringRegistry::new();
    registry.register("proportional", proportional);
    registry
}

pub fn execute(
    config_path: Option<PathBuf>,
    solutions: PathBuf,
    dir: PathBuf,
    out: PathBuf,
    format: String,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let policy = scoring_registry().resolve_config(&config.scoring)?;
    let book = solution::load(&solutions)?;

    let extractor = JsonFieldExtractor;
    let documents = collect_documents(&dir, &extractor)?;
    anyhow::ensure!(
        !documents.is_empty(),
        "no answer documents found in {}",
        dir.display()
    );

    eprintln!(
        "teztyt v{}: Scoring {} document(s) against {} solution key(s), policy {}",
        env!("CARGO_PKG_VERSION"),
        documents.len(),
        book.len(),
        policy.name()
    );
    eprintln!();

    let labels = config.form_fields.iter().map(|f| f.label.clone()).collect();
    let report = evaluate_batch(&extractor, &documents, &book, &policy, labels, &ConsoleReporter)?;

    print_summary(&report);

    std::fs::create_dir_all(&out)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html"]
    } else {
        format.split(',').map(str::trim).collect()
    };

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = out.join(format!("report-{timestamp}.json"));
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            "html" => {
                let path = out.join(format!("report-{timestamp}.html"));
                write_html_report(&report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    Ok(())
}

fn print_summary(report: &EvaluationReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    let mut header = vec!["Document".to_string(), "Test".to_string()];
    header.extend(report.field_labels.iter().cloned());
    header.push("Points".into());
    table.set_header(header);

    for sub in &report.submissions {
        let text = sub.labelled_text(&report.field_labels);
        let mut row = vec![Cell::new(&sub.document), Cell::new(sub.score.test_id)];
        for label in &report.field_labels {
            let value = text
                .iter()
                .find(|(l, _)| l == label)
                .map(|(_, v)| v.as_str())
                .unwrap_or("");
            row.push(Cell::new(value));
        }
        row.push(Cell::new(format!(
            "{:.2}/{:.2}",
            sub.score.total, sub.score.max_total
        )));
        table.add_row(row);
    }

    let s = &report.statistics.scores;
    eprintln!("\n{table}");
    eprintln!(
        "Mean {:.2} | Median {:.2} | Min {:.2} | Max {:.2} | Std dev {:.2}",
        s.mean, s.median, s.min, s.max, s.std_dev
    );
    if !report.failures.is_empty() {
        eprintln!("{} document(s) skipped", report.failures.len());
    }
}
