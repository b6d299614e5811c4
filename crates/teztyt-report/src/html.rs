//! HTML gradebook generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::Result;
use std::path::Path;

use teztyt_core::report::EvaluationReport;
use teztyt_core::statistics::ItemStats;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn positions(set: &std::collections::BTreeSet<u32>) -> String {
    if set.is_empty() {
        return "-".into();
    }
    set.iter().map(u32::to_string).collect::<Vec<_>>().join(",")
}

/// Generate an HTML gradebook from an evaluation report.
pub fn generate_html(report: &EvaluationReport) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>teztyt gradebook: {}</title>\n",
        report.created_at.format("%Y-%m-%d")
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>teztyt gradebook</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Policy: <strong>{}</strong> | {} scored | {} skipped | {}</p>\n",
        html_escape(&report.policy),
        report.submissions.len(),
        report.failures.len(),
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Summary
    let s = &report.statistics.scores;
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Count</th><th>Mean</th><th>Median</th><th>Min</th><th>Max</th><th>Std dev</th></tr></thead>\n");
    html.push_str(&format!(
        "<tbody><tr><td>{}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td></tr></tbody></table>\n",
        s.count, s.mean, s.median, s.min, s.max, s.std_dev
    ));

    if !report.statistics.items.is_empty() {
        html.push_str("<h3>Problems</h3>\n");
        html.push_str(&generate_bar_chart(&report.statistics.items));
    }
    html.push_str("</section>\n");

    // Per-submission results
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Submissions</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Document</th><th onclick=\"sortTable(1)\">Test</th><th onclick=\"sortTable(2)\">Student</th><th onclick=\"sortTable(3)\">Points</th><th>Answers</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for sub in &report.submissions {
        let score = &sub.score;
        let student = sub
            .labelled_text(&report.field_labels)
            .iter()
            .map(|(label, value)| format!("{}: {}", html_escape(label), html_escape(value)))
            .collect::<Vec<_>>()
            .join("<br>");

        let answers = score
            .problems
            .iter()
            .map(|p| {
                format!(
                    "<span class=\"{}\" title=\"{}/{}\">{}. {} / {} ({:.2})</span>",
                    if p.fully_correct() { "pass" } else { "fail" },
                    p.file_index,
                    html_escape(&p.problem_id),
                    p.sequence,
                    positions(&p.checked),
                    positions(&p.correct),
                    p.awarded
                )
            })
            .collect::<Vec<_>>()
            .join(" ");

        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.2} / {:.2}</td><td>{}</td></tr>\n",
            html_escape(&sub.document),
            score.test_id,
            student,
            score.total,
            score.max_total,
            answers
        ));
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    if !report.failures.is_empty() {
        html.push_str("<section class=\"failures\">\n");
        html.push_str("<h2>Skipped documents</h2>\n<ul>\n");
        for f in &report.failures {
            html.push_str(&format!(
                "<li class=\"fail\"><strong>{}</strong>: {}</li>\n",
                html_escape(&f.document),
                html_escape(&f.reason)
            ));
        }
        html.push_str("</ul>\n</section>\n");
    }

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(
        &serde_json::to_string_pretty(report)
            .unwrap_or_default()
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    );
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML gradebook to a file.
pub fn write_html_report(report: &EvaluationReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

/// Horizontal bars of the mean score fraction per problem.
fn generate_bar_chart(items: &[ItemStats]) -> String {
    let bar_height = 24;
    let max_width = 400;
    let padding = 8;
    let label_width = 200;

    let total_height = items.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, item) in items.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let fraction = item.mean_fraction.clamp(0.0, 1.0);
        let width = (fraction * max_width as f64) as usize;

        let color = if fraction >= 0.8 {
            "#22c55e"
        } else if fraction >= 0.5 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}/{} ({}x)</text>\n",
            label_width - 10,
            y + bar_height / 2,
            item.file_index,
            html_escape(&item.problem_id),
            item.seen
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.1}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            item.mean_fraction * 100.0
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; vertical-align: top; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
td span { display: inline-block; margin: 0 0.25rem 0.25rem 0; padding: 0 0.25rem; border-radius: 4px; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    const na = parseFloat(va), nb = parseFloat(vb);
    if (!isNaN(na) && !isNaN(nb)) return asc ? na - nb : nb - na;
    return asc ? va.localeCompare(vb) : vb.localeCompare(va);
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
