//! The `teztyt init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("teztyt.toml").exists() {
        println!("teztyt.toml already exists, skipping.");
    } else {
        std::fs::write("teztyt.toml", SAMPLE_CONFIG)?;
        println!("Created teztyt.toml");
    }

    std::fs::create_dir_all("problems")?;
    let sample_path = std::path::Path::new("problems/sample.json");
    if sample_path.exists() {
        println!("problems/sample.json already exists, skipping.");
    } else {
        std::fs::write(sample_path, SAMPLE_PROBLEMS)?;
        println!("Created problems/sample.json");
    }

    println!("\nNext steps:");
    println!("  1. Edit teztyt.toml (title, page budget, pdflatex path)");
    println!("  2. Run: teztyt validate --files problems/sample.json");
    println!("  3. Run: teztyt gen -n 10 --files problems/sample.json --problems '[2]'");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# teztyt configuration

max_pages = 2
max_attempts = 5
solutions_file = "solutions.txt"
out_file_prefix = "test"
# Option keys matching this pattern (anchored at the start) are correct.
correct_key_match = "ok"
same_page_number = false
# "resample" draws new problems on retry, "reshuffle" only reorders options.
retry_strategy = "resample"

[latex]
pdflatex = "pdflatex"
latex_parameters = ["-interaction=nonstopmode"]
fontsize = 11
columns = "onecolumn"
title = "Midterm exam"
subtitle = ""
figures_dir = "${HOME}/figures"

[[form_fields]]
label = "Name"
width = "8cm"

[[form_fields]]
label = "ID"
width = "4cm"

[scoring]
# regular, negative, positive, or a registered custom name such as proportional
policy = "regular"
"#;

const SAMPLE_PROBLEMS: &str = r#"{
  "arith-1": {
    "P": 1,
    "Q": "What is $2 + 2$?",
    "A": { "ok": "$4$", "x1": "$3$", "x2": "$5$", "x3": "$22$" }
  },
  "primes-1": {
    "P": 2,
    "Q": "Which of the following numbers are prime?",
    "A": { "ok1": "$2$", "x1": "$9$", "ok2": "$13$", "x2": "$21$" }
  },
  "limits-1": {
    "P": 2,
    "Q": "Evaluate $\\lim_{x \\to 0} \\frac{\\sin x}{x}$.",
    "A": { "ok": "$1$", "x1": "$0$", "x2": "$\\infty$", "x3": "does not exist" }
  }
}
"#;
