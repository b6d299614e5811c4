//! Exam configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::bank::CorrectnessRule;
use crate::model::RetryStrategy;
use crate::scoring::ScoringConfig;

/// Document layout and compiler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatexConfig {
    /// Compiler executable, looked up on `PATH` unless it is a path.
    pub pdflatex: String,
    /// Extra compiler arguments, passed before `-output-directory`.
    ///
    /// Accepts a list or a single whitespace-separated string; `""` means none.
    #[serde(deserialize_with = "one_or_many")]
    pub latex_parameters: Vec<String>,
    pub fontsize: u32,
    pub columns: String,
    /// Preamble lines placed right after `\documentclass`.
    pub prologue: String,
    pub title: String,
    pub subtitle: String,
    pub pagenumbering: String,
    /// Environment each problem is wrapped in.
    pub problem_environment: String,
    /// Heading text of the built-in `problem` environment.
    pub newtheorem_string: String,
    pub baselinestretch: f64,
    pub itemsep: String,
    /// Substituted for `%figures_dir%` in prompts and options.
    pub figures_dir: String,
}

impl Default for LatexConfig {
    fn default() -> Self {
        Self {
            pdflatex: "pdflatex".into(),
            latex_parameters: vec!["-interaction=nonstopmode".into()],
            fontsize: 10,
            columns: "onecolumn".into(),
            prologue: "\\usepackage[utf8]{inputenc}\n\\usepackage{amsmath,amssymb,amsthm}\n\\usepackage{pifont}\n\\usepackage[margin=2cm]{geometry}".into(),
            title: "Test".into(),
            subtitle: String::new(),
            pagenumbering: "gobble".into(),
            problem_environment: "problem".into(),
            newtheorem_string: "Problem".into(),
            baselinestretch: 1.0,
            itemsep: "0pt".into(),
            figures_dir: "figures".into(),
        }
    }
}

/// A free-text field printed at the top of every form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub label: String,
    #[serde(default = "default_field_width")]
    pub width: String,
}

fn default_field_width() -> String {
    "10cm".into()
}

/// Top-level teztyt configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamConfig {
    /// Page budget per test.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Total render attempts per test.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_solutions_file")]
    pub solutions_file: String,
    /// Output files are named `<prefix><test id>.<ext>`.
    #[serde(default = "default_out_file_prefix")]
    pub out_file_prefix: String,
    /// Option keys matching this pattern (at their start) are correct.
    #[serde(default = "default_correct_key_match")]
    pub correct_key_match: String,
    /// Pad merged tests to `max_pages` pages each.
    #[serde(default)]
    pub same_page_number: bool,
    #[serde(default)]
    pub retry_strategy: RetryStrategy,
    /// Fixed seed for reproducible batches.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub latex: LatexConfig,
    #[serde(default = "default_form_fields")]
    pub form_fields: Vec<FormField>,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

fn default_max_pages() -> u32 {
    2
}
fn default_max_attempts() -> u32 {
    5
}
fn default_solutions_file() -> String {
    "solutions.txt".into()
}
fn default_out_file_prefix() -> String {
    "test".into()
}
fn default_correct_key_match() -> String {
    "ok".into()
}
fn default_form_fields() -> Vec<FormField> {
    vec![
        FormField {
            label: "Name".into(),
            width: default_field_width(),
        },
        FormField {
            label: "ID".into(),
            width: "5cm".into(),
        },
    ]
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            max_attempts: default_max_attempts(),
            solutions_file: default_solutions_file(),
            out_file_prefix: default_out_file_prefix(),
            correct_key_match: default_correct_key_match(),
            same_page_number: false,
            retry_strategy: RetryStrategy::default(),
            seed: None,
            latex: LatexConfig::default(),
            form_fields: default_form_fields(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl ExamConfig {
    /// Check settings that deserialization cannot.
    pub fn validate(&self) -> Result<()> {
        if self.max_pages == 0 {
            anyhow::bail!("max_pages must be at least 1");
        }
        if self.max_attempts == 0 {
            anyhow::bail!("max_attempts must be at least 1");
        }
        if self.out_file_prefix.contains(['/', '\\']) {
            anyhow::bail!("out_file_prefix must not contain path separators");
        }
        self.correctness_rule()?;
        Ok(())
    }

    pub fn correctness_rule(&self) -> Result<CorrectnessRule> {
        CorrectnessRule::new(&self.correct_key_match)
            .with_context(|| format!("invalid correct_key_match `{}`", self.correct_key_match))
    }

    /// Path of the solution file inside `out_dir`.
    pub fn solutions_path(&self, out_dir: &Path) -> PathBuf {
        out_dir.join(&self.solutions_file)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
pub fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `teztyt.toml` in the current directory
/// 2. `~/.config/teztyt/config.toml`
///
/// `TEZTYT_PDFLATEX` overrides the compiler.
pub fn load_config() -> Result<ExamConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("teztyt.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ExamConfig::default(),
    };

    if let Ok(pdflatex) = std::env::var("TEZTYT_PDFLATEX") {
        config.latex.pdflatex = pdflatex;
    }
    config.latex.pdflatex = resolve_env_vars(&config.latex.pdflatex);
    config.latex.figures_dir = resolve_env_vars(&config.latex.figures_dir);

    config.validate()?;
    Ok(config)
}

/// Parse a TOML configuration document.
pub fn parse_config(content: &str) -> Result<ExamConfig> {
    Ok(toml::from_str::<ExamConfig>(content)?)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("teztyt"))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => s.split_whitespace().map(String::from).collect(),
        OneOrMany::Many(v) => v,
    })
}
