//! Problem bank loader.
//!
//! Loads problem files (JSON, TOML or YAML), resolves option correctness once from
//! the configured key pattern, and validates banks for common issues.
//!
//! A problem file is a map from problem id to problem, in file order:
//!
//! ```json
//! { "limits-1": { "P": 2, "Q": "Evaluate ...", "A": { "ok": "$1$", "x1": "$0$" } } }
//! ```
//!
//! `points`, `question` and `answers` are accepted as long-form keys.
//!
//! YAML files hold one problem per document, separated by `---`.

use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::codec::SEPARATOR;
use crate::error::ExamError;
use crate::model::{AnswerOption, Problem, ProblemBank, ProblemFile};

/// Decides which option keys mark correct answers.
///
/// The pattern is anchored at the start of the key, so `ok` matches `ok`,
/// `ok2` and `okay` but not `not-ok`.
#[derive(Debug, Clone)]
pub struct CorrectnessRule {
    pattern: Regex,
}

impl CorrectnessRule {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(&format!("^(?:{pattern})"))?,
        })
    }

    pub fn is_correct(&self, key: &str) -> bool {
        self.pattern.is_match(key)
    }
}

/// Map entries in document order, duplicates included.
///
/// Deserializing into a map type would silently keep only one of two equal
/// keys; this keeps both so the loader can report them.
struct Entries<T>(Vec<(String, T)>);

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Entries<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
            type Value = Entries<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map keyed by id")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, T>()? {
                    entries.push((key, value));
                }
                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

/// Intermediate structure for one problem in a data file.
#[derive(Deserialize)]
struct RawProblem {
    #[serde(rename = "P", alias = "points")]
    points: f64,
    #[serde(rename = "Q", alias = "question")]
    question: String,
    #[serde(rename = "A", alias = "answers")]
    answers: Entries<String>,
}

/// Supported problem file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankFormat {
    Json,
    Toml,
    Yaml,
}

impl BankFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(BankFormat::Json),
            "toml" => Some(BankFormat::Toml),
            "yaml" | "yml" => Some(BankFormat::Yaml),
            _ => None,
        }
    }
}

/// Load a single problem file.
pub fn load_problem_file(path: &Path, rule: &CorrectnessRule) -> Result<ProblemFile> {
    let format = BankFormat::from_path(path).with_context(|| {
        format!(
            "unsupported problem file (expected .json, .toml or .yaml): {}",
            path.display()
        )
    })?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read problem file: {}", path.display()))?;

    parse_problem_file_str(&content, &path.display().to_string(), format, rule)
}

/// Parse problem file contents (useful for testing).
pub fn parse_problem_file_str(
    content: &str,
    source: &str,
    format: BankFormat,
    rule: &CorrectnessRule,
) -> Result<ProblemFile> {
    let raw: Entries<RawProblem> = match format {
        BankFormat::Json => serde_json::from_str(content)
            .with_context(|| format!("failed to parse JSON: {source}"))?,
        BankFormat::Toml => {
            toml::from_str(content).with_context(|| format!("failed to parse TOML: {source}"))?
        }
        BankFormat::Yaml => parse_yaml_documents(content, source)?,
    };

    let problems = raw
        .0
        .into_iter()
        .map(|(id, p)| build_problem(source, id, p, rule))
        .collect::<Result<Vec<_>, ExamError>>()?;

    tracing::debug!(source, problems = problems.len(), "loaded problem file");
    Ok(ProblemFile::new(source, problems)?)
}

/// Collect a multi-document YAML stream, one problem per document.
///
/// Duplicate ids across documents are left for [`ProblemFile::new`] to report.
fn parse_yaml_documents(content: &str, source: &str) -> Result<Entries<RawProblem>> {
    let mut entries = Vec::new();
    for (n, document) in serde_yaml::Deserializer::from_str(content).enumerate() {
        let Entries(mut problems) = Entries::<RawProblem>::deserialize(document)
            .with_context(|| format!("failed to parse YAML document {}: {source}", n + 1))?;
        anyhow::ensure!(
            problems.len() == 1,
            "wrong YAML format in {source}: document {} holds {} problems, expected exactly one",
            n + 1,
            problems.len()
        );
        entries.append(&mut problems);
    }
    Ok(Entries(entries))
}

/// Load every problem file of a run, keeping command-line order.
pub fn load_bank<P: AsRef<Path>>(paths: &[P], rule: &CorrectnessRule) -> Result<ProblemBank> {
    let files = paths
        .iter()
        .map(|p| load_problem_file(p.as_ref(), rule))
        .collect::<Result<Vec<_>>>()?;
    Ok(ProblemBank::new(files))
}

fn build_problem(
    source: &str,
    id: String,
    raw: RawProblem,
    rule: &CorrectnessRule,
) -> Result<Problem, ExamError> {
    let invalid = |reason: &str| ExamError::InvalidProblem {
        source_name: source.to_string(),
        id: id.clone(),
        reason: reason.to_string(),
    };

    if id.is_empty() {
        return Err(invalid("problem id is empty"));
    }
    if id.contains(SEPARATOR) || id.contains(['\t', '\n', '\r']) {
        return Err(invalid("problem id must not contain ':', tabs, or line breaks"));
    }
    if !raw.points.is_finite() || raw.points < 0.0 {
        return Err(invalid("points must be a non-negative number"));
    }
    if raw.answers.0.is_empty() {
        return Err(invalid("problem has no answer options"));
    }

    let mut options: Vec<AnswerOption> = Vec::with_capacity(raw.answers.0.len());
    for (key, text) in raw.answers.0 {
        if options.iter().any(|o| o.key == key) {
            return Err(invalid(&format!("duplicate option key `{key}`")));
        }
        let correct = rule.is_correct(&key);
        options.push(AnswerOption { key, text, correct });
    }

    Ok(Problem {
        id,
        points: raw.points,
        prompt: raw.question,
        options,
    })
}

/// A warning from problem bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// Source file of the problem.
    pub source: String,
    /// The problem id (if applicable).
    pub problem_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a loaded bank for issues that loading does not reject.
pub fn validate_bank(bank: &ProblemBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    for file in bank.files() {
        let warn = |warnings: &mut Vec<ValidationWarning>, id: &str, message: &str| {
            warnings.push(ValidationWarning {
                source: file.source.clone(),
                problem_id: Some(id.to_string()),
                message: message.to_string(),
            });
        };

        if file.is_empty() {
            warnings.push(ValidationWarning {
                source: file.source.clone(),
                problem_id: None,
                message: "file contains no problems".into(),
            });
        }

        for problem in file.problems() {
            let correct = problem.correct_count();
            if correct == 0 {
                warn(
                    &mut warnings,
                    &problem.id,
                    "no option matches the correct-answer pattern",
                );
            } else if correct == problem.options.len() && problem.options.len() > 1 {
                warn(&mut warnings, &problem.id, "every option is marked correct");
            }
            if problem.points == 0.0 {
                warn(&mut warnings, &problem.id, "problem is worth 0 points");
            }
            if problem.prompt.trim().is_empty() {
                warn(&mut warnings, &problem.id, "prompt is empty");
            }
        }
    }

    warnings
}
