//! Scoring policies and submission scoring.
//!
//! A policy maps the correct positions `C`, the checked positions `A`, the
//! remaining (unchecked) positions `R`, and the problem's points `p` to a
//! score. Three policies are built in; more can be registered by name.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::codec::FieldName;
use crate::error::ExamError;
use crate::model::SolutionBook;
use crate::traits::{FieldStore, FieldValue};

/// Signature of a registered scoring function: `(C, A, R, p) -> score`.
pub type ScoringFn =
    dyn Fn(&BTreeSet<u32>, &BTreeSet<u32>, &BTreeSet<u32>, f64) -> f64 + Send + Sync;

/// A resolved scoring policy.
#[derive(Clone)]
pub enum ScoringPolicy {
    /// All or nothing: `p` if `A == C`.
    Regular,
    /// `(|C ∩ A| - |A \ C|) / |C| * p`; may be negative.
    Negative,
    /// Like [`ScoringPolicy::Negative`], floored at zero.
    Positive,
    /// A function registered in a [`ScoringRegistry`].
    Custom { name: String, func: Arc<ScoringFn> },
}

impl fmt::Debug for ScoringPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScoringPolicy({})", self.name())
    }
}

impl ScoringPolicy {
    pub fn name(&self) -> &str {
        match self {
            ScoringPolicy::Regular => "regular",
            ScoringPolicy::Negative => "negative",
            ScoringPolicy::Positive => "positive",
            ScoringPolicy::Custom { name, .. } => name,
        }
    }

    /// Score one problem. `sequence` only appears in error messages.
    pub fn score(
        &self,
        sequence: u32,
        correct: &BTreeSet<u32>,
        checked: &BTreeSet<u32>,
        rest: &BTreeSet<u32>,
        points: f64,
    ) -> Result<f64, ExamError> {
        match self {
            ScoringPolicy::Regular => Ok(if checked == correct { points } else { 0.0 }),
            ScoringPolicy::Negative | ScoringPolicy::Positive => {
                if correct.is_empty() {
                    return Err(ExamError::DivisionByZeroScoring {
                        policy: self.name().to_string(),
                        sequence,
                    });
                }
                let hits = correct.intersection(checked).count() as f64;
                let misses = checked.difference(correct).count() as f64;
                let mut net = hits - misses;
                if matches!(self, ScoringPolicy::Positive) {
                    net = net.max(0.0);
                }
                Ok(net / correct.len() as f64 * points)
            }
            ScoringPolicy::Custom { func, .. } => Ok(func(correct, checked, rest, points)),
        }
    }
}

/// Scoring settings as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// `regular`, `negative`, `positive`, or `custom`.
    #[serde(default = "default_policy")]
    pub policy: String,
    /// Registered function name, used when `policy = "custom"`.
    #[serde(default)]
    pub custom: Option<String>,
}

fn default_policy() -> String {
    "regular".into()
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            policy: default_policy(),
            custom: None,
        }
    }
}

/// Named custom scoring functions.
#[derive(Default, Clone)]
pub struct ScoringRegistry {
    custom: HashMap<String, Arc<ScoringFn>>,
}

impl ScoringRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a custom function under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(&BTreeSet<u32>, &BTreeSet<u32>, &BTreeSet<u32>, f64) -> f64 + Send + Sync + 'static,
    {
        self.custom.insert(name.into(), Arc::new(func));
    }

    /// Registered custom names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.custom.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve a policy name. `custom` names the function for `policy = "custom"`.
    pub fn resolve(&self, policy: &str, custom: Option<&str>) -> Result<ScoringPolicy, ExamError> {
        match policy {
            "regular" => Ok(ScoringPolicy::Regular),
            "negative" => Ok(ScoringPolicy::Negative),
            "positive" => Ok(ScoringPolicy::Positive),
            "custom" => {
                let name = custom.ok_or_else(|| ExamError::UnknownScoringPolicy("custom".into()))?;
                self.lookup(name)
            }
            other => self.lookup(other),
        }
    }

    pub fn resolve_config(&self, config: &ScoringConfig) -> Result<ScoringPolicy, ExamError> {
        self.resolve(&config.policy, config.custom.as_deref())
    }

    fn lookup(&self, name: &str) -> Result<ScoringPolicy, ExamError> {
        self.custom
            .get(name)
            .map(|func| ScoringPolicy::Custom {
                name: name.to_string(),
                func: Arc::clone(func),
            })
            .ok_or_else(|| ExamError::UnknownScoringPolicy(name.to_string()))
    }
}

/// Partial credit for the share of correct positions that were checked.
///
/// A problem with no correct positions is worth full points when left blank.
pub fn proportional(
    correct: &BTreeSet<u32>,
    checked: &BTreeSet<u32>,
    _rest: &BTreeSet<u32>,
    points: f64,
) -> f64 {
    if correct.is_empty() {
        return if checked.is_empty() { points } else { 0.0 };
    }
    correct.intersection(checked).count() as f64 / correct.len() as f64 * points
}

/// Field values of one completed form, grouped by problem.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoredSubmission {
    pub test_id: u32,
    /// Free-text fields by name.
    pub text_fields: BTreeMap<String, String>,
    /// Checked positions by problem sequence number.
    pub checked: BTreeMap<u32, BTreeSet<u32>>,
    /// Unchecked or empty positions by problem sequence number.
    pub unchecked: BTreeMap<u32, BTreeSet<u32>>,
}

impl ScoredSubmission {
    /// Build a submission from an extracted field store.
    pub fn from_fields(fields: &FieldStore) -> Result<Self, ExamError> {
        let mut submission = ScoredSubmission::default();
        let mut test_id: Option<u32> = None;

        for (name, value) in fields {
            match FieldName::parse(name)? {
                FieldName::Text(_) => {
                    let text = match value {
                        FieldValue::Text(s) => s.clone(),
                        _ => String::new(),
                    };
                    submission.text_fields.insert(name.clone(), text);
                }
                FieldName::Choice(id) => {
                    match test_id {
                        None => test_id = Some(id.test_id),
                        Some(t) if t != id.test_id => {
                            return Err(ExamError::MalformedSubmission(format!(
                                "fields of tests {t} and {} on one form",
                                id.test_id
                            )));
                        }
                        Some(_) => {}
                    }
                    let target = if *value == FieldValue::Checked {
                        &mut submission.checked
                    } else {
                        &mut submission.unchecked
                    };
                    target.entry(id.sequence).or_default().insert(id.position);
                }
            }
        }

        submission.test_id = test_id
            .ok_or_else(|| ExamError::MalformedSubmission("no answer fields found".into()))?;
        Ok(submission)
    }
}

/// Outcome for one problem of a scored submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemScore {
    pub sequence: u32,
    pub file_index: usize,
    pub problem_id: String,
    pub correct: BTreeSet<u32>,
    pub checked: BTreeSet<u32>,
    pub awarded: f64,
    pub max_points: f64,
}

impl ProblemScore {
    pub fn fully_correct(&self) -> bool {
        self.correct == self.checked
    }
}

/// Score of one completed form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionScore {
    pub test_id: u32,
    pub text_fields: BTreeMap<String, String>,
    pub problems: Vec<ProblemScore>,
    pub total: f64,
    pub max_total: f64,
}

/// Score a submission against the solution book.
///
/// Every problem of the test's key is scored, in sequence order; a problem
/// the form has no fields for counts as left blank.
pub fn score_submission(
    book: &SolutionBook,
    submission: &ScoredSubmission,
    policy: &ScoringPolicy,
) -> Result<SubmissionScore, ExamError> {
    let key = book
        .get(&submission.test_id)
        .ok_or(ExamError::UnknownTestId(submission.test_id))?;
    let empty = BTreeSet::new();

    let mut problems = Vec::with_capacity(key.len());
    for (&sequence, entry) in key {
        let checked = submission.checked.get(&sequence).unwrap_or(&empty);
        let rest = submission.unchecked.get(&sequence).unwrap_or(&empty);
        let awarded = policy.score(sequence, &entry.correct, checked, rest, entry.points)?;
        problems.push(ProblemScore {
            sequence,
            file_index: entry.file_index,
            problem_id: entry.problem_id.clone(),
            correct: entry.correct.clone(),
            checked: checked.clone(),
            awarded,
            max_points: entry.points,
        });
    }

    for sequence in submission.checked.keys() {
        if !key.contains_key(sequence) {
            tracing::warn!(
                test_id = submission.test_id,
                sequence,
                "checked answers for a problem missing from the solution key"
            );
        }
    }

    Ok(SubmissionScore {
        test_id: submission.test_id,
        text_fields: submission.text_fields.clone(),
        total: problems.iter().map(|p| p.awarded).sum(),
        max_total: problems.iter().map(|p| p.max_points).sum(),
        problems,
    })
}
