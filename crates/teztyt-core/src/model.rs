//! Core data model types for teztyt.
//!
//! These are the types the whole workspace uses to represent problems, the
//! problem bank, assembled test instances, and solution keys.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::ExamError;

/// One labelled answer option of a problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOption {
    /// Option key as written in the problem file.
    pub key: String,
    /// Option text (LaTeX).
    pub text: String,
    /// Whether this option is a correct answer; fixed at load time.
    pub correct: bool,
}

/// A single assessment item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    /// Identifier, unique within its file.
    pub id: String,
    /// Point value.
    pub points: f64,
    /// Problem statement (LaTeX).
    pub prompt: String,
    /// Options in file order.
    pub options: Vec<AnswerOption>,
}

impl Problem {
    /// Look up an option by key.
    pub fn option(&self, key: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.key == key)
    }

    /// Number of correct options.
    pub fn correct_count(&self) -> usize {
        self.options.iter().filter(|o| o.correct).count()
    }
}

/// The problems loaded from one data file.
#[derive(Debug, Clone)]
pub struct ProblemFile {
    /// Where the problems came from (used in messages).
    pub source: String,
    problems: Vec<Problem>,
    index: HashMap<String, usize>,
}

impl ProblemFile {
    /// Build a file from problems in file order.
    ///
    /// Fails with [`ExamError::DuplicateProblemId`] if two problems share an id.
    pub fn new(source: impl Into<String>, problems: Vec<Problem>) -> Result<Self, ExamError> {
        let source = source.into();
        let mut index = HashMap::with_capacity(problems.len());
        for (i, p) in problems.iter().enumerate() {
            if index.insert(p.id.clone(), i).is_some() {
                return Err(ExamError::DuplicateProblemId {
                    source_name: source,
                    id: p.id.clone(),
                });
            }
        }
        Ok(Self {
            source,
            problems,
            index,
        })
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn get(&self, id: &str) -> Option<&Problem> {
        self.index.get(id).map(|&i| &self.problems[i])
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}

/// All problem files of one run, in command-line order.
///
/// Files are addressed by a 1-based `file_index` everywhere outside this type.
#[derive(Debug, Clone, Default)]
pub struct ProblemBank {
    files: Vec<ProblemFile>,
}

impl ProblemBank {
    pub fn new(files: Vec<ProblemFile>) -> Self {
        Self { files }
    }

    pub fn files(&self) -> &[ProblemFile] {
        &self.files
    }

    /// The file with the given 1-based index.
    pub fn file(&self, file_index: usize) -> Option<&ProblemFile> {
        file_index
            .checked_sub(1)
            .and_then(|i| self.files.get(i))
    }

    /// Look up a problem by 1-based file index and id.
    pub fn problem(&self, file_index: usize, id: &str) -> Option<&Problem> {
        self.file(file_index).and_then(|f| f.get(id))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// A problem placed into a test, with its frozen option order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedProblem {
    /// 1-based position of the problem in the test, continuing across files.
    pub sequence: u32,
    /// 1-based index of the source file.
    pub file_index: usize,
    pub problem_id: String,
    /// Option keys in rendered order; position `n` is `option_order[n - 1]`.
    pub option_order: Vec<String>,
}

impl SelectedProblem {
    /// Field identifiers of this problem's rendered options, in order.
    pub fn field_names(&self, test_id: u32) -> Vec<String> {
        (1..=self.option_order.len() as u32)
            .map(|pos| {
                codec::encode(
                    test_id,
                    self.sequence,
                    self.file_index as u32,
                    &self.problem_id,
                    pos,
                )
            })
            .collect()
    }
}

/// One assembled test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestInstance {
    pub test_id: u32,
    pub problems: Vec<SelectedProblem>,
}

impl TestInstance {
    /// The selected problem ids grouped per file, in test order.
    ///
    /// Feeding this back as an explicit selection reproduces the same problems.
    pub fn problem_ids_per_file(&self, file_count: usize) -> Vec<Vec<String>> {
        let mut lists = vec![Vec::new(); file_count];
        for p in &self.problems {
            if let Some(list) = p.file_index.checked_sub(1).and_then(|i| lists.get_mut(i)) {
                list.push(p.problem_id.clone());
            }
        }
        lists
    }
}

/// Solution record of one problem within one test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionEntry {
    pub file_index: usize,
    pub problem_id: String,
    pub points: f64,
    /// Correct option positions (1-based), not option keys.
    pub correct: BTreeSet<u32>,
}

/// Solution records of one test, keyed by problem sequence number.
pub type SolutionKey = BTreeMap<u32, SolutionEntry>;

/// Solution keys of a whole batch, keyed by test id.
pub type SolutionBook = BTreeMap<u32, SolutionKey>;

/// How the page-fit loop produces the next draft after a rejected one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryStrategy {
    /// Re-run the original selection; by-count tests may pick new problems.
    #[default]
    Resample,
    /// Keep the rejected draft's problems and only shuffle options again.
    Reshuffle,
}

impl fmt::Display for RetryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryStrategy::Resample => write!(f, "resample"),
            RetryStrategy::Reshuffle => write!(f, "reshuffle"),
        }
    }
}

impl FromStr for RetryStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "resample" => Ok(RetryStrategy::Resample),
            "reshuffle" => Ok(RetryStrategy::Reshuffle),
            other => Err(format!("unknown retry strategy: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem(id: &str) -> Problem {
        Problem {
            id: id.into(),
            points: 2.0,
            prompt: "What?".into(),
            options: vec![
                AnswerOption {
                    key: "ok".into(),
                    text: "yes".into(),
                    correct: true,
                },
                AnswerOption {
                    key: "x".into(),
                    text: "no".into(),
                    correct: false,
                },
            ],
        }
    }

    #[test]
    fn bank_uses_one_based_file_index() {
        let file = ProblemFile::new("a.json", vec![problem("p1")]).unwrap();
        let bank = ProblemBank::new(vec![file]);
        assert!(bank.file(0).is_none());
        assert_eq!(bank.problem(1, "p1").unwrap().correct_count(), 1);
        assert!(bank.problem(2, "p1").is_none());
    }

    #[test]
    fn duplicate_ids_rejected() {
        let err = ProblemFile::new("a.json", vec![problem("p1"), problem("p1")]).unwrap_err();
        assert!(matches!(err, ExamError::DuplicateProblemId { ref id, .. } if id == "p1"));
    }

    #[test]
    fn field_names_are_dense_and_one_based() {
        let sp = SelectedProblem {
            sequence: 4,
            file_index: 2,
            problem_id: "q".into(),
            option_order: vec!["b".into(), "a".into(), "c".into()],
        };
        assert_eq!(
            sp.field_names(9),
            vec!["9:4:2:q:1", "9:4:2:q:2", "9:4:2:q:3"]
        );
    }

    #[test]
    fn problem_ids_per_file_groups_by_file() {
        let instance = TestInstance {
            test_id: 1,
            problems: vec![
                SelectedProblem {
                    sequence: 1,
                    file_index: 1,
                    problem_id: "a".into(),
                    option_order: vec![],
                },
                SelectedProblem {
                    sequence: 2,
                    file_index: 2,
                    problem_id: "b".into(),
                    option_order: vec![],
                },
                SelectedProblem {
                    sequence: 3,
                    file_index: 2,
                    problem_id: "c".into(),
                    option_order: vec![],
                },
            ],
        };
        assert_eq!(
            instance.problem_ids_per_file(3),
            vec![vec!["a".to_string()], vec!["b".into(), "c".into()], vec![]]
        );
    }

    #[test]
    fn retry_strategy_display_and_parse() {
        assert_eq!(RetryStrategy::Reshuffle.to_string(), "reshuffle");
        assert_eq!(
            "Resample".parse::<RetryStrategy>().unwrap(),
            RetryStrategy::Resample
        );
        assert!("sometimes".parse::<RetryStrategy>().is_err());
    }
}
