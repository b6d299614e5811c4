//! Randomized test assembly.
//!
//! The assembler picks problems (by count or from explicit id lists),
//! shuffles their options, numbers them across the whole test, and emits the
//! document source together with the solution key fragment and the names of
//! every form field on the page.

use std::collections::BTreeSet;

use anyhow::Context;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::codec::TextFieldId;
use crate::error::ExamError;
use crate::model::{Problem, ProblemBank, SelectedProblem, SolutionEntry, SolutionKey, TestInstance};
use crate::shuffle::{sample_indices, shuffle_options};
use crate::traits::Composer;

/// Which problems go into each test, one entry per problem file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Draw this many distinct problems from each file.
    ByCount(Vec<usize>),
    /// Use exactly these problem ids from each file, in order.
    Explicit(Vec<Vec<String>>),
}

/// A problem id as written on the command line: `"q1"` or `7`.
#[derive(Deserialize)]
#[serde(untagged)]
enum IdToken {
    Text(String),
    Number(u64),
}

impl From<IdToken> for String {
    fn from(token: IdToken) -> Self {
        match token {
            IdToken::Text(s) => s,
            IdToken::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSelection {
    ByCount(Vec<usize>),
    Explicit(Vec<Vec<IdToken>>),
}

impl Selection {
    /// Parse `[3, 2, 1]` (counts) or `[["a"], ["b", 4], []]` (explicit ids).
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let raw: RawSelection = serde_json::from_str(s).with_context(|| {
            format!("invalid problem selection `{s}`: expected a list of counts or a list of id lists")
        })?;
        Ok(match raw {
            RawSelection::ByCount(counts) => Selection::ByCount(counts),
            RawSelection::Explicit(lists) => Selection::Explicit(
                lists
                    .into_iter()
                    .map(|l| l.into_iter().map(String::from).collect())
                    .collect(),
            ),
        })
    }

    /// Number of per-file entries.
    pub fn arity(&self) -> usize {
        match self {
            Selection::ByCount(counts) => counts.len(),
            Selection::Explicit(lists) => lists.len(),
        }
    }
}

/// One candidate test produced by the assembler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub instance: TestInstance,
    pub key: SolutionKey,
    /// Every form field on the document: answer checkboxes, then text fields.
    pub fields: Vec<String>,
    /// Document source text.
    pub source: String,
}

/// Builds test drafts from a problem bank.
///
/// Owns the batch's randomness source; seeding it reproduces a whole batch.
pub struct Assembler<'a, R> {
    bank: &'a ProblemBank,
    composer: &'a dyn Composer,
    rng: R,
}

impl<'a, R: Rng> Assembler<'a, R> {
    pub fn new(bank: &'a ProblemBank, composer: &'a dyn Composer, rng: R) -> Self {
        Self {
            bank,
            composer,
            rng,
        }
    }

    /// Assemble a test for either kind of selection.
    pub fn assemble(&mut self, test_id: u32, selection: &Selection) -> Result<Draft, ExamError> {
        match selection {
            Selection::ByCount(counts) => self.by_count(test_id, counts),
            Selection::Explicit(lists) => self.by_list(test_id, lists),
        }
    }

    /// Draw `counts[i]` distinct problems from file `i + 1`.
    pub fn by_count(&mut self, test_id: u32, counts: &[usize]) -> Result<Draft, ExamError> {
        self.check_arity(counts.len())?;
        for (i, (&requested, file)) in counts.iter().zip(self.bank.files()).enumerate() {
            if requested > file.len() {
                return Err(ExamError::InsufficientProblems {
                    file_index: i + 1,
                    requested,
                    available: file.len(),
                });
            }
        }

        let bank = self.bank;
        let mut picks: Vec<(usize, &Problem)> = Vec::new();
        for (i, (&requested, file)) in counts.iter().zip(bank.files()).enumerate() {
            for idx in sample_indices(&mut self.rng, file.len(), requested) {
                picks.push((i + 1, &file.problems()[idx]));
            }
        }
        Ok(self.build(test_id, &picks))
    }

    /// Use exactly the listed problems of each file, in the given order.
    pub fn by_list(&mut self, test_id: u32, lists: &[Vec<String>]) -> Result<Draft, ExamError> {
        self.check_arity(lists.len())?;

        let bank = self.bank;
        let mut picks: Vec<(usize, &Problem)> = Vec::new();
        for (i, (ids, file)) in lists.iter().zip(bank.files()).enumerate() {
            for id in ids {
                let problem = file.get(id).ok_or_else(|| ExamError::UnknownProblemId {
                    file_index: i + 1,
                    id: id.clone(),
                })?;
                picks.push((i + 1, problem));
            }
        }
        Ok(self.build(test_id, &picks))
    }

    /// Keep the problems of `previous` and draw fresh option orders.
    pub fn reshuffle(&mut self, previous: &Draft) -> Result<Draft, ExamError> {
        let lists = previous.instance.problem_ids_per_file(self.bank.len());
        self.by_list(previous.instance.test_id, &lists)
    }

    fn check_arity(&self, actual: usize) -> Result<(), ExamError> {
        if actual != self.bank.len() {
            return Err(ExamError::ArityMismatch {
                expected: self.bank.len(),
                actual,
            });
        }
        Ok(())
    }

    fn build(&mut self, test_id: u32, picks: &[(usize, &Problem)]) -> Draft {
        let mut problems = Vec::with_capacity(picks.len());
        let mut key = SolutionKey::new();
        let mut fields = Vec::new();

        for (sequence, &(file_index, problem)) in (1u32..).zip(picks) {
            let option_order = shuffle_options(&mut self.rng, problem);
            let correct: BTreeSet<u32> = (1u32..)
                .zip(&option_order)
                .filter(|(_, k)| problem.option(k).is_some_and(|o| o.correct))
                .map(|(pos, _)| pos)
                .collect();

            let selected = SelectedProblem {
                sequence,
                file_index,
                problem_id: problem.id.clone(),
                option_order,
            };
            fields.extend(selected.field_names(test_id));
            key.insert(
                sequence,
                SolutionEntry {
                    file_index,
                    problem_id: problem.id.clone(),
                    points: problem.points,
                    correct,
                },
            );
            problems.push(selected);
        }

        fields.extend(
            (0..self.composer.text_field_count())
                .map(|index| TextFieldId { test_id, index }.to_string()),
        );

        let instance = TestInstance { test_id, problems };
        let source = self.composer.compose(self.bank, &instance);
        tracing::debug!(test_id, problems = instance.problems.len(), "assembled draft");

        Draft {
            instance,
            key,
            fields,
            source,
        }
    }
}
