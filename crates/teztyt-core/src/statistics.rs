//! Aggregate statistics over scored submissions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::scoring::SubmissionScore;

/// Distribution of submission totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

/// How one bank problem fared across all submissions it appeared in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStats {
    pub file_index: usize,
    pub problem_id: String,
    /// Number of scored submissions containing the problem.
    pub seen: usize,
    /// How many of those checked exactly the correct positions.
    pub fully_correct: usize,
    /// Mean of awarded / max points; problems worth nothing are skipped.
    pub mean_fraction: f64,
}

/// Statistics section of an evaluation report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchStatistics {
    pub scores: ScoreStats,
    /// Sorted by file index, then problem id.
    pub items: Vec<ItemStats>,
}

/// Summarize a set of totals.
pub fn score_stats(values: &[f64]) -> ScoreStats {
    if values.is_empty() {
        return ScoreStats::default();
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    ScoreStats {
        count: values.len(),
        mean,
        median,
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        std_dev: variance.sqrt(),
    }
}

/// Compute report statistics from scored submissions.
pub fn compute_statistics(submissions: &[SubmissionScore]) -> BatchStatistics {
    let totals: Vec<f64> = submissions.iter().map(|s| s.total).collect();

    #[derive(Default)]
    struct Acc {
        seen: usize,
        fully_correct: usize,
        fraction_sum: f64,
        fraction_count: usize,
    }

    let mut per_item: BTreeMap<(usize, &str), Acc> = BTreeMap::new();
    for problem in submissions.iter().flat_map(|s| &s.problems) {
        let acc = per_item
            .entry((problem.file_index, problem.problem_id.as_str()))
            .or_default();
        acc.seen += 1;
        if problem.fully_correct() {
            acc.fully_correct += 1;
        }
        if problem.max_points > 0.0 {
            acc.fraction_sum += problem.awarded / problem.max_points;
            acc.fraction_count += 1;
        }
    }

    let items = per_item
        .into_iter()
        .map(|((file_index, problem_id), acc)| ItemStats {
            file_index,
            problem_id: problem_id.to_string(),
            seen: acc.seen,
            fully_correct: acc.fully_correct,
            mean_fraction: if acc.fraction_count == 0 {
                0.0
            } else {
                acc.fraction_sum / acc.fraction_count as f64
            },
        })
        .collect();

    BatchStatistics {
        scores: score_stats(&totals),
        items,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::scoring::ProblemScore;

    fn problem(file_index: usize, id: &str, awarded: f64, max: f64, exact: bool) -> ProblemScore {
        ProblemScore {
            sequence: 1,
            file_index,
            problem_id: id.into(),
            correct: BTreeSet::from([1]),
            checked: if exact {
                BTreeSet::from([1])
            } else {
                BTreeSet::new()
            },
            awarded,
            max_points: max,
        }
    }

    fn submission(test_id: u32, problems: Vec<ProblemScore>) -> SubmissionScore {
        SubmissionScore {
            test_id,
            text_fields: Default::default(),
            total: problems.iter().map(|p| p.awarded).sum(),
            max_total: problems.iter().map(|p| p.max_points).sum(),
            problems,
        }
    }

    #[test]
    fn score_stats_odd_and_even() {
        let odd = score_stats(&[3.0, 1.0, 2.0]);
        assert_eq!(odd.count, 3);
        assert_eq!(odd.median, 2.0);
        assert_eq!(odd.mean, 2.0);
        assert_eq!(odd.min, 1.0);
        assert_eq!(odd.max, 3.0);

        let even = score_stats(&[4.0, 1.0, 2.0, 3.0]);
        assert_eq!(even.median, 2.5);
        assert!((even.std_dev - 1.118_033_988).abs() < 1e-6);
    }

    #[test]
    fn empty_input() {
        let stats = compute_statistics(&[]);
        assert_eq!(stats.scores.count, 0);
        assert!(stats.items.is_empty());
    }

    #[test]
    fn per_item_aggregation() {
        let subs = vec![
            submission(1, vec![problem(1, "a", 2.0, 2.0, true), problem(2, "b", 0.0, 4.0, false)]),
            submission(2, vec![problem(1, "a", 1.0, 2.0, false)]),
        ];
        let stats = compute_statistics(&subs);
        assert_eq!(stats.scores.count, 2);
        assert_eq!(stats.items.len(), 2);

        let a = &stats.items[0];
        assert_eq!((a.file_index, a.problem_id.as_str()), (1, "a"));
        assert_eq!(a.seen, 2);
        assert_eq!(a.fully_correct, 1);
        assert!((a.mean_fraction - 0.75).abs() < 1e-9);

        let b = &stats.items[1];
        assert_eq!(b.fully_correct, 0);
        assert_eq!(b.mean_fraction, 0.0);
    }
}
