//! Shared fixtures for unit tests.

use crate::bank::{parse_problem_file_str, BankFormat, CorrectnessRule};
use crate::model::{ProblemBank, TestInstance};
use crate::traits::Composer;

const FILE_ONE: &str = r#"{
    "a1": {"P": 1, "Q": "A1", "A": {"ok": "yes", "x1": "no", "x2": "no"}},
    "a2": {"P": 2, "Q": "A2", "A": {"ok1": "yes", "ok2": "yes", "x": "no"}},
    "a3": {"P": 3, "Q": "A3", "A": {"x1": "no", "ok": "yes"}}
}"#;

const FILE_TWO: &str = r#"{
    "b1": {"P": 4, "Q": "B1", "A": {"ok": "yes", "x1": "no", "x2": "no", "x3": "no"}},
    "b2": {"P": 5, "Q": "B2", "A": {"x": "no", "ok": "yes"}}
}"#;

/// Two files: `a1..a3` and `b1..b2`; keys starting with `ok` are correct.
pub(crate) fn sample_bank() -> ProblemBank {
    let rule = CorrectnessRule::new("ok").unwrap();
    ProblemBank::new(vec![
        parse_problem_file_str(FILE_ONE, "one.json", BankFormat::Json, &rule).unwrap(),
        parse_problem_file_str(FILE_TWO, "two.json", BankFormat::Json, &rule).unwrap(),
    ])
}

/// Composer that lists field names, one per line.
pub(crate) struct PlainComposer;

impl Composer for PlainComposer {
    fn compose(&self, _bank: &ProblemBank, instance: &TestInstance) -> String {
        let mut out = format!("test {}\n", instance.test_id);
        for p in &instance.problems {
            for name in p.field_names(instance.test_id) {
                out.push_str(&name);
                out.push('\n');
            }
        }
        out
    }

    fn text_field_count(&self) -> usize {
        1
    }
}
