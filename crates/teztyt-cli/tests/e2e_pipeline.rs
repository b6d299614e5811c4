//! End-to-end pipeline tests using the scripted renderer.
//!
//! These tests drive the library the way `gen`, `merge` and `eval` do
//! (assemble, fit, persist, merge, fill in, score) without pdflatex.

use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{Map, Value};

use teztyt_core::assembler::Selection;
use teztyt_core::bank::{parse_problem_file_str, BankFormat, CorrectnessRule};
use teztyt_core::codec;
use teztyt_core::config::ExamConfig;
use teztyt_core::engine::{BatchGenerator, BatchOutcome, GenerationConfig, NoopReporter};
use teztyt_core::evaluate::{collect_documents, evaluate_batch};
use teztyt_core::merge::{merge_forms, FormDocument};
use teztyt_core::model::{ProblemBank, RetryStrategy, SolutionKey};
use teztyt_core::scoring::ScoringPolicy;
use teztyt_core::solution;
use teztyt_forms::{collect_form_documents, write_sidecar, JsonFieldExtractor};
use teztyt_latex::mock::ScriptedRenderer;
use teztyt_latex::LatexComposer;

const ALGEBRA: &str = r#"{
    "a1": {"P": 1, "Q": "$1 + 1$?", "A": {"ok": "2", "x1": "3", "x2": "4"}},
    "a2": {"P": 2, "Q": "Roots of $x^2 = 4$?", "A": {"ok1": "2", "ok2": "-2", "x": "4"}},
    "a3": {"P": 1, "Q": "$2 \\cdot 3$?", "A": {"x": "5", "ok": "6"}}
}"#;

const CALCULUS: &str = r#"
[b1]
P = 3
Q = "Derivative of $x^2$?"
[b1.A]
ok = "$2x$"
x1 = "$x$"
x2 = "$x^2$"

[b2]
P = 1
Q = "Integral of $0$?"
[b2.A]
ok = "a constant"
x = "$x$"
"#;

fn bank() -> ProblemBank {
    let rule = CorrectnessRule::new("ok").unwrap();
    ProblemBank::new(vec![
        parse_problem_file_str(ALGEBRA, "algebra.json", BankFormat::Json, &rule).unwrap(),
        parse_problem_file_str(CALCULUS, "calculus.toml", BankFormat::Toml, &rule).unwrap(),
    ])
}

fn composer() -> LatexComposer {
    let config = ExamConfig::default();
    LatexComposer::new(config.latex, config.form_fields)
}

async fn generate(
    bank: &ProblemBank,
    renderer: &ScriptedRenderer,
    number: u32,
    seed: u64,
    retry_strategy: RetryStrategy,
) -> BatchOutcome {
    let composer = composer();
    let config = GenerationConfig {
        number,
        max_pages: 2,
        max_attempts: 3,
        retry_strategy,
        out_file_prefix: "test".into(),
    };
    BatchGenerator::new(bank, &composer, renderer, config)
        .run(
            &Selection::ByCount(vec![2, 1]),
            StdRng::seed_from_u64(seed),
            &NoopReporter,
        )
        .await
}

/// A field dump of `form`, answered correctly or left blank.
fn filled_dump(form: &FormDocument, key: &SolutionKey, answer: bool) -> Value {
    let mut fields = Map::new();
    for entry in &form.registry.as_ref().unwrap().fields {
        let value = match codec::decode(&entry.name) {
            Ok(id) => {
                let correct = key[&id.sequence].correct.contains(&id.position);
                Value::from(if answer && correct { "/Yes" } else { "/Off" })
            }
            Err(_) => Value::from(format!("Student of {}", form.name)),
        };
        fields.insert(entry.name.clone(), value);
    }
    Value::Object(fields)
}

fn write_json(path: &Path, value: &Value) {
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

#[tokio::test]
async fn e2e_generate_merge_and_grade() {
    let bank = bank();
    // Test 1 is rejected once at 3 pages, everything after fits in 2.
    let renderer = ScriptedRenderer::new(vec![3, 2]);
    let outcome = generate(&bank, &renderer, 3, 42, RetryStrategy::Resample).await;

    assert!(outcome.is_complete());
    assert_eq!(outcome.accepted.len(), 3);
    assert_eq!(outcome.accepted[0].attempts, 2);
    assert_eq!(outcome.accepted[1].attempts, 1);
    assert_eq!(renderer.call_count(), 4);
    assert_eq!(outcome.solutions.len(), 3);
    for key in outcome.solutions.values() {
        let sequences: Vec<u32> = key.keys().copied().collect();
        assert_eq!(sequences, vec![1, 2, 3]);
        let files: Vec<usize> = key.values().map(|e| e.file_index).collect();
        assert_eq!(files, vec![1, 1, 2]);
    }

    // Persist the way `gen` does and read everything back.
    let out = tempfile::tempdir().unwrap();
    let solutions_path = out.path().join("solutions.txt");
    solution::save(&solutions_path, &outcome.solutions).unwrap();
    for test in &outcome.accepted {
        write_sidecar(out.path(), &test.form).unwrap();
    }
    let book = solution::load(&solutions_path).unwrap();
    assert_eq!(book, outcome.solutions);

    // Merge: field names never collide across tests.
    let forms = collect_form_documents(out.path(), "test").unwrap();
    assert_eq!(forms.len(), 3);
    let merged = merge_forms(&forms, Some(2)).unwrap();
    let expected_fields: usize = forms.iter().map(|f| f.registry.as_ref().unwrap().len()).sum();
    assert_eq!(merged.registry.len(), expected_fields);
    assert_eq!(merged.page_count, 6);

    // Test 1 and 3 answered correctly, test 2 left blank, plus one stray form.
    let scans = tempfile::tempdir().unwrap();
    for (form, answer) in forms.iter().zip([true, false, true]) {
        let test_id: u32 = form.name.trim_start_matches("test").parse().unwrap();
        write_json(
            &scans.path().join(format!("{}.json", form.name)),
            &filled_dump(form, &book[&test_id], answer),
        );
    }
    write_json(
        &scans.path().join("stray.json"),
        &serde_json::json!({"7:1:1:a1:1": "/Yes"}),
    );

    let extractor = JsonFieldExtractor;
    let documents = collect_documents(scans.path(), &extractor).unwrap();
    assert_eq!(documents.len(), 4);
    let report = evaluate_batch(
        &extractor,
        &documents,
        &book,
        &ScoringPolicy::Regular,
        vec!["Name".into(), "ID".into()],
        &NoopReporter,
    )
    .unwrap();

    assert_eq!(report.submissions.len(), 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].document, "stray.json");
    assert!(report.failures[0].reason.contains("no solution key for test 7"));

    let first = report.submission("test1.json").unwrap();
    assert_eq!(first.score.total, first.score.max_total);
    assert!(first.score.problems.iter().all(|p| p.fully_correct()));
    assert_eq!(
        first.labelled_text(&report.field_labels)[0],
        ("Name".to_string(), "Student of test1".to_string())
    );
    assert_eq!(report.submission("test2.json").unwrap().score.total, 0.0);
    let third = report.submission("test3.json").unwrap();
    assert_eq!(third.score.total, third.score.max_total);

    assert_eq!(report.statistics.scores.count, 3);
    assert_eq!(report.statistics.scores.min, 0.0);
}

#[tokio::test]
async fn e2e_same_seed_same_batch() {
    let bank = bank();
    let first = generate(&bank, &ScriptedRenderer::fitting(), 5, 7, RetryStrategy::Resample).await;
    let second = generate(&bank, &ScriptedRenderer::fitting(), 5, 7, RetryStrategy::Resample).await;

    assert_eq!(first.solutions, second.solutions);
    let names = |o: &BatchOutcome| -> Vec<Vec<String>> {
        o.accepted
            .iter()
            .map(|t| t.form.registry.as_ref().unwrap().fields.iter().map(|f| f.name.clone()).collect())
            .collect()
    };
    assert_eq!(names(&first), names(&second));
}

#[tokio::test]
async fn e2e_reshuffle_keeps_problems() {
    let bank = bank();
    // The first draft never fits; the retry must keep its problems.
    let renderer = ScriptedRenderer::new(vec![4, 1]);
    let outcome = generate(&bank, &renderer, 1, 3, RetryStrategy::Reshuffle).await;

    assert!(outcome.is_complete());
    assert_eq!(outcome.accepted[0].attempts, 2);
    let requests = renderer.requests();
    assert_eq!(requests.len(), 2);
    let key = &outcome.solutions[&1];
    for entry in key.values() {
        let marker = format!("{}:{}:", entry.file_index, entry.problem_id);
        assert!(requests[0].source.contains(&marker));
        assert!(requests[1].source.contains(&marker));
    }
}

#[tokio::test]
async fn e2e_page_budget_failure_keeps_earlier_tests() {
    let bank = bank();
    // Test 1 fits on its first attempt, test 2 never does.
    let renderer = ScriptedRenderer::new(vec![1, 5]);
    let outcome = generate(&bank, &renderer, 3, 11, RetryStrategy::Resample).await;

    assert!(!outcome.is_complete());
    assert_eq!(outcome.accepted.len(), 1);
    assert_eq!(outcome.solutions.keys().copied().collect::<Vec<_>>(), vec![1]);
    let failure = outcome.failure.unwrap();
    assert_eq!(failure.test_id, 2);
    assert!(failure.error.to_string().contains("could not fit into 2 page(s) after 3 attempt(s)"));
}
