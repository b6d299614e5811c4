//! Solution key store.
//!
//! The solution file is plain text. Records are separated by `===` lines,
//! with one separator before the first record and one after every record:
//!
//! ```text
//! ===
//! 1:
//! 1	1	1	q7	2	1,3
//! 1	2	2	q2	1.5	2
//! ===
//! ```
//!
//! Problem lines are tab separated: test id, sequence, file index, problem
//! id, points, and the comma separated correct positions (possibly empty).

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;
use regex::Regex;

use crate::error::ExamError;
use crate::model::{SolutionBook, SolutionEntry, SolutionKey};

/// Record separator line.
pub const RECORD_SEPARATOR: &str = "===";

const LINE_PATTERN: &str = r"^(\d+)\t(\d+)\t(\d+)\t([^\t]+)\t([^\t]+)\t((?:\d+(?:,\d+)*)?)$";
const HEADER_PATTERN: &str = r"^(\d+):$";

/// Render a whole solution book.
pub fn serialize(book: &SolutionBook) -> String {
    let mut out = String::new();
    out.push_str(RECORD_SEPARATOR);
    out.push('\n');
    for (test_id, key) in book {
        let _ = writeln!(out, "{test_id}:");
        for (sequence, entry) in key {
            let positions: Vec<String> = entry.correct.iter().map(u32::to_string).collect();
            let _ = writeln!(
                out,
                "{test_id}\t{sequence}\t{}\t{}\t{}\t{}",
                entry.file_index,
                entry.problem_id,
                entry.points,
                positions.join(",")
            );
        }
        out.push_str(RECORD_SEPARATOR);
        out.push('\n');
    }
    out
}

/// Parse a solution book.
pub fn deserialize(content: &str) -> Result<SolutionBook, ExamError> {
    // Both patterns are constants.
    let line_re = Regex::new(LINE_PATTERN).map_err(|e| malformed(0, e.to_string()))?;
    let header_re = Regex::new(HEADER_PATTERN).map_err(|e| malformed(0, e.to_string()))?;

    let mut book = SolutionBook::new();
    let mut current: Option<(u32, SolutionKey)> = None;
    let mut seen_separator = false;
    let mut expect_header = false;

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim_end_matches('\r');

        if line == RECORD_SEPARATOR {
            if let Some((test_id, key)) = current.take() {
                if book.insert(test_id, key).is_some() {
                    return Err(ExamError::DuplicateTestId(test_id));
                }
            }
            seen_separator = true;
            expect_header = true;
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        if !seen_separator {
            return Err(malformed(line_no, "expected `===` before the first record"));
        }

        if expect_header {
            let caps = header_re
                .captures(line)
                .ok_or_else(|| malformed(line_no, format!("expected `<test id>:`, found `{line}`")))?;
            let test_id = parse_num(&caps[1], line_no)?;
            current = Some((test_id, SolutionKey::new()));
            expect_header = false;
            continue;
        }

        let Some((test_id, key)) = current.as_mut() else {
            return Err(malformed(line_no, "problem line outside a record"));
        };
        let caps = line_re
            .captures(line)
            .ok_or_else(|| malformed(line_no, format!("unrecognized line `{line}`")))?;

        let line_test: u32 = parse_num(&caps[1], line_no)?;
        if line_test != *test_id {
            return Err(malformed(
                line_no,
                format!("line belongs to test {line_test} inside record {test_id}"),
            ));
        }
        let sequence: u32 = parse_num(&caps[2], line_no)?;
        let file_index: usize = parse_num(&caps[3], line_no)?;
        let points: f64 = caps[5]
            .parse()
            .ok()
            .filter(|p: &f64| p.is_finite())
            .ok_or_else(|| malformed(line_no, format!("invalid points `{}`", &caps[5])))?;
        let correct = caps[6]
            .split(',')
            .filter(|s| !s.is_empty())
            .map(|s| parse_num(s, line_no))
            .collect::<Result<BTreeSet<u32>, _>>()?;

        let entry = SolutionEntry {
            file_index,
            problem_id: caps[4].to_string(),
            points,
            correct,
        };
        if key.insert(sequence, entry).is_some() {
            return Err(malformed(
                line_no,
                format!("duplicate problem {sequence} in test {test_id}"),
            ));
        }
    }

    if let Some((test_id, _)) = current {
        return Err(malformed(
            content.lines().count(),
            format!("record for test {test_id} is not closed by `===`"),
        ));
    }
    Ok(book)
}

/// Write the whole book to `path`, replacing any previous file.
pub fn save(path: &Path, book: &SolutionBook) -> anyhow::Result<()> {
    std::fs::write(path, serialize(book))
        .with_context(|| format!("failed to write solutions to {}", path.display()))
}

/// Read a whole solution file.
pub fn load(path: &Path) -> anyhow::Result<SolutionBook> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    deserialize(&content).map_err(anyhow::Error::new)
}

fn parse_num<T: std::str::FromStr>(s: &str, line: usize) -> Result<T, ExamError> {
    s.parse()
        .map_err(|_| malformed(line, format!("number out of range `{s}`")))
}

fn malformed(line: usize, reason: impl Into<String>) -> ExamError {
    ExamError::MalformedSolutionFile {
        line,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(file_index: usize, id: &str, points: f64, correct: &[u32]) -> SolutionEntry {
        SolutionEntry {
            file_index,
            problem_id: id.into(),
            points,
            correct: correct.iter().copied().collect(),
        }
    }

    fn sample_book() -> SolutionBook {
        let mut book = SolutionBook::new();
        book.insert(
            1,
            SolutionKey::from([
                (1, entry(1, "q7", 2.0, &[1, 3])),
                (2, entry(2, "q2", 1.5, &[2])),
                (3, entry(2, "open", 0.1, &[])),
            ]),
        );
        book.insert(2, SolutionKey::from([(1, entry(1, "q1", 10.0, &[4]))]));
        book
    }

    #[test]
    fn round_trip() {
        let book = sample_book();
        let text = serialize(&book);
        assert_eq!(deserialize(&text).unwrap(), book);
    }

    #[test]
    fn layout() {
        let text = serialize(&sample_book());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "===");
        assert_eq!(lines[1], "1:");
        assert_eq!(lines[2], "1\t1\t1\tq7\t2\t1,3");
        assert_eq!(lines[3], "1\t2\t2\tq2\t1.5\t2");
        assert_eq!(lines[4], "1\t3\t2\topen\t0.1\t");
        assert_eq!(lines[5], "===");
        assert_eq!(*lines.last().unwrap(), "===");
    }

    #[test]
    fn empty_book() {
        assert_eq!(serialize(&SolutionBook::new()), "===\n");
        assert!(deserialize("===\n").unwrap().is_empty());
        assert!(deserialize("").unwrap().is_empty());
    }

    #[test]
    fn crlf_is_accepted() {
        let text = serialize(&sample_book()).replace('\n', "\r\n");
        assert_eq!(deserialize(&text).unwrap(), sample_book());
    }

    #[test]
    fn duplicate_test_id() {
        let text = "===\n3:\n3\t1\t1\ta\t1\t1\n===\n3:\n3\t1\t1\tb\t1\t2\n===\n";
        assert!(matches!(
            deserialize(text).unwrap_err(),
            ExamError::DuplicateTestId(3)
        ));
    }

    #[test]
    fn mismatched_test_id() {
        let text = "===\n3:\n4\t1\t1\ta\t1\t1\n===\n";
        assert!(matches!(
            deserialize(text).unwrap_err(),
            ExamError::MalformedSolutionFile { line: 3, .. }
        ));
    }

    #[test]
    fn duplicate_sequence() {
        let text = "===\n3:\n3\t1\t1\ta\t1\t1\n3\t1\t1\tb\t1\t1\n===\n";
        assert!(matches!(
            deserialize(text).unwrap_err(),
            ExamError::MalformedSolutionFile { line: 4, .. }
        ));
    }

    #[test]
    fn malformed_lines() {
        for text in [
            "1:\n1\t1\t1\ta\t1\t1\n===\n",
            "===\n1\n",
            "===\n1:\n1\t1\t1\ta\t1\n===\n",
            "===\n1:\n1\t1\t1\ta\tlots\t1\n===\n",
            "===\n1:\n1\t1\t1\ta\t1\t1,,2\n===\n",
            "===\n1:\n1\t1\t1\ta\t1\t1\n",
        ] {
            assert!(
                matches!(
                    deserialize(text).unwrap_err(),
                    ExamError::MalformedSolutionFile { .. }
                ),
                "accepted {text:?}"
            );
        }
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solutions.txt");
        save(&path, &sample_book()).unwrap();
        assert_eq!(load(&path).unwrap(), sample_book());
        assert!(load(&dir.path().join("missing.txt")).is_err());
    }
}
