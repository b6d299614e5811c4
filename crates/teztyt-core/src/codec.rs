//! Field identifier codec.
//!
//! Every rendered checkbox is named `test:sequence:file:problem_id:position`.
//! Text fields on the same form are named `t<test>:<index>`. Problem ids may
//! never contain [`SEPARATOR`]; the bank loader rejects them, which is what
//! makes [`decode`] an exact inverse of [`encode`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExamError;

/// Separator between identifier components.
pub const SEPARATOR: char = ':';

/// Prefix that marks a text field name.
pub const TEXT_FIELD_PREFIX: char = 't';

/// Decoded name of one rendered answer checkbox.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldId {
    pub test_id: u32,
    pub sequence: u32,
    pub file_index: u32,
    pub problem_id: String,
    pub position: u32,
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}",
            self.test_id, self.sequence, self.file_index, self.problem_id, self.position
        )
    }
}

impl FromStr for FieldId {
    type Err = ExamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

/// Encode the name of one answer checkbox.
pub fn encode(
    test_id: u32,
    sequence: u32,
    file_index: u32,
    problem_id: &str,
    position: u32,
) -> String {
    debug_assert!(!problem_id.contains(SEPARATOR));
    format!("{test_id}{SEPARATOR}{sequence}{SEPARATOR}{file_index}{SEPARATOR}{problem_id}{SEPARATOR}{position}")
}

/// Decode an answer checkbox name produced by [`encode`].
pub fn decode(s: &str) -> Result<FieldId, ExamError> {
    let malformed = || ExamError::MalformedIdentifier(s.to_string());

    let parts: Vec<&str> = s.split(SEPARATOR).collect();
    let [test, sequence, file, problem_id, position] = parts.as_slice() else {
        return Err(malformed());
    };
    if problem_id.is_empty() {
        return Err(malformed());
    }

    Ok(FieldId {
        test_id: parse_component(test).ok_or_else(malformed)?,
        sequence: parse_component(sequence).ok_or_else(malformed)?,
        file_index: parse_component(file).ok_or_else(malformed)?,
        problem_id: (*problem_id).to_string(),
        position: parse_component(position).ok_or_else(malformed)?,
    })
}

/// Parse a strictly positive decimal component.
fn parse_component(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<u32>().ok().filter(|&n| n >= 1)
}

/// Name of a free-text form field (student name, group, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextFieldId {
    pub test_id: u32,
    /// 0-based index into the configured form fields.
    pub index: usize,
}

impl fmt::Display for TextFieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TEXT_FIELD_PREFIX}{}{SEPARATOR}{}", self.test_id, self.index)
    }
}

impl FromStr for TextFieldId {
    type Err = ExamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ExamError::MalformedIdentifier(s.to_string());
        let rest = s.strip_prefix(TEXT_FIELD_PREFIX).ok_or_else(malformed)?;
        let (test, index) = rest.split_once(SEPARATOR).ok_or_else(malformed)?;
        let test_id = parse_component(test).ok_or_else(malformed)?;
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let index = index.parse::<usize>().map_err(|_| malformed())?;
        Ok(TextFieldId { test_id, index })
    }
}

/// A classified form field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldName {
    Choice(FieldId),
    Text(TextFieldId),
}

impl FieldName {
    /// Classify and decode a raw field name.
    pub fn parse(s: &str) -> Result<Self, ExamError> {
        if s.starts_with(TEXT_FIELD_PREFIX) {
            s.parse().map(FieldName::Text)
        } else {
            decode(s).map(FieldName::Choice)
        }
    }

    pub fn test_id(&self) -> u32 {
        match self {
            FieldName::Choice(id) => id.test_id,
            FieldName::Text(id) => id.test_id,
        }
    }
}
