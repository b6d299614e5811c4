//! JSON field dump extractor.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use teztyt_core::traits::{FieldExtractor, FieldStore, FieldValue};

use crate::sidecar::SIDECAR_SUFFIX;

/// Value PDF checkboxes carry when checked.
pub const CHECKED: &str = "/Yes";
/// Value PDF checkboxes carry when cleared.
pub const UNCHECKED: &str = "/Off";

/// Reads `{ "<field name>": <value>, ... }` documents.
///
/// The object may also be wrapped as `{ "fields": { ... } }`. A value can be
/// given directly or as a field dictionary `{ "/V": <value> }`; a dictionary
/// without `/V` counts as an absent value.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFieldExtractor;

impl JsonFieldExtractor {
    /// Parse a field dump from a string.
    pub fn parse_str(&self, content: &str) -> Result<FieldStore> {
        let root: Value = serde_json::from_str(content).context("invalid JSON field dump")?;
        let object = match root {
            Value::Object(mut map) => match map.remove("fields") {
                Some(Value::Object(inner)) => inner,
                Some(other) => {
                    map.insert("fields".into(), other);
                    map
                }
                None => map,
            },
            _ => anyhow::bail!("field dump must be a JSON object"),
        };

        Ok(object
            .into_iter()
            .map(|(name, value)| (name, field_value(value)))
            .collect())
    }
}

fn field_value(value: Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Absent,
        Value::Bool(true) => FieldValue::Checked,
        Value::Bool(false) => FieldValue::Unchecked,
        Value::String(s) if s == CHECKED => FieldValue::Checked,
        Value::String(s) if s == UNCHECKED => FieldValue::Unchecked,
        Value::String(s) => FieldValue::Text(s),
        Value::Number(n) => FieldValue::Text(n.to_string()),
        Value::Object(mut dict) => dict
            .remove("/V")
            .map(field_value)
            .unwrap_or(FieldValue::Absent),
        Value::Array(_) => FieldValue::Absent,
    }
}

impl FieldExtractor for JsonFieldExtractor {
    fn accepts(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        name.to_ascii_lowercase().ends_with(".json") && !name.ends_with(SIDECAR_SUFFIX)
    }

    fn extract(&self, path: &Path) -> Result<FieldStore> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let fields = self
            .parse_str(&content)
            .with_context(|| format!("failed to extract fields from {}", path.display()))?;
        tracing::debug!(path = %path.display(), fields = fields.len(), "extracted fields");
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_mapping() {
        let store = JsonFieldExtractor
            .parse_str(
                r#"{
                    "1:1:1:a:1": "/Yes",
                    "1:1:1:a:2": "/Off",
                    "1:1:1:a:3": null,
                    "1:2:1:b:1": {"/V": "/Yes"},
                    "1:2:1:b:2": {"/FT": "/Btn"},
                    "1:2:1:b:3": true,
                    "t1:0": "Ada Lovelace",
                    "t1:1": 42
                }"#,
            )
            .unwrap();
        assert_eq!(store["1:1:1:a:1"], FieldValue::Checked);
        assert_eq!(store["1:1:1:a:2"], FieldValue::Unchecked);
        assert_eq!(store["1:1:1:a:3"], FieldValue::Absent);
        assert_eq!(store["1:2:1:b:1"], FieldValue::Checked);
        assert_eq!(store["1:2:1:b:2"], FieldValue::Absent);
        assert_eq!(store["1:2:1:b:3"], FieldValue::Checked);
        assert_eq!(store["t1:0"], FieldValue::Text("Ada Lovelace".into()));
        assert_eq!(store["t1:1"], FieldValue::Text("42".into()));
    }

    #[test]
    fn fields_wrapper() {
        let store = JsonFieldExtractor
            .parse_str(r#"{"fields": {"2:1:1:a:1": "/Yes"}}"#)
            .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store["2:1:1:a:1"], FieldValue::Checked);
    }

    #[test]
    fn rejects_non_objects() {
        assert!(JsonFieldExtractor.parse_str("[1, 2]").is_err());
        assert!(JsonFieldExtractor.parse_str("not json").is_err());
    }

    #[test]
    fn accepts_dumps_but_not_sidecars() {
        let x = JsonFieldExtractor;
        assert!(x.accepts(Path::new("scans/test1.json")));
        assert!(x.accepts(Path::new("scans/TEST1.JSON")));
        assert!(!x.accepts(Path::new("out/test1.form.json")));
        assert!(!x.accepts(Path::new("out/test1.pdf")));
    }

    #[test]
    fn extract_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{").unwrap();
        let err = JsonFieldExtractor.extract(&path).unwrap_err();
        assert!(format!("{err:#}").contains("broken.json"));
    }
}
