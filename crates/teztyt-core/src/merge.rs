//! Merging the form field registries of several documents.
//!
//! The first document seeds the merged registry; fields of later documents
//! are appended. A name that is already registered is never overwritten, the
//! merge fails instead, so every field name stays unique across the merged
//! batch.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::assembler::Draft;
use crate::codec::TEXT_FIELD_PREFIX;
use crate::error::ExamError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Checkbox,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldEntry {
    /// Classify a field produced by the assembler by its name.
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = if name.starts_with(TEXT_FIELD_PREFIX) {
            FieldKind::Text
        } else {
            FieldKind::Checkbox
        };
        Self { name, kind }
    }
}

/// Interactive form fields of one document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldRegistry {
    pub fields: Vec<FieldEntry>,
    /// Viewers must regenerate field appearances.
    #[serde(default)]
    pub need_appearances: bool,
}

impl FieldRegistry {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }
}

/// A rendered test document as seen by the merge step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormDocument {
    pub name: String,
    pub page_count: u32,
    #[serde(default)]
    pub registry: Option<FieldRegistry>,
}

impl FormDocument {
    /// Describe an accepted draft's document.
    pub fn from_draft(name: impl Into<String>, draft: &Draft, page_count: u32) -> Self {
        Self {
            name: name.into(),
            page_count,
            registry: Some(FieldRegistry {
                fields: draft.fields.iter().map(FieldEntry::from_name).collect(),
                need_appearances: false,
            }),
        }
    }
}

/// Placement of one input document inside the merged document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedPart {
    pub name: String,
    /// 1-based first page in the merged document.
    pub first_page: u32,
    pub page_count: u32,
    /// Blank pages appended after this part.
    pub padding: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedForm {
    pub parts: Vec<MergedPart>,
    pub page_count: u32,
    pub registry: FieldRegistry,
}

/// Merge documents in order.
///
/// With `pad_to`, every document shorter than that many pages is followed by
/// blank pages so each test starts on the same page parity.
pub fn merge_forms(documents: &[FormDocument], pad_to: Option<u32>) -> Result<MergedForm, ExamError> {
    let mut registry = FieldRegistry {
        fields: Vec::new(),
        need_appearances: true,
    };
    let mut names: HashSet<String> = HashSet::new();
    let mut parts = Vec::with_capacity(documents.len());
    let mut next_page = 1u32;

    for (i, doc) in documents.iter().enumerate() {
        let fields = doc
            .registry
            .as_ref()
            .ok_or_else(|| ExamError::FieldRegistryMissing(doc.name.clone()))?;

        for field in &fields.fields {
            if !names.insert(field.name.clone()) {
                // Within the seeding document a repeat is a broken registry too.
                return Err(ExamError::DuplicateFieldName {
                    document: doc.name.clone(),
                    field: field.name.clone(),
                });
            }
            registry.fields.push(field.clone());
        }
        if i == 0 {
            tracing::debug!(document = %doc.name, fields = fields.len(), "seeded merged registry");
        }

        let padding = pad_to
            .map(|target| target.saturating_sub(doc.page_count))
            .unwrap_or(0);
        parts.push(MergedPart {
            name: doc.name.clone(),
            first_page: next_page,
            page_count: doc.page_count,
            padding,
        });
        next_page += doc.page_count + padding;
    }

    Ok(MergedForm {
        parts,
        page_count: next_page - 1,
        registry,
    })
}
