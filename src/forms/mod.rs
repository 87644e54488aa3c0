//! Per-user ordering of form sections and fields.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::database::models::{FormFieldPosition, FormSectionPosition};

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("no item at position {from} (layout has {len})")]
    OutOfRange { from: usize, len: usize },

    #[error("duplicate key '{0}' in layout")]
    DuplicateKey(String),

    #[error("field '{field}' refers to unknown section '{section}'")]
    UnknownSection { field: String, section: String },
}

/// Sortable-list move: remove the item at `from`, insert it at `to`.
/// `to` is clamped to the end of the list.
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> Result<(), LayoutError> {
    if from >= items.len() {
        return Err(LayoutError::OutOfRange { from, len: items.len() });
    }
    let item = items.remove(from);
    let to = to.min(items.len());
    items.insert(to, item);
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutField {
    pub key: String,
    pub section: String,
}

/// A form's saved layout in display order. Positions are implied by index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormLayout {
    pub sections: Vec<String>,
    pub fields: Vec<LayoutField>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutTarget {
    Section,
    Field,
}

impl FormLayout {
    pub fn from_rows(mut sections: Vec<FormSectionPosition>, mut fields: Vec<FormFieldPosition>) -> Self {
        sections.sort_by_key(|s| s.position);
        fields.sort_by_key(|f| f.position);

        Self {
            sections: sections.into_iter().map(|s| s.section_key).collect(),
            fields: fields
                .into_iter()
                .map(|f| LayoutField {
                    key: f.field_key,
                    section: f.section_key,
                })
                .collect(),
        }
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        let mut seen = std::collections::HashSet::new();
        for section in &self.sections {
            if !seen.insert(section.as_str()) {
                return Err(LayoutError::DuplicateKey(section.clone()));
            }
        }

        let mut fields = std::collections::HashSet::new();
        for field in &self.fields {
            if !fields.insert(field.key.as_str()) {
                return Err(LayoutError::DuplicateKey(field.key.clone()));
            }
            if !self.sections.is_empty() && !seen.contains(field.section.as_str()) {
                return Err(LayoutError::UnknownSection {
                    field: field.key.clone(),
                    section: field.section.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn move_item(&mut self, target: LayoutTarget, from: usize, to: usize) -> Result<(), LayoutError> {
        match target {
            LayoutTarget::Section => move_item(&mut self.sections, from, to),
            LayoutTarget::Field => move_item(&mut self.fields, from, to),
        }
    }

    /// Rows with positions renumbered 0..n in current order.
    pub fn section_rows(&self) -> Vec<(String, i32)> {
        self.sections
            .iter()
            .enumerate()
            .map(|(i, key)| (key.clone(), i as i32))
            .collect()
    }

    pub fn field_rows(&self) -> Vec<(String, String, i32)> {
        self.fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.key.clone(), f.section.clone(), i as i32))
            .collect()
    }
}
