//! Write-time defaulting policy.
//!
//! # Responsibility
//! - Turn validated caller writes into the full column set for an insert.
//! - Turn validated caller writes into merge-aware assignments for an update.
//!
//! # Invariants
//! - `category` and `color` are never written as null or blank.
//! - `created` is written once, on insert; `modified` never moves backwards.
//! - Titles are cut on `char` boundaries, never inside a code point.

use crate::model::note::DEFAULT_CATEGORY;
use crate::model::resource::{columns, fields, ResourceType};
use crate::model::todo::DEFAULT_COLOR;
use crate::model::value::FieldValue;
use crate::resource::guard::FieldWrite;
use crate::resource::query::Assignment;
use rusqlite::types::Value;

pub const DEFAULT_UNTITLED_TITLE: &str = "Untitled";
pub const DEFAULT_TITLE_BUDGET: usize = 30;

/// Tunable parts of the defaulting policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultPolicy {
    /// Title used when neither a title nor a body is supplied.
    pub untitled_title: String,
    /// Maximum characters of body text used for a derived title.
    pub title_budget_chars: usize,
}

impl Default for DefaultPolicy {
    fn default() -> Self {
        Self {
            untitled_title: DEFAULT_UNTITLED_TITLE.to_string(),
            title_budget_chars: DEFAULT_TITLE_BUDGET,
        }
    }
}

impl DefaultPolicy {
    /// Full insert row for a new record of `ty`, stamped with `now`.
    pub fn creation_row(&self, ty: ResourceType, writes: &[FieldWrite], now: i64) -> Vec<Assignment> {
        let mut row = match ty {
            ResourceType::Note => {
                let body = text_or_empty(supplied(writes, fields::BODY));
                let title = supplied(writes, fields::TITLE)
                    .filter(|title| !title.is_blank())
                    .and_then(FieldValue::as_text)
                    .map(str::to_string)
                    .or_else(|| derive_title(&body, self.title_budget_chars))
                    .unwrap_or_else(|| self.untitled_title.clone());
                let category = token_or_default(supplied(writes, fields::CATEGORY), DEFAULT_CATEGORY);
                vec![
                    Assignment::replace(columns::TITLE, Value::Text(title)),
                    Assignment::replace(columns::NOTE, Value::Text(body)),
                    Assignment::replace(columns::CATEGORY, Value::Text(category)),
                ]
            }
            ResourceType::Todo => {
                let text = text_or_empty(supplied(writes, fields::TEXT));
                let color = token_or_default(supplied(writes, fields::COLOR), DEFAULT_COLOR);
                let completed = flag_or_false(supplied(writes, fields::COMPLETED));
                vec![
                    Assignment::replace(columns::TEXT, Value::Text(text)),
                    Assignment::replace(columns::COLOR, Value::Text(color)),
                    Assignment::replace(columns::IS_COMPLETED, completed),
                ]
            }
        };
        row.push(Assignment::replace(columns::CREATED, Value::Integer(now)));
        row.push(Assignment::replace(columns::MODIFIED, Value::Integer(now)));
        row
    }

    /// Update assignments for `writes`, stamped with `now`.
    ///
    /// A default-bearing column the caller leaves out is filled only when the
    /// stored value is null or blank, which heals rows from older schemas.
    pub fn update_row(&self, ty: ResourceType, writes: &[FieldWrite], now: i64) -> Vec<Assignment> {
        let mut row: Vec<Assignment> = writes
            .iter()
            .map(|write| {
                let value = Some(&write.value);
                let value = match write.spec.name {
                    fields::CATEGORY => Value::Text(token_or_default(value, DEFAULT_CATEGORY)),
                    fields::COLOR => Value::Text(token_or_default(value, DEFAULT_COLOR)),
                    fields::COMPLETED => flag_or_false(value),
                    _ => Value::Text(text_or_empty(value)),
                };
                Assignment::replace(write.spec.column, value)
            })
            .collect();

        let (field, column, default) = match ty {
            ResourceType::Note => (fields::CATEGORY, columns::CATEGORY, DEFAULT_CATEGORY),
            ResourceType::Todo => (fields::COLOR, columns::COLOR, DEFAULT_COLOR),
        };
        if supplied(writes, field).is_none() {
            row.push(Assignment::fill_blank(column, Value::Text(default.to_string())));
        }
        row.push(Assignment::keep_greater(columns::MODIFIED, Value::Integer(now)));
        row
    }
}

/// Derives a note title from its body.
///
/// Bodies within `budget` characters (after trimming) are used whole. Longer
/// bodies are cut to `budget` characters, then back to the last whitespace in
/// that window unless it sits at position 0. Returns `None` for blank bodies.
pub fn derive_title(body: &str, budget: usize) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.chars().count() <= budget {
        return Some(trimmed.to_string());
    }

    let window: String = trimmed.chars().take(budget).collect();
    let cut = window
        .char_indices()
        .filter(|(_, ch)| ch.is_whitespace())
        .map(|(idx, _)| idx)
        .last()
        .filter(|idx| *idx > 0);
    match cut {
        Some(idx) => Some(window[..idx].to_string()),
        None if window.is_empty() => None,
        None => Some(window),
    }
}

fn supplied<'w>(writes: &'w [FieldWrite], name: &str) -> Option<&'w FieldValue> {
    writes
        .iter()
        .find(|write| write.spec.name == name)
        .map(|write| &write.value)
}

fn text_or_empty(value: Option<&FieldValue>) -> String {
    value
        .and_then(FieldValue::as_text)
        .map(str::to_string)
        .unwrap_or_default()
}

fn token_or_default(value: Option<&FieldValue>, default: &str) -> String {
    value
        .filter(|token| !token.is_blank())
        .and_then(FieldValue::as_text)
        .map(str::trim)
        .unwrap_or(default)
        .to_string()
}

fn flag_or_false(value: Option<&FieldValue>) -> Value {
    match value {
        Some(FieldValue::Bool(true)) => Value::Integer(1),
        _ => Value::Integer(0),
    }
}

#[cfg(test)]
mod tests {
    use super::{derive_title, DefaultPolicy, DEFAULT_TITLE_BUDGET};
    use crate::model::resource::{columns, fields, ResourceKind, ResourceType};
    use crate::model::value::FieldValues;
    use crate::resource::guard::ProjectionGuard;
    use crate::resource::query::{Assignment, Merge};
    use rusqlite::types::Value;

    fn column<'a>(row: &'a [Assignment], name: &str) -> &'a Assignment {
        row.iter()
            .find(|assignment| assignment.column == name)
            .unwrap_or_else(|| panic!("missing column {name}"))
    }

    #[test]
    fn long_body_is_cut_at_last_word_boundary() {
        let title = derive_title("hello world this is a longer body of text", DEFAULT_TITLE_BUDGET);
        assert_eq!(title.as_deref(), Some("hello world this is a longer"));
    }

    #[test]
    fn body_without_whitespace_is_cut_at_raw_budget() {
        let body = "a".repeat(45);
        let title = derive_title(&body, DEFAULT_TITLE_BUDGET).unwrap();
        assert_eq!(title.chars().count(), 30);
    }

    #[test]
    fn short_and_blank_bodies() {
        assert_eq!(derive_title("  short note \n", 30).as_deref(), Some("short note"));
        assert_eq!(derive_title(" \t ", 30), None);
    }

    #[test]
    fn budget_counts_characters_not_bytes() {
        let body = "é".repeat(40);
        let title = derive_title(&body, 10).unwrap();
        assert_eq!(title, "é".repeat(10));
    }

    #[test]
    fn empty_note_creation_gets_every_default() {
        let row = DefaultPolicy::default().creation_row(ResourceType::Note, &[], 42);
        assert_eq!(column(&row, columns::TITLE).value, Value::Text("Untitled".into()));
        assert_eq!(column(&row, columns::NOTE).value, Value::Text(String::new()));
        assert_eq!(column(&row, columns::CATEGORY).value, Value::Text("Uncategorized".into()));
        assert_eq!(column(&row, columns::CREATED).value, Value::Integer(42));
        assert_eq!(column(&row, columns::MODIFIED).value, Value::Integer(42));
    }

    #[test]
    fn blank_color_is_defaulted_and_tokens_trimmed() {
        let guard = ProjectionGuard::new();
        let writes = guard
            .resolve_writes(
                ResourceKind::TodosCollection,
                &FieldValues::new().with(fields::COLOR, "   ").with(fields::TEXT, "x"),
            )
            .unwrap();
        let row = DefaultPolicy::default().creation_row(ResourceType::Todo, &writes, 1);
        assert_eq!(column(&row, columns::COLOR).value, Value::Text("#FFFFFF".into()));
        assert_eq!(column(&row, columns::IS_COMPLETED).value, Value::Integer(0));

        let writes = guard
            .resolve_writes(
                ResourceKind::NotesCollection,
                &FieldValues::new().with(fields::CATEGORY, " Work "),
            )
            .unwrap();
        let row = DefaultPolicy::default().update_row(ResourceType::Note, &writes, 1);
        assert_eq!(column(&row, columns::CATEGORY).value, Value::Text("Work".into()));
        assert_eq!(column(&row, columns::CATEGORY).merge, Merge::Replace);
    }

    #[test]
    fn whitespace_title_falls_back_to_body_derived_title() {
        let writes = ProjectionGuard::new()
            .resolve_writes(
                ResourceKind::NotesCollection,
                &FieldValues::new()
                    .with(fields::TITLE, " \n ")
                    .with(fields::BODY, "pick up the dry cleaning"),
            )
            .unwrap();
        let row = DefaultPolicy::default().creation_row(ResourceType::Note, &writes, 1);
        assert_eq!(
            column(&row, columns::TITLE).value,
            Value::Text("pick up the dry cleaning".into())
        );
    }

    #[test]
    fn update_without_category_fills_blank_and_keeps_greater_modified() {
        let row = DefaultPolicy::default().update_row(ResourceType::Note, &[], 7);
        assert_eq!(column(&row, columns::CATEGORY).merge, Merge::FillBlank);
        assert_eq!(column(&row, columns::MODIFIED).merge, Merge::KeepGreater);
        assert!(row.iter().all(|assignment| assignment.column != columns::CREATED));
    }
}
