//! Typed note view.
//!
//! # Invariants
//! - `category` is never empty in the typed view; rows migrated from schema
//!   version 1 still carry `NULL` until their next update and surface here as
//!   [`DEFAULT_CATEGORY`].

use crate::model::resource::fields;
use crate::model::value::{optional_text, required_integer, Record, RecordError};
use serde::{Deserialize, Serialize};

/// Category assigned when a note has none.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// Free-form note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub category: String,
    /// Epoch milliseconds, set once at creation.
    pub created_at: i64,
    /// Epoch milliseconds, advanced on every update.
    pub modified_at: i64,
}

impl TryFrom<&Record> for Note {
    type Error = RecordError;

    /// Converts a full-projection note row.
    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        let id = required_integer(record, fields::ID)?;
        let title = optional_text(record, fields::TITLE)?.unwrap_or_default();
        let body = optional_text(record, fields::BODY)?.unwrap_or_default();
        let category = optional_text(record, fields::CATEGORY)?
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        Ok(Self {
            id,
            title,
            body,
            category,
            created_at: required_integer(record, fields::CREATED_AT)?,
            modified_at: required_integer(record, fields::MODIFIED_AT)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Note, DEFAULT_CATEGORY};
    use crate::model::resource::fields;
    use crate::model::value::{FieldValue, Record, RecordError};

    fn note_row(category: FieldValue) -> Record {
        let mut record = Record::default();
        record.insert(fields::ID, FieldValue::Integer(4));
        record.insert(fields::TITLE, FieldValue::from("Groceries"));
        record.insert(fields::BODY, FieldValue::from("eggs"));
        record.insert(fields::CATEGORY, category);
        record.insert(fields::CREATED_AT, FieldValue::Integer(10));
        record.insert(fields::MODIFIED_AT, FieldValue::Integer(20));
        record
    }

    #[test]
    fn null_category_reads_as_default() {
        let note = Note::try_from(&note_row(FieldValue::Null)).unwrap();
        assert_eq!(note.category, DEFAULT_CATEGORY);
        assert_eq!(note.id, 4);
    }

    #[test]
    fn partial_projection_is_rejected() {
        let mut record = Record::default();
        record.insert(fields::ID, FieldValue::Integer(1));
        let err = Note::try_from(&record).unwrap_err();
        assert_eq!(err, RecordError::MissingField(fields::TITLE));
    }

    #[test]
    fn missing_fields_are_reported_in_declaration_order() {
        let mut record = Record::default();
        record.insert(fields::ID, FieldValue::Integer(2));
        record.insert(fields::TITLE, FieldValue::from("Groceries"));
        record.insert(fields::CREATED_AT, FieldValue::Integer(10));
        let err = Note::try_from(&record).unwrap_err();
        assert_eq!(err, RecordError::MissingField(fields::BODY));
    }
}
