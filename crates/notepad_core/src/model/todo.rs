//! Typed to-do view.

use crate::model::resource::{fields, FieldType};
use crate::model::value::{
    optional_text, required_integer, FieldValue, Record, RecordError,
};
use serde::{Deserialize, Serialize};

/// Color token assigned when a to-do has none.
pub const DEFAULT_COLOR: &str = "#FFFFFF";

/// Short colored to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub text: String,
    pub color: String,
    pub completed: bool,
    pub created_at: i64,
    pub modified_at: i64,
}

impl TryFrom<&Record> for Todo {
    type Error = RecordError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        let id = required_integer(record, fields::ID)?;
        let text = optional_text(record, fields::TEXT)?.unwrap_or_default();
        let color = optional_text(record, fields::COLOR)?
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COLOR.to_string());
        let completed = match record.get(fields::COMPLETED) {
            None => return Err(RecordError::MissingField(fields::COMPLETED)),
            Some(FieldValue::Null) => false,
            Some(FieldValue::Bool(value)) => *value,
            Some(_) => {
                return Err(RecordError::WrongType {
                    field: fields::COMPLETED,
                    expected: FieldType::Boolean,
                })
            }
        };

        Ok(Self {
            id,
            text,
            color,
            completed,
            created_at: required_integer(record, fields::CREATED_AT)?,
            modified_at: required_integer(record, fields::MODIFIED_AT)?,
        })
    }
}
