//! Untyped field values, result rows and write payloads.

use crate::model::resource::FieldType;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One field value as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this value may be stored in a field of type `ty`.
    ///
    /// `Null` is accepted everywhere; defaulting decides what it becomes.
    /// Booleans also accept the integers `0` and `1`.
    pub fn fits(&self, ty: FieldType) -> bool {
        match (self, ty) {
            (Self::Null, _) => true,
            (Self::Integer(_), FieldType::Integer) => true,
            (Self::Text(_), FieldType::Text) => true,
            (Self::Bool(_), FieldType::Boolean) => true,
            (Self::Integer(0 | 1), FieldType::Boolean) => true,
            _ => false,
        }
    }

    /// Text content, or `None` for non-text values.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Returns `true` for null and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(value) => value.trim().is_empty(),
            _ => false,
        }
    }

    pub(crate) fn to_sql(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(value) => Value::Integer(i64::from(*value)),
            Self::Integer(value) => Value::Integer(*value),
            Self::Text(value) => Value::Text(value.clone()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// One result row keyed by logical field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub(crate) fn insert(&mut self, name: &str, value: FieldValue) {
        self.fields.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            FieldValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name)?.as_text()
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            FieldValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Logical field names present in this row, sorted.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Caller-supplied field values for create/update, keyed by logical name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldValues {
    values: BTreeMap<String, FieldValue>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Error converting a `Record` into a typed view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    MissingField(&'static str),
    WrongType {
        field: &'static str,
        expected: FieldType,
    },
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "record is missing field `{field}`"),
            Self::WrongType { field, expected } => {
                write!(f, "field `{field}` is not of type {}", expected.as_str())
            }
        }
    }
}

impl Error for RecordError {}

/// Reads a required integer field.
pub(crate) fn required_integer(record: &Record, field: &'static str) -> Result<i64, RecordError> {
    match record.get(field) {
        None => Err(RecordError::MissingField(field)),
        Some(FieldValue::Integer(value)) => Ok(*value),
        Some(_) => Err(RecordError::WrongType {
            field,
            expected: FieldType::Integer,
        }),
    }
}

/// Reads an optional text field; `Null` maps to `None`.
pub(crate) fn optional_text(
    record: &Record,
    field: &'static str,
) -> Result<Option<String>, RecordError> {
    match record.get(field) {
        None => Err(RecordError::MissingField(field)),
        Some(FieldValue::Null) => Ok(None),
        Some(FieldValue::Text(value)) => Ok(Some(value.clone())),
        Some(_) => Err(RecordError::WrongType {
            field,
            expected: FieldType::Text,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldValue, FieldValues};
    use crate::model::resource::FieldType;

    #[test]
    fn boolean_fields_accept_zero_and_one() {
        assert!(FieldValue::Integer(1).fits(FieldType::Boolean));
        assert!(FieldValue::Integer(0).fits(FieldType::Boolean));
        assert!(!FieldValue::Integer(2).fits(FieldType::Boolean));
        assert!(!FieldValue::from("yes").fits(FieldType::Boolean));
    }

    #[test]
    fn blank_covers_null_and_whitespace() {
        assert!(FieldValue::Null.is_blank());
        assert!(FieldValue::from("  \t").is_blank());
        assert!(!FieldValue::from("Work").is_blank());
        assert!(!FieldValue::Bool(false).is_blank());
    }

    #[test]
    fn builder_overwrites_repeated_field() {
        let values = FieldValues::new()
            .with("title", "first")
            .with("title", "second");
        assert_eq!(values.len(), 1);
        assert_eq!(values.get("title"), Some(&FieldValue::from("second")));
    }
}
