//! Error taxonomy of the resource access layer.
//!
//! # Invariants
//! - Every failure is surfaced to the caller; nothing is retried here.
//! - Field-level errors always name the offending logical field.

use crate::db::DbError;
use crate::model::resource::{FieldType, ResourceKind};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// The four verbs of the access layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub enum StoreError {
    /// Path matches none of the known resource shapes.
    UnknownResource(String),
    /// Field is outside the whitelist for the resolved kind, or not writable.
    InvalidField { kind: ResourceKind, field: String },
    /// Value does not fit the field's storage type.
    InvalidValue { field: String, expected: FieldType },
    /// Verb is not valid for the resolved kind.
    UnsupportedOperation {
        operation: Operation,
        kind: ResourceKind,
    },
    /// Store could not be opened or migrated; no requests may be served.
    Schema(DbError),
    /// Underlying store rejected the statement.
    Persistence(RepoError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownResource(path) => write!(f, "unknown resource path `{path}`"),
            Self::InvalidField { kind, field } => {
                write!(f, "invalid field `{field}` for {kind}")
            }
            Self::InvalidValue { field, expected } => {
                write!(f, "invalid value for `{field}`: expected {}", expected.as_str())
            }
            Self::UnsupportedOperation { operation, kind } => {
                write!(f, "{operation} is not supported on {kind}")
            }
            Self::Schema(err) => write!(f, "schema error: {err}"),
            Self::Persistence(err) => write!(f, "persistence error: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Schema(err) => Some(err),
            Self::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Schema(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Persistence(value)
    }
}
