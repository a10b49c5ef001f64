//! SQLite storage bootstrap and schema management.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the notepad store.
//! - Own the `notes`/`todos` table definitions and their versioned migrations.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - Migrations are additive: columns and tables are never dropped or renamed.
//! - No resource operation runs before migrations have fully succeeded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use migrations::{current_version, ensure_schema, latest_version};
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    UnknownTargetVersion {
        target: u32,
        latest_supported: u32,
    },
    /// Connection is not migrated to the version this binary serves.
    SchemaNotReady { expected: u32, actual: u32 },
    /// One migration step failed; earlier steps stay committed.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::UnknownTargetVersion {
                target,
                latest_supported,
            } => write!(
                f,
                "requested schema version {target} is beyond latest known {latest_supported}"
            ),
            Self::SchemaNotReady { expected, actual } => write!(
                f,
                "schema version {actual} is not ready; expected {expected}"
            ),
            Self::Migration { version, source } => {
                write!(f, "migration to schema version {version} failed: {source}")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Migration { source, .. } => Some(source),
            Self::UnsupportedSchemaVersion { .. }
            | Self::UnknownTargetVersion { .. }
            | Self::SchemaNotReady { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
