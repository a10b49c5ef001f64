//! Resource repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Execute statements produced by the query builder.
//! - Decode rows into `Record`s keyed by logical field name.
//!
//! # Invariants
//! - Each write runs in one immediate transaction; row values are computed
//!   after the write lock is held, so defaults and timestamps never come from
//!   stale state.
//! - The connection is only accepted once fully migrated.

use crate::db::{current_version, latest_version, DbError, DbResult};
use crate::model::resource::{FieldSpec, FieldType};
use crate::model::value::{FieldValue, Record};
use crate::resource::query::{insert_sql, Assignment, SelectQuery, WriteScope};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-level failure.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Stored value cannot be decoded into the field's type.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Statement execution contract used by the content service.
pub trait ResourceRepository {
    fn select(&self, query: &SelectQuery) -> RepoResult<Vec<Record>>;

    /// Inserts one row and returns the store-assigned id.
    ///
    /// `build_row` runs inside the write transaction.
    fn insert<F>(&self, table: &'static str, build_row: F) -> RepoResult<i64>
    where
        F: FnOnce() -> Vec<Assignment>;

    /// Updates every row in `scope` and returns the affected count.
    ///
    /// `build_row` runs inside the write transaction.
    fn update<F>(&self, scope: &WriteScope, build_row: F) -> RepoResult<usize>
    where
        F: FnOnce() -> Vec<Assignment>;

    fn delete(&self, scope: &WriteScope) -> RepoResult<usize>;
}

/// SQLite-backed repository owning one serialized connection.
#[derive(Debug)]
pub struct SqliteResourceRepository {
    conn: Mutex<Connection>,
}

impl SqliteResourceRepository {
    /// Wraps a connection migrated to [`latest_version`].
    ///
    /// # Errors
    /// - `SchemaNotReady` when the connection is behind the latest schema.
    pub fn try_new(conn: Connection) -> DbResult<Self> {
        let actual = current_version(&conn)?;
        let expected = latest_version();
        if actual != expected {
            return Err(DbError::SchemaNotReady { expected, actual });
        }
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A poisoned lock is still consistent: dropped transactions roll back.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResourceRepository for SqliteResourceRepository {
    fn select(&self, query: &SelectQuery) -> RepoResult<Vec<Record>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&query.sql())?;
        let mut rows = stmt.query(params_from_iter(query.args.iter()))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Record::default();
            for (idx, spec) in query.columns.iter().enumerate() {
                let raw: Value = row.get(idx)?;
                record.insert(spec.name, decode_value(query.table, spec, raw)?);
            }
            records.push(record);
        }
        Ok(records)
    }

    fn insert<F>(&self, table: &'static str, build_row: F) -> RepoResult<i64>
    where
        F: FnOnce() -> Vec<Assignment>,
    {
        let mut conn = self.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let row = build_row();
        tx.execute(
            &insert_sql(table, &row),
            params_from_iter(row.iter().map(|assignment| &assignment.value)),
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(id)
    }

    fn update<F>(&self, scope: &WriteScope, build_row: F) -> RepoResult<usize>
    where
        F: FnOnce() -> Vec<Assignment>,
    {
        let mut conn = self.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let row = build_row();
        let values = row
            .iter()
            .map(|assignment| &assignment.value)
            .chain(scope.args.iter());
        let changed = tx.execute(&scope.update_sql(&row), params_from_iter(values))?;
        tx.commit()?;
        Ok(changed)
    }

    fn delete(&self, scope: &WriteScope) -> RepoResult<usize> {
        let conn = self.lock();
        let changed = conn.execute(&scope.delete_sql(), params_from_iter(scope.args.iter()))?;
        Ok(changed)
    }
}

fn decode_value(table: &str, spec: &FieldSpec, raw: Value) -> RepoResult<FieldValue> {
    let value = match (spec.ty, raw) {
        (_, Value::Null) => FieldValue::Null,
        (FieldType::Integer, Value::Integer(value)) => FieldValue::Integer(value),
        (FieldType::Boolean, Value::Integer(value)) => FieldValue::Bool(value != 0),
        (FieldType::Text, Value::Text(value)) => FieldValue::Text(value),
        (FieldType::Text, Value::Integer(value)) => FieldValue::Text(value.to_string()),
        (_, other) => {
            return Err(RepoError::InvalidData(format!(
                "unexpected {:?} value in {table}.{}",
                other.data_type(),
                spec.column
            )))
        }
    };
    Ok(value)
}
