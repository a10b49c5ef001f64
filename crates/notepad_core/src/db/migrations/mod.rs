//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Apply each pending step in its own transaction.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Every step is safe to re-run against a schema that already contains it.
//! - A failed step leaves `user_version` at the last committed step.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection, Transaction};

#[derive(Debug, Clone, Copy)]
enum MigrationStep {
    Sql(&'static str),
    AddColumn {
        table: &'static str,
        column: &'static str,
        definition: &'static str,
    },
}

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    step: MigrationStep,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        step: MigrationStep::Sql(include_str!("0001_notes.sql")),
    },
    Migration {
        version: 2,
        step: MigrationStep::AddColumn {
            table: "notes",
            column: "category",
            definition: "TEXT",
        },
    },
    Migration {
        version: 3,
        step: MigrationStep::Sql(include_str!("0003_todos.sql")),
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Reads the schema version recorded in the database.
pub fn current_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Migrates the database up to `target` and returns the applied version.
///
/// A database already at or beyond `target` is left untouched.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the database is newer than this binary.
/// - `UnknownTargetVersion` when `target` exceeds [`latest_version`].
/// - `Migration` when one step cannot be applied; earlier steps stay committed.
pub fn ensure_schema(conn: &mut Connection, target: u32) -> DbResult<u32> {
    let current = current_version(conn)?;
    let latest = latest_version();

    if current > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }
    if target > latest {
        return Err(DbError::UnknownTargetVersion {
            target,
            latest_supported: latest,
        });
    }
    if current >= target {
        return Ok(current);
    }

    info!("event=db_migrate module=db status=start from={current} to={target}");
    let mut applied = current;
    for migration in MIGRATIONS
        .iter()
        .filter(|migration| migration.version > current && migration.version <= target)
    {
        if let Err(source) = apply_one(conn, migration) {
            error!(
                "event=db_migrate module=db status=error version={} error={}",
                migration.version, source
            );
            return Err(DbError::Migration {
                version: migration.version,
                source,
            });
        }
        applied = migration.version;
    }
    info!("event=db_migrate module=db status=ok version={applied}");

    Ok(applied)
}

fn apply_one(conn: &mut Connection, migration: &Migration) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    match migration.step {
        MigrationStep::Sql(sql) => tx.execute_batch(sql)?,
        MigrationStep::AddColumn {
            table,
            column,
            definition,
        } => {
            if !table_has_column(&tx, table, column)? {
                tx.execute_batch(&format!(
                    "ALTER TABLE {table} ADD COLUMN {column} {definition};"
                ))?;
            }
        }
    }
    tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    tx.commit()
}

fn table_has_column(tx: &Transaction<'_>, table: &str, column: &str) -> rusqlite::Result<bool> {
    let mut stmt = tx.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::{ensure_schema, latest_version, MIGRATIONS};
    use rusqlite::Connection;

    #[test]
    fn migration_versions_are_strictly_increasing() {
        let versions: Vec<u32> = MIGRATIONS.iter().map(|m| m.version).collect();
        assert!(versions.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(latest_version(), 3);
    }

    #[test]
    fn partial_target_stops_at_requested_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(ensure_schema(&mut conn, 2).unwrap(), 2);

        let todos: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'todos';",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(todos, 0);

        assert_eq!(ensure_schema(&mut conn, 3).unwrap(), 3);
    }

    #[test]
    fn lower_target_never_downgrades() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&mut conn, 3).unwrap();
        assert_eq!(ensure_schema(&mut conn, 1).unwrap(), 3);
    }
}
