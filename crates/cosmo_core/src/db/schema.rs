//! Idempotent schema definition and forward migration.
//!
//! # Responsibility
//! - Create `groups`, `planets` and `planet_groups` when absent.
//! - Add optional columns introduced after the first release to older stores.
//!
//! # Invariants
//! - `ensure_schema` is safe to call on every startup.
//! - An "already exists" outcome for a column is success, never an error.
//! - Applied schema version is mirrored to `PRAGMA user_version`.

use super::backend::transaction;
use super::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

/// Schema version written by this binary.
pub const SCHEMA_VERSION: u32 = 1;

const CREATE_TABLES_SQL: &str = "
CREATE TABLE IF NOT EXISTS groups (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    type TEXT NOT NULL CHECK (type IN ('galaxy','system')),
    parentId TEXT,
    color TEXT,
    icon TEXT,
    createdAt INTEGER NOT NULL,
    updatedAt INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS planets (
    id TEXT PRIMARY KEY,
    fullName TEXT NOT NULL,
    jobTitle TEXT,
    company TEXT,
    phone TEXT,
    email TEXT,
    howWeMet TEXT,
    commonGround TEXT,
    notes TEXT,
    keywords TEXT,
    socials TEXT,
    emoji TEXT,
    createdAt INTEGER NOT NULL,
    updatedAt INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS planet_groups (
    planetId TEXT NOT NULL,
    groupId TEXT NOT NULL,
    PRIMARY KEY (planetId, groupId)
);
";

const CREATE_INDEXES_SQL: &str = "
CREATE INDEX IF NOT EXISTS idx_planet_groups_group ON planet_groups (groupId);
CREATE INDEX IF NOT EXISTS idx_groups_parent ON groups (parentId);
";

/// Columns added after the initial table layout: `(table, column, type)`.
const LATE_COLUMNS: &[(&str, &str, &str)] = &[
    ("planets", "emoji", "TEXT"),
    ("groups", "color", "TEXT"),
    ("groups", "icon", "TEXT"),
];

/// Ensures all tables, late columns and indexes exist.
///
/// # Errors
/// - `DbError::UnsupportedSchemaVersion` when the store was written by a
///   newer binary.
/// - `DbError::Sqlite` for any other storage failure.
pub fn ensure_schema(conn: &Connection) -> DbResult<()> {
    let current = current_user_version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: SCHEMA_VERSION,
        });
    }

    transaction(conn, |tx| -> DbResult<()> {
        tx.execute_batch(CREATE_TABLES_SQL)?;
        for (table, column, column_type) in LATE_COLUMNS {
            add_column_if_missing(tx, table, column, column_type)?;
        }
        tx.execute_batch(CREATE_INDEXES_SQL)?;
        if current < SCHEMA_VERSION {
            tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
        }
        Ok(())
    })?;

    if current < SCHEMA_VERSION {
        info!(
            "event=schema_migrate module=db status=ok from_version={current} to_version={SCHEMA_VERSION}"
        );
    }
    Ok(())
}

fn add_column_if_missing(
    conn: &Connection,
    table: &str,
    column: &str,
    column_type: &str,
) -> DbResult<()> {
    match conn.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN {column} {column_type};")) {
        Ok(()) => {
            info!("event=schema_add_column module=db status=ok table={table} column={column}");
            Ok(())
        }
        Err(err) if is_duplicate_column(&err) => {
            debug!("event=schema_add_column module=db status=skipped table={table} column={column}");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn is_duplicate_column(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(_, Some(message)) if message.contains("duplicate column name")
    )
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::{ensure_schema, is_duplicate_column};
    use rusqlite::Connection;

    #[test]
    fn duplicate_column_error_is_recognized() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (a TEXT);").unwrap();
        let err = conn
            .execute_batch("ALTER TABLE t ADD COLUMN a TEXT;")
            .unwrap_err();
        assert!(is_duplicate_column(&err));
    }

    #[test]
    fn other_errors_are_not_treated_as_duplicate_column() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn
            .execute_batch("ALTER TABLE missing ADD COLUMN a TEXT;")
            .unwrap_err();
        assert!(!is_duplicate_column(&err));
    }

    #[test]
    fn ensure_schema_runs_on_bare_connection() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();
    }
}
