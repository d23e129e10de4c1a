//! Persistence backend primitives over a local SQLite store.
//!
//! # Responsibility
//! - Provide `execute` / `query_all` / `transaction` entry points shared by
//!   repositories, seeding and the store.
//! - Keep commit/rollback policy in one place.
//!
//! # Invariants
//! - `transaction` commits only when the closure returns `Ok`.
//! - Any `Err` returned by the closure rolls back every statement issued
//!   through the transaction handle and is returned unchanged.
//! - The transaction handle derefs to `Connection`, so the same free
//!   functions work inside and outside a transaction.

use super::{open_db, open_db_in_memory, DbError, DbResult};
use log::{debug, error};
use rusqlite::{Connection, Params, Row, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Instant;

/// Executes one statement and returns the number of affected rows.
pub fn execute<P: Params>(conn: &Connection, sql: &str, params: P) -> DbResult<usize> {
    Ok(conn.execute(sql, params)?)
}

/// Runs one query and maps every returned row.
///
/// The mapper may fail with the caller's error type, so read models can
/// report invalid persisted data without going through `rusqlite::Error`.
pub fn query_all<T, E, P, F>(conn: &Connection, sql: &str, params: P, mut map_row: F) -> Result<Vec<T>, E>
where
    P: Params,
    E: From<DbError>,
    F: FnMut(&Row<'_>) -> Result<T, E>,
{
    let mut stmt = conn.prepare(sql).map_err(DbError::from)?;
    let mut rows = stmt.query(params).map_err(DbError::from)?;
    let mut items = Vec::new();
    while let Some(row) = rows.next().map_err(DbError::from)? {
        items.push(map_row(row)?);
    }
    Ok(items)
}

/// Runs a `SELECT COUNT(*)`-shaped query and returns the first column.
pub fn query_count<P: Params>(conn: &Connection, sql: &str, params: P) -> DbResult<i64> {
    Ok(conn.query_row(sql, params, |row| row.get::<_, i64>(0))?)
}

/// Runs `f` inside one IMMEDIATE transaction (all-or-nothing).
///
/// # Errors
/// - Returns storage errors from `BEGIN` / `COMMIT`.
/// - Returns the closure error unchanged after rolling back.
pub fn transaction<T, E, F>(conn: &Connection, f: F) -> Result<T, E>
where
    E: From<DbError> + std::fmt::Display,
    F: FnOnce(&Transaction<'_>) -> Result<T, E>,
{
    let started_at = Instant::now();
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(DbError::from)?;

    match f(&tx) {
        Ok(value) => {
            tx.commit().map_err(DbError::from)?;
            debug!(
                "event=db_tx module=db status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(value)
        }
        Err(err) => {
            // Dropping the handle rolls back.
            drop(tx);
            error!(
                "event=db_tx module=db status=rollback duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

/// Owned SQLite connection exposing the backend primitives as methods.
pub struct Backend {
    conn: Connection,
}

impl Backend {
    /// Opens (or creates) a database file with the schema ensured.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    /// Opens a private in-memory database with the schema ensured.
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    /// Wraps an already bootstrapped connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Borrows the underlying connection for repositories and the store.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// See [`execute`].
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> DbResult<usize> {
        execute(&self.conn, sql, params)
    }

    /// See [`query_all`].
    pub fn query_all<T, E, P, F>(&self, sql: &str, params: P, map_row: F) -> Result<Vec<T>, E>
    where
        P: Params,
        E: From<DbError>,
        F: FnMut(&Row<'_>) -> Result<T, E>,
    {
        query_all(&self.conn, sql, params, map_row)
    }

    /// See [`query_count`].
    pub fn query_count<P: Params>(&self, sql: &str, params: P) -> DbResult<i64> {
        query_count(&self.conn, sql, params)
    }

    /// See [`transaction`]; commits on `Ok`, rolls back on `Err`.
    pub fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<DbError> + std::fmt::Display,
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    {
        transaction(&self.conn, f)
    }
}

#[cfg(test)]
mod tests {
    use super::{execute, query_all, query_count, transaction, Backend};
    use crate::db::{DbError, DbResult};
    use rusqlite::Connection;

    fn scratch() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, label TEXT NOT NULL);")
            .unwrap();
        conn
    }

    #[test]
    fn transaction_commits_on_ok() {
        let conn = scratch();
        transaction(&conn, |tx| -> DbResult<()> {
            execute(tx, "INSERT INTO t (id, label) VALUES (1, 'a');", [])?;
            execute(tx, "INSERT INTO t (id, label) VALUES (2, 'b');", [])?;
            Ok(())
        })
        .unwrap();

        assert_eq!(query_count(&conn, "SELECT COUNT(*) FROM t;", []).unwrap(), 2);
    }

    #[test]
    fn transaction_rolls_back_every_statement_on_error() {
        let conn = scratch();
        let err = transaction(&conn, |tx| -> DbResult<()> {
            execute(tx, "INSERT INTO t (id, label) VALUES (1, 'a');", [])?;
            // Duplicate primary key.
            execute(tx, "INSERT INTO t (id, label) VALUES (1, 'again');", [])?;
            Ok(())
        })
        .unwrap_err();

        assert!(matches!(err, DbError::Sqlite(_)));
        assert_eq!(query_count(&conn, "SELECT COUNT(*) FROM t;", []).unwrap(), 0);
    }

    #[test]
    fn query_all_maps_rows_in_order() {
        let conn = scratch();
        execute(&conn, "INSERT INTO t (id, label) VALUES (2, 'b'), (1, 'a');", []).unwrap();

        let labels: Vec<String> = query_all(
            &conn,
            "SELECT label FROM t ORDER BY id ASC;",
            [],
            |row| -> DbResult<String> { Ok(row.get(0)?) },
        )
        .unwrap();
        assert_eq!(labels, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn backend_in_memory_has_schema_ready() {
        let backend = Backend::open_in_memory().unwrap();
        let groups = backend
            .query_count("SELECT COUNT(*) FROM groups;", [])
            .unwrap();
        assert_eq!(groups, 0);
    }

    #[test]
    fn backend_methods_share_transaction_policy() {
        let backend = Backend::from_connection(scratch());
        backend
            .execute("INSERT INTO t (id, label) VALUES (1, 'kept');", [])
            .unwrap();

        let err = backend
            .transaction(|tx| -> DbResult<()> {
                execute(tx, "INSERT INTO t (id, label) VALUES (2, 'dropped');", [])?;
                execute(tx, "INSERT INTO t (id, label) VALUES (1, 'clash');", [])?;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, DbError::Sqlite(_)));

        let labels: Vec<String> = backend
            .query_all("SELECT label FROM t ORDER BY id ASC;", [], |row| -> DbResult<String> {
                Ok(row.get(0)?)
            })
            .unwrap();
        assert_eq!(labels, vec!["kept".to_string()]);
        assert_eq!(backend.query_count("SELECT COUNT(*) FROM t;", []).unwrap(), 1);
    }
}
