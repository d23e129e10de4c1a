//! SQLite storage bootstrap, schema management and demo seeding.
//!
//! # Responsibility
//! - Open and configure SQLite connections for Cosmo core.
//! - Expose execute/query/transaction primitives to repositories.
//! - Keep the three-relation schema (`groups`, `planets`, `planet_groups`)
//!   present and forward-migrated.
//!
//! # Invariants
//! - Core code must not read/write application data before `ensure_schema` succeeds.
//! - Every multi-statement write runs inside one `transaction` call.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod backend;
mod open;
pub mod schema;
pub mod seed;

pub use backend::{execute, query_all, query_count, transaction, Backend};
pub use open::{open_db, open_db_in_memory};
pub use schema::{ensure_schema, SCHEMA_VERSION};
pub use seed::{seed_if_empty, SeedOutcome};

pub type DbResult<T> = Result<T, DbError>;

/// Storage-level failure: unreachable store, malformed SQL, constraint
/// violation or an unsupported on-disk schema.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
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
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
