//! Core data layer for Cosmo, a local-first relationship organizer.
//! This crate is the single source of truth for grouping and cascade invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, Backend, DbError, DbResult, SeedOutcome};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::group::{Group, GroupId, GroupKind};
pub use model::planet::{Planet, PlanetId, PlanetView, SocialLink};
pub use model::{new_id, now_ms, ModelValidationError};
pub use repo::group_repo::{GalaxyDeleteSummary, GroupRepository, SqliteGroupRepository};
pub use repo::planet_repo::{PlanetRepository, SqlitePlanetRepository};
pub use repo::{RepoError, RepoResult};
pub use service::store::{SearchResults, SqliteStore, Store, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
