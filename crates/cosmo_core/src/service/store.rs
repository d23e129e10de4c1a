//! Organizer store: cached groups/planets plus every mutating use case.
//!
//! # Responsibility
//! - Own the in-memory `groups` / `planets` cache exposed to consumers.
//! - Validate hierarchy invariants above the repository layer.
//! - Reload the whole cache after every successful write.
//!
//! # Invariants
//! - Cache order is deterministic: groups by name, planets by full name.
//! - Writes are all-or-nothing; on error the cache keeps its last-known-good
//!   contents and no reload is attempted.
//! - A system is only created under an existing galaxy.
//! - Deleting a group never deletes a planet.
//!
//! Full reload after every write is the scalability ceiling of this store.
//! It is sized for one personal contact list.

use crate::db::seed::{seed_if_empty, SeedOutcome};
use crate::model::group::{Group, GroupId, GroupKind};
use crate::model::planet::{Planet, PlanetView};
use crate::model::ModelValidationError;
use crate::repo::group_repo::{GalaxyDeleteSummary, GroupRepository, SqliteGroupRepository};
use crate::repo::planet_repo::{PlanetRepository, SqlitePlanetRepository};
use crate::repo::{like_pattern, RepoError};
use log::{debug, info};
use rusqlite::Connection;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Input record violates a model invariant.
    Validation(ModelValidationError),
    /// System parent does not exist.
    ParentNotFound(GroupId),
    /// System parent exists but is itself a system.
    ParentMustBeGalaxy(GroupId),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::ParentNotFound(id) => write!(f, "parent galaxy not found: {id}"),
            Self::ParentMustBeGalaxy(id) => write!(f, "parent group must be a galaxy: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ModelValidationError> for StoreError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Combined result of one search call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub planets: Vec<PlanetView>,
    pub groups: Vec<Group>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.planets.is_empty() && self.groups.is_empty()
    }
}

/// Cached organizer store over group/planet repositories.
pub struct Store<G: GroupRepository, P: PlanetRepository> {
    group_repo: G,
    planet_repo: P,
    ready: bool,
    groups: Vec<Group>,
    planets: Vec<PlanetView>,
}

/// Store wired to the SQLite repositories of one connection.
pub type SqliteStore<'conn> = Store<SqliteGroupRepository<'conn>, SqlitePlanetRepository<'conn>>;

impl<'conn> Store<SqliteGroupRepository<'conn>, SqlitePlanetRepository<'conn>> {
    /// Builds an empty, not-ready store over one connection.
    pub fn open(conn: &'conn Connection) -> StoreResult<Self> {
        Ok(Self::new(
            SqliteGroupRepository::try_new(conn)?,
            SqlitePlanetRepository::try_new(conn)?,
        ))
    }

    /// Startup sequence: seed demo data when empty, then load the cache.
    ///
    /// The connection must come from `db::open_db*`, which already ensured
    /// the schema.
    pub fn bootstrap(conn: &'conn Connection) -> StoreResult<Self> {
        let outcome = seed_if_empty(conn).map_err(RepoError::from)?;
        if outcome == SeedOutcome::Seeded {
            info!("event=store_bootstrap module=service status=seeded");
        }
        let mut store = Self::open(conn)?;
        store.load_all()?;
        Ok(store)
    }
}

impl<G: GroupRepository, P: PlanetRepository> Store<G, P> {
    /// Creates a store from repository implementations. Call `load_all`
    /// before reading the cache.
    pub fn new(group_repo: G, planet_repo: P) -> Self {
        Self {
            group_repo,
            planet_repo,
            ready: false,
            groups: Vec::new(),
            planets: Vec::new(),
        }
    }

    /// Whether the cache has been loaded at least once.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Cached groups ordered by name.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Cached planets ordered by full name.
    pub fn planets(&self) -> &[PlanetView] {
        &self.planets
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|group| group.id == id)
    }

    pub fn planet(&self, id: &str) -> Option<&PlanetView> {
        self.planets.iter().find(|planet| planet.id() == id)
    }

    /// Cached galaxies ordered by name.
    pub fn galaxies(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter().filter(|group| group.is_galaxy())
    }

    /// Cached systems under `galaxy_id` ordered by name.
    pub fn systems_of<'a>(&'a self, galaxy_id: &'a str) -> impl Iterator<Item = &'a Group> {
        self.groups
            .iter()
            .filter(move |group| group.parent_id() == Some(galaxy_id))
    }

    /// Reloads both caches from storage and marks the store ready.
    pub fn load_all(&mut self) -> StoreResult<()> {
        let started_at = Instant::now();
        let groups = self.group_repo.list_groups()?;
        let planets = self.planet_repo.list_planets()?;
        self.groups = groups;
        self.planets = planets;
        self.ready = true;
        debug!(
            "event=store_load module=service status=ok groups={} planets={} duration_ms={}",
            self.groups.len(),
            self.planets.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    // ===== Groups =====

    /// Inserts a galaxy or a system.
    ///
    /// # Errors
    /// - `Validation(EmptyGroupName)` for a blank name.
    /// - `ParentNotFound` / `ParentMustBeGalaxy` for a system whose parent is
    ///   missing or is not a galaxy.
    pub fn create_group(&mut self, group: &Group) -> StoreResult<()> {
        group.validate()?;
        if let GroupKind::System { parent_id } = &group.kind {
            let parent = self
                .group_repo
                .get_group(parent_id)?
                .ok_or_else(|| StoreError::ParentNotFound(parent_id.clone()))?;
            if !parent.is_galaxy() {
                return Err(StoreError::ParentMustBeGalaxy(parent_id.clone()));
            }
        }
        self.group_repo.create_group(group)?;
        info!(
            "event=group_create module=service status=ok kind={}",
            group.kind.as_str()
        );
        self.load_all()
    }

    /// Renames a group. Unknown ids are a silent no-op.
    pub fn rename_group(&mut self, id: &str, new_name: &str) -> StoreResult<()> {
        let trimmed = new_name.trim();
        if trimmed.is_empty() {
            return Err(ModelValidationError::EmptyGroupName.into());
        }
        self.group_repo.rename_group(id, trimmed)?;
        self.load_all()
    }

    /// Replaces color/icon. Unknown ids are a silent no-op.
    pub fn update_group_style(
        &mut self,
        id: &str,
        color: Option<&str>,
        icon: Option<&str>,
    ) -> StoreResult<()> {
        self.group_repo.update_group_style(id, color, icon)?;
        self.load_all()
    }

    /// Deletes a group; a galaxy takes its systems with it. Links are
    /// severed, planets are kept. Unknown ids are a silent no-op.
    pub fn delete_group(&mut self, id: &str) -> StoreResult<()> {
        self.group_repo.delete_group(id)?;
        self.load_all()
    }

    /// Counts what deleting `galaxy_id` would remove, without mutating.
    pub fn galaxy_delete_summary(&self, galaxy_id: &str) -> StoreResult<GalaxyDeleteSummary> {
        Ok(self.group_repo.galaxy_delete_summary(galaxy_id)?)
    }

    // ===== Planets =====

    /// Inserts a planet and links it to `group_ids` (duplicates ignored).
    pub fn create_planet(&mut self, planet: &Planet, group_ids: &[GroupId]) -> StoreResult<()> {
        self.planet_repo.create_planet(planet, group_ids)?;
        info!(
            "event=planet_create module=service status=ok links={}",
            group_ids.len()
        );
        self.load_all()
    }

    /// Rewrites a planet and makes `group_ids` its exact link set.
    pub fn update_planet(&mut self, planet: &Planet, group_ids: &[GroupId]) -> StoreResult<()> {
        self.planet_repo.update_planet(planet, group_ids)?;
        self.load_all()
    }

    /// Deletes a planet together with its links.
    pub fn delete_planet(&mut self, id: &str) -> StoreResult<()> {
        self.planet_repo.delete_planet(id)?;
        self.load_all()
    }

    /// Removes one membership link if present.
    pub fn unlink_planet_from_group(&mut self, planet_id: &str, group_id: &str) -> StoreResult<()> {
        self.planet_repo
            .unlink_planet_from_group(planet_id, group_id)?;
        self.load_all()
    }

    // ===== Queries =====

    /// Planets directly linked to `group_id`, each with its full group-id set.
    pub fn planets_by_group(&self, group_id: &str) -> StoreResult<Vec<PlanetView>> {
        Ok(self.planet_repo.planets_by_group(group_id)?)
    }

    /// Groups linked to `planet_id`, galaxies before systems, then by name.
    pub fn groups_by_planet(&self, planet_id: &str) -> StoreResult<Vec<Group>> {
        Ok(self.group_repo.groups_by_planet(planet_id)?)
    }

    /// Planets linked to the galaxy or any of its systems, without duplicates.
    pub fn planets_in_galaxy_deep(&self, galaxy_id: &str) -> StoreResult<Vec<PlanetView>> {
        Ok(self.planet_repo.planets_in_galaxy_deep(galaxy_id)?)
    }

    /// Case-insensitive substring search over planets (full name, company)
    /// and groups (name).
    ///
    /// A blank query returns empty results without touching storage.
    pub fn search(&self, query: &str) -> StoreResult<SearchResults> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Ok(SearchResults::default());
        }
        let pattern = like_pattern(trimmed);
        let planets = self.planet_repo.search_planets(&pattern)?;
        let groups = self.group_repo.search_groups(&pattern)?;
        debug!(
            "event=search module=service status=ok planets={} groups={}",
            planets.len(),
            groups.len()
        );
        Ok(SearchResults { planets, groups })
    }
}
