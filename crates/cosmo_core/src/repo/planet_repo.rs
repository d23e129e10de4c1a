//! Planet repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide contact CRUD on top of `planets`.
//! - Own link replacement (`update_planet`) with atomic semantics.
//! - Answer direct and deep (galaxy + child systems) membership queries.
//!
//! # Invariants
//! - Linking is insert-or-ignore: re-linking an existing pair is a no-op.
//! - `update_planet` treats `group_ids` as the authoritative link set.
//! - Every read returns `PlanetView` with its full group-id set, ordered by
//!   `fullName ASC, id ASC` and de-duplicated by planet id.

use super::group_repo::child_system_ids;
use super::mapper::{parse_planet_view_row, to_json_text, PLANET_VIEW_COLUMNS};
use super::{ensure_table_columns, RepoResult};
use crate::db::{execute, query_all, transaction};
use crate::model::group::GroupId;
use crate::model::now_ms;
use crate::model::planet::{normalize_keywords, Planet, PlanetView};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};

const LINK_INSERT_SQL: &str =
    "INSERT OR IGNORE INTO planet_groups (planetId, groupId) VALUES (?1, ?2);";

/// Repository interface for planet operations.
pub trait PlanetRepository {
    /// Inserts one planet and links it to `group_ids`.
    fn create_planet(&self, planet: &Planet, group_ids: &[GroupId]) -> RepoResult<()>;
    /// Rewrites one planet and replaces its link set. Returns whether it existed.
    fn update_planet(&self, planet: &Planet, group_ids: &[GroupId]) -> RepoResult<bool>;
    /// Deletes one planet and its links. Returns whether it existed.
    fn delete_planet(&self, id: &str) -> RepoResult<bool>;
    /// Removes one link. Returns whether a link existed.
    fn unlink_planet_from_group(&self, planet_id: &str, group_id: &str) -> RepoResult<bool>;
    /// Loads one planet by id.
    fn get_planet(&self, id: &str) -> RepoResult<Option<PlanetView>>;
    /// Lists all planets ordered by full name.
    fn list_planets(&self) -> RepoResult<Vec<PlanetView>>;
    /// Lists planets directly linked to `group_id`.
    fn planets_by_group(&self, group_id: &str) -> RepoResult<Vec<PlanetView>>;
    /// Lists planets linked to the galaxy or any of its systems.
    fn planets_in_galaxy_deep(&self, galaxy_id: &str) -> RepoResult<Vec<PlanetView>>;
    /// Lists planets whose full name or company contains the `LIKE` pattern.
    fn search_planets(&self, pattern: &str) -> RepoResult<Vec<PlanetView>>;
}

/// SQLite-backed planet repository.
pub struct SqlitePlanetRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePlanetRepository<'conn> {
    /// Creates repository from a connection with the schema ensured.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_columns(
            conn,
            "planets",
            &[
                "id",
                "fullName",
                "jobTitle",
                "company",
                "phone",
                "email",
                "howWeMet",
                "commonGround",
                "notes",
                "keywords",
                "socials",
                "emoji",
                "createdAt",
                "updatedAt",
            ],
        )?;
        ensure_table_columns(conn, "planet_groups", &["planetId", "groupId"])?;
        Ok(Self { conn })
    }
}

impl PlanetRepository for SqlitePlanetRepository<'_> {
    fn create_planet(&self, planet: &Planet, group_ids: &[GroupId]) -> RepoResult<()> {
        planet.validate()?;
        let columns = SerializedLists::from_planet(planet)?;

        transaction(self.conn, |tx| -> RepoResult<()> {
            execute(
                tx,
                "INSERT INTO planets (
                    id, fullName, jobTitle, company, phone, email, howWeMet, commonGround,
                    notes, keywords, socials, emoji, createdAt, updatedAt
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14);",
                params![
                    planet.id,
                    planet.full_name,
                    planet.job_title,
                    planet.company,
                    planet.phone,
                    planet.email,
                    planet.how_we_met,
                    planet.common_ground,
                    columns.notes,
                    columns.keywords,
                    columns.socials,
                    planet.emoji,
                    planet.created_at,
                    planet.updated_at,
                ],
            )?;
            for group_id in group_ids {
                execute(tx, LINK_INSERT_SQL, params![planet.id, group_id])?;
            }
            Ok(())
        })
    }

    fn update_planet(&self, planet: &Planet, group_ids: &[GroupId]) -> RepoResult<bool> {
        planet.validate()?;
        let columns = SerializedLists::from_planet(planet)?;

        transaction(self.conn, |tx| -> RepoResult<bool> {
            let changed = execute(
                tx,
                "UPDATE planets
                 SET fullName = ?2,
                     jobTitle = ?3,
                     company = ?4,
                     phone = ?5,
                     email = ?6,
                     howWeMet = ?7,
                     commonGround = ?8,
                     notes = ?9,
                     keywords = ?10,
                     socials = ?11,
                     emoji = ?12,
                     updatedAt = ?13
                 WHERE id = ?1;",
                params![
                    planet.id,
                    planet.full_name,
                    planet.job_title,
                    planet.company,
                    planet.phone,
                    planet.email,
                    planet.how_we_met,
                    planet.common_ground,
                    columns.notes,
                    columns.keywords,
                    columns.socials,
                    planet.emoji,
                    now_ms(),
                ],
            )?;
            if changed == 0 {
                return Ok(false);
            }

            execute(
                tx,
                "DELETE FROM planet_groups WHERE planetId = ?1;",
                [planet.id.as_str()],
            )?;
            for group_id in group_ids {
                execute(tx, LINK_INSERT_SQL, params![planet.id, group_id])?;
            }
            Ok(true)
        })
    }

    fn delete_planet(&self, id: &str) -> RepoResult<bool> {
        transaction(self.conn, |tx| -> RepoResult<bool> {
            execute(tx, "DELETE FROM planet_groups WHERE planetId = ?1;", [id])?;
            let deleted = execute(tx, "DELETE FROM planets WHERE id = ?1;", [id])?;
            Ok(deleted > 0)
        })
    }

    fn unlink_planet_from_group(&self, planet_id: &str, group_id: &str) -> RepoResult<bool> {
        let deleted = execute(
            self.conn,
            "DELETE FROM planet_groups WHERE planetId = ?1 AND groupId = ?2;",
            [planet_id, group_id],
        )?;
        Ok(deleted > 0)
    }

    fn get_planet(&self, id: &str) -> RepoResult<Option<PlanetView>> {
        let mut planets = query_all(
            self.conn,
            &format!("SELECT {PLANET_VIEW_COLUMNS} FROM planets p WHERE p.id = ?1;"),
            [id],
            parse_planet_view_row,
        )?;
        Ok(planets.pop())
    }

    fn list_planets(&self) -> RepoResult<Vec<PlanetView>> {
        query_all(
            self.conn,
            &format!(
                "SELECT {PLANET_VIEW_COLUMNS}
                 FROM planets p
                 ORDER BY p.fullName ASC, p.id ASC;"
            ),
            [],
            parse_planet_view_row,
        )
    }

    fn planets_by_group(&self, group_id: &str) -> RepoResult<Vec<PlanetView>> {
        query_all(
            self.conn,
            &format!(
                "SELECT {PLANET_VIEW_COLUMNS}
                 FROM planets p
                 WHERE EXISTS (
                    SELECT 1 FROM planet_groups pg
                    WHERE pg.planetId = p.id AND pg.groupId = ?1
                 )
                 ORDER BY p.fullName ASC, p.id ASC;"
            ),
            [group_id],
            parse_planet_view_row,
        )
    }

    fn planets_in_galaxy_deep(&self, galaxy_id: &str) -> RepoResult<Vec<PlanetView>> {
        let mut scope = vec![Value::Text(galaxy_id.to_string())];
        scope.extend(child_system_ids(self.conn, galaxy_id)?.into_iter().map(Value::Text));

        let placeholders = vec!["?"; scope.len()].join(", ");
        query_all(
            self.conn,
            &format!(
                "SELECT {PLANET_VIEW_COLUMNS}
                 FROM planets p
                 WHERE EXISTS (
                    SELECT 1 FROM planet_groups pg
                    WHERE pg.planetId = p.id AND pg.groupId IN ({placeholders})
                 )
                 ORDER BY p.fullName ASC, p.id ASC;"
            ),
            params_from_iter(scope),
            parse_planet_view_row,
        )
    }

    fn search_planets(&self, pattern: &str) -> RepoResult<Vec<PlanetView>> {
        query_all(
            self.conn,
            &format!(
                "SELECT {PLANET_VIEW_COLUMNS}
                 FROM planets p
                 WHERE LOWER(p.fullName) LIKE ?1 ESCAPE '\\'
                    OR LOWER(p.company) LIKE ?1 ESCAPE '\\'
                 ORDER BY p.fullName ASC, p.id ASC;"
            ),
            [pattern],
            parse_planet_view_row,
        )
    }
}

/// JSON-text values for the three list columns of one planet.
struct SerializedLists {
    notes: String,
    keywords: String,
    socials: String,
}

impl SerializedLists {
    fn from_planet(planet: &Planet) -> RepoResult<Self> {
        Ok(Self {
            notes: to_json_text(&planet.notes, "planets.notes")?,
            keywords: to_json_text(&normalize_keywords(&planet.keywords), "planets.keywords")?,
            socials: to_json_text(&planet.socials, "planets.socials")?,
        })
    }
}
