//! Group repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide persistence APIs for galaxies and systems.
//! - Own cascade-delete semantics for the two-level hierarchy.
//!
//! # Invariants
//! - Group listing is deterministic: `name ASC, id ASC`.
//! - Deleting a group only severs `planet_groups` links; planets survive.
//! - Deleting a galaxy also deletes its child systems in the same transaction.
//! - Reads skip rows that cannot form a valid `Group` and log a `warn`.

use super::mapper::{parse_group_row, GROUP_COLUMNS};
use super::{ensure_table_columns, RepoError, RepoResult};
use crate::db::{execute, query_all, query_count, transaction};
use crate::model::group::{Group, GroupId};
use crate::model::now_ms;
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension, Params};
use serde::Serialize;

/// Read-only preview of what deleting a galaxy would remove.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GalaxyDeleteSummary {
    /// Child systems that would be deleted.
    pub systems: u64,
    /// Link rows pointing at the galaxy or any child system.
    pub links: u64,
}

/// Repository interface for group operations.
pub trait GroupRepository {
    /// Inserts one group row.
    fn create_group(&self, group: &Group) -> RepoResult<()>;
    /// Loads one group by id.
    fn get_group(&self, id: &str) -> RepoResult<Option<Group>>;
    /// Lists all groups ordered by name.
    fn list_groups(&self) -> RepoResult<Vec<Group>>;
    /// Lists systems whose parent is `galaxy_id`, ordered by name.
    fn list_child_systems(&self, galaxy_id: &str) -> RepoResult<Vec<Group>>;
    /// Renames one group. Returns whether a row changed.
    fn rename_group(&self, id: &str, name: &str) -> RepoResult<bool>;
    /// Replaces color/icon of one group. Returns whether a row changed.
    fn update_group_style(
        &self,
        id: &str,
        color: Option<&str>,
        icon: Option<&str>,
    ) -> RepoResult<bool>;
    /// Deletes one group with cascade by kind. Returns whether it existed.
    fn delete_group(&self, id: &str) -> RepoResult<bool>;
    /// Counts what `delete_group(galaxy_id)` would remove.
    fn galaxy_delete_summary(&self, galaxy_id: &str) -> RepoResult<GalaxyDeleteSummary>;
    /// Lists groups linked to one planet, galaxies first then by name.
    fn groups_by_planet(&self, planet_id: &str) -> RepoResult<Vec<Group>>;
    /// Lists groups whose name contains the `LIKE` pattern.
    fn search_groups(&self, pattern: &str) -> RepoResult<Vec<Group>>;
}

/// SQLite-backed group repository.
pub struct SqliteGroupRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGroupRepository<'conn> {
    /// Creates repository from a connection with the schema ensured.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_columns(
            conn,
            "groups",
            &[
                "id",
                "name",
                "type",
                "parentId",
                "color",
                "icon",
                "createdAt",
                "updatedAt",
            ],
        )?;
        ensure_table_columns(conn, "planet_groups", &["planetId", "groupId"])?;
        Ok(Self { conn })
    }
}

impl GroupRepository for SqliteGroupRepository<'_> {
    fn create_group(&self, group: &Group) -> RepoResult<()> {
        group.validate()?;
        execute(
            self.conn,
            "INSERT INTO groups (id, name, type, parentId, color, icon, createdAt, updatedAt)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                group.id,
                group.name,
                group.kind.as_str(),
                group.parent_id(),
                group.color,
                group.icon,
                group.created_at,
                group.updated_at,
            ],
        )?;
        Ok(())
    }

    fn get_group(&self, id: &str) -> RepoResult<Option<Group>> {
        let mut groups = query_groups(
            self.conn,
            &format!("SELECT {GROUP_COLUMNS} FROM groups g WHERE g.id = ?1;"),
            [id],
        )?;
        Ok(groups.pop())
    }

    fn list_groups(&self) -> RepoResult<Vec<Group>> {
        query_groups(
            self.conn,
            &format!("SELECT {GROUP_COLUMNS} FROM groups g ORDER BY g.name ASC, g.id ASC;"),
            [],
        )
    }

    fn list_child_systems(&self, galaxy_id: &str) -> RepoResult<Vec<Group>> {
        query_groups(
            self.conn,
            &format!(
                "SELECT {GROUP_COLUMNS}
                 FROM groups g
                 WHERE g.parentId = ?1
                   AND g.type = 'system'
                 ORDER BY g.name ASC, g.id ASC;"
            ),
            [galaxy_id],
        )
    }

    fn rename_group(&self, id: &str, name: &str) -> RepoResult<bool> {
        let changed = execute(
            self.conn,
            "UPDATE groups SET name = ?2, updatedAt = ?3 WHERE id = ?1;",
            params![id, name, now_ms()],
        )?;
        Ok(changed > 0)
    }

    fn update_group_style(
        &self,
        id: &str,
        color: Option<&str>,
        icon: Option<&str>,
    ) -> RepoResult<bool> {
        let changed = execute(
            self.conn,
            "UPDATE groups SET color = ?2, icon = ?3, updatedAt = ?4 WHERE id = ?1;",
            params![id, color, icon, now_ms()],
        )?;
        Ok(changed > 0)
    }

    fn delete_group(&self, id: &str) -> RepoResult<bool> {
        transaction(self.conn, |tx| -> RepoResult<bool> {
            let kind: Option<String> = tx
                .query_row("SELECT type FROM groups WHERE id = ?1;", [id], |row| {
                    row.get(0)
                })
                .optional()?;

            match kind.as_deref() {
                None => Ok(false),
                Some("galaxy") => {
                    let links = execute(
                        tx,
                        "DELETE FROM planet_groups
                         WHERE groupId = ?1
                            OR groupId IN (
                                SELECT id FROM groups WHERE parentId = ?1 AND type = 'system'
                            );",
                        [id],
                    )?;
                    let systems = execute(
                        tx,
                        "DELETE FROM groups WHERE parentId = ?1 AND type = 'system';",
                        [id],
                    )?;
                    execute(tx, "DELETE FROM groups WHERE id = ?1;", [id])?;
                    info!(
                        "event=group_delete module=repo status=ok kind=galaxy systems={systems} links={links}"
                    );
                    Ok(true)
                }
                Some(_) => {
                    let links = execute(tx, "DELETE FROM planet_groups WHERE groupId = ?1;", [id])?;
                    execute(tx, "DELETE FROM groups WHERE id = ?1;", [id])?;
                    info!(
                        "event=group_delete module=repo status=ok kind=system systems=0 links={links}"
                    );
                    Ok(true)
                }
            }
        })
    }

    fn galaxy_delete_summary(&self, galaxy_id: &str) -> RepoResult<GalaxyDeleteSummary> {
        let systems = query_count(
            self.conn,
            "SELECT COUNT(*) FROM groups WHERE parentId = ?1 AND type = 'system';",
            [galaxy_id],
        )?;
        let links = query_count(
            self.conn,
            "SELECT COUNT(*)
             FROM planet_groups
             WHERE groupId = ?1
                OR groupId IN (
                    SELECT id FROM groups WHERE parentId = ?1 AND type = 'system'
                );",
            [galaxy_id],
        )?;
        Ok(GalaxyDeleteSummary {
            systems: systems.max(0) as u64,
            links: links.max(0) as u64,
        })
    }

    fn groups_by_planet(&self, planet_id: &str) -> RepoResult<Vec<Group>> {
        query_groups(
            self.conn,
            &format!(
                "SELECT {GROUP_COLUMNS}
                 FROM groups g
                 INNER JOIN planet_groups pg ON pg.groupId = g.id
                 WHERE pg.planetId = ?1
                 ORDER BY g.type ASC, g.name ASC, g.id ASC;"
            ),
            [planet_id],
        )
    }

    fn search_groups(&self, pattern: &str) -> RepoResult<Vec<Group>> {
        query_groups(
            self.conn,
            &format!(
                "SELECT {GROUP_COLUMNS}
                 FROM groups g
                 WHERE LOWER(g.name) LIKE ?1 ESCAPE '\\'
                 ORDER BY g.name ASC, g.id ASC;"
            ),
            [pattern],
        )
    }
}

/// Convenience for callers that only need ids of a galaxy's systems.
pub fn child_system_ids(conn: &Connection, galaxy_id: &str) -> RepoResult<Vec<GroupId>> {
    query_all(
        conn,
        "SELECT id FROM groups WHERE parentId = ?1 AND type = 'system' ORDER BY id ASC;",
        [galaxy_id],
        |row| -> RepoResult<GroupId> { Ok(row.get(0)?) },
    )
}

/// Runs a `groups` query, skipping rows that cannot form a valid `Group`
/// (e.g. a legacy system row without `parentId`).
fn query_groups<P: Params>(conn: &Connection, sql: &str, params: P) -> RepoResult<Vec<Group>> {
    let rows = query_all(conn, sql, params, |row| -> RepoResult<Option<Group>> {
        match parse_group_row(row) {
            Ok(group) => Ok(Some(group)),
            Err(RepoError::InvalidData(reason)) => {
                warn!("event=group_row_skipped module=repo status=degraded reason={reason}");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    })?;
    Ok(rows.into_iter().flatten().collect())
}
