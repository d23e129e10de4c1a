//! Row-to-model mappers for derived fields.
//!
//! # Responsibility
//! - Rehydrate JSON-text columns (`notes`, `keywords`, `socials`).
//! - Split `GROUP_CONCAT` link aggregates into id lists.
//! - Translate flat `(type, parentId)` group rows into `GroupKind`.
//!
//! # Invariants
//! - JSON-text parsing never fails: NULL or malformed text becomes an empty
//!   list and a `warn` event, never an error.
//! - Aggregated id lists are never `None`; no links means an empty list.

use super::{RepoError, RepoResult};
use crate::model::group::{Group, GroupId, GroupKind};
use crate::model::planet::{Planet, PlanetView};
use log::warn;
use rusqlite::Row;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Column list for `groups` rows, aliased for use behind `FROM groups g`.
pub(crate) const GROUP_COLUMNS: &str = "g.id AS id,
    g.name AS name,
    g.type AS type,
    g.parentId AS parentId,
    g.color AS color,
    g.icon AS icon,
    g.createdAt AS createdAt,
    g.updatedAt AS updatedAt";

/// Column list for `planets` rows plus the link aggregate, aliased for use
/// behind `FROM planets p`.
pub(crate) const PLANET_VIEW_COLUMNS: &str = "p.id AS id,
    p.fullName AS fullName,
    p.jobTitle AS jobTitle,
    p.company AS company,
    p.phone AS phone,
    p.email AS email,
    p.howWeMet AS howWeMet,
    p.commonGround AS commonGround,
    p.notes AS notes,
    p.keywords AS keywords,
    p.socials AS socials,
    p.emoji AS emoji,
    p.createdAt AS createdAt,
    p.updatedAt AS updatedAt,
    (SELECT GROUP_CONCAT(pg2.groupId, ',')
       FROM planet_groups pg2
      WHERE pg2.planetId = p.id) AS groupIdsCsv";

/// Parses a JSON-text list column, degrading instead of failing.
///
/// NULL, blank, malformed or non-array text becomes an empty list. Inside a
/// valid array, elements of the wrong shape are dropped one by one.
pub fn parse_json_list<T: DeserializeOwned>(raw: Option<&str>, column: &'static str) -> Vec<T> {
    let Some(text) = raw else {
        return Vec::new();
    };
    if text.trim().is_empty() {
        return Vec::new();
    }
    let elements = match serde_json::from_str::<Vec<Value>>(text) {
        Ok(elements) => elements,
        Err(err) => {
            // Metadata only: the column value itself is user content.
            warn!(
                "event=json_fallback module=repo status=degraded column={} len={} error_line={} error_column={}",
                column,
                text.len(),
                err.line(),
                err.column()
            );
            return Vec::new();
        }
    };

    let total = elements.len();
    let items: Vec<T> = elements
        .into_iter()
        .filter_map(|element| serde_json::from_value(element).ok())
        .collect();
    if items.len() < total {
        warn!(
            "event=json_fallback module=repo status=partial column={} dropped={} kept={}",
            column,
            total - items.len(),
            items.len()
        );
    }
    items
}

/// Serializes a list for a JSON-text column.
pub fn to_json_text<T: Serialize>(items: &[T], column: &'static str) -> RepoResult<String> {
    serde_json::to_string(items)
        .map_err(|err| RepoError::InvalidData(format!("cannot serialize {column}: {err}")))
}

/// Splits a comma-joined id aggregate into a sorted, de-duplicated list.
pub fn parse_group_ids_csv(raw: Option<&str>) -> Vec<GroupId> {
    let mut ids = raw
        .unwrap_or_default()
        .split(',')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();
    ids.sort();
    ids.dedup();
    ids
}

/// Maps one `groups` row into the tagged domain shape.
pub fn parse_group_row(row: &Row<'_>) -> RepoResult<Group> {
    let id: String = row.get("id")?;
    let type_text: String = row.get("type")?;
    let parent_id: Option<String> = row.get("parentId")?;

    let kind = match (type_text.as_str(), parent_id) {
        ("galaxy", _) => GroupKind::Galaxy,
        ("system", Some(parent_id)) => GroupKind::System { parent_id },
        ("system", None) => {
            return Err(RepoError::InvalidData(format!(
                "system group `{id}` has no parentId"
            )));
        }
        (other, _) => {
            return Err(RepoError::InvalidData(format!(
                "invalid group type `{other}` in groups.type"
            )));
        }
    };

    Ok(Group {
        id,
        name: row.get("name")?,
        kind,
        color: row.get("color")?,
        icon: row.get("icon")?,
        created_at: row.get("createdAt")?,
        updated_at: row.get("updatedAt")?,
    })
}

/// Maps one `planets` row (without link aggregate).
pub fn parse_planet_row(row: &Row<'_>) -> RepoResult<Planet> {
    let notes: Option<String> = row.get("notes")?;
    let keywords: Option<String> = row.get("keywords")?;
    let socials: Option<String> = row.get("socials")?;

    Ok(Planet {
        id: row.get("id")?,
        full_name: row.get("fullName")?,
        job_title: row.get("jobTitle")?,
        company: row.get("company")?,
        phone: row.get("phone")?,
        email: row.get("email")?,
        how_we_met: row.get("howWeMet")?,
        common_ground: row.get("commonGround")?,
        notes: parse_json_list(notes.as_deref(), "planets.notes"),
        keywords: parse_json_list(keywords.as_deref(), "planets.keywords"),
        socials: parse_json_list(socials.as_deref(), "planets.socials"),
        emoji: row.get("emoji")?,
        created_at: row.get("createdAt")?,
        updated_at: row.get("updatedAt")?,
    })
}

/// Maps one row selected with `PLANET_VIEW_COLUMNS`.
pub fn parse_planet_view_row(row: &Row<'_>) -> RepoResult<PlanetView> {
    let planet = parse_planet_row(row)?;
    let csv: Option<String> = row.get("groupIdsCsv")?;
    Ok(PlanetView {
        planet,
        group_ids: parse_group_ids_csv(csv.as_deref()),
    })
}
