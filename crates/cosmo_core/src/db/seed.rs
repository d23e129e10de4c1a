//! One-time demo data for an empty store.
//!
//! # Invariants
//! - Seeding runs only when `groups` has no rows.
//! - The whole dataset is written in one transaction.
//! - Callers sequence seeding before any other write; it takes no lock.

use super::backend::{execute, query_count, transaction};
use super::DbResult;
use crate::model::group::Group;
use crate::model::planet::{Planet, SocialLink};
use log::info;
use rusqlite::{params, Connection};

/// What `seed_if_empty` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Store already had groups; nothing was written.
    Skipped,
    /// Demo dataset was inserted.
    Seeded,
}

/// Inserts two galaxies, one nested system and one linked contact when the
/// store has no groups yet.
pub fn seed_if_empty(conn: &Connection) -> DbResult<SeedOutcome> {
    let count = query_count(conn, "SELECT COUNT(*) FROM groups;", [])?;
    if count > 0 {
        return Ok(SeedOutcome::Skipped);
    }

    let work = Group::galaxy("Trabajo").with_style(Some("#60A5FA"), Some("🛰️"));
    let university = Group::galaxy("Universidad Panamá").with_style(Some("#A78BFA"), Some("📚"));
    let design = Group::system("Diseño", university.id.clone())
        .with_style(Some("#22D3EE"), Some("✨"));

    let mut contact = Planet::new("Mariana López");
    contact.company = Some("Acme".to_string());
    contact.job_title = Some("UI Designer".to_string());
    contact.how_we_met = Some("Evento de diseño 2024".to_string());
    contact.common_ground = Some("Interés por tipografía".to_string());
    contact.notes = vec!["Le gusta la foto analógica".to_string()];
    contact.keywords = vec!["diseño".to_string(), "figma".to_string()];
    contact.socials = vec![SocialLink::new("linkedin", "https://linkedin.com/in/demo")];

    transaction(conn, |tx| -> DbResult<()> {
        for group in [&work, &university, &design] {
            execute(
                tx,
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
        }

        execute(
            tx,
            "INSERT INTO planets (
                id, fullName, jobTitle, company, phone, email, howWeMet, commonGround,
                notes, keywords, socials, emoji, createdAt, updatedAt
             ) VALUES (?1, ?2, ?3, ?4, NULL, NULL, ?5, ?6, ?7, ?8, ?9, NULL, ?10, ?11);",
            params![
                contact.id,
                contact.full_name,
                contact.job_title,
                contact.company,
                contact.how_we_met,
                contact.common_ground,
                json_text(&contact.notes),
                json_text(&contact.keywords),
                json_text(&contact.socials),
                contact.created_at,
                contact.updated_at,
            ],
        )?;

        for group in [&university, &design] {
            execute(
                tx,
                "INSERT OR IGNORE INTO planet_groups (planetId, groupId) VALUES (?1, ?2);",
                params![contact.id, group.id],
            )?;
        }
        Ok(())
    })?;

    info!("event=seed module=db status=ok groups=3 planets=1 links=2");
    Ok(SeedOutcome::Seeded)
}

fn json_text<T: serde::Serialize>(items: &[T]) -> String {
    // Plain strings and string pairs always serialize.
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::{seed_if_empty, SeedOutcome};
    use crate::db::{open_db_in_memory, query_count};

    #[test]
    fn seeds_once_then_skips() {
        let conn = open_db_in_memory().unwrap();

        assert_eq!(seed_if_empty(&conn).unwrap(), SeedOutcome::Seeded);
        assert_eq!(seed_if_empty(&conn).unwrap(), SeedOutcome::Skipped);

        assert_eq!(query_count(&conn, "SELECT COUNT(*) FROM groups;", []).unwrap(), 3);
        assert_eq!(query_count(&conn, "SELECT COUNT(*) FROM planets;", []).unwrap(), 1);
        assert_eq!(
            query_count(&conn, "SELECT COUNT(*) FROM planet_groups;", []).unwrap(),
            2
        );
    }

    #[test]
    fn skips_when_any_group_exists() {
        let conn = open_db_in_memory().unwrap();
        conn.execute(
            "INSERT INTO groups (id, name, type, parentId, createdAt, updatedAt)
             VALUES ('g', 'Mine', 'galaxy', NULL, 1, 1);",
            [],
        )
        .unwrap();

        assert_eq!(seed_if_empty(&conn).unwrap(), SeedOutcome::Skipped);
        assert_eq!(query_count(&conn, "SELECT COUNT(*) FROM planets;", []).unwrap(), 0);
    }
}
