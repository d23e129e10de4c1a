//! Group domain model.
//!
//! # Responsibility
//! - Represent galaxies (top level) and systems (nested under a galaxy).
//!
//! # Invariants
//! - A galaxy never carries a parent reference.
//! - A system always carries exactly one parent reference, which must name a
//!   galaxy. The variant shape guarantees presence; the store checks the
//!   parent's kind before insert.
//! - There is no third level: systems never parent other groups.

use super::{new_id, now_ms, ModelValidationError};
use serde::{Deserialize, Serialize};

/// Stable group identifier.
pub type GroupId = String;

/// Hierarchy position of a group.
///
/// Persisted as the flat pair `(type, parentId)` in one `groups` relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GroupKind {
    /// Top-level group.
    Galaxy,
    /// Second-level group under one galaxy.
    System {
        #[serde(rename = "parentId")]
        parent_id: GroupId,
    },
}

impl GroupKind {
    /// Storage label for the `groups.type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Galaxy => "galaxy",
            Self::System { .. } => "system",
        }
    }

    /// Parent galaxy id for systems, `None` for galaxies.
    pub fn parent_id(&self) -> Option<&str> {
        match self {
            Self::Galaxy => None,
            Self::System { parent_id } => Some(parent_id.as_str()),
        }
    }
}

/// Canonical group record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    #[serde(flatten)]
    pub kind: GroupKind,
    /// Display color, e.g. `#60A5FA`.
    pub color: Option<String>,
    /// Display icon, usually one emoji.
    pub icon: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Group {
    /// Creates a new galaxy with a generated id and current timestamps.
    pub fn galaxy(name: impl Into<String>) -> Self {
        Self::new(GroupKind::Galaxy, name)
    }

    /// Creates a new system under `parent_id`.
    pub fn system(name: impl Into<String>, parent_id: impl Into<GroupId>) -> Self {
        Self::new(
            GroupKind::System {
                parent_id: parent_id.into(),
            },
            name,
        )
    }

    fn new(kind: GroupKind, name: impl Into<String>) -> Self {
        let now = now_ms();
        Self {
            id: new_id(),
            name: name.into(),
            kind,
            color: None,
            icon: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets display style and returns the updated group.
    pub fn with_style(mut self, color: Option<&str>, icon: Option<&str>) -> Self {
        self.color = color.map(str::to_string);
        self.icon = icon.map(str::to_string);
        self
    }

    pub fn is_galaxy(&self) -> bool {
        matches!(self.kind, GroupKind::Galaxy)
    }

    pub fn is_system(&self) -> bool {
        matches!(self.kind, GroupKind::System { .. })
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.kind.parent_id()
    }

    /// Checks record-local invariants.
    ///
    /// Cross-record checks (parent exists and is a galaxy) need storage and
    /// live in the store.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.name.trim().is_empty() {
            return Err(ModelValidationError::EmptyGroupName);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Group, GroupKind};
    use crate::model::ModelValidationError;

    #[test]
    fn galaxy_has_no_parent() {
        let galaxy = Group::galaxy("Work");
        assert!(galaxy.is_galaxy());
        assert_eq!(galaxy.parent_id(), None);
        assert_eq!(galaxy.kind.as_str(), "galaxy");
        assert_eq!(galaxy.created_at, galaxy.updated_at);
    }

    #[test]
    fn system_carries_parent() {
        let galaxy = Group::galaxy("Work");
        let system = Group::system("Design", galaxy.id.clone());
        assert!(system.is_system());
        assert_eq!(system.parent_id(), Some(galaxy.id.as_str()));
        assert_eq!(system.kind.as_str(), "system");
    }

    #[test]
    fn blank_name_is_rejected() {
        let galaxy = Group::galaxy("   ");
        assert_eq!(
            galaxy.validate(),
            Err(ModelValidationError::EmptyGroupName)
        );
    }

    #[test]
    fn serializes_with_flat_type_and_parent_fields() {
        let system = Group::system("Design", "g-1").with_style(Some("#22D3EE"), Some("✨"));
        let json = serde_json::to_value(&system).unwrap();
        assert_eq!(json["type"], "system");
        assert_eq!(json["parentId"], "g-1");
        assert_eq!(json["color"], "#22D3EE");
        assert!(json.get("createdAt").is_some());

        let decoded: Group = serde_json::from_value(json).unwrap();
        assert_eq!(
            decoded.kind,
            GroupKind::System {
                parent_id: "g-1".to_string()
            }
        );
    }
}
