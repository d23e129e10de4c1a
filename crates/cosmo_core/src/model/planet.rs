//! Planet (contact) domain model.
//!
//! # Responsibility
//! - Define the contact record and its structured list fields.
//! - Provide the read model annotated with linked group ids.
//!
//! # Invariants
//! - `full_name` is never blank for persisted planets.
//! - `keywords` behave as a set: trimmed, non-empty, first occurrence wins.
//! - A planet's identity is independent of the group hierarchy.

use super::group::GroupId;
use super::{new_id, now_ms, ModelValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Stable planet identifier.
pub type PlanetId = String;

/// One social profile link, e.g. `{type: "linkedin", url: "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

impl SocialLink {
    pub fn new(kind: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            url: url.into(),
        }
    }
}

/// Canonical contact record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Planet {
    pub id: PlanetId,
    pub full_name: String,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub how_we_met: Option<String>,
    pub common_ground: Option<String>,
    /// Ordered free-form notes.
    #[serde(default)]
    pub notes: Vec<String>,
    /// Set-like tags.
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub socials: Vec<SocialLink>,
    pub emoji: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Planet {
    /// Creates a new planet with a generated id and current timestamps.
    pub fn new(full_name: impl Into<String>) -> Self {
        Self::with_id(new_id(), full_name)
    }

    /// Creates a planet with a caller-provided id.
    pub fn with_id(id: impl Into<PlanetId>, full_name: impl Into<String>) -> Self {
        let now = now_ms();
        Self {
            id: id.into(),
            full_name: full_name.into(),
            job_title: None,
            company: None,
            phone: None,
            email: None,
            how_we_met: None,
            common_ground: None,
            notes: Vec::new(),
            keywords: Vec::new(),
            socials: Vec::new(),
            emoji: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validates write-time invariants.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.full_name.trim().is_empty() {
            return Err(ModelValidationError::EmptyFullName);
        }
        Ok(())
    }
}

/// Planet read model annotated with every group it is linked to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanetView {
    #[serde(flatten)]
    pub planet: Planet,
    /// All linked group ids, across every membership. Empty when unlinked.
    pub group_ids: Vec<GroupId>,
}

impl PlanetView {
    pub fn id(&self) -> &str {
        self.planet.id.as_str()
    }

    pub fn is_linked_to(&self, group_id: &str) -> bool {
        self.group_ids.iter().any(|id| id == group_id)
    }
}

/// Trims keywords, drops blanks and removes duplicates keeping first order.
pub fn normalize_keywords(keywords: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    keywords
        .iter()
        .map(|keyword| keyword.trim())
        .filter(|keyword| !keyword.is_empty())
        .filter(|keyword| seen.insert(keyword.to_string()))
        .map(str::to_string)
        .collect()
}
