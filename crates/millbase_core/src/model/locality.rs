//! Locality/area hierarchy records.
//!
//! # Responsibility
//! - Define the parent/child pair managed by the inventory service.
//! - Keep both sides of the association consistent through one helper.
//!
//! # Invariants
//! - An area belongs to exactly one locality; the reference is immutable
//!   after creation (there is no re-parent operation).
//! - `Locality::areas` and `Area::locality_uuid` only ever change together
//!   through `attach_area`/`detach_area`.

use crate::model::entity::{check_name, EntityDraft, StatusEntity, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a locality.
pub type LocalityId = Uuid;
/// Stable identifier for an area.
pub type AreaId = Uuid;

/// Geographic locality; owns a set of areas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locality {
    /// Store-assigned stable id.
    pub uuid: LocalityId,
    /// Identifying name, unique across all localities (case-insensitive).
    pub name: String,
    /// Active flag; soft delete flips this off.
    pub active: bool,
    /// Owned children. Empty unless loaded through the with-areas path.
    pub(crate) areas: Vec<Area>,
    /// Epoch ms creation timestamp, store-maintained.
    pub created_at: i64,
    /// Epoch ms update timestamp, store-maintained.
    pub updated_at: i64,
}

impl Locality {
    /// Child areas loaded with this record.
    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    /// Attaches `area` to this locality, rewriting its back-reference.
    ///
    /// This is the only code path that adds to the child list; collection
    /// and back-reference can never disagree.
    pub fn attach_area(&mut self, mut area: Area) {
        area.locality_uuid = self.uuid;
        self.areas.push(area);
    }

    /// Detaches the child with `area_uuid`, returning it if present.
    pub fn detach_area(&mut self, area_uuid: AreaId) -> Option<Area> {
        let index = self.areas.iter().position(|area| area.uuid == area_uuid)?;
        Some(self.areas.remove(index))
    }
}

impl StatusEntity for Locality {
    type Id = LocalityId;
    type Draft = LocalityDraft;

    const KIND: &'static str = "locality";

    fn id(&self) -> LocalityId {
        self.uuid
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn apply(&mut self, draft: &LocalityDraft) {
        self.name = draft.name.trim().to_string();
        if let Some(active) = draft.active {
            self.active = active;
        }
        // Seed areas are honored at creation only; updates never touch the
        // child set.
    }
}

/// Area inside one locality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    /// Store-assigned stable id.
    pub uuid: AreaId,
    /// Owning locality. Immutable outside `attach_area`.
    pub(crate) locality_uuid: LocalityId,
    /// Identifying name, unique among siblings (case-insensitive).
    pub name: String,
    /// Active flag; soft delete flips this off.
    pub active: bool,
    /// Epoch ms creation timestamp, store-maintained.
    pub created_at: i64,
    /// Epoch ms update timestamp, store-maintained.
    pub updated_at: i64,
}

impl Area {
    /// Owning locality id.
    pub fn locality_uuid(&self) -> LocalityId {
        self.locality_uuid
    }
}

impl StatusEntity for Area {
    type Id = AreaId;
    type Draft = AreaDraft;

    const KIND: &'static str = "area";

    fn id(&self) -> AreaId {
        self.uuid
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn apply(&mut self, draft: &AreaDraft) {
        // The draft's locality_uuid is deliberately not read here: the
        // parent reference is immutable through generic updates.
        self.name = draft.name.trim().to_string();
        if let Some(active) = draft.active {
            self.active = active;
        }
    }
}

/// Creation/update payload for localities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalityDraft {
    pub name: String,
    /// `None` keeps the stored flag (defaults to active on creation).
    pub active: Option<bool>,
    /// Areas created together with the locality. Ignored on update.
    pub areas: Vec<AreaSeed>,
}

impl LocalityDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: None,
            areas: Vec::new(),
        }
    }

    pub fn with_areas(name: impl Into<String>, areas: Vec<AreaSeed>) -> Self {
        Self {
            name: name.into(),
            active: None,
            areas,
        }
    }
}

impl EntityDraft for LocalityDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        check_name(&self.name, "name")?;
        for seed in &self.areas {
            check_name(&seed.name, "areas.name")?;
        }
        Ok(())
    }
}

/// Area attributes supplied inline with a locality creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaSeed {
    pub name: String,
    pub active: Option<bool>,
}

impl AreaSeed {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: None,
        }
    }
}

/// Creation/update payload for areas.
///
/// `locality_uuid` selects the parent at creation time. On update it is
/// ignored: a payload naming a different locality must not re-parent the
/// area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaDraft {
    pub locality_uuid: LocalityId,
    pub name: String,
    /// `None` keeps the stored flag (defaults to active on creation).
    pub active: Option<bool>,
}

impl AreaDraft {
    pub fn new(locality_uuid: LocalityId, name: impl Into<String>) -> Self {
        Self {
            locality_uuid,
            name: name.into(),
            active: None,
        }
    }
}

impl EntityDraft for AreaDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        check_name(&self.name, "name")
    }
}
