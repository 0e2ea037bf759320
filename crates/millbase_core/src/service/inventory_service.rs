//! Locality/area inventory service.
//!
//! # Responsibility
//! - Enforce the hierarchy invariants above the generic engine: parent
//!   resolution, scoped name uniqueness, cascade deletion.
//! - Delegate everything the hierarchy cannot affect (status flips,
//!   reads) to the engine unchanged.
//!
//! # Invariants
//! - An area's name is unique among its siblings only; two localities may
//!   both own an "Almacen".
//! - Update payloads never re-parent an area, whatever locality they name.
//! - Deactivating a locality leaves its areas' status untouched; deleting
//!   a locality removes every area it owns.

use crate::model::entity::{names_equal_fold, EntityDraft, ValidationError};
use crate::model::locality::{
    Area, AreaDraft, AreaId, AreaSeed, Locality, LocalityDraft, LocalityId,
};
use crate::repo::inventory_repo::{AreaRepository, LocalityRepository};
use crate::repo::RepoError;
use crate::service::lifecycle::{LifecycleError, LifecycleService};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from inventory operations.
#[derive(Debug)]
pub enum InventoryError {
    /// Draft attributes failed validation; nothing was written.
    Validation(ValidationError),
    /// The referenced locality does not exist. Distinct from
    /// [`InventoryError::AreaNotFound`] so callers can tell which side of
    /// the relationship failed.
    LocalityNotFound(LocalityId),
    /// The target area does not exist.
    AreaNotFound(AreaId),
    /// A locality with this name already exists (names are global for
    /// localities, case-insensitive).
    DuplicateLocalityName(String),
    /// An area with this name already exists under the same locality.
    DuplicateAreaName {
        name: String,
        locality_uuid: LocalityId,
    },
    /// Two inline seed areas in one creation payload share a name.
    DuplicateSeedArea(String),
    /// Store-level failure unrelated to the business rule.
    Repo(RepoError),
}

impl Display for InventoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::LocalityNotFound(id) => write!(f, "locality not found: {id}"),
            Self::AreaNotFound(id) => write!(f, "area not found: {id}"),
            Self::DuplicateLocalityName(name) => {
                write!(f, "a locality named `{name}` already exists")
            }
            Self::DuplicateAreaName {
                name,
                locality_uuid,
            } => write!(
                f,
                "an area named `{name}` already exists in locality {locality_uuid}"
            ),
            Self::DuplicateSeedArea(name) => {
                write!(f, "payload contains duplicate area name `{name}`")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for InventoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for InventoryError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type InventoryResult<T> = Result<T, InventoryError>;

/// Inventory service for the locality/area pair.
///
/// Wraps the engine's `create`/`update` with the hierarchy checks and
/// exposes the rest of the lifecycle untouched.
pub struct InventoryService<L: LocalityRepository, A: AreaRepository> {
    localities: LifecycleService<L>,
    areas: LifecycleService<A>,
}

impl<L: LocalityRepository, A: AreaRepository> InventoryService<L, A> {
    /// Creates the service from the two repository implementations.
    pub fn new(locality_repo: L, area_repo: A) -> Self {
        Self {
            localities: LifecycleService::new(locality_repo),
            areas: LifecycleService::new(area_repo),
        }
    }

    // --- localities -----------------------------------------------------

    /// Creates one locality, optionally together with seed areas.
    ///
    /// The locality name must be free globally; seed names must be free of
    /// duplicates among themselves. Locality and seeds persist atomically.
    pub fn create_locality(&self, draft: &LocalityDraft) -> InventoryResult<Locality> {
        draft.validate().map_err(InventoryError::Validation)?;

        if self.localities.repository().exists_by_name(&draft.name)? {
            return Err(InventoryError::DuplicateLocalityName(
                draft.name.trim().to_string(),
            ));
        }
        if let Some(name) = first_duplicate_seed(&draft.areas) {
            return Err(InventoryError::DuplicateSeedArea(name));
        }

        let locality = self
            .localities
            .create(draft)
            .map_err(|err| map_locality_err(err, None))?;
        info!(
            "event=locality_create module=inventory id={} areas={} status=ok",
            locality.uuid,
            locality.areas().len()
        );
        Ok(locality)
    }

    /// Full-replace update of one locality; the child set is untouched.
    pub fn update_locality(
        &self,
        id: LocalityId,
        draft: &LocalityDraft,
    ) -> InventoryResult<Locality> {
        draft.validate().map_err(InventoryError::Validation)?;

        let current = self
            .localities
            .get_by_id(id)
            .map_err(|err| map_locality_err(err, Some(id)))?;

        if !names_equal_fold(&current.name, &draft.name)
            && self.localities.repository().exists_by_name(&draft.name)?
        {
            return Err(InventoryError::DuplicateLocalityName(
                draft.name.trim().to_string(),
            ));
        }

        self.localities
            .update(id, draft)
            .map_err(|err| map_locality_err(err, Some(id)))
    }

    /// Loads one locality without its areas.
    pub fn get_locality(&self, id: LocalityId) -> InventoryResult<Locality> {
        self.localities
            .get_by_id(id)
            .map_err(|err| map_locality_err(err, Some(id)))
    }

    /// Loads one locality together with its areas.
    ///
    /// Every area whose back-reference names this locality is reachable
    /// from the returned record's child list.
    pub fn get_locality_with_areas(&self, id: LocalityId) -> InventoryResult<Locality> {
        self.localities
            .repository()
            .find_with_areas(id)?
            .ok_or(InventoryError::LocalityNotFound(id))
    }

    pub fn list_localities(&self) -> InventoryResult<Vec<Locality>> {
        self.localities
            .list_all()
            .map_err(|err| map_locality_err(err, None))
    }

    pub fn list_active_localities(&self) -> InventoryResult<Vec<Locality>> {
        self.localities
            .list_active()
            .map_err(|err| map_locality_err(err, None))
    }

    pub fn list_localities_page(
        &self,
        limit: Option<u32>,
        offset: u32,
    ) -> InventoryResult<Vec<Locality>> {
        self.localities
            .list_page(limit, offset)
            .map_err(|err| map_locality_err(err, None))
    }

    pub fn search_localities(&self, fragment: &str) -> InventoryResult<Vec<Locality>> {
        self.localities
            .search_by_name(fragment)
            .map_err(|err| map_locality_err(err, None))
    }

    pub fn activate_locality(&self, id: LocalityId) -> InventoryResult<Locality> {
        self.localities
            .activate(id)
            .map_err(|err| map_locality_err(err, Some(id)))
    }

    /// Deactivates one locality. Its areas keep their own status.
    pub fn deactivate_locality(&self, id: LocalityId) -> InventoryResult<Locality> {
        self.localities
            .deactivate(id)
            .map_err(|err| map_locality_err(err, Some(id)))
    }

    /// User-facing deletion: deactivation. Areas survive untouched.
    pub fn soft_delete_locality(&self, id: LocalityId) -> InventoryResult<()> {
        self.localities
            .soft_delete(id)
            .map_err(|err| map_locality_err(err, Some(id)))
    }

    /// Hard-deletes one locality and every area it owns.
    ///
    /// The one genuinely cascading operation: an orphaned area must never
    /// be observable, so children and parent go in one transaction.
    pub fn delete_locality(&self, id: LocalityId) -> InventoryResult<()> {
        self.localities
            .repository()
            .delete_with_areas(id)
            .map_err(|err| match err {
                RepoError::NotFound { .. } => InventoryError::LocalityNotFound(id),
                other => InventoryError::Repo(other),
            })?;
        info!("event=locality_cascade_delete module=inventory id={id} status=ok");
        Ok(())
    }

    // --- areas ----------------------------------------------------------

    /// Creates one area under the locality named by the draft.
    ///
    /// The name must be free among that locality's areas (any case). The
    /// store's scoped unique index backs the pre-check under races.
    pub fn create_area(&self, draft: &AreaDraft) -> InventoryResult<Area> {
        draft.validate().map_err(InventoryError::Validation)?;

        if !self
            .localities
            .repository()
            .exists_by_id(draft.locality_uuid)?
        {
            return Err(InventoryError::LocalityNotFound(draft.locality_uuid));
        }
        if self
            .areas
            .repository()
            .exists_by_name_in_locality(&draft.name, draft.locality_uuid)?
        {
            return Err(InventoryError::DuplicateAreaName {
                name: draft.name.trim().to_string(),
                locality_uuid: draft.locality_uuid,
            });
        }

        let area = self
            .areas
            .create(draft)
            .map_err(|err| map_area_err(err, None, Some(draft.locality_uuid)))?;
        info!(
            "event=area_create module=inventory id={} locality={} status=ok",
            area.uuid,
            area.locality_uuid()
        );
        Ok(area)
    }

    /// Full-replace update of one area.
    ///
    /// The draft's `locality_uuid` is ignored: the parent reference is
    /// immutable, and a generic update must not re-parent silently. The
    /// scoped uniqueness re-check runs only when the name changed
    /// case-insensitively, against the area's current locality.
    pub fn update_area(&self, id: AreaId, draft: &AreaDraft) -> InventoryResult<Area> {
        draft.validate().map_err(InventoryError::Validation)?;

        let current = self
            .areas
            .get_by_id(id)
            .map_err(|err| map_area_err(err, Some(id), None))?;
        let locality_uuid = current.locality_uuid();

        if !names_equal_fold(&current.name, &draft.name)
            && self
                .areas
                .repository()
                .exists_by_name_in_locality(&draft.name, locality_uuid)?
        {
            return Err(InventoryError::DuplicateAreaName {
                name: draft.name.trim().to_string(),
                locality_uuid,
            });
        }

        self.areas
            .update(id, draft)
            .map_err(|err| map_area_err(err, Some(id), Some(locality_uuid)))
    }

    pub fn get_area(&self, id: AreaId) -> InventoryResult<Area> {
        self.areas
            .get_by_id(id)
            .map_err(|err| map_area_err(err, Some(id), None))
    }

    pub fn list_areas(&self) -> InventoryResult<Vec<Area>> {
        self.areas.list_all().map_err(|err| map_area_err(err, None, None))
    }

    pub fn list_active_areas(&self) -> InventoryResult<Vec<Area>> {
        self.areas
            .list_active()
            .map_err(|err| map_area_err(err, None, None))
    }

    pub fn list_areas_page(&self, limit: Option<u32>, offset: u32) -> InventoryResult<Vec<Area>> {
        self.areas
            .list_page(limit, offset)
            .map_err(|err| map_area_err(err, None, None))
    }

    pub fn search_areas(&self, fragment: &str) -> InventoryResult<Vec<Area>> {
        self.areas
            .search_by_name(fragment)
            .map_err(|err| map_area_err(err, None, None))
    }

    /// Lists the areas owned by one locality.
    pub fn list_areas_of(&self, locality_uuid: LocalityId) -> InventoryResult<Vec<Area>> {
        if !self.localities.repository().exists_by_id(locality_uuid)? {
            return Err(InventoryError::LocalityNotFound(locality_uuid));
        }
        Ok(self.areas.repository().find_by_locality(locality_uuid)?)
    }

    /// Counts the areas owned by one locality.
    pub fn count_areas_of(&self, locality_uuid: LocalityId) -> InventoryResult<u64> {
        if !self.localities.repository().exists_by_id(locality_uuid)? {
            return Err(InventoryError::LocalityNotFound(locality_uuid));
        }
        Ok(self.areas.repository().count_by_locality(locality_uuid)?)
    }

    pub fn activate_area(&self, id: AreaId) -> InventoryResult<Area> {
        self.areas
            .activate(id)
            .map_err(|err| map_area_err(err, Some(id), None))
    }

    pub fn deactivate_area(&self, id: AreaId) -> InventoryResult<Area> {
        self.areas
            .deactivate(id)
            .map_err(|err| map_area_err(err, Some(id), None))
    }

    /// User-facing deletion: deactivation.
    pub fn soft_delete_area(&self, id: AreaId) -> InventoryResult<()> {
        self.areas
            .soft_delete(id)
            .map_err(|err| map_area_err(err, Some(id), None))
    }
}

/// First seed name colliding (case-insensitively) with an earlier one.
fn first_duplicate_seed(seeds: &[AreaSeed]) -> Option<String> {
    let mut seen: Vec<String> = Vec::new();
    for seed in seeds {
        let normalized = seed.name.trim().to_lowercase();
        if seen.contains(&normalized) {
            return Some(seed.name.trim().to_string());
        }
        seen.push(normalized);
    }
    None
}

fn map_locality_err(err: LifecycleError, id: Option<LocalityId>) -> InventoryError {
    match err {
        LifecycleError::Validation(inner) => InventoryError::Validation(inner),
        LifecycleError::NotFound { kind, id: raw } => match id {
            Some(id) => InventoryError::LocalityNotFound(id),
            None => InventoryError::Repo(RepoError::NotFound { kind, id: raw }),
        },
        LifecycleError::DuplicateName { name, .. } => InventoryError::DuplicateLocalityName(name),
        LifecycleError::Repo(inner) => InventoryError::Repo(inner),
    }
}

fn map_area_err(
    err: LifecycleError,
    id: Option<AreaId>,
    locality_uuid: Option<LocalityId>,
) -> InventoryError {
    match err {
        LifecycleError::Validation(inner) => InventoryError::Validation(inner),
        LifecycleError::NotFound { kind, id: raw } => match id {
            Some(id) => InventoryError::AreaNotFound(id),
            None => InventoryError::Repo(RepoError::NotFound { kind, id: raw }),
        },
        LifecycleError::DuplicateName { kind, name } => match locality_uuid {
            Some(locality_uuid) => InventoryError::DuplicateAreaName {
                name,
                locality_uuid,
            },
            None => InventoryError::Repo(RepoError::DuplicateName { kind, name }),
        },
        LifecycleError::Repo(inner) => InventoryError::Repo(inner),
    }
}
