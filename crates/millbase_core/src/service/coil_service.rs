//! Coil catalog service.
//!
//! # Responsibility
//! - Wrap the generic engine for coils with reference-integrity checks:
//!   every coil names one existing entry per catalog kind.
//! - Keep the coil's measurement fields opaque beyond draft validation.
//!
//! # Invariants
//! - `supplier_code` is globally unique, case-insensitive.
//! - A persisted coil never references a missing catalog entry; the
//!   foreign keys back the service checks under races.

use crate::model::entity::{names_equal_fold, EntityDraft, ValidationError};
use crate::model::product::{CatalogEntryId, CatalogKind, Coil, CoilDraft, CoilId};
use crate::repo::coil_repo::CoilRepository;
use crate::repo::RepoError;
use crate::service::lifecycle::{LifecycleError, LifecycleService};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from coil operations.
#[derive(Debug)]
pub enum CoilError {
    /// Draft attributes failed validation; nothing was written.
    Validation(ValidationError),
    /// The target coil does not exist.
    CoilNotFound(CoilId),
    /// A coil with this supplier code already exists.
    DuplicateSupplierCode(String),
    /// A referenced catalog entry does not exist.
    CatalogRefNotFound {
        kind: CatalogKind,
        entry_uuid: CatalogEntryId,
    },
    /// Store-level failure unrelated to the business rule.
    Repo(RepoError),
}

impl Display for CoilError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::CoilNotFound(id) => write!(f, "coil not found: {id}"),
            Self::DuplicateSupplierCode(code) => {
                write!(f, "a coil with supplier code `{code}` already exists")
            }
            Self::CatalogRefNotFound { kind, entry_uuid } => {
                write!(f, "{kind} entry not found: {entry_uuid}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CoilError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CoilError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type CoilResult<T> = Result<T, CoilError>;

/// Coil service: the generic engine plus reference integrity.
pub struct CoilService<R: CoilRepository> {
    coils: LifecycleService<R>,
}

impl<R: CoilRepository> CoilService<R> {
    /// Creates the service from a repository implementation.
    pub fn new(repo: R) -> Self {
        Self {
            coils: LifecycleService::new(repo),
        }
    }

    /// Creates one coil after checking all five catalog references and
    /// the supplier-code uniqueness.
    pub fn create_coil(&self, draft: &CoilDraft) -> CoilResult<Coil> {
        draft.validate().map_err(CoilError::Validation)?;
        self.check_references(draft, None)?;

        if self
            .coils
            .repository()
            .exists_by_supplier_code(&draft.supplier_code)?
        {
            return Err(CoilError::DuplicateSupplierCode(
                draft.supplier_code.trim().to_string(),
            ));
        }

        let coil = self
            .coils
            .create(draft)
            .map_err(|err| map_coil_err(err, None))?;
        info!(
            "event=coil_create module=products id={} supplier_code={} status=ok",
            coil.uuid, coil.supplier_code
        );
        Ok(coil)
    }

    /// Full-replace update of one coil.
    ///
    /// Changed references are re-checked; the supplier-code uniqueness
    /// re-check runs only when the code changed case-insensitively.
    pub fn update_coil(&self, id: CoilId, draft: &CoilDraft) -> CoilResult<Coil> {
        draft.validate().map_err(CoilError::Validation)?;

        let current = self
            .coils
            .get_by_id(id)
            .map_err(|err| map_coil_err(err, Some(id)))?;

        self.check_references(draft, Some(&current))?;

        if !names_equal_fold(&current.supplier_code, &draft.supplier_code)
            && self
                .coils
                .repository()
                .exists_by_supplier_code(&draft.supplier_code)?
        {
            return Err(CoilError::DuplicateSupplierCode(
                draft.supplier_code.trim().to_string(),
            ));
        }

        self.coils
            .update(id, draft)
            .map_err(|err| map_coil_err(err, Some(id)))
    }

    pub fn get_coil(&self, id: CoilId) -> CoilResult<Coil> {
        self.coils
            .get_by_id(id)
            .map_err(|err| map_coil_err(err, Some(id)))
    }

    pub fn list_coils(&self) -> CoilResult<Vec<Coil>> {
        self.coils.list_all().map_err(|err| map_coil_err(err, None))
    }

    pub fn list_active_coils(&self) -> CoilResult<Vec<Coil>> {
        self.coils
            .list_active()
            .map_err(|err| map_coil_err(err, None))
    }

    pub fn list_coils_page(&self, limit: Option<u32>, offset: u32) -> CoilResult<Vec<Coil>> {
        self.coils
            .list_page(limit, offset)
            .map_err(|err| map_coil_err(err, None))
    }

    /// Case-insensitive substring search on the supplier code.
    pub fn search_coils(&self, fragment: &str) -> CoilResult<Vec<Coil>> {
        self.coils
            .search_by_name(fragment)
            .map_err(|err| map_coil_err(err, None))
    }

    pub fn activate_coil(&self, id: CoilId) -> CoilResult<Coil> {
        self.coils
            .activate(id)
            .map_err(|err| map_coil_err(err, Some(id)))
    }

    pub fn deactivate_coil(&self, id: CoilId) -> CoilResult<Coil> {
        self.coils
            .deactivate(id)
            .map_err(|err| map_coil_err(err, Some(id)))
    }

    /// User-facing deletion: deactivation.
    pub fn soft_delete_coil(&self, id: CoilId) -> CoilResult<()> {
        self.coils
            .soft_delete(id)
            .map_err(|err| map_coil_err(err, Some(id)))
    }

    /// Checks the draft's catalog references. When `current` is given,
    /// only references that actually changed are re-checked.
    fn check_references(&self, draft: &CoilDraft, current: Option<&Coil>) -> CoilResult<()> {
        for kind in CatalogKind::ALL {
            let entry_uuid = draft.reference(kind);
            if let Some(current) = current {
                if current.reference(kind) == entry_uuid {
                    continue;
                }
            }
            if !self.coils.repository().catalog_ref_exists(kind, entry_uuid)? {
                return Err(CoilError::CatalogRefNotFound { kind, entry_uuid });
            }
        }
        Ok(())
    }
}

fn map_coil_err(err: LifecycleError, id: Option<CoilId>) -> CoilError {
    match err {
        LifecycleError::Validation(inner) => CoilError::Validation(inner),
        LifecycleError::NotFound { kind, id: raw } => match id {
            Some(id) => CoilError::CoilNotFound(id),
            None => CoilError::Repo(RepoError::NotFound { kind, id: raw }),
        },
        LifecycleError::DuplicateName { name, .. } => CoilError::DuplicateSupplierCode(name),
        LifecycleError::Repo(inner) => CoilError::Repo(inner),
    }
}
