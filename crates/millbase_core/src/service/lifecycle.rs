//! Generic entity lifecycle engine.
//!
//! # Responsibility
//! - Provide list/get/create/update/activate/deactivate/soft-delete over
//!   any status-capable record, written exactly once.
//!
//! # Invariants
//! - Identity is store-assigned on create and preserved on update; a
//!   payload can never change a record's id.
//! - `activate`/`deactivate` are idempotent and touch nothing but the
//!   flag.
//! - Store failures propagate unchanged in kind; "not found" is never
//!   conflated with "could not ask".

use crate::model::entity::{EntityDraft, StatusEntity, ValidationError};
use crate::repo::{DraftOf, EntityRepository, IdOf, RecordOf, RepoError};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Page size applied when the caller does not provide one.
pub const DEFAULT_PAGE_SIZE: u32 = 50;
/// Hard ceiling for one listing page.
pub const PAGE_SIZE_MAX: u32 = 200;

/// Errors from generic lifecycle operations.
#[derive(Debug)]
pub enum LifecycleError {
    /// Draft attributes failed validation; nothing was written.
    Validation(ValidationError),
    /// No record of this kind with the given id exists.
    NotFound { kind: &'static str, id: String },
    /// The identifying name collides inside its uniqueness scope.
    DuplicateName { kind: &'static str, name: String },
    /// Store-level failure unrelated to the business rule.
    Repo(RepoError),
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::DuplicateName { kind, name } => {
                write!(f, "{kind} name already exists in scope: `{name}`")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LifecycleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for LifecycleError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            RepoError::DuplicateName { kind, name } => Self::DuplicateName { kind, name },
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for LifecycleError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Uniform lifecycle operations over one repository.
///
/// Every managed record type gets the identical operation set; only the
/// validation layered on top by the wrapping services differs. The flat
/// reference catalogs use this service with nothing on top at all.
pub struct LifecycleService<R: EntityRepository> {
    repo: R,
}

impl<R: EntityRepository> LifecycleService<R> {
    /// Creates the engine from a repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// The underlying repository, for wrapping services that layer scoped
    /// checks on top of the generic operations.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    fn kind(&self) -> &'static str {
        self.repo.kind_label()
    }

    /// Every stored record, active or not.
    pub fn list_all(&self) -> LifecycleResult<Vec<RecordOf<R>>> {
        debug!(
            "event=entity_list module=lifecycle entity={} scope=all",
            self.kind()
        );
        Ok(self.repo.find_all()?)
    }

    /// Records with the active flag set.
    pub fn list_active(&self) -> LifecycleResult<Vec<RecordOf<R>>> {
        debug!(
            "event=entity_list module=lifecycle entity={} scope=active",
            self.kind()
        );
        Ok(self.repo.find_active()?)
    }

    /// One page of the full listing, in deterministic order.
    ///
    /// A missing `limit` falls back to [`DEFAULT_PAGE_SIZE`]; oversized
    /// requests clamp to [`PAGE_SIZE_MAX`].
    pub fn list_page(&self, limit: Option<u32>, offset: u32) -> LifecycleResult<Vec<RecordOf<R>>> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).min(PAGE_SIZE_MAX);
        debug!(
            "event=entity_list module=lifecycle entity={} scope=page limit={limit} offset={offset}",
            self.kind()
        );
        Ok(self.repo.find_page(limit, offset)?)
    }

    /// Case-insensitive substring search on the identifying name.
    pub fn search_by_name(&self, fragment: &str) -> LifecycleResult<Vec<RecordOf<R>>> {
        debug!(
            "event=entity_search module=lifecycle entity={}",
            self.kind()
        );
        Ok(self.repo.search_by_name(fragment)?)
    }

    /// Loads one record; inactive records are found like any other.
    pub fn get_by_id(&self, id: IdOf<R>) -> LifecycleResult<RecordOf<R>> {
        self.repo.find_by_id(id)?.ok_or_else(|| LifecycleError::NotFound {
            kind: self.kind(),
            id: id.to_string(),
        })
    }

    /// Validates and persists a new record; the store assigns the id.
    pub fn create(&self, draft: &DraftOf<R>) -> LifecycleResult<RecordOf<R>> {
        draft.validate()?;
        let record = self.repo.insert(draft)?;
        info!(
            "event=entity_create module=lifecycle entity={} id={} status=ok",
            self.kind(),
            record.id()
        );
        Ok(record)
    }

    /// Full-replace update of the record with `id`.
    ///
    /// Identity comes from `id`, never from the payload; all draft-borne
    /// fields of the stored record are overwritten.
    pub fn update(&self, id: IdOf<R>, draft: &DraftOf<R>) -> LifecycleResult<RecordOf<R>> {
        draft.validate()?;
        let mut current = self.get_by_id(id)?;
        current.apply(draft);
        let record = self.repo.save(&current)?;
        info!(
            "event=entity_update module=lifecycle entity={} id={id} status=ok",
            self.kind()
        );
        Ok(record)
    }

    /// Sets the active flag. Succeeds and returns the unchanged record
    /// when already active.
    pub fn activate(&self, id: IdOf<R>) -> LifecycleResult<RecordOf<R>> {
        self.set_active(id, true)
    }

    /// Clears the active flag. Succeeds when already inactive.
    pub fn deactivate(&self, id: IdOf<R>) -> LifecycleResult<RecordOf<R>> {
        self.set_active(id, false)
    }

    /// User-facing deletion: deactivates the record, keeping it readable.
    pub fn soft_delete(&self, id: IdOf<R>) -> LifecycleResult<()> {
        self.deactivate(id)?;
        info!(
            "event=entity_soft_delete module=lifecycle entity={} id={id} status=ok",
            self.kind()
        );
        Ok(())
    }

    fn set_active(&self, id: IdOf<R>, active: bool) -> LifecycleResult<RecordOf<R>> {
        let mut current = self.get_by_id(id)?;
        if current.is_active() == active {
            // Already in the target state: idempotent no-op, no write.
            return Ok(current);
        }
        current.set_active(active);
        let record = self.repo.save(&current)?;
        info!(
            "event=entity_status module=lifecycle entity={} id={id} active={active} status=ok",
            self.kind()
        );
        Ok(record)
    }
}
