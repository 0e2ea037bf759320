//! Core domain logic for the millbase catalog service.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entity::{EntityDraft, StatusEntity, ValidationError};
pub use model::locality::{
    Area, AreaDraft, AreaId, AreaSeed, Locality, LocalityDraft, LocalityId,
};
pub use model::product::{
    CatalogDraft, CatalogEntry, CatalogEntryId, CatalogKind, Coil, CoilDraft, CoilId,
};
pub use repo::catalog_repo::{CatalogRepository, SqliteCatalogRepository};
pub use repo::coil_repo::{CoilRepository, SqliteCoilRepository};
pub use repo::inventory_repo::{
    AreaRepository, LocalityRepository, SqliteAreaRepository, SqliteLocalityRepository,
};
pub use repo::{EntityRepository, RepoError, RepoResult};
pub use service::coil_service::{CoilError, CoilResult, CoilService};
pub use service::inventory_service::{InventoryError, InventoryResult, InventoryService};
pub use service::lifecycle::{LifecycleError, LifecycleResult, LifecycleService};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
