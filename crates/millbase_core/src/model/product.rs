//! Product reference catalogs and coil records.
//!
//! # Responsibility
//! - Define the five flat reference catalogs (one shape, five tables).
//! - Define the coil record whose attributes stay opaque to the engine.
//!
//! # Invariants
//! - Catalog names are unique per kind, case-insensitive.
//! - A coil references one existing entry of every catalog kind.

use crate::model::entity::{check_name, EntityDraft, StatusEntity, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a catalog entry of any kind.
pub type CatalogEntryId = Uuid;
/// Stable identifier for a coil.
pub type CoilId = Uuid;

const SUPPLIER_CODE_MAX_CHARS: usize = 100;
const CALIPER_MAX_CHARS: usize = 50;

/// The five reference catalogs a coil is classified by.
///
/// Every kind shares one record shape and one repository implementation;
/// the kind only selects the backing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    ProductType,
    ProductClass,
    Mill,
    Grade,
    Supplier,
}

impl CatalogKind {
    /// All kinds, in a fixed order usable for iteration.
    pub const ALL: [CatalogKind; 5] = [
        CatalogKind::ProductType,
        CatalogKind::ProductClass,
        CatalogKind::Mill,
        CatalogKind::Grade,
        CatalogKind::Supplier,
    ];

    /// Backing table name.
    pub fn table(self) -> &'static str {
        match self {
            Self::ProductType => "product_types",
            Self::ProductClass => "product_classes",
            Self::Mill => "mills",
            Self::Grade => "grades",
            Self::Supplier => "suppliers",
        }
    }

    /// Stable label used in log events and error kinds.
    pub fn label(self) -> &'static str {
        match self {
            Self::ProductType => "product_type",
            Self::ProductClass => "product_class",
            Self::Mill => "mill",
            Self::Grade => "grade",
            Self::Supplier => "supplier",
        }
    }
}

impl Display for CatalogKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One entry of a reference catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Store-assigned stable id.
    pub uuid: CatalogEntryId,
    /// Identifying name, unique within the entry's kind (case-insensitive).
    pub name: String,
    /// Active flag; soft delete flips this off.
    pub active: bool,
    /// Epoch ms creation timestamp, store-maintained.
    pub created_at: i64,
    /// Epoch ms update timestamp, store-maintained.
    pub updated_at: i64,
}

impl StatusEntity for CatalogEntry {
    type Id = CatalogEntryId;
    type Draft = CatalogDraft;

    const KIND: &'static str = "catalog_entry";

    fn id(&self) -> CatalogEntryId {
        self.uuid
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn apply(&mut self, draft: &CatalogDraft) {
        self.name = draft.name.trim().to_string();
        if let Some(active) = draft.active {
            self.active = active;
        }
    }
}

/// Creation/update payload for catalog entries of any kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDraft {
    pub name: String,
    /// `None` keeps the stored flag (defaults to active on creation).
    pub active: Option<bool>,
}

impl CatalogDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: None,
        }
    }
}

impl EntityDraft for CatalogDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        check_name(&self.name, "name")
    }
}

/// Purchased coil, classified by one entry of each catalog kind.
///
/// The measurement fields are carried and validated for basic sanity but
/// otherwise opaque: no business rule in the engine reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coil {
    /// Store-assigned stable id.
    pub uuid: CoilId,
    /// Supplier's coil code, globally unique (case-insensitive).
    pub supplier_code: String,
    pub width_mm: f64,
    pub grammage_gsm: f64,
    pub caliper: Option<String>,
    pub weight_kg: f64,
    pub product_type_uuid: CatalogEntryId,
    pub product_class_uuid: CatalogEntryId,
    pub mill_uuid: CatalogEntryId,
    pub grade_uuid: CatalogEntryId,
    pub supplier_uuid: CatalogEntryId,
    /// Active flag; soft delete flips this off.
    pub active: bool,
    /// Epoch ms creation timestamp, store-maintained.
    pub created_at: i64,
    /// Epoch ms update timestamp, store-maintained.
    pub updated_at: i64,
}

impl Coil {
    /// Catalog reference carried for `kind`.
    pub fn reference(&self, kind: CatalogKind) -> CatalogEntryId {
        match kind {
            CatalogKind::ProductType => self.product_type_uuid,
            CatalogKind::ProductClass => self.product_class_uuid,
            CatalogKind::Mill => self.mill_uuid,
            CatalogKind::Grade => self.grade_uuid,
            CatalogKind::Supplier => self.supplier_uuid,
        }
    }
}

impl StatusEntity for Coil {
    type Id = CoilId;
    type Draft = CoilDraft;

    const KIND: &'static str = "coil";

    fn id(&self) -> CoilId {
        self.uuid
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn apply(&mut self, draft: &CoilDraft) {
        self.supplier_code = draft.supplier_code.trim().to_string();
        self.width_mm = draft.width_mm;
        self.grammage_gsm = draft.grammage_gsm;
        self.caliper = draft
            .caliper
            .as_deref()
            .map(|value| value.trim().to_string());
        self.weight_kg = draft.weight_kg;
        self.product_type_uuid = draft.product_type_uuid;
        self.product_class_uuid = draft.product_class_uuid;
        self.mill_uuid = draft.mill_uuid;
        self.grade_uuid = draft.grade_uuid;
        self.supplier_uuid = draft.supplier_uuid;
        if let Some(active) = draft.active {
            self.active = active;
        }
    }
}

/// Creation/update payload for coils.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoilDraft {
    pub supplier_code: String,
    pub width_mm: f64,
    pub grammage_gsm: f64,
    pub caliper: Option<String>,
    pub weight_kg: f64,
    pub product_type_uuid: CatalogEntryId,
    pub product_class_uuid: CatalogEntryId,
    pub mill_uuid: CatalogEntryId,
    pub grade_uuid: CatalogEntryId,
    pub supplier_uuid: CatalogEntryId,
    /// `None` keeps the stored flag (defaults to active on creation).
    pub active: Option<bool>,
}

impl CoilDraft {
    /// Catalog reference carried for `kind`.
    pub fn reference(&self, kind: CatalogKind) -> CatalogEntryId {
        match kind {
            CatalogKind::ProductType => self.product_type_uuid,
            CatalogKind::ProductClass => self.product_class_uuid,
            CatalogKind::Mill => self.mill_uuid,
            CatalogKind::Grade => self.grade_uuid,
            CatalogKind::Supplier => self.supplier_uuid,
        }
    }
}

impl EntityDraft for CoilDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        let code = self.supplier_code.trim();
        if code.is_empty() {
            return Err(ValidationError::BlankField {
                field: "supplier_code",
            });
        }
        let code_len = code.chars().count();
        if code_len > SUPPLIER_CODE_MAX_CHARS {
            return Err(ValidationError::LengthOutOfRange {
                field: "supplier_code",
                len: code_len,
                min: 1,
                max: SUPPLIER_CODE_MAX_CHARS,
            });
        }

        for (field, value) in [
            ("width_mm", self.width_mm),
            ("grammage_gsm", self.grammage_gsm),
            ("weight_kg", self.weight_kg),
        ] {
            if !(value > 0.0) {
                return Err(ValidationError::NonPositiveMeasure { field });
            }
        }

        if let Some(caliper) = self.caliper.as_deref() {
            let len = caliper.trim().chars().count();
            if len > CALIPER_MAX_CHARS {
                return Err(ValidationError::LengthOutOfRange {
                    field: "caliper",
                    len,
                    min: 0,
                    max: CALIPER_MAX_CHARS,
                });
            }
        }

        Ok(())
    }
}
