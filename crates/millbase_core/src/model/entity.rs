//! Status-capable entity contract and draft validation.
//!
//! # Responsibility
//! - Define the capability surface the generic lifecycle engine needs:
//!   identity, the active flag, and draft application.
//! - Provide shared field validation used by all draft types.
//!
//! # Invariants
//! - `apply` never touches identity or parent references.
//! - Validation rejects input before any SQL runs; the store constraints
//!   remain the authoritative backstop.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Minimum accepted length for identifying names, in characters.
pub const NAME_MIN_CHARS: usize = 2;
/// Maximum accepted length for identifying names, in characters.
pub const NAME_MAX_CHARS: usize = 500;

/// Malformed input attributes, reported before any write is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty after trimming.
    BlankField { field: &'static str },
    /// Text field length is outside its accepted range.
    LengthOutOfRange {
        field: &'static str,
        len: usize,
        min: usize,
        max: usize,
    },
    /// Numeric measurement must be strictly positive.
    NonPositiveMeasure { field: &'static str },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField { field } => write!(f, "field `{field}` must not be blank"),
            Self::LengthOutOfRange {
                field,
                len,
                min,
                max,
            } => write!(
                f,
                "field `{field}` length {len} is outside {min}..={max} characters"
            ),
            Self::NonPositiveMeasure { field } => {
                write!(f, "field `{field}` must be greater than zero")
            }
        }
    }
}

impl Error for ValidationError {}

/// Creation/update payload accepted by the lifecycle engine.
///
/// Drafts carry every caller-settable attribute of one record and nothing
/// else; identity and timestamps belong to the store.
pub trait EntityDraft {
    /// Checks draft attributes without side effects.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Capability contract for records managed by the lifecycle engine.
///
/// A type opts in by exposing identity, the active flag, and full-replace
/// draft application. The engine dispatches on this contract at compile
/// time; there is no per-type branching anywhere in the generic code.
pub trait StatusEntity: Sized {
    /// Identity type. Opaque to the engine beyond copy/compare/display.
    type Id: Copy + Eq + Display;
    /// Attribute payload for create and update operations.
    type Draft: EntityDraft;

    /// Stable label used in log events and error kinds.
    const KIND: &'static str;

    fn id(&self) -> Self::Id;
    fn is_active(&self) -> bool;
    fn set_active(&mut self, active: bool);

    /// Overwrites all draft-borne fields from `draft`.
    ///
    /// Identity, parent references, and timestamps are never touched; an
    /// absent `active` flag in the draft leaves the stored flag unchanged.
    fn apply(&mut self, draft: &Self::Draft);
}

/// Trims `value` and checks the shared identifying-name rules.
pub(crate) fn check_name(value: &str, field: &'static str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankField { field });
    }
    let len = trimmed.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        return Err(ValidationError::LengthOutOfRange {
            field,
            len,
            min: NAME_MIN_CHARS,
            max: NAME_MAX_CHARS,
        });
    }
    Ok(())
}

/// Case-insensitive name comparison, matching the store's NOCASE collation.
pub(crate) fn names_equal_fold(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}
