//! Use-case services.
//!
//! # Responsibility
//! - Provide the uniform lifecycle operations every catalog record gets.
//! - Layer per-aggregate validation (hierarchy, reference integrity) on
//!   top of the generic engine.
//!
//! # Invariants
//! - Services never bypass repository validation/persistence contracts.
//! - Status flips never run hierarchy checks; they cannot affect them.

pub mod coil_service;
pub mod inventory_service;
pub mod lifecycle;
