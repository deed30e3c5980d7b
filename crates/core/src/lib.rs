//! Core business logic for Tallyard.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `ledger` - Allocation aggregate and the quantity conservation invariant
//! - `reconciliation` - Usage/waste/return recording and the terminal transition
//! - `reallocation` - Moving unused quantity between allocations
//! - `costing` - Material cost aggregation per work order
//! - `catalog` - Read-only material reference data
//! - `events` - Ledger event notifications for observers
//! - `repository` - Persistence seam implemented by storage crates
//! - `documents` - Side-channel file attachment seam
//! - `service` - Operation facade tying the components together

pub mod catalog;
pub mod costing;
pub mod documents;
pub mod events;
pub mod ledger;
pub mod reallocation;
pub mod reconciliation;
pub mod repository;
pub mod service;
