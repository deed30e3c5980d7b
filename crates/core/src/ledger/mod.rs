//! Material allocation ledger.
//!
//! This module owns the allocation aggregate and everything that hangs
//! off it:
//!
//! - `allocation` - the aggregate with the quantity conservation guard
//! - `types` - statuses, usage events, deltas, and reallocation actions
//! - `error` - the ledger error taxonomy with transport-level mappings

pub mod allocation;
pub mod error;
pub mod types;

#[cfg(test)]
mod allocation_props;

pub use allocation::Allocation;
pub use error::LedgerError;
pub use types::{
    AllocationStatus, Priority, ReallocationAction, UsageDelta, UsageEvent, UsageEventKind,
};
