//! Storage backends for the Tallyard allocation ledger.
//!
//! Everything here lives in process memory. The stores implement the
//! seams `tallyard-core` defines and are suitable for tests, demos,
//! and single-node deployments; a database-backed crate would slot in
//! behind the same traits.
//!
//! # Modules
//!
//! - `memory` - allocation store with per-record optimistic versioning
//! - `catalog` - material reference data
//! - `documents` - attachment sink
//! - `registry` - typed wiring of stores into the ledger facade

pub mod catalog;
pub mod documents;
pub mod memory;
pub mod registry;

pub use catalog::InMemoryCatalog;
pub use documents::InMemoryDocumentStore;
pub use memory::InMemoryLedgerStore;
pub use registry::StoreRegistry;
