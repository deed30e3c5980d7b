//! Wiring of in-memory backends into a ready-to-use ledger service.

use std::sync::Arc;

use tallyard_core::costing::CostBasis;
use tallyard_core::service::{LedgerSettings, MaterialLedgerService};
use tallyard_shared::config::AppConfig;

use crate::catalog::InMemoryCatalog;
use crate::documents::InMemoryDocumentStore;
use crate::memory::InMemoryLedgerStore;

/// Ledger service built over the in-memory backends.
pub type InMemoryLedgerService =
    MaterialLedgerService<InMemoryLedgerStore, InMemoryCatalog, InMemoryDocumentStore>;

/// Bundle of in-memory backends behind the core service traits.
///
/// The registry owns one instance of each backend. Services built from
/// it share those instances, so a catalog upsert is visible to every
/// service handed out earlier.
#[derive(Default)]
pub struct StoreRegistry {
    ledger: Arc<InMemoryLedgerStore>,
    catalog: Arc<InMemoryCatalog>,
    documents: Arc<InMemoryDocumentStore>,
}

impl StoreRegistry {
    /// Creates a registry with empty backends.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The allocation store.
    #[must_use]
    pub fn ledger(&self) -> &Arc<InMemoryLedgerStore> {
        &self.ledger
    }

    /// The material catalog.
    #[must_use]
    pub fn catalog(&self) -> &Arc<InMemoryCatalog> {
        &self.catalog
    }

    /// The document store.
    #[must_use]
    pub fn documents(&self) -> &Arc<InMemoryDocumentStore> {
        &self.documents
    }

    /// Builds a ledger service over the registry's backends, tuned from
    /// application configuration.
    #[must_use]
    pub fn ledger_service(&self, config: &AppConfig) -> InMemoryLedgerService {
        MaterialLedgerService::with_settings(
            Arc::clone(&self.ledger),
            Arc::clone(&self.catalog),
            Arc::clone(&self.documents),
            ledger_settings(config),
        )
    }
}

fn ledger_settings(config: &AppConfig) -> LedgerSettings {
    let cost_basis = CostBasis::parse(&config.costing.default_basis).unwrap_or_else(|| {
        tracing::warn!(
            configured = %config.costing.default_basis,
            "unknown cost basis in configuration, using the default"
        );
        CostBasis::default()
    });

    LedgerSettings {
        max_save_retries: config.concurrency.max_save_retries,
        cost_basis,
        cost_cache_capacity: config.costing.cache_capacity,
        cost_cache_ttl_secs: config.costing.cache_ttl_secs,
    }
}
