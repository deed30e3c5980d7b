//! Work order cost caching using Moka.
//!
//! Reads of a work order's material cost far outnumber mutations, so
//! snapshots are cached per work order. Mutating operations invalidate
//! and re-insert the snapshot for the work orders they touched.

use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;

use tallyard_shared::types::WorkOrderId;

use super::types::WorkOrderMaterialCost;

/// Default cache capacity (number of work orders).
const DEFAULT_CACHE_CAPACITY: u64 = 100;

/// Default time-to-live for cache entries (5 minutes).
const DEFAULT_TTL_SECS: u64 = 300;

/// Cache of per-work-order cost snapshots.
///
/// Thread-safe and suitable for concurrent access.
#[derive(Clone)]
pub struct WorkOrderCostCache {
    cache: Cache<WorkOrderId, Arc<WorkOrderMaterialCost>>,
}

impl WorkOrderCostCache {
    /// Creates a cache with default settings.
    ///
    /// Default: 100 entries max, 5 minute TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a cache with custom capacity and TTL.
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { cache }
    }

    /// Returns the cached snapshot for a work order, if fresh.
    ///
    /// The returned snapshot has `cached` set to true.
    #[must_use]
    pub fn get(&self, work_order_id: WorkOrderId) -> Option<WorkOrderMaterialCost> {
        self.cache.get(&work_order_id).map(|snapshot| {
            let mut cost = (*snapshot).clone();
            cost.cached = true;
            cost
        })
    }

    /// Stores a freshly computed snapshot, keyed by its work order.
    pub fn insert(&self, cost: WorkOrderMaterialCost) {
        self.cache.insert(cost.work_order_id, Arc::new(cost));
    }

    /// Drops the snapshot for one work order.
    pub fn invalidate(&self, work_order_id: WorkOrderId) {
        self.cache.invalidate(&work_order_id);
    }

    /// Drops every cached snapshot.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Returns the number of entries currently in the cache.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Runs cache maintenance tasks.
    ///
    /// Moka handles expiry in the background; calling this explicitly
    /// makes `entry_count` exact, which the tests rely on.
    pub fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks();
    }
}

impl Default for WorkOrderCostCache {
    fn default() -> Self {
        Self::new()
    }
}
