//! Persistence seam for the allocation ledger.
//!
//! Stores hand out allocations tagged with a version and accept writes
//! only against the version the caller read. A stale write fails with
//! [`LedgerError::VersionConflict`] and the caller re-reads and
//! retries; the ledger never blocks on a store-side lock across a
//! mutation.

use tallyard_shared::types::{AllocationId, MaterialId, WorkOrderId};

use crate::ledger::{Allocation, LedgerError, ReallocationAction};

/// A value read from the store together with its write version.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    /// The stored value as of `version`.
    pub value: T,
    /// Monotonic per-record version, bumped on every committed write.
    pub version: i64,
}

/// Store of allocations and their reallocation audit trail.
///
/// One work-order/material pairing maps to at most one allocation;
/// [`AllocationRepository::insert`] enforces this even under races.
pub trait AllocationRepository: Send + Sync {
    /// Loads an allocation by id.
    fn load(
        &self,
        allocation_id: AllocationId,
    ) -> impl std::future::Future<Output = Result<Option<Versioned<Allocation>>, LedgerError>> + Send;

    /// Finds the allocation for a work-order/material pairing.
    fn find_by_pairing(
        &self,
        work_order_id: WorkOrderId,
        material_id: MaterialId,
    ) -> impl std::future::Future<Output = Result<Option<Versioned<Allocation>>, LedgerError>> + Send;

    /// Lists every allocation belonging to a work order.
    fn find_by_work_order(
        &self,
        work_order_id: WorkOrderId,
    ) -> impl std::future::Future<Output = Result<Vec<Allocation>, LedgerError>> + Send;

    /// Persists a brand-new allocation.
    ///
    /// Fails with [`LedgerError::DuplicateAllocation`] when another
    /// writer created an allocation for the same pairing first.
    fn insert(
        &self,
        allocation: Allocation,
    ) -> impl std::future::Future<Output = Result<Versioned<Allocation>, LedgerError>> + Send;

    /// Persists a mutated allocation against the version it was read at.
    ///
    /// Fails with [`LedgerError::VersionConflict`] when the stored
    /// version moved on; nothing is written in that case.
    fn save(
        &self,
        allocation: Allocation,
        expected_version: i64,
    ) -> impl std::future::Future<Output = Result<Versioned<Allocation>, LedgerError>> + Send;

    /// Persists two mutated allocations atomically.
    ///
    /// Either both writes commit or neither does. Implementations must
    /// take per-allocation locks in ascending [`AllocationId`] order so
    /// that concurrent transfers over the same pair cannot deadlock.
    fn save_pair(
        &self,
        first: (Allocation, i64),
        second: (Allocation, i64),
    ) -> impl std::future::Future<
        Output = Result<(Versioned<Allocation>, Versioned<Allocation>), LedgerError>,
    > + Send;

    /// Appends a reallocation action to the audit trail.
    fn append_action(
        &self,
        action: ReallocationAction,
    ) -> impl std::future::Future<Output = Result<(), LedgerError>> + Send;

    /// Audit trail entries touching one allocation, oldest first.
    fn actions_for_allocation(
        &self,
        allocation_id: AllocationId,
    ) -> impl std::future::Future<Output = Result<Vec<ReallocationAction>, LedgerError>> + Send;

    /// Audit trail entries touching any allocation of a work order,
    /// oldest first.
    fn actions_for_work_order(
        &self,
        work_order_id: WorkOrderId,
    ) -> impl std::future::Future<Output = Result<Vec<ReallocationAction>, LedgerError>> + Send;
}
