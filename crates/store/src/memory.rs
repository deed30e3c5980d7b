//! In-memory allocation store.
//!
//! Each allocation lives in its own slot guarded by a mutex and
//! carries a write version. Saves are compare-and-swap against the
//! version the caller read; pair saves take both slot locks in
//! ascending allocation id order, so two transfers over the same pair
//! running in opposite directions cannot deadlock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use tallyard_core::ledger::{Allocation, LedgerError, ReallocationAction};
use tallyard_core::repository::{AllocationRepository, Versioned};
use tallyard_shared::types::{AllocationId, MaterialId, WorkOrderId};

struct Slot {
    allocation: Allocation,
    version: i64,
}

/// Allocation store backed by process memory.
///
/// One work-order/material pairing maps to at most one allocation; a
/// dedicated pairing index enforces this under concurrent inserts.
pub struct InMemoryLedgerStore {
    slots: RwLock<HashMap<AllocationId, Arc<Mutex<Slot>>>>,
    pairings: Mutex<HashMap<(WorkOrderId, MaterialId), AllocationId>>,
    actions: Mutex<Vec<ReallocationAction>>,
}

fn poisoned() -> LedgerError {
    LedgerError::Storage("ledger store lock poisoned".to_string())
}

impl InMemoryLedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            pairings: Mutex::new(HashMap::new()),
            actions: Mutex::new(Vec::new()),
        }
    }

    /// Number of allocations in the store.
    ///
    /// # Errors
    ///
    /// Returns an error when the store lock is poisoned.
    pub fn allocation_count(&self) -> Result<usize, LedgerError> {
        Ok(self.slots.read().map_err(|_| poisoned())?.len())
    }

    fn slot(&self, allocation_id: AllocationId) -> Result<Option<Arc<Mutex<Slot>>>, LedgerError> {
        Ok(self
            .slots
            .read()
            .map_err(|_| poisoned())?
            .get(&allocation_id)
            .cloned())
    }

    fn required_slot(&self, allocation_id: AllocationId) -> Result<Arc<Mutex<Slot>>, LedgerError> {
        self.slot(allocation_id)?
            .ok_or(LedgerError::AllocationNotFound(allocation_id))
    }

    fn read_versioned(
        &self,
        allocation_id: AllocationId,
    ) -> Result<Option<Versioned<Allocation>>, LedgerError> {
        match self.slot(allocation_id)? {
            Some(slot) => {
                let guard = slot.lock().map_err(|_| poisoned())?;
                Ok(Some(Versioned {
                    value: guard.allocation.clone(),
                    version: guard.version,
                }))
            }
            None => Ok(None),
        }
    }

    fn work_order_allocation_ids(
        &self,
        work_order_id: WorkOrderId,
    ) -> Result<Vec<AllocationId>, LedgerError> {
        let slots: Vec<Arc<Mutex<Slot>>> = self
            .slots
            .read()
            .map_err(|_| poisoned())?
            .values()
            .cloned()
            .collect();

        let mut ids = Vec::new();
        for slot in slots {
            let guard = slot.lock().map_err(|_| poisoned())?;
            if guard.allocation.work_order_id() == work_order_id {
                ids.push(guard.allocation.id());
            }
        }
        Ok(ids)
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationRepository for InMemoryLedgerStore {
    async fn load(
        &self,
        allocation_id: AllocationId,
    ) -> Result<Option<Versioned<Allocation>>, LedgerError> {
        self.read_versioned(allocation_id)
    }

    async fn find_by_pairing(
        &self,
        work_order_id: WorkOrderId,
        material_id: MaterialId,
    ) -> Result<Option<Versioned<Allocation>>, LedgerError> {
        let allocation_id = self
            .pairings
            .lock()
            .map_err(|_| poisoned())?
            .get(&(work_order_id, material_id))
            .copied();
        match allocation_id {
            Some(allocation_id) => self.read_versioned(allocation_id),
            None => Ok(None),
        }
    }

    async fn find_by_work_order(
        &self,
        work_order_id: WorkOrderId,
    ) -> Result<Vec<Allocation>, LedgerError> {
        let slots: Vec<Arc<Mutex<Slot>>> = self
            .slots
            .read()
            .map_err(|_| poisoned())?
            .values()
            .cloned()
            .collect();

        let mut allocations = Vec::new();
        for slot in slots {
            let guard = slot.lock().map_err(|_| poisoned())?;
            if guard.allocation.work_order_id() == work_order_id {
                allocations.push(guard.allocation.clone());
            }
        }
        // HashMap iteration order is arbitrary; callers get a stable one.
        allocations.sort_by_key(Allocation::id);
        Ok(allocations)
    }

    async fn insert(&self, allocation: Allocation) -> Result<Versioned<Allocation>, LedgerError> {
        let pairing = (allocation.work_order_id(), allocation.material_id());

        // Pairing index first, slot map second; every writer takes the
        // locks in this order.
        let mut pairings = self.pairings.lock().map_err(|_| poisoned())?;
        if pairings.contains_key(&pairing) {
            return Err(LedgerError::DuplicateAllocation {
                work_order_id: pairing.0,
                material_id: pairing.1,
            });
        }
        let mut slots = self.slots.write().map_err(|_| poisoned())?;
        pairings.insert(pairing, allocation.id());
        slots.insert(
            allocation.id(),
            Arc::new(Mutex::new(Slot {
                allocation: allocation.clone(),
                version: 1,
            })),
        );

        Ok(Versioned {
            value: allocation,
            version: 1,
        })
    }

    async fn save(
        &self,
        allocation: Allocation,
        expected_version: i64,
    ) -> Result<Versioned<Allocation>, LedgerError> {
        let slot = self.required_slot(allocation.id())?;
        let mut guard = slot.lock().map_err(|_| poisoned())?;

        if guard.version != expected_version {
            return Err(LedgerError::VersionConflict {
                allocation_id: allocation.id(),
                expected: expected_version,
                actual: guard.version,
            });
        }

        guard.allocation = allocation.clone();
        guard.version += 1;
        Ok(Versioned {
            value: allocation,
            version: guard.version,
        })
    }

    async fn save_pair(
        &self,
        first: (Allocation, i64),
        second: (Allocation, i64),
    ) -> Result<(Versioned<Allocation>, Versioned<Allocation>), LedgerError> {
        let (first_allocation, first_version) = first;
        let (second_allocation, second_version) = second;

        if first_allocation.id() == second_allocation.id() {
            return Err(LedgerError::SameAllocation);
        }

        let first_slot = self.required_slot(first_allocation.id())?;
        let second_slot = self.required_slot(second_allocation.id())?;

        // Ascending id lock order; the ids differ, so this is a total
        // order and opposite-direction pairs cannot deadlock.
        let (mut first_guard, mut second_guard) =
            if first_allocation.id() < second_allocation.id() {
                let first_guard = first_slot.lock().map_err(|_| poisoned())?;
                let second_guard = second_slot.lock().map_err(|_| poisoned())?;
                (first_guard, second_guard)
            } else {
                let second_guard = second_slot.lock().map_err(|_| poisoned())?;
                let first_guard = first_slot.lock().map_err(|_| poisoned())?;
                (first_guard, second_guard)
            };

        // Both versions are checked before either side is written.
        if first_guard.version != first_version {
            return Err(LedgerError::VersionConflict {
                allocation_id: first_allocation.id(),
                expected: first_version,
                actual: first_guard.version,
            });
        }
        if second_guard.version != second_version {
            return Err(LedgerError::VersionConflict {
                allocation_id: second_allocation.id(),
                expected: second_version,
                actual: second_guard.version,
            });
        }

        first_guard.allocation = first_allocation.clone();
        first_guard.version += 1;
        second_guard.allocation = second_allocation.clone();
        second_guard.version += 1;

        Ok((
            Versioned {
                value: first_allocation,
                version: first_guard.version,
            },
            Versioned {
                value: second_allocation,
                version: second_guard.version,
            },
        ))
    }

    async fn append_action(&self, action: ReallocationAction) -> Result<(), LedgerError> {
        self.actions.lock().map_err(|_| poisoned())?.push(action);
        Ok(())
    }

    async fn actions_for_allocation(
        &self,
        allocation_id: AllocationId,
    ) -> Result<Vec<ReallocationAction>, LedgerError> {
        Ok(self
            .actions
            .lock()
            .map_err(|_| poisoned())?
            .iter()
            .filter(|action| {
                action.from_allocation_id == Some(allocation_id)
                    || action.to_allocation_id == Some(allocation_id)
            })
            .cloned()
            .collect())
    }

    async fn actions_for_work_order(
        &self,
        work_order_id: WorkOrderId,
    ) -> Result<Vec<ReallocationAction>, LedgerError> {
        let ids = self.work_order_allocation_ids(work_order_id)?;
        Ok(self
            .actions
            .lock()
            .map_err(|_| poisoned())?
            .iter()
            .filter(|action| {
                action
                    .from_allocation_id
                    .is_some_and(|id| ids.contains(&id))
                    || action.to_allocation_id.is_some_and(|id| ids.contains(&id))
            })
            .cloned()
            .collect())
    }
}
