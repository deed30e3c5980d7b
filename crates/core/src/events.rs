//! Ledger change notifications.
//!
//! Every committed mutation publishes one [`LedgerEvent`] to the
//! in-process [`LedgerEventBus`]. Delivery guarantees:
//!
//! - synchronous, on the task that performed the mutation, after the
//!   store write committed
//! - published only for committed writes; a mutation retried after a
//!   version conflict publishes once, for the write that stuck
//! - subscribers run in registration order
//!
//! Subscribers must be fast and must not call back into the bus.

use std::sync::{PoisonError, RwLock};

use rust_decimal::Decimal;

use tallyard_shared::types::{
    AllocationId, MaterialId, ReallocationActionId, UsageRequestId, WorkOrderId,
};

use crate::ledger::AllocationStatus;

/// A committed change to the allocation ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerEvent {
    /// A new allocation was opened for a work-order/material pairing.
    AllocationOpened {
        /// The new allocation.
        allocation_id: AllocationId,
        /// Work order the allocation belongs to.
        work_order_id: WorkOrderId,
        /// Material the allocation binds.
        material_id: MaterialId,
    },
    /// Quantity was assigned through procurement.
    QuantityAllocated {
        /// The allocation that grew.
        allocation_id: AllocationId,
        /// Work order the allocation belongs to.
        work_order_id: WorkOrderId,
        /// Quantity added to the allocation.
        quantity: Decimal,
    },
    /// A usage report was reconciled into the ledger.
    UsageRecorded {
        /// The allocation the usage was recorded against.
        allocation_id: AllocationId,
        /// Work order the allocation belongs to.
        work_order_id: WorkOrderId,
        /// Idempotency id of the usage request.
        request_id: UsageRequestId,
    },
    /// Quantity moved between allocations, or in or out of one.
    Reallocated {
        /// Audit trail id of the action.
        action_id: ReallocationActionId,
        /// Source allocation, when quantity was taken from one.
        from_allocation_id: Option<AllocationId>,
        /// Target allocation, when quantity was given to one.
        to_allocation_id: Option<AllocationId>,
        /// Quantity moved.
        quantity: Decimal,
    },
    /// An allocation moved forward through its lifecycle.
    StatusChanged {
        /// The allocation that moved.
        allocation_id: AllocationId,
        /// Status before the move.
        from: AllocationStatus,
        /// Status after the move.
        to: AllocationStatus,
    },
}

type Subscriber = Box<dyn Fn(&LedgerEvent) + Send + Sync>;

/// Synchronous fan-out of ledger events to in-process subscribers.
pub struct LedgerEventBus {
    subscribers: RwLock<Vec<Subscriber>>,
}

impl LedgerEventBus {
    /// Creates a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Registers a subscriber. Delivery follows registration order.
    pub fn subscribe(&self, subscriber: impl Fn(&LedgerEvent) + Send + Sync + 'static) {
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(subscriber));
    }

    /// Delivers an event to every subscriber, in order.
    pub fn publish(&self, event: &LedgerEvent) {
        let subscribers = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        for subscriber in subscribers.iter() {
            subscriber(event);
        }
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for LedgerEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LedgerEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerEventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
