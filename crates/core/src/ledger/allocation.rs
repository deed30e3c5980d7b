//! Allocation aggregate and the quantity conservation invariant.
//!
//! The allocation is the ledger entry binding a quantity of one material
//! to one work order. This module is the sole owner of its quantity
//! fields: every mutation goes through a method that validates on
//! candidate values first, so a rejected call leaves the allocation
//! untouched, and re-checks the conservation law before assignment.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tallyard_shared::types::{AllocationId, MaterialId, UsageRequestId, WorkOrderId};

use super::error::LedgerError;
use super::types::{AllocationStatus, UsageDelta, UsageEvent};
use crate::catalog::MaterialKind;

/// Ledger entry for one work-order/material pairing.
///
/// Invariant, checked after every mutation:
/// `allocated == used + wasted + returned + remaining`, all non-negative.
///
/// Once status reaches [`AllocationStatus::Used`] the allocation is
/// immutable; mutating calls fail with [`LedgerError::TerminalState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    id: AllocationId,
    work_order_id: WorkOrderId,
    material_id: MaterialId,
    material_kind: MaterialKind,
    allocated_quantity: Decimal,
    used_quantity: Decimal,
    wasted_quantity: Decimal,
    returned_quantity: Decimal,
    remaining_quantity: Decimal,
    status: AllocationStatus,
    events: Vec<UsageEvent>,
    seen_requests: Vec<UsageRequestId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Allocation {
    /// Opens a new, empty allocation for a work-order/material pairing.
    ///
    /// The allocation starts in [`AllocationStatus::Pending`] with all
    /// quantity counters at zero.
    #[must_use]
    pub fn open(
        work_order_id: WorkOrderId,
        material_id: MaterialId,
        material_kind: MaterialKind,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: AllocationId::new(),
            work_order_id,
            material_id,
            material_kind,
            allocated_quantity: Decimal::ZERO,
            used_quantity: Decimal::ZERO,
            wasted_quantity: Decimal::ZERO,
            returned_quantity: Decimal::ZERO,
            remaining_quantity: Decimal::ZERO,
            status: AllocationStatus::Pending,
            events: Vec::new(),
            seen_requests: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    // ========== Accessors ==========

    /// Stable identity of this allocation.
    #[must_use]
    pub fn id(&self) -> AllocationId {
        self.id
    }

    /// The work order this allocation belongs to.
    #[must_use]
    pub fn work_order_id(&self) -> WorkOrderId {
        self.work_order_id
    }

    /// The material this allocation binds.
    #[must_use]
    pub fn material_id(&self) -> MaterialId {
        self.material_id
    }

    /// Whether the material is purchased or drawn from own stock.
    #[must_use]
    pub fn material_kind(&self) -> &MaterialKind {
        &self.material_kind
    }

    /// Total quantity assigned to the work order.
    #[must_use]
    pub fn allocated_quantity(&self) -> Decimal {
        self.allocated_quantity
    }

    /// Quantity consumed by the work.
    #[must_use]
    pub fn used_quantity(&self) -> Decimal {
        self.used_quantity
    }

    /// Quantity lost to damage or spoilage.
    #[must_use]
    pub fn wasted_quantity(&self) -> Decimal {
        self.wasted_quantity
    }

    /// Quantity sent back unused.
    #[must_use]
    pub fn returned_quantity(&self) -> Decimal {
        self.returned_quantity
    }

    /// Quantity not yet consumed, wasted, or returned.
    #[must_use]
    pub fn remaining_quantity(&self) -> Decimal {
        self.remaining_quantity
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> AllocationStatus {
        self.status
    }

    /// Append-only usage history, in recording order.
    #[must_use]
    pub fn events(&self) -> &[UsageEvent] {
        &self.events
    }

    /// When the allocation was opened.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the allocation was last mutated.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true if a usage request with this id was already applied.
    #[must_use]
    pub fn has_request(&self, request_id: UsageRequestId) -> bool {
        self.seen_requests.contains(&request_id)
    }

    /// Returns the events recorded by a specific usage request.
    #[must_use]
    pub fn events_for_request(&self, request_id: UsageRequestId) -> Vec<UsageEvent> {
        self.events
            .iter()
            .filter(|event| event.request_id == request_id)
            .cloned()
            .collect()
    }

    /// Returns true if the conservation law currently holds.
    #[must_use]
    pub fn conservation_holds(&self) -> bool {
        self.allocated_quantity
            == self.used_quantity
                + self.wasted_quantity
                + self.returned_quantity
                + self.remaining_quantity
    }

    // ========== Mutations ==========

    /// Assigns additional quantity through procurement.
    ///
    /// Raises allocated and remaining equally. Only legal while the
    /// allocation is still in procurement (`Pending` or `Ordered`);
    /// once material is on site, additional quantity must arrive
    /// through a reallocation.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `quantity` is zero or negative
    /// - the allocation is terminal
    /// - the allocation is past procurement
    pub fn allocate(&mut self, quantity: Decimal) -> Result<(), LedgerError> {
        if self.status.is_terminal() {
            return Err(LedgerError::TerminalState(self.id));
        }
        if quantity <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveQuantity);
        }
        if !self.status.allows_procurement() {
            return Err(LedgerError::ProcurementClosed(self.id));
        }

        self.assign_guarded(
            self.allocated_quantity + quantity,
            self.used_quantity,
            self.wasted_quantity,
            self.returned_quantity,
            self.remaining_quantity + quantity,
        )
    }

    /// Applies a reconciled usage delta to the counters.
    ///
    /// Decreases remaining by the delta total and raises the used,
    /// wasted, and returned counters by their components.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the allocation is terminal
    /// - any delta component is negative
    /// - the delta total exceeds the unconsumed quantity
    pub fn apply_usage(&mut self, delta: &UsageDelta) -> Result<(), LedgerError> {
        if self.status.is_terminal() {
            return Err(LedgerError::TerminalState(self.id));
        }
        if delta.has_negative_component() {
            return Err(LedgerError::NegativeQuantity);
        }
        let requested = delta.total();
        if requested > self.remaining_quantity {
            return Err(LedgerError::OverAllocation {
                requested,
                available: self.remaining_quantity,
            });
        }

        self.assign_guarded(
            self.allocated_quantity,
            self.used_quantity + delta.used,
            self.wasted_quantity + delta.wasted,
            self.returned_quantity + delta.returned,
            self.remaining_quantity - requested,
        )
    }

    /// Moves the allocation forward through its lifecycle.
    ///
    /// Forward jumps are legal; transitioning to the current status is
    /// a no-op. Backward moves and any move out of `Used` are rejected,
    /// and `Used` is never a legal target here: an allocation closes
    /// only when a usage report is recorded against it.
    ///
    /// # Errors
    ///
    /// Returns an error if the allocation is terminal or `next` lies
    /// behind the current status or is `Used`.
    pub fn transition_status(&mut self, next: AllocationStatus) -> Result<(), LedgerError> {
        if self.status.is_terminal() {
            return Err(LedgerError::TerminalState(self.id));
        }
        if next == AllocationStatus::Used || next < self.status {
            return Err(LedgerError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        if next != self.status {
            self.status = next;
            self.touch();
        }
        Ok(())
    }

    /// Closes the allocation once a usage report resolves it.
    ///
    /// The only path into `Used`; it is reserved for the usage
    /// reconciliation flow.
    pub(crate) fn finalize(&mut self) -> Result<(), LedgerError> {
        if self.status.is_terminal() {
            return Err(LedgerError::TerminalState(self.id));
        }
        self.status = AllocationStatus::Used;
        self.touch();
        Ok(())
    }

    /// Raises allocated and remaining for a reallocation increase.
    ///
    /// Unlike [`Allocation::allocate`], this path is legal in any
    /// non-terminal status; it is reserved for the reallocation engine.
    pub(crate) fn apply_increase(&mut self, quantity: Decimal) -> Result<(), LedgerError> {
        if self.status.is_terminal() {
            return Err(LedgerError::TerminalState(self.id));
        }
        if quantity <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveQuantity);
        }

        self.assign_guarded(
            self.allocated_quantity + quantity,
            self.used_quantity,
            self.wasted_quantity,
            self.returned_quantity,
            self.remaining_quantity + quantity,
        )
    }

    /// Lowers allocated and remaining for a reallocation release.
    ///
    /// Never touches quantity already used, wasted, or returned.
    pub(crate) fn apply_reduce(&mut self, quantity: Decimal) -> Result<(), LedgerError> {
        if self.status.is_terminal() {
            return Err(LedgerError::TerminalState(self.id));
        }
        if quantity <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveQuantity);
        }
        if quantity > self.remaining_quantity {
            return Err(LedgerError::InsufficientAvailability {
                requested: quantity,
                remaining: self.remaining_quantity,
            });
        }

        self.assign_guarded(
            self.allocated_quantity - quantity,
            self.used_quantity,
            self.wasted_quantity,
            self.returned_quantity,
            self.remaining_quantity - quantity,
        )
    }

    /// Appends an immutable usage event to the history.
    ///
    /// Callers must have validated the request; events on a terminal
    /// allocation are never appended because the mutating call before
    /// them already failed.
    pub(crate) fn record_event(&mut self, event: UsageEvent) {
        self.events.push(event);
        self.touch();
    }

    /// Marks a usage request id as applied for idempotent replay.
    pub(crate) fn mark_request(&mut self, request_id: UsageRequestId) {
        self.seen_requests.push(request_id);
    }

    /// Checks candidate counter values and assigns them atomically.
    ///
    /// The conservation law is a programming-error guard here: the
    /// callers already validated the request, so a failure aborts the
    /// mutation before any field changes and is reported as fatal.
    fn assign_guarded(
        &mut self,
        allocated: Decimal,
        used: Decimal,
        wasted: Decimal,
        returned: Decimal,
        remaining: Decimal,
    ) -> Result<(), LedgerError> {
        let non_negative = !allocated.is_sign_negative()
            && !used.is_sign_negative()
            && !wasted.is_sign_negative()
            && !returned.is_sign_negative()
            && !remaining.is_sign_negative();
        let conserved = allocated == used + wasted + returned + remaining;

        if !non_negative || !conserved {
            tracing::error!(
                allocation_id = %self.id,
                %allocated,
                %used,
                %wasted,
                %returned,
                %remaining,
                "conservation invariant violated, aborting mutation"
            );
            return Err(LedgerError::ConservationViolation {
                allocation_id: self.id,
                allocated,
                used,
                wasted,
                returned,
                remaining,
            });
        }

        self.allocated_quantity = allocated;
        self.used_quantity = used;
        self.wasted_quantity = wasted;
        self.returned_quantity = returned;
        self.remaining_quantity = remaining;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MaterialKind, PurchaseDetails};
    use rust_decimal_macros::dec;

    fn make_allocation() -> Allocation {
        Allocation::open(
            WorkOrderId::new(),
            MaterialId::new(),
            MaterialKind::Purchasable(PurchaseDetails {
                supplier: "Bouwmaat".to_string(),
                order_reference: None,
            }),
        )
    }

    fn allocated(quantity: Decimal) -> Allocation {
        let mut allocation = make_allocation();
        allocation.allocate(quantity).unwrap();
        allocation
    }

    #[test]
    fn test_open_starts_empty_and_pending() {
        let allocation = make_allocation();
        assert_eq!(allocation.status(), AllocationStatus::Pending);
        assert_eq!(allocation.allocated_quantity(), Decimal::ZERO);
        assert_eq!(allocation.remaining_quantity(), Decimal::ZERO);
        assert!(allocation.events().is_empty());
        assert!(allocation.conservation_holds());
    }

    #[test]
    fn test_allocate_raises_allocated_and_remaining() {
        let allocation = allocated(dec!(100));
        assert_eq!(allocation.allocated_quantity(), dec!(100));
        assert_eq!(allocation.remaining_quantity(), dec!(100));
        assert_eq!(allocation.used_quantity(), Decimal::ZERO);
        assert!(allocation.conservation_holds());
    }

    #[test]
    fn test_allocate_rejects_non_positive() {
        let mut allocation = make_allocation();
        assert!(matches!(
            allocation.allocate(Decimal::ZERO),
            Err(LedgerError::NonPositiveQuantity)
        ));
        assert!(matches!(
            allocation.allocate(dec!(-5)),
            Err(LedgerError::NonPositiveQuantity)
        ));
        assert_eq!(allocation.allocated_quantity(), Decimal::ZERO);
    }

    #[test]
    fn test_allocate_allowed_while_ordered() {
        let mut allocation = allocated(dec!(40));
        allocation
            .transition_status(AllocationStatus::Ordered)
            .unwrap();
        allocation.allocate(dec!(10)).unwrap();
        assert_eq!(allocation.allocated_quantity(), dec!(50));
    }

    #[test]
    fn test_allocate_rejected_after_delivery() {
        let mut allocation = allocated(dec!(40));
        allocation
            .transition_status(AllocationStatus::Delivered)
            .unwrap();
        let before = allocation.clone();
        assert!(matches!(
            allocation.allocate(dec!(10)),
            Err(LedgerError::ProcurementClosed(_))
        ));
        assert_eq!(allocation, before);
    }

    #[test]
    fn test_apply_usage_updates_counters() {
        let mut allocation = allocated(dec!(100));
        let delta = UsageDelta {
            used: dec!(60),
            wasted: dec!(10),
            returned: dec!(5),
        };
        allocation.apply_usage(&delta).unwrap();
        assert_eq!(allocation.used_quantity(), dec!(60));
        assert_eq!(allocation.wasted_quantity(), dec!(10));
        assert_eq!(allocation.returned_quantity(), dec!(5));
        assert_eq!(allocation.remaining_quantity(), dec!(25));
        assert!(allocation.conservation_holds());
    }

    #[test]
    fn test_apply_usage_rejects_over_allocation() {
        let mut allocation = allocated(dec!(100));
        let before = allocation.clone();
        let delta = UsageDelta {
            used: dec!(90),
            wasted: dec!(20),
            returned: Decimal::ZERO,
        };
        let result = allocation.apply_usage(&delta);
        assert!(matches!(
            result,
            Err(LedgerError::OverAllocation {
                requested,
                available,
            }) if requested == dec!(110) && available == dec!(100)
        ));
        assert_eq!(allocation, before);
    }

    #[test]
    fn test_apply_usage_rejects_negative_component() {
        let mut allocation = allocated(dec!(100));
        let before = allocation.clone();
        let delta = UsageDelta {
            used: dec!(-1),
            wasted: Decimal::ZERO,
            returned: Decimal::ZERO,
        };
        assert!(matches!(
            allocation.apply_usage(&delta),
            Err(LedgerError::NegativeQuantity)
        ));
        assert_eq!(allocation, before);
    }

    #[test]
    fn test_apply_usage_accounts_for_prior_consumption() {
        let mut allocation = allocated(dec!(100));
        allocation
            .apply_usage(&UsageDelta {
                used: dec!(70),
                ..UsageDelta::default()
            })
            .unwrap();
        let result = allocation.apply_usage(&UsageDelta {
            used: dec!(40),
            ..UsageDelta::default()
        });
        assert!(matches!(
            result,
            Err(LedgerError::OverAllocation { available, .. }) if available == dec!(30)
        ));
    }

    #[test]
    fn test_transition_forward_and_jump() {
        let mut allocation = make_allocation();
        allocation
            .transition_status(AllocationStatus::Ordered)
            .unwrap();
        assert_eq!(allocation.status(), AllocationStatus::Ordered);
        // Forward jump over Delivered is legal.
        allocation
            .transition_status(AllocationStatus::InUse)
            .unwrap();
        assert_eq!(allocation.status(), AllocationStatus::InUse);
    }

    #[test]
    fn test_transition_backward_rejected() {
        let mut allocation = make_allocation();
        allocation
            .transition_status(AllocationStatus::Delivered)
            .unwrap();
        let result = allocation.transition_status(AllocationStatus::Pending);
        assert!(matches!(
            result,
            Err(LedgerError::InvalidTransition {
                from: AllocationStatus::Delivered,
                to: AllocationStatus::Pending,
            })
        ));
    }

    #[test]
    fn test_transition_same_status_is_noop() {
        let mut allocation = make_allocation();
        allocation
            .transition_status(AllocationStatus::Pending)
            .unwrap();
        assert_eq!(allocation.status(), AllocationStatus::Pending);
    }

    #[test]
    fn test_transition_never_targets_used() {
        let mut allocation = allocated(dec!(10));
        allocation
            .transition_status(AllocationStatus::InUse)
            .unwrap();
        let result = allocation.transition_status(AllocationStatus::Used);
        assert!(matches!(
            result,
            Err(LedgerError::InvalidTransition {
                from: AllocationStatus::InUse,
                to: AllocationStatus::Used,
            })
        ));
        assert_eq!(allocation.status(), AllocationStatus::InUse);
    }

    #[test]
    fn test_finalize_closes_the_allocation() {
        let mut allocation = allocated(dec!(10));
        allocation.finalize().unwrap();
        assert_eq!(allocation.status(), AllocationStatus::Used);
        assert!(matches!(
            allocation.finalize(),
            Err(LedgerError::TerminalState(_))
        ));
    }

    #[test]
    fn test_terminal_blocks_every_mutation() {
        let mut allocation = allocated(dec!(10));
        allocation.finalize().unwrap();
        let before = allocation.clone();

        assert!(matches!(
            allocation.allocate(dec!(1)),
            Err(LedgerError::TerminalState(_))
        ));
        assert!(matches!(
            allocation.apply_usage(&UsageDelta {
                used: dec!(1),
                ..UsageDelta::default()
            }),
            Err(LedgerError::TerminalState(_))
        ));
        assert!(matches!(
            allocation.apply_increase(dec!(1)),
            Err(LedgerError::TerminalState(_))
        ));
        assert!(matches!(
            allocation.apply_reduce(dec!(1)),
            Err(LedgerError::TerminalState(_))
        ));
        assert!(matches!(
            allocation.transition_status(AllocationStatus::InUse),
            Err(LedgerError::TerminalState(_))
        ));
        assert_eq!(allocation, before);
    }

    #[test]
    fn test_reduce_requires_remaining() {
        let mut allocation = allocated(dec!(100));
        allocation.apply_reduce(dec!(30)).unwrap();
        assert_eq!(allocation.allocated_quantity(), dec!(70));
        assert_eq!(allocation.remaining_quantity(), dec!(70));

        let before = allocation.clone();
        let result = allocation.apply_reduce(dec!(80));
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientAvailability {
                requested,
                remaining,
            }) if requested == dec!(80) && remaining == dec!(70)
        ));
        assert_eq!(allocation, before);
    }

    #[test]
    fn test_increase_allowed_after_delivery() {
        let mut allocation = allocated(dec!(40));
        allocation
            .transition_status(AllocationStatus::InUse)
            .unwrap();
        allocation.apply_increase(dec!(20)).unwrap();
        assert_eq!(allocation.allocated_quantity(), dec!(60));
        assert_eq!(allocation.remaining_quantity(), dec!(60));
    }

    #[test]
    fn test_request_tracking() {
        let mut allocation = allocated(dec!(10));
        let request_id = UsageRequestId::new();
        assert!(!allocation.has_request(request_id));
        allocation.mark_request(request_id);
        assert!(allocation.has_request(request_id));
        assert!(allocation.events_for_request(request_id).is_empty());
    }
}
