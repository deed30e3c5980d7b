//! Property-based tests for the allocation aggregate.
//!
//! These drive random operation sequences through an allocation and
//! check the guarantees that must survive any interleaving: quantity
//! conservation, all-or-nothing mutation on failure, and monotonic
//! lifecycle status.

use proptest::prelude::*;
use rust_decimal::Decimal;

use tallyard_shared::types::{MaterialId, WorkOrderId};

use super::allocation::Allocation;
use super::error::LedgerError;
use super::types::{AllocationStatus, UsageDelta};
use crate::catalog::{MaterialKind, ReceiptDetails};

/// One randomly chosen mutation against an allocation.
#[derive(Debug, Clone)]
enum AllocOp {
    Allocate(Decimal),
    Usage(UsageDelta),
    Increase(Decimal),
    Reduce(Decimal),
    Transition(AllocationStatus),
    Finalize,
}

fn apply(allocation: &mut Allocation, op: &AllocOp) -> Result<(), LedgerError> {
    match op {
        AllocOp::Allocate(quantity) => allocation.allocate(*quantity),
        AllocOp::Usage(delta) => allocation.apply_usage(delta),
        AllocOp::Increase(quantity) => allocation.apply_increase(*quantity),
        AllocOp::Reduce(quantity) => allocation.apply_reduce(*quantity),
        AllocOp::Transition(next) => allocation.transition_status(*next),
        AllocOp::Finalize => allocation.finalize(),
    }
}

fn make_allocation() -> Allocation {
    Allocation::open(
        WorkOrderId::new(),
        MaterialId::new(),
        MaterialKind::Receivable(ReceiptDetails {
            source_location: "yard".to_string(),
            receipt_reference: None,
        }),
    )
}

/// Quantities with two decimal places, up to 500.00.
fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=50_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn delta_strategy() -> impl Strategy<Value = UsageDelta> {
    (quantity_strategy(), quantity_strategy(), quantity_strategy()).prop_map(
        |(used, wasted, returned)| UsageDelta {
            used,
            wasted,
            returned,
        },
    )
}

fn status_strategy() -> impl Strategy<Value = AllocationStatus> {
    prop_oneof![
        Just(AllocationStatus::Pending),
        Just(AllocationStatus::Ordered),
        Just(AllocationStatus::Delivered),
        Just(AllocationStatus::InUse),
        Just(AllocationStatus::Used),
    ]
}

fn op_strategy() -> impl Strategy<Value = AllocOp> {
    prop_oneof![
        quantity_strategy().prop_map(AllocOp::Allocate),
        delta_strategy().prop_map(AllocOp::Usage),
        quantity_strategy().prop_map(AllocOp::Increase),
        quantity_strategy().prop_map(AllocOp::Reduce),
        status_strategy().prop_map(AllocOp::Transition),
        Just(AllocOp::Finalize),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Conservation survives any operation sequence, accepted or not.
    #[test]
    fn prop_conservation_holds_after_any_sequence(
        ops in prop::collection::vec(op_strategy(), 1..40)
    ) {
        let mut allocation = make_allocation();
        for op in &ops {
            let _ = apply(&mut allocation, op);
            prop_assert!(allocation.conservation_holds());
            prop_assert!(!allocation.allocated_quantity().is_sign_negative());
            prop_assert!(!allocation.remaining_quantity().is_sign_negative());
        }
    }

    /// A rejected operation leaves the allocation exactly as it was.
    #[test]
    fn prop_failed_ops_leave_state_unchanged(
        ops in prop::collection::vec(op_strategy(), 1..40)
    ) {
        let mut allocation = make_allocation();
        for op in &ops {
            let before = allocation.clone();
            if apply(&mut allocation, op).is_err() {
                prop_assert_eq!(&allocation, &before);
            }
        }
    }

    /// Lifecycle status only ever moves forward.
    #[test]
    fn prop_status_never_moves_backward(
        ops in prop::collection::vec(op_strategy(), 1..40)
    ) {
        let mut allocation = make_allocation();
        let mut last_status = allocation.status();
        for op in &ops {
            let _ = apply(&mut allocation, op);
            prop_assert!(allocation.status() >= last_status);
            last_status = allocation.status();
        }
    }

    /// Only recording usage closes an allocation: a plain transition
    /// never lands on `Used`, however the sequence runs.
    #[test]
    fn prop_used_entered_only_by_recording_usage(
        ops in prop::collection::vec(op_strategy(), 1..40)
    ) {
        let mut allocation = make_allocation();
        let mut finalized = false;
        for op in &ops {
            let accepted = apply(&mut allocation, op).is_ok();
            if matches!(op, AllocOp::Transition(AllocationStatus::Used)) {
                prop_assert!(!accepted);
            }
            if accepted && matches!(op, AllocOp::Finalize) {
                finalized = true;
            }
        }
        prop_assert_eq!(
            allocation.status() == AllocationStatus::Used,
            finalized
        );
    }

    /// An accepted usage delta moves exactly its total out of remaining.
    #[test]
    fn prop_usage_consumes_exactly_the_delta(
        opening in quantity_strategy(),
        delta in delta_strategy(),
    ) {
        prop_assume!(opening > Decimal::ZERO);
        let mut allocation = make_allocation();
        allocation.allocate(opening).unwrap();

        let before_remaining = allocation.remaining_quantity();
        if allocation.apply_usage(&delta).is_ok() {
            prop_assert_eq!(
                allocation.remaining_quantity(),
                before_remaining - delta.total()
            );
            prop_assert_eq!(allocation.used_quantity(), delta.used);
            prop_assert_eq!(allocation.wasted_quantity(), delta.wasted);
            prop_assert_eq!(allocation.returned_quantity(), delta.returned);
        }
    }
}
