//! Property-based tests for the reallocation engine.

use proptest::prelude::*;
use rust_decimal::Decimal;

use tallyard_shared::types::{MaterialId, WorkOrderId};

use super::engine::ReallocationEngine;
use crate::catalog::{MaterialKind, ReceiptDetails};
use crate::ledger::{Allocation, AllocationStatus, UsageDelta};

fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=30_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn status_strategy() -> impl Strategy<Value = AllocationStatus> {
    prop_oneof![
        Just(AllocationStatus::Pending),
        Just(AllocationStatus::Delivered),
        Just(AllocationStatus::InUse),
        Just(AllocationStatus::Used),
    ]
}

/// An allocation with some quantity already consumed and an arbitrary
/// lifecycle position.
fn allocation_strategy() -> impl Strategy<Value = Allocation> {
    (quantity_strategy(), quantity_strategy(), status_strategy()).prop_map(
        |(opening, consumed, status)| {
            let mut allocation = Allocation::open(
                WorkOrderId::new(),
                MaterialId::new(),
                MaterialKind::Receivable(ReceiptDetails {
                    source_location: "yard-1".to_string(),
                    receipt_reference: None,
                }),
            );
            if opening > Decimal::ZERO {
                allocation.allocate(opening).unwrap();
            }
            let usable = consumed.min(allocation.remaining_quantity());
            if usable > Decimal::ZERO {
                allocation
                    .apply_usage(&UsageDelta {
                        used: usable,
                        ..UsageDelta::default()
                    })
                    .unwrap();
            }
            if status == AllocationStatus::Used {
                allocation.finalize().unwrap();
            } else {
                let _ = allocation.transition_status(status);
            }
            allocation
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A transfer moves quantity or moves nothing; the combined
    /// allocated total never changes either way.
    #[test]
    fn prop_transfer_preserves_combined_total(
        mut from in allocation_strategy(),
        mut to in allocation_strategy(),
        quantity in quantity_strategy(),
    ) {
        let combined = from.allocated_quantity() + to.allocated_quantity();
        let _ = ReallocationEngine::transfer(&mut from, &mut to, quantity);
        prop_assert_eq!(
            from.allocated_quantity() + to.allocated_quantity(),
            combined
        );
        prop_assert!(from.conservation_holds());
        prop_assert!(to.conservation_holds());
    }

    /// A failed transfer is indistinguishable from no call at all.
    #[test]
    fn prop_failed_transfer_changes_neither_side(
        mut from in allocation_strategy(),
        mut to in allocation_strategy(),
        quantity in quantity_strategy(),
    ) {
        let from_before = from.clone();
        let to_before = to.clone();
        if ReallocationEngine::transfer(&mut from, &mut to, quantity).is_err() {
            prop_assert_eq!(from, from_before);
            prop_assert_eq!(to, to_before);
        }
    }

    /// A successful transfer moves exactly the requested quantity.
    #[test]
    fn prop_successful_transfer_moves_exactly_the_quantity(
        mut from in allocation_strategy(),
        mut to in allocation_strategy(),
        quantity in quantity_strategy(),
    ) {
        let from_remaining = from.remaining_quantity();
        let to_remaining = to.remaining_quantity();
        if ReallocationEngine::transfer(&mut from, &mut to, quantity).is_ok() {
            prop_assert_eq!(from.remaining_quantity(), from_remaining - quantity);
            prop_assert_eq!(to.remaining_quantity(), to_remaining + quantity);
        }
    }

    /// Reductions never dip into consumed quantity.
    #[test]
    fn prop_reduce_never_touches_consumption(
        mut allocation in allocation_strategy(),
        quantity in quantity_strategy(),
    ) {
        let used = allocation.used_quantity();
        let wasted = allocation.wasted_quantity();
        let returned = allocation.returned_quantity();
        let _ = ReallocationEngine::reduce(&mut allocation, quantity);
        prop_assert_eq!(allocation.used_quantity(), used);
        prop_assert_eq!(allocation.wasted_quantity(), wasted);
        prop_assert_eq!(allocation.returned_quantity(), returned);
        prop_assert!(allocation.conservation_holds());
    }
}
