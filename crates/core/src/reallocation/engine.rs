//! Cross-work-order quantity moves.
//!
//! The engine adjusts allocations when material moves between work
//! orders: releasing unneeded quantity, topping an allocation up, or
//! transferring between two allocations in one atomic step. Only
//! unconsumed quantity ever moves; used, wasted, and returned counters
//! are history and stay put.

use rust_decimal::Decimal;

use crate::ledger::{Allocation, LedgerError};

/// Stateless quantity moves over one or two allocations.
pub struct ReallocationEngine;

impl ReallocationEngine {
    /// Releases unconsumed quantity from an allocation.
    ///
    /// Lowers allocated and remaining together, so the conservation
    /// law holds without touching consumption history.
    ///
    /// # Errors
    ///
    /// Returns an error if the allocation is terminal, `quantity` is
    /// not positive, or `quantity` exceeds the remaining quantity.
    pub fn reduce(allocation: &mut Allocation, quantity: Decimal) -> Result<(), LedgerError> {
        allocation.apply_reduce(quantity)
    }

    /// Adds quantity to an allocation.
    ///
    /// Legal in any non-terminal status; material arriving through a
    /// reallocation does not reopen procurement.
    ///
    /// # Errors
    ///
    /// Returns an error if the allocation is terminal or `quantity` is
    /// not positive.
    pub fn increase(allocation: &mut Allocation, quantity: Decimal) -> Result<(), LedgerError> {
        allocation.apply_increase(quantity)
    }

    /// Moves quantity from one allocation to another, all or nothing.
    ///
    /// Both allocations change or neither does; a failure on either
    /// side leaves both exactly as they were.
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as
    /// [`ReallocationEngine::reduce`] on the source or
    /// [`ReallocationEngine::increase`] on the target.
    pub fn transfer(
        from: &mut Allocation,
        to: &mut Allocation,
        quantity: Decimal,
    ) -> Result<(), LedgerError> {
        let mut from_next = from.clone();
        let mut to_next = to.clone();

        from_next.apply_reduce(quantity)?;
        to_next.apply_increase(quantity)?;

        *from = from_next;
        *to = to_next;
        Ok(())
    }
}
