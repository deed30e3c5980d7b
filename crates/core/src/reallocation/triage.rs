//! Triage ordering for reallocation planning.
//!
//! When material runs short, planners look at which allocations could
//! give quantity up. The ordering here is presentation only: most
//! urgent need first, so the planner reads the list top to bottom.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use tallyard_shared::types::{AllocationId, WorkOrderId};

use crate::ledger::Priority;

/// One allocation as it appears on the triage list.
///
/// Priority and due date belong to the work order; callers join them
/// in when building the candidate set.
#[derive(Debug, Clone, PartialEq)]
pub struct TriageCandidate {
    /// The allocation under consideration.
    pub allocation_id: AllocationId,
    /// Work order the allocation belongs to.
    pub work_order_id: WorkOrderId,
    /// Priority of the owning work order.
    pub priority: Priority,
    /// Due date of the owning work order, when one is set.
    pub due_date: Option<NaiveDate>,
    /// Unconsumed quantity that could move.
    pub remaining: Decimal,
}

/// Orders candidates for the triage list.
///
/// Highest priority first, then earliest due date with undated work
/// orders last, then allocation id for a stable total order. Pure
/// presentation; nothing about the candidates changes.
#[must_use]
pub fn rank_candidates(mut candidates: Vec<TriageCandidate>) -> Vec<TriageCandidate> {
    candidates.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| match (a.due_date, b.due_date) {
                (Some(left), Some(right)) => left.cmp(&right),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
            .then_with(|| a.allocation_id.cmp(&b.allocation_id))
    });
    candidates
}
