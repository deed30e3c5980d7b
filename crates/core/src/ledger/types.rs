//! Ledger domain types.
//!
//! This module defines the allocation lifecycle status machine, usage
//! event records, usage deltas, and reallocation audit records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use tallyard_shared::types::{
    ActorId, AllocationId, ReallocationActionId, UsageEventId, UsageRequestId,
};

/// Allocation lifecycle status.
///
/// Allocations progress through these states from planning to closure.
/// Transitions are monotonic: forward moves (including skips) are legal,
/// backward moves never are, and `Used` is terminal. `Used` itself is
/// entered only by reconciling a usage report, never by a plain status
/// move.
///
/// `Delivered` covers both delivered purchasable material and material
/// received from own stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStatus {
    /// Material is planned but not yet ordered or pulled from stock.
    Pending,
    /// Material has been ordered from a supplier.
    Ordered,
    /// Material has arrived on site or been received from stock.
    Delivered,
    /// Material is being consumed on site.
    InUse,
    /// Final usage has been reconciled; the allocation is immutable.
    Used,
}

impl AllocationStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Ordered => "ordered",
            Self::Delivered => "delivered",
            Self::InUse => "in_use",
            Self::Used => "used",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "ordered" => Some(Self::Ordered),
            "delivered" => Some(Self::Delivered),
            "in_use" => Some(Self::InUse),
            "used" => Some(Self::Used),
            _ => None,
        }
    }

    /// Returns true if the allocation can still receive procurement.
    #[must_use]
    pub fn allows_procurement(&self) -> bool {
        matches!(self, Self::Pending | Self::Ordered)
    }

    /// Returns true if the allocation is immutable.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Used)
    }
}

impl fmt::Display for AllocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Urgency attached to reallocation actions and triage candidates.
///
/// Ordering follows urgency: `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Can wait.
    Low,
    /// Normal planning priority.
    Medium,
    /// Needed soon.
    High,
    /// Work is blocked without it.
    Critical,
}

impl Priority {
    /// Returns the string representation of the priority.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Parses a priority from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of usage event recorded during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageEventKind {
    /// Material consumed by the work.
    UsageUpdate,
    /// Material lost to damage or spoilage.
    Waste,
    /// Material sent back unused.
    Return,
}

impl UsageEventKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UsageUpdate => "usage_update",
            Self::Waste => "waste",
            Self::Return => "return",
        }
    }

    /// Returns true if events of this kind must carry a reason.
    #[must_use]
    pub fn requires_reason(&self) -> bool {
        matches!(self, Self::Waste | Self::Return)
    }
}

impl fmt::Display for UsageEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable record of material consumed, wasted, or returned.
///
/// Snapshot fields capture the allocation state after the full usage
/// request was applied, so the history is readable without replaying it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEvent {
    /// Unique identifier of this event.
    pub id: UsageEventId,
    /// Caller-supplied idempotency key of the request that produced it.
    pub request_id: UsageRequestId,
    /// Allocation the event belongs to.
    pub allocation_id: AllocationId,
    /// What happened to the material.
    pub kind: UsageEventKind,
    /// Quantity affected by this event.
    pub quantity: Decimal,
    /// Reason, required for waste and return events.
    pub reason: Option<String>,
    /// Who recorded the event.
    pub recorded_by: ActorId,
    /// When the event was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Total used quantity after the request was applied.
    pub cumulative_used: Decimal,
    /// Used share of the allocated quantity, in percent.
    pub usage_percentage: Decimal,
    /// Remaining quantity after the request was applied.
    pub remaining_after: Decimal,
}

/// Quantities reported by a single usage request.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UsageDelta {
    /// Quantity consumed by the work.
    pub used: Decimal,
    /// Quantity lost to damage or spoilage.
    pub wasted: Decimal,
    /// Quantity sent back unused.
    pub returned: Decimal,
}

impl UsageDelta {
    /// Total quantity the request consumes from the allocation.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.used + self.wasted + self.returned
    }

    /// Returns true if any component is negative.
    #[must_use]
    pub fn has_negative_component(&self) -> bool {
        self.used.is_sign_negative()
            || self.wasted.is_sign_negative()
            || self.returned.is_sign_negative()
    }
}

/// Immutable audit record of a reallocation.
///
/// A record with only a destination is a supply increase, one with only
/// a source is a release, and one with both is a transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReallocationAction {
    /// Unique identifier of this action.
    pub id: ReallocationActionId,
    /// Source allocation, if quantity was taken from one.
    pub from_allocation_id: Option<AllocationId>,
    /// Destination allocation, if quantity was given to one.
    pub to_allocation_id: Option<AllocationId>,
    /// Quantity moved.
    pub quantity: Decimal,
    /// Why the move was made.
    pub reason: String,
    /// Urgency assigned to the move.
    pub priority: Priority,
    /// Who performed the move.
    pub recorded_by: ActorId,
    /// When the move happened.
    pub occurred_at: DateTime<Utc>,
}
