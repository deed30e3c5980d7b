//! Usage report reconciliation.
//!
//! At work completion the crew reports what was used, wasted, and
//! returned. [`UsageService::record`] validates the report, applies it
//! to the allocation, appends the audit events, and finalizes the
//! allocation as `Used`. The whole step is all-or-nothing: a rejected
//! report leaves the allocation untouched.

use chrono::Utc;
use rust_decimal::Decimal;

use tallyard_shared::types::{percent_of, ActorId, AllocationId, UsageEventId, UsageRequestId};

use crate::documents::FileRef;
use crate::ledger::{Allocation, LedgerError, UsageDelta, UsageEvent, UsageEventKind};

/// One usage report, as submitted from the field.
///
/// `request_id` is supplied by the caller and makes the report
/// idempotent: replaying the same id is a no-op that returns the
/// originally recorded events.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordUsageInput {
    /// Caller-supplied idempotency id for this report.
    pub request_id: UsageRequestId,
    /// Allocation the report is filed against.
    pub allocation_id: AllocationId,
    /// Quantity consumed by the work.
    pub used: Decimal,
    /// Quantity lost to damage or spoilage.
    pub wasted: Decimal,
    /// Why material was wasted. Required when `wasted` is positive.
    pub waste_reason: Option<String>,
    /// Quantity sent back unused.
    pub returned: Decimal,
    /// Why material was returned. Required when `returned` is positive.
    pub return_reason: Option<String>,
    /// Who filed the report.
    pub recorded_by: ActorId,
    /// Photos and delivery notes to attach after the report commits.
    pub photos: Vec<FileRef>,
}

/// What a recorded (or replayed) usage report produced.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageOutcome {
    /// Events this request appended, in recording order.
    pub events: Vec<UsageEvent>,
    /// True when the request id had already been applied and the
    /// allocation was left untouched.
    pub replayed: bool,
}

/// Stateless reconciliation of usage reports into an allocation.
pub struct UsageService;

impl UsageService {
    /// Reconciles one usage report into the allocation.
    ///
    /// On success the counters are updated, one event per non-zero
    /// component is appended, and the allocation is finalized as
    /// `Used`. Replaying an already-applied `request_id` returns the
    /// prior events without mutating.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the allocation is already terminal under a new request id
    /// - any reported quantity is negative
    /// - the report total exceeds the unconsumed quantity
    /// - waste or return is positive without a reason
    pub fn record(
        allocation: &mut Allocation,
        input: &RecordUsageInput,
    ) -> Result<UsageOutcome, LedgerError> {
        if allocation.has_request(input.request_id) {
            return Ok(UsageOutcome {
                events: allocation.events_for_request(input.request_id),
                replayed: true,
            });
        }

        let delta = UsageDelta {
            used: input.used,
            wasted: input.wasted,
            returned: input.returned,
        };

        // Scratch copy; the caller's allocation only changes on success.
        let mut next = allocation.clone();
        next.apply_usage(&delta)?;

        if delta.wasted > Decimal::ZERO && is_blank(input.waste_reason.as_deref()) {
            return Err(LedgerError::WasteReasonRequired);
        }
        if delta.returned > Decimal::ZERO && is_blank(input.return_reason.as_deref()) {
            return Err(LedgerError::ReturnReasonRequired);
        }

        let recorded_at = Utc::now();
        let cumulative_used = next.used_quantity();
        let usage_percentage = percent_of(cumulative_used, next.allocated_quantity());
        let remaining_after = next.remaining_quantity();

        let mut events = Vec::new();
        let mut push_event = |kind: UsageEventKind, quantity, reason: Option<&String>| {
            events.push(UsageEvent {
                id: UsageEventId::new(),
                request_id: input.request_id,
                allocation_id: input.allocation_id,
                kind,
                quantity,
                reason: reason.cloned(),
                recorded_by: input.recorded_by,
                recorded_at,
                cumulative_used,
                usage_percentage,
                remaining_after,
            });
        };

        if delta.used > Decimal::ZERO {
            push_event(UsageEventKind::UsageUpdate, delta.used, None);
        }
        if delta.wasted > Decimal::ZERO {
            push_event(
                UsageEventKind::Waste,
                delta.wasted,
                input.waste_reason.as_ref(),
            );
        }
        if delta.returned > Decimal::ZERO {
            push_event(
                UsageEventKind::Return,
                delta.returned,
                input.return_reason.as_ref(),
            );
        }

        for event in &events {
            next.record_event(event.clone());
        }
        next.mark_request(input.request_id);
        next.finalize()?;

        *allocation = next;
        Ok(UsageOutcome {
            events,
            replayed: false,
        })
    }
}

fn is_blank(reason: Option<&str>) -> bool {
    reason.is_none_or(|r| r.trim().is_empty())
}
