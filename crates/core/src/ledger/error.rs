//! Ledger error types for validation and state errors.
//!
//! This module defines all errors that can occur during allocation
//! operations, including validation errors, availability errors,
//! terminal state errors, and concurrency errors.

use rust_decimal::Decimal;
use thiserror::Error;

use tallyard_shared::error::AppError;
use tallyard_shared::types::{AllocationId, MaterialId, WorkOrderId};

use super::types::AllocationStatus;

/// Errors that can occur during allocation ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Quantity must be strictly positive.
    #[error("Quantity must be positive")]
    NonPositiveQuantity,

    /// Quantity cannot be negative.
    #[error("Quantity cannot be negative")]
    NegativeQuantity,

    /// Waste was reported without a reason.
    #[error("A waste reason is required when wasted quantity is greater than zero")]
    WasteReasonRequired,

    /// A return was reported without a reason.
    #[error("A return reason is required when returned quantity is greater than zero")]
    ReturnReasonRequired,

    /// A reallocation was requested without a reason.
    #[error("A reason is required for reallocation")]
    ReasonRequired,

    /// A reallocation was requested with neither a source nor a destination.
    #[error("Reallocation requires a source allocation, a destination allocation, or both")]
    MissingEndpoints,

    /// A transfer was requested between an allocation and itself.
    #[error("Source and destination allocations must be different")]
    SameAllocation,

    /// Status may only move forward through the lifecycle.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: AllocationStatus,
        /// The requested status.
        to: AllocationStatus,
    },

    // ========== Availability Errors ==========
    /// Recorded quantities would exceed the allocated quantity.
    #[error("Recorded quantities exceed allocation. Requested: {requested}, Available: {available}")]
    OverAllocation {
        /// Total quantity the request tried to consume.
        requested: Decimal,
        /// Quantity still unconsumed on the allocation.
        available: Decimal,
    },

    /// A reduce or transfer asked for more than the remaining quantity.
    #[error("Not enough remaining quantity. Requested: {requested}, Remaining: {remaining}")]
    InsufficientAvailability {
        /// Quantity the request tried to move.
        requested: Decimal,
        /// Remaining quantity on the source allocation.
        remaining: Decimal,
    },

    /// Additional procurement is not allowed once material is on site.
    #[error("Allocation {0} is past procurement; additional quantity must come through a reallocation")]
    ProcurementClosed(AllocationId),

    // ========== Terminal State Errors ==========
    /// Mutation attempted on an allocation already marked used.
    #[error("Allocation {0} is closed and cannot be modified")]
    TerminalState(AllocationId),

    // ========== Not Found Errors ==========
    /// Allocation not found.
    #[error("Allocation not found: {0}")]
    AllocationNotFound(AllocationId),

    /// Material is not present in the catalog.
    #[error("Material not found in catalog: {0}")]
    MaterialNotInCatalog(MaterialId),

    // ========== Concurrency Errors ==========
    /// Version token did not match on save.
    #[error("Version conflict for allocation {allocation_id}: expected {expected}, got {actual}")]
    VersionConflict {
        /// The allocation that was concurrently modified.
        allocation_id: AllocationId,
        /// The version the writer expected.
        expected: i64,
        /// The version actually found.
        actual: i64,
    },

    /// An allocation for the same pairing was created concurrently.
    #[error("An allocation already exists for work order {work_order_id} and material {material_id}")]
    DuplicateAllocation {
        /// The work order of the pairing.
        work_order_id: WorkOrderId,
        /// The material of the pairing.
        material_id: MaterialId,
    },

    /// The bounded retry budget for conflicted saves was exhausted.
    #[error("Gave up saving allocation {allocation_id} after {attempts} conflicting attempts")]
    RetriesExhausted {
        /// The allocation that kept conflicting.
        allocation_id: AllocationId,
        /// How many attempts were made.
        attempts: u32,
    },

    // ========== Internal Errors ==========
    /// The conservation invariant did not hold. This is a defect, not
    /// a user error; the mutation is aborted before any side effect.
    #[error(
        "Conservation invariant violated for allocation {allocation_id}: \
         allocated {allocated} != used {used} + wasted {wasted} + returned {returned} + remaining {remaining}"
    )]
    ConservationViolation {
        /// The allocation whose counters disagree.
        allocation_id: AllocationId,
        /// Allocated quantity at check time.
        allocated: Decimal,
        /// Used quantity at check time.
        used: Decimal,
        /// Wasted quantity at check time.
        wasted: Decimal,
        /// Returned quantity at check time.
        returned: Decimal,
        /// Remaining quantity at check time.
        remaining: Decimal,
    },

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveQuantity => "NON_POSITIVE_QUANTITY",
            Self::NegativeQuantity => "NEGATIVE_QUANTITY",
            Self::WasteReasonRequired => "WASTE_REASON_REQUIRED",
            Self::ReturnReasonRequired => "RETURN_REASON_REQUIRED",
            Self::ReasonRequired => "REASON_REQUIRED",
            Self::MissingEndpoints => "MISSING_ENDPOINTS",
            Self::SameAllocation => "SAME_ALLOCATION",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::OverAllocation { .. } => "OVER_ALLOCATION",
            Self::InsufficientAvailability { .. } => "INSUFFICIENT_AVAILABILITY",
            Self::ProcurementClosed(_) => "PROCUREMENT_CLOSED",
            Self::TerminalState(_) => "TERMINAL_STATE",
            Self::AllocationNotFound(_) => "ALLOCATION_NOT_FOUND",
            Self::MaterialNotInCatalog(_) => "MATERIAL_NOT_IN_CATALOG",
            Self::VersionConflict { .. } => "VERSION_CONFLICT",
            Self::DuplicateAllocation { .. } => "DUPLICATE_ALLOCATION",
            Self::RetriesExhausted { .. } => "RETRIES_EXHAUSTED",
            Self::ConservationViolation { .. } => "CONSERVATION_VIOLATION",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::NonPositiveQuantity
            | Self::NegativeQuantity
            | Self::WasteReasonRequired
            | Self::ReturnReasonRequired
            | Self::ReasonRequired
            | Self::MissingEndpoints
            | Self::SameAllocation
            | Self::InvalidTransition { .. } => 400,

            // 404 Not Found
            Self::AllocationNotFound(_) | Self::MaterialNotInCatalog(_) => 404,

            // 409 Conflict - concurrency errors
            Self::VersionConflict { .. }
            | Self::DuplicateAllocation { .. }
            | Self::RetriesExhausted { .. } => 409,

            // 422 Unprocessable Entity - business rule rejections
            Self::OverAllocation { .. }
            | Self::InsufficientAvailability { .. }
            | Self::ProcurementClosed(_)
            | Self::TerminalState(_) => 422,

            // 500 Internal Server Error
            Self::ConservationViolation { .. } | Self::Storage(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// Retryable errors come from concurrent writers; re-loading the
    /// allocation and re-applying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::VersionConflict { .. } | Self::DuplicateAllocation { .. }
        )
    }

    /// Returns true if this error signals a defect rather than a
    /// rejected request.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConservationViolation { .. } | Self::Storage(_) | Self::Internal(_)
        )
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err.http_status_code() {
            400 => Self::Validation(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            422 => Self::BusinessRule(message),
            _ => match err {
                LedgerError::Storage(_) => Self::Storage(message),
                _ => Self::Internal(message),
            },
        }
    }
}
