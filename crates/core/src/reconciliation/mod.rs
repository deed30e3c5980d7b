//! Usage report reconciliation.
//!
//! - `service` - validates field reports and applies them to the ledger

pub mod service;

pub use service::{RecordUsageInput, UsageOutcome, UsageService};
