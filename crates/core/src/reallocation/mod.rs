//! Cross-work-order reallocation.
//!
//! - `engine` - reduce, increase, and atomic transfer of quantity
//! - `triage` - presentation ordering for reallocation candidates

pub mod engine;
pub mod triage;

#[cfg(test)]
mod engine_props;

pub use engine::ReallocationEngine;
pub use triage::{rank_candidates, TriageCandidate};
