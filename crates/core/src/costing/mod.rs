//! Material cost aggregation.
//!
//! - `types` - cost basis, cost lines, and work order snapshots
//! - `service` - the stateless aggregator
//! - `cache` - per-work-order snapshot cache

pub mod cache;
pub mod service;
pub mod types;

pub use cache::WorkOrderCostCache;
pub use service::CostAggregator;
pub use types::{AllocationSummary, CostBasis, MaterialCostLine, WorkOrderMaterialCost};
