//! Work order cost aggregation.
//!
//! Pricing never fails: a material without a unit cost contributes a
//! zero-cost line, and the line keeps `unit_cost: None` so reports can
//! flag it.

use chrono::Utc;
use rust_decimal::Decimal;

use tallyard_shared::types::{percent_of, MaterialId, WorkOrderId};

use super::types::{AllocationSummary, CostBasis, MaterialCostLine, WorkOrderMaterialCost};
use crate::ledger::Allocation;

/// Stateless aggregation of allocation quantities into money.
pub struct CostAggregator;

impl CostAggregator {
    /// Prices every allocation of a work order and sums the lines.
    ///
    /// `unit_cost` is the catalog lookup; returning `None` for a
    /// material yields a zero-cost line rather than an error.
    #[must_use]
    pub fn work_order_cost<F>(
        work_order_id: WorkOrderId,
        allocations: &[Allocation],
        basis: CostBasis,
        unit_cost: F,
    ) -> WorkOrderMaterialCost
    where
        F: Fn(MaterialId) -> Option<Decimal>,
    {
        let lines: Vec<MaterialCostLine> = allocations
            .iter()
            .map(|allocation| {
                let quantity = basis.quantity_of(allocation);
                let unit_cost = unit_cost(allocation.material_id());
                let line_cost = unit_cost.map_or(Decimal::ZERO, |cost| quantity * cost);
                MaterialCostLine {
                    allocation_id: allocation.id(),
                    material_id: allocation.material_id(),
                    quantity,
                    unit_cost,
                    line_cost,
                }
            })
            .collect();

        let total_cost = lines.iter().map(|line| line.line_cost).sum();

        WorkOrderMaterialCost {
            work_order_id,
            basis,
            lines,
            total_cost,
            computed_at: Utc::now(),
            cached: false,
        }
    }

    /// Totals a work order's allocations into one summary row.
    ///
    /// Utilization is used over allocated as a percentage; a work
    /// order with nothing allocated reports zero.
    #[must_use]
    pub fn summarize_work_order(
        work_order_id: WorkOrderId,
        allocations: &[Allocation],
    ) -> AllocationSummary {
        let mut total_allocated = Decimal::ZERO;
        let mut total_used = Decimal::ZERO;
        let mut total_remaining = Decimal::ZERO;
        for allocation in allocations {
            total_allocated += allocation.allocated_quantity();
            total_used += allocation.used_quantity();
            total_remaining += allocation.remaining_quantity();
        }

        AllocationSummary {
            work_order_id,
            total_allocated,
            total_used,
            total_remaining,
            utilization_rate: percent_of(total_used, total_allocated),
        }
    }
}
