//! Cost aggregation types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tallyard_shared::types::{AllocationId, MaterialId, WorkOrderId};

use crate::ledger::Allocation;

/// Which quantity a cost line is priced on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostBasis {
    /// Quantity consumed by the work. The default.
    #[default]
    Used,
    /// Quantity gone for good: used plus wasted.
    Consumed,
    /// Everything assigned, whether consumed or not.
    Allocated,
}

impl CostBasis {
    /// Returns the snake_case name used in configuration.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Used => "used",
            Self::Consumed => "consumed",
            Self::Allocated => "allocated",
        }
    }

    /// Parses a basis name from configuration. Case-insensitive.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "used" => Some(Self::Used),
            "consumed" => Some(Self::Consumed),
            "allocated" => Some(Self::Allocated),
            _ => None,
        }
    }

    /// The quantity this basis prices for one allocation.
    #[must_use]
    pub fn quantity_of(&self, allocation: &Allocation) -> Decimal {
        match self {
            Self::Used => allocation.used_quantity(),
            Self::Consumed => allocation.used_quantity() + allocation.wasted_quantity(),
            Self::Allocated => allocation.allocated_quantity(),
        }
    }
}

impl std::fmt::Display for CostBasis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cost contribution of one allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialCostLine {
    /// The allocation this line prices.
    pub allocation_id: AllocationId,
    /// Material on the line.
    pub material_id: MaterialId,
    /// Quantity priced, per the chosen basis.
    pub quantity: Decimal,
    /// Cost per unit. `None` when the catalog has no price yet; the
    /// line then contributes zero.
    pub unit_cost: Option<Decimal>,
    /// `quantity` times `unit_cost`, zero when unpriced.
    pub line_cost: Decimal,
}

/// Material cost of one work order at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrderMaterialCost {
    /// The work order being priced.
    pub work_order_id: WorkOrderId,
    /// Quantity basis the lines were priced on.
    pub basis: CostBasis,
    /// One line per allocation of the work order.
    pub lines: Vec<MaterialCostLine>,
    /// Sum of the line costs.
    pub total_cost: Decimal,
    /// When the cost was computed.
    pub computed_at: DateTime<Utc>,
    /// True when this snapshot came out of the cache.
    pub cached: bool,
}

/// Aggregated quantities for one work order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSummary {
    /// The work order summarized.
    pub work_order_id: WorkOrderId,
    /// Sum of allocated quantity over all allocations.
    pub total_allocated: Decimal,
    /// Sum of used quantity over all allocations.
    pub total_used: Decimal,
    /// Sum of remaining quantity over all allocations.
    pub total_remaining: Decimal,
    /// Used share of allocated, as a percentage with two decimals.
    pub utilization_rate: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MaterialKind, PurchaseDetails};
    use crate::ledger::UsageDelta;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn worked_allocation() -> Allocation {
        let mut allocation = Allocation::open(
            WorkOrderId::new(),
            MaterialId::new(),
            MaterialKind::Purchasable(PurchaseDetails {
                supplier: "Bouwmaat".to_string(),
                order_reference: None,
            }),
        );
        allocation.allocate(dec!(100)).unwrap();
        allocation
            .apply_usage(&UsageDelta {
                used: dec!(60),
                wasted: dec!(10),
                returned: dec!(5),
            })
            .unwrap();
        allocation
    }

    #[test]
    fn test_default_basis_is_used() {
        assert_eq!(CostBasis::default(), CostBasis::Used);
    }

    #[rstest]
    #[case("used", CostBasis::Used)]
    #[case("Consumed", CostBasis::Consumed)]
    #[case("ALLOCATED", CostBasis::Allocated)]
    fn test_parse_known_names(#[case] input: &str, #[case] expected: CostBasis) {
        assert_eq!(CostBasis::parse(input), Some(expected));
    }

    #[test]
    fn test_parse_rejects_unknown_names() {
        assert_eq!(CostBasis::parse("billed"), None);
        assert_eq!(CostBasis::parse(""), None);
    }

    #[rstest]
    #[case(CostBasis::Used, dec!(60))]
    #[case(CostBasis::Consumed, dec!(70))]
    #[case(CostBasis::Allocated, dec!(100))]
    fn test_quantity_per_basis(#[case] basis: CostBasis, #[case] expected: Decimal) {
        let allocation = worked_allocation();
        assert_eq!(basis.quantity_of(&allocation), expected);
    }

    #[test]
    fn test_basis_display_roundtrip() {
        for basis in [CostBasis::Used, CostBasis::Consumed, CostBasis::Allocated] {
            assert_eq!(CostBasis::parse(&basis.to_string()), Some(basis));
        }
    }
}
