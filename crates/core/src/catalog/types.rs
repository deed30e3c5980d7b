//! Material catalog entries and the material kind taxonomy.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tallyard_shared::types::MaterialId;

/// Procurement details for material bought for the work order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseDetails {
    /// Supplier the material is ordered from.
    pub supplier: String,
    /// Purchase order reference, when one exists.
    pub order_reference: Option<String>,
}

/// Intake details for material drawn from own stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptDetails {
    /// Warehouse or yard location the material came from.
    pub source_location: String,
    /// Goods receipt reference, when one exists.
    pub receipt_reference: Option<String>,
}

/// How a material arrives on site.
///
/// Every consumer matches this exhaustively; adding a kind is a
/// compile error at each call site until it is handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaterialKind {
    /// Bought from a supplier for this work order.
    Purchasable(PurchaseDetails),
    /// Drawn from own stock or a goods receipt.
    Receivable(ReceiptDetails),
}

impl MaterialKind {
    /// Returns the snake_case tag used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Purchasable(_) => "purchasable",
            Self::Receivable(_) => "receivable",
        }
    }

    /// Returns true for material bought from a supplier.
    #[must_use]
    pub const fn is_purchasable(&self) -> bool {
        matches!(self, Self::Purchasable(_))
    }

    /// Returns true for material drawn from own stock.
    #[must_use]
    pub const fn is_receivable(&self) -> bool {
        matches!(self, Self::Receivable(_))
    }
}

impl std::fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One material as the catalog knows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialCatalogEntry {
    /// Stable identity of the material.
    pub id: MaterialId,
    /// Short article code, e.g. `"GIPS-12.5"`.
    pub code: String,
    /// Human-readable name.
    pub name: String,
    /// Unit the quantities are counted in, e.g. `"m2"` or `"pcs"`.
    pub unit: String,
    /// How the material arrives on site.
    pub kind: MaterialKind,
    /// Cost per unit. `None` when pricing is not yet known.
    pub unit_cost: Option<Decimal>,
}
