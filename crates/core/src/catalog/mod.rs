//! Material catalog types and the lookup seam.
//!
//! - `types` - catalog entries and the purchasable/receivable taxonomy
//! - `provider` - the read-only [`MaterialCatalog`] trait

pub mod provider;
pub mod types;

pub use provider::MaterialCatalog;
pub use types::{MaterialCatalogEntry, MaterialKind, PurchaseDetails, ReceiptDetails};
