//! Catalog lookup seam.

use rust_decimal::Decimal;

use tallyard_shared::types::MaterialId;

use super::types::MaterialCatalogEntry;

/// Read-only access to the material catalog.
///
/// The ledger only ever reads the catalog, so the seam is synchronous;
/// implementations backed by a remote catalog should cache locally.
pub trait MaterialCatalog: Send + Sync {
    /// Looks up the catalog entry for a material.
    fn entry(&self, material_id: MaterialId) -> Option<MaterialCatalogEntry>;

    /// Returns the cost per unit for a material.
    ///
    /// `None` means the material is unknown or not yet priced; cost
    /// aggregation treats both as a zero-cost line.
    fn unit_cost(&self, material_id: MaterialId) -> Option<Decimal> {
        self.entry(material_id).and_then(|entry| entry.unit_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::{MaterialKind, ReceiptDetails};
    use rust_decimal_macros::dec;

    struct SingleEntryCatalog {
        entry: MaterialCatalogEntry,
    }

    impl MaterialCatalog for SingleEntryCatalog {
        fn entry(&self, material_id: MaterialId) -> Option<MaterialCatalogEntry> {
            (self.entry.id == material_id).then(|| self.entry.clone())
        }
    }

    #[test]
    fn test_unit_cost_defaults_through_entry() {
        let material_id = MaterialId::new();
        let catalog = SingleEntryCatalog {
            entry: MaterialCatalogEntry {
                id: material_id,
                code: "ZND-0".to_string(),
                name: "Sand".to_string(),
                unit: "kg".to_string(),
                kind: MaterialKind::Receivable(ReceiptDetails {
                    source_location: "yard-1".to_string(),
                    receipt_reference: None,
                }),
                unit_cost: Some(dec!(0.12)),
            },
        };

        assert_eq!(catalog.unit_cost(material_id), Some(dec!(0.12)));
        assert_eq!(catalog.unit_cost(MaterialId::new()), None);
    }
}
