//! In-memory material catalog.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use rust_decimal::Decimal;
use tallyard_core::catalog::{MaterialCatalog, MaterialCatalogEntry};
use tallyard_shared::types::MaterialId;

/// Material catalog backed by process memory.
///
/// Entries are upserted whole; unit costs can be patched separately
/// because pricing usually arrives later than the material master data.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    entries: RwLock<HashMap<MaterialId, MaterialCatalogEntry>>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Adds or replaces a catalog entry, returning the previous one.
    pub fn upsert(&self, entry: MaterialCatalogEntry) -> Option<MaterialCatalogEntry> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entry.id, entry)
    }

    /// Sets the unit cost of an existing entry.
    ///
    /// Returns `false` when the material is not in the catalog.
    pub fn set_unit_cost(&self, material_id: MaterialId, unit_cost: Option<Decimal>) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.get_mut(&material_id) {
            Some(entry) => {
                entry.unit_cost = unit_cost;
                true
            }
            None => false,
        }
    }

    /// Number of catalog entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` when the catalog holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MaterialCatalog for InMemoryCatalog {
    fn entry(&self, material_id: MaterialId) -> Option<MaterialCatalogEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&material_id)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tallyard_core::catalog::{MaterialKind, PurchaseDetails};

    fn entry(material_id: MaterialId, unit_cost: Option<Decimal>) -> MaterialCatalogEntry {
        MaterialCatalogEntry {
            id: material_id,
            code: "GIPS-12.5".to_string(),
            name: "Gypsum board 12.5mm".to_string(),
            unit: "sheet".to_string(),
            kind: MaterialKind::Purchasable(PurchaseDetails {
                supplier: "Bouwmaat".to_string(),
                order_reference: None,
            }),
            unit_cost,
        }
    }

    #[test]
    fn test_upsert_and_lookup() {
        let catalog = InMemoryCatalog::new();
        assert!(catalog.is_empty());

        let material_id = MaterialId::new();
        assert!(catalog.upsert(entry(material_id, Some(dec!(2.50)))).is_none());
        assert_eq!(catalog.len(), 1);

        let found = catalog.entry(material_id).unwrap();
        assert_eq!(found.code, "GIPS-12.5");
        assert_eq!(catalog.unit_cost(material_id), Some(dec!(2.50)));
        assert!(catalog.entry(MaterialId::new()).is_none());
    }

    #[test]
    fn test_upsert_replaces_and_returns_previous() {
        let catalog = InMemoryCatalog::new();
        let material_id = MaterialId::new();
        catalog.upsert(entry(material_id, None));

        let mut updated = entry(material_id, Some(dec!(3.10)));
        updated.name = "Gypsum board 12.5mm moisture resistant".to_string();
        let previous = catalog.upsert(updated).unwrap();

        assert_eq!(previous.name, "Gypsum board 12.5mm");
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.unit_cost(material_id), Some(dec!(3.10)));
    }

    #[test]
    fn test_set_unit_cost() {
        let catalog = InMemoryCatalog::new();
        let material_id = MaterialId::new();
        catalog.upsert(entry(material_id, None));
        assert_eq!(catalog.unit_cost(material_id), None);

        assert!(catalog.set_unit_cost(material_id, Some(dec!(1.95))));
        assert_eq!(catalog.unit_cost(material_id), Some(dec!(1.95)));

        assert!(catalog.set_unit_cost(material_id, None));
        assert_eq!(catalog.unit_cost(material_id), None);

        assert!(!catalog.set_unit_cost(MaterialId::new(), Some(dec!(9.99))));
    }
}
