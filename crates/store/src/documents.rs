//! In-memory document attachment store.

use std::collections::HashMap;
use std::sync::Mutex;

use tallyard_core::documents::{DocumentService, FileRef};
use tallyard_core::ledger::LedgerError;
use tallyard_shared::types::AllocationId;

/// Document store backed by process memory.
///
/// Attachments are grouped per allocation in arrival order.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    attachments: Mutex<HashMap<AllocationId, Vec<FileRef>>>,
}

impl InMemoryDocumentStore {
    /// Creates an empty document store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            attachments: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the attachments recorded for an allocation, oldest first.
    #[must_use]
    pub fn attachments_for(&self, allocation_id: AllocationId) -> Vec<FileRef> {
        self.attachments
            .lock()
            .map(|attachments| attachments.get(&allocation_id).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Total number of attachments across all allocations.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.attachments
            .lock()
            .map(|attachments| attachments.values().map(Vec::len).sum())
            .unwrap_or_default()
    }
}

impl DocumentService for InMemoryDocumentStore {
    async fn attach(&self, allocation_id: AllocationId, file: FileRef) -> Result<(), LedgerError> {
        self.attachments
            .lock()
            .map_err(|_| LedgerError::Storage("document store lock poisoned".to_string()))?
            .entry(allocation_id)
            .or_default()
            .push(file);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tallyard_shared::types::FileRefId;

    fn photo(filename: &str) -> FileRef {
        FileRef {
            id: FileRefId::new(),
            filename: filename.to_string(),
            content_type: Some("image/jpeg".to_string()),
        }
    }

    #[tokio::test]
    async fn test_attach_groups_per_allocation() {
        let store = InMemoryDocumentStore::new();
        let first = AllocationId::new();
        let second = AllocationId::new();

        store.attach(first, photo("before.jpg")).await.unwrap();
        store.attach(first, photo("after.jpg")).await.unwrap();
        store.attach(second, photo("waste.jpg")).await.unwrap();

        let for_first = store.attachments_for(first);
        assert_eq!(for_first.len(), 2);
        assert_eq!(for_first[0].filename, "before.jpg");
        assert_eq!(for_first[1].filename, "after.jpg");
        assert_eq!(store.attachments_for(second).len(), 1);
        assert_eq!(store.total_count(), 3);
    }

    #[tokio::test]
    async fn test_unknown_allocation_has_no_attachments() {
        let store = InMemoryDocumentStore::new();
        assert!(store.attachments_for(AllocationId::new()).is_empty());
        assert_eq!(store.total_count(), 0);
    }
}
