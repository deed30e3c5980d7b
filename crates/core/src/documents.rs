//! Document attachment seam.
//!
//! Usage reports can carry photos and delivery notes. Attaching them
//! is a side channel: the ledger hands the file reference to a
//! [`DocumentService`] after the mutation is committed, logs failures,
//! and never lets them fail the mutation itself.

use serde::{Deserialize, Serialize};

use tallyard_shared::types::{AllocationId, FileRefId};

use crate::ledger::LedgerError;

/// Reference to an already-uploaded file.
///
/// Upload happens outside the ledger; by the time a usage report
/// reaches us the bytes are stored and only the reference travels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// Stable identity of the stored file.
    pub id: FileRefId,
    /// Original filename, e.g. `"delivery-note-0117.jpg"`.
    pub filename: String,
    /// MIME type when the uploader supplied one.
    pub content_type: Option<String>,
}

/// Attaches stored files to allocations.
pub trait DocumentService: Send + Sync {
    /// Links a stored file to an allocation.
    ///
    /// Called after the owning mutation committed; errors are logged
    /// by the caller and never unwind the mutation.
    fn attach(
        &self,
        allocation_id: AllocationId,
        file: FileRef,
    ) -> impl std::future::Future<Output = Result<(), LedgerError>> + Send;
}
