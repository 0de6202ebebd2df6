//! Error types for the diff-area management subsystem
//!
//! One variant per failure kind of the public contract. Validation failures
//! are raised before any provider traffic; provider-reported failures are
//! translated 1:1 in the service layer and never retried internally.

use crate::domain::association::AssociationKey;
use crate::domain::volume::VolumeName;
use thiserror::Error;

/// Diff-area management errors.
#[derive(Debug, Error)]
pub enum DiffAreaError {
    /// Malformed volume identifier or invalid parameter combination.
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Caller lacks the required backup/administrator privilege.
    #[error("Permission denied: {detail}")]
    PermissionDenied { detail: String },

    /// Referenced association, volume, or snapshot does not exist.
    #[error("Not found: {object}")]
    NotFound { object: String },

    /// The `(source, storage)` association already exists.
    #[error("Diff area association already exists: {key}")]
    AlreadyExists { key: AssociationKey },

    /// The source volume already carries the maximum number of associations.
    #[error("Maximum diff area associations reached for {volume}: limit {limit}")]
    LimitReached { volume: VolumeName, limit: usize },

    /// The storage volume fails filesystem or free-space requirements.
    #[error("Storage volume not supported: {storage}: {reason}")]
    NotSupported {
        storage: VolumeName,
        reason: String,
    },

    /// Resize below current usage, or no free space left for the provider.
    #[error("Insufficient storage on {volume}: {detail}")]
    InsufficientStorage { volume: VolumeName, detail: String },

    /// A live shadow copy currently depends on the resource.
    #[error("Resource in use by a live shadow copy: {detail}")]
    InUse { detail: String },

    /// Provider-side business-rule rejection (e.g. unsafe protection transition).
    #[error("Provider vetoed the operation: {detail}")]
    ProviderVeto { detail: String },

    /// The provider lacks the requested capability. Terminal; do not retry.
    #[error("Provider does not implement this capability: {detail}")]
    NotImplemented { detail: String },

    /// Resource exhaustion or unexpected provider failure. Caller may retry.
    #[error("Transient provider failure: {detail}")]
    Transient { detail: String },
}

impl DiffAreaError {
    /// Build an `InvalidArgument` from anything printable.
    pub fn invalid(reason: impl Into<String>) -> Self {
        DiffAreaError::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Build a `NotFound` describing the missing object.
    pub fn not_found(object: impl Into<String>) -> Self {
        DiffAreaError::NotFound {
            object: object.into(),
        }
    }

    /// Whether a caller retry can ever succeed without external intervention.
    pub fn is_retriable(&self) -> bool {
        matches!(self, DiffAreaError::Transient { .. })
    }
}

/// Result type for diff-area management operations.
pub type DiffAreaResult<T> = Result<T, DiffAreaError>;
