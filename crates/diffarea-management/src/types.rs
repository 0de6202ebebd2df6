//! Configuration and shared scalar types for diff-area management.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a shadow copy (snapshot).
pub type SnapshotId = Uuid;

/// Modern provider floor for a non-zero diff-area maximum: 300 MiB.
pub const DEFAULT_MIN_DIFF_AREA_BYTES: u64 = 300 * 1024 * 1024;

/// Floor used by legacy platforms where the storage-area size was fixed
/// at 100 MiB. Provided for hosts that still front such providers.
pub const LEGACY_MIN_DIFF_AREA_BYTES: u64 = 100 * 1024 * 1024;

/// Configuration for the management service.
///
/// Both values mirror limits the provider enforces on its side; keeping
/// them here lets every violation be rejected before provider traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagementConfig {
    /// Smallest accepted non-zero `maximum_bytes` for an association.
    ///
    /// Zero is never subject to this floor: it is the disable value and is
    /// only accepted when changing an existing association.
    pub min_diff_area_bytes: u64,

    /// Maximum number of storage-area volumes one source volume may be
    /// associated with. The system provider historically allows one;
    /// fan-out capable providers are served by raising this.
    pub max_associations_per_source: usize,
}

impl Default for ManagementConfig {
    fn default() -> Self {
        Self {
            min_diff_area_bytes: DEFAULT_MIN_DIFF_AREA_BYTES,
            max_associations_per_source: 1,
        }
    }
}

impl ManagementConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum accepted non-zero association size.
    pub fn with_min_diff_area_bytes(mut self, bytes: u64) -> Self {
        self.min_diff_area_bytes = bytes;
        self
    }

    /// Set the per-source association cap.
    pub fn with_max_associations_per_source(mut self, max: usize) -> Self {
        self.max_associations_per_source = max;
        self
    }
}
