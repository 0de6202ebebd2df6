//! # Inbound Ports (Driving Ports)
//!
//! The public management API for diff-area associations and volume
//! protection. Implementations validate every command against the
//! in-memory registry before any provider traffic, delegate the durable
//! effect to the provider, and fold the authoritative result back.

use crate::domain::protection::{ProtectionLevel, VolumeProtectionInfo};
use crate::domain::query::{DiffAreaProperties, DiffVolumeProperties};
use crate::domain::volume::VolumeName;
use crate::error::DiffAreaResult;
use crate::types::SnapshotId;

/// Management API over diff-area associations and protection state.
///
/// All queries are side-effect-free projections; an empty result is a
/// legitimate answer, never an error. Result ordering follows provider
/// enumeration order and is not guaranteed stable across calls.
pub trait DiffAreaManagementApi {
    /// Associate a shadow copy storage area on `storage` with `source`.
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument`: malformed identifier, zero size, or a size
    ///   below the configured floor
    /// - `NotFound`: either volume does not resolve
    /// - `AlreadyExists`: the pair is already associated
    /// - `LimitReached`: `source` is at its association cap
    /// - `NotSupported`: `storage` fails filesystem/free-space requirements
    fn add_diff_area(
        &mut self,
        source: &VolumeName,
        storage: &VolumeName,
        maximum_bytes: u64,
    ) -> DiffAreaResult<()>;

    /// Change the maximum size (and optionally volatility) of an existing
    /// association. Passing `None` for `is_volatile` keeps the
    /// non-volatile default.
    ///
    /// Setting `maximum_bytes` to zero disables the association; this is
    /// the only removal path while a live shadow copy still depends on it.
    /// The change may not take effect until the next snapshot cycle.
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument`: sub-floor size, or volatile combined with zero
    /// - `NotFound`: no such association
    /// - `InUse`: a live shadow copy blocks the resize
    /// - `InsufficientStorage`: shrinking below current usage
    fn change_diff_area_maximum_size(
        &mut self,
        source: &VolumeName,
        storage: &VolumeName,
        maximum_bytes: u64,
        is_volatile: Option<bool>,
    ) -> DiffAreaResult<()>;

    /// Associations backing the given shadow copy.
    fn query_diff_areas_for_snapshot(
        &self,
        snapshot_id: SnapshotId,
    ) -> DiffAreaResult<Vec<DiffAreaProperties>>;

    /// Associations whose source is `source`.
    fn query_diff_areas_for_volume(
        &self,
        source: &VolumeName,
    ) -> DiffAreaResult<Vec<DiffAreaProperties>>;

    /// Associations physically resident on `storage`.
    fn query_diff_areas_on_volume(
        &self,
        storage: &VolumeName,
    ) -> DiffAreaResult<Vec<DiffAreaProperties>>;

    /// Candidate volumes able to host diff areas for `source`.
    ///
    /// A provider error for any single candidate aborts the whole call: a
    /// silently shortened list could steer the caller to a worse volume.
    fn query_volumes_supported_for_diff_areas(
        &self,
        source: &VolumeName,
    ) -> DiffAreaResult<Vec<DiffVolumeProperties>>;

    /// Reclaim every association on `storage` with no live shadow copy
    /// dependency. In-use associations are left untouched. Returns the
    /// number reclaimed.
    ///
    /// This is the only way to recover storage-area space once the source
    /// volume tied to an association is permanently gone.
    fn delete_unused_diff_areas(&mut self, storage: &VolumeName) -> DiffAreaResult<usize>;

    /// Live protection level and fault status for a volume. Always
    /// queried from the provider, never served from cache.
    fn get_volume_protection_level(
        &mut self,
        volume: &VolumeName,
    ) -> DiffAreaResult<VolumeProtectionInfo>;

    /// Set a volume's protection level.
    ///
    /// A no-op when the level already matches (a second call never
    /// re-dismounts). Moving a faulted volume to
    /// `ProtectionLevel::OriginalVolume` dismounts it first.
    ///
    /// ## Errors
    ///
    /// - `NotImplemented`: provider lacks protection support (terminal)
    /// - `ProviderVeto`: the provider rejected the transition as unsafe
    fn set_volume_protection_level(
        &mut self,
        volume: &VolumeName,
        level: ProtectionLevel,
    ) -> DiffAreaResult<()>;

    /// Dismount a faulted volume and resume normal I/O, restoring the
    /// protection state that was in force before the fault. A successful
    /// no-op when the volume is not faulted.
    fn clear_volume_protect_fault(&mut self, volume: &VolumeName) -> DiffAreaResult<()>;
}
