//! # Outbound Ports (Driven Ports)
//!
//! The boundary to the storage-area provider: the OS-level subsystem that
//! actually allocates diff-area blocks, dismounts volumes, and reports
//! faults. This library validates and orchestrates; the provider decides.
//!
//! Production hosts wrap the native provider object behind this trait.
//! Testing: `InMemoryStorageAreaProvider` (adapters).

use crate::domain::association::AssociationKey;
use crate::domain::protection::{FailureStatus, ProtectionFault, ProtectionLevel};
use crate::domain::volume::VolumeName;
use crate::types::SnapshotId;
use thiserror::Error;

/// Failures the provider reports.
///
/// The `detail` strings are opaque provider diagnostics: the management
/// layer logs them verbatim and never interprets them.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Caller lacks backup privileges or is not an administrator.
    #[error("provider denied access: {detail}")]
    AccessDenied { detail: String },

    /// The referenced volume, association, or snapshot is unknown.
    #[error("provider object not found: {detail}")]
    ObjectNotFound { detail: String },

    /// The association already exists on the provider side.
    #[error("provider reports the association already exists: {detail}")]
    AlreadyExists { detail: String },

    /// The source volume is at its association cap.
    #[error("provider association limit reached: {detail}")]
    AssociationLimitReached { detail: String },

    /// Filesystem or free-space requirements not met by the storage volume.
    #[error("provider reports the volume unsupported: {detail}")]
    VolumeNotSupported { detail: String },

    /// Not enough free space for the requested size.
    #[error("provider reports insufficient storage: {detail}")]
    InsufficientStorage { detail: String },

    /// A live shadow copy depends on the storage area.
    #[error("provider reports the storage area in use: {detail}")]
    VolumeInUse { detail: String },

    /// Provider business rule rejected the operation.
    #[error("provider veto: {detail}")]
    Vetoed { detail: String },

    /// The provider does not implement the capability at all.
    #[error("provider capability not implemented: {detail}")]
    NotImplemented { detail: String },

    /// Resource exhaustion or an unclassified provider failure.
    #[error("unexpected provider failure: {detail}")]
    Unexpected { detail: String },
}

/// How the provider disposed of a resize request.
///
/// A resize may not take effect until the next snapshot cycle; the
/// disposition reports what the provider actually did now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeDisposition {
    /// New maximum recorded; the association stays active.
    Resized,
    /// Maximum set to zero; the association is disabled but still present
    /// because a live shadow copy depends on it.
    Disabled,
    /// Maximum set to zero and nothing depended on the association, so the
    /// provider removed it outright.
    Removed,
}

/// Provider view of one association, with live capacity figures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffAreaReport {
    pub source: VolumeName,
    pub storage: VolumeName,
    pub maximum_bytes: u64,
    pub allocated_bytes: u64,
    pub used_bytes: u64,
    pub is_volatile: bool,
}

/// Live capacity figures for one association.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffAreaUsage {
    pub allocated_bytes: u64,
    pub used_bytes: u64,
}

/// Provider verdict on one candidate storage volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeSupport {
    /// Whether the candidate meets filesystem and free-space requirements.
    pub supported: bool,
    /// Human-readable name the provider enumerates the volume under.
    pub display_name: String,
    pub free_bytes: u64,
    pub total_bytes: u64,
}

/// Authoritative protection answer for one volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectionReport {
    pub level: Option<ProtectionLevel>,
    pub fault: ProtectionFault,
    pub status: FailureStatus,
    pub is_offline: bool,
    pub has_unused_diff_area: bool,
}

/// Abstract interface to the storage-area provider.
///
/// All calls are synchronous request/response; timeouts are the
/// implementation's concern and surface as `ProviderError::Unexpected`.
/// The provider is not assumed reentrant-safe for the same association:
/// hosts serialize logically-conflicting callers.
pub trait StorageAreaProvider: Send + Sync {
    /// Whether the named volume resolves on this system.
    fn volume_exists(&self, volume: &VolumeName) -> Result<bool, ProviderError>;

    /// Durably create a diff-area association.
    fn create_association(
        &mut self,
        source: &VolumeName,
        storage: &VolumeName,
        maximum_bytes: u64,
    ) -> Result<(), ProviderError>;

    /// Resize an existing association; zero disables it.
    fn resize_association(
        &mut self,
        source: &VolumeName,
        storage: &VolumeName,
        maximum_bytes: u64,
        is_volatile: bool,
    ) -> Result<ResizeDisposition, ProviderError>;

    /// Remove every association resident on `storage` that no live shadow
    /// copy depends on. Returns the keys actually reclaimed; in-use
    /// associations are left untouched and not reported.
    fn delete_unused_associations(
        &mut self,
        storage: &VolumeName,
    ) -> Result<Vec<AssociationKey>, ProviderError>;

    /// Associations backing the given shadow copy, in provider enumeration
    /// order.
    fn associations_for_snapshot(
        &self,
        snapshot_id: SnapshotId,
    ) -> Result<Vec<DiffAreaReport>, ProviderError>;

    /// Live capacity figures for one association.
    fn association_usage(
        &self,
        source: &VolumeName,
        storage: &VolumeName,
    ) -> Result<DiffAreaUsage, ProviderError>;

    /// Every volume the provider would consider as a storage-area host,
    /// in deterministic enumeration order.
    fn candidate_storage_volumes(&self) -> Result<Vec<VolumeName>, ProviderError>;

    /// Whether `candidate` can host diff areas for `source`.
    fn storage_volume_support(
        &self,
        source: &VolumeName,
        candidate: &VolumeName,
    ) -> Result<VolumeSupport, ProviderError>;

    /// Live protection state of a volume.
    fn protection_report(&self, volume: &VolumeName) -> Result<ProtectionReport, ProviderError>;

    /// Apply a protection level to a volume.
    fn set_protection_level(
        &mut self,
        volume: &VolumeName,
        level: ProtectionLevel,
    ) -> Result<(), ProviderError>;

    /// Dismount a volume so a protection transition can proceed safely.
    fn dismount_volume(&mut self, volume: &VolumeName) -> Result<(), ProviderError>;

    /// Reset a volume's protection fault so normal I/O can resume.
    fn clear_protection_fault(&mut self, volume: &VolumeName) -> Result<(), ProviderError>;
}
