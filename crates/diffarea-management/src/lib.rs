//! # diffarea-management
//!
//! Management layer for differential shadow-copy storage areas
//! ("diff areas"): the association between a source volume being
//! snapshotted and the storage-area volume holding its copy-on-write
//! deltas, plus the per-volume protection state used to recover from
//! storage-area exhaustion or failure.
//!
//! ## Overview
//!
//! This crate provides:
//! - **Association registry**: uniqueness, size-floor, and capacity
//!   invariants over `(source, storage)` pairs
//! - **Protection state machine**: explicit
//!   `Unprotected / Protected / Faulted` lifecycle with enforced
//!   dismount-before-protect ordering
//! - **Query engine**: four read-only projections (by snapshot, by source
//!   volume, by storage volume, by provider capability)
//! - **Provider port**: the actual snapshot and storage-area I/O is
//!   delegated to an injected `StorageAreaProvider`
//!
//! ## Architecture
//!
//! ```text
//! [Host / backup application]
//!         │
//!         ↓  DiffAreaManagementApi (ports::inbound)
//! [DiffAreaManagementService] ── ManagementState (registry + mirror)
//!         │
//!         ↓  StorageAreaProvider (ports::outbound)
//! [Native provider adapter]        production: OS shadow-copy subsystem
//! [InMemoryStorageAreaProvider]    testing: deterministic fake
//! ```
//!
//! The provider owns all durable state; the service validates commands
//! against its in-memory view, delegates the durable effect, and folds the
//! authoritative result back. Nothing survives a restart by design.
//!
//! ## Example
//!
//! ```rust
//! use diffarea_management::{
//!     DiffAreaManagementApi, DiffAreaManagementService, InMemoryStorageAreaProvider,
//!     ManagementConfig, VolumeName,
//! };
//!
//! let source = VolumeName::parse("D:\\").unwrap();
//! let storage = VolumeName::parse("E:\\").unwrap();
//!
//! let provider = InMemoryStorageAreaProvider::new()
//!     .with_volume(&source, "Data", 1 << 40, 1 << 39)
//!     .with_volume(&storage, "Backup", 1 << 41, 1 << 40);
//!
//! let mut mgmt = DiffAreaManagementService::new(provider, ManagementConfig::default());
//! mgmt.add_diff_area(&source, &storage, 500_000_000).unwrap();
//!
//! let areas = mgmt.query_diff_areas_for_volume(&source).unwrap();
//! assert_eq!(areas.len(), 1);
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;
pub mod state;
pub mod types;

pub use adapters::InMemoryStorageAreaProvider;
pub use domain::{
    AssociationKey, DiffAreaAssociation, DiffAreaProperties, DiffVolumeProperties, FailureStatus,
    ProtectionFault, ProtectionLevel, ProtectionState, VolumeName, VolumeNameKind,
    VolumeProtectionInfo,
};
pub use error::{DiffAreaError, DiffAreaResult};
pub use ports::{
    DiffAreaManagementApi, DiffAreaReport, DiffAreaUsage, ProtectionReport, ProviderError,
    ResizeDisposition, StorageAreaProvider, VolumeSupport,
};
pub use service::DiffAreaManagementService;
pub use state::ManagementState;
pub use types::{
    ManagementConfig, SnapshotId, DEFAULT_MIN_DIFF_AREA_BYTES, LEGACY_MIN_DIFF_AREA_BYTES,
};
