//! Read-only query result rows.
//!
//! Rows are derived on every query from the registry plus live provider
//! figures; nothing here is stored.

use crate::domain::volume::VolumeName;
use serde::{Deserialize, Serialize};

/// One diff-area association with live capacity figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffAreaProperties {
    /// Volume being snapshotted.
    pub source: VolumeName,
    /// Volume holding the storage area.
    pub storage: VolumeName,
    /// Configured ceiling for the storage area; zero when disabled.
    pub maximum_bytes: u64,
    /// Bytes the provider has currently reserved for the storage area.
    pub allocated_bytes: u64,
    /// Bytes of copy-on-write data actually written.
    pub used_bytes: u64,
    /// Whether the storage area is released on dissociation.
    pub is_volatile: bool,
}

/// One candidate storage volume able to host diff areas for a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffVolumeProperties {
    /// The candidate storage volume.
    pub volume: VolumeName,
    /// Human-readable name the provider enumerates the volume under.
    pub display_name: String,
    /// Free bytes on the candidate.
    pub free_bytes: u64,
    /// Total bytes on the candidate.
    pub total_bytes: u64,
}
