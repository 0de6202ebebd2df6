//! Diff-area association records and their registry invariants.

use crate::domain::volume::VolumeName;
use crate::error::{DiffAreaError, DiffAreaResult};
use crate::types::ManagementConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Registry key: one association per `(source, storage)` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssociationKey {
    /// Volume being snapshotted.
    pub source: VolumeName,
    /// Volume holding the copy-on-write storage area.
    pub storage: VolumeName,
}

impl AssociationKey {
    pub fn new(source: VolumeName, storage: VolumeName) -> Self {
        Self { source, storage }
    }
}

impl fmt::Display for AssociationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.storage)
    }
}

/// A shadow copy storage-area association.
///
/// `maximum_bytes == 0` means the association is disabled: the provider
/// stops growing the storage area and removes the association once no
/// live shadow copy depends on it. A disabled association is never
/// volatile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffAreaAssociation {
    pub source: VolumeName,
    pub storage: VolumeName,
    pub maximum_bytes: u64,
    pub is_volatile: bool,
}

impl DiffAreaAssociation {
    pub fn new(source: VolumeName, storage: VolumeName, maximum_bytes: u64) -> Self {
        Self {
            source,
            storage,
            maximum_bytes,
            is_volatile: false,
        }
    }

    /// Registry key of this association.
    pub fn key(&self) -> AssociationKey {
        AssociationKey::new(self.source.clone(), self.storage.clone())
    }

    /// Whether the association has been disabled via a zero maximum.
    pub fn is_disabled(&self) -> bool {
        self.maximum_bytes == 0
    }
}

/// Validate a `maximum_bytes` value for creating an association.
///
/// Zero is not a valid creation size; it is only meaningful as the disable
/// value on an existing association.
pub fn validate_add_maximum(maximum_bytes: u64, config: &ManagementConfig) -> DiffAreaResult<()> {
    if maximum_bytes == 0 {
        return Err(DiffAreaError::invalid(
            "maximum size of zero is only valid when changing an existing association",
        ));
    }
    validate_floor(maximum_bytes, config)
}

/// Validate a `(maximum_bytes, is_volatile)` pair for changing an
/// association.
pub fn validate_change_maximum(
    maximum_bytes: u64,
    is_volatile: bool,
    config: &ManagementConfig,
) -> DiffAreaResult<()> {
    if maximum_bytes == 0 {
        if is_volatile {
            return Err(DiffAreaError::invalid(
                "a disabled association (maximum size zero) cannot be volatile",
            ));
        }
        return Ok(());
    }
    validate_floor(maximum_bytes, config)
}

fn validate_floor(maximum_bytes: u64, config: &ManagementConfig) -> DiffAreaResult<()> {
    if maximum_bytes < config.min_diff_area_bytes {
        return Err(DiffAreaError::invalid(format!(
            "maximum size {} is below the provider floor of {} bytes",
            maximum_bytes, config.min_diff_area_bytes
        )));
    }
    Ok(())
}
