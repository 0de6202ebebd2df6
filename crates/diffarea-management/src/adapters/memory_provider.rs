//! In-memory storage-area provider for deterministic testing.
//!
//! Implements the full provider port over plain maps so every registry and
//! protection invariant can be exercised without real storage volumes.
//! Enumeration is BTreeMap-backed, so "provider enumeration order" is the
//! canonical volume-name order and stable across runs.

use crate::domain::association::AssociationKey;
use crate::domain::protection::{FailureStatus, ProtectionFault, ProtectionLevel};
use crate::domain::volume::VolumeName;
use crate::ports::outbound::{
    DiffAreaReport, DiffAreaUsage, ProtectionReport, ProviderError, ResizeDisposition,
    StorageAreaProvider, VolumeSupport,
};
use crate::types::SnapshotId;
use std::collections::{BTreeMap, BTreeSet};

/// One registered volume.
#[derive(Debug, Clone)]
struct FakeVolume {
    display_name: String,
    total_bytes: u64,
    free_bytes: u64,
    /// Whether the volume meets filesystem requirements for hosting
    /// diff areas.
    supports_diff_areas: bool,
    /// Scripted per-volume failure for support queries.
    support_error: Option<ProviderError>,
    level: Option<ProtectionLevel>,
    fault: ProtectionFault,
    status: FailureStatus,
    /// Set when a fault is injected; cleared by a dismount. Protecting the
    /// original volume while this is set is vetoed.
    needs_dismount: bool,
    dismounts: usize,
}

impl FakeVolume {
    fn new(display_name: &str, total_bytes: u64, free_bytes: u64) -> Self {
        Self {
            display_name: display_name.to_string(),
            total_bytes,
            free_bytes,
            supports_diff_areas: true,
            support_error: None,
            level: None,
            fault: ProtectionFault::None,
            status: FailureStatus::NONE,
            needs_dismount: false,
            dismounts: 0,
        }
    }
}

/// One provider-side association.
#[derive(Debug, Clone)]
struct FakeAssociation {
    maximum_bytes: u64,
    is_volatile: bool,
    allocated_bytes: u64,
    used_bytes: u64,
    /// Live shadow copies depending on this storage area.
    snapshots: BTreeSet<SnapshotId>,
}

/// In-memory implementation of `StorageAreaProvider` for testing.
#[derive(Debug, Default)]
pub struct InMemoryStorageAreaProvider {
    volumes: BTreeMap<VolumeName, FakeVolume>,
    associations: BTreeMap<AssociationKey, FakeAssociation>,
    protection_supported: bool,
    /// One-shot failure returned by the next provider call.
    scripted_failure: Option<ProviderError>,
}

impl InMemoryStorageAreaProvider {
    pub fn new() -> Self {
        Self {
            volumes: BTreeMap::new(),
            associations: BTreeMap::new(),
            protection_supported: true,
            scripted_failure: None,
        }
    }

    // === Test controls ===

    /// Register a volume with capacity figures. Returns `self` for
    /// fixture chaining.
    pub fn with_volume(mut self, name: &VolumeName, display_name: &str, total: u64, free: u64) -> Self {
        self.volumes
            .insert(name.clone(), FakeVolume::new(display_name, total, free));
        self
    }

    /// Mark a registered volume as failing filesystem requirements.
    pub fn set_diff_area_support(&mut self, name: &VolumeName, supported: bool) {
        if let Some(vol) = self.volumes.get_mut(name) {
            vol.supports_diff_areas = supported;
        }
    }

    /// Script a failure for support queries against one candidate.
    pub fn set_support_error(&mut self, name: &VolumeName, error: ProviderError) {
        if let Some(vol) = self.volumes.get_mut(name) {
            vol.support_error = Some(error);
        }
    }

    /// Script a one-shot failure for the next mutating provider call.
    /// Read-side queries are steered with `set_support_error` instead.
    pub fn fail_next_with(&mut self, error: ProviderError) {
        self.scripted_failure = Some(error);
    }

    /// Attach a live shadow copy to an association. Returns whether the
    /// association existed.
    pub fn attach_snapshot(
        &mut self,
        snapshot_id: SnapshotId,
        source: &VolumeName,
        storage: &VolumeName,
    ) -> bool {
        let key = AssociationKey::new(source.clone(), storage.clone());
        match self.associations.get_mut(&key) {
            Some(assoc) => {
                assoc.snapshots.insert(snapshot_id);
                true
            }
            None => false,
        }
    }

    /// Release a live shadow copy from every association it depends on.
    pub fn detach_snapshot(&mut self, snapshot_id: SnapshotId) {
        for assoc in self.associations.values_mut() {
            assoc.snapshots.remove(&snapshot_id);
        }
    }

    /// Set live capacity figures for an association. Returns whether the
    /// association existed.
    pub fn set_usage(
        &mut self,
        source: &VolumeName,
        storage: &VolumeName,
        allocated_bytes: u64,
        used_bytes: u64,
    ) -> bool {
        let key = AssociationKey::new(source.clone(), storage.clone());
        match self.associations.get_mut(&key) {
            Some(assoc) => {
                assoc.allocated_bytes = allocated_bytes;
                assoc.used_bytes = used_bytes;
                true
            }
            None => false,
        }
    }

    /// Put a volume into a protection fault, as the driver would on
    /// storage-area exhaustion or failure.
    pub fn inject_fault(&mut self, name: &VolumeName, fault: ProtectionFault, status: FailureStatus) {
        if let Some(vol) = self.volumes.get_mut(name) {
            vol.fault = fault;
            vol.status = status;
            vol.needs_dismount = true;
        }
    }

    /// Toggle protection support for the whole provider.
    pub fn set_protection_supported(&mut self, supported: bool) {
        self.protection_supported = supported;
    }

    /// How many times a volume has been dismounted.
    pub fn dismount_count(&self, name: &VolumeName) -> usize {
        self.volumes.get(name).map(|vol| vol.dismounts).unwrap_or(0)
    }

    /// Provider-side maximum for an association, if it still exists.
    pub fn association_maximum(&self, source: &VolumeName, storage: &VolumeName) -> Option<u64> {
        let key = AssociationKey::new(source.clone(), storage.clone());
        self.associations.get(&key).map(|assoc| assoc.maximum_bytes)
    }

    // === Internals ===

    fn take_scripted(&mut self) -> Result<(), ProviderError> {
        match self.scripted_failure.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn volume(&self, name: &VolumeName) -> Result<&FakeVolume, ProviderError> {
        self.volumes.get(name).ok_or_else(|| ProviderError::ObjectNotFound {
            detail: format!("volume {} does not resolve", name),
        })
    }

    fn volume_mut(&mut self, name: &VolumeName) -> Result<&mut FakeVolume, ProviderError> {
        self.volumes.get_mut(name).ok_or_else(|| ProviderError::ObjectNotFound {
            detail: format!("volume {} does not resolve", name),
        })
    }

    fn require_protection_support(&self) -> Result<(), ProviderError> {
        if self.protection_supported {
            Ok(())
        } else {
            Err(ProviderError::NotImplemented {
                detail: "provider does not support shadow copy protection".to_string(),
            })
        }
    }

    fn report_for(&self, key: &AssociationKey, assoc: &FakeAssociation) -> DiffAreaReport {
        DiffAreaReport {
            source: key.source.clone(),
            storage: key.storage.clone(),
            maximum_bytes: assoc.maximum_bytes,
            allocated_bytes: assoc.allocated_bytes,
            used_bytes: assoc.used_bytes,
            is_volatile: assoc.is_volatile,
        }
    }

    /// Whether any storage area on `volume` is abandoned: present but with
    /// no live shadow copy depending on it.
    fn has_unused_diff_area(&self, volume: &VolumeName) -> bool {
        self.associations
            .iter()
            .any(|(key, assoc)| &key.storage == volume && assoc.snapshots.is_empty())
    }
}

impl StorageAreaProvider for InMemoryStorageAreaProvider {
    fn volume_exists(&self, volume: &VolumeName) -> Result<bool, ProviderError> {
        Ok(self.volumes.contains_key(volume))
    }

    fn create_association(
        &mut self,
        source: &VolumeName,
        storage: &VolumeName,
        maximum_bytes: u64,
    ) -> Result<(), ProviderError> {
        self.take_scripted()?;
        self.volume(source)?;
        let storage_vol = self.volume(storage)?;

        if !storage_vol.supports_diff_areas {
            return Err(ProviderError::VolumeNotSupported {
                detail: format!("{} does not meet filesystem requirements", storage),
            });
        }
        if maximum_bytes > storage_vol.free_bytes {
            return Err(ProviderError::VolumeNotSupported {
                detail: format!(
                    "{} has {} bytes free, {} requested",
                    storage, storage_vol.free_bytes, maximum_bytes
                ),
            });
        }

        let key = AssociationKey::new(source.clone(), storage.clone());
        if self.associations.contains_key(&key) {
            return Err(ProviderError::AlreadyExists {
                detail: format!("association {} already present", key),
            });
        }

        self.associations.insert(
            key,
            FakeAssociation {
                maximum_bytes,
                is_volatile: false,
                allocated_bytes: 0,
                used_bytes: 0,
                snapshots: BTreeSet::new(),
            },
        );
        Ok(())
    }

    fn resize_association(
        &mut self,
        source: &VolumeName,
        storage: &VolumeName,
        maximum_bytes: u64,
        is_volatile: bool,
    ) -> Result<ResizeDisposition, ProviderError> {
        self.take_scripted()?;
        let key = AssociationKey::new(source.clone(), storage.clone());
        let assoc = self
            .associations
            .get_mut(&key)
            .ok_or_else(|| ProviderError::ObjectNotFound {
                detail: format!("association {} not found", key),
            })?;

        if maximum_bytes == 0 {
            if assoc.snapshots.is_empty() {
                self.associations.remove(&key);
                return Ok(ResizeDisposition::Removed);
            }
            assoc.maximum_bytes = 0;
            assoc.is_volatile = false;
            return Ok(ResizeDisposition::Disabled);
        }

        if maximum_bytes < assoc.used_bytes {
            return Err(ProviderError::InsufficientStorage {
                detail: format!(
                    "association {} uses {} bytes, cannot shrink to {}",
                    key, assoc.used_bytes, maximum_bytes
                ),
            });
        }
        if maximum_bytes < assoc.allocated_bytes && !assoc.snapshots.is_empty() {
            return Err(ProviderError::VolumeInUse {
                detail: format!(
                    "association {} backs a live shadow copy with {} bytes allocated",
                    key, assoc.allocated_bytes
                ),
            });
        }

        assoc.maximum_bytes = maximum_bytes;
        assoc.is_volatile = is_volatile;
        Ok(ResizeDisposition::Resized)
    }

    fn delete_unused_associations(
        &mut self,
        storage: &VolumeName,
    ) -> Result<Vec<AssociationKey>, ProviderError> {
        self.take_scripted()?;
        self.volume(storage)?;

        let reclaimed: Vec<AssociationKey> = self
            .associations
            .iter()
            .filter(|(key, assoc)| &key.storage == storage && assoc.snapshots.is_empty())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &reclaimed {
            self.associations.remove(key);
        }
        Ok(reclaimed)
    }

    fn associations_for_snapshot(
        &self,
        snapshot_id: SnapshotId,
    ) -> Result<Vec<DiffAreaReport>, ProviderError> {
        Ok(self
            .associations
            .iter()
            .filter(|(_, assoc)| assoc.snapshots.contains(&snapshot_id))
            .map(|(key, assoc)| self.report_for(key, assoc))
            .collect())
    }

    fn association_usage(
        &self,
        source: &VolumeName,
        storage: &VolumeName,
    ) -> Result<DiffAreaUsage, ProviderError> {
        let key = AssociationKey::new(source.clone(), storage.clone());
        let assoc = self
            .associations
            .get(&key)
            .ok_or_else(|| ProviderError::ObjectNotFound {
                detail: format!("association {} not found", key),
            })?;
        Ok(DiffAreaUsage {
            allocated_bytes: assoc.allocated_bytes,
            used_bytes: assoc.used_bytes,
        })
    }

    fn candidate_storage_volumes(&self) -> Result<Vec<VolumeName>, ProviderError> {
        Ok(self.volumes.keys().cloned().collect())
    }

    fn storage_volume_support(
        &self,
        _source: &VolumeName,
        candidate: &VolumeName,
    ) -> Result<VolumeSupport, ProviderError> {
        let vol = self.volume(candidate)?;
        if let Some(error) = &vol.support_error {
            return Err(error.clone());
        }
        Ok(VolumeSupport {
            supported: vol.supports_diff_areas,
            display_name: vol.display_name.clone(),
            free_bytes: vol.free_bytes,
            total_bytes: vol.total_bytes,
        })
    }

    fn protection_report(&self, volume: &VolumeName) -> Result<ProtectionReport, ProviderError> {
        self.require_protection_support()?;
        let vol = self.volume(volume)?;
        Ok(ProtectionReport {
            level: vol.level,
            fault: vol.fault,
            status: vol.status,
            is_offline: !vol.fault.is_none() && vol.level == Some(ProtectionLevel::OriginalVolume),
            has_unused_diff_area: self.has_unused_diff_area(volume),
        })
    }

    fn set_protection_level(
        &mut self,
        volume: &VolumeName,
        level: ProtectionLevel,
    ) -> Result<(), ProviderError> {
        self.require_protection_support()?;
        self.take_scripted()?;
        let vol = self.volume_mut(volume)?;

        if !vol.fault.is_none() && level == ProtectionLevel::OriginalVolume && vol.needs_dismount {
            return Err(ProviderError::Vetoed {
                detail: format!(
                    "{} is faulted and must be dismounted before protecting the original volume",
                    volume
                ),
            });
        }

        vol.level = Some(level);
        vol.fault = ProtectionFault::None;
        vol.status = FailureStatus::NONE;
        Ok(())
    }

    fn dismount_volume(&mut self, volume: &VolumeName) -> Result<(), ProviderError> {
        self.take_scripted()?;
        let vol = self.volume_mut(volume)?;
        vol.dismounts += 1;
        vol.needs_dismount = false;
        Ok(())
    }

    fn clear_protection_fault(&mut self, volume: &VolumeName) -> Result<(), ProviderError> {
        self.require_protection_support()?;
        self.take_scripted()?;
        let vol = self.volume_mut(volume)?;
        vol.fault = ProtectionFault::None;
        vol.status = FailureStatus::NONE;
        vol.needs_dismount = false;
        Ok(())
    }
}
