//! In-memory management state: the association registry and the
//! per-volume protection mirror.
//!
//! The provider owns the durable truth; this state is the last-known view
//! the service validates commands against, refreshed by folding every
//! provider answer back in. Nothing here survives a restart, by design.

use crate::domain::association::{AssociationKey, DiffAreaAssociation};
use crate::domain::protection::ProtectionState;
use crate::domain::volume::VolumeName;
use crate::ports::outbound::ResizeDisposition;
use std::collections::BTreeMap;

/// Registry plus protection mirror.
///
/// BTreeMaps keep iteration deterministic, which keeps log output and
/// projection fallbacks stable across runs.
#[derive(Debug, Default)]
pub struct ManagementState {
    /// All known associations, keyed by `(source, storage)`.
    associations: BTreeMap<AssociationKey, DiffAreaAssociation>,
    /// Last-known protection state per volume.
    protection: BTreeMap<VolumeName, ProtectionState>,
}

impl ManagementState {
    pub fn new() -> Self {
        Self::default()
    }

    // === Associations ===

    pub fn association(&self, key: &AssociationKey) -> Option<&DiffAreaAssociation> {
        self.associations.get(key)
    }

    pub fn contains(&self, key: &AssociationKey) -> bool {
        self.associations.contains_key(key)
    }

    /// Number of storage volumes currently associated with `source`.
    pub fn associations_for_source(&self, source: &VolumeName) -> usize {
        self.associations
            .keys()
            .filter(|key| &key.source == source)
            .count()
    }

    /// All associations whose source volume is `source`.
    pub fn by_source(&self, source: &VolumeName) -> Vec<&DiffAreaAssociation> {
        self.associations
            .values()
            .filter(|assoc| &assoc.source == source)
            .collect()
    }

    /// All associations resident on `storage`.
    pub fn by_storage(&self, storage: &VolumeName) -> Vec<&DiffAreaAssociation> {
        self.associations
            .values()
            .filter(|assoc| &assoc.storage == storage)
            .collect()
    }

    /// Record an association the provider accepted.
    pub fn insert(&mut self, association: DiffAreaAssociation) {
        self.associations.insert(association.key(), association);
    }

    /// Drop an association the provider reclaimed.
    pub fn remove(&mut self, key: &AssociationKey) -> Option<DiffAreaAssociation> {
        self.associations.remove(key)
    }

    /// Fold a resize the provider accepted back into the registry.
    pub fn fold_resize(
        &mut self,
        key: &AssociationKey,
        maximum_bytes: u64,
        is_volatile: bool,
        disposition: ResizeDisposition,
    ) {
        match disposition {
            ResizeDisposition::Removed => {
                self.associations.remove(key);
            }
            ResizeDisposition::Resized | ResizeDisposition::Disabled => {
                if let Some(assoc) = self.associations.get_mut(key) {
                    assoc.maximum_bytes = maximum_bytes;
                    assoc.is_volatile = is_volatile;
                }
            }
        }
    }

    // === Protection ===

    pub fn protection(&self, volume: &VolumeName) -> Option<&ProtectionState> {
        self.protection.get(volume)
    }

    /// Reconcile the mirror with an authoritative provider answer.
    pub fn fold_protection(&mut self, volume: VolumeName, state: ProtectionState) {
        self.protection.insert(volume, state);
    }
}
