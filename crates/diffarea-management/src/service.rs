//! # Diff-Area Management Service
//!
//! The main service implementing `DiffAreaManagementApi`.
//!
//! ## Architecture
//!
//! Every command follows the same shape:
//!
//! 1. Validate against local invariants (identifier syntax, size floor,
//!    uniqueness, association cap) before any provider traffic
//! 2. Delegate the durable effect to the injected `StorageAreaProvider`
//! 3. Fold the provider's authoritative answer back into the in-memory
//!    state, translating failures 1:1 into `DiffAreaError`
//!
//! Nothing is retried internally and no operation partially applies: the
//! registry is only touched after the provider accepts, and provider-side
//! removals are folded back immediately.

use crate::domain::association::{
    validate_add_maximum, validate_change_maximum, AssociationKey, DiffAreaAssociation,
};
use crate::domain::protection::{
    ClearFaultPlan, ProtectionLevel, ProtectionState, SetLevelPlan, VolumeProtectionInfo,
};
use crate::domain::query::{DiffAreaProperties, DiffVolumeProperties};
use crate::domain::volume::VolumeName;
use crate::error::{DiffAreaError, DiffAreaResult};
use crate::ports::inbound::DiffAreaManagementApi;
use crate::ports::outbound::{
    DiffAreaReport, ProtectionReport, ProviderError, StorageAreaProvider,
};
use crate::state::ManagementState;
use crate::types::{ManagementConfig, SnapshotId};

/// The management service: registry, protection state machine, and query
/// engine over an injected storage-area provider.
pub struct DiffAreaManagementService<P>
where
    P: StorageAreaProvider,
{
    provider: P,
    config: ManagementConfig,
    state: ManagementState,
}

impl<P> DiffAreaManagementService<P>
where
    P: StorageAreaProvider,
{
    /// Create a service over the given provider.
    pub fn new(provider: P, config: ManagementConfig) -> Self {
        Self {
            provider,
            config,
            state: ManagementState::new(),
        }
    }

    pub fn config(&self) -> &ManagementConfig {
        &self.config
    }

    /// Access the underlying provider (tests reach fake knobs this way).
    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    /// Fail with `NotFound` unless the volume resolves on this system.
    fn require_volume(&self, volume: &VolumeName) -> DiffAreaResult<()> {
        match self.provider.volume_exists(volume) {
            Ok(true) => Ok(()),
            Ok(false) => Err(DiffAreaError::not_found(format!("volume {}", volume))),
            Err(err) => Err(translate_provider(err)),
        }
    }

    /// Build one query row from the registry record plus live usage.
    ///
    /// An association the provider has already removed behind our back is
    /// dropped from the projection (and will be reconciled by the next
    /// mutating call); any other provider failure aborts the query.
    fn row_for(&self, assoc: &DiffAreaAssociation) -> DiffAreaResult<Option<DiffAreaProperties>> {
        match self.provider.association_usage(&assoc.source, &assoc.storage) {
            Ok(usage) => Ok(Some(DiffAreaProperties {
                source: assoc.source.clone(),
                storage: assoc.storage.clone(),
                maximum_bytes: assoc.maximum_bytes,
                allocated_bytes: usage.allocated_bytes,
                used_bytes: usage.used_bytes,
                is_volatile: assoc.is_volatile,
            })),
            Err(ProviderError::ObjectNotFound { .. }) => Ok(None),
            Err(err) => Err(translate_provider(err)),
        }
    }

    /// Live protection state, folded into the mirror.
    fn refresh_protection(&mut self, volume: &VolumeName) -> DiffAreaResult<ProtectionReport> {
        let report = self
            .provider
            .protection_report(volume)
            .map_err(translate_provider)?;
        self.state
            .fold_protection(volume.clone(), state_from_report(&report));
        Ok(report)
    }

    /// Apply a protection level and fold the result.
    fn apply_protection_level(
        &mut self,
        volume: &VolumeName,
        level: ProtectionLevel,
    ) -> DiffAreaResult<()> {
        self.provider
            .set_protection_level(volume, level)
            .map_err(translate_provider)?;
        self.state
            .fold_protection(volume.clone(), ProtectionState::with_level(level));
        tracing::info!("[diffarea] protection level of {} set to {}", volume, level);
        Ok(())
    }
}

// =============================================================================
// API IMPLEMENTATION
// =============================================================================

impl<P> DiffAreaManagementApi for DiffAreaManagementService<P>
where
    P: StorageAreaProvider,
{
    fn add_diff_area(
        &mut self,
        source: &VolumeName,
        storage: &VolumeName,
        maximum_bytes: u64,
    ) -> DiffAreaResult<()> {
        validate_add_maximum(maximum_bytes, &self.config)?;

        let key = AssociationKey::new(source.clone(), storage.clone());
        if self.state.contains(&key) {
            return Err(DiffAreaError::AlreadyExists { key });
        }
        if self.state.associations_for_source(source) >= self.config.max_associations_per_source {
            return Err(DiffAreaError::LimitReached {
                volume: source.clone(),
                limit: self.config.max_associations_per_source,
            });
        }

        self.require_volume(source)?;
        self.require_volume(storage)?;

        // Durable effect first; the registry entry appears only once the
        // provider has accepted, so no rollback path is ever needed.
        match self
            .provider
            .create_association(source, storage, maximum_bytes)
        {
            Ok(()) => {
                self.state.insert(DiffAreaAssociation::new(
                    source.clone(),
                    storage.clone(),
                    maximum_bytes,
                ));
                tracing::info!(
                    "[diffarea] associated {} -> {} with maximum {} bytes",
                    source,
                    storage,
                    maximum_bytes
                );
                Ok(())
            }
            Err(ProviderError::AlreadyExists { .. }) => Err(DiffAreaError::AlreadyExists {
                key: AssociationKey::new(source.clone(), storage.clone()),
            }),
            Err(ProviderError::AssociationLimitReached { .. }) => Err(DiffAreaError::LimitReached {
                volume: source.clone(),
                limit: self.config.max_associations_per_source,
            }),
            Err(ProviderError::VolumeNotSupported { detail }) => {
                tracing::warn!("[diffarea] provider rejected {} as storage: {}", storage, detail);
                Err(DiffAreaError::NotSupported {
                    storage: storage.clone(),
                    reason: detail,
                })
            }
            Err(ProviderError::InsufficientStorage { detail }) => {
                Err(DiffAreaError::InsufficientStorage {
                    volume: storage.clone(),
                    detail,
                })
            }
            Err(err) => Err(translate_provider(err)),
        }
    }

    fn change_diff_area_maximum_size(
        &mut self,
        source: &VolumeName,
        storage: &VolumeName,
        maximum_bytes: u64,
        is_volatile: Option<bool>,
    ) -> DiffAreaResult<()> {
        let is_volatile = is_volatile.unwrap_or(false);
        validate_change_maximum(maximum_bytes, is_volatile, &self.config)?;

        let key = AssociationKey::new(source.clone(), storage.clone());
        let existing = self
            .state
            .association(&key)
            .ok_or_else(|| DiffAreaError::not_found(format!("association {}", key)))?;

        // Disabling an already-disabled association is a no-op while the
        // record exists, not an error.
        if maximum_bytes == 0 && existing.is_disabled() {
            return Ok(());
        }

        match self
            .provider
            .resize_association(source, storage, maximum_bytes, is_volatile)
        {
            Ok(disposition) => {
                self.state
                    .fold_resize(&key, maximum_bytes, is_volatile, disposition);
                tracing::info!(
                    "[diffarea] association {} resized to {} bytes ({:?})",
                    key,
                    maximum_bytes,
                    disposition
                );
                Ok(())
            }
            Err(ProviderError::ObjectNotFound { .. }) => {
                // The provider dropped the association behind our back;
                // reconcile the registry with the authoritative view.
                tracing::warn!("[diffarea] association {} vanished on the provider side", key);
                self.state.remove(&key);
                Err(DiffAreaError::not_found(format!("association {}", key)))
            }
            Err(ProviderError::InsufficientStorage { detail }) => {
                Err(DiffAreaError::InsufficientStorage {
                    volume: storage.clone(),
                    detail,
                })
            }
            Err(err) => Err(translate_provider(err)),
        }
    }

    fn query_diff_areas_for_snapshot(
        &self,
        snapshot_id: SnapshotId,
    ) -> DiffAreaResult<Vec<DiffAreaProperties>> {
        let reports = self
            .provider
            .associations_for_snapshot(snapshot_id)
            .map_err(translate_provider)?;
        tracing::debug!(
            "[diffarea] snapshot {} is backed by {} storage area(s)",
            snapshot_id,
            reports.len()
        );
        Ok(reports.into_iter().map(row_from_report).collect())
    }

    fn query_diff_areas_for_volume(
        &self,
        source: &VolumeName,
    ) -> DiffAreaResult<Vec<DiffAreaProperties>> {
        let mut rows = Vec::new();
        for assoc in self.state.by_source(source) {
            if let Some(row) = self.row_for(assoc)? {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    fn query_diff_areas_on_volume(
        &self,
        storage: &VolumeName,
    ) -> DiffAreaResult<Vec<DiffAreaProperties>> {
        let mut rows = Vec::new();
        for assoc in self.state.by_storage(storage) {
            if let Some(row) = self.row_for(assoc)? {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    fn query_volumes_supported_for_diff_areas(
        &self,
        source: &VolumeName,
    ) -> DiffAreaResult<Vec<DiffVolumeProperties>> {
        self.require_volume(source)?;

        let candidates = self
            .provider
            .candidate_storage_volumes()
            .map_err(translate_provider)?;

        let mut rows = Vec::new();
        for candidate in candidates {
            // One bad candidate aborts the whole call rather than quietly
            // shortening the answer.
            let support = self
                .provider
                .storage_volume_support(source, &candidate)
                .map_err(translate_provider)?;
            if support.supported {
                rows.push(DiffVolumeProperties {
                    volume: candidate,
                    display_name: support.display_name,
                    free_bytes: support.free_bytes,
                    total_bytes: support.total_bytes,
                });
            }
        }
        Ok(rows)
    }

    fn delete_unused_diff_areas(&mut self, storage: &VolumeName) -> DiffAreaResult<usize> {
        self.require_volume(storage)?;

        let reclaimed = self
            .provider
            .delete_unused_associations(storage)
            .map_err(translate_provider)?;
        for key in &reclaimed {
            self.state.remove(key);
        }
        tracing::info!(
            "[diffarea] reclaimed {} unused storage area(s) on {}",
            reclaimed.len(),
            storage
        );
        Ok(reclaimed.len())
    }

    fn get_volume_protection_level(
        &mut self,
        volume: &VolumeName,
    ) -> DiffAreaResult<VolumeProtectionInfo> {
        self.require_volume(volume)?;

        let report = self.refresh_protection(volume)?;
        Ok(VolumeProtectionInfo {
            level: report.level,
            is_offline: report.is_offline,
            fault: report.fault,
            status: report.status,
            has_unused_diff_area: report.has_unused_diff_area,
        })
    }

    fn set_volume_protection_level(
        &mut self,
        volume: &VolumeName,
        level: ProtectionLevel,
    ) -> DiffAreaResult<()> {
        self.require_volume(volume)?;

        // Always decide against live state, never the mirror.
        let report = self.refresh_protection(volume)?;
        let current = state_from_report(&report);

        match current.plan_set_level(level) {
            SetLevelPlan::NoOp => {
                tracing::debug!("[diffarea] {} already at protection level {}", volume, level);
                Ok(())
            }
            SetLevelPlan::DismountThenApply => {
                tracing::warn!(
                    "[diffarea] dismounting faulted volume {} before protecting it",
                    volume
                );
                self.provider
                    .dismount_volume(volume)
                    .map_err(translate_provider)?;
                self.apply_protection_level(volume, level)
            }
            SetLevelPlan::Apply => self.apply_protection_level(volume, level),
        }
    }

    fn clear_volume_protect_fault(&mut self, volume: &VolumeName) -> DiffAreaResult<()> {
        self.require_volume(volume)?;

        let report = self.refresh_protection(volume)?;
        let current = state_from_report(&report);

        match current.plan_clear_fault() {
            ClearFaultPlan::NoOp => Ok(()),
            ClearFaultPlan::DismountThenReset => {
                self.provider
                    .dismount_volume(volume)
                    .map_err(translate_provider)?;
                self.provider
                    .clear_protection_fault(volume)
                    .map_err(translate_provider)?;
                self.state.fold_protection(volume.clone(), current.cleared());
                tracing::info!("[diffarea] protection fault on {} cleared", volume);
                Ok(())
            }
        }
    }
}

// =============================================================================
// TRANSLATION
// =============================================================================

/// Derive the state-machine view from an authoritative provider report.
fn state_from_report(report: &ProtectionReport) -> ProtectionState {
    if report.fault.is_none() {
        match report.level {
            Some(level) => ProtectionState::Protected(level),
            None => ProtectionState::Unprotected,
        }
    } else {
        ProtectionState::Faulted {
            level: report.level,
            fault: report.fault,
            status: report.status,
        }
    }
}

fn row_from_report(report: DiffAreaReport) -> DiffAreaProperties {
    DiffAreaProperties {
        source: report.source,
        storage: report.storage,
        maximum_bytes: report.maximum_bytes,
        allocated_bytes: report.allocated_bytes,
        used_bytes: report.used_bytes,
        is_volatile: report.is_volatile,
    }
}

/// Translate context-free provider failures 1:1 into the public taxonomy.
///
/// Kinds that need volume context (`AlreadyExists`, limit, support, space)
/// are matched at the call sites that know the volumes involved; one that
/// slips through untranslated is reported as an unclassified provider
/// failure with its diagnostic intact.
fn translate_provider(err: ProviderError) -> DiffAreaError {
    match err {
        ProviderError::AccessDenied { detail } => DiffAreaError::PermissionDenied { detail },
        ProviderError::ObjectNotFound { detail } => DiffAreaError::NotFound { object: detail },
        ProviderError::VolumeInUse { detail } => DiffAreaError::InUse { detail },
        ProviderError::Vetoed { detail } => DiffAreaError::ProviderVeto { detail },
        ProviderError::NotImplemented { detail } => DiffAreaError::NotImplemented { detail },
        ProviderError::Unexpected { detail } => DiffAreaError::Transient { detail },
        other => DiffAreaError::Transient {
            detail: other.to_string(),
        },
    }
}
