//! Shadow copy protection: levels, faults, and the per-volume state machine.
//!
//! The provider is the durable authority, but the transition rules live
//! here so they are enforced in-process and unit-testable:
//!
//! ```text
//! [Unprotected] ──set(L)──→ [Protected(L)] ──set(L)──→ (no-op, no dismount)
//!       │                        │
//!       │ provider fault         │ provider fault
//!       ↓                        ↓
//! [Faulted { level, fault, status }]
//!       │
//!       ├─ set(OriginalVolume) ──→ dismount, then [Protected(OriginalVolume)]
//!       └─ clear_fault ──────────→ dismount, then the remembered state
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which volume is sacrificed when the storage area fails.
///
/// `OriginalVolume` keeps shadow copies intact by taking the source volume
/// offline on a protection fault; `DiffAreaVolume` keeps the source online
/// and lets its shadow copies be lost instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtectionLevel {
    OriginalVolume,
    DiffAreaVolume,
}

impl fmt::Display for ProtectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtectionLevel::OriginalVolume => write!(f, "original-volume"),
            ProtectionLevel::DiffAreaVolume => write!(f, "diff-area-volume"),
        }
    }
}

/// Fault classes the provider reports when I/O to a protected volume is
/// blocked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtectionFault {
    /// Not faulted.
    #[default]
    None,
    /// The storage area backing the volume's shadow copies is gone.
    DiffAreaMissing,
    /// The storage area hit its maximum and could not grow.
    DiffAreaFull,
    /// An I/O failure while the volume was online.
    IoFailure,
    /// Storage-area metadata failed validation.
    MetadataCorruption,
    /// A copy-on-write read failed.
    CowReadFailure,
    /// A copy-on-write write failed.
    CowWriteFailure,
    /// The provider could not allocate memory for the operation.
    MemoryAllocationFailed,
}

impl ProtectionFault {
    pub fn is_none(&self) -> bool {
        matches!(self, ProtectionFault::None)
    }
}

/// Opaque provider status code accompanying a fault. Zero when healthy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureStatus(pub u32);

impl FailureStatus {
    pub const NONE: FailureStatus = FailureStatus(0);

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

/// Per-volume protection state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtectionState {
    /// No protection level has been applied.
    Unprotected,
    /// Protection is in force and the volume is healthy.
    Protected(ProtectionLevel),
    /// I/O to the volume is blocked by a protection fault. The level that
    /// was in force when the fault hit is remembered so clearing the fault
    /// can restore it.
    Faulted {
        level: Option<ProtectionLevel>,
        fault: ProtectionFault,
        status: FailureStatus,
    },
}

/// What a `set_volume_protection_level` call must do, given the current
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetLevelPlan {
    /// The level already matches and the volume is healthy. No provider
    /// traffic, and in particular no dismount.
    NoOp,
    /// Apply the level directly.
    Apply,
    /// Dismount the volume, then apply the level. Required when moving a
    /// faulted volume to `OriginalVolume`; applying without the dismount
    /// is unsafe and is vetoed by the provider.
    DismountThenApply,
}

/// What a `clear_volume_protect_fault` call must do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearFaultPlan {
    /// Not faulted. Clearing is a successful no-op.
    NoOp,
    /// Dismount the volume, then restore the remembered state.
    DismountThenReset,
}

impl ProtectionState {
    /// Effective protection level, if any. A faulted volume reports the
    /// level that was in force when the fault hit.
    pub fn level(&self) -> Option<ProtectionLevel> {
        match self {
            ProtectionState::Unprotected => None,
            ProtectionState::Protected(level) => Some(*level),
            ProtectionState::Faulted { level, .. } => *level,
        }
    }

    pub fn is_faulted(&self) -> bool {
        matches!(self, ProtectionState::Faulted { .. })
    }

    /// The current fault kind; `ProtectionFault::None` when healthy.
    pub fn fault(&self) -> ProtectionFault {
        match self {
            ProtectionState::Faulted { fault, .. } => *fault,
            _ => ProtectionFault::None,
        }
    }

    /// The current failure status; `FailureStatus::NONE` when healthy.
    pub fn failure_status(&self) -> FailureStatus {
        match self {
            ProtectionState::Faulted { status, .. } => *status,
            _ => FailureStatus::NONE,
        }
    }

    /// Plan the transition for setting `target`.
    ///
    /// Matching levels on a healthy volume are a no-op. A faulted volume
    /// is never a no-op: moving it to `OriginalVolume` requires the
    /// dismount-first ordering, and any other target is applied directly,
    /// leaving the verdict to the provider.
    pub fn plan_set_level(&self, target: ProtectionLevel) -> SetLevelPlan {
        match self {
            ProtectionState::Protected(current) if *current == target => SetLevelPlan::NoOp,
            ProtectionState::Faulted { .. } if target == ProtectionLevel::OriginalVolume => {
                SetLevelPlan::DismountThenApply
            }
            _ => SetLevelPlan::Apply,
        }
    }

    /// State after a successful set-level transition.
    pub fn with_level(target: ProtectionLevel) -> ProtectionState {
        ProtectionState::Protected(target)
    }

    /// Plan the transition for clearing a protection fault.
    pub fn plan_clear_fault(&self) -> ClearFaultPlan {
        if self.is_faulted() {
            ClearFaultPlan::DismountThenReset
        } else {
            ClearFaultPlan::NoOp
        }
    }

    /// State after a successful fault clear: whatever was in force before
    /// the fault.
    pub fn cleared(&self) -> ProtectionState {
        match self {
            ProtectionState::Faulted { level, .. } => match level {
                Some(level) => ProtectionState::Protected(*level),
                None => ProtectionState::Unprotected,
            },
            healthy => healthy.clone(),
        }
    }
}

/// Point-in-time protection report for a volume, rebuilt from live provider
/// data on every query. Never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeProtectionInfo {
    /// The protection level in force, if any.
    pub level: Option<ProtectionLevel>,
    /// Whether the volume has been taken offline to protect its shadow
    /// copies.
    pub is_offline: bool,
    /// Fault kind; `None` when healthy.
    pub fault: ProtectionFault,
    /// Provider status code for the fault; zero when healthy.
    pub status: FailureStatus,
    /// Whether abandoned storage-area files on this volume are waiting to
    /// be reclaimed.
    pub has_unused_diff_area: bool,
}
