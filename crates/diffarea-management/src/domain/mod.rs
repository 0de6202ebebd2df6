//! Domain model: volume identifiers, associations, protection states,
//! and query rows. Pure logic, no provider traffic.

pub mod association;
pub mod protection;
pub mod query;
pub mod volume;

pub use association::{
    validate_add_maximum, validate_change_maximum, AssociationKey, DiffAreaAssociation,
};
pub use protection::{
    ClearFaultPlan, FailureStatus, ProtectionFault, ProtectionLevel, ProtectionState,
    SetLevelPlan, VolumeProtectionInfo,
};
pub use query::{DiffAreaProperties, DiffVolumeProperties};
pub use volume::{VolumeName, VolumeNameKind};
