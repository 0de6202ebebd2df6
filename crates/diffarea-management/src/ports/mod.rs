//! Port definitions: the driving management API and the driven
//! storage-area provider boundary.

pub mod inbound;
pub mod outbound;

pub use inbound::DiffAreaManagementApi;
pub use outbound::{
    DiffAreaReport, DiffAreaUsage, ProtectionReport, ProviderError, ResizeDisposition,
    StorageAreaProvider, VolumeSupport,
};
