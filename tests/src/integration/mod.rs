//! Integration scenarios for the diff-area management service.

mod lifecycle;
mod protection;
mod queries;

#[cfg(test)]
pub(crate) mod fixtures {
    use diffarea_management::{
        DiffAreaManagementService, InMemoryStorageAreaProvider, ManagementConfig, VolumeName,
    };

    pub const GIB: u64 = 1024 * 1024 * 1024;

    /// Install a test subscriber once so `RUST_LOG=diffarea_management=debug`
    /// surfaces service logs during a failing scenario.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    pub fn volume(name: &str) -> VolumeName {
        VolumeName::parse(name).unwrap()
    }

    /// Three healthy volumes, association cap raised so fan-out scenarios
    /// can exercise more than the system provider's single association.
    pub fn service() -> DiffAreaManagementService<InMemoryStorageAreaProvider> {
        init_tracing();
        let provider = InMemoryStorageAreaProvider::new()
            .with_volume(&volume("D:\\"), "Data", 1000 * GIB, 800 * GIB)
            .with_volume(&volume("E:\\"), "Backup", 2000 * GIB, 1500 * GIB)
            .with_volume(&volume("F:\\"), "Scratch", 500 * GIB, 400 * GIB);
        let config = ManagementConfig::default().with_max_associations_per_source(4);
        DiffAreaManagementService::new(provider, config)
    }
}
