//! Association lifecycle: add, resize, disable, and reclaim.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{service, volume, GIB};
    use diffarea_management::{
        DiffAreaError, DiffAreaManagementApi, DiffAreaManagementService,
        InMemoryStorageAreaProvider, ManagementConfig, LEGACY_MIN_DIFF_AREA_BYTES,
    };
    use uuid::Uuid;

    /// The full storage-area life of one association: created, backing a
    /// live shadow copy, disabled, and finally reclaimed once the shadow
    /// copy is gone.
    #[test]
    fn test_association_lifecycle_end_to_end() {
        let mut mgmt = service();
        let source = volume("D:\\");
        let storage = volume("E:\\");

        mgmt.add_diff_area(&source, &storage, 500_000_000).unwrap();

        let rows = mgmt.query_diff_areas_for_volume(&source).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].maximum_bytes, 500_000_000);

        // A shadow copy starts depending on the storage area.
        let snap = Uuid::new_v4();
        assert!(mgmt.provider_mut().attach_snapshot(snap, &source, &storage));

        // Disabling while in use keeps a zero-sized record around.
        mgmt.change_diff_area_maximum_size(&source, &storage, 0, None)
            .unwrap();
        let rows = mgmt.query_diff_areas_for_volume(&source).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].maximum_bytes, 0);

        // Nothing to reclaim while the shadow copy lives.
        assert_eq!(mgmt.delete_unused_diff_areas(&storage).unwrap(), 0);

        // Shadow copy deleted: the abandoned area is now reclaimable.
        mgmt.provider_mut().detach_snapshot(snap);
        assert_eq!(mgmt.delete_unused_diff_areas(&storage).unwrap(), 1);
        assert!(mgmt.query_diff_areas_for_volume(&source).unwrap().is_empty());
    }

    /// Disabling an unused association removes it outright; the follow-up
    /// query and reclamation both see nothing.
    #[test]
    fn test_disable_unused_association_removes_immediately() {
        let mut mgmt = service();
        let source = volume("D:\\");
        let storage = volume("E:\\");

        mgmt.add_diff_area(&source, &storage, 500_000_000).unwrap();
        mgmt.change_diff_area_maximum_size(&source, &storage, 0, None)
            .unwrap();

        assert!(mgmt.query_diff_areas_for_volume(&source).unwrap().is_empty());
        assert_eq!(mgmt.delete_unused_diff_areas(&storage).unwrap(), 0);
    }

    /// A host fronting a legacy provider lowers the floor through
    /// configuration; the floor itself keeps being enforced.
    #[test]
    fn test_legacy_floor_configuration() {
        let provider = InMemoryStorageAreaProvider::new()
            .with_volume(&volume("C:\\"), "System", 500 * GIB, 100 * GIB)
            .with_volume(&volume("E:\\"), "Backup", 500 * GIB, 400 * GIB);
        let config = ManagementConfig::default()
            .with_min_diff_area_bytes(LEGACY_MIN_DIFF_AREA_BYTES);
        let mut mgmt = DiffAreaManagementService::new(provider, config);

        // 100 MiB exactly passes on a legacy floor.
        mgmt.add_diff_area(&volume("C:\\"), &volume("E:\\"), LEGACY_MIN_DIFF_AREA_BYTES)
            .unwrap();

        let err = mgmt
            .change_diff_area_maximum_size(
                &volume("C:\\"),
                &volume("E:\\"),
                LEGACY_MIN_DIFF_AREA_BYTES - 1,
                None,
            )
            .unwrap_err();
        assert!(matches!(err, DiffAreaError::InvalidArgument { .. }));
    }

    /// Fan-out up to the configured cap, then a clean `LimitReached`.
    #[test]
    fn test_fan_out_until_limit() {
        let mut mgmt = service();
        let source = volume("D:\\");

        mgmt.add_diff_area(&source, &volume("E:\\"), GIB).unwrap();
        mgmt.add_diff_area(&source, &volume("F:\\"), GIB).unwrap();
        // Storage areas may live on the source volume itself.
        mgmt.add_diff_area(&source, &source, GIB).unwrap();

        let limited = ManagementConfig::default().with_max_associations_per_source(1);
        let provider = InMemoryStorageAreaProvider::new()
            .with_volume(&volume("D:\\"), "Data", 1000 * GIB, 800 * GIB)
            .with_volume(&volume("E:\\"), "Backup", 2000 * GIB, 1500 * GIB)
            .with_volume(&volume("F:\\"), "Scratch", 500 * GIB, 400 * GIB);
        let mut capped = DiffAreaManagementService::new(provider, limited);

        capped.add_diff_area(&source, &volume("E:\\"), GIB).unwrap();
        let err = capped
            .add_diff_area(&source, &volume("F:\\"), GIB)
            .unwrap_err();
        assert!(matches!(err, DiffAreaError::LimitReached { limit: 1, .. }));
    }

    /// A transient provider failure leaves no half-created state; the
    /// caller retries and succeeds.
    #[test]
    fn test_retry_after_transient_failure() {
        let mut mgmt = service();
        let source = volume("D:\\");
        let storage = volume("E:\\");

        mgmt.provider_mut()
            .fail_next_with(diffarea_management::ProviderError::Unexpected {
                detail: "provider restarting".to_string(),
            });

        let err = mgmt.add_diff_area(&source, &storage, GIB).unwrap_err();
        assert!(err.is_retriable());
        assert!(mgmt.query_diff_areas_for_volume(&source).unwrap().is_empty());

        mgmt.add_diff_area(&source, &storage, GIB).unwrap();
        assert_eq!(mgmt.query_diff_areas_for_volume(&source).unwrap().len(), 1);
    }
}
