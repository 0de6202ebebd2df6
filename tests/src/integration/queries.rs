//! Projection completeness, ordering, and failure semantics.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{service, volume, GIB};
    use diffarea_management::{DiffAreaError, DiffAreaManagementApi, ProviderError};
    use uuid::Uuid;

    /// Every association appears in exactly the projections consistent
    /// with its source and storage volume, and in no others.
    #[test]
    fn test_projection_completeness() {
        let mut mgmt = service();
        mgmt.add_diff_area(&volume("D:\\"), &volume("E:\\"), GIB).unwrap();
        mgmt.add_diff_area(&volume("D:\\"), &volume("F:\\"), GIB).unwrap();
        mgmt.add_diff_area(&volume("F:\\"), &volume("E:\\"), GIB).unwrap();

        let for_d = mgmt.query_diff_areas_for_volume(&volume("D:\\")).unwrap();
        assert_eq!(for_d.len(), 2);
        assert!(for_d.iter().all(|row| row.source == volume("D:\\")));

        let on_e = mgmt.query_diff_areas_on_volume(&volume("E:\\")).unwrap();
        assert_eq!(on_e.len(), 2);
        assert!(on_e.iter().all(|row| row.storage == volume("E:\\")));

        let for_f = mgmt.query_diff_areas_for_volume(&volume("F:\\")).unwrap();
        assert_eq!(for_f.len(), 1);

        // Unrelated projections stay empty.
        assert!(mgmt.query_diff_areas_for_volume(&volume("E:\\")).unwrap().is_empty());
        assert!(mgmt.query_diff_areas_on_volume(&volume("D:\\")).unwrap().is_empty());
    }

    /// Rows carry live usage figures from the provider, not registry
    /// copies.
    #[test]
    fn test_rows_report_live_usage() {
        let mut mgmt = service();
        mgmt.add_diff_area(&volume("D:\\"), &volume("E:\\"), GIB).unwrap();
        mgmt.provider_mut()
            .set_usage(&volume("D:\\"), &volume("E:\\"), GIB / 2, GIB / 4);

        let rows = mgmt.query_diff_areas_for_volume(&volume("D:\\")).unwrap();
        assert_eq!(rows[0].allocated_bytes, GIB / 2);
        assert_eq!(rows[0].used_bytes, GIB / 4);

        mgmt.provider_mut()
            .set_usage(&volume("D:\\"), &volume("E:\\"), GIB / 2, GIB / 3);
        let rows = mgmt.query_diff_areas_for_volume(&volume("D:\\")).unwrap();
        assert_eq!(rows[0].used_bytes, GIB / 3);
    }

    /// One shadow copy backed by storage areas on two volumes: the
    /// snapshot projection returns both, other snapshots see nothing.
    #[test]
    fn test_snapshot_projection() {
        let mut mgmt = service();
        mgmt.add_diff_area(&volume("D:\\"), &volume("E:\\"), GIB).unwrap();
        mgmt.add_diff_area(&volume("D:\\"), &volume("F:\\"), GIB).unwrap();

        let snap = Uuid::new_v4();
        mgmt.provider_mut()
            .attach_snapshot(snap, &volume("D:\\"), &volume("E:\\"));
        mgmt.provider_mut()
            .attach_snapshot(snap, &volume("D:\\"), &volume("F:\\"));

        let rows = mgmt.query_diff_areas_for_snapshot(snap).unwrap();
        assert_eq!(rows.len(), 2);

        // An unrelated snapshot id is an empty answer, not an error.
        assert!(mgmt.query_diff_areas_for_snapshot(Uuid::new_v4()).unwrap().is_empty());
    }

    /// Candidate enumeration is deterministic and filters unsupported
    /// volumes; capacity figures come through for the rest.
    #[test]
    fn test_supported_volumes_enumeration() {
        let mut mgmt = service();
        mgmt.provider_mut().set_diff_area_support(&volume("E:\\"), false);

        let first = mgmt
            .query_volumes_supported_for_diff_areas(&volume("D:\\"))
            .unwrap();
        let second = mgmt
            .query_volumes_supported_for_diff_areas(&volume("D:\\"))
            .unwrap();
        assert_eq!(first, second);

        let names: Vec<&str> = first.iter().map(|row| row.volume.as_str()).collect();
        assert_eq!(names, vec!["D:\\", "F:\\"]);
        assert!(first.iter().all(|row| row.free_bytes <= row.total_bytes));
    }

    /// A probe failure on any candidate aborts the whole call instead of
    /// returning a quietly shortened list.
    #[test]
    fn test_supported_volumes_aborts_on_probe_failure() {
        let mut mgmt = service();
        mgmt.provider_mut().set_support_error(
            &volume("F:\\"),
            ProviderError::Unexpected {
                detail: "device went away during probe".to_string(),
            },
        );

        let err = mgmt
            .query_volumes_supported_for_diff_areas(&volume("D:\\"))
            .unwrap_err();
        assert!(matches!(err, DiffAreaError::Transient { .. }));
    }

    /// Querying for an unknown source volume is `NotFound`; empty results
    /// for known volumes are success.
    #[test]
    fn test_unknown_source_vs_empty_result() {
        let mgmt = service();

        let err = mgmt
            .query_volumes_supported_for_diff_areas(&volume("X:\\"))
            .unwrap_err();
        assert!(matches!(err, DiffAreaError::NotFound { .. }));

        assert!(mgmt.query_diff_areas_for_volume(&volume("D:\\")).unwrap().is_empty());
    }
}
