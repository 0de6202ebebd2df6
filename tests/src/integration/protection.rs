//! Protection state machine scenarios: faults, dismounts, and recovery.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{service, volume};
    use diffarea_management::{
        DiffAreaError, DiffAreaManagementApi, FailureStatus, ProtectionFault, ProtectionLevel,
        ProviderError,
    };

    /// The storage area backing D: fills up, the volume faults, and an
    /// operator protects the original volume. The transition dismounts
    /// exactly once and the volume comes back healthy.
    #[test]
    fn test_fault_then_protect_original_volume() {
        let mut mgmt = service();
        let d = volume("D:\\");

        mgmt.provider_mut().inject_fault(
            &d,
            ProtectionFault::DiffAreaFull,
            FailureStatus(0xC000_00BB),
        );

        let info = mgmt.get_volume_protection_level(&d).unwrap();
        assert_eq!(info.fault, ProtectionFault::DiffAreaFull);
        assert_eq!(info.status, FailureStatus(0xC000_00BB));

        mgmt.set_volume_protection_level(&d, ProtectionLevel::OriginalVolume)
            .unwrap();
        assert_eq!(mgmt.provider().dismount_count(&d), 1);

        let info = mgmt.get_volume_protection_level(&d).unwrap();
        assert_eq!(info.level, Some(ProtectionLevel::OriginalVolume));
        assert!(info.fault.is_none());
        assert!(info.status.is_none());

        // Re-applying the same level is a pure no-op.
        mgmt.set_volume_protection_level(&d, ProtectionLevel::OriginalVolume)
            .unwrap();
        assert_eq!(mgmt.provider().dismount_count(&d), 1);
    }

    /// Clearing a fault on a volume that was never protected returns it
    /// to the unprotected state, not to some default level.
    #[test]
    fn test_clear_fault_restores_unprotected() {
        let mut mgmt = service();
        let d = volume("D:\\");

        mgmt.provider_mut()
            .inject_fault(&d, ProtectionFault::IoFailure, FailureStatus(5));
        mgmt.clear_volume_protect_fault(&d).unwrap();
        assert_eq!(mgmt.provider().dismount_count(&d), 1);

        let info = mgmt.get_volume_protection_level(&d).unwrap();
        assert_eq!(info.level, None);
        assert!(info.fault.is_none());
    }

    /// Clearing a fault twice: the second call sees a healthy volume and
    /// does nothing, in particular no second dismount.
    #[test]
    fn test_clear_fault_twice_is_single_dismount() {
        let mut mgmt = service();
        let d = volume("D:\\");
        mgmt.set_volume_protection_level(&d, ProtectionLevel::DiffAreaVolume)
            .unwrap();
        mgmt.provider_mut()
            .inject_fault(&d, ProtectionFault::MetadataCorruption, FailureStatus(9));

        mgmt.clear_volume_protect_fault(&d).unwrap();
        mgmt.clear_volume_protect_fault(&d).unwrap();

        assert_eq!(mgmt.provider().dismount_count(&d), 1);
        let info = mgmt.get_volume_protection_level(&d).unwrap();
        assert_eq!(info.level, Some(ProtectionLevel::DiffAreaVolume));
    }

    /// A provider veto on the level change surfaces as `ProviderVeto`
    /// and leaves the old level in force.
    #[test]
    fn test_provider_veto_surfaces() {
        let mut mgmt = service();
        let d = volume("D:\\");
        mgmt.set_volume_protection_level(&d, ProtectionLevel::DiffAreaVolume)
            .unwrap();

        mgmt.provider_mut().fail_next_with(ProviderError::Vetoed {
            detail: "policy forbids protecting this volume".to_string(),
        });
        let err = mgmt
            .set_volume_protection_level(&d, ProtectionLevel::OriginalVolume)
            .unwrap_err();
        assert!(matches!(err, DiffAreaError::ProviderVeto { .. }));

        let info = mgmt.get_volume_protection_level(&d).unwrap();
        assert_eq!(info.level, Some(ProtectionLevel::DiffAreaVolume));
    }

    /// Providers without protection support fail every protection
    /// operation with the terminal `NotImplemented`.
    #[test]
    fn test_protection_unsupported_provider_is_terminal() {
        let mut mgmt = service();
        let d = volume("D:\\");
        mgmt.provider_mut().set_protection_supported(false);

        let err = mgmt.get_volume_protection_level(&d).unwrap_err();
        assert!(matches!(err, DiffAreaError::NotImplemented { .. }));

        let err = mgmt
            .set_volume_protection_level(&d, ProtectionLevel::OriginalVolume)
            .unwrap_err();
        assert!(matches!(err, DiffAreaError::NotImplemented { .. }));

        let err = mgmt.clear_volume_protect_fault(&d).unwrap_err();
        assert!(matches!(err, DiffAreaError::NotImplemented { .. }));
        assert!(!err.is_retriable());
    }

    /// A faulted source volume goes offline for protection; its abandoned
    /// storage area on another volume is flagged and reclaimable there.
    #[test]
    fn test_offline_and_unused_diff_area_reporting() {
        let mut mgmt = service();
        let d = volume("D:\\");
        let e = volume("E:\\");

        mgmt.set_volume_protection_level(&d, ProtectionLevel::OriginalVolume)
            .unwrap();
        mgmt.add_diff_area(&d, &e, 500_000_000).unwrap();
        mgmt.provider_mut()
            .inject_fault(&d, ProtectionFault::DiffAreaMissing, FailureStatus(2));

        let info = mgmt.get_volume_protection_level(&d).unwrap();
        assert!(info.is_offline);

        // The storage volume reports the abandoned area awaiting cleanup.
        let info = mgmt.get_volume_protection_level(&e).unwrap();
        assert!(info.has_unused_diff_area);
        assert_eq!(mgmt.delete_unused_diff_areas(&e).unwrap(), 1);
    }
}
