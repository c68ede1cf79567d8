//! End-to-end scenarios over the public API.

use secacl_core::{AccessControl, Constraint, Error, Protection};

use crate::common::{GROUP_X, reference_acl};

#[test]
fn test_reference_scenario_survives_round_trip() {
    let acl = reference_acl();
    let blob = acl.to_bytes();

    let decoded = AccessControl::from_bytes(&blob).expect("blob should decode");

    assert_eq!(decoded.protection(), Some(Protection::AfterFirstUnlock));
    let kofn = decoded
        .constraint("use")
        .and_then(Constraint::as_k_of_n)
        .expect("'use' should hold a k-of-n constraint");
    assert_eq!(kofn.required(), 1);
    assert_eq!(
        kofn.constraints(),
        &[Constraint::Passcode, Constraint::biometric_any(GROUP_X.to_vec())]
    );
    assert_eq!(decoded.constraint("delete"), Some(&Constraint::Passcode));
    assert!(decoded.constraint("sign").is_none());
    assert_eq!(decoded, acl);
}

#[test]
fn test_copy_constraint_data_scenario() {
    let acl = reference_acl();

    let data = acl
        .copy_constraint_data("delete")
        .expect("'delete' has a constraint");
    assert_eq!(Constraint::from_bytes(&data).unwrap(), Constraint::Passcode);

    assert!(acl.copy_constraint_data("sign").is_none());
}

#[test]
fn test_constraint_data_matches_entry_encoding() {
    let acl = reference_acl();
    let blob = acl.to_bytes();
    let data = acl.copy_constraint_data("use").unwrap();
    // The per-operation bytes appear verbatim inside the full encoding.
    assert!(blob.windows(data.len()).any(|w| w == data.as_slice()));
}

#[test]
fn test_encoding_is_deterministic_across_setter_order() {
    let first = reference_acl();

    let mut second = AccessControl::new();
    second
        .add_constraint(
            "use",
            Constraint::any_of(vec![
                Constraint::Passcode,
                Constraint::biometric_any(GROUP_X.to_vec()),
            ])
            .unwrap(),
        )
        .unwrap();
    second.add_constraint("delete", Constraint::Passcode).unwrap();
    second.set_protection_class(Protection::AfterFirstUnlock);

    assert_eq!(first.to_bytes(), first.to_bytes());
    assert_eq!(first.to_bytes(), second.to_bytes());
}

#[test]
fn test_k_of_n_boundaries() {
    let subs = || {
        vec![
            Constraint::Passcode,
            Constraint::user_presence(),
            Constraint::biometric_current_set(GROUP_X.to_vec(), vec![0x11; 32]),
        ]
    };

    let zero = Constraint::k_of_n(0, subs()).unwrap_err();
    assert!(matches!(zero, Error::InvalidArgument { .. }));
    let over = Constraint::k_of_n(4, subs()).unwrap_err();
    assert!(matches!(over, Error::InvalidArgument { .. }));

    let mut acl = AccessControl::new();
    acl.add_constraint("od", Constraint::k_of_n(1, subs()).unwrap())
        .unwrap();
    acl.add_constraint("osgn", Constraint::k_of_n(3, subs()).unwrap())
        .unwrap();
    let decoded = AccessControl::from_bytes(&acl.to_bytes()).unwrap();
    assert_eq!(decoded, acl);
}

#[test]
fn test_deeply_nested_tree_round_trips() {
    let mut tree = Constraint::Passcode;
    for level in 0..20 {
        let sibling = if level % 2 == 0 {
            Constraint::user_presence()
        } else {
            Constraint::biometric_any(GROUP_X.to_vec())
        };
        tree = Constraint::k_of_n(2, vec![tree, sibling]).unwrap();
    }
    let mut acl = AccessControl::new();
    acl.add_constraint("oa", tree.clone()).unwrap();

    let decoded = AccessControl::from_bytes(&acl.to_bytes()).unwrap();
    assert_eq!(decoded.constraint("oa"), Some(&tree));
    assert_eq!(tree.depth(), 21);
}

#[test]
fn test_every_truncation_is_rejected() {
    let blob = reference_acl().to_bytes();
    for len in 0..blob.len() {
        let err = AccessControl::from_bytes(&blob[..len]).unwrap_err();
        assert!(err.is_malformed(), "prefix of {len} bytes gave {err}");
    }
}

#[test]
fn test_flag_constructor_round_trips() {
    use secacl_core::{AccessControlFlags, BiometricEnrollment};

    let enrollment = BiometricEnrollment::new(GROUP_X.to_vec(), vec![0xee; 32]);
    let flags = AccessControlFlags::BIOMETRY_CURRENT_SET
        | AccessControlFlags::DEVICE_PASSCODE
        | AccessControlFlags::OR
        | AccessControlFlags::PRIVATE_KEY_USAGE;
    let mut acl = AccessControl::with_flags(
        Protection::WhenUnlockedThisDeviceOnly,
        flags,
        Some(&enrollment),
    )
    .unwrap();
    acl.set_bound(true);

    let decoded = AccessControl::from_bytes(&acl.to_bytes()).unwrap();
    assert!(decoded.is_bound());
    assert_eq!(
        decoded.describe(),
        "Protection: kSecAttrAccessibleWhenUnlockedThisDeviceOnly\n\
         odel (Delete): Always\n\
         osgn (PrivateKeyUsage): TouchIDCurrentSet Or DevicePasscode\n\
         Bound\n"
    );
}

#[test]
fn test_json_view_matches_binary_state() {
    let acl = reference_acl();
    let json = serde_json::to_value(&acl).unwrap();
    assert_eq!(json["protection"], "ck");
    assert_eq!(json["constraints"]["delete"]["kind"], "passcode");
    assert_eq!(json["constraints"]["use"]["required"], 1);
    let back: AccessControl = serde_json::from_value(json).unwrap();
    assert_eq!(back.to_bytes(), acl.to_bytes());
}
