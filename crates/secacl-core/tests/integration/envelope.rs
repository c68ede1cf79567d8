//! Envelope inspection and rewriting without touching the payload.

use secacl_core::codec::ENVELOPE_LEN;
use secacl_core::{AccessControl, Envelope, Protection};

use crate::common::reference_acl;

#[test]
fn test_peek_matches_object_envelope() {
    let mut acl = reference_acl();
    acl.set_require_password(true);
    let blob = acl.to_bytes();

    let envelope = Envelope::peek(&blob).unwrap();
    assert_eq!(envelope, acl.envelope());
}

#[test]
fn test_peek_ignores_corrupt_payload() {
    let mut blob = reference_acl().to_bytes();
    blob.truncate(ENVELOPE_LEN + 2);

    assert!(Envelope::peek(&blob).is_ok());
    assert!(AccessControl::from_bytes(&blob).unwrap_err().is_malformed());
}

#[test]
fn test_apply_updates_flags_and_keeps_constraints() {
    let acl = reference_acl();
    let blob = acl.to_bytes();

    let mut envelope = Envelope::peek(&blob).unwrap();
    envelope.bound = true;
    envelope.protection = Some(Protection::AfterFirstUnlockThisDeviceOnly);
    let rewritten = envelope.apply(&blob).unwrap();

    let decoded = AccessControl::from_bytes(&rewritten).unwrap();
    assert!(decoded.is_bound());
    assert!(!decoded.require_password());
    assert_eq!(
        decoded.protection(),
        Some(Protection::AfterFirstUnlockThisDeviceOnly)
    );
    assert_eq!(decoded.constraints(), acl.constraints());
}

#[test]
fn test_apply_matches_full_reencode() {
    let mut acl = reference_acl();
    let blob = acl.to_bytes();

    acl.set_require_password(true);
    let via_setter = acl.to_bytes();
    let via_envelope = acl.envelope().apply(&blob).unwrap();

    assert_eq!(via_envelope, via_setter);
}
