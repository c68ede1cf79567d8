//! Shared fixtures for integration tests.

use secacl_core::{AccessControl, Constraint};

/// Enrollment group used by biometric fixtures.
pub const GROUP_X: &[u8] = b"group-x";

/// The object from the reference scenario: passcode to delete, passcode or
/// any-biometric to use.
pub fn reference_acl() -> AccessControl {
    let mut acl = AccessControl::new();
    acl.set_protection("after-first-unlock")
        .expect("protection tag should be in the catalog");
    acl.add_constraint("delete", Constraint::Passcode)
        .expect("passcode constraint is valid");
    acl.add_constraint(
        "use",
        Constraint::k_of_n(
            1,
            vec![Constraint::Passcode, Constraint::biometric_any(GROUP_X.to_vec())],
        )
        .expect("1-of-2 is valid"),
    )
    .expect("k-of-n constraint is valid");
    acl
}
