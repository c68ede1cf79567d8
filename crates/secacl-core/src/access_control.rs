//! The access-control object: protection class, flags, and per-operation
//! constraints.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::codec::{self, Envelope};
use crate::error::{Error, Result};
use crate::types::ids::operations;
use crate::types::{AccessControlFlags, BiometricEnrollment, Constraint, OperationId, Protection};

/// Constraints keyed by the operation they gate.
pub type ConstraintMap = BTreeMap<OperationId, Constraint>;

/// Policy object pairing an accessibility class with per-operation
/// constraints.
///
/// An operation without an entry is not allowed at all; an entry holding
/// [`Constraint::AlwaysAllowed`] permits it unconditionally.
///
/// The object is a plain value: its owner mutates it through the setters
/// below and then encodes it with [`AccessControl::to_bytes`].
///
/// # Examples
///
/// ```
/// use secacl_core::{AccessControl, Constraint};
///
/// let mut acl = AccessControl::new();
/// acl.set_protection("ck").unwrap();
/// acl.add_constraint("odel", Constraint::Passcode).unwrap();
///
/// let decoded = AccessControl::from_bytes(&acl.to_bytes()).unwrap();
/// assert_eq!(decoded, acl);
/// assert!(decoded.constraint("osgn").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAccessControl")]
pub struct AccessControl {
    protection: Option<Protection>,
    require_password: bool,
    bound: bool,
    constraints: ConstraintMap,
}

#[derive(Deserialize)]
struct RawAccessControl {
    protection: Option<Protection>,
    require_password: bool,
    bound: bool,
    constraints: ConstraintMap,
}

impl TryFrom<RawAccessControl> for AccessControl {
    type Error = Error;

    /// Every entry goes through [`AccessControl::add_constraint`], so
    /// deserialized objects meet the same rules as built ones.
    fn try_from(raw: RawAccessControl) -> Result<Self> {
        let mut acl = Self {
            protection: raw.protection,
            require_password: raw.require_password,
            bound: raw.bound,
            constraints: ConstraintMap::new(),
        };
        for (operation, constraint) in raw.constraints {
            acl.add_constraint(operation, constraint)?;
        }
        Ok(acl)
    }
}

impl AccessControl {
    /// Creates an empty object: no protection, no constraints, both flags off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the standard object described by a set of creation flags.
    ///
    /// Each constraint flag contributes one leaf. Several leaves must be
    /// combined with exactly one of [`AccessControlFlags::OR`] or
    /// [`AccessControlFlags::AND`]. The result guards signing when
    /// [`AccessControlFlags::PRIVATE_KEY_USAGE`] is set and decryption
    /// otherwise; deletion is always allowed.
    ///
    /// Biometric flags need the enrollment data in `biometrics`.
    pub fn with_flags(
        protection: Protection,
        flags: AccessControlFlags,
        biometrics: Option<&BiometricEnrollment>,
    ) -> Result<Self> {
        if flags.contains(AccessControlFlags::OR) && flags.contains(AccessControlFlags::AND) {
            return Err(Error::invalid_field(
                "flags",
                "'or' and 'and' cannot be combined",
            ));
        }

        let mut leaves = Vec::new();
        if flags.contains(AccessControlFlags::USER_PRESENCE) {
            leaves.push(Constraint::user_presence());
        }
        if flags.needs_biometrics() {
            let enrollment = biometrics.ok_or_else(|| {
                Error::invalid_field("biometrics", "biometric flags need enrollment data")
            })?;
            if flags.contains(AccessControlFlags::BIOMETRY_ANY) {
                leaves.push(Constraint::biometric_any(enrollment.group.clone()));
            }
            if flags.contains(AccessControlFlags::BIOMETRY_CURRENT_SET) {
                leaves.push(Constraint::biometric_current_set(
                    enrollment.group.clone(),
                    enrollment.state_hash.clone(),
                ));
            }
        }
        if flags.contains(AccessControlFlags::DEVICE_PASSCODE) {
            leaves.push(Constraint::Passcode);
        }

        let guard = match leaves.len() {
            0 => Constraint::AlwaysAllowed,
            1 => leaves.remove(0),
            _ if flags.contains(AccessControlFlags::OR) => Constraint::any_of(leaves)?,
            _ if flags.contains(AccessControlFlags::AND) => Constraint::all_of(leaves)?,
            n => {
                return Err(Error::invalid_field(
                    "flags",
                    format!("{n} constraints need 'or' or 'and' to combine them"),
                ));
            }
        };

        let operation = if flags.contains(AccessControlFlags::PRIVATE_KEY_USAGE) {
            operations::SIGN
        } else {
            operations::DECRYPT
        };

        let mut acl = Self::new();
        acl.set_protection_class(protection);
        acl.add_constraint(operation, guard)?;
        acl.add_constraint(operations::DELETE, Constraint::AlwaysAllowed)?;
        acl.set_require_password(flags.contains(AccessControlFlags::APPLICATION_PASSWORD));
        tracing::debug!(%protection, %flags, %operation, "built access control from flags");
        Ok(acl)
    }

    /// Accessibility class, if one has been set.
    pub fn protection(&self) -> Option<Protection> {
        self.protection
    }

    /// Sets the accessibility class from its tag or long constant name.
    ///
    /// Fails with [`Error::InvalidArgument`] for tags outside the catalog,
    /// leaving the current protection unchanged.
    pub fn set_protection(&mut self, tag: &str) -> Result<()> {
        let protection: Protection = tag.parse()?;
        self.protection = Some(protection);
        Ok(())
    }

    /// Sets the accessibility class.
    pub fn set_protection_class(&mut self, protection: Protection) {
        self.protection = Some(protection);
    }

    /// Inserts or replaces the constraint for `operation`.
    ///
    /// The operation ID and the whole constraint tree are validated before
    /// anything changes.
    pub fn add_constraint<O>(&mut self, operation: O, constraint: Constraint) -> Result<()>
    where
        O: Into<OperationId>,
    {
        let operation = operation.into();
        operation.validate()?;
        constraint.validate()?;
        self.constraints.insert(operation, constraint);
        Ok(())
    }

    /// Constraint for `operation`, or `None` if the operation is not allowed.
    pub fn constraint(&self, operation: &str) -> Option<&Constraint> {
        self.constraints.get(operation)
    }

    /// Like [`AccessControl::constraint`], but reports absence as
    /// [`Error::NotFound`].
    pub fn require_constraint(&self, operation: &str) -> Result<&Constraint> {
        self.constraint(operation).ok_or_else(|| Error::NotFound {
            operation: operation.to_string(),
        })
    }

    /// All constraints, keyed by operation.
    pub fn constraints(&self) -> &ConstraintMap {
        &self.constraints
    }

    /// Replaces every constraint at once.
    ///
    /// This is the trusted path used when rebuilding from storage: entries
    /// are not validated.
    pub fn set_constraints(&mut self, constraints: ConstraintMap) {
        self.constraints = constraints;
    }

    /// Whether an application password is required.
    pub fn require_password(&self) -> bool {
        self.require_password
    }

    /// Sets whether an application password is required.
    pub fn set_require_password(&mut self, require: bool) {
        self.require_password = require;
    }

    /// Whether the object is bound to this device's authentication context.
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Sets whether the object is bound to this device's authentication
    /// context.
    pub fn set_bound(&mut self, bound: bool) {
        self.bound = bound;
    }

    /// The header fields of this object.
    pub fn envelope(&self) -> Envelope {
        Envelope {
            protection: self.protection,
            require_password: self.require_password,
            bound: self.bound,
        }
    }

    /// Encodes the whole object.
    ///
    /// The output depends only on the logical state, never on the order in
    /// which constraints were added. Length prefixes are `u32`; a field
    /// longer than `u32::MAX` bytes is written with a saturated length and
    /// the resulting blob does not decode.
    pub fn to_bytes(&self) -> Vec<u8> {
        codec::encode(&self.envelope(), &self.constraints)
    }

    /// Decodes an object produced by [`AccessControl::to_bytes`].
    ///
    /// The entire blob is checked before a value is returned; see
    /// [`crate::codec`] for what is rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (envelope, constraints) = codec::decode(bytes)?;
        Ok(Self {
            protection: envelope.protection,
            require_password: envelope.require_password,
            bound: envelope.bound,
            constraints,
        })
    }

    /// Encodes only the constraint attached to `operation`.
    ///
    /// Returns `None` if the operation has no constraint. Decode the result
    /// with [`Constraint::from_bytes`].
    pub fn copy_constraint_data(&self, operation: &str) -> Option<Vec<u8>> {
        self.constraint(operation).map(Constraint::to_bytes)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn enrollment() -> BiometricEnrollment {
        BiometricEnrollment::new(b"catacomb".to_vec(), vec![0x5a; 20])
    }

    #[test]
    fn test_new_is_empty() {
        let acl = AccessControl::new();
        assert_eq!(acl.protection(), None);
        assert!(!acl.require_password());
        assert!(!acl.is_bound());
        assert!(acl.constraints().is_empty());
    }

    #[test]
    fn test_set_protection_by_tag() {
        let mut acl = AccessControl::new();
        acl.set_protection("ck").unwrap();
        assert_eq!(acl.protection(), Some(Protection::AfterFirstUnlock));
        acl.set_protection("kSecAttrAccessibleWhenUnlockedThisDeviceOnly")
            .unwrap();
        assert_eq!(acl.protection(), Some(Protection::WhenUnlockedThisDeviceOnly));
    }

    #[test]
    fn test_set_protection_rejects_unknown_tag() {
        let mut acl = AccessControl::new();
        acl.set_protection("ak").unwrap();
        let err = acl.set_protection("bogus").unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(acl.protection(), Some(Protection::WhenUnlocked));
    }

    #[test]
    fn test_absent_versus_always_allowed() {
        let mut acl = AccessControl::new();
        assert!(acl.constraint("od").is_none());
        acl.add_constraint("od", Constraint::AlwaysAllowed).unwrap();
        assert_eq!(acl.constraint("od"), Some(&Constraint::AlwaysAllowed));
    }

    #[test]
    fn test_add_constraint_replaces() {
        let mut acl = AccessControl::new();
        acl.add_constraint("od", Constraint::Passcode).unwrap();
        acl.add_constraint("od", Constraint::user_presence()).unwrap();
        assert_eq!(acl.constraints().len(), 1);
        assert_eq!(acl.constraint("od"), Some(&Constraint::user_presence()));
    }

    #[test]
    fn test_add_constraint_rejects_invalid_input_without_change() {
        let mut acl = AccessControl::new();
        acl.add_constraint("od", Constraint::Passcode).unwrap();

        let err = acl.add_constraint("", Constraint::Passcode).unwrap_err();
        assert!(err.is_invalid_argument());
        let err = acl
            .add_constraint("od", Constraint::biometric_any(Vec::new()))
            .unwrap_err();
        assert!(err.is_invalid_argument());

        assert_eq!(acl.constraints().len(), 1);
        assert_eq!(acl.constraint("od"), Some(&Constraint::Passcode));
    }

    #[test]
    fn test_require_constraint() {
        let mut acl = AccessControl::new();
        acl.add_constraint("odel", Constraint::AlwaysAllowed).unwrap();
        assert!(acl.require_constraint("odel").is_ok());
        let err = acl.require_constraint("osgn").unwrap_err();
        assert!(matches!(err, Error::NotFound { operation } if operation == "osgn"));
    }

    #[test]
    fn test_set_constraints_is_wholesale() {
        let mut acl = AccessControl::new();
        acl.add_constraint("od", Constraint::Passcode).unwrap();
        let mut replacement = ConstraintMap::new();
        replacement.insert(OperationId::new("osgn"), Constraint::user_presence());
        acl.set_constraints(replacement);
        assert!(acl.constraint("od").is_none());
        assert!(acl.constraint("osgn").is_some());
    }

    #[test]
    fn test_flags_round_trip_through_setters() {
        let mut acl = AccessControl::new();
        acl.set_require_password(true);
        acl.set_bound(true);
        assert!(acl.require_password());
        assert!(acl.is_bound());
        let envelope = acl.envelope();
        assert!(envelope.require_password && envelope.bound);
    }

    #[test]
    fn test_copy_constraint_data() {
        let mut acl = AccessControl::new();
        acl.add_constraint("odel", Constraint::Passcode).unwrap();
        let data = acl.copy_constraint_data("odel").unwrap();
        assert_eq!(Constraint::from_bytes(&data).unwrap(), Constraint::Passcode);
        assert!(acl.copy_constraint_data("od").is_none());
    }

    #[test]
    fn test_with_flags_single_leaf() {
        let acl = AccessControl::with_flags(
            Protection::WhenUnlocked,
            AccessControlFlags::DEVICE_PASSCODE,
            None,
        )
        .unwrap();
        assert_eq!(acl.protection(), Some(Protection::WhenUnlocked));
        assert_eq!(acl.constraint("od"), Some(&Constraint::Passcode));
        assert_eq!(acl.constraint("odel"), Some(&Constraint::AlwaysAllowed));
        assert!(acl.constraint("osgn").is_none());
        assert!(!acl.require_password());
    }

    #[test]
    fn test_with_flags_or_combination() {
        let flags = AccessControlFlags::DEVICE_PASSCODE
            | AccessControlFlags::BIOMETRY_ANY
            | AccessControlFlags::OR;
        let acl =
            AccessControl::with_flags(Protection::AfterFirstUnlock, flags, Some(&enrollment()))
                .unwrap();
        let kofn = acl.constraint("od").unwrap().as_k_of_n().unwrap();
        assert_eq!(kofn.required(), 1);
        assert_eq!(
            kofn.constraints(),
            &[
                Constraint::biometric_any(b"catacomb".to_vec()),
                Constraint::Passcode
            ]
        );
    }

    #[test]
    fn test_with_flags_and_private_key_usage() {
        let flags = AccessControlFlags::USER_PRESENCE
            | AccessControlFlags::BIOMETRY_CURRENT_SET
            | AccessControlFlags::AND
            | AccessControlFlags::PRIVATE_KEY_USAGE
            | AccessControlFlags::APPLICATION_PASSWORD;
        let acl = AccessControl::with_flags(
            Protection::WhenPasscodeSetThisDeviceOnly,
            flags,
            Some(&enrollment()),
        )
        .unwrap();
        assert!(acl.constraint("od").is_none());
        let kofn = acl.constraint("osgn").unwrap().as_k_of_n().unwrap();
        assert!(kofn.is_all());
        assert_eq!(kofn.len(), 2);
        assert!(acl.require_password());
    }

    #[test]
    fn test_with_flags_no_constraints_allows_operation() {
        let acl = AccessControl::with_flags(
            Protection::Always,
            AccessControlFlags::PRIVATE_KEY_USAGE,
            None,
        )
        .unwrap();
        assert_eq!(acl.constraint("osgn"), Some(&Constraint::AlwaysAllowed));
    }

    #[test]
    fn test_json_round_trip() {
        let flags = AccessControlFlags::BIOMETRY_CURRENT_SET
            | AccessControlFlags::DEVICE_PASSCODE
            | AccessControlFlags::AND;
        let mut acl = AccessControl::with_flags(
            Protection::AlwaysThisDeviceOnly,
            flags,
            Some(&enrollment()),
        )
        .unwrap();
        acl.set_bound(true);

        let json = serde_json::to_string(&acl).unwrap();
        let back: AccessControl = serde_json::from_str(&json).unwrap();
        assert_eq!(back, acl);
        assert_eq!(AccessControl::from_bytes(&back.to_bytes()).unwrap(), acl);
    }

    #[test]
    fn test_json_rejects_empty_operation_id() {
        let json = r#"{"protection":null,"require_password":false,"bound":false,
            "constraints":{"":{"kind":"passcode"}}}"#;
        let err = serde_json::from_str::<AccessControl>(json).unwrap_err();
        assert!(err.to_string().contains("operation id must not be empty"));
    }

    #[test]
    fn test_json_rejects_empty_leaves() {
        let leaves = [
            r#"{"kind":"biometric_any","group":""}"#,
            r#"{"kind":"biometric_current_set","group":"0a","state_hash":""}"#,
            r#"{"kind":"policy","policy":""}"#,
            r#"{"kind":"k_of_n","required":1,
                "constraints":[{"kind":"biometric_any","group":""}]}"#,
        ];
        for leaf in leaves {
            let json = format!(
                r#"{{"protection":"ck","require_password":false,"bound":false,
                    "constraints":{{"od":{leaf}}}}}"#
            );
            let err = serde_json::from_str::<AccessControl>(&json).unwrap_err();
            assert!(err.to_string().contains("must not be empty"), "{leaf}: {err}");
        }
    }

    #[test]
    fn test_with_flags_rejections() {
        let both = AccessControlFlags::DEVICE_PASSCODE
            | AccessControlFlags::USER_PRESENCE
            | AccessControlFlags::OR
            | AccessControlFlags::AND;
        assert!(AccessControl::with_flags(Protection::Always, both, None).is_err());

        let uncombined = AccessControlFlags::DEVICE_PASSCODE | AccessControlFlags::USER_PRESENCE;
        let err = AccessControl::with_flags(Protection::Always, uncombined, None).unwrap_err();
        assert!(err.to_string().contains("'or' or 'and'"));

        let missing = AccessControlFlags::BIOMETRY_ANY;
        let err = AccessControl::with_flags(Protection::Always, missing, None).unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
