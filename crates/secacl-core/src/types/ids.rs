//! Identifier types for operations and policies.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

use crate::error::{Error, Result};

/// Longest operation identifier accepted, in bytes.
pub const MAX_OPERATION_ID_LEN: usize = 255;

/// Well-known operation identifiers used by the platform item store.
pub mod operations {
    /// Default ACL applied to operations without an explicit entry.
    pub const DEFAULT_ACL: &str = "dacl";
    /// Decrypt / use the protected item.
    pub const DECRYPT: &str = "od";
    /// Encrypt with the protected key.
    pub const ENCRYPT: &str = "oe";
    /// Delete the protected item.
    pub const DELETE: &str = "odel";
    /// Sign with the protected private key.
    pub const SIGN: &str = "osgn";
    /// Key agreement with the protected private key.
    pub const COMPUTE_KEY: &str = "ock";
    /// Produce an attestation for the protected key.
    pub const ATTEST: &str = "oa";
}

/// Well-known policy identifiers understood by the local-authentication service.
pub mod policies {
    /// Any owner authentication: biometrics or passcode ("user presence").
    pub const DEVICE_OWNER_AUTHENTICATION: &str = "DeviceOwnerAuthentication";
    /// Owner authentication restricted to biometrics.
    pub const DEVICE_OWNER_AUTHENTICATION_WITH_BIOMETRICS: &str =
        "DeviceOwnerAuthenticationWithBiometrics";
}

/// Identifier of an operation that can be gated by a constraint.
///
/// Operation IDs are short opaque strings such as `"od"` or `"odel"`; see
/// [`operations`] for the well-known values.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(String);

impl OperationId {
    /// Creates a new operation ID from a string.
    ///
    /// The value is not checked here; [`OperationId::validate`] runs when the
    /// ID is attached to an access-control object.
    ///
    /// # Examples
    ///
    /// ```
    /// use secacl_core::OperationId;
    ///
    /// let id = OperationId::new("odel");
    /// assert_eq!(id.as_str(), "odel");
    /// ```
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// Returns the operation ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks that the ID is non-empty, at most [`MAX_OPERATION_ID_LEN`]
    /// bytes, and free of control characters.
    pub fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(Error::invalid_field(
                "operation",
                "operation id must not be empty",
            ));
        }
        if self.0.len() > MAX_OPERATION_ID_LEN {
            return Err(Error::invalid_field(
                "operation",
                format!(
                    "operation id is {} bytes, limit is {MAX_OPERATION_ID_LEN}",
                    self.0.len()
                ),
            ));
        }
        if self.0.chars().any(char::is_control) {
            return Err(Error::invalid_field(
                "operation",
                format!("operation id {:?} contains control characters", self.0),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OperationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OperationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for OperationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for OperationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Opaque token naming an external authentication policy.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyId(String);

impl PolicyId {
    /// Creates a new policy ID from a string.
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// The user-presence policy (biometrics or passcode).
    pub fn device_owner_authentication() -> Self {
        Self::new(policies::DEVICE_OWNER_AUTHENTICATION)
    }

    /// Returns the policy ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks that the ID is non-empty.
    pub fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(Error::invalid_field("policy", "policy id must not be empty"));
        }
        Ok(())
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PolicyId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PolicyId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for PolicyId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
