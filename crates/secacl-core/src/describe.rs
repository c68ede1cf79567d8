//! Human-readable summaries of constraints and access-control objects.
//!
//! The vocabulary follows what keychain tooling shows for access-control
//! attributes: `UserPresence`, `DevicePasscode`, `TouchIDAny`,
//! `TouchIDCurrentSet`, joined with `Or` / `And`.

use std::fmt;

use crate::access_control::AccessControl;
use crate::types::ids::{operations, policies};
use crate::types::{Constraint, KofN};

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::AlwaysAllowed => write!(f, "Always"),
            Constraint::Policy { policy }
                if policy.as_str() == policies::DEVICE_OWNER_AUTHENTICATION =>
            {
                write!(f, "UserPresence")
            }
            Constraint::Policy { policy } => write!(f, "Policy({policy})"),
            Constraint::Passcode => write!(f, "DevicePasscode"),
            Constraint::BiometricAny { .. } => write!(f, "TouchIDAny"),
            Constraint::BiometricCurrentSet { .. } => write!(f, "TouchIDCurrentSet"),
            Constraint::KofN(kofn) => write_k_of_n(f, kofn),
        }
    }
}

fn write_k_of_n(f: &mut fmt::Formatter<'_>, kofn: &KofN) -> fmt::Result {
    if let [only] = kofn.constraints() {
        return write!(f, "{only}");
    }
    let (open, separator, close) = if kofn.is_any() {
        (String::new(), " Or ", String::new())
    } else if kofn.is_all() {
        (String::new(), " And ", String::new())
    } else {
        (format!("{}of{}(", kofn.required(), kofn.len()), ", ", ")".to_string())
    };
    write!(f, "{open}")?;
    for (i, sub) in kofn.constraints().iter().enumerate() {
        if i > 0 {
            write!(f, "{separator}")?;
        }
        match sub.as_k_of_n() {
            Some(nested) if nested.len() > 1 => write!(f, "({sub})")?,
            _ => write!(f, "{sub}")?,
        }
    }
    write!(f, "{close}")
}

/// Readable name for a well-known operation identifier.
pub fn operation_label(operation: &str) -> Option<&'static str> {
    match operation {
        operations::DEFAULT_ACL => Some("DefaultAcl"),
        operations::DECRYPT => Some("Decrypt"),
        operations::ENCRYPT => Some("Encrypt"),
        operations::DELETE => Some("Delete"),
        operations::SIGN => Some("PrivateKeyUsage"),
        operations::COMPUTE_KEY => Some("KeyExchange"),
        operations::ATTEST => Some("Attest"),
        _ => None,
    }
}

impl fmt::Display for AccessControl {
    /// One line per fact: protection, each constrained operation in key
    /// order, then the envelope flags that are set.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.protection() {
            Some(protection) => writeln!(f, "Protection: {}", protection.long_name())?,
            None => writeln!(f, "Protection: none")?,
        }
        for (operation, constraint) in self.constraints() {
            match operation_label(operation.as_str()) {
                Some(label) => writeln!(f, "{operation} ({label}): {constraint}")?,
                None => writeln!(f, "{operation}: {constraint}")?,
            }
        }
        if self.require_password() {
            writeln!(f, "ApplicationPassword")?;
        }
        if self.is_bound() {
            writeln!(f, "Bound")?;
        }
        Ok(())
    }
}

impl AccessControl {
    /// Multi-line human-readable summary of this object.
    pub fn describe(&self) -> String {
        self.to_string()
    }
}
