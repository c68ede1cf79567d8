//! Flag set for building standard access-control objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Set of creation flags, combined with `|`.
///
/// Constraint flags ([`USER_PRESENCE`](Self::USER_PRESENCE),
/// [`BIOMETRY_ANY`](Self::BIOMETRY_ANY),
/// [`BIOMETRY_CURRENT_SET`](Self::BIOMETRY_CURRENT_SET),
/// [`DEVICE_PASSCODE`](Self::DEVICE_PASSCODE)) each contribute one leaf;
/// [`OR`](Self::OR) and [`AND`](Self::AND) say how several leaves combine.
///
/// # Examples
///
/// ```
/// use secacl_core::AccessControlFlags;
///
/// let flags = AccessControlFlags::DEVICE_PASSCODE | AccessControlFlags::BIOMETRY_ANY
///     | AccessControlFlags::OR;
/// assert!(flags.contains(AccessControlFlags::OR));
/// assert_eq!(flags.constraint_flag_count(), 2);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessControlFlags(u32);

impl AccessControlFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// Owner authentication through biometrics or passcode.
    pub const USER_PRESENCE: Self = Self(1 << 0);
    /// Biometric match against any enrolled identity.
    pub const BIOMETRY_ANY: Self = Self(1 << 1);
    /// Biometric match against the currently enrolled identity set.
    pub const BIOMETRY_CURRENT_SET: Self = Self(1 << 3);
    /// Passcode verification.
    pub const DEVICE_PASSCODE: Self = Self(1 << 4);
    /// Any one constraint suffices.
    pub const OR: Self = Self(1 << 14);
    /// All constraints must hold.
    pub const AND: Self = Self(1 << 15);
    /// Constraints guard private-key use rather than item decryption.
    pub const PRIVATE_KEY_USAGE: Self = Self(1 << 30);
    /// An application-supplied password is required as well.
    pub const APPLICATION_PASSWORD: Self = Self(1 << 31);

    const NAMED: [(&'static str, Self); 8] = [
        ("userPresence", Self::USER_PRESENCE),
        ("biometryAny", Self::BIOMETRY_ANY),
        ("biometryCurrentSet", Self::BIOMETRY_CURRENT_SET),
        ("devicePasscode", Self::DEVICE_PASSCODE),
        ("or", Self::OR),
        ("and", Self::AND),
        ("privateKeyUsage", Self::PRIVATE_KEY_USAGE),
        ("applicationPassword", Self::APPLICATION_PASSWORD),
    ];

    const CONSTRAINT_FLAGS: [Self; 4] = [
        Self::USER_PRESENCE,
        Self::BIOMETRY_ANY,
        Self::BIOMETRY_CURRENT_SET,
        Self::DEVICE_PASSCODE,
    ];

    /// Creates a flag set from raw bits. Unknown bits are rejected.
    pub fn from_bits(bits: u32) -> Result<Self> {
        let known = Self::NAMED.iter().fold(0, |acc, (_, f)| acc | f.0);
        if bits & !known != 0 {
            return Err(Error::invalid_field(
                "flags",
                format!("unknown flag bits {:#x}", bits & !known),
            ));
        }
        Ok(Self(bits))
    }

    /// Raw bits.
    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Returns `true` if every flag in `other` is set.
    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if no flag is set.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of leaf-producing flags that are set.
    pub fn constraint_flag_count(&self) -> usize {
        Self::CONSTRAINT_FLAGS
            .iter()
            .filter(|f| self.contains(**f))
            .count()
    }

    /// Returns `true` if a biometric flag is set.
    pub fn needs_biometrics(&self) -> bool {
        self.contains(Self::BIOMETRY_ANY) || self.contains(Self::BIOMETRY_CURRENT_SET)
    }

    /// Looks up a single flag by name.
    ///
    /// Accepts the camel-case names (`devicePasscode`) as well as their
    /// kebab-case spelling (`device-passcode`), ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        let folded: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect();
        Self::NAMED
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(&folded))
            .map(|(_, f)| *f)
    }
}

impl BitOr for AccessControlFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for AccessControlFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for AccessControlFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::NAMED
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(name, _)| *name)
            .collect();
        write!(f, "{}", names.join("|"))
    }
}

impl FromStr for AccessControlFlags {
    type Err = Error;

    /// Parses a `|`- or `,`-separated list of flag names.
    fn from_str(s: &str) -> Result<Self> {
        s.split(['|', ','])
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .try_fold(Self::NONE, |acc, part| {
                Self::from_name(part)
                    .map(|f| acc | f)
                    .ok_or_else(|| Error::invalid_field("flags", format!("unknown flag '{part}'")))
            })
    }
}

/// Enrollment data supplied by the biometric service when a biometric
/// constraint is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiometricEnrollment {
    /// Enrollment group identifier
    #[serde(with = "crate::types::hex_bytes")]
    pub group: Vec<u8>,
    /// Hash of the enrollment database state
    #[serde(with = "crate::types::hex_bytes")]
    pub state_hash: Vec<u8>,
}

impl BiometricEnrollment {
    /// Creates enrollment data from a group identifier and state hash.
    pub fn new<G, H>(group: G, state_hash: H) -> Self
    where
        G: Into<Vec<u8>>,
        H: Into<Vec<u8>>,
    {
        Self {
            group: group.into(),
            state_hash: state_hash.into(),
        }
    }
}
