//! Accessibility classes an access-control object can be protected with.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Accessibility class of a protected item.
///
/// This is the closed catalog of protection tags the item store recognizes.
/// Each class has a short tag (as stored by the platform), a long constant
/// name, and a one-byte wire code used by the binary encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protection {
    /// Readable while the device is unlocked.
    #[serde(rename = "ak")]
    WhenUnlocked,

    /// Readable after the first unlock following boot.
    #[serde(rename = "ck")]
    AfterFirstUnlock,

    /// Always readable.
    #[serde(rename = "dk")]
    Always,

    /// Like [`Protection::WhenUnlocked`], never migrated off the device.
    #[serde(rename = "aku")]
    WhenUnlockedThisDeviceOnly,

    /// Like [`Protection::AfterFirstUnlock`], never migrated off the device.
    #[serde(rename = "cku")]
    AfterFirstUnlockThisDeviceOnly,

    /// Like [`Protection::Always`], never migrated off the device.
    #[serde(rename = "dku")]
    AlwaysThisDeviceOnly,

    /// Readable while unlocked, and only while a passcode is set.
    #[serde(rename = "akpu")]
    WhenPasscodeSetThisDeviceOnly,
}

impl Protection {
    /// Every protection class, in wire-code order.
    pub const ALL: [Protection; 7] = [
        Protection::WhenUnlocked,
        Protection::AfterFirstUnlock,
        Protection::Always,
        Protection::WhenUnlockedThisDeviceOnly,
        Protection::AfterFirstUnlockThisDeviceOnly,
        Protection::AlwaysThisDeviceOnly,
        Protection::WhenPasscodeSetThisDeviceOnly,
    ];

    /// Short tag as stored by the item store (`"ak"`, `"ck"`, ...).
    pub fn tag(&self) -> &'static str {
        match self {
            Protection::WhenUnlocked => "ak",
            Protection::AfterFirstUnlock => "ck",
            Protection::Always => "dk",
            Protection::WhenUnlockedThisDeviceOnly => "aku",
            Protection::AfterFirstUnlockThisDeviceOnly => "cku",
            Protection::AlwaysThisDeviceOnly => "dku",
            Protection::WhenPasscodeSetThisDeviceOnly => "akpu",
        }
    }

    /// Long constant name, e.g. `kSecAttrAccessibleWhenUnlocked`.
    pub fn long_name(&self) -> &'static str {
        match self {
            Protection::WhenUnlocked => "kSecAttrAccessibleWhenUnlocked",
            Protection::AfterFirstUnlock => "kSecAttrAccessibleAfterFirstUnlock",
            Protection::Always => "kSecAttrAccessibleAlways",
            Protection::WhenUnlockedThisDeviceOnly => {
                "kSecAttrAccessibleWhenUnlockedThisDeviceOnly"
            }
            Protection::AfterFirstUnlockThisDeviceOnly => {
                "kSecAttrAccessibleAfterFirstUnlockThisDeviceOnly"
            }
            Protection::AlwaysThisDeviceOnly => "kSecAttrAccessibleAlwaysThisDeviceOnly",
            Protection::WhenPasscodeSetThisDeviceOnly => {
                "kSecAttrAccessibleWhenPasscodeSetThisDeviceOnly"
            }
        }
    }

    /// Kebab-case name, e.g. `after-first-unlock`.
    pub fn slug(&self) -> &'static str {
        match self {
            Protection::WhenUnlocked => "when-unlocked",
            Protection::AfterFirstUnlock => "after-first-unlock",
            Protection::Always => "always",
            Protection::WhenUnlockedThisDeviceOnly => "when-unlocked-this-device-only",
            Protection::AfterFirstUnlockThisDeviceOnly => "after-first-unlock-this-device-only",
            Protection::AlwaysThisDeviceOnly => "always-this-device-only",
            Protection::WhenPasscodeSetThisDeviceOnly => "when-passcode-set-this-device-only",
        }
    }

    /// One-byte code used by the binary encoding. `0` is reserved for "unset".
    pub fn wire_code(&self) -> u8 {
        match self {
            Protection::WhenUnlocked => 1,
            Protection::AfterFirstUnlock => 2,
            Protection::Always => 3,
            Protection::WhenUnlockedThisDeviceOnly => 4,
            Protection::AfterFirstUnlockThisDeviceOnly => 5,
            Protection::AlwaysThisDeviceOnly => 6,
            Protection::WhenPasscodeSetThisDeviceOnly => 7,
        }
    }

    /// Looks up a class by wire code. Returns `None` for `0` and unknown codes.
    pub fn from_wire_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.wire_code() == code)
    }

    /// Looks up a class by short tag, long constant name, or kebab-case name.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.tag() == tag || p.long_name() == tag || p.slug() == tag)
    }

    /// Returns `true` for classes that are bound to this device.
    pub fn is_this_device_only(&self) -> bool {
        matches!(
            self,
            Protection::WhenUnlockedThisDeviceOnly
                | Protection::AfterFirstUnlockThisDeviceOnly
                | Protection::AlwaysThisDeviceOnly
                | Protection::WhenPasscodeSetThisDeviceOnly
        )
    }
}

impl fmt::Display for Protection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for Protection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_tag(s).ok_or_else(|| {
            Error::invalid_field("protection", format!("unknown accessibility tag '{s}'"))
        })
    }
}
