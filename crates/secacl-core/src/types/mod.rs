//! Core types for access-control objects.

mod constraint;
mod flags;
pub mod ids;
mod protection;
mod proptests;

pub use constraint::{Constraint, KofN, MAX_CONSTRAINT_DEPTH};
pub use flags::{AccessControlFlags, BiometricEnrollment};
pub use ids::{OperationId, PolicyId};
pub use protection::Protection;

/// Serde adapter writing byte fields as lowercase hex strings.
pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<T, S>(bytes: T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: AsRef<[u8]>,
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}
