//! Constraint trees gating individual operations.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::ids::PolicyId;

/// Deepest constraint tree accepted, counting the root as level 1.
pub const MAX_CONSTRAINT_DEPTH: usize = 64;

/// Rule that must hold before an operation on a protected item proceeds.
///
/// Leaf variants describe a single authentication requirement; [`KofN`]
/// composes other constraints. Trees are built bottom-up by value, so they
/// cannot contain cycles.
///
/// # Examples
///
/// ```
/// use secacl_core::Constraint;
///
/// let either = Constraint::any_of(vec![
///     Constraint::Passcode,
///     Constraint::biometric_any(b"group-1".to_vec()),
/// ])
/// .unwrap();
/// assert_eq!(either.depth(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    /// The operation is permitted unconditionally.
    AlwaysAllowed,

    /// The operation is gated by a named external policy.
    Policy {
        /// Policy to consult
        policy: PolicyId,
    },

    /// The operation requires passcode verification.
    Passcode,

    /// The operation requires a biometric match against any enrolled identity.
    BiometricAny {
        /// Enrollment group the match is checked against
        #[serde(with = "crate::types::hex_bytes")]
        group: Vec<u8>,
    },

    /// The operation requires a biometric match against the identity set
    /// enrolled when the constraint was created.
    ///
    /// The constraint stops being satisfiable once the enrolled set changes,
    /// which is detected through `state_hash`.
    BiometricCurrentSet {
        /// Enrollment group the match is checked against
        #[serde(with = "crate::types::hex_bytes")]
        group: Vec<u8>,
        /// Hash of the enrollment database at creation time
        #[serde(with = "crate::types::hex_bytes")]
        state_hash: Vec<u8>,
    },

    /// At least `required` of the sub-constraints must hold.
    #[serde(rename = "k_of_n")]
    KofN(KofN),
}

impl Constraint {
    /// Creates a policy constraint.
    pub fn policy<P: Into<PolicyId>>(policy: P) -> Self {
        Constraint::Policy {
            policy: policy.into(),
        }
    }

    /// Creates the user-presence constraint (owner authentication policy).
    pub fn user_presence() -> Self {
        Constraint::Policy {
            policy: PolicyId::device_owner_authentication(),
        }
    }

    /// Creates a biometric constraint accepting any enrolled identity.
    pub fn biometric_any<G: Into<Vec<u8>>>(group: G) -> Self {
        Constraint::BiometricAny {
            group: group.into(),
        }
    }

    /// Creates a biometric constraint pinned to the current enrollment set.
    pub fn biometric_current_set<G, H>(group: G, state_hash: H) -> Self
    where
        G: Into<Vec<u8>>,
        H: Into<Vec<u8>>,
    {
        Constraint::BiometricCurrentSet {
            group: group.into(),
            state_hash: state_hash.into(),
        }
    }

    /// Creates a k-of-n composite.
    ///
    /// Fails with [`Error::InvalidArgument`] if `required` is zero, exceeds
    /// the number of sub-constraints, or any sub-constraint is invalid.
    pub fn k_of_n(required: u32, constraints: Vec<Constraint>) -> Result<Self> {
        KofN::new(required, constraints).map(Constraint::KofN)
    }

    /// Creates a composite satisfied by any one of `constraints`.
    pub fn any_of(constraints: Vec<Constraint>) -> Result<Self> {
        Self::k_of_n(1, constraints)
    }

    /// Creates a composite satisfied only when all of `constraints` hold.
    pub fn all_of(constraints: Vec<Constraint>) -> Result<Self> {
        let required = u32::try_from(constraints.len()).map_err(|_| {
            Error::invalid_field("constraints", "too many sub-constraints")
        })?;
        Self::k_of_n(required, constraints)
    }

    /// Returns `true` for the unconditional sentinel.
    pub fn is_always_allowed(&self) -> bool {
        matches!(self, Constraint::AlwaysAllowed)
    }

    /// Returns the composite if this is a k-of-n constraint.
    pub fn as_k_of_n(&self) -> Option<&KofN> {
        match self {
            Constraint::KofN(kofn) => Some(kofn),
            _ => None,
        }
    }

    /// Height of the tree; leaves have depth 1.
    pub fn depth(&self) -> usize {
        match self {
            Constraint::KofN(kofn) => {
                1 + kofn
                    .constraints
                    .iter()
                    .map(Constraint::depth)
                    .max()
                    .unwrap_or(0)
            }
            _ => 1,
        }
    }

    /// Checks the whole tree: identifiers are non-empty, k-of-n arithmetic
    /// holds, and nesting stays within [`MAX_CONSTRAINT_DEPTH`].
    pub fn validate(&self) -> Result<()> {
        self.validate_at(1)
    }

    fn validate_at(&self, depth: usize) -> Result<()> {
        if depth > MAX_CONSTRAINT_DEPTH {
            return Err(Error::invalid_field(
                "constraint",
                format!("nesting exceeds {MAX_CONSTRAINT_DEPTH} levels"),
            ));
        }
        match self {
            Constraint::AlwaysAllowed | Constraint::Passcode => Ok(()),
            Constraint::Policy { policy } => policy.validate(),
            Constraint::BiometricAny { group } => check_group(group),
            Constraint::BiometricCurrentSet { group, state_hash } => {
                check_group(group)?;
                if state_hash.is_empty() {
                    return Err(Error::invalid_field(
                        "state_hash",
                        "enrollment state hash must not be empty",
                    ));
                }
                Ok(())
            }
            Constraint::KofN(kofn) => {
                check_arity(kofn.required, kofn.constraints.len())?;
                kofn.constraints
                    .iter()
                    .try_for_each(|c| c.validate_at(depth + 1))
            }
        }
    }
}

fn check_group(group: &[u8]) -> Result<()> {
    if group.is_empty() {
        return Err(Error::invalid_field(
            "group",
            "biometric group identifier must not be empty",
        ));
    }
    Ok(())
}

fn check_arity(required: u32, available: usize) -> Result<()> {
    if required == 0 {
        return Err(Error::invalid_field(
            "required",
            "required count must be at least 1",
        ));
    }
    // u32 always fits in usize on supported targets
    if required as usize > available {
        return Err(Error::invalid_field(
            "required",
            format!("required count {required} exceeds {available} sub-constraints"),
        ));
    }
    Ok(())
}

/// Composite constraint satisfied when at least `required` of its ordered
/// sub-constraints are satisfied.
///
/// Fields are private; a `KofN` always satisfies
/// `1 <= required <= constraints.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawKofN")]
pub struct KofN {
    required: u32,
    constraints: Vec<Constraint>,
}

#[derive(Deserialize)]
struct RawKofN {
    required: u32,
    constraints: Vec<Constraint>,
}

impl TryFrom<RawKofN> for KofN {
    type Error = Error;

    fn try_from(raw: RawKofN) -> Result<Self> {
        KofN::new(raw.required, raw.constraints)
    }
}

impl KofN {
    /// Creates a validated k-of-n composite.
    pub fn new(required: u32, constraints: Vec<Constraint>) -> Result<Self> {
        check_arity(required, constraints.len())?;
        constraints.iter().try_for_each(|c| c.validate_at(2))?;
        Ok(Self {
            required,
            constraints,
        })
    }

    /// Builds a composite whose arithmetic and children were already checked
    /// by the decoder.
    pub(crate) fn from_decoded(required: u32, constraints: Vec<Constraint>) -> Self {
        Self {
            required,
            constraints,
        }
    }

    /// Number of sub-constraints that must hold.
    pub fn required(&self) -> u32 {
        self.required
    }

    /// Sub-constraints in the order they were given.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Number of sub-constraints.
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// Always `false`; a valid composite has at least one sub-constraint.
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Returns `true` when any single sub-constraint suffices.
    pub fn is_any(&self) -> bool {
        self.required == 1
    }

    /// Returns `true` when every sub-constraint must hold.
    pub fn is_all(&self) -> bool {
        self.required as usize == self.constraints.len()
    }

    /// Consumes the composite, returning its parts.
    pub fn into_parts(self) -> (u32, Vec<Constraint>) {
        (self.required, self.constraints)
    }
}
