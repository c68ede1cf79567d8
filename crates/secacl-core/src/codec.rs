//! Binary encoding of access-control objects and constraints.
//!
//! # Layout
//!
//! All integers are big-endian and every variable-length field carries a
//! `u32` length prefix.
//!
//! ```text
//! envelope (8 bytes)   "SACL" | version u8 | protection u8 | require_password u8 | bound u8
//! payload              count u32 | count x (operation_id, constraint)
//! operation_id         len u32 | UTF-8 bytes
//! constraint           tag u8 | variant payload
//!   0 always allowed   -
//!   1 policy           len u32 | UTF-8 bytes
//!   2 passcode         -
//!   3 biometric any    len u32 | group
//!   4 biometric set    len u32 | group | len u32 | state hash
//!   5 k-of-n           required u32 | count u32 | count x constraint
//! ```
//!
//! Entries are written in ascending operation-id order, which makes the
//! encoding of a given logical state unique. The decoder insists on that
//! order, so every accepted blob re-encodes to the same bytes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::access_control::ConstraintMap;
use crate::error::{Error, Result};
use crate::types::{Constraint, KofN, MAX_CONSTRAINT_DEPTH, OperationId, PolicyId, Protection};

/// Leading bytes of every encoded access-control object.
pub const MAGIC: [u8; 4] = *b"SACL";

/// Current (and only) format version.
pub const FORMAT_VERSION: u8 = 1;

/// Size of the fixed envelope header in bytes.
pub const ENVELOPE_LEN: usize = 8;

const TAG_ALWAYS_ALLOWED: u8 = 0;
const TAG_POLICY: u8 = 1;
const TAG_PASSCODE: u8 = 2;
const TAG_BIOMETRIC_ANY: u8 = 3;
const TAG_BIOMETRIC_CURRENT_SET: u8 = 4;
const TAG_K_OF_N: u8 = 5;

// Smallest valid entry: 4-byte length, 1 id byte, 1 tag byte.
const MIN_ENTRY_LEN: usize = 6;

/// Coarse policy carried in the fixed-size header of an encoded object.
///
/// The envelope can be read or rewritten without touching the constraint
/// payload that follows it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Accessibility class, if one is set
    pub protection: Option<Protection>,
    /// Whether an application password is required
    pub require_password: bool,
    /// Whether the object is bound to this device's authentication context
    pub bound: bool,
}

impl Envelope {
    /// Reads and validates only the header of an encoded object.
    pub fn peek(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        read_envelope(&mut reader)
    }

    /// Returns a copy of `bytes` with its header replaced by this envelope.
    ///
    /// The constraint payload is copied verbatim without being decoded; only
    /// the existing header is validated.
    pub fn apply(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Self::peek(bytes)?;
        let mut out = Vec::new();
        out.try_reserve_exact(bytes.len())?;
        self.write(&mut out);
        out.extend_from_slice(&bytes[ENVELOPE_LEN..]);
        Ok(out)
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&MAGIC);
        out.push(FORMAT_VERSION);
        out.push(self.protection.map_or(0, |p| p.wire_code()));
        out.push(u8::from(self.require_password));
        out.push(u8::from(self.bound));
    }
}

/// Encodes an envelope followed by its constraint payload.
pub(crate) fn encode(envelope: &Envelope, constraints: &ConstraintMap) -> Vec<u8> {
    let mut out = Vec::with_capacity(ENVELOPE_LEN + 4 + constraints.len() * 16);
    envelope.write(&mut out);
    write_len(&mut out, constraints.len());
    for (operation, constraint) in constraints {
        write_bytes(&mut out, operation.as_str().as_bytes());
        write_constraint(&mut out, constraint);
    }
    tracing::trace!(
        bytes = out.len(),
        entries = constraints.len(),
        "encoded access control"
    );
    out
}

/// Decodes a complete object, rejecting trailing bytes.
pub(crate) fn decode(bytes: &[u8]) -> Result<(Envelope, ConstraintMap)> {
    let mut reader = Reader::new(bytes);
    let result = read_envelope(&mut reader).and_then(|envelope| {
        let constraints = read_constraint_map(&mut reader)?;
        reader.finish()?;
        Ok((envelope, constraints))
    });
    if let Err(err) = &result {
        tracing::debug!(len = bytes.len(), error = %err, "rejected access-control blob");
    }
    result
}

impl Constraint {
    /// Encodes this constraint on its own, without an envelope.
    ///
    /// This is the same encoding used for each entry of a full object.
    /// Fields longer than `u32::MAX` bytes get a saturated length prefix,
    /// which [`Constraint::from_bytes`] rejects.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        write_constraint(&mut out, self);
        out
    }

    /// Decodes a constraint produced by [`Constraint::to_bytes`].
    ///
    /// Fails with [`Error::MalformedData`] on truncated input, trailing
    /// bytes, unknown tags, or inconsistent k-of-n counts.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let constraint = read_constraint(&mut reader, 1)?;
        reader.finish()?;
        Ok(constraint)
    }
}

fn write_len(out: &mut Vec<u8>, len: usize) {
    // Lengths past u32::MAX saturate; the decoder then rejects the blob.
    let len = u32::try_from(len).unwrap_or(u32::MAX);
    out.extend_from_slice(&len.to_be_bytes());
}

fn write_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    write_len(out, bytes.len());
    out.extend_from_slice(bytes);
}

fn write_constraint(out: &mut Vec<u8>, constraint: &Constraint) {
    match constraint {
        Constraint::AlwaysAllowed => out.push(TAG_ALWAYS_ALLOWED),
        Constraint::Policy { policy } => {
            out.push(TAG_POLICY);
            write_bytes(out, policy.as_str().as_bytes());
        }
        Constraint::Passcode => out.push(TAG_PASSCODE),
        Constraint::BiometricAny { group } => {
            out.push(TAG_BIOMETRIC_ANY);
            write_bytes(out, group);
        }
        Constraint::BiometricCurrentSet { group, state_hash } => {
            out.push(TAG_BIOMETRIC_CURRENT_SET);
            write_bytes(out, group);
            write_bytes(out, state_hash);
        }
        Constraint::KofN(kofn) => {
            out.push(TAG_K_OF_N);
            out.extend_from_slice(&kofn.required().to_be_bytes());
            write_len(out, kofn.len());
            for sub in kofn.constraints() {
                write_constraint(out, sub);
            }
        }
    }
}

fn read_envelope(reader: &mut Reader<'_>) -> Result<Envelope> {
    let magic = reader.take(MAGIC.len(), "magic")?;
    if magic != MAGIC {
        return Err(Error::malformed(0, "missing access-control magic"));
    }
    let version_at = reader.pos;
    let version = reader.u8("version")?;
    if version != FORMAT_VERSION {
        return Err(Error::malformed(
            version_at,
            format!("unsupported format version {version}"),
        ));
    }
    let protection_at = reader.pos;
    let protection = match reader.u8("protection")? {
        0 => None,
        code => Some(Protection::from_wire_code(code).ok_or_else(|| {
            Error::malformed(protection_at, format!("unknown protection code {code}"))
        })?),
    };
    let require_password = reader.bool("require_password")?;
    let bound = reader.bool("bound")?;
    Ok(Envelope {
        protection,
        require_password,
        bound,
    })
}

fn read_constraint_map(reader: &mut Reader<'_>) -> Result<ConstraintMap> {
    let count_at = reader.pos;
    let count = reader.len("constraint count")?;
    if count
        .checked_mul(MIN_ENTRY_LEN)
        .is_none_or(|needed| needed > reader.remaining())
    {
        return Err(Error::malformed(
            count_at,
            format!(
                "{count} constraints cannot fit in {} remaining bytes",
                reader.remaining()
            ),
        ));
    }

    let mut constraints = BTreeMap::new();
    for _ in 0..count {
        let op_at = reader.pos;
        let operation = OperationId::new(reader.string("operation id")?);
        operation.validate().map_err(|err| match err {
            Error::InvalidArgument { message, .. } => Error::malformed(op_at, message),
            other => other,
        })?;
        if let Some((last, _)) = constraints.last_key_value()
            && &operation <= last
        {
            return Err(Error::malformed(
                op_at,
                format!("operation '{operation}' is duplicated or out of order"),
            ));
        }
        let constraint = read_constraint(reader, 1)?;
        constraints.insert(operation, constraint);
    }
    Ok(constraints)
}

fn read_constraint(reader: &mut Reader<'_>, depth: usize) -> Result<Constraint> {
    let tag_at = reader.pos;
    if depth > MAX_CONSTRAINT_DEPTH {
        return Err(Error::malformed(
            tag_at,
            format!("constraint nesting exceeds {MAX_CONSTRAINT_DEPTH} levels"),
        ));
    }
    match reader.u8("constraint tag")? {
        TAG_ALWAYS_ALLOWED => Ok(Constraint::AlwaysAllowed),
        TAG_POLICY => {
            let policy = reader.string("policy id")?;
            if policy.is_empty() {
                return Err(Error::malformed(tag_at, "empty policy id"));
            }
            Ok(Constraint::Policy {
                policy: PolicyId::new(policy),
            })
        }
        TAG_PASSCODE => Ok(Constraint::Passcode),
        TAG_BIOMETRIC_ANY => {
            let group = reader.non_empty_bytes("biometric group")?;
            Ok(Constraint::BiometricAny { group })
        }
        TAG_BIOMETRIC_CURRENT_SET => {
            let group = reader.non_empty_bytes("biometric group")?;
            let state_hash = reader.non_empty_bytes("enrollment state hash")?;
            Ok(Constraint::BiometricCurrentSet { group, state_hash })
        }
        TAG_K_OF_N => {
            let required = reader.u32("required count")?;
            let count_at = reader.pos;
            let count = reader.len("sub-constraint count")?;
            if count > reader.remaining() {
                return Err(Error::malformed(
                    count_at,
                    format!(
                        "{count} sub-constraints cannot fit in {} remaining bytes",
                        reader.remaining()
                    ),
                ));
            }
            if required == 0 || required as usize > count {
                return Err(Error::malformed(
                    tag_at,
                    format!("k-of-n requires {required} of {count} sub-constraints"),
                ));
            }
            let mut subs = Vec::new();
            subs.try_reserve_exact(count)?;
            for _ in 0..count {
                subs.push(read_constraint(reader, depth + 1)?);
            }
            Ok(Constraint::KofN(KofN::from_decoded(required, subs)))
        }
        other => Err(Error::malformed(
            tag_at,
            format!("unknown constraint tag {other}"),
        )),
    }
}

/// Bounds-checked cursor over an input buffer.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(Error::malformed(
                self.pos,
                format!(
                    "truncated {what}: need {n} bytes, {} remain",
                    self.remaining()
                ),
            ));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    fn bool(&mut self, what: &str) -> Result<bool> {
        let at = self.pos;
        match self.u8(what)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::malformed(
                at,
                format!("{what} flag must be 0 or 1, found {other}"),
            )),
        }
    }

    fn u32(&mut self, what: &str) -> Result<u32> {
        let raw = self.take(4, what)?;
        Ok(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn len(&mut self, what: &str) -> Result<usize> {
        let at = self.pos;
        let len = self.u32(what)?;
        usize::try_from(len)
            .map_err(|_| Error::malformed(at, format!("{what} {len} does not fit in memory")))
    }

    fn bytes(&mut self, what: &str) -> Result<&'a [u8]> {
        let len = self.len(what)?;
        self.take(len, what)
    }

    fn non_empty_bytes(&mut self, what: &str) -> Result<Vec<u8>> {
        let at = self.pos;
        let raw = self.bytes(what)?;
        if raw.is_empty() {
            return Err(Error::malformed(at, format!("empty {what}")));
        }
        let mut owned = Vec::new();
        owned.try_reserve_exact(raw.len())?;
        owned.extend_from_slice(raw);
        Ok(owned)
    }

    fn string(&mut self, what: &str) -> Result<String> {
        let at = self.pos;
        let raw = self.bytes(what)?;
        let s = std::str::from_utf8(raw)
            .map_err(|e| Error::malformed(at, format!("{what} is not UTF-8: {e}")))?;
        let mut owned = String::new();
        owned.try_reserve_exact(s.len())?;
        owned.push_str(s);
        Ok(owned)
    }

    fn finish(&self) -> Result<()> {
        if self.remaining() != 0 {
            return Err(Error::malformed(
                self.pos,
                format!("{} trailing bytes", self.remaining()),
            ));
        }
        Ok(())
    }
}
