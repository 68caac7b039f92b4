//! Circuit input encoding
//!
//! Translates raw request fields into the exact public/private input layout a
//! circuit expects. The encoding is byte-exact and deterministic: verifier
//! contracts compare public inputs by equality, so the same request must
//! always produce the same vector.
//!
//! Layout for [`StatementPurpose::ProofOfProvenance`]:
//!
//! | slot | value |
//! |------|-------|
//! | public 0 | public key x coordinate (bytes 0..32, big-endian) |
//! | public 1 | public key y coordinate (bytes 32..64, big-endian) |
//! | public 2.. | one element per hash byte (0..=255) |
//! | private 0.. | one element per signature byte |

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{ProvenanceError, Result};

/// Raw request arguments, as received at the boundary
pub type RawArgs = serde_json::Map<String, serde_json::Value>;

/// A 256-bit field element stored big-endian
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FieldElement([u8; 32]);

impl FieldElement {
    pub const ZERO: FieldElement = FieldElement([0u8; 32]);

    pub const fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Left-pad up to 32 big-endian bytes into a field element
    pub fn from_be_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > 32 {
            return Err(ProvenanceError::malformed(format!(
                "field element is {} bytes, max 32",
                bytes.len()
            )));
        }
        let mut out = [0u8; 32];
        out[32 - bytes.len()..].copy_from_slice(bytes);
        Ok(Self(out))
    }

    pub fn from_u64(value: u64) -> Self {
        let mut out = [0u8; 32];
        out[24..].copy_from_slice(&value.to_be_bytes());
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The element's value as a byte, if it is below 256
    pub fn to_u8(&self) -> Option<u8> {
        if self.0[..31].iter().all(|b| *b == 0) {
            Some(self.0[31])
        } else {
            None
        }
    }

    /// `0x`-prefixed, zero-padded 64-digit hex
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse hex (optionally `0x`-prefixed, at most 64 digits)
    pub fn parse_hex(value: &str) -> Result<Self> {
        let digits = strip_hex_prefix(value);
        if digits.len() > 64 {
            return Err(ProvenanceError::malformed(format!(
                "field element has {} hex digits, max 64",
                digits.len()
            )));
        }
        let padded = format!("{:0>64}", digits);
        let bytes = hex::decode(padded)?;
        Self::from_be_slice(&bytes)
    }
}

impl From<u8> for FieldElement {
    fn from(value: u8) -> Self {
        Self::from_u64(value as u64)
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_u8() {
            Some(b) => write!(f, "FieldElement({})", b),
            None => write!(f, "FieldElement({})", self.to_hex()),
        }
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct FieldVisitor;

        impl Visitor<'_> for FieldVisitor {
            type Value = FieldElement;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a hex string or an unsigned integer")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<FieldElement, E> {
                Ok(FieldElement::from_u64(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<FieldElement, E> {
                FieldElement::parse_hex(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(FieldVisitor)
    }
}

/// Statement a verifier contract checks. Closed set: every purpose has a
/// statically defined encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementPurpose {
    /// "This signature over this hash was produced by this public key"
    #[default]
    ProofOfProvenance,
}

impl StatementPurpose {
    pub const ALL: [StatementPurpose; 1] = [StatementPurpose::ProofOfProvenance];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatementPurpose::ProofOfProvenance => "proof_of_provenance",
        }
    }

    /// Encode raw request arguments into the circuit input layout
    pub fn encode(&self, args: &RawArgs) -> Result<CircuitInputVector> {
        match self {
            StatementPurpose::ProofOfProvenance => encode_proof_of_provenance(args),
        }
    }
}

impl fmt::Display for StatementPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatementPurpose {
    type Err = ProvenanceError;

    fn from_str(s: &str) -> Result<Self> {
        StatementPurpose::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ProvenanceError::malformed(format!("unknown statement purpose '{}'", s)))
    }
}

/// Public and private circuit inputs, in circuit order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitInputVector {
    pub public_inputs: Vec<FieldElement>,
    pub private_inputs: Vec<FieldElement>,
}

/// Typed view of a proof-of-provenance input vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceWitness {
    pub public_key: [u8; 64],
    pub hash: Vec<u8>,
    pub signature: Vec<u8>,
}

impl ProvenanceWitness {
    /// Rebuild the witness from an encoded vector
    pub fn from_inputs(inputs: &CircuitInputVector) -> Result<Self> {
        if inputs.public_inputs.len() < 2 {
            return Err(ProvenanceError::malformed(
                "proof-of-provenance inputs need both public key coordinates",
            ));
        }

        let mut public_key = [0u8; 64];
        public_key[..32].copy_from_slice(inputs.public_inputs[0].as_bytes());
        public_key[32..].copy_from_slice(inputs.public_inputs[1].as_bytes());

        let hash = bytes_of(&inputs.public_inputs[2..], "hash")?;
        let signature = bytes_of(&inputs.private_inputs, "signature")?;

        Ok(Self {
            public_key,
            hash,
            signature,
        })
    }
}

fn bytes_of(elements: &[FieldElement], what: &str) -> Result<Vec<u8>> {
    elements
        .iter()
        .map(|e| {
            e.to_u8()
                .ok_or_else(|| ProvenanceError::malformed(format!("{} element {} exceeds a byte", what, e)))
        })
        .collect()
}

fn encode_proof_of_provenance(args: &RawArgs) -> Result<CircuitInputVector> {
    let public_key = decode_hex_field("public_key", required_str(args, "public_key")?)?;
    if public_key.len() != 64 {
        return Err(ProvenanceError::malformed(format!(
            "public_key must be 64 bytes, got {}",
            public_key.len()
        )));
    }
    let hash = decode_hex_field("hash", required_str(args, "hash")?)?;
    let signature = decode_hex_field("signature", required_str(args, "signature")?)?;

    let mut public_inputs = Vec::with_capacity(2 + hash.len());
    public_inputs.push(FieldElement::from_be_slice(&public_key[..32])?);
    public_inputs.push(FieldElement::from_be_slice(&public_key[32..])?);
    public_inputs.extend(hash.into_iter().map(FieldElement::from));

    Ok(CircuitInputVector {
        public_inputs,
        private_inputs: signature.into_iter().map(FieldElement::from).collect(),
    })
}

fn required_str<'a>(args: &'a RawArgs, field: &str) -> Result<&'a str> {
    match args.get(field) {
        Some(serde_json::Value::String(s)) => Ok(s),
        Some(_) => Err(ProvenanceError::malformed(format!("field '{}' must be a string", field))),
        None => Err(ProvenanceError::malformed(format!("missing required field '{}'", field))),
    }
}

/// Strip a leading `0x`/`0X` marker
pub fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

/// Decode a hex field, naming the field in errors
pub fn decode_hex_field(field: &str, value: &str) -> Result<Vec<u8>> {
    let digits = strip_hex_prefix(value);
    if digits.len() % 2 != 0 {
        return Err(ProvenanceError::malformed(format!(
            "field '{}' has odd hex length {}",
            field,
            digits.len()
        )));
    }
    hex::decode(digits)
        .map_err(|e| ProvenanceError::malformed(format!("field '{}' is not valid hex: {}", field, e)))
}
