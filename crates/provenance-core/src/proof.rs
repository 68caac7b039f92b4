//! Proof model shared by the generator, verifier and verifier contracts

use serde::{Deserialize, Serialize};

use crate::encoding::FieldElement;

/// A proof together with the public signals it is bound to.
///
/// `public_signals` follows the order of
/// [`CircuitInputVector::public_inputs`](crate::encoding::CircuitInputVector).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// Opaque proof bytes, hex encoded on the wire
    #[serde(with = "hex_bytes")]
    pub proof: Vec<u8>,

    /// Public signals the proof commits to
    pub public_signals: Vec<FieldElement>,
}

impl Proof {
    pub fn new(proof: Vec<u8>, public_signals: Vec<FieldElement>) -> Self {
        Self {
            proof,
            public_signals,
        }
    }

    /// Element-wise comparison against independently derived public inputs
    pub fn signals_match(&self, expected: &[FieldElement]) -> bool {
        self.public_signals.len() == expected.len()
            && self
                .public_signals
                .iter()
                .zip(expected)
                .all(|(signal, input)| signal == input)
    }
}

/// `0x`-prefixed hex (de)serialization for byte vectors
pub mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::encoding::decode_hex_field;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let value = String::deserialize(deserializer)?;
        decode_hex_field("proof", &value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signals_match_requires_same_length() {
        let proof = Proof::new(vec![1, 2], vec![FieldElement::from(1u8), FieldElement::from(2u8)]);
        assert!(proof.signals_match(&[FieldElement::from(1u8), FieldElement::from(2u8)]));
        assert!(!proof.signals_match(&[FieldElement::from(1u8)]));
        assert!(!proof.signals_match(&[FieldElement::from(1u8), FieldElement::from(3u8)]));
    }

    #[test]
    fn test_proof_json_shape() {
        let proof = Proof::new(vec![0xde, 0xad], vec![FieldElement::from(52u8)]);
        let value = serde_json::to_value(&proof).unwrap();
        assert_eq!(value["proof"], "0xdead");
        assert_eq!(value["public_signals"][0], format!("0x{}34", "0".repeat(62)));

        let back: Proof = serde_json::from_value(value).unwrap();
        assert_eq!(back, proof);
    }
}
