//! Signing accounts and published public keys

mod registry;

pub use registry::{GeneratedKeyPair, KeyRegistry, SignedHash};
