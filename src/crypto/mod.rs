pub mod aead;
pub mod kem;
pub mod hybrid;

pub use aead::{AeadError, AeadScheme, SymmetricKey};
pub use kem::{KemError, KemKeyPair, KemParams, KemSuite, SharedSecret};
pub use hybrid::{combine_payload_key, HybridKeys, HybridSuite};
