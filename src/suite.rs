//! Cipher-suite executors and the tagged variant that dispatches between them.
//!
//! Each family implements [`SuiteExecutor`]. [`CipherSuite`] is the closed set
//! of families the registry can hold; adding an algorithm means registering a
//! new `CipherSuite` value, not editing a dispatcher.

use rand::{CryptoRng, RngCore};
use serde::Serialize;
use zeroize::Zeroizing;

use crate::crypto::aead::{AeadScheme, SymmetricKey};
use crate::crypto::hybrid::{HybridKeys, HybridSuite};
use crate::crypto::kem::{KemKeyPair, KemSuite};
use crate::error::{EngineError, Result};
use crate::perf::{Phase, PerformanceRecorder};
use crate::protocol::wire::WireLayout;
use crate::result::OperationResult;

/// Non-fatal decryption outcome, reported inside results instead of as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SoftFailure {
    /// Payload tag did not verify
    AuthenticationFailed,
    /// Wrapped symmetric key tag did not verify
    KeyUnwrapFailed,
    /// KEM refused the encapsulation
    DecapsulationFailed,
    /// Decryption succeeded but did not reproduce the input
    PlaintextMismatch,
}

impl std::fmt::Display for SoftFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SoftFailure::AuthenticationFailed => "authentication failed",
            SoftFailure::KeyUnwrapFailed => "key unwrap failed",
            SoftFailure::DecapsulationFailed => "decapsulation failed",
            SoftFailure::PlaintextMismatch => "plaintext mismatch",
        };
        f.write_str(text)
    }
}

/// Result of a decrypt call that did not fail structurally.
#[derive(Debug)]
pub enum Decryption {
    Plaintext(Zeroizing<Vec<u8>>),
    Failed(SoftFailure),
}

impl Decryption {
    pub fn is_success(&self) -> bool {
        matches!(self, Decryption::Plaintext(_))
    }

    pub fn plaintext(&self) -> Option<&[u8]> {
        match self {
            Decryption::Plaintext(p) => Some(p.as_slice()),
            Decryption::Failed(_) => None,
        }
    }
}

/// Key generation, encryption and decryption for one suite family.
///
/// Randomness is always supplied by the caller.
pub trait SuiteExecutor {
    type Keys;

    /// Fixed field sizes of this suite's ciphertexts.
    fn layout(&self) -> WireLayout;

    fn generate_keys<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<Self::Keys>;

    fn encrypt<R: RngCore + CryptoRng>(
        &self,
        keys: &Self::Keys,
        plaintext: &[u8],
        rng: &mut R,
    ) -> Result<Vec<u8>>;

    /// `Err` only for structural problems; authentication problems come back
    /// as [`Decryption::Failed`].
    fn decrypt(&self, keys: &Self::Keys, ciphertext: &[u8]) -> Result<Decryption>;
}

/// Generate keys, encrypt and decrypt `data` with `suite`, timing each phase.
pub fn run_self_test<S, R>(
    suite: &S,
    algorithm: &str,
    data: &[u8],
    rng: &mut R,
) -> Result<OperationResult>
where
    S: SuiteExecutor,
    R: RngCore + CryptoRng,
{
    let mut recorder = PerformanceRecorder::new();

    let keys = recorder.time(Phase::KeyGeneration, || suite.generate_keys(rng))?;
    let ciphertext = recorder.time(Phase::Encryption, || suite.encrypt(&keys, data, rng))?;
    let decryption = recorder.time(Phase::Decryption, || suite.decrypt(&keys, &ciphertext))?;

    let failure = match &decryption {
        Decryption::Plaintext(plaintext) => {
            use subtle::ConstantTimeEq;
            let matches = plaintext.len() == data.len()
                && bool::from(plaintext.as_slice().ct_eq(data));
            (!matches).then_some(SoftFailure::PlaintextMismatch)
        }
        Decryption::Failed(failure) => Some(*failure),
    };

    Ok(OperationResult::new(
        algorithm,
        ciphertext,
        failure,
        recorder.finish(),
    ))
}

/// Key material for any suite family.
pub enum KeyMaterial {
    Symmetric(SymmetricKey),
    Kem(KemKeyPair),
    Hybrid(HybridKeys),
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyMaterial::Symmetric(_) => f.write_str("Symmetric(<redacted>)"),
            KeyMaterial::Kem(kp) => f.debug_tuple("Kem").field(kp).finish(),
            KeyMaterial::Hybrid(keys) => f.debug_tuple("Hybrid").field(keys).finish(),
        }
    }
}

/// One registered suite, tagged by family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherSuite {
    Aead(AeadScheme),
    Kem(KemSuite),
    Hybrid(HybridSuite),
}

impl CipherSuite {
    pub fn is_post_quantum(&self) -> bool {
        !matches!(self, CipherSuite::Aead(_))
    }

    pub fn layout(&self) -> WireLayout {
        match self {
            CipherSuite::Aead(scheme) => scheme.layout(),
            CipherSuite::Kem(suite) => suite.layout(),
            CipherSuite::Hybrid(suite) => suite.layout(),
        }
    }

    pub fn generate_keys<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<KeyMaterial> {
        Ok(match self {
            CipherSuite::Aead(scheme) => KeyMaterial::Symmetric(scheme.generate_keys(rng)?),
            CipherSuite::Kem(suite) => KeyMaterial::Kem(suite.generate_keys(rng)?),
            CipherSuite::Hybrid(suite) => KeyMaterial::Hybrid(suite.generate_keys(rng)?),
        })
    }

    pub fn encrypt<R: RngCore + CryptoRng>(
        &self,
        keys: &KeyMaterial,
        plaintext: &[u8],
        rng: &mut R,
    ) -> Result<Vec<u8>> {
        match (self, keys) {
            (CipherSuite::Aead(scheme), KeyMaterial::Symmetric(k)) => {
                scheme.encrypt(k, plaintext, rng)
            }
            (CipherSuite::Kem(suite), KeyMaterial::Kem(k)) => suite.encrypt(k, plaintext, rng),
            (CipherSuite::Hybrid(suite), KeyMaterial::Hybrid(k)) => {
                suite.encrypt(k, plaintext, rng)
            }
            _ => Err(EngineError::KeyMismatch),
        }
    }

    pub fn decrypt(&self, keys: &KeyMaterial, ciphertext: &[u8]) -> Result<Decryption> {
        match (self, keys) {
            (CipherSuite::Aead(scheme), KeyMaterial::Symmetric(k)) => {
                scheme.decrypt(k, ciphertext)
            }
            (CipherSuite::Kem(suite), KeyMaterial::Kem(k)) => suite.decrypt(k, ciphertext),
            (CipherSuite::Hybrid(suite), KeyMaterial::Hybrid(k)) => suite.decrypt(k, ciphertext),
            _ => Err(EngineError::KeyMismatch),
        }
    }

    pub fn self_test<R: RngCore + CryptoRng>(
        &self,
        algorithm: &str,
        data: &[u8],
        rng: &mut R,
    ) -> Result<OperationResult> {
        match self {
            CipherSuite::Aead(scheme) => run_self_test(scheme, algorithm, data, rng),
            CipherSuite::Kem(suite) => run_self_test(suite, algorithm, data, rng),
            CipherSuite::Hybrid(suite) => run_self_test(suite, algorithm, data, rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::kem::KemParams;
    use rand::rngs::OsRng;

    #[test]
    fn test_key_material_mismatch_is_fatal() {
        let aead = CipherSuite::Aead(AeadScheme::Aes256Gcm);
        let kem = CipherSuite::Kem(KemSuite::new(KemParams::MlKem768, AeadScheme::Aes256Gcm));

        let kem_keys = kem.generate_keys(&mut OsRng).unwrap();
        let result = aead.encrypt(&kem_keys, b"data", &mut OsRng);
        assert!(matches!(result, Err(EngineError::KeyMismatch)));
    }

    #[test]
    fn test_self_test_reports_success() {
        let suite = CipherSuite::Aead(AeadScheme::ChaCha20Poly1305);
        let result = suite.self_test("chacha20poly1305", b"payload", &mut OsRng).unwrap();
        assert!(result.decryption_succeeded);
        assert!(result.failure.is_none());
        assert_eq!(result.algorithm, "chacha20poly1305");
    }

    #[test]
    fn test_post_quantum_flag() {
        assert!(!CipherSuite::Aead(AeadScheme::Aes256Gcm).is_post_quantum());
        assert!(CipherSuite::Hybrid(HybridSuite::new(
            KemParams::MlKem768,
            AeadScheme::Aes256Gcm
        ))
        .is_post_quantum());
    }
}
