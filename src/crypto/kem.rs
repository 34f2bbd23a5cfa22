/// Post-quantum key encapsulation: ML-KEM-768 and ML-KEM-1024 (NIST FIPS 203)
///
/// Key sizes:
///
/// | Parameter set | Encapsulation key | Decapsulation key | Ciphertext | Shared secret |
/// |---------------|-------------------|-------------------|------------|---------------|
/// | ML-KEM-768    | 1184              | 2400              | 1088       | 32            |
/// | ML-KEM-1024   | 1568              | 3168              | 1568       | 32            |
///
/// The KEM suite uses the 32-byte shared secret directly as the AEAD key for
/// the payload:
/// ```text
/// [kem_ct: K][nonce: N][ciphertext][tag: 16]
/// ```
use ml_kem::kem::{Decapsulate, Encapsulate};
use ml_kem::{Encoded, EncodedSizeUser, KemCore, MlKem1024, MlKem768};
use rand::{CryptoRng, RngCore};
use serde::Serialize;
use thiserror::Error;
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::aead::AeadScheme;
use crate::error::{EngineError, Result};
use crate::protocol::wire::{KemFrame, SealedFrame, WireLayout};
use crate::suite::{Decryption, SoftFailure, SuiteExecutor};

/// ML-KEM-768 encapsulation key (public) size in bytes
pub const MLKEM768_EK_BYTES: usize = 1184;
/// ML-KEM-768 decapsulation key (secret) size in bytes
pub const MLKEM768_DK_BYTES: usize = 2400;
/// ML-KEM-768 ciphertext size in bytes
pub const MLKEM768_CT_BYTES: usize = 1088;

/// ML-KEM-1024 encapsulation key (public) size in bytes
pub const MLKEM1024_EK_BYTES: usize = 1568;
/// ML-KEM-1024 decapsulation key (secret) size in bytes
pub const MLKEM1024_DK_BYTES: usize = 3168;
/// ML-KEM-1024 ciphertext size in bytes
pub const MLKEM1024_CT_BYTES: usize = 1568;

/// Shared secret size for every ML-KEM parameter set
pub const SHARED_SECRET_BYTES: usize = 32;

/// Encapsulated secret, wiped on drop.
pub type SharedSecret = Zeroizing<[u8; SHARED_SECRET_BYTES]>;

#[derive(Error, Debug)]
pub enum KemError {
    #[error("ML-KEM encapsulation failed")]
    EncapsulateFailed,
    #[error("ML-KEM decapsulation failed")]
    DecapsulateFailed,
    #[error("Invalid {what} length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// ML-KEM parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KemParams {
    MlKem768,
    MlKem1024,
}

/// Key pair for one ML-KEM parameter set. The decapsulation key is wiped on drop.
#[derive(Clone)]
pub struct KemKeyPair {
    params: KemParams,
    public: Vec<u8>,
    secret: Vec<u8>,
}

impl Drop for KemKeyPair {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

impl std::fmt::Debug for KemKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KemKeyPair")
            .field("params", &self.params)
            .field("public", &hex::encode(&self.public[..8]))
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl KemKeyPair {
    /// Rebuild a key pair from raw encoded keys.
    pub fn from_bytes(params: KemParams, public: &[u8], secret: &[u8]) -> Result<Self> {
        check_len("encapsulation key", params.public_key_size(), public.len())?;
        check_len("decapsulation key", params.secret_key_size(), secret.len())?;
        Ok(Self {
            params,
            public: public.to_vec(),
            secret: secret.to_vec(),
        })
    }

    pub fn params(&self) -> KemParams {
        self.params
    }

    /// Encapsulation (public) key bytes
    pub fn public_key(&self) -> &[u8] {
        &self.public
    }

    /// Decapsulation (secret) key bytes
    pub fn secret_key(&self) -> &[u8] {
        &self.secret
    }
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> std::result::Result<(), KemError> {
    if expected != actual {
        return Err(KemError::InvalidLength {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Per-parameter-set ML-KEM calls. The `ml-kem` key types differ per set, so
/// each arm is expanded for the concrete type.
macro_rules! ml_kem_ops {
    ($kem:ty, generate, $rng:expr) => {{
        let (dk, ek) = <$kem as KemCore>::generate($rng);
        (ek.as_bytes().to_vec(), dk.as_bytes().to_vec())
    }};
    ($kem:ty, encapsulate, $ek_bytes:expr, $rng:expr) => {{
        let ek_encoded = Encoded::<<$kem as KemCore>::EncapsulationKey>::try_from($ek_bytes)
            .map_err(|_| KemError::EncapsulateFailed)?;
        let ek = <$kem as KemCore>::EncapsulationKey::from_bytes(&ek_encoded);
        let (ct, ss) = ek
            .encapsulate($rng)
            .map_err(|_| KemError::EncapsulateFailed)?;
        let mut secret = Zeroizing::new([0u8; SHARED_SECRET_BYTES]);
        secret.copy_from_slice(ss.as_slice());
        (ct.as_slice().to_vec(), secret)
    }};
    ($kem:ty, decapsulate, $dk_bytes:expr, $ct_bytes:expr) => {{
        let dk_encoded = Encoded::<<$kem as KemCore>::DecapsulationKey>::try_from($dk_bytes)
            .map_err(|_| KemError::DecapsulateFailed)?;
        let dk = <$kem as KemCore>::DecapsulationKey::from_bytes(&dk_encoded);
        let ct = ml_kem::Ciphertext::<$kem>::try_from($ct_bytes)
            .map_err(|_| KemError::DecapsulateFailed)?;
        let ss = dk
            .decapsulate(&ct)
            .map_err(|_| KemError::DecapsulateFailed)?;
        let mut secret = Zeroizing::new([0u8; SHARED_SECRET_BYTES]);
        secret.copy_from_slice(ss.as_slice());
        secret
    }};
}

impl KemParams {
    pub const fn public_key_size(self) -> usize {
        match self {
            KemParams::MlKem768 => MLKEM768_EK_BYTES,
            KemParams::MlKem1024 => MLKEM1024_EK_BYTES,
        }
    }

    pub const fn secret_key_size(self) -> usize {
        match self {
            KemParams::MlKem768 => MLKEM768_DK_BYTES,
            KemParams::MlKem1024 => MLKEM1024_DK_BYTES,
        }
    }

    pub const fn ciphertext_size(self) -> usize {
        match self {
            KemParams::MlKem768 => MLKEM768_CT_BYTES,
            KemParams::MlKem1024 => MLKEM1024_CT_BYTES,
        }
    }

    pub const fn shared_secret_size(self) -> usize {
        SHARED_SECRET_BYTES
    }

    pub fn label(self) -> &'static str {
        match self {
            KemParams::MlKem768 => "ML-KEM-768",
            KemParams::MlKem1024 => "ML-KEM-1024",
        }
    }

    pub fn generate_keypair<R: RngCore + CryptoRng>(self, rng: &mut R) -> KemKeyPair {
        let (public, secret) = match self {
            KemParams::MlKem768 => ml_kem_ops!(MlKem768, generate, rng),
            KemParams::MlKem1024 => ml_kem_ops!(MlKem1024, generate, rng),
        };
        KemKeyPair {
            params: self,
            public,
            secret,
        }
    }

    /// Encapsulate against `public`, returning `(kem_ciphertext, shared_secret)`.
    pub fn encapsulate<R: RngCore + CryptoRng>(
        self,
        public: &[u8],
        rng: &mut R,
    ) -> std::result::Result<(Vec<u8>, SharedSecret), KemError> {
        check_len("encapsulation key", self.public_key_size(), public.len())?;
        let encapsulated = match self {
            KemParams::MlKem768 => ml_kem_ops!(MlKem768, encapsulate, public, rng),
            KemParams::MlKem1024 => ml_kem_ops!(MlKem1024, encapsulate, public, rng),
        };
        Ok(encapsulated)
    }

    /// Recover the shared secret from `kem_ciphertext`.
    ///
    /// ML-KEM rejects implicitly: a tampered ciphertext of the right length
    /// yields an unrelated secret rather than an error.
    pub fn decapsulate(
        self,
        secret: &[u8],
        kem_ciphertext: &[u8],
    ) -> std::result::Result<SharedSecret, KemError> {
        check_len("decapsulation key", self.secret_key_size(), secret.len())?;
        let shared = match self {
            KemParams::MlKem768 => ml_kem_ops!(MlKem768, decapsulate, secret, kem_ciphertext),
            KemParams::MlKem1024 => ml_kem_ops!(MlKem1024, decapsulate, secret, kem_ciphertext),
        };
        Ok(shared)
    }
}

/// Decapsulate, mapping a rejected ciphertext to a soft failure.
pub(crate) fn decapsulate_soft(
    params: KemParams,
    keys: &KemKeyPair,
    kem_ciphertext: &[u8],
) -> Result<std::result::Result<SharedSecret, SoftFailure>> {
    match params.decapsulate(keys.secret_key(), kem_ciphertext) {
        Ok(shared) => Ok(Ok(shared)),
        Err(KemError::DecapsulateFailed) => Ok(Err(SoftFailure::DecapsulationFailed)),
        Err(e) => Err(e.into()),
    }
}

/// KEM-only suite: ML-KEM shared secret keys the payload AEAD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KemSuite {
    pub params: KemParams,
    pub aead: AeadScheme,
}

impl KemSuite {
    pub const fn new(params: KemParams, aead: AeadScheme) -> Self {
        Self { params, aead }
    }
}

impl SuiteExecutor for KemSuite {
    type Keys = KemKeyPair;

    fn layout(&self) -> WireLayout {
        WireLayout::kem(
            self.params.ciphertext_size(),
            self.aead.nonce_size(),
            self.aead.key_size(),
            self.aead.tag_size(),
        )
    }

    fn generate_keys<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<KemKeyPair> {
        Ok(self.params.generate_keypair(rng))
    }

    fn encrypt<R: RngCore + CryptoRng>(
        &self,
        keys: &KemKeyPair,
        plaintext: &[u8],
        rng: &mut R,
    ) -> Result<Vec<u8>> {
        if keys.params() != self.params {
            return Err(EngineError::KeyMismatch);
        }
        let (kem_ciphertext, shared) = self.params.encapsulate(keys.public_key(), rng)?;
        let (nonce, body) = self.aead.seal_detached(shared.as_ref(), plaintext, rng)?;

        Ok(KemFrame {
            kem_ciphertext: &kem_ciphertext,
            payload: SealedFrame {
                nonce: &nonce,
                body: &body,
            },
        }
        .encode())
    }

    fn decrypt(&self, keys: &KemKeyPair, ciphertext: &[u8]) -> Result<Decryption> {
        if keys.params() != self.params {
            return Err(EngineError::KeyMismatch);
        }
        let frame = KemFrame::parse(ciphertext, &self.layout())?;

        let shared = match decapsulate_soft(self.params, keys, frame.kem_ciphertext)? {
            Ok(shared) => shared,
            Err(failure) => return Ok(Decryption::Failed(failure)),
        };

        Ok(match self.aead.open_frame(shared.as_ref(), &frame.payload)? {
            Some(plaintext) => Decryption::Plaintext(plaintext),
            None => Decryption::Failed(SoftFailure::AuthenticationFailed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_mlkem768_key_sizes() {
        let kp = KemParams::MlKem768.generate_keypair(&mut OsRng);
        assert_eq!(kp.public_key().len(), MLKEM768_EK_BYTES);
        assert_eq!(kp.secret_key().len(), MLKEM768_DK_BYTES);
    }

    #[test]
    fn test_encapsulate_decapsulate() {
        for params in [KemParams::MlKem768, KemParams::MlKem1024] {
            let kp = params.generate_keypair(&mut OsRng);
            let (ct, ss) = params.encapsulate(kp.public_key(), &mut OsRng).unwrap();
            assert_eq!(ct.len(), params.ciphertext_size());

            let recovered = params.decapsulate(kp.secret_key(), &ct).unwrap();
            assert_eq!(*ss, *recovered);
        }
    }

    #[test]
    fn test_keypair_from_seeded_rng_is_deterministic() {
        let kp1 = KemParams::MlKem1024.generate_keypair(&mut ChaCha20Rng::from_seed([42u8; 32]));
        let kp2 = KemParams::MlKem1024.generate_keypair(&mut ChaCha20Rng::from_seed([42u8; 32]));
        assert_eq!(kp1.public_key(), kp2.public_key());
        assert_eq!(kp1.secret_key(), kp2.secret_key());
    }

    #[test]
    fn test_tampered_ciphertext_yields_different_secret() {
        let params = KemParams::MlKem768;
        let kp = params.generate_keypair(&mut OsRng);
        let (mut ct, ss) = params.encapsulate(kp.public_key(), &mut OsRng).unwrap();
        ct[0] ^= 0x01;

        let recovered = params.decapsulate(kp.secret_key(), &ct).unwrap();
        assert_ne!(*ss, *recovered);
    }

    #[test]
    fn test_invalid_key_lengths() {
        let result = KemParams::MlKem768.encapsulate(&[0u8; 16], &mut OsRng);
        assert!(matches!(result, Err(KemError::InvalidLength { .. })));

        let result = KemKeyPair::from_bytes(KemParams::MlKem1024, &[0u8; 1568], &[0u8; 10]);
        assert!(result.is_err());
    }

    #[test]
    fn test_kem_suite_roundtrip() {
        let suite = KemSuite::new(KemParams::MlKem768, AeadScheme::Aes256Gcm);
        let keys = suite.generate_keys(&mut OsRng).unwrap();
        let sealed = suite.encrypt(&keys, b"tunnel payload", &mut OsRng).unwrap();
        assert_eq!(sealed.len(), suite.layout().serialized_len(14));

        match suite.decrypt(&keys, &sealed).unwrap() {
            Decryption::Plaintext(p) => assert_eq!(p.as_slice(), b"tunnel payload"),
            Decryption::Failed(f) => panic!("unexpected failure: {:?}", f),
        }
    }

    #[test]
    fn test_kem_suite_rejects_foreign_keys() {
        let suite = KemSuite::new(KemParams::MlKem768, AeadScheme::Aes256Gcm);
        let keys = KemParams::MlKem1024.generate_keypair(&mut OsRng);
        let result = suite.encrypt(&keys, b"x", &mut OsRng);
        assert!(matches!(result, Err(EngineError::KeyMismatch)));
    }
}
