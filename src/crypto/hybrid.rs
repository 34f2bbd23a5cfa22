/// Hybrid ML-KEM + AEAD composition.
///
/// Encryption:
/// 1. Generate an ML-KEM key pair and an independent AEAD key.
/// 2. Encapsulate against the public key → `(kem_ct, shared_secret)`.
/// 3. `payload_key = (shared_secret ‖ symmetric_key)[..KEY_SIZE]`.
/// 4. Seal the plaintext under `payload_key`.
/// 5. Wrap `symmetric_key` under `shared_secret`.
///
/// ```text
/// [kem_ct: K][key_nonce: N][wrapped_key: 32 + 16][data_nonce: N][ciphertext][tag: 16]
/// ```
///
/// The payload key is a plain concatenate-and-truncate, not a KDF. With a
/// 32-byte shared secret it equals the shared secret. Changing it to a KDF
/// changes the ciphertext semantics of every existing hybrid blob, so it is
/// kept as is.
use rand::{CryptoRng, RngCore};
use zeroize::Zeroizing;

use crate::crypto::aead::{AeadScheme, SymmetricKey, KEY_SIZE};
use crate::crypto::kem::{decapsulate_soft, KemKeyPair, KemParams, SharedSecret};
use crate::error::{EngineError, Result};
use crate::protocol::wire::{HybridFrame, SealedFrame, WireLayout};
use crate::suite::{Decryption, SoftFailure, SuiteExecutor};

/// Key material for one hybrid operation.
pub struct HybridKeys {
    pub kem: KemKeyPair,
    pub symmetric: SymmetricKey,
}

impl std::fmt::Debug for HybridKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridKeys")
            .field("kem", &self.kem)
            .field("symmetric", &"<redacted>")
            .finish()
    }
}

/// ML-KEM encapsulation combined with an independent AEAD key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HybridSuite {
    pub params: KemParams,
    pub aead: AeadScheme,
}

/// Concatenate `shared_secret ‖ symmetric_key` and keep the first
/// `KEY_SIZE` bytes.
pub fn combine_payload_key(shared: &SharedSecret, symmetric: &[u8]) -> SymmetricKey {
    let mut combined = Zeroizing::new(Vec::with_capacity(shared.len() + symmetric.len()));
    combined.extend_from_slice(shared.as_ref());
    combined.extend_from_slice(symmetric);

    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    key.copy_from_slice(&combined[..KEY_SIZE]);
    key
}

impl HybridSuite {
    pub const fn new(params: KemParams, aead: AeadScheme) -> Self {
        Self { params, aead }
    }
}

impl SuiteExecutor for HybridSuite {
    type Keys = HybridKeys;

    fn layout(&self) -> WireLayout {
        WireLayout::hybrid(
            self.params.ciphertext_size(),
            self.aead.nonce_size(),
            self.aead.key_size(),
            self.aead.tag_size(),
        )
    }

    fn generate_keys<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<HybridKeys> {
        let kem = self.params.generate_keypair(rng);
        let symmetric = self.aead.generate_key(rng);
        Ok(HybridKeys { kem, symmetric })
    }

    fn encrypt<R: RngCore + CryptoRng>(
        &self,
        keys: &HybridKeys,
        plaintext: &[u8],
        rng: &mut R,
    ) -> Result<Vec<u8>> {
        if keys.kem.params() != self.params {
            return Err(EngineError::KeyMismatch);
        }
        let (kem_ciphertext, shared) = self.params.encapsulate(keys.kem.public_key(), rng)?;

        let payload_key = combine_payload_key(&shared, keys.symmetric.as_ref());
        let (data_nonce, data) = self.aead.seal_detached(payload_key.as_ref(), plaintext, rng)?;

        let (key_nonce, wrapped_key) =
            self.aead
                .seal_detached(shared.as_ref(), keys.symmetric.as_ref(), rng)?;

        Ok(HybridFrame {
            kem_ciphertext: &kem_ciphertext,
            wrapped_key: SealedFrame {
                nonce: &key_nonce,
                body: &wrapped_key,
            },
            data: SealedFrame {
                nonce: &data_nonce,
                body: &data,
            },
        }
        .encode())
    }

    /// Only the KEM decapsulation key is used; the symmetric key is recovered
    /// from the wrapped-key field.
    fn decrypt(&self, keys: &HybridKeys, ciphertext: &[u8]) -> Result<Decryption> {
        if keys.kem.params() != self.params {
            return Err(EngineError::KeyMismatch);
        }
        let frame = HybridFrame::parse(ciphertext, &self.layout())?;

        let shared = match decapsulate_soft(self.params, &keys.kem, frame.kem_ciphertext)? {
            Ok(shared) => shared,
            Err(failure) => return Ok(Decryption::Failed(failure)),
        };

        let symmetric = match self.aead.open_frame(shared.as_ref(), &frame.wrapped_key)? {
            Some(key) => key,
            None => return Ok(Decryption::Failed(SoftFailure::KeyUnwrapFailed)),
        };

        let payload_key = combine_payload_key(&shared, &symmetric);
        Ok(match self.aead.open_frame(payload_key.as_ref(), &frame.data)? {
            Some(plaintext) => Decryption::Plaintext(plaintext),
            None => Decryption::Failed(SoftFailure::AuthenticationFailed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::kem::KemSuite;
    use rand::rngs::OsRng;

    fn suite() -> HybridSuite {
        HybridSuite::new(KemParams::MlKem768, AeadScheme::Aes256Gcm)
    }

    #[test]
    fn test_payload_key_is_shared_secret_prefix() {
        let shared: SharedSecret = Zeroizing::new([7u8; 32]);
        let key = combine_payload_key(&shared, &[9u8; 32]);
        assert_eq!(*key, [7u8; 32]);
    }

    #[test]
    fn test_hybrid_roundtrip() {
        let suite = suite();
        let keys = suite.generate_keys(&mut OsRng).unwrap();
        let data = b"hybrid payload";
        let sealed = suite.encrypt(&keys, data, &mut OsRng).unwrap();
        assert_eq!(sealed.len(), suite.layout().serialized_len(data.len()));

        match suite.decrypt(&keys, &sealed).unwrap() {
            Decryption::Plaintext(p) => assert_eq!(p.as_slice(), data),
            Decryption::Failed(f) => panic!("unexpected failure: {:?}", f),
        }
    }

    #[test]
    fn test_wrapped_key_recovers_symmetric_key() {
        let suite = suite();
        let keys = suite.generate_keys(&mut OsRng).unwrap();
        let sealed = suite.encrypt(&keys, b"abc", &mut OsRng).unwrap();
        let frame = HybridFrame::parse(&sealed, &suite.layout()).unwrap();

        let shared = keys
            .kem
            .params()
            .decapsulate(keys.kem.secret_key(), frame.kem_ciphertext)
            .unwrap();
        let unwrapped = suite
            .aead
            .open_frame(shared.as_ref(), &frame.wrapped_key)
            .unwrap()
            .unwrap();
        assert_eq!(unwrapped.as_slice(), &keys.symmetric[..]);
    }

    #[test]
    fn test_tampered_wrapped_key_is_unwrap_failure() {
        let suite = suite();
        let keys = suite.generate_keys(&mut OsRng).unwrap();
        let mut sealed = suite.encrypt(&keys, b"abc", &mut OsRng).unwrap();
        let offset = suite.layout().kem_ciphertext_size + suite.layout().nonce_size;
        sealed[offset] ^= 0xFF;

        match suite.decrypt(&keys, &sealed).unwrap() {
            Decryption::Failed(f) => assert_eq!(f, SoftFailure::KeyUnwrapFailed),
            Decryption::Plaintext(_) => panic!("tampered wrapped key must not decrypt"),
        }
    }

    #[test]
    fn test_hybrid_longer_than_kem_only() {
        let hybrid = suite().layout();
        let kem = KemSuite::new(KemParams::MlKem768, AeadScheme::Aes256Gcm).layout();
        for len in [0, 1, 1024] {
            assert!(hybrid.serialized_len(len) > kem.serialized_len(len));
            assert!(hybrid.serialized_len(len) > AeadScheme::Aes256Gcm.layout().serialized_len(len));
        }
    }
}
