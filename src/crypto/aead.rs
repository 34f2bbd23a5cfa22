/// Symmetric suites: AES-256-GCM, ChaCha20-Poly1305 and XChaCha20-Poly1305.
///
/// Output format of [`AeadScheme::seal`]:
/// ```text
/// [nonce: 12 or 24][ciphertext][tag: 16]
/// ```
///
/// The nonce is drawn from the caller's RNG on every seal. Authentication
/// failure on open is not an error: it yields `Ok(None)`. Only a buffer too
/// short to hold the nonce and tag, or a key of the wrong size, is an `Err`.
use aes_gcm::Aes256Gcm;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, XChaCha20Poly1305, XNonce,
};
use rand::{CryptoRng, RngCore};
use serde::Serialize;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::error::Result;
use crate::protocol::wire::{SealedFrame, WireLayout};
use crate::suite::{Decryption, SoftFailure, SuiteExecutor};

/// Key size shared by every supported AEAD (256-bit)
pub const KEY_SIZE: usize = 32;
/// Poly1305 and GHASH tag size
pub const TAG_SIZE: usize = 16;
/// 96-bit nonce (AES-GCM, ChaCha20-Poly1305)
pub const NONCE_SIZE: usize = 12;
/// 192-bit extended nonce (XChaCha20-Poly1305)
pub const XNONCE_SIZE: usize = 24;

/// A 256-bit AEAD key, wiped on drop.
pub type SymmetricKey = Zeroizing<[u8; KEY_SIZE]>;

#[derive(Error, Debug)]
pub enum AeadError {
    #[error("Invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },
    #[error("AEAD encryption failed")]
    EncryptionFailed,
}

/// Fixed-key AEAD construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AeadScheme {
    Aes256Gcm,
    ChaCha20Poly1305,
    XChaCha20Poly1305,
}

impl AeadScheme {
    pub const fn key_size(self) -> usize {
        KEY_SIZE
    }

    pub const fn nonce_size(self) -> usize {
        match self {
            AeadScheme::Aes256Gcm | AeadScheme::ChaCha20Poly1305 => NONCE_SIZE,
            AeadScheme::XChaCha20Poly1305 => XNONCE_SIZE,
        }
    }

    pub const fn tag_size(self) -> usize {
        TAG_SIZE
    }

    pub fn label(self) -> &'static str {
        match self {
            AeadScheme::Aes256Gcm => "AES-256-GCM",
            AeadScheme::ChaCha20Poly1305 => "ChaCha20-Poly1305",
            AeadScheme::XChaCha20Poly1305 => "XChaCha20-Poly1305",
        }
    }

    /// Layout of a classic ciphertext produced by this scheme.
    pub fn layout(self) -> WireLayout {
        WireLayout::classic(self.nonce_size(), self.key_size(), self.tag_size())
    }

    /// Generate a fresh random key.
    pub fn generate_key<R: RngCore + CryptoRng>(self, rng: &mut R) -> SymmetricKey {
        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        rng.fill_bytes(key.as_mut());
        key
    }

    /// Seal `plaintext` and return `(nonce, ciphertext ‖ tag)`.
    pub fn seal_detached<R: RngCore + CryptoRng>(
        self,
        key: &[u8],
        plaintext: &[u8],
        rng: &mut R,
    ) -> std::result::Result<(Vec<u8>, Vec<u8>), AeadError> {
        let mut nonce = vec![0u8; self.nonce_size()];
        rng.fill_bytes(&mut nonce);
        let body = self.encrypt_raw(key, &nonce, plaintext)?;
        Ok((nonce, body))
    }

    /// Seal `plaintext` into `nonce ‖ ciphertext ‖ tag`.
    pub fn seal<R: RngCore + CryptoRng>(
        self,
        key: &[u8],
        plaintext: &[u8],
        rng: &mut R,
    ) -> std::result::Result<Vec<u8>, AeadError> {
        let (nonce, body) = self.seal_detached(key, plaintext, rng)?;
        Ok(SealedFrame {
            nonce: &nonce,
            body: &body,
        }
        .encode())
    }

    /// Open `nonce ‖ ciphertext ‖ tag`.
    ///
    /// Returns `Ok(None)` when the tag does not verify.
    pub fn open(self, key: &[u8], sealed: &[u8]) -> Result<Option<Zeroizing<Vec<u8>>>> {
        let frame = SealedFrame::parse(sealed, &self.layout())?;
        Ok(self.open_frame(key, &frame)?)
    }

    /// Open an already-framed AEAD block.
    pub fn open_frame(
        self,
        key: &[u8],
        frame: &SealedFrame<'_>,
    ) -> std::result::Result<Option<Zeroizing<Vec<u8>>>, AeadError> {
        self.check_key(key)?;
        let plaintext = match self {
            AeadScheme::Aes256Gcm => Aes256Gcm::new_from_slice(key)
                .map_err(|_| self.key_error(key))?
                .decrypt(aes_gcm::Nonce::from_slice(frame.nonce), frame.body),
            AeadScheme::ChaCha20Poly1305 => ChaCha20Poly1305::new_from_slice(key)
                .map_err(|_| self.key_error(key))?
                .decrypt(chacha20poly1305::Nonce::from_slice(frame.nonce), frame.body),
            AeadScheme::XChaCha20Poly1305 => XChaCha20Poly1305::new_from_slice(key)
                .map_err(|_| self.key_error(key))?
                .decrypt(XNonce::from_slice(frame.nonce), frame.body),
        };
        Ok(plaintext.ok().map(Zeroizing::new))
    }

    fn encrypt_raw(
        self,
        key: &[u8],
        nonce: &[u8],
        plaintext: &[u8],
    ) -> std::result::Result<Vec<u8>, AeadError> {
        self.check_key(key)?;
        let ciphertext = match self {
            AeadScheme::Aes256Gcm => Aes256Gcm::new_from_slice(key)
                .map_err(|_| self.key_error(key))?
                .encrypt(aes_gcm::Nonce::from_slice(nonce), plaintext),
            AeadScheme::ChaCha20Poly1305 => ChaCha20Poly1305::new_from_slice(key)
                .map_err(|_| self.key_error(key))?
                .encrypt(chacha20poly1305::Nonce::from_slice(nonce), plaintext),
            AeadScheme::XChaCha20Poly1305 => XChaCha20Poly1305::new_from_slice(key)
                .map_err(|_| self.key_error(key))?
                .encrypt(XNonce::from_slice(nonce), plaintext),
        };
        ciphertext.map_err(|_| AeadError::EncryptionFailed)
    }

    fn check_key(self, key: &[u8]) -> std::result::Result<(), AeadError> {
        if key.len() != self.key_size() {
            return Err(self.key_error(key));
        }
        Ok(())
    }

    fn key_error(self, key: &[u8]) -> AeadError {
        AeadError::InvalidKeyLength {
            expected: self.key_size(),
            actual: key.len(),
        }
    }
}

impl SuiteExecutor for AeadScheme {
    type Keys = SymmetricKey;

    fn layout(&self) -> WireLayout {
        AeadScheme::layout(*self)
    }

    fn generate_keys<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<SymmetricKey> {
        Ok(self.generate_key(rng))
    }

    fn encrypt<R: RngCore + CryptoRng>(
        &self,
        keys: &SymmetricKey,
        plaintext: &[u8],
        rng: &mut R,
    ) -> Result<Vec<u8>> {
        Ok(self.seal(&keys[..], plaintext, rng)?)
    }

    fn decrypt(&self, keys: &SymmetricKey, ciphertext: &[u8]) -> Result<Decryption> {
        Ok(match self.open(&keys[..], ciphertext)? {
            Some(plaintext) => Decryption::Plaintext(plaintext),
            None => Decryption::Failed(SoftFailure::AuthenticationFailed),
        })
    }
}
