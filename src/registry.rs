/// Algorithm registry: descriptors plus name → suite resolution.
///
/// The built-in registry is a process-wide immutable static. Callers that need
/// extra algorithms build their own [`Registry`] and [`Registry::register`]
/// into it; nothing dispatches on algorithm names outside this module.
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::Serialize;

use crate::crypto::aead::AeadScheme;
use crate::crypto::hybrid::HybridSuite;
use crate::crypto::kem::{KemParams, KemSuite};
use crate::error::{EngineError, Result};
use crate::result::OperationResult;
use crate::suite::CipherSuite;

/// Public description of one algorithm. Identity is the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlgorithmDescriptor {
    pub name: String,
    pub description: String,
    pub is_post_quantum: bool,
}

#[derive(Debug, Clone)]
pub struct RegisteredAlgorithm {
    pub descriptor: AlgorithmDescriptor,
    pub suite: CipherSuite,
}

/// Ordered set of algorithms, unique by name.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<RegisteredAlgorithm>,
}

static BUILTIN: Lazy<Registry> = Lazy::new(Registry::with_builtin);

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every algorithm shipped with the crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();

        registry.register(
            "aes256gcm",
            "AES-256 in GCM mode - Strong symmetric encryption",
            CipherSuite::Aead(AeadScheme::Aes256Gcm),
        );
        registry.register(
            "chacha20poly1305",
            "ChaCha20-Poly1305 - Fast and secure symmetric encryption",
            CipherSuite::Aead(AeadScheme::ChaCha20Poly1305),
        );
        registry.register(
            "xchacha20poly1305",
            "XChaCha20-Poly1305 - ChaCha20-Poly1305 with a 192-bit random nonce",
            CipherSuite::Aead(AeadScheme::XChaCha20Poly1305),
        );
        registry.register(
            "kyber768",
            "Kyber-768 - NIST selected post-quantum key encapsulation mechanism",
            CipherSuite::Kem(KemSuite::new(KemParams::MlKem768, AeadScheme::Aes256Gcm)),
        );
        registry.register(
            "kyber1024",
            "Kyber-1024 - Higher security level post-quantum key encapsulation mechanism",
            CipherSuite::Kem(KemSuite::new(KemParams::MlKem1024, AeadScheme::Aes256Gcm)),
        );
        registry.register(
            "hybrid-kyber768-aes256gcm",
            "Hybrid Kyber-768 + AES-256-GCM - Post-quantum security with classical fallback",
            CipherSuite::Hybrid(HybridSuite::new(KemParams::MlKem768, AeadScheme::Aes256Gcm)),
        );
        registry.register(
            "hybrid-kyber1024-chacha20poly1305",
            "Hybrid Kyber-1024 + ChaCha20-Poly1305 - Higher security level hybrid without AES hardware",
            CipherSuite::Hybrid(HybridSuite::new(
                KemParams::MlKem1024,
                AeadScheme::ChaCha20Poly1305,
            )),
        );

        registry
    }

    /// Shared built-in registry.
    pub fn builtin() -> &'static Registry {
        &BUILTIN
    }

    /// Insert `suite` under `name`, replacing any algorithm of the same name.
    /// Returns the replaced entry.
    pub fn register(
        &mut self,
        name: &str,
        description: &str,
        suite: CipherSuite,
    ) -> Option<RegisteredAlgorithm> {
        let entry = RegisteredAlgorithm {
            descriptor: AlgorithmDescriptor {
                name: name.to_string(),
                description: description.to_string(),
                is_post_quantum: suite.is_post_quantum(),
            },
            suite,
        };
        match self.entries.iter_mut().find(|e| e.descriptor.name == name) {
            Some(existing) => Some(std::mem::replace(existing, entry)),
            None => {
                self.entries.push(entry);
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RegisteredAlgorithm] {
        &self.entries
    }

    /// Descriptors of one category, in registration order.
    pub fn algorithms(&self, post_quantum: bool) -> Vec<AlgorithmDescriptor> {
        let list: Vec<AlgorithmDescriptor> = self
            .entries
            .iter()
            .filter(|e| e.descriptor.is_post_quantum == post_quantum)
            .map(|e| e.descriptor.clone())
            .collect();
        log::debug!(
            "Listing {} {} algorithms",
            list.len(),
            if post_quantum { "post-quantum" } else { "classic" }
        );
        list
    }

    pub fn classic_algorithms(&self) -> Vec<AlgorithmDescriptor> {
        self.algorithms(false)
    }

    pub fn post_quantum_algorithms(&self) -> Vec<AlgorithmDescriptor> {
        self.algorithms(true)
    }

    pub fn describe(&self, name: &str) -> Option<&AlgorithmDescriptor> {
        self.entries
            .iter()
            .find(|e| e.descriptor.name == name)
            .map(|e| &e.descriptor)
    }

    /// Whether `name` is registered in the given category.
    pub fn contains(&self, name: &str, post_quantum: bool) -> bool {
        self.describe(name)
            .is_some_and(|d| d.is_post_quantum == post_quantum)
    }

    /// Look up the suite registered under `name`.
    pub fn resolve(&self, name: &str) -> Result<CipherSuite> {
        match self.entries.iter().find(|e| e.descriptor.name == name) {
            Some(entry) => {
                log::debug!("Resolved {} to {:?}", name, entry.suite);
                Ok(entry.suite)
            }
            None => {
                log::error!("Unsupported algorithm: {}", name);
                Err(EngineError::UnsupportedAlgorithm(name.to_string()))
            }
        }
    }

    /// Generate keys, encrypt and decrypt `data` with `name`, using the OS RNG.
    pub fn test_algorithm(&self, name: &str, data: &[u8]) -> Result<OperationResult> {
        self.test_algorithm_with_rng(name, data, &mut OsRng)
    }

    pub fn test_algorithm_with_rng<R: RngCore + CryptoRng>(
        &self,
        name: &str,
        data: &[u8],
        rng: &mut R,
    ) -> Result<OperationResult> {
        let suite = self.resolve(name)?;
        log::info!("Testing {} with {} bytes", name, data.len());
        let result = suite.self_test(name, data, rng)?;
        log::info!(
            "{}: {} bytes, success={}, keygen={:?} encrypt={:?} decrypt={:?}",
            name,
            result.serialized_ciphertext.len(),
            result.decryption_succeeded,
            result.key_gen_duration,
            result.encrypt_duration,
            result.decrypt_duration
        );
        Ok(result)
    }

    /// Self-test every registered algorithm, in registration order.
    ///
    /// Stops at the first fatal error.
    pub fn test_all(&self, data: &[u8]) -> Result<Vec<OperationResult>> {
        self.entries
            .iter()
            .map(|e| self.test_algorithm(&e.descriptor.name, data))
            .collect()
    }
}

/// Classic algorithms of the built-in registry.
pub fn list_classic_algorithms() -> Vec<AlgorithmDescriptor> {
    Registry::builtin().classic_algorithms()
}

/// Post-quantum algorithms of the built-in registry.
pub fn list_post_quantum_algorithms() -> Vec<AlgorithmDescriptor> {
    Registry::builtin().post_quantum_algorithms()
}

/// Self-test `name` from the built-in registry.
pub fn test_algorithm(name: &str, data: &[u8]) -> Result<OperationResult> {
    Registry::builtin().test_algorithm(name, data)
}

/// Self-test `name` from the built-in registry with a caller-supplied RNG.
pub fn test_algorithm_with_rng<R: RngCore + CryptoRng>(
    name: &str,
    data: &[u8],
    rng: &mut R,
) -> Result<OperationResult> {
    Registry::builtin().test_algorithm_with_rng(name, data, rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[AlgorithmDescriptor]) -> Vec<&str> {
        list.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn test_builtin_lists() {
        assert_eq!(
            names(&list_classic_algorithms()),
            ["aes256gcm", "chacha20poly1305", "xchacha20poly1305"]
        );
        assert_eq!(
            names(&list_post_quantum_algorithms()),
            [
                "kyber768",
                "kyber1024",
                "hybrid-kyber768-aes256gcm",
                "hybrid-kyber1024-chacha20poly1305"
            ]
        );
        assert!(list_post_quantum_algorithms().iter().all(|d| d.is_post_quantum));
        assert!(list_classic_algorithms().iter().all(|d| !d.is_post_quantum));
    }

    #[test]
    fn test_unsupported_algorithm() {
        let err = test_algorithm("unsupported-name", b"data").unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedAlgorithm(ref n) if n == "unsupported-name"));
        assert_eq!(err.to_string(), "unsupported algorithm: unsupported-name");
    }

    #[test]
    fn test_register_replaces_by_name() {
        let mut registry = Registry::with_builtin();
        let before = registry.len();

        let previous = registry.register(
            "kyber768",
            "ML-KEM-768 keyed ChaCha20-Poly1305",
            CipherSuite::Kem(KemSuite::new(KemParams::MlKem768, AeadScheme::ChaCha20Poly1305)),
        );
        assert!(previous.is_some());
        assert_eq!(registry.len(), before);
        assert_eq!(
            registry.resolve("kyber768").unwrap(),
            CipherSuite::Kem(KemSuite::new(KemParams::MlKem768, AeadScheme::ChaCha20Poly1305))
        );
    }

    #[test]
    fn test_register_new_algorithm() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());
        assert!(registry
            .register("xchacha", "custom", CipherSuite::Aead(AeadScheme::XChaCha20Poly1305))
            .is_none());

        let result = registry.test_algorithm("xchacha", b"custom").unwrap();
        assert!(result.decryption_succeeded);
        assert_eq!(registry.classic_algorithms().len(), 1);
        assert!(registry.post_quantum_algorithms().is_empty());
    }

    #[test]
    fn test_describe_and_contains() {
        let registry = Registry::builtin();
        let desc = registry.describe("kyber1024").unwrap();
        assert!(desc.is_post_quantum);
        assert!(desc.description.starts_with("Kyber-1024"));
        assert!(registry.contains("aes256gcm", false));
        assert!(!registry.contains("aes256gcm", true));
        assert!(registry.describe("des").is_none());
    }

    #[test]
    fn test_all_builtin_succeed() {
        let results = Registry::builtin().test_all(b"batch self-test").unwrap();
        assert_eq!(results.len(), Registry::builtin().len());
        assert!(results.iter().all(|r| r.decryption_succeeded));
    }
}
