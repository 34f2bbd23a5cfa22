//! # pqvpn-crypto
//!
//! **Classic, post-quantum and hybrid encryption engine for a VPN tunnel tool.**
//!
//! The engine selects a cipher suite by name, runs key generation, encryption
//! and a decryption self-test, and reports the serialized ciphertext together
//! with per-phase timings. Every suite family serializes to a fixed-order byte
//! layout with explicit offsets:
//!
//! - **Classic AEAD**: AES-256-GCM, ChaCha20-Poly1305, XChaCha20-Poly1305
//! - **KEM**: ML-KEM-768 / ML-KEM-1024 shared secret keys an AES-256-GCM payload
//! - **Hybrid**: ML-KEM plus an independent AEAD key, wrapped under the shared secret
//!
//! ## Quick Start
//!
//! ```rust
//! use pqvpn_crypto::{list_post_quantum_algorithms, test_algorithm};
//!
//! for algo in list_post_quantum_algorithms() {
//!     let result = test_algorithm(&algo.name, b"Hello, PQ VPN!").unwrap();
//!     assert!(result.decryption_succeeded);
//! }
//! ```
//!
//! ## Architecture
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`crypto`] | AEAD, ML-KEM and hybrid suite executors |
//! | [`protocol`] | Wire layouts and zero-copy frame parsing |
//! | [`suite`] | Executor trait, tagged suite variant, soft failures |
//! | [`registry`] | Algorithm descriptors and name resolution |
//! | [`perf`] | Phase timing and benchmarks |
//! | [`result`] | Operation results and reports |
//! | [`config`] | Default-algorithm preference and settings stores |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `std` | Yes | Standard library support |
//! | `wasm` | No | WebAssembly support (`getrandom/js`) |

#![allow(
    clippy::empty_line_after_doc_comments,
    clippy::doc_lazy_continuation
)]

// ── Public modules ──────────────────────────────────────────────────────────

/// Symmetric, ML-KEM and hybrid suite executors.
pub mod crypto;

/// Serialized ciphertext layouts.
pub mod protocol;

/// Executor trait and the tagged suite variant.
pub mod suite;

/// Algorithm registry.
pub mod registry;

/// Phase timing and benchmarking.
pub mod perf;

/// Self-test results.
pub mod result;

/// Default-algorithm preference.
pub mod config;

pub mod error;

// ── Re-exports for convenience ──────────────────────────────────────────────

pub use config::{
    get_default_algorithm, set_default_algorithm, ConfigError, JsonFileSettings,
    MemorySettings, SettingsStore,
};

pub use error::{EngineError, Result};

pub use perf::{benchmark, BenchmarkSummary, PhaseStats, PhaseTimings};

pub use protocol::{FramingError, SchemeFamily, WireLayout};

pub use registry::{
    list_classic_algorithms, list_post_quantum_algorithms, test_algorithm,
    test_algorithm_with_rng, AlgorithmDescriptor, Registry,
};

pub use result::OperationResult;

pub use suite::{CipherSuite, Decryption, KeyMaterial, SoftFailure, SuiteExecutor};

// ── Library metadata ────────────────────────────────────────────────────────

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version string.
pub fn version() -> &'static str {
    VERSION
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
        assert!(version().contains('.'));
    }

    #[test]
    fn test_algorithm_roundtrip() {
        let result = test_algorithm("hybrid-kyber768-aes256gcm", b"Hello, PQ VPN!").unwrap();
        assert!(result.decryption_succeeded);
        assert!(result.failure.is_none());
    }
}
