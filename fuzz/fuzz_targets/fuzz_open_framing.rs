#![no_main]
use libfuzzer_sys::fuzz_target;
use once_cell::sync::Lazy;
use pqvpn_crypto::suite::{CipherSuite, KeyMaterial};
use pqvpn_crypto::{EngineError, Registry};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

// One key set per registered suite; key generation is too slow per input.
static KEYS: Lazy<Vec<(CipherSuite, KeyMaterial)>> = Lazy::new(|| {
    let mut rng = ChaCha20Rng::from_seed([7u8; 32]);
    Registry::builtin()
        .entries()
        .iter()
        .map(|e| {
            let keys = e.suite.generate_keys(&mut rng).expect("key generation");
            (e.suite, keys)
        })
        .collect()
});

fuzz_target!(|data: &[u8]| {
    for (suite, keys) in KEYS.iter() {
        // Arbitrary bytes must never panic or authenticate
        match suite.decrypt(keys, data) {
            Ok(decryption) => assert!(!decryption.is_success(), "forged ciphertext opened"),
            Err(EngineError::Framing(_)) => {
                assert!(data.len() < suite.layout().min_len(), "framing error above min_len")
            }
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
});
