#![no_main]
use libfuzzer_sys::fuzz_target;
use pqvpn_crypto::Registry;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte selects the algorithm, the rest is the plaintext
    let entries = Registry::builtin().entries();
    let entry = &entries[data[0] as usize % entries.len()];
    let plaintext = &data[1..];

    let mut rng = ChaCha20Rng::from_seed([data[0]; 32]);
    let result = Registry::builtin()
        .test_algorithm_with_rng(&entry.descriptor.name, plaintext, &mut rng)
        .expect("registered algorithm must not fail fatally");

    assert!(result.decryption_succeeded, "round-trip failed");
    assert_eq!(
        result.serialized_ciphertext.len(),
        entry.suite.layout().serialized_len(plaintext.len())
    );
});
