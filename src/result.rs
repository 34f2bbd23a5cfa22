use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::perf::PhaseTimings;
use crate::suite::SoftFailure;

/// Outcome of one key-generation / encryption / decryption self-test.
///
/// Immutable once built. A soft failure sets `decryption_succeeded = false`
/// and names the failing step in `failure`.
#[derive(Debug, Clone, Serialize)]
pub struct OperationResult {
    pub algorithm: String,
    #[serde(serialize_with = "serialize_hex")]
    pub serialized_ciphertext: Vec<u8>,
    pub decryption_succeeded: bool,
    pub failure: Option<SoftFailure>,
    pub key_gen_duration: Duration,
    pub encrypt_duration: Duration,
    pub decrypt_duration: Duration,
}

fn serialize_hex<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}

impl OperationResult {
    pub fn new(
        algorithm: &str,
        serialized_ciphertext: Vec<u8>,
        failure: Option<SoftFailure>,
        timings: PhaseTimings,
    ) -> Self {
        let result = Self {
            algorithm: algorithm.to_string(),
            serialized_ciphertext,
            decryption_succeeded: failure.is_none(),
            failure,
            key_gen_duration: timings.key_generation,
            encrypt_duration: timings.encryption,
            decrypt_duration: timings.decryption,
        };
        if let Some(failure) = failure {
            log::warn!(
                "{}: {} (ciphertext {})",
                algorithm,
                failure,
                result.short_fingerprint()
            );
        }
        result
    }

    /// BLAKE3 hash of the serialized ciphertext, hex-encoded.
    pub fn fingerprint(&self) -> String {
        blake3::hash(&self.serialized_ciphertext).to_hex().to_string()
    }

    /// First 8 bytes of [`fingerprint`](Self::fingerprint), for log lines.
    pub fn short_fingerprint(&self) -> String {
        let mut fp = self.fingerprint();
        fp.truncate(16);
        fp
    }

    pub fn timings(&self) -> PhaseTimings {
        PhaseTimings {
            key_generation: self.key_gen_duration,
            encryption: self.encrypt_duration,
            decryption: self.decrypt_duration,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl std::fmt::Display for OperationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Algorithm: {}", self.algorithm)?;
        writeln!(f, "Encrypted size: {} bytes", self.serialized_ciphertext.len())?;
        match self.failure {
            None => writeln!(f, "Decryption successful: true")?,
            Some(failure) => writeln!(f, "Decryption successful: false ({})", failure)?,
        }
        writeln!(f, "Performance:")?;
        writeln!(f, "  Key generation: {:?}", self.key_gen_duration)?;
        writeln!(f, "  Encryption: {:?}", self.encrypt_duration)?;
        write!(f, "  Decryption: {:?}", self.decrypt_duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(failure: Option<SoftFailure>) -> OperationResult {
        OperationResult::new(
            "aes256gcm",
            vec![0xde, 0xad, 0xbe, 0xef],
            failure,
            PhaseTimings {
                key_generation: Duration::from_micros(5),
                encryption: Duration::from_micros(7),
                decryption: Duration::from_micros(9),
            },
        )
    }

    #[test]
    fn test_success_flag_follows_failure() {
        assert!(sample(None).decryption_succeeded);
        let failed = sample(Some(SoftFailure::AuthenticationFailed));
        assert!(!failed.decryption_succeeded);
        assert_eq!(failed.failure, Some(SoftFailure::AuthenticationFailed));
    }

    #[test]
    fn test_fingerprint() {
        let result = sample(None);
        assert_eq!(result.fingerprint().len(), 64);
        assert_eq!(result.short_fingerprint().len(), 16);
        assert!(result.fingerprint().starts_with(&result.short_fingerprint()));
        assert_eq!(
            result.fingerprint(),
            blake3::hash(&[0xde, 0xad, 0xbe, 0xef]).to_hex().to_string()
        );
    }

    #[test]
    fn test_report() {
        let report = sample(Some(SoftFailure::KeyUnwrapFailed)).to_string();
        assert!(report.contains("Algorithm: aes256gcm"));
        assert!(report.contains("Encrypted size: 4 bytes"));
        assert!(report.contains("Decryption successful: false (key unwrap failed)"));
        assert!(report.contains("Key generation: 5µs"));
    }

    #[test]
    fn test_json_hex_ciphertext() {
        let json = sample(None).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["serialized_ciphertext"], "deadbeef");
        assert_eq!(value["decryption_succeeded"], true);
        assert!(value["failure"].is_null());
        assert_eq!(value["encrypt_duration"]["nanos"], 7000);
    }
}
