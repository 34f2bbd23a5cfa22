/// Phase timing for algorithm self-tests and repeated benchmark runs.
///
/// Each measurement brackets only the closure passed to
/// [`PerformanceRecorder::time`], so framing and result assembly are not
/// counted against any phase.
use std::time::{Duration, Instant};

use rand::rngs::OsRng;
use serde::Serialize;

use crate::error::Result;
use crate::registry::Registry;

/// One measured phase of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    KeyGeneration,
    Encryption,
    Decryption,
}

/// Durations of the three phases of one operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PhaseTimings {
    pub key_generation: Duration,
    pub encryption: Duration,
    pub decryption: Duration,
}

impl PhaseTimings {
    fn slot(&mut self, phase: Phase) -> &mut Duration {
        match phase {
            Phase::KeyGeneration => &mut self.key_generation,
            Phase::Encryption => &mut self.encryption,
            Phase::Decryption => &mut self.decryption,
        }
    }

    pub fn get(&self, phase: Phase) -> Duration {
        match phase {
            Phase::KeyGeneration => self.key_generation,
            Phase::Encryption => self.encryption,
            Phase::Decryption => self.decryption,
        }
    }

    pub fn total(&self) -> Duration {
        self.key_generation + self.encryption + self.decryption
    }
}

/// Accumulates phase durations for a single operation.
#[derive(Debug, Default)]
pub struct PerformanceRecorder {
    timings: PhaseTimings,
}

impl PerformanceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f`, adding its wall-clock time to `phase`.
    pub fn time<T>(&mut self, phase: Phase, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let value = f();
        *self.timings.slot(phase) += start.elapsed();
        value
    }

    pub fn finish(self) -> PhaseTimings {
        self.timings
    }
}

/// Min / mean / max of one phase over a benchmark run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PhaseStats {
    pub min: Duration,
    pub mean: Duration,
    pub max: Duration,
}

impl PhaseStats {
    fn from_samples(samples: &[Duration]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let total: Duration = samples.iter().sum();
        Self {
            min: samples.iter().copied().min().unwrap_or_default(),
            mean: total / samples.len() as u32,
            max: samples.iter().copied().max().unwrap_or_default(),
        }
    }
}

/// Aggregated result of [`benchmark`].
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkSummary {
    pub algorithm: String,
    pub iterations: u32,
    pub plaintext_len: usize,
    pub ciphertext_len: usize,
    pub key_generation: PhaseStats,
    pub encryption: PhaseStats,
    pub decryption: PhaseStats,
    /// Iterations whose decryption did not reproduce the input
    pub failures: u32,
}

impl std::fmt::Display for BenchmarkSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Benchmark {} ({} iterations, {} -> {} bytes):\n\
             ├─ Key generation: min={:?} mean={:?} max={:?}\n\
             ├─ Encryption:     min={:?} mean={:?} max={:?}\n\
             ├─ Decryption:     min={:?} mean={:?} max={:?}\n\
             └─ Failures: {}",
            self.algorithm,
            self.iterations,
            self.plaintext_len,
            self.ciphertext_len,
            self.key_generation.min,
            self.key_generation.mean,
            self.key_generation.max,
            self.encryption.min,
            self.encryption.mean,
            self.encryption.max,
            self.decryption.min,
            self.decryption.mean,
            self.decryption.max,
            self.failures,
        )
    }
}

/// Run the self-test for `name` `iterations` times and aggregate the timings.
///
/// Unknown names fail before any iteration runs. Soft failures are counted,
/// not returned.
pub fn benchmark(
    registry: &Registry,
    name: &str,
    data: &[u8],
    iterations: u32,
) -> Result<BenchmarkSummary> {
    let suite = registry.resolve(name)?;

    let mut key_generation = Vec::with_capacity(iterations as usize);
    let mut encryption = Vec::with_capacity(iterations as usize);
    let mut decryption = Vec::with_capacity(iterations as usize);
    let mut failures = 0u32;

    for _ in 0..iterations {
        let result = suite.self_test(name, data, &mut OsRng)?;
        if !result.decryption_succeeded {
            failures += 1;
        }
        key_generation.push(result.key_gen_duration);
        encryption.push(result.encrypt_duration);
        decryption.push(result.decrypt_duration);
    }

    let summary = BenchmarkSummary {
        algorithm: name.to_string(),
        iterations,
        plaintext_len: data.len(),
        ciphertext_len: suite.layout().serialized_len(data.len()),
        key_generation: PhaseStats::from_samples(&key_generation),
        encryption: PhaseStats::from_samples(&encryption),
        decryption: PhaseStats::from_samples(&decryption),
        failures,
    };
    log::info!(
        "Benchmarked {} over {} iterations ({} failures)",
        name,
        iterations,
        failures
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    #[test]
    fn test_recorder_returns_closure_value() {
        let mut recorder = PerformanceRecorder::new();
        let value = recorder.time(Phase::Encryption, || 41 + 1);
        assert_eq!(value, 42);
    }

    #[test]
    fn test_recorder_accumulates_per_phase() {
        let mut recorder = PerformanceRecorder::new();
        recorder.time(Phase::KeyGeneration, || {
            std::thread::sleep(Duration::from_millis(2))
        });
        let timings = recorder.finish();
        assert!(timings.key_generation >= Duration::from_millis(2));
        assert_eq!(timings.encryption, Duration::ZERO);
        assert_eq!(timings.total(), timings.get(Phase::KeyGeneration));
    }

    #[test]
    fn test_phase_stats() {
        let samples = [
            Duration::from_micros(10),
            Duration::from_micros(30),
            Duration::from_micros(20),
        ];
        let stats = PhaseStats::from_samples(&samples);
        assert_eq!(stats.min, Duration::from_micros(10));
        assert_eq!(stats.mean, Duration::from_micros(20));
        assert_eq!(stats.max, Duration::from_micros(30));
        assert_eq!(PhaseStats::from_samples(&[]), PhaseStats::default());
    }

    #[test]
    fn test_benchmark_classic() {
        let registry = Registry::with_builtin();
        let summary = benchmark(&registry, "aes256gcm", b"bench data", 5).unwrap();
        assert_eq!(summary.iterations, 5);
        assert_eq!(summary.failures, 0);
        assert_eq!(summary.ciphertext_len, 12 + 10 + 16);
        assert!(summary.encryption.min <= summary.encryption.max);

        let report = summary.to_string();
        assert!(report.contains("aes256gcm"));
        assert!(report.contains("Failures: 0"));
    }

    #[test]
    fn test_benchmark_unknown_algorithm() {
        let registry = Registry::with_builtin();
        let result = benchmark(&registry, "rot13", b"x", 3);
        assert!(matches!(result, Err(EngineError::UnsupportedAlgorithm(_))));
    }
}
