/// Default-algorithm preference and the settings stores that persist it.
///
/// The engine only touches two keys of the host's settings:
/// `crypto.default_classic` and `crypto.default_post_quantum`.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::error::{EngineError, Result};
use crate::registry::Registry;

/// Settings key of the default classic algorithm
pub const DEFAULT_CLASSIC_KEY: &str = "crypto.default_classic";
/// Settings key of the default post-quantum algorithm
pub const DEFAULT_POST_QUANTUM_KEY: &str = "crypto.default_post_quantum";

/// Returned by [`get_default_algorithm`] when nothing is stored
pub const FALLBACK_CLASSIC: &str = "aes256gcm";
pub const FALLBACK_POST_QUANTUM: &str = "kyber768";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// String key-value settings owned by the host application.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), ConfigError>;
}

/// Settings held in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    values: BTreeMap<String, String>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), ConfigError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Settings backed by a flat JSON object on disk.
///
/// The whole file is rewritten on every `set`.
#[derive(Debug)]
pub struct JsonFileSettings {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileSettings {
    /// Load `path`, or start empty if it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> std::result::Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl SettingsStore for JsonFileSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), ConfigError> {
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }
}

fn preference_key(post_quantum: bool) -> &'static str {
    if post_quantum {
        DEFAULT_POST_QUANTUM_KEY
    } else {
        DEFAULT_CLASSIC_KEY
    }
}

/// Persist `name` as the default of its category.
///
/// `name` must be a built-in algorithm of that category; a post-quantum name
/// is rejected as a classic default and vice versa.
pub fn set_default_algorithm<S: SettingsStore + ?Sized>(
    store: &mut S,
    name: &str,
    post_quantum: bool,
) -> Result<()> {
    log::info!(
        "Setting default encryption algorithm to {} (post-quantum: {})",
        name,
        post_quantum
    );
    if !Registry::builtin().contains(name, post_quantum) {
        log::error!("Invalid default algorithm: {}", name);
        return Err(EngineError::InvalidAlgorithm(name.to_string()));
    }
    store.set(preference_key(post_quantum), name)?;
    Ok(())
}

/// Stored default of the category, or its fallback when unset.
pub fn get_default_algorithm<S: SettingsStore + ?Sized>(store: &S, post_quantum: bool) -> String {
    match store.get(preference_key(post_quantum)) {
        Some(name) if !name.is_empty() => name,
        _ if post_quantum => FALLBACK_POST_QUANTUM.to_string(),
        _ => FALLBACK_CLASSIC.to_string(),
    }
}
