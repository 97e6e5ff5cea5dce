//! Presets: named configurations, persisted and turned into engines on demand.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::codec::CodecRegistry;
use crate::config::{CipherBuilder, CipherConfig};
use crate::engine::Cipher;
use crate::error::CipherError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub config: CipherConfig,
}

impl Preset {
    pub fn new(name: impl Into<String>, config: CipherConfig) -> Result<Self, CipherError> {
        let name = name.into();
        check_name(&name)?;
        config.validate()?;
        Ok(Self { name, config })
    }
}

/// Names double as file stems: ASCII letters, digits, `-` and `_`.
fn check_name(name: &str) -> Result<(), CipherError> {
    let ok = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if ok {
        Ok(())
    } else {
        Err(CipherError::InvalidConfig(format!("invalid preset name {:?}", name)))
    }
}

// ---------------------------------------------------------------------------
// Storage trait
// ---------------------------------------------------------------------------

/// Where presets live.
pub trait PresetStore: Send + Sync {
    fn get(&self, name: &str) -> Result<Option<Preset>, CipherError>;
    fn put(&self, preset: &Preset) -> Result<(), CipherError>;
    /// Returns whether anything was removed.
    fn delete(&self, name: &str) -> Result<bool, CipherError>;
    fn list(&self) -> Result<Vec<Preset>, CipherError>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryPresetStore {
    presets: RwLock<HashMap<String, Preset>>,
}

impl InMemoryPresetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PresetStore for InMemoryPresetStore {
    fn get(&self, name: &str) -> Result<Option<Preset>, CipherError> {
        let presets = self.presets.read().unwrap_or_else(PoisonError::into_inner);
        Ok(presets.get(name).cloned())
    }

    fn put(&self, preset: &Preset) -> Result<(), CipherError> {
        let mut presets = self.presets.write().unwrap_or_else(PoisonError::into_inner);
        presets.insert(preset.name.clone(), preset.clone());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<bool, CipherError> {
        let mut presets = self.presets.write().unwrap_or_else(PoisonError::into_inner);
        Ok(presets.remove(name).is_some())
    }

    fn list(&self) -> Result<Vec<Preset>, CipherError> {
        let presets = self.presets.read().unwrap_or_else(PoisonError::into_inner);
        Ok(presets.values().cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// File store
// ---------------------------------------------------------------------------

/// One JSON file per preset.
///
/// ```text
/// presets/
///   {name}.json
/// ```
///
/// Files hold the configured key (hex); protect the directory accordingly.
pub struct FilePresetStore {
    dir: PathBuf,
}

impl FilePresetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CipherError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| CipherError::Storage(format!("create dir: {}", e)))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> Result<PathBuf, CipherError> {
        check_name(name)?;
        Ok(self.dir.join(format!("{}.json", name)))
    }

    fn read_file(&self, path: &Path) -> Result<Preset, CipherError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| CipherError::Storage(format!("read: {}", e)))?;
        serde_json::from_str(&data).map_err(|e| CipherError::Storage(format!("parse: {}", e)))
    }
}

impl PresetStore for FilePresetStore {
    fn get(&self, name: &str) -> Result<Option<Preset>, CipherError> {
        let path = self.path(name)?;
        if !path.exists() {
            return Ok(None);
        }
        self.read_file(&path).map(Some)
    }

    fn put(&self, preset: &Preset) -> Result<(), CipherError> {
        let path = self.path(&preset.name)?;
        let json = serde_json::to_string_pretty(preset)
            .map_err(|e| CipherError::Storage(format!("serialize: {}", e)))?;
        // write then rename so readers never see a partial file
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, &json).map_err(|e| CipherError::Storage(format!("write: {}", e)))?;
        std::fs::rename(&tmp, &path).map_err(|e| CipherError::Storage(format!("rename: {}", e)))?;
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<bool, CipherError> {
        let path = self.path(name)?;
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&path).map_err(|e| CipherError::Storage(format!("delete: {}", e)))?;
        Ok(true)
    }

    fn list(&self) -> Result<Vec<Preset>, CipherError> {
        let mut presets = Vec::new();
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| CipherError::Storage(format!("readdir: {}", e)))?;
        for entry in entries {
            let entry = entry.map_err(|e| CipherError::Storage(format!("entry: {}", e)))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                presets.push(self.read_file(&path)?);
            }
        }
        Ok(presets)
    }
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

/// Named configurations plus the registry their engines resolve bases in.
pub struct Presets {
    store: Arc<dyn PresetStore>,
    registry: Arc<CodecRegistry>,
}

impl Presets {
    pub fn new(store: Arc<dyn PresetStore>) -> Self {
        Self::with_registry(store, CodecRegistry::global())
    }

    pub fn with_registry(store: Arc<dyn PresetStore>, registry: Arc<CodecRegistry>) -> Self {
        Self { store, registry }
    }

    /// Presets held only in memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryPresetStore::new()))
    }

    /// Store `config` under `name`, replacing any previous definition.
    pub fn define(&self, name: &str, config: CipherConfig) -> Result<(), CipherError> {
        let preset = Preset::new(name, config)?;
        self.store.put(&preset)?;
        tracing::debug!(preset = %name, "preset stored");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<CipherConfig, CipherError> {
        match self.store.get(name)? {
            Some(preset) => {
                tracing::debug!(preset = %name, "preset loaded");
                Ok(preset.config)
            }
            None => Err(CipherError::PresetNotFound(name.to_owned())),
        }
    }

    pub fn remove(&self, name: &str) -> Result<bool, CipherError> {
        self.store.delete(name)
    }

    /// Defined names, sorted.
    pub fn names(&self) -> Result<Vec<String>, CipherError> {
        let mut names: Vec<String> = self.store.list()?.into_iter().map(|p| p.name).collect();
        names.sort();
        Ok(names)
    }

    /// A new engine configured from the named preset.
    pub fn materialize(&self, name: &str) -> Result<Cipher, CipherError> {
        Cipher::with_registry(self.get(name)?, Arc::clone(&self.registry))
    }

    /// Like [`Presets::materialize`], with per-call overrides applied on top.
    pub fn materialize_with<F>(&self, name: &str, overrides: F) -> Result<Cipher, CipherError>
    where
        F: FnOnce(CipherBuilder) -> CipherBuilder,
    {
        let config = overrides(self.get(name)?.to_builder()).build()?;
        Cipher::with_registry(config, Arc::clone(&self.registry))
    }
}
