//! Durable settings for the ad-block engine.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::AdBlockMethod;

/// Settings persisted across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Whether observed hosts are recorded into the query log
    pub recording_enabled: bool,
    /// Blocking method to activate
    pub active_method: AdBlockMethod,
}

impl Settings {
    /// Load settings from a file.
    ///
    /// Returns default settings if the file doesn't exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save settings to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// SettingsStore is the durable configuration collaborator.
pub trait SettingsStore: Send + Sync {
    /// Whether query log recording is enabled.
    fn recording_enabled(&self) -> bool;

    /// Persist the recording flag.
    fn set_recording_enabled(&self, enabled: bool) -> Result<()>;

    /// Get the configured blocking method.
    fn active_method(&self) -> AdBlockMethod;

    /// Persist the blocking method.
    fn set_active_method(&self, method: AdBlockMethod) -> Result<()>;
}

/// Settings kept in memory only.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: RwLock<Settings>,
}

impl MemorySettingsStore {
    /// Create a store holding `settings`.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }

    /// Get a copy of the current settings.
    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn recording_enabled(&self) -> bool {
        self.settings.read().recording_enabled
    }

    fn set_recording_enabled(&self, enabled: bool) -> Result<()> {
        self.settings.write().recording_enabled = enabled;
        Ok(())
    }

    fn active_method(&self) -> AdBlockMethod {
        self.settings.read().active_method
    }

    fn set_active_method(&self, method: AdBlockMethod) -> Result<()> {
        self.settings.write().active_method = method;
        Ok(())
    }
}

/// Settings backed by a JSON file.
///
/// Every write is saved to disk before returning. The in-memory copy is
/// only updated once the save succeeded.
#[derive(Debug)]
pub struct JsonSettingsStore {
    path: PathBuf,
    settings: RwLock<Settings>,
}

impl JsonSettingsStore {
    /// Open a settings file, using defaults if it doesn't exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let settings = Settings::load(&path)?;
        log::debug!("Loaded settings from {:?}: {:?}", path, settings);
        Ok(Self {
            path,
            settings: RwLock::new(settings),
        })
    }

    /// Get the path of the settings file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update(&self, change: impl FnOnce(&mut Settings)) -> Result<()> {
        let mut guard = self.settings.write();
        let mut updated = guard.clone();
        change(&mut updated);
        updated.save(&self.path)?;
        *guard = updated;
        Ok(())
    }
}

impl SettingsStore for JsonSettingsStore {
    fn recording_enabled(&self) -> bool {
        self.settings.read().recording_enabled
    }

    fn set_recording_enabled(&self, enabled: bool) -> Result<()> {
        self.update(|s| s.recording_enabled = enabled)
    }

    fn active_method(&self) -> AdBlockMethod {
        self.settings.read().active_method
    }

    fn set_active_method(&self, method: AdBlockMethod) -> Result<()> {
        self.update(|s| s.active_method = method)
    }
}
