//! VPN-based blocking model.

use std::sync::mpsc::Receiver;
use std::sync::Arc;

use super::{AdBlockModel, Lifecycle, ModelStatus, StateMessages};
use crate::backend::Backend;
use crate::cache::{CacheConfig, CacheStats, HostCache};
use crate::query_log::QueryLog;
use crate::settings::SettingsStore;
use crate::store::RuleStore;
use crate::{AdBlockMethod, HostEntry, Result};

const MESSAGES: StateMessages = StateMessages {
    applied: "VPN configuration updated",
    reverted: "VPN stopped",
    failed: "Failed to start VPN",
};

/// Configuration for the VPN model.
#[derive(Debug, Clone, Default)]
pub struct VpnConfig {
    /// Host cache configuration.
    pub cache: CacheConfig,
    /// Maximum number of hosts kept in the query log (`None` for unbounded).
    pub log_capacity: Option<usize>,
}

/// VpnModel intercepts DNS queries through a local VPN.
///
/// Owns the host cache and the query log. Both live and die with the model,
/// so switching methods never leaks recorded hosts into another instance.
pub struct VpnModel {
    lifecycle: Lifecycle,
    cache: HostCache,
    log: QueryLog,
    settings: Arc<dyn SettingsStore>,
}

impl VpnModel {
    /// Create a VPN model.
    ///
    /// The applied flag is derived from the backend and the recording flag
    /// from the settings store.
    pub fn new(
        store: Arc<dyn RuleStore>,
        backend: Arc<dyn Backend>,
        settings: Arc<dyn SettingsStore>,
        config: VpnConfig,
    ) -> Self {
        let recording = settings.recording_enabled();
        let log = match config.log_capacity {
            Some(capacity) => QueryLog::with_capacity(recording, capacity),
            None => QueryLog::new(recording),
        };
        Self {
            lifecycle: Lifecycle::new(AdBlockMethod::Vpn, backend, MESSAGES),
            cache: HostCache::new(store, config.cache),
            log,
            settings,
        }
    }

    /// Get host cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Get the host cache.
    pub fn cache(&self) -> &HostCache {
        &self.cache
    }
}

impl AdBlockModel for VpnModel {
    fn method(&self) -> AdBlockMethod {
        AdBlockMethod::Vpn
    }

    fn apply(&self) -> Result<()> {
        // Rules may have been reloaded since the cache was filled
        self.lifecycle.apply(|| self.cache.evict_all())
    }

    fn revert(&self) -> Result<()> {
        self.lifecycle.revert()
    }

    fn status(&self) -> ModelStatus {
        self.lifecycle.status()
    }

    fn subscribe(&self) -> Receiver<ModelStatus> {
        self.lifecycle.subscribe()
    }

    fn get_entry(&self, host: &str) -> Option<HostEntry> {
        if self.log.record(host) {
            log::trace!("Recorded host {}", host);
        }
        self.cache.classify(host)
    }

    fn is_recording_logs(&self) -> bool {
        self.log.is_recording()
    }

    fn set_recording_logs(&self, recording: bool) -> Result<()> {
        log::debug!("Set VPN query log recording: {}", recording);
        self.log.set_recording(recording);
        self.settings.set_recording_enabled(recording)
    }

    fn logs(&self) -> Vec<String> {
        self.log.snapshot()
    }

    fn clear_logs(&self) {
        self.log.clear();
    }

    fn clear_block_cache(&self, host: &str) {
        self.cache.invalidate(host);
    }

    fn teardown(&self) {
        self.log.set_recording(false);
        self.log.clear();
        self.cache.evict_all();
    }
}
