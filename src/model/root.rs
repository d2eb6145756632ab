//! System-level (root) blocking model.

use std::sync::mpsc::Receiver;
use std::sync::Arc;

use super::{AdBlockModel, Lifecycle, ModelStatus, StateMessages};
use crate::backend::Backend;
use crate::cache::resolve;
use crate::error::{Error, Result};
use crate::store::RuleStore;
use crate::{AdBlockMethod, HostEntry};

const MESSAGES: StateMessages = StateMessages {
    applied: "Hosts file installed",
    reverted: "Hosts file reverted",
    failed: "Failed to install hosts file",
};

/// RootModel blocks through a system-level mechanism.
///
/// Queries never pass through this process, so there is no host cache and
/// no query log. Classification goes straight to the rule store.
pub struct RootModel {
    lifecycle: Lifecycle,
    store: Arc<dyn RuleStore>,
}

impl RootModel {
    /// Create a root model.
    pub fn new(store: Arc<dyn RuleStore>, backend: Arc<dyn Backend>) -> Self {
        Self {
            lifecycle: Lifecycle::new(AdBlockMethod::Root, backend, MESSAGES),
            store,
        }
    }
}

impl AdBlockModel for RootModel {
    fn method(&self) -> AdBlockMethod {
        AdBlockMethod::Root
    }

    fn apply(&self) -> Result<()> {
        self.lifecycle.apply(|| {})
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
        resolve(self.store.as_ref(), host).unwrap_or_else(|e| {
            log::warn!("Failed to resolve host {}: {}", host, e);
            None
        })
    }

    fn is_recording_logs(&self) -> bool {
        false
    }

    fn set_recording_logs(&self, _recording: bool) -> Result<()> {
        Err(Error::Unsupported("query log recording requires the VPN method"))
    }

    fn logs(&self) -> Vec<String> {
        Vec::new()
    }

    fn clear_logs(&self) {}

    fn clear_block_cache(&self, _host: &str) {}
}
