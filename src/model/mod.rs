//! Ad-block lifecycle models.
//!
//! Each blocking method has its own [`AdBlockModel`] implementation. They
//! share the apply/revert state machine in [`Lifecycle`] and differ in how
//! host names are classified and whether queries are logged:
//!
//! - [`VpnModel`] owns a [`HostCache`](crate::HostCache) and a
//!   [`QueryLog`](crate::QueryLog)
//! - [`RootModel`] resolves every host against the rule store and keeps no log
//!
//! # State Machine
//!
//! ```text
//!            apply() ok
//! Reverted ──► Applying ──► Applied
//!    ▲            │
//!    │            └──► Error (apply() failed)
//!    └── revert() from any state
//! ```

mod root;
mod vpn;

pub use root::RootModel;
pub use vpn::{VpnConfig, VpnModel};

use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::{AdBlockMethod, HostEntry};

/// Lifecycle state of a blocking backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Backend inactive
    Reverted,
    /// Backend start in progress
    Applying,
    /// Backend active
    Applied,
    /// Last start failed, backend presumed inactive
    Error,
}

impl LifecycleState {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Reverted => "reverted",
            LifecycleState::Applying => "applying",
            LifecycleState::Applied => "applied",
            LifecycleState::Error => "error",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of a model's observable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStatus {
    pub method: AdBlockMethod,
    pub state: LifecycleState,
    /// Whether the backend is intercepting traffic
    pub applied: bool,
    /// Human readable state message
    pub message: String,
}

/// AdBlockModel is the capability set shared by every blocking method.
///
/// All methods take `&self`; implementations synchronize internally so a
/// model can be shared between packet-handling threads and the UI tier.
pub trait AdBlockModel: Send + Sync {
    /// Get the blocking method implemented by this model.
    fn method(&self) -> AdBlockMethod;

    /// Activate blocking.
    ///
    /// Fails with [`Error::BackendStartFailed`] if the backend could not be
    /// started. No retry is attempted.
    fn apply(&self) -> Result<()>;

    /// Deactivate blocking.
    ///
    /// The applied flag is cleared even when stopping the backend fails; the
    /// stop failure is still returned.
    fn revert(&self) -> Result<()>;

    /// Get the current observable state.
    fn status(&self) -> ModelStatus;

    /// Subscribe to state changes.
    ///
    /// The receiver immediately gets the current state, then every change.
    fn subscribe(&self) -> Receiver<ModelStatus>;

    /// Whether the backend is currently applied.
    fn is_applied(&self) -> bool {
        self.status().applied
    }

    /// Classify a host observed on the network, recording it if enabled.
    ///
    /// Works regardless of the lifecycle state.
    fn get_entry(&self, host: &str) -> Option<HostEntry>;

    /// Whether observed hosts are being recorded.
    fn is_recording_logs(&self) -> bool;

    /// Enable or disable recording and persist the choice.
    fn set_recording_logs(&self, recording: bool) -> Result<()>;

    /// Get a copy of the recorded hosts in insertion order.
    fn logs(&self) -> Vec<String>;

    /// Remove every recorded host.
    fn clear_logs(&self);

    /// Drop the cached classification of a single host.
    fn clear_block_cache(&self, host: &str);

    /// Release cached state before this model is replaced.
    fn teardown(&self) {}
}

/// Build the model for `method`.
pub fn build_model(
    method: AdBlockMethod,
    store: Arc<dyn crate::RuleStore>,
    backend: Arc<dyn Backend>,
    settings: Arc<dyn crate::SettingsStore>,
    vpn_config: &VpnConfig,
) -> Arc<dyn AdBlockModel> {
    match method {
        AdBlockMethod::Vpn => Arc::new(VpnModel::new(store, backend, settings, vpn_config.clone())),
        AdBlockMethod::Root => Arc::new(RootModel::new(store, backend)),
    }
}

/// State messages shown for each transition.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StateMessages {
    pub applied: &'static str,
    pub reverted: &'static str,
    pub failed: &'static str,
}

/// Apply/revert state machine shared by every model.
pub(crate) struct Lifecycle {
    method: AdBlockMethod,
    backend: Arc<dyn Backend>,
    messages: StateMessages,
    status: RwLock<ModelStatus>,
    subscribers: Mutex<Vec<Sender<ModelStatus>>>,
    /// Serializes apply and revert
    transition: Mutex<()>,
}

impl Lifecycle {
    /// Create a lifecycle whose applied flag reflects the backend's current state.
    pub fn new(method: AdBlockMethod, backend: Arc<dyn Backend>, messages: StateMessages) -> Self {
        let applied = backend.is_running();
        let state = if applied {
            LifecycleState::Applied
        } else {
            LifecycleState::Reverted
        };
        Self {
            method,
            backend,
            messages,
            status: RwLock::new(ModelStatus {
                method,
                state,
                applied,
                message: String::new(),
            }),
            subscribers: Mutex::new(Vec::new()),
            transition: Mutex::new(()),
        }
    }

    /// Start the backend, running `prepare` first.
    pub fn apply(&self, prepare: impl FnOnce()) -> Result<()> {
        let _transition = self.transition.lock();

        prepare();
        self.publish(LifecycleState::Applying, self.is_applied(), None);

        if self.backend.start() {
            self.publish(LifecycleState::Applied, true, Some(self.messages.applied));
            log::info!("Applied {} blocking", self.method);
            Ok(())
        } else {
            self.publish(LifecycleState::Error, false, Some(self.messages.failed));
            log::error!("Failed to start {} blocking backend", self.method);
            Err(Error::BackendStartFailed(self.method))
        }
    }

    /// Stop the backend. The applied flag is cleared whatever the outcome.
    pub fn revert(&self) -> Result<()> {
        let _transition = self.transition.lock();

        let stopped = self.backend.stop();
        self.publish(LifecycleState::Reverted, false, Some(self.messages.reverted));

        match stopped {
            Ok(()) => {
                log::info!("Reverted {} blocking", self.method);
                Ok(())
            }
            Err(e) => {
                log::warn!("Reverted {} blocking with stop failure: {}", self.method, e);
                Err(e)
            }
        }
    }

    pub fn status(&self) -> ModelStatus {
        self.status.read().clone()
    }

    pub fn is_applied(&self) -> bool {
        self.status.read().applied
    }

    pub fn subscribe(&self) -> Receiver<ModelStatus> {
        let (tx, rx) = mpsc::channel();
        // Hold the subscriber lock so no change is published in between
        let mut subscribers = self.subscribers.lock();
        let _ = tx.send(self.status());
        subscribers.push(tx);
        rx
    }

    fn publish(&self, state: LifecycleState, applied: bool, message: Option<&str>) {
        let mut subscribers = self.subscribers.lock();
        let snapshot = {
            let mut status = self.status.write();
            status.state = state;
            status.applied = applied;
            if let Some(message) = message {
                status.message = message.to_string();
            }
            status.clone()
        };
        // Drop subscribers whose receiver is gone
        subscribers.retain(|tx| tx.send(snapshot.clone()).is_ok());
    }
}
