//! hostshield - A local DNS ad-blocking decision engine.
//!
//! This crate decides, for every host name observed on a device's network
//! traffic, whether it is allowed, blocked or redirected. It is built for a
//! hot path called thousands of times per second.
//!
//! # Features
//!
//! - **Host resolution cache**: LRU cache in front of the rule store
//! - **Wildcard rules**: `*.example.com` matches every subdomain of `example.com`
//! - **Query log**: insertion-ordered record of observed hosts, gated by a recording flag
//! - **Lifecycle models**: apply/revert state machine per blocking method
//! - **Thread-safe**: all operations take `&self` and synchronize internally
//!
//! # Quick Start
//!
//! ```
//! use hostshield::{
//!     AdBlockModel, Classification, MemoryBackend, MemoryRuleStore, MemorySettingsStore,
//!     VpnConfig, VpnModel,
//! };
//! use std::sync::Arc;
//!
//! let store = MemoryRuleStore::new();
//! store.add_rule("*.tracker.net", Classification::Blocked).unwrap();
//!
//! let model = VpnModel::new(
//!     Arc::new(store),
//!     Arc::new(MemoryBackend::new()),
//!     Arc::new(MemorySettingsStore::default()),
//!     VpnConfig::default(),
//! );
//!
//! model.apply().unwrap();
//! let entry = model.get_entry("a.tracker.net").unwrap();
//! assert_eq!(entry.classification, Classification::Blocked);
//! assert!(model.get_entry("safe.com").is_none());
//! ```
//!
//! # Resolution Order
//!
//! On cache miss a host is resolved against the rule store by:
//! 1. Exact match of the host
//! 2. Wildcard keys from the most to the least specific (`*.a.b.c`, `*.b.c`, `*.c`)
//! 3. Unclassified, which is not cached

mod classification;
mod error;
mod method;

pub mod backend;
pub mod cache;
pub mod manager;
pub mod model;
pub mod query_log;
pub mod report;
pub mod settings;
pub mod store;

// Re-export core types
pub use classification::{Classification, HostEntry};
pub use error::{Error, Result};
pub use method::{available_methods, AdBlockMethod, MethodInfo};

// Re-export collaborators
pub use backend::{Backend, MemoryBackend};
pub use settings::{JsonSettingsStore, MemorySettingsStore, Settings, SettingsStore};
pub use store::{MemoryRuleStore, RuleStore, UserOverride, UserRuleEditor};

// Re-export the engine
pub use cache::{CacheConfig, CacheStats, HostCache};
pub use manager::{AdBlockManager, BackendFactory};
pub use model::{AdBlockModel, LifecycleState, ModelStatus, RootModel, VpnConfig, VpnModel};
pub use query_log::QueryLog;
pub use report::{LogEntry, LogEntrySort, LogReport};
