//! Rule store collaborators.
//!
//! The host cache and the lifecycle models only ever read rules through the
//! [`RuleStore`] trait. Editing user rules goes through [`UserRuleEditor`],
//! whose callers are responsible for invalidating the host cache afterwards.

mod memory;

pub use memory::MemoryRuleStore;

use crate::{Classification, Result};

/// A user-defined override of a host classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserOverride {
    pub host: String,
    pub classification: Classification,
    pub enabled: bool,
}

impl UserOverride {
    /// Create an enabled override.
    pub fn new(host: impl Into<String>, classification: Classification) -> Self {
        Self {
            host: host.into(),
            classification,
            enabled: true,
        }
    }

    /// Set whether this override is enabled.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// RuleStore provides read access to the host rule table.
///
/// Implementations are expected to be local and fast, but a lookup may still
/// fail transiently (for example a locked database); such failures are
/// reported as [`crate::Error::RuleStoreUnavailable`].
pub trait RuleStore: Send + Sync {
    /// Look up the classification of an exact rule key.
    ///
    /// Wildcard rules are looked up with their literal `*.suffix` key.
    fn lookup_exact(&self, host: &str) -> Result<Option<Classification>>;

    /// List the user-defined overrides, enabled or not.
    fn list_user_overrides(&self) -> Result<Vec<UserOverride>>;
}

/// UserRuleEditor mutates user-defined overrides.
pub trait UserRuleEditor: RuleStore {
    /// Insert or replace the user override for `host`.
    fn upsert_user_rule(&self, host: &str, classification: Classification) -> Result<()>;

    /// Remove the user override for `host`.
    ///
    /// Returns `true` if an override was removed.
    fn remove_user_rule(&self, host: &str) -> Result<bool>;
}

/// Normalize and validate a rule key.
///
/// Accepts plain host names (`ads.example.com`) and wildcard keys
/// (`*.example.com`). Keys are stored lowercase.
pub(crate) fn normalize_rule_key(pattern: &str) -> Result<String> {
    let key = pattern.trim().to_lowercase();

    if key.is_empty() || key.chars().any(char::is_whitespace) {
        return Err(crate::Error::InvalidRule(pattern.to_string()));
    }

    if let Some(suffix) = key.strip_prefix('*') {
        // Wildcards need a non-empty dotted suffix: "*." and "*com" are rejected
        let valid = suffix.len() > 1 && suffix.starts_with('.') && !suffix[1..].contains('*');
        if !valid {
            return Err(crate::Error::InvalidRule(pattern.to_string()));
        }
    } else if key.contains('*') || key.starts_with('.') || key.ends_with('.') {
        return Err(crate::Error::InvalidRule(pattern.to_string()));
    }

    Ok(key)
}
