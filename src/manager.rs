//! Active model management.
//!
//! [`AdBlockManager`] holds the single live [`AdBlockModel`] and keeps it in
//! line with the persisted blocking method. There is no process-wide state:
//! the query log belongs to the model, so rebuilding the model for another
//! method starts from an empty log.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::model::{build_model, AdBlockModel, VpnConfig};
use crate::report::{LogEntrySort, LogReport};
use crate::settings::SettingsStore;
use crate::store::{RuleStore, UserRuleEditor};
use crate::{AdBlockMethod, Classification};

/// Factory creating the backend for a blocking method.
pub type BackendFactory = Box<dyn Fn(AdBlockMethod) -> Arc<dyn Backend> + Send + Sync>;

/// Owner of the active ad-block model.
///
/// # Example
///
/// ```
/// use hostshield::{
///     AdBlockManager, AdBlockMethod, Backend, MemoryBackend, MemoryRuleStore, MemorySettingsStore,
/// };
/// use std::sync::Arc;
///
/// let manager = AdBlockManager::new(
///     Arc::new(MemoryRuleStore::new()),
///     Arc::new(MemorySettingsStore::default()),
///     Box::new(|_: AdBlockMethod| -> Arc<dyn Backend> { Arc::new(MemoryBackend::new()) }),
/// );
///
/// let model = manager.current();
/// assert_eq!(model.method(), AdBlockMethod::Vpn);
/// model.apply().unwrap();
/// ```
pub struct AdBlockManager {
    store: Arc<dyn RuleStore>,
    editor: Option<Arc<dyn UserRuleEditor>>,
    settings: Arc<dyn SettingsStore>,
    backends: BackendFactory,
    vpn_config: VpnConfig,
    current: RwLock<Option<Arc<dyn AdBlockModel>>>,
}

impl AdBlockManager {
    /// Create a manager. No model is built until first requested.
    pub fn new(
        store: Arc<dyn RuleStore>,
        settings: Arc<dyn SettingsStore>,
        backends: BackendFactory,
    ) -> Self {
        Self {
            store,
            editor: None,
            settings,
            backends,
            vpn_config: VpnConfig::default(),
            current: RwLock::new(None),
        }
    }

    /// Enable user rule editing.
    ///
    /// The editor must write to the same rule table as the manager's store.
    pub fn with_editor(mut self, editor: Arc<dyn UserRuleEditor>) -> Self {
        self.editor = Some(editor);
        self
    }

    /// Set the configuration used for VPN models.
    pub fn with_vpn_config(mut self, config: VpnConfig) -> Self {
        self.vpn_config = config;
        self
    }

    /// Get the model for the configured blocking method.
    ///
    /// The model is rebuilt when the configured method changed since it was
    /// built. The previous model is torn down first.
    pub fn current(&self) -> Arc<dyn AdBlockModel> {
        let method = self.settings.active_method();

        if let Some(model) = self.current.read().as_ref() {
            if model.method() == method {
                return Arc::clone(model);
            }
        }

        let mut guard = self.current.write();
        // Another caller may have rebuilt it meanwhile
        if let Some(model) = guard.as_ref() {
            if model.method() == method {
                return Arc::clone(model);
            }
        }

        if let Some(previous) = guard.take() {
            log::debug!(
                "Replacing {} model with {} model",
                previous.method(),
                method
            );
            previous.teardown();
        }

        let model = build_model(
            method,
            Arc::clone(&self.store),
            (self.backends)(method),
            Arc::clone(&self.settings),
            &self.vpn_config,
        );
        log::info!("Built {} ad-block model", method);
        *guard = Some(Arc::clone(&model));
        model
    }

    /// Persist a new blocking method and get its model.
    pub fn switch_method(&self, method: AdBlockMethod) -> Result<Arc<dyn AdBlockModel>> {
        self.settings.set_active_method(method)?;
        Ok(self.current())
    }

    /// Get the configured blocking method.
    pub fn active_method(&self) -> AdBlockMethod {
        self.settings.active_method()
    }

    /// Add or replace a user rule and make it effective immediately.
    pub fn add_user_rule(&self, host: &str, classification: Classification) -> Result<()> {
        let editor = self.editor()?;
        editor.upsert_user_rule(host, classification)?;
        self.current().clear_block_cache(host.trim());
        Ok(())
    }

    /// Remove a user rule and make the removal effective immediately.
    pub fn remove_user_rule(&self, host: &str) -> Result<bool> {
        let editor = self.editor()?;
        let removed = editor.remove_user_rule(host)?;
        self.current().clear_block_cache(host.trim());
        Ok(removed)
    }

    /// Build a report of the current model's query log.
    pub fn report(&self, sort: LogEntrySort) -> Result<LogReport> {
        let logs = self.current().logs();
        LogReport::build(&logs, self.store.as_ref(), sort)
    }

    fn editor(&self) -> Result<&Arc<dyn UserRuleEditor>> {
        self.editor
            .as_ref()
            .ok_or(Error::Unsupported("rule store does not accept user rules"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::settings::MemorySettingsStore;
    use crate::store::MemoryRuleStore;

    fn manager() -> (Arc<MemoryRuleStore>, Arc<MemorySettingsStore>, AdBlockManager) {
        let store = Arc::new(MemoryRuleStore::new());
        store.add_rule("ads.example.com", Classification::Blocked).unwrap();
        let settings = Arc::new(MemorySettingsStore::default());
        settings.set_recording_enabled(true).unwrap();
        let manager = AdBlockManager::new(
            store.clone(),
            settings.clone(),
            Box::new(|_: AdBlockMethod| -> Arc<dyn Backend> { Arc::new(MemoryBackend::new()) }),
        )
        .with_editor(store.clone());
        (store, settings, manager)
    }

    #[test]
    fn test_current_is_reused() {
        let (_, _, manager) = manager();
        let a = manager.current();
        let b = manager.current();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_rebuild_on_persisted_method_change() {
        let (_, settings, manager) = manager();
        let vpn = manager.current();
        assert_eq!(vpn.method(), AdBlockMethod::Vpn);

        settings.set_active_method(AdBlockMethod::Root).unwrap();
        let root = manager.current();
        assert_eq!(root.method(), AdBlockMethod::Root);
        assert!(!Arc::ptr_eq(&vpn, &root));
    }

    #[test]
    fn test_switch_tears_down_previous_log() {
        let (_, settings, manager) = manager();
        let old = manager.current();
        old.get_entry("ads.example.com");
        assert_eq!(old.logs().len(), 1);

        manager.switch_method(AdBlockMethod::Root).unwrap();
        assert_eq!(settings.active_method(), AdBlockMethod::Root);
        assert!(old.logs().is_empty());

        // Stale handle no longer records
        old.get_entry("late.example.com");
        assert!(old.logs().is_empty());

        let fresh = manager.switch_method(AdBlockMethod::Vpn).unwrap();
        assert!(fresh.logs().is_empty());
        assert!(fresh.is_recording_logs());
    }

    #[test]
    fn test_user_rule_takes_effect_immediately() {
        let (_, _, manager) = manager();
        let model = manager.current();
        assert_eq!(
            model.get_entry("ads.example.com").unwrap().classification,
            Classification::Blocked
        );

        manager
            .add_user_rule("ads.example.com", Classification::Allowed)
            .unwrap();
        assert_eq!(
            model.get_entry("ads.example.com").unwrap().classification,
            Classification::Allowed
        );

        assert!(manager.remove_user_rule("ads.example.com").unwrap());
        assert_eq!(
            model.get_entry("ads.example.com").unwrap().classification,
            Classification::Blocked
        );
    }

    #[test]
    fn test_user_rule_edit_ignores_letter_case() {
        let (_, _, manager) = manager();
        let model = manager.current();
        model.get_entry("ads.example.com");
        model.get_entry("ADS.example.com");

        manager
            .add_user_rule("Ads.Example.com", Classification::Allowed)
            .unwrap();
        for host in ["ads.example.com", "ADS.example.com"] {
            assert_eq!(
                model.get_entry(host).unwrap().classification,
                Classification::Allowed
            );
        }

        assert!(manager.remove_user_rule("ADS.EXAMPLE.COM").unwrap());
        for host in ["ads.example.com", "ADS.example.com"] {
            assert_eq!(
                model.get_entry(host).unwrap().classification,
                Classification::Blocked
            );
        }
    }

    #[test]
    fn test_user_rule_without_editor() {
        let manager = AdBlockManager::new(
            Arc::new(MemoryRuleStore::new()),
            Arc::new(MemorySettingsStore::default()),
            Box::new(|_: AdBlockMethod| -> Arc<dyn Backend> { Arc::new(MemoryBackend::new()) }),
        );
        assert!(matches!(
            manager.add_user_rule("a.com", Classification::Blocked),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn test_report() {
        let (_, _, manager) = manager();
        let model = manager.current();
        model.get_entry("safe.com");
        model.get_entry("ads.example.com");

        let report = manager.report(LogEntrySort::Alphabetical).unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report.entries()[0].host, "ads.example.com");
        assert_eq!(
            report.entries()[0].classification,
            Some(Classification::Blocked)
        );
        assert_eq!(report.entries()[1].classification, None);
    }
}
