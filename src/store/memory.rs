//! In-memory rule store implementation.

use ahash::AHashMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{normalize_rule_key, RuleStore, UserOverride, UserRuleEditor};
use crate::{Classification, Result};

/// MemoryRuleStore keeps source rules and user overrides in hash maps.
///
/// Enabled user overrides take precedence over source rules on lookup.
/// Disabled overrides are listed but never matched.
///
/// # Rule Text Format
///
/// ```text
/// # comment
/// [list=BLOCKED]
/// ads.example.com
/// *.tracker.net
///
/// [list=REDIRECTED]
/// local.test 127.0.0.1
///
/// [list=ALLOWED,source=user]
/// good.example.com
///
/// [list=BLOCKED,source=user,disable]
/// off.example.com
/// ```
///
/// # Examples
/// ```
/// use hostshield::{Classification, MemoryRuleStore, RuleStore};
///
/// let store = MemoryRuleStore::new();
/// store.add_rule("*.tracker.net", Classification::Blocked).unwrap();
/// assert_eq!(
///     store.lookup_exact("*.tracker.net").unwrap(),
///     Some(Classification::Blocked)
/// );
/// ```
#[derive(Default)]
pub struct MemoryRuleStore {
    /// Source rules keyed by lowercase host or wildcard key
    rules: RwLock<AHashMap<String, Classification>>,
    /// User overrides keyed by lowercase host
    overrides: RwLock<AHashMap<String, UserOverride>>,
    /// Number of exact lookups served
    lookups: AtomicU64,
}

impl MemoryRuleStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store by parsing rules from a reader.
    ///
    /// Malformed and non UTF-8 lines are skipped. A read failure is returned.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let store = Self::new();
        store.parse_rules(reader)?;
        Ok(store)
    }

    /// Load a store from a rule text file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let store = Self::from_reader(file)?;
        log::info!(
            "Loaded {} rules and {} user overrides from {:?}",
            store.len(),
            store.user_override_count(),
            path
        );
        Ok(store)
    }

    /// Parse rules from a reader and add them to this store.
    fn parse_rules<R: Read>(&self, reader: R) -> Result<()> {
        let mut buf_reader = BufReader::new(reader);
        let mut section: Option<Section> = None;

        let mut raw = Vec::new();
        let mut line_number = 0usize;

        loop {
            raw.clear();
            if buf_reader.read_until(b'\n', &mut raw)? == 0 {
                break;
            }
            line_number += 1;
            let line = match std::str::from_utf8(&raw) {
                Ok(l) => l,
                Err(_) => {
                    log::debug!("Skipping non UTF-8 rule line {}", line_number);
                    continue;
                }
            };

            // Remove comments
            let line = match line.find('#') {
                Some(idx) => &line[..idx],
                None => line,
            };
            let line = line.trim();

            if line.is_empty() {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                let params = parse_header_params(&line[1..line.len() - 1]);
                section = Section::from_params(&params);
                if section.is_none() {
                    log::debug!("Skipping section with unknown list type: {}", line);
                }
                continue;
            }

            let Some(ref section) = section else {
                continue;
            };

            let parts: Vec<&str> = line.split_whitespace().collect();
            let classification = match (section.list.as_str(), parts.as_slice()) {
                ("REDIRECTED", [_, target]) => Classification::redirect(*target),
                ("REDIRECTED", [_]) => match section.target {
                    Some(ref target) => Classification::redirect(target.as_str()),
                    None => {
                        log::debug!("Skipping redirection without target: {}", line);
                        continue;
                    }
                },
                (list, [_]) => match Classification::parse_list(list) {
                    Some(c) => c,
                    None => continue,
                },
                _ => {
                    log::debug!("Skipping malformed rule line: {}", line);
                    continue;
                }
            };
            let host = parts[0];

            let added = if section.user {
                self.insert_override(host, classification, !section.disabled)
            } else {
                self.add_rule(host, classification)
            };
            if let Err(e) = added {
                log::debug!("Skipping rule line: {}", e);
            }
        }
        Ok(())
    }

    /// Add or replace a source rule.
    pub fn add_rule(&self, pattern: &str, classification: Classification) -> Result<()> {
        let key = normalize_rule_key(pattern)?;
        self.rules.write().insert(key, classification);
        Ok(())
    }

    /// Remove a source rule.
    pub fn remove_rule(&self, pattern: &str) -> bool {
        self.rules.write().remove(&pattern.trim().to_lowercase()).is_some()
    }

    /// Insert or replace a user override with an explicit enabled flag.
    pub fn insert_override(
        &self,
        pattern: &str,
        classification: Classification,
        enabled: bool,
    ) -> Result<()> {
        let key = normalize_rule_key(pattern)?;
        let item = UserOverride::new(key.clone(), classification).with_enabled(enabled);
        self.overrides.write().insert(key, item);
        Ok(())
    }

    /// Get the number of source rules.
    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    /// Check if the store has no source rules.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the number of user overrides, enabled or not.
    pub fn user_override_count(&self) -> usize {
        self.overrides.read().len()
    }

    /// Get the number of exact lookups served so far.
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }
}

impl RuleStore for MemoryRuleStore {
    fn lookup_exact(&self, host: &str) -> Result<Option<Classification>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let key = host.to_lowercase();

        if let Some(item) = self.overrides.read().get(&key) {
            if item.enabled {
                return Ok(Some(item.classification.clone()));
            }
        }

        Ok(self.rules.read().get(&key).cloned())
    }

    fn list_user_overrides(&self) -> Result<Vec<UserOverride>> {
        let mut items: Vec<UserOverride> = self.overrides.read().values().cloned().collect();
        items.sort_by(|a, b| a.host.cmp(&b.host));
        Ok(items)
    }
}

impl UserRuleEditor for MemoryRuleStore {
    fn upsert_user_rule(&self, host: &str, classification: Classification) -> Result<()> {
        self.insert_override(host, classification, true)
    }

    fn remove_user_rule(&self, host: &str) -> Result<bool> {
        Ok(self
            .overrides
            .write()
            .remove(&host.trim().to_lowercase())
            .is_some())
    }
}

/// Section header state while parsing rule text.
struct Section {
    list: String,
    target: Option<String>,
    user: bool,
    disabled: bool,
}

impl Section {
    fn from_params(params: &HashMap<String, String>) -> Option<Self> {
        let list = params.get("list")?.to_uppercase();
        if list != "REDIRECTED" && Classification::parse_list(&list).is_none() {
            return None;
        }

        let user = params
            .get("source")
            .map(|s| s.eq_ignore_ascii_case("user"))
            .unwrap_or(false);
        let disabled = params
            .get("disable")
            .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0" | "f" | "no"))
            .unwrap_or(false);

        Some(Self {
            list,
            target: params.get("target").cloned(),
            user,
            disabled,
        })
    }
}

/// Parse header parameters from a string like "list=BLOCKED,source=user"
fn parse_header_params(content: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    for part in content.split(',') {
        let part = part.trim();
        if let Some(eq_pos) = part.find('=') {
            let key = part[..eq_pos].trim().to_lowercase();
            let value = part[eq_pos + 1..].trim().to_string();
            params.insert(key, value);
        } else {
            // Key without value (like "disable")
            params.insert(part.to_lowercase(), String::new());
        }
    }

    params
}
