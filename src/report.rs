//! Query log reporting.
//!
//! Turns the raw host names of a query log into classified, sorted entries
//! for display. Enabled user overrides win over the rule store, which is
//! only consulted for the exact host name.

use ahash::AHashMap;
use std::cmp::Ordering;
use std::fmt;

use crate::store::RuleStore;
use crate::{Classification, Result};

/// A logged host with its current classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub host: String,
    /// `None` when no exact rule applies
    pub classification: Option<Classification>,
}

impl LogEntry {
    /// Create a new LogEntry.
    pub fn new(host: impl Into<String>, classification: Option<Classification>) -> Self {
        Self {
            host: host.into(),
            classification,
        }
    }
}

/// Sort order for log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogEntrySort {
    /// Plain alphabetical order of host names
    Alphabetical,
    /// Group by top-level domain, then domain, then subdomains
    #[default]
    TopLevelDomain,
}

impl LogEntrySort {
    /// Parse a sort order from a string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "alphabetical" | "alpha" => Some(LogEntrySort::Alphabetical),
            "tld" | "top-level-domain" => Some(LogEntrySort::TopLevelDomain),
            _ => None,
        }
    }

    /// Get the display name.
    pub fn name(&self) -> &'static str {
        match self {
            LogEntrySort::Alphabetical => "Sorted alphabetically",
            LogEntrySort::TopLevelDomain => "Sorted by top level domain",
        }
    }

    /// Get the other sort order.
    pub fn toggled(self) -> Self {
        match self {
            LogEntrySort::Alphabetical => LogEntrySort::TopLevelDomain,
            LogEntrySort::TopLevelDomain => LogEntrySort::Alphabetical,
        }
    }

    /// Compare two entries.
    pub fn compare(&self, a: &LogEntry, b: &LogEntry) -> Ordering {
        match self {
            LogEntrySort::Alphabetical => a.host.cmp(&b.host),
            LogEntrySort::TopLevelDomain => a
                .host
                .rsplit('.')
                .cmp(b.host.rsplit('.'))
                .then_with(|| a.host.cmp(&b.host)),
        }
    }
}

impl fmt::Display for LogEntrySort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Classified and sorted view of a query log.
#[derive(Debug, Clone, Default)]
pub struct LogReport {
    entries: Vec<LogEntry>,
    sort: LogEntrySort,
}

impl LogReport {
    /// Build a report from logged hosts.
    pub fn build(logs: &[String], store: &dyn RuleStore, sort: LogEntrySort) -> Result<Self> {
        let overrides: AHashMap<String, Classification> = store
            .list_user_overrides()?
            .into_iter()
            .filter(|item| item.enabled)
            .map(|item| (item.host, item.classification))
            .collect();

        let mut entries = Vec::with_capacity(logs.len());
        for host in logs {
            let classification = match overrides.get(host) {
                Some(c) => Some(c.clone()),
                None => store.lookup_exact(host)?,
            };
            entries.push(LogEntry::new(host.as_str(), classification));
        }

        let mut report = Self { entries, sort };
        report.resort();
        log::debug!("Built log report with {} entries", report.len());
        Ok(report)
    }

    /// Get the entries in display order.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Get the current sort order.
    pub fn sort(&self) -> LogEntrySort {
        self.sort
    }

    /// Change the sort order.
    pub fn sort_by(&mut self, sort: LogEntrySort) {
        self.sort = sort;
        self.resort();
    }

    /// Switch between alphabetical and top-level-domain order.
    pub fn toggle_sort(&mut self) -> LogEntrySort {
        self.sort_by(self.sort.toggled());
        self.sort
    }

    /// Update the classification shown for `host` after a user rule edit.
    ///
    /// Returns `true` if the host is part of the report.
    pub fn update_entry(&mut self, host: &str, classification: Option<Classification>) -> bool {
        let mut found = false;
        for entry in self.entries.iter_mut().filter(|e| e.host == host) {
            entry.classification = classification.clone();
            found = true;
        }
        found
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the report is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn resort(&mut self) {
        let sort = self.sort;
        self.entries.sort_by(|a, b| sort.compare(a, b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRuleStore;

    fn hosts(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn report_hosts(report: &LogReport) -> Vec<&str> {
        report.entries().iter().map(|e| e.host.as_str()).collect()
    }

    #[test]
    fn test_alphabetical_sort() {
        let store = MemoryRuleStore::new();
        let logs = hosts(&["b.org", "a.net", "c.com"]);
        let report = LogReport::build(&logs, &store, LogEntrySort::Alphabetical).unwrap();
        assert_eq!(report_hosts(&report), vec!["a.net", "b.org", "c.com"]);
    }

    #[test]
    fn test_top_level_domain_sort() {
        let store = MemoryRuleStore::new();
        let logs = hosts(&["www.b.org", "a.net", "z.a.com", "b.org", "a.com"]);
        let report = LogReport::build(&logs, &store, LogEntrySort::TopLevelDomain).unwrap();
        assert_eq!(
            report_hosts(&report),
            vec!["a.com", "z.a.com", "a.net", "b.org", "www.b.org"]
        );
    }

    #[test]
    fn test_toggle_sort() {
        let store = MemoryRuleStore::new();
        let logs = hosts(&["a.org", "b.com"]);
        let mut report = LogReport::build(&logs, &store, LogEntrySort::default()).unwrap();
        assert_eq!(report_hosts(&report), vec!["b.com", "a.org"]);

        assert_eq!(report.toggle_sort(), LogEntrySort::Alphabetical);
        assert_eq!(report_hosts(&report), vec!["a.org", "b.com"]);
    }

    #[test]
    fn test_classification_sources() {
        let store = MemoryRuleStore::new();
        store.add_rule("ads.example.com", Classification::Blocked).unwrap();
        store.add_rule("*.tracker.net", Classification::Blocked).unwrap();
        store
            .insert_override("good.example.com", Classification::Allowed, true)
            .unwrap();
        store
            .insert_override("off.example.com", Classification::Blocked, false)
            .unwrap();

        let logs = hosts(&[
            "ads.example.com",
            "good.example.com",
            "off.example.com",
            "a.tracker.net",
        ]);
        let report = LogReport::build(&logs, &store, LogEntrySort::Alphabetical).unwrap();
        let classes: Vec<Option<Classification>> = report
            .entries()
            .iter()
            .map(|e| e.classification.clone())
            .collect();

        // a.tracker.net only matches through a wildcard, which reports don't walk
        assert_eq!(
            classes,
            vec![
                None,
                Some(Classification::Blocked),
                Some(Classification::Allowed),
                None,
            ]
        );
    }

    #[test]
    fn test_update_entry() {
        let store = MemoryRuleStore::new();
        let logs = hosts(&["a.com"]);
        let mut report = LogReport::build(&logs, &store, LogEntrySort::default()).unwrap();

        assert!(report.update_entry("a.com", Some(Classification::Blocked)));
        assert_eq!(
            report.entries()[0].classification,
            Some(Classification::Blocked)
        );
        assert!(!report.update_entry("b.com", None));
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!(LogEntrySort::parse("alpha"), Some(LogEntrySort::Alphabetical));
        assert_eq!(LogEntrySort::parse("TLD"), Some(LogEntrySort::TopLevelDomain));
        assert_eq!(LogEntrySort::parse("size"), None);
    }
}
