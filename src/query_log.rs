//! Query log of observed host names.

use ahash::AHashSet;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

/// Insertion-ordered set of host names observed while recording.
///
/// A host already present is not inserted again, so the log keeps the
/// position of its first observation. The log is unbounded unless created
/// with [`QueryLog::with_capacity`], in which case the oldest host is
/// dropped to make room.
#[derive(Debug, Default)]
pub struct QueryLog {
    hosts: Mutex<LogSet>,
    recording: AtomicBool,
    capacity: Option<usize>,
}

#[derive(Debug, Default)]
struct LogSet {
    order: VecDeque<String>,
    index: AHashSet<String>,
}

impl QueryLog {
    /// Create an unbounded log.
    pub fn new(recording: bool) -> Self {
        Self {
            hosts: Mutex::new(LogSet::default()),
            recording: AtomicBool::new(recording),
            capacity: None,
        }
    }

    /// Create a log keeping at most `capacity` hosts.
    pub fn with_capacity(recording: bool, capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::new(recording)
        }
    }

    /// Record a host if recording is enabled.
    ///
    /// Returns `true` if the host was inserted.
    pub fn record(&self, host: &str) -> bool {
        if !self.recording.load(Ordering::Relaxed) {
            return false;
        }

        let mut hosts = self.hosts.lock();
        if hosts.index.contains(host) {
            return false;
        }
        if let Some(capacity) = self.capacity {
            while hosts.order.len() >= capacity {
                if let Some(oldest) = hosts.order.pop_front() {
                    hosts.index.remove(&oldest);
                }
            }
        }
        hosts.index.insert(host.to_string());
        hosts.order.push_back(host.to_string());
        true
    }

    /// Get a copy of the recorded hosts in insertion order.
    pub fn snapshot(&self) -> Vec<String> {
        self.hosts.lock().order.iter().cloned().collect()
    }

    /// Remove every recorded host.
    pub fn clear(&self) {
        let mut hosts = self.hosts.lock();
        hosts.order.clear();
        hosts.index.clear();
    }

    /// Check whether recording is enabled.
    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::Relaxed)
    }

    /// Enable or disable recording. Affects future calls to [`QueryLog::record`] only.
    pub fn set_recording(&self, recording: bool) {
        self.recording.store(recording, Ordering::Relaxed);
    }

    /// Get the number of recorded hosts.
    pub fn len(&self) -> usize {
        self.hosts.lock().order.len()
    }

    /// Check if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the capacity bound, if any.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_recording_disabled() {
        let log = QueryLog::new(false);
        for _ in 0..10 {
            assert!(!log.record("ads.example.com"));
        }
        assert!(log.is_empty());
    }

    #[test]
    fn test_deduplicated_insertion_order() {
        let log = QueryLog::new(true);
        log.record("b.com");
        log.record("a.com");
        log.record("b.com");
        log.record("c.com");

        assert_eq!(log.snapshot(), vec!["b.com", "a.com", "c.com"]);
    }

    #[test]
    fn test_toggle_recording() {
        let log = QueryLog::new(false);
        log.record("before.com");

        log.set_recording(true);
        assert!(log.is_recording());
        log.record("after.com");
        log.record("after.com");

        assert_eq!(log.snapshot(), vec!["after.com"]);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let log = QueryLog::new(true);
        log.record("a.com");
        let snapshot = log.snapshot();
        log.record("b.com");
        assert_eq!(snapshot.len(), 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_clear() {
        let log = QueryLog::new(true);
        log.record("a.com");
        log.clear();
        assert!(log.is_empty());

        // Cleared hosts can be recorded again
        assert!(log.record("a.com"));
    }

    #[test]
    fn test_bounded_log_drops_oldest() {
        let log = QueryLog::with_capacity(true, 2);
        log.record("a.com");
        log.record("b.com");
        log.record("c.com");

        assert_eq!(log.snapshot(), vec!["b.com", "c.com"]);
        assert_eq!(log.capacity(), Some(2));
        assert!(log.record("a.com"));
    }

    #[test]
    fn test_concurrent_record() {
        let log = Arc::new(QueryLog::new(true));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let log = Arc::clone(&log);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        log.record(&format!("h{}.example.com", (i * 7 + t) % 100));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = log.snapshot();
        let unique: AHashSet<&String> = snapshot.iter().collect();
        assert_eq!(unique.len(), snapshot.len());
        assert!(snapshot.len() <= 100);
    }
}
