//! Blocking backend collaborators.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::{Error, Result};

/// Backend is the platform mechanism enforcing blocking (packet
/// interception or system-level filtering).
pub trait Backend: Send + Sync {
    /// Start the backend. Returns `true` on success.
    fn start(&self) -> bool;

    /// Stop the backend.
    fn stop(&self) -> Result<()>;

    /// Check whether the backend is currently active.
    fn is_running(&self) -> bool;
}

/// In-process backend that only tracks its running state.
///
/// Start and stop failures can be scripted, which makes it suitable for
/// driving the lifecycle without a platform service.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    running: AtomicBool,
    fail_start: AtomicBool,
    stop_error: Mutex<Option<String>>,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl MemoryBackend {
    /// Create a stopped backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend that is already running.
    pub fn running() -> Self {
        let backend = Self::default();
        backend.running.store(true, Ordering::SeqCst);
        backend
    }

    /// Make subsequent start calls fail (or succeed again).
    pub fn fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent stop calls fail with `reason`, or succeed with `None`.
    ///
    /// A failing stop still leaves the backend stopped.
    pub fn fail_stop(&self, reason: Option<&str>) {
        *self.stop_error.lock() = reason.map(str::to_string);
    }

    /// Number of start calls so far.
    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    /// Number of stop calls so far.
    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl Backend for MemoryBackend {
    fn start(&self) -> bool {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_start.load(Ordering::SeqCst) {
            return false;
        }
        self.running.store(true, Ordering::SeqCst);
        true
    }

    fn stop(&self) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
        match self.stop_error.lock().as_ref() {
            Some(reason) => Err(Error::BackendStopFailed(reason.clone())),
            None => Ok(()),
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_stop() {
        let backend = MemoryBackend::new();
        assert!(!backend.is_running());
        assert!(backend.start());
        assert!(backend.is_running());
        backend.stop().unwrap();
        assert!(!backend.is_running());
        assert_eq!(backend.start_count(), 1);
        assert_eq!(backend.stop_count(), 1);
    }

    #[test]
    fn test_scripted_failures() {
        let backend = MemoryBackend::new();
        backend.fail_start(true);
        assert!(!backend.start());
        assert!(!backend.is_running());

        let backend = MemoryBackend::running();
        backend.fail_stop(Some("service busy"));
        assert!(matches!(backend.stop(), Err(Error::BackendStopFailed(_))));
        assert!(!backend.is_running());
    }
}
