//! Completion notifier for asynchronous script evaluation.
//!
//! A [`ScriptNotifier`] is created per pending evaluation and handed to the
//! rendering engine. The engine's completion callback invokes
//! [`ScriptNotifier::set_result`] exactly once; the dispatcher awaits the
//! value with a bounded [`ScriptNotifier::wait`]. A completion that arrives
//! after the wait has timed out is ignored harmlessly.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;
use tokio::time;
use tracing::debug;

use crate::error::{Error, Result};

// ============================================================================
// ScriptNotifier
// ============================================================================

/// Shared notifier state.
struct NotifierInner {
    /// Completion flag; set exactly once.
    completed: AtomicBool,
    /// The evaluation result, present once completed.
    result: Mutex<Option<Value>>,
    /// Wakes waiters on completion.
    notify: Notify,
}

/// Bridges an asynchronous script-completion signal to a bounded await.
#[derive(Clone)]
pub struct ScriptNotifier {
    inner: Arc<NotifierInner>,
}

impl ScriptNotifier {
    /// Creates a notifier for one pending evaluation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(NotifierInner {
                completed: AtomicBool::new(false),
                result: Mutex::new(None),
                notify: Notify::new(),
            }),
        }
    }

    /// Returns `true` once the completion callback has fired.
    #[inline]
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.inner.completed.load(Ordering::Acquire)
    }

    /// Records the evaluation result and wakes waiters.
    ///
    /// Only the first call takes effect; later calls (e.g. a completion
    /// arriving after the waiter already timed out and moved on) are
    /// ignored. Returns `true` if the result was accepted.
    pub fn set_result(&self, value: Value) -> bool {
        if self.inner.completed.swap(true, Ordering::AcqRel) {
            debug!("Ignoring late script completion");
            return false;
        }
        *self.inner.result.lock() = Some(value);
        self.inner.notify.notify_waiters();
        true
    }

    /// Takes the result, if completed.
    #[must_use]
    pub fn take_result(&self) -> Option<Value> {
        if self.is_completed() {
            self.inner.result.lock().take()
        } else {
            None
        }
    }

    /// Waits for the result, up to `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the completion signal does not arrive
    /// within the bound.
    pub async fn wait(&self, timeout: Duration) -> Result<Value> {
        let deadline = time::Instant::now() + timeout;
        loop {
            // Register interest before checking the flag so a completion
            // between the check and the await is not lost.
            let notified = self.inner.notify.notified();
            if self.is_completed() {
                return Ok(self.inner.result.lock().take().unwrap_or(Value::Null));
            }
            if time::timeout_at(deadline, notified).await.is_err() {
                return Err(Error::timeout(
                    "script evaluation",
                    timeout.as_millis() as u64,
                ));
            }
        }
    }
}

impl Default for ScriptNotifier {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[tokio::test]
    async fn test_wait_returns_result() {
        let notifier = ScriptNotifier::new();
        let waiter = notifier.clone();

        let handle = tokio::spawn(async move { waiter.wait(Duration::from_secs(1)).await });
        tokio::task::yield_now().await;
        assert!(notifier.set_result(json!({"ok": true})));

        let value = handle.await.unwrap().unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_result_before_wait() {
        let notifier = ScriptNotifier::new();
        notifier.set_result(json!(42));
        assert!(notifier.is_completed());

        let value = notifier.wait(Duration::from_millis(10)).await.unwrap();
        assert_eq!(value, json!(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out() {
        let notifier = ScriptNotifier::new();
        let err = notifier.wait(Duration::from_millis(50)).await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_completion_is_ignored() {
        let notifier = ScriptNotifier::new();
        let err = notifier.wait(Duration::from_millis(10)).await.unwrap_err();
        assert!(err.is_timeout());

        // The engine reports completion after the caller gave up.
        assert!(notifier.set_result(json!(1)));
        assert!(!notifier.set_result(json!(2)));
        assert_eq!(notifier.take_result(), Some(json!(1)));
    }

    #[test]
    fn test_take_result_before_completion() {
        let notifier = ScriptNotifier::new();
        assert_eq!(notifier.take_result(), None);
    }
}
