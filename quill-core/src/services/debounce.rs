//! Debounced saves
//!
//! Editors call `debounce` on every keystroke; only the last call for a key
//! within the delay window actually runs. Must be used inside a tokio
//! runtime.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::AbortHandle;

/// Delay used by `SaveDebouncer::default`
pub const DEFAULT_SAVE_DELAY: Duration = Duration::from_millis(1000);

type PendingMap = HashMap<String, (u64, AbortHandle)>;

/// Per-key registry of cancellable delayed tasks
pub struct SaveDebouncer {
    delay: Duration,
    pending: Arc<Mutex<PendingMap>>,
    next_ticket: AtomicU64,
}

impl Default for SaveDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_SAVE_DELAY)
    }
}

impl SaveDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_ticket: AtomicU64::new(0),
        }
    }

    /// Schedule `task` to run after the delay, replacing any task still
    /// waiting under `key`.
    ///
    /// Once a task starts running it is no longer pending and a later call
    /// will not abort it.
    pub fn debounce<F>(&self, key: impl Into<String>, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let key = key.into();
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let delay = self.delay;
        let pending = Arc::clone(&self.pending);
        let task_key = key.clone();

        // Hold the lock across spawn so the task cannot clear its slot
        // before it has been registered
        let mut map = lock(&self.pending);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut map = lock(&pending);
                match map.get(&task_key) {
                    Some((current, _)) if *current == ticket => {
                        map.remove(&task_key);
                    }
                    // Superseded between wake-up and here
                    _ => return,
                }
            }
            task.await;
        });

        if let Some((_, previous)) = map.insert(key, (ticket, handle.abort_handle())) {
            previous.abort();
        }
    }

    /// Cancel the task waiting under `key`. Returns false if there was none.
    pub fn cancel(&self, key: &str) -> bool {
        match lock(&self.pending).remove(key) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Number of keys with a task still waiting
    pub fn pending(&self) -> usize {
        lock(&self.pending).len()
    }
}

impl Drop for SaveDebouncer {
    fn drop(&mut self) {
        for (_, (_, handle)) in lock(&self.pending).drain() {
            handle.abort();
        }
    }
}

fn lock(pending: &Mutex<PendingMap>) -> MutexGuard<'_, PendingMap> {
    // The map stays consistent even if a holder panicked
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
