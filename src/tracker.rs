use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts in-flight and total units of work: served connections, queued mail
/// deliveries. Clones share the same counters.
#[derive(Clone, Debug, Default)]
pub struct ActivityTracker {
    active_count: Arc<AtomicUsize>,
    total_count: Arc<AtomicUsize>,
}

impl ActivityTracker {
    pub fn begin(&self) -> ActivityGuard {
        self.total_count.fetch_add(1, Ordering::SeqCst);
        self.active_count.fetch_add(1, Ordering::SeqCst);

        ActivityGuard {
            active_count: Arc::clone(&self.active_count),
        }
    }

    pub fn active(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.total_count.load(Ordering::Relaxed)
    }
}

/// RAII guard that decrements the active count on drop
#[derive(Debug)]
pub struct ActivityGuard {
    active_count: Arc<AtomicUsize>,
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
    }
}
