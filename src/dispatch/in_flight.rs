use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts requests currently awaiting a response and remembers the peak.
#[derive(Debug, Default)]
pub(super) struct InFlightTracker {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlightTracker {
    pub(super) fn acquire(&self) -> InFlightGuard<'_> {
        let now = self.current.fetch_add(1, Ordering::Relaxed).saturating_add(1);
        self.peak.fetch_max(now, Ordering::Relaxed);
        InFlightGuard {
            counter: &self.current,
        }
    }

    pub(super) fn current(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }

    pub(super) fn peak(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }
}

pub(super) struct InFlightGuard<'tracker> {
    counter: &'tracker AtomicUsize,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        drop(
            self.counter
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                    current.checked_sub(1)
                }),
        );
    }
}
