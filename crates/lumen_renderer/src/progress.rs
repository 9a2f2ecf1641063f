//! Whole-percent progress reporting shared by render threads.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Counts finished pixels and forwards whole-percent progress to a listener.
///
/// Workers only touch atomics on the hot path. The listener runs under a
/// mutex, and only when the percentage advances, so it sees values that are
/// non-decreasing, at most one call per percentage point, and a final 100.
pub struct ProgressTracker<'a> {
    total: usize,
    done: AtomicUsize,
    /// Highest percentage claimed by a worker
    reported: AtomicU32,
    /// Highest percentage handed to the listener
    delivered: Mutex<u32>,
    listener: &'a (dyn Fn(u32) + Sync),
}

impl<'a> ProgressTracker<'a> {
    pub fn new(total: usize, listener: &'a (dyn Fn(u32) + Sync)) -> Self {
        Self {
            total,
            done: AtomicUsize::new(0),
            reported: AtomicU32::new(0),
            delivered: Mutex::new(0),
            listener,
        }
    }

    /// Number of pixels finished so far.
    pub fn completed(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }

    /// Record one finished pixel.
    pub fn pixel_done(&self) {
        let done = self.done.fetch_add(1, Ordering::AcqRel) + 1;
        let percent = if self.total == 0 {
            100
        } else {
            (done.min(self.total) * 100 / self.total) as u32
        };

        let mut last = self.reported.load(Ordering::Acquire);
        while percent > last {
            match self
                .reported
                .compare_exchange_weak(last, percent, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => {
                    self.deliver(percent);
                    return;
                }
                Err(current) => last = current,
            }
        }
    }

    fn deliver(&self, percent: u32) {
        let mut delivered = self.delivered.lock().unwrap_or_else(PoisonError::into_inner);
        // A slower thread may arrive after a larger value was delivered
        if percent > *delivered {
            *delivered = percent;
            (self.listener)(percent);
        }
    }
}
