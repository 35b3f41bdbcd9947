// This file is part of slimkit.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

use std::{
    sync::atomic::{AtomicU64, AtomicUsize, Ordering},
    time::Instant,
};

use log::*;

/// Minimum gap between two progress lines, in milliseconds.
const REPORT_INTERVAL_MS: u64 = 200;

/// Progress reporter for parallel loops.
///
/// Workers race to claim each reporting slot, so at most one of them logs per
/// [REPORT_INTERVAL_MS] window.
pub(crate) struct ProgressHandle {
    label: &'static str,
    total: usize,
    start: Instant,
    done: AtomicUsize,
    reported_ms: AtomicU64,
}

impl ProgressHandle {
    pub fn new(label: &'static str, total: usize) -> Self {
        ProgressHandle {
            label,
            total,
            start: Instant::now(),
            done: AtomicUsize::new(0),
            reported_ms: AtomicU64::new(0),
        }
    }

    /// Record one completed unit.
    pub fn tick(&self) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        let now = self.start.elapsed().as_millis() as u64;
        if self.claim_report(now) {
            info!("{}: {} / {}", self.label, done, self.total);
        }
    }

    /// Take the reporting slot at `now_ms` if the last report is old enough.
    fn claim_report(&self, now_ms: u64) -> bool {
        let last = self.reported_ms.load(Ordering::Relaxed);
        now_ms >= last + REPORT_INTERVAL_MS
            && self
                .reported_ms
                .compare_exchange(last, now_ms, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
    }

    /// Get the number of completed units.
    pub fn count(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }

    /// Report the final count.
    pub fn finish(&self) {
        debug!(
            "{}: finished {} of {} in {:.2}s",
            self.label,
            self.count(),
            self.total,
            self.start.elapsed().as_secs_f64()
        );
    }
}
