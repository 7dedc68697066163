// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicU64, Ordering};

/// Delivery counters for one adapter, shared with whoever reports them.
#[derive(Debug, Default)]
pub struct ForwarderStats {
    batches_sent: AtomicU64,
    lines_sent: AtomicU64,
    batches_dropped: AtomicU64,
    lines_dropped: AtomicU64,
    messages_skipped: AtomicU64,
}

/// Point-in-time copy of [`ForwarderStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub batches_sent: u64,
    pub lines_sent: u64,
    pub batches_dropped: u64,
    pub lines_dropped: u64,
    pub messages_skipped: u64,
}

impl ForwarderStats {
    pub fn record_delivered(&self, lines: usize) {
        self.batches_sent.fetch_add(1, Ordering::Relaxed);
        self.lines_sent.fetch_add(lines as u64, Ordering::Relaxed);
    }

    pub fn record_dropped(&self, lines: usize) {
        self.batches_dropped.fetch_add(1, Ordering::Relaxed);
        self.lines_dropped.fetch_add(lines as u64, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.messages_skipped.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            batches_sent: self.batches_sent.load(Ordering::Relaxed),
            lines_sent: self.lines_sent.load(Ordering::Relaxed),
            batches_dropped: self.batches_dropped.load(Ordering::Relaxed),
            lines_dropped: self.lines_dropped.load(Ordering::Relaxed),
            messages_skipped: self.messages_skipped.load(Ordering::Relaxed),
        }
    }
}
