use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counter set for the ingestion pipeline.
///
/// Decode failures are expected background noise on a live capture; the
/// counters make "how much are we losing" answerable without logging every
/// malformed datagram.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    datagrams: AtomicU64,
    commands: AtomicU64,
    events_routed: AtomicU64,
    operations_skipped: AtomicU64,
    messages_skipped: AtomicU64,
    unroutable_codes: AtomicU64,
    decode_failures: AtomicU64,
    expired_fragment_sets: AtomicU64,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_datagram(&self) {
        self.datagrams.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_command(&self) {
        self.commands.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event_routed(&self) {
        self.events_routed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_operation_skipped(&self) {
        self.operations_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_message_skipped(&self) {
        self.messages_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unroutable_code(&self) {
        self.unroutable_codes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expired_fragment_sets(&self, count: usize) {
        self.expired_fragment_sets
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            datagrams: self.datagrams.load(Ordering::Relaxed),
            commands: self.commands.load(Ordering::Relaxed),
            events_routed: self.events_routed.load(Ordering::Relaxed),
            operations_skipped: self.operations_skipped.load(Ordering::Relaxed),
            messages_skipped: self.messages_skipped.load(Ordering::Relaxed),
            unroutable_codes: self.unroutable_codes.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            expired_fragment_sets: self.expired_fragment_sets.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time counter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub datagrams: u64,
    pub commands: u64,
    pub events_routed: u64,
    pub operations_skipped: u64,
    pub messages_skipped: u64,
    pub unroutable_codes: u64,
    pub decode_failures: u64,
    pub expired_fragment_sets: u64,
}
