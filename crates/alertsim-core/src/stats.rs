use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Shared delivery counters, updated lock-free by every sender worker.
///
/// Counters only ever grow during a run. Updates never take a lock, so a
/// worker recording an outcome cannot contend with queue traffic.
#[derive(Debug, Default)]
pub struct DeliveryStats {
    sent: AtomicU64,
    failed: AtomicU64,
    total_processing_ms: AtomicU64,
}

impl DeliveryStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one processed message.
    ///
    /// Called exactly once per message, by the worker that processed it.
    pub fn record(&self, failed: bool, processing: Duration) {
        if failed {
            self.failed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.sent.fetch_add(1, Ordering::Relaxed);
        }
        self.total_processing_ms
            .fetch_add(processing.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Total messages accounted for, success or failure.
    pub fn processed(&self) -> u64 {
        self.sent() + self.failed()
    }

    pub fn total_processing_ms(&self) -> u64 {
        self.total_processing_ms.load(Ordering::Relaxed)
    }

    /// Average per-message processing time, or 0 when nothing was processed.
    pub fn average_processing_ms(&self) -> f64 {
        let processed = self.processed();
        if processed > 0 {
            self.total_processing_ms() as f64 / processed as f64
        } else {
            0.0
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let sent = self.sent();
        let failed = self.failed();
        let total_processing_ms = self.total_processing_ms();
        let processed = sent + failed;
        let avg_processing_ms = if processed > 0 {
            total_processing_ms as f64 / processed as f64
        } else {
            0.0
        };
        StatsSnapshot {
            sent,
            failed,
            total_processing_ms,
            avg_processing_ms,
        }
    }
}

/// Point-in-time view of the delivery counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub sent: u64,
    pub failed: u64,
    pub total_processing_ms: u64,
    pub avg_processing_ms: f64,
}

impl StatsSnapshot {
    pub fn processed(&self) -> u64 {
        self.sent + self.failed
    }
}
