use crate::config::ConfigError;
use crate::stats::DeliveryStats;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Periodic observer that reports a snapshot of the delivery counters.
#[derive(Debug)]
pub struct ProgressMonitor {
    stats: Arc<DeliveryStats>,
    interval: Duration,
}

impl ProgressMonitor {
    pub fn new(stats: Arc<DeliveryStats>, interval: Duration) -> Result<Self, ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::ZeroMonitorInterval);
        }
        Ok(Self { stats, interval })
    }

    /// Report on every tick until cancelled. The first report is immediate;
    /// cancellation aborts the wait in progress and emits one last snapshot
    /// on the way out.
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.report();
                    break;
                }
                _ = ticker.tick() => self.report(),
            }
        }
    }

    fn report(&self) {
        let snap = self.stats.snapshot();
        info!(
            sent = snap.sent,
            failed = snap.failed,
            total_processing_ms = snap.total_processing_ms,
            avg_processing_ms = %format!("{:.2}", snap.avg_processing_ms),
            "delivery progress"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[test]
    fn test_zero_interval_rejected() {
        let stats = Arc::new(DeliveryStats::new());
        let err = ProgressMonitor::new(stats, Duration::ZERO).unwrap_err();
        assert_eq!(err, ConfigError::ZeroMonitorInterval);
    }

    #[tokio::test]
    async fn test_stop_before_first_tick() {
        let stats = Arc::new(DeliveryStats::new());
        let monitor = ProgressMonitor::new(stats, Duration::from_secs(60)).unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();

        // An already-cancelled token must not leave the monitor running or
        // panicking; it reports once and returns.
        timeout(Duration::from_millis(100), monitor.run(cancel))
            .await
            .expect("monitor did not stop promptly");
    }

    #[tokio::test]
    async fn test_stop_aborts_sleep_in_progress() {
        let stats = Arc::new(DeliveryStats::new());
        let monitor = ProgressMonitor::new(stats, Duration::from_secs(60)).unwrap();

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(monitor.run(cancel.clone()));

        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        // Well under the 60 s interval: the wait was aborted, not completed.
        timeout(Duration::from_millis(200), handle)
            .await
            .expect("monitor did not wake from its interval sleep")
            .unwrap();
    }
}
