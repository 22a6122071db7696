use crate::config::{ConfigError, SimConfig};
use crate::message::Message;
use crate::monitor::ProgressMonitor;
use crate::producer::Producer;
use crate::queue::BoundedQueue;
use crate::sender::Sender;
use crate::stats::{DeliveryStats, StatsSnapshot};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, trace};

/// Lifecycle of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Draining,
    Stopping,
    Terminated,
}

/// How often the orchestrator re-checks the completion condition while
/// draining. In-flight deliveries are not tracked per message, so completion
/// is detected by comparing observed totals against the produced count; this
/// cadence bounds the detection latency.
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Owns every pipeline participant and drives one run from start to
/// coordinated shutdown.
///
/// Construction validates the full configuration and builds the queue
/// (capacity `2 x sender_count`), the shared stats, the producer, the sender
/// pool and the monitor; nothing is spawned until [`run`](Self::run).
pub struct Simulation {
    config: SimConfig,
    queue: Arc<BoundedQueue<Message>>,
    stats: Arc<DeliveryStats>,
    producer: Option<Producer>,
    senders: Vec<Sender>,
    monitor: Option<ProgressMonitor>,
    phase: Phase,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let queue = Arc::new(BoundedQueue::new(config.queue_capacity()));
        let stats = Arc::new(DeliveryStats::new());
        let seed = config.seed.unwrap_or_else(rand::random);

        let producer = Producer::new(
            queue.clone(),
            config.message_count,
            config.producer_pacing(),
            StdRng::seed_from_u64(seed),
        )?;

        let mut senders = Vec::with_capacity(config.sender_count);
        for i in 0..config.sender_count {
            senders.push(Sender::new(
                format!("sender-{i}"),
                queue.clone(),
                stats.clone(),
                config.failure_rate,
                config.mean_delay(),
                StdRng::seed_from_u64(seed.wrapping_add(1 + i as u64)),
            )?);
        }

        let monitor = ProgressMonitor::new(stats.clone(), config.monitor_interval())?;

        Ok(Self {
            config,
            queue,
            stats,
            producer: Some(producer),
            senders,
            monitor: Some(monitor),
            phase: Phase::Idle,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Shared counters; live during the run, final once `run` returns.
    pub fn stats(&self) -> &Arc<DeliveryStats> {
        &self.stats
    }

    /// Drive the whole pipeline: start everything, wait for the producer,
    /// drain in-flight deliveries, stop workers and monitor, and return the
    /// final snapshot. Completing a second call returns the existing final
    /// snapshot without doing any work.
    pub async fn run(&mut self) -> StatsSnapshot {
        let Some(producer) = self.producer.take() else {
            return self.stats.snapshot();
        };
        let senders = std::mem::take(&mut self.senders);
        let monitor = self.monitor.take();

        let cancel = CancellationToken::new();

        self.phase = Phase::Running;
        info!(
            message_count = self.config.message_count,
            sender_count = self.config.sender_count,
            failure_rate = self.config.failure_rate,
            mean_delay_ms = self.config.mean_delay_ms,
            queue_capacity = self.queue.capacity(),
            "simulation started"
        );

        let producer_handle = tokio::spawn(producer.run(cancel.clone()));
        let sender_handles: Vec<_> = senders
            .into_iter()
            .map(|sender| tokio::spawn(sender.run(cancel.clone())))
            .collect();
        let monitor_handle = monitor.map(|monitor| tokio::spawn(monitor.run(cancel.clone())));

        // All messages enqueued; in-flight deliveries remain.
        let produced = match producer_handle.await {
            Ok(produced) => produced,
            Err(e) => {
                error!(error = %e, "producer task failed");
                0
            }
        };
        self.phase = Phase::Draining;
        info!(produced, "producer finished, draining deliveries");

        while self.stats.processed() < produced {
            trace!(
                processed = self.stats.processed(),
                queue_depth = self.queue.len(),
                "draining"
            );
            sleep(DRAIN_POLL_INTERVAL).await;
        }

        // Wakes every worker parked on the empty queue and aborts the
        // monitor's sleep.
        self.phase = Phase::Stopping;
        cancel.cancel();
        for handle in sender_handles {
            let _ = handle.await;
        }
        if let Some(handle) = monitor_handle {
            let _ = handle.await;
        }

        self.phase = Phase::Terminated;
        let snapshot = self.stats.snapshot();
        info!(
            sent = snapshot.sent,
            failed = snapshot.failed,
            avg_processing_ms = %format!("{:.2}", snapshot.avg_processing_ms),
            "simulation terminated"
        );
        snapshot
    }
}
