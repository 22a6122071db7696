use crate::config::ConfigError;
use crate::message::Message;
use crate::queue::BoundedQueue;
use crate::stats::DeliveryStats;
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// One delivery worker. Dequeues messages, simulates the send with a
/// randomized delay and failure draw, and records the outcome.
#[derive(Debug)]
pub struct Sender {
    id: String,
    queue: Arc<BoundedQueue<Message>>,
    stats: Arc<DeliveryStats>,
    failure_rate: f64,
    mean_delay: Duration,
    rng: StdRng,
}

impl Sender {
    pub fn new(
        id: impl Into<String>,
        queue: Arc<BoundedQueue<Message>>,
        stats: Arc<DeliveryStats>,
        failure_rate: f64,
        mean_delay: Duration,
        rng: StdRng,
    ) -> Result<Self, ConfigError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ConfigError::BlankSenderId);
        }
        if !(failure_rate >= 0.0 && failure_rate < 1.0) {
            return Err(ConfigError::FailureRateOutOfRange(failure_rate));
        }
        Ok(Self {
            id,
            queue,
            stats,
            failure_rate,
            mean_delay,
            rng,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Consume messages until cancellation.
    ///
    /// Cancellation is honored only between messages: before taking a new
    /// item, or while waiting on an empty queue. Once a message has been
    /// dequeued it is always carried through to a recorded outcome, so no
    /// message is ever lost half-processed. Returns the number of messages
    /// this worker delivered.
    pub async fn run(mut self, cancel: CancellationToken) -> u64 {
        let mut delivered = 0;
        loop {
            if cancel.is_cancelled() {
                break;
            }
            let message = match self.queue.dequeue(&cancel).await {
                Ok(message) => message,
                Err(_) => break,
            };
            self.deliver(message).await;
            delivered += 1;
        }
        debug!(sender = %self.id, delivered, "sender stopped");
        delivered
    }

    /// Simulate one delivery attempt and record it. Not cancellable.
    async fn deliver(&mut self, mut message: Message) -> Message {
        // Uniform draw over [0, 2 * mean) has expectation equal to the mean.
        let mean_ms = self.mean_delay.as_millis() as u64;
        if mean_ms > 0 {
            let delay_ms = self.rng.gen_range(0..2 * mean_ms);
            sleep(Duration::from_millis(delay_ms)).await;
        }

        let failed = self.rng.gen::<f64>() < self.failure_rate;
        let processing = message.complete(failed);
        self.stats.record(failed, processing);
        trace!(
            sender = %self.id,
            message = %message.id(),
            failed,
            processing_ms = processing.as_millis() as u64,
            "delivery attempt finished"
        );
        message
    }
}
