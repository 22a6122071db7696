use crate::config::ConfigError;
use crate::message::Message;
use crate::queue::BoundedQueue;
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Generates messages and feeds them to the shared queue in order.
#[derive(Debug)]
pub struct Producer {
    queue: Arc<BoundedQueue<Message>>,
    message_count: u64,
    pacing: Duration,
    rng: StdRng,
}

impl Producer {
    pub fn new(
        queue: Arc<BoundedQueue<Message>>,
        message_count: u64,
        pacing: Duration,
        rng: StdRng,
    ) -> Result<Self, ConfigError> {
        if message_count == 0 {
            return Err(ConfigError::ZeroMessageCount);
        }
        Ok(Self {
            queue,
            message_count,
            pacing,
            rng,
        })
    }

    /// Generate and enqueue `message_count` messages, pausing `pacing`
    /// between generations. Returns the number actually enqueued, which is
    /// short of the target only when cancellation fired while the producer
    /// was waiting on a full queue; the message in hand is then dropped
    /// without being counted.
    pub async fn run(mut self, cancel: CancellationToken) -> u64 {
        let mut produced = 0;
        for seq in 0..self.message_count {
            let message = self.generate();
            match self.queue.enqueue(message, &cancel).await {
                Ok(()) => produced += 1,
                Err(_) => {
                    debug!(produced, "producer cancelled while queue was full");
                    break;
                }
            }
            if seq + 1 < self.message_count && !self.pacing.is_zero() {
                sleep(self.pacing).await;
            }
        }
        debug!(produced, "producer finished");
        produced
    }

    /// Random lowercase content, 1 to 100 characters.
    fn generate(&mut self) -> Message {
        let length = self.rng.gen_range(1..=100);
        let content: String = (0..length)
            .map(|_| self.rng.gen_range(b'a'..=b'z') as char)
            .collect();
        Message::new(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn test_rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[tokio::test]
    async fn test_produces_exact_count() {
        let queue = Arc::new(BoundedQueue::new(64));
        let producer =
            Producer::new(queue.clone(), 20, Duration::ZERO, test_rng()).unwrap();

        let produced = producer.run(CancellationToken::new()).await;
        assert_eq!(produced, 20);
        assert_eq!(queue.len(), 20);
    }

    #[tokio::test]
    async fn test_content_is_lowercase_and_bounded() {
        let queue = Arc::new(BoundedQueue::new(64));
        let producer =
            Producer::new(queue.clone(), 50, Duration::ZERO, test_rng()).unwrap();
        producer.run(CancellationToken::new()).await;

        let cancel = CancellationToken::new();
        for _ in 0..50 {
            let message = queue.dequeue(&cancel).await.unwrap();
            let content = message.content();
            assert!((1..=100).contains(&content.len()));
            assert!(content.bytes().all(|b| b.is_ascii_lowercase()));
        }
    }

    #[tokio::test]
    async fn test_cancellation_stops_blocked_producer() {
        let queue = Arc::new(BoundedQueue::new(2));
        let cancel = CancellationToken::new();
        let producer =
            Producer::new(queue.clone(), 10, Duration::ZERO, test_rng()).unwrap();

        let handle = tokio::spawn(producer.run(cancel.clone()));
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        // Only the two messages that fit were enqueued; the rest were never
        // produced or were discarded unenqueued.
        let produced = handle.await.unwrap();
        assert_eq!(produced, 2);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_zero_count_rejected() {
        let queue = Arc::new(BoundedQueue::new(4));
        let err = Producer::new(queue, 0, Duration::ZERO, test_rng()).unwrap_err();
        assert_eq!(err, ConfigError::ZeroMessageCount);
    }
}
