use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Error returned when a blocking queue wait is cancelled.
///
/// For `enqueue` the rejected item is handed back inside the error so the
/// caller can discard or inspect it; nothing was inserted. For `dequeue` no
/// item was consumed.
#[derive(Debug, PartialEq, Eq)]
pub struct Cancelled<T = ()>(pub T);

impl<T> fmt::Display for Cancelled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("queue wait cancelled")
    }
}

impl<T: fmt::Debug> std::error::Error for Cancelled<T> {}

/// Fixed-capacity FIFO buffer shared between one producer and many workers.
///
/// `enqueue` waits while the queue is full and `dequeue` waits while it is
/// empty; both waits abort promptly when the supplied cancellation token
/// fires. Each item is handed to exactly one dequeuer.
///
/// Structural changes are serialized by an internal mutex that is only held
/// for the push/pop itself, never across an await. The blocking is done on a
/// pair of semaphores (vacant slots and occupied slots), so waiters are woken
/// individually as capacity or items become available.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    items: Mutex<VecDeque<T>>,
    vacant: Semaphore,
    occupied: Semaphore,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be positive");
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            vacant: Semaphore::new(capacity),
            occupied: Semaphore::new(0),
            capacity,
        }
    }

    /// Insert `item` at the tail, waiting for a free slot if the queue is
    /// full.
    ///
    /// Returns `Err(Cancelled(item))` if `cancel` fires before a slot opens
    /// up; the item was not inserted.
    pub async fn enqueue(&self, item: T, cancel: &CancellationToken) -> Result<(), Cancelled<T>> {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Cancelled(item)),
            permit = self.vacant.acquire() => permit.expect("queue semaphore closed"),
        };

        // No await between taking the slot and publishing the item, so a
        // consumed permit always corresponds to a pushed element.
        self.items
            .lock()
            .expect("queue mutex poisoned")
            .push_back(item);
        permit.forget();
        self.occupied.add_permits(1);
        Ok(())
    }

    /// Remove and return the head item, waiting for one if the queue is
    /// empty.
    ///
    /// Returns `Err(Cancelled(()))` if `cancel` fires before an item arrives;
    /// no item was consumed.
    pub async fn dequeue(&self, cancel: &CancellationToken) -> Result<T, Cancelled> {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Cancelled(())),
            permit = self.occupied.acquire() => permit.expect("queue semaphore closed"),
        };

        let item = self
            .items
            .lock()
            .expect("queue mutex poisoned")
            .pop_front()
            .expect("occupied permit without a queued item");
        permit.forget();
        self.vacant.add_permits(1);
        Ok(item)
    }

    /// Number of items currently buffered. Snapshot only; may be stale by the
    /// time the caller looks at it.
    pub fn len(&self) -> usize {
        self.items.lock().expect("queue mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
