use std::fmt;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Opaque unique identifier assigned to every message at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A unit of work flowing through the pipeline.
///
/// Identity, content and creation time are fixed at construction. The
/// delivery outcome (`sent_at`, `failed`) is written exactly once, by the
/// worker that dequeued the message.
#[derive(Debug)]
pub struct Message {
    id: MessageId,
    content: String,
    created_at: Instant,
    sent_at: Option<Instant>,
    failed: bool,
}

impl Message {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            content: content.into(),
            created_at: Instant::now(),
            sent_at: None,
            failed: false,
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Time the delivery attempt finished, if the message has been processed.
    pub fn sent_at(&self) -> Option<Instant> {
        self.sent_at
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Record the delivery outcome and return the processing duration.
    ///
    /// Stamps `sent_at` with the current time; `Instant` is monotonic, so the
    /// returned duration is never negative. Completing a message twice is a
    /// bug in the caller.
    pub fn complete(&mut self, failed: bool) -> Duration {
        debug_assert!(self.sent_at.is_none(), "message completed twice");
        let now = Instant::now();
        self.sent_at = Some(now);
        self.failed = failed;
        now.duration_since(self.created_at)
    }

    /// Duration between creation and completion, if completed.
    pub fn processing_time(&self) -> Option<Duration> {
        self.sent_at.map(|sent| sent.duration_since(self.created_at))
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.content)
    }
}
