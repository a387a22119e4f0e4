//! In-memory log capture.
//!
//! [`LogCaptureLayer`] is a `tracing_subscriber` layer that records events into a shared
//! [`LogBuffer`]. A `LogViewerControl` displays the same buffer, so hosts can show the
//! toolkit's own diagnostics without letting them scribble over the screen.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{Level, Metadata, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

pub const DEFAULT_LOG_CAPACITY: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            target: target.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<&Level> for LogLevel {
    fn from(level: &Level) -> Self {
        match *level {
            Level::ERROR => LogLevel::Error,
            Level::WARN => LogLevel::Warn,
            Level::INFO => LogLevel::Info,
            Level::DEBUG => LogLevel::Debug,
            Level::TRACE => LogLevel::Trace,
        }
    }
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

struct Shared {
    entries: Mutex<VecDeque<LogEntry>>,
    subscribers: Mutex<Vec<(SubscriptionId, ChangeCallback)>>,
    next_subscription: AtomicU64,
    capacity: usize,
}

/// Bounded, thread-safe ring buffer of log entries. Cloning shares the buffer.
#[derive(Clone)]
pub struct LogBuffer {
    shared: Arc<Shared>,
}

impl fmt::Debug for LogBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogBuffer")
            .field("len", &self.len())
            .field("capacity", &self.shared.capacity)
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            shared: Arc::new(Shared {
                entries: Mutex::new(VecDeque::with_capacity(capacity)),
                subscribers: Mutex::new(Vec::new()),
                next_subscription: AtomicU64::new(0),
                capacity,
            }),
        }
    }

    /// Appends an entry, evicting the oldest when full, then notifies subscribers. The entry
    /// lock is released before any subscriber runs.
    pub fn add(&self, entry: LogEntry) {
        {
            let mut entries = lock(&self.shared.entries);
            if entries.len() >= self.shared.capacity {
                entries.pop_front();
            }
            entries.push_back(entry);
        }
        self.notify();
    }

    pub fn get_all(&self) -> Vec<LogEntry> {
        lock(&self.shared.entries).iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.shared.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        lock(&self.shared.entries).clear();
        self.notify();
    }

    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.shared.next_subscription.fetch_add(1, Ordering::Relaxed));
        lock(&self.shared.subscribers).push((id, Arc::new(callback)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = lock(&self.shared.subscribers);
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        subscribers.len() != before
    }

    fn notify(&self) {
        let callbacks: Vec<ChangeCallback> = lock(&self.shared.subscribers)
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback();
        }
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracing layer that captures events into a [`LogBuffer`].
pub struct LogCaptureLayer {
    buffer: LogBuffer,
    max_level: LogLevel,
}

impl LogCaptureLayer {
    pub fn new(buffer: LogBuffer) -> Self {
        Self {
            buffer,
            max_level: LogLevel::Trace,
        }
    }

    /// Drops events less severe than `level`.
    pub fn with_max_level(mut self, level: LogLevel) -> Self {
        self.max_level = level;
        self
    }
}

impl<S> Layer<S> for LogCaptureLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut message = String::new();
        let mut visitor = MessageVisitor(&mut message);
        event.record(&mut visitor);

        self.buffer.add(LogEntry {
            timestamp: Utc::now(),
            level: LogLevel::from(metadata.level()),
            target: metadata.target().to_string(),
            message,
        });
    }

    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        LogLevel::from(metadata.level()) <= self.max_level
    }
}

struct MessageVisitor<'a>(&'a mut String);

impl tracing::field::Visit for MessageVisitor<'_> {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.0.push_str(value);
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            *self.0 = format!("{value:?}");
            if self.0.len() >= 2 && self.0.starts_with('"') && self.0.ends_with('"') {
                *self.0 = self.0[1..self.0.len() - 1].to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn ring_buffer_evicts_oldest() {
        let buffer = LogBuffer::with_capacity(2);
        for message in ["a", "b", "c"] {
            buffer.add(LogEntry::new(LogLevel::Info, "test", message));
        }
        let messages: Vec<String> = buffer.get_all().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["b", "c"]);
    }

    #[test]
    fn subscribers_can_read_the_buffer_during_notification() {
        let buffer = LogBuffer::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let reader = buffer.clone();
        let seen_clone = Arc::clone(&seen);
        let id = buffer.subscribe(move || {
            seen_clone.store(reader.len(), Ordering::SeqCst);
        });

        buffer.add(LogEntry::new(LogLevel::Warn, "test", "first"));
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        assert!(buffer.unsubscribe(id));
        buffer.add(LogEntry::new(LogLevel::Warn, "test", "second"));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert!(!buffer.unsubscribe(id));
    }

    #[test]
    fn capture_layer_records_events() {
        let buffer = LogBuffer::new();
        let subscriber = tracing_subscriber::registry()
            .with(LogCaptureLayer::new(buffer.clone()).with_max_level(LogLevel::Info));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "capture", "disk {} full", "nearly");
            tracing::debug!(target: "capture", "filtered out");
        });

        let entries = buffer.get_all();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Warn);
        assert_eq!(entries[0].target, "capture");
        assert_eq!(entries[0].message, "disk nearly full");
    }
}
