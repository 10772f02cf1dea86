use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::parser::{LogParser, RawLogEvent};
use cloudscope_types::{ArcLogEvent, LogLevel};

/// Default cap on retained events (matches the fetch limit of the transport)
pub const DEFAULT_CAPACITY: usize = 50_000;

/// Append-only store of ingested log events.
///
/// The store owns the events and hands out a shared snapshot. A snapshot
/// stays pointer-identical until the next write, which is what projection
/// memoization keys on.
#[derive(Clone)]
pub struct LogStore {
    /// Current snapshot. Writers replace it, readers clone the Arc.
    entries: Arc<RwLock<Arc<Vec<ArcLogEvent>>>>,

    /// Maximum capacity
    capacity: usize,

    /// Next event id
    next_id: Arc<AtomicU64>,

    /// Bumped on every write
    version: Arc<AtomicU64>,
}

impl LogStore {
    /// Create a new store with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Arc::new(Vec::new()))),
            capacity: capacity.max(1),
            next_id: Arc::new(AtomicU64::new(1)),
            version: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Parse and append a single raw event
    pub fn push(&self, raw: RawLogEvent) -> ArcLogEvent {
        let event = self.stamp(raw);
        self.append(std::slice::from_ref(&event));
        event
    }

    /// Parse and append a batch of raw events, evicting the oldest beyond
    /// capacity. Returns the newly stored events.
    pub fn extend<I>(&self, raws: I) -> Vec<ArcLogEvent>
    where
        I: IntoIterator<Item = RawLogEvent>,
    {
        let added: Vec<ArcLogEvent> = raws.into_iter().map(|raw| self.stamp(raw)).collect();
        if !added.is_empty() {
            self.append(&added);
        }
        added
    }

    fn stamp(&self, raw: RawLogEvent) -> ArcLogEvent {
        let mut event = LogParser::parse(raw);
        event.id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Arc::new(event)
    }

    fn append(&self, added: &[ArcLogEvent]) {
        let mut guard = self.entries.write();
        let entries = Arc::make_mut(&mut *guard);
        entries.extend(added.iter().cloned());
        if entries.len() > self.capacity {
            let overflow = entries.len() - self.capacity;
            entries.drain(..overflow);
            tracing::debug!(evicted = overflow, "log store at capacity");
        }
        self.version.fetch_add(1, Ordering::Relaxed);
    }

    /// Shared snapshot of all events, in ingestion order
    pub fn all(&self) -> Arc<Vec<ArcLogEvent>> {
        self.entries.read().clone()
    }

    /// Write counter, bumped on every change
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Relaxed)
    }

    /// Get entry count per log level
    pub fn level_counts(&self) -> LevelCounts {
        let entries = self.entries.read();
        let mut counts = LevelCounts::default();

        for entry in entries.iter() {
            match entry.level {
                LogLevel::Trace => counts.trace += 1,
                LogLevel::Debug => counts.debug += 1,
                LogLevel::Info => counts.info += 1,
                LogLevel::Warn => counts.warn += 1,
                LogLevel::Error => counts.error += 1,
                LogLevel::Fatal => counts.fatal += 1,
                LogLevel::System => counts.system += 1,
                LogLevel::Unknown => counts.unknown += 1,
            }
        }

        counts
    }

    /// Total entry count
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Export all messages, one per line
    pub fn export_text(&self) -> String {
        self.entries
            .read()
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Clear all entries. Ids keep increasing so stale references never
    /// alias new events.
    pub fn clear(&self) {
        *self.entries.write() = Arc::new(Vec::new());
        self.version.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for LogStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Counts per log level
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelCounts {
    pub trace: usize,
    pub debug: usize,
    pub info: usize,
    pub warn: usize,
    pub error: usize,
    pub fatal: usize,
    pub system: usize,
    pub unknown: usize,
}

impl LevelCounts {
    pub fn total(&self) -> usize {
        self.trace
            + self.debug
            + self.info
            + self.warn
            + self.error
            + self.fatal
            + self.system
            + self.unknown
    }

    pub fn get(&self, level: LogLevel) -> usize {
        match level {
            LogLevel::Trace => self.trace,
            LogLevel::Debug => self.debug,
            LogLevel::Info => self.info,
            LogLevel::Warn => self.warn,
            LogLevel::Error => self.error,
            LogLevel::Fatal => self.fatal,
            LogLevel::System => self.system,
            LogLevel::Unknown => self.unknown,
        }
    }
}
