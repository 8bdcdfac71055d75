// =============================================================================
// Asset History Log — bounded, newest-first event ring per asset
// =============================================================================

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::types::Signal;

/// What happened to a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HistoryEventKind {
    /// A pending signal was opened and will execute after `delay_secs`.
    Upcoming { signal: Signal, delay_secs: u64 },
    /// A pending signal completed its window and became the confirmed one.
    Executed { signal: Signal },
}

/// A single timestamped history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEvent {
    pub at: DateTime<Local>,
    pub kind: HistoryEventKind,
}

impl HistoryEvent {
    pub fn upcoming(at: DateTime<Local>, signal: Signal, delay_secs: u64) -> Self {
        Self {
            at,
            kind: HistoryEventKind::Upcoming { signal, delay_secs },
        }
    }

    pub fn executed(at: DateTime<Local>, signal: Signal) -> Self {
        Self {
            at,
            kind: HistoryEventKind::Executed { signal },
        }
    }
}

impl std::fmt::Display for HistoryEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let at = self.at.format("%H:%M:%S");
        match self.kind {
            HistoryEventKind::Upcoming { signal, delay_secs } => {
                write!(f, "{at} - UPCOMING {signal} ({delay_secs}s)")
            }
            HistoryEventKind::Executed { signal } => write!(f, "{at} - EXECUTED {signal}"),
        }
    }
}

/// Append-only log capped at `capacity`; pushing past the cap evicts the
/// oldest entry.
#[derive(Debug, Clone)]
pub struct AssetHistoryLog {
    events: VecDeque<HistoryEvent>,
    capacity: usize,
}

impl AssetHistoryLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, event: HistoryEvent) {
        self.events.push_front(event);
        self.events.truncate(self.capacity);
    }

    /// Entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEvent> {
        self.events.iter()
    }

    /// Rendered display lines, newest first.
    pub fn lines(&self) -> Vec<String> {
        self.events.iter().map(ToString::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
