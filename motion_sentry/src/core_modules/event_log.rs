use chrono::{DateTime, Local};
use std::fmt;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Source of wall-clock time for event timestamps.
pub trait Clock: Send {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A single entry of the detection log. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    timestamp: DateTime<Local>,
    message: String,
}

impl LogEvent {
    /// The "object appeared" event.
    pub fn detection(timestamp: DateTime<Local>) -> Self {
        Self {
            message: format!("Changed at {}", timestamp.format(TIMESTAMP_FORMAT)),
            timestamp,
        }
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Ordered, append-only record of log events.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<LogEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: LogEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    pub fn latest(&self) -> Option<&LogEvent> {
        self.events.last()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
