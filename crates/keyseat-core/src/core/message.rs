//! Operator message stream
//!
//! The cycle reports progress as human-readable lines: the mandatory
//! `CYCLE START` / `CYCLE END` markers, warnings, and optional per-move
//! trace lines. Sinks receive messages in emission order; the end marker
//! is only written after the motion queue has drained.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of an operator message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageLevel {
    /// Per-move trace output
    Debug,
    /// Normal progress output, including the cycle markers
    Info,
    /// Recoverable problem reported to the operator
    Warning,
    /// Failure reported to the operator
    Error,
}

impl fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// A single operator-facing message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message severity
    pub level: MessageLevel,
    /// Message text, one line
    pub text: String,
    /// Time the message was emitted
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new message stamped with the current time
    pub fn new(level: MessageLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create an info-level message
    pub fn info(text: impl Into<String>) -> Self {
        Self::new(MessageLevel::Info, text)
    }

    /// Create a warning-level message
    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(MessageLevel::Warning, text)
    }

    /// Create a debug-level trace message
    pub fn debug(text: impl Into<String>) -> Self {
        Self::new(MessageLevel::Debug, text)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.text)
    }
}

/// Sink for operator messages
///
/// Implement this trait to receive the cycle's diagnostic stream.
pub trait MessageSink: Send + Sync {
    /// Called for each emitted message, in emission order
    fn write(&self, message: &Message);
}

/// Sink that prints message text to stdout
#[derive(Debug, Default)]
pub struct StdoutSink;

impl MessageSink for StdoutSink {
    fn write(&self, message: &Message) {
        println!("{}", message.text);
    }
}

/// Sink that buffers messages in memory, for tests and UIs
#[derive(Debug, Default)]
pub struct BufferSink {
    messages: Mutex<Vec<Message>>,
}

impl BufferSink {
    /// Create an empty buffer sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all buffered messages
    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().clone()
    }

    /// Snapshot of the buffered message texts
    pub fn lines(&self) -> Vec<String> {
        self.messages.lock().iter().map(|m| m.text.clone()).collect()
    }

    /// Discard all buffered messages
    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

impl MessageSink for BufferSink {
    fn write(&self, message: &Message) {
        self.messages.lock().push(message.clone());
    }
}
