//! Event system for cycle progress
//!
//! Provides:
//! - Event types for cycle phase and pass progress
//! - Event dispatcher for publishing events to subscribers

use crate::data::{CyclePhase, LathePoint, Waypoint};
use tokio::sync::broadcast;

/// Cycle event types
#[derive(Debug, Clone)]
pub enum CycleEvent {
    /// A cycle accepted its parameters and captured its start position
    CycleStarted {
        /// Start position captured from the machine, held for the whole cycle.
        start: LathePoint,
    },
    /// Cycle phase changed
    PhaseChanged(CyclePhase),
    /// A depth pass began (pass 0 is the zero-penetration safety pass)
    PassStarted {
        /// Depth pass index.
        pass: u32,
        /// Repetition index within the pass, starting at 1.
        repetition: u32,
        /// Plunge-axis target for this pass, in mm.
        plunge_target: f64,
    },
    /// A waypoint was handed to the motion executor
    WaypointIssued(Waypoint),
    /// Cycle finished and the motion queue is drained
    CycleCompleted,
    /// Cycle aborted before completion
    CycleAborted(String),
}

impl std::fmt::Display for CycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleEvent::CycleStarted { start } => write!(f, "Cycle started at {}", start),
            CycleEvent::PhaseChanged(phase) => write!(f, "Phase: {}", phase),
            CycleEvent::PassStarted {
                pass,
                repetition,
                plunge_target,
            } => write!(
                f,
                "Pass {} rep {} to X{:.3}",
                pass, repetition, plunge_target
            ),
            CycleEvent::WaypointIssued(wp) => write!(f, "Issued {}", wp),
            CycleEvent::CycleCompleted => write!(f, "Cycle completed"),
            CycleEvent::CycleAborted(reason) => write!(f, "Cycle aborted: {}", reason),
        }
    }
}

/// Event dispatcher for publishing cycle events to subscribers
#[derive(Clone)]
pub struct EventDispatcher {
    /// Broadcast sender channel for cycle events.
    tx: broadcast::Sender<CycleEvent>,
}

impl EventDispatcher {
    /// Create a new event dispatcher
    ///
    /// # Arguments
    /// * `buffer_size` - Size of the broadcast buffer (default 128)
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer_size);
        Self { tx }
    }

    /// Create a new event dispatcher with default buffer size
    pub fn default_with_buffer() -> Self {
        Self::new(128)
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<CycleEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all subscribers
    ///
    /// Events are best-effort: publishing with no subscribers is not an
    /// error and the event is dropped.
    pub fn publish(&self, event: CycleEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::default_with_buffer()
    }
}
