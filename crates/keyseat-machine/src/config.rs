//! Cycle controller configuration

use serde::{Deserialize, Serialize};

/// Configuration for the cycle controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Emit a trace line on the operator stream for every move handed to
    /// the executor
    pub trace_moves: bool,
    /// Run a zero-penetration safety pass before the radial passes
    /// (commands may override per form)
    pub safety_pass: bool,
    /// Buffer size for the cycle event channel
    pub event_buffer: usize,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            trace_moves: false,
            safety_pass: true,
            event_buffer: 128,
        }
    }
}
