//! Machine collaborator traits and simulated implementations
//!
//! The cycle core only ever touches the machine through these two
//! interfaces: a read-only state store and a motion executor. Keeping
//! them as traits keeps the core independently testable against fakes.

use keyseat_core::{Axis, LathePoint, MachineError, Result, Waypoint};
use parking_lot::Mutex;
use std::sync::Arc;

/// Read-only view of the machine's position and modal state.
///
/// Positions are reported in stepper steps, as the stepper engine tracks
/// them; `position_mm` applies the step-to-distance scale.
pub trait MachineState: Send + Sync {
    /// Raw axis positions in steps: (plunge, travel)
    fn position_steps(&self) -> Result<(i64, i64)>;

    /// Step-to-distance scale for an axis, in steps per millimeter
    fn steps_per_mm(&self, axis: Axis) -> f64;

    /// Currently active feed rate (mm/min), if any
    fn feed_rate(&self) -> Option<f64>;

    /// Current position in millimeters
    fn position_mm(&self) -> Result<LathePoint> {
        let (plunge, travel) = self.position_steps()?;
        Ok(LathePoint::new(
            plunge as f64 / self.steps_per_mm(Axis::Plunge),
            travel as f64 / self.steps_per_mm(Axis::Travel),
        ))
    }
}

/// Motion executor interface.
///
/// `queue_move` may block until there is room in the motion queue; it
/// does not wait for physical completion. `synchronize` blocks until the
/// queue is fully drained and all motion has physically finished; it has
/// no timeout — a hang here is a firmware-level fault outside this
/// layer's scope.
pub trait MotionExecutor: Send {
    /// Queue one linear move to the waypoint's target in its motion mode
    fn queue_move(&mut self, waypoint: &Waypoint) -> Result<()>;

    /// Block until the motion queue is drained
    fn synchronize(&mut self) -> Result<()>;
}

/// Executor that accepts and discards all motion
#[derive(Debug, Default)]
pub struct NoOpExecutor;

impl MotionExecutor for NoOpExecutor {
    fn queue_move(&mut self, _waypoint: &Waypoint) -> Result<()> {
        Ok(())
    }

    fn synchronize(&mut self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug)]
struct SimState {
    position: LathePoint,
    feed_rate: Option<f64>,
    steps_per_mm: (f64, f64),
    issued: Vec<Waypoint>,
    synchronize_count: u32,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            position: LathePoint::default(),
            feed_rate: None,
            steps_per_mm: (100.0, 100.0),
            issued: Vec::new(),
            synchronize_count: 0,
        }
    }
}

/// Simulated lathe: tracks position from queued moves and records the
/// issued waypoint stream.
///
/// Implements both [`MachineState`] and [`MotionExecutor`]. Handles are
/// cheap clones of the same machine, so a controller can own the
/// executor half while a dispatcher reads state through another handle.
#[derive(Debug, Clone, Default)]
pub struct SimulatedMachine {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedMachine {
    /// Create a simulated machine at the origin
    pub fn new() -> Self {
        Self::default()
    }

    /// Place the machine at a position, as a jog or G0 would
    pub fn set_position(&self, position: LathePoint) {
        self.state.lock().position = position;
    }

    /// Set the active feed rate, as an F word would
    pub fn set_feed_rate(&self, feed_rate: f64) {
        self.state.lock().feed_rate = Some(feed_rate);
    }

    /// Set the step-to-distance scales
    pub fn set_steps_per_mm(&self, plunge: f64, travel: f64) {
        self.state.lock().steps_per_mm = (plunge, travel);
    }

    /// Snapshot of every waypoint queued so far, in order
    pub fn issued(&self) -> Vec<Waypoint> {
        self.state.lock().issued.clone()
    }

    /// Number of queue drains requested so far
    pub fn synchronize_count(&self) -> u32 {
        self.state.lock().synchronize_count
    }

    /// Discard the recorded waypoint stream
    pub fn clear_issued(&self) {
        self.state.lock().issued.clear();
    }
}

impl MachineState for SimulatedMachine {
    fn position_steps(&self) -> Result<(i64, i64)> {
        let state = self.state.lock();
        let (sx, sz) = state.steps_per_mm;
        if sx <= 0.0 || sz <= 0.0 {
            return Err(MachineError::PositionUnavailable {
                reason: "non-positive steps-per-mm scale".to_string(),
            }
            .into());
        }
        Ok((
            (state.position.x * sx).round() as i64,
            (state.position.z * sz).round() as i64,
        ))
    }

    fn steps_per_mm(&self, axis: Axis) -> f64 {
        let state = self.state.lock();
        match axis {
            Axis::Plunge => state.steps_per_mm.0,
            Axis::Travel => state.steps_per_mm.1,
        }
    }

    fn feed_rate(&self) -> Option<f64> {
        self.state.lock().feed_rate
    }
}

impl MotionExecutor for SimulatedMachine {
    fn queue_move(&mut self, waypoint: &Waypoint) -> Result<()> {
        let mut state = self.state.lock();
        state.position = waypoint.target;
        state.issued.push(*waypoint);
        Ok(())
    }

    fn synchronize(&mut self) -> Result<()> {
        self.state.lock().synchronize_count += 1;
        Ok(())
    }
}
