//! Keyway cycle controller
//!
//! Drives one cycle invocation through its phases: capture the start
//! position, compute the compensated geometry, issue the sequenced
//! waypoints to the motion executor in strict order, and close with the
//! final return and a full motion-queue drain. The `CYCLE END` marker is
//! only emitted after the drain, so no observer ever sees completion
//! before the last axis move has physically finished.

use keyseat_core::{
    CycleEvent, CyclePhase, EventDispatcher, LathePoint, MachineError, Message, MessageSink,
    Result,
};
use keyseat_cycle::{
    CycleParameters, KeywayGeometry, KeywaySequencer, MoveKind, SequencedMove, SequencerOptions,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::CycleConfig;
use crate::executor::{MachineState, MotionExecutor};

/// Marker written to the operator stream when a cycle begins
pub const CYCLE_START_MARKER: &str = "KEYWAY CYCLE START";
/// Marker written to the operator stream after the motion queue drains
pub const CYCLE_END_MARKER: &str = "KEYWAY CYCLE END";

/// Per-invocation cycle state, owned exclusively by the running controller
#[derive(Debug, Clone, Copy)]
struct CycleState {
    phase: CyclePhase,
    pass: u32,
    repetition: u32,
}

impl CycleState {
    fn new() -> Self {
        Self {
            phase: CyclePhase::Idle,
            pass: 0,
            repetition: 0,
        }
    }

    fn advance(&mut self, to: CyclePhase) -> Result<()> {
        if self.phase == to {
            return Ok(());
        }
        if !self.phase.can_transition_to(to) {
            return Err(MachineError::InvalidPhaseTransition {
                current: self.phase.to_string(),
                requested: to.to_string(),
            }
            .into());
        }
        self.phase = to;
        Ok(())
    }
}

/// Summary of a completed cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Start position captured for the cycle
    pub start: LathePoint,
    /// Compensated geometry the cycle ran with
    pub geometry: KeywayGeometry,
    /// Number of radial passes
    pub passes: u32,
    /// Number of waypoints handed to the executor
    pub waypoints_issued: usize,
}

fn phase_for(m: &SequencedMove) -> CyclePhase {
    match m.kind {
        MoveKind::Preposition => CyclePhase::Positioning,
        MoveKind::FinalPlunge => CyclePhase::RadialPasses,
        _ if m.pass == 0 => CyclePhase::FirstPass,
        _ => CyclePhase::RadialPasses,
    }
}

/// Cycle controller over a machine state store and a motion executor.
///
/// One controller serves one machine; the executor is held behind a lock
/// for the full duration of a cycle, so a second concurrent cycle is
/// rejected with [`MachineError::CycleActive`].
pub struct CycleController {
    machine: Arc<dyn MachineState>,
    executor: Mutex<Box<dyn MotionExecutor>>,
    sink: Arc<dyn MessageSink>,
    events: EventDispatcher,
    config: CycleConfig,
}

impl CycleController {
    /// Create a controller over the given collaborators
    pub fn new(
        machine: Arc<dyn MachineState>,
        executor: Box<dyn MotionExecutor>,
        sink: Arc<dyn MessageSink>,
        config: CycleConfig,
    ) -> Self {
        let events = EventDispatcher::new(config.event_buffer);
        Self {
            machine,
            executor: Mutex::new(executor),
            sink,
            events,
            config,
        }
    }

    /// Subscribe to cycle progress events
    pub fn subscribe(&self) -> broadcast::Receiver<CycleEvent> {
        self.events.subscribe()
    }

    /// The controller's configuration
    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    /// The machine's ambient feed rate, for command validation
    pub fn ambient_feed(&self) -> Option<f64> {
        self.machine.feed_rate()
    }

    /// Execute one keyway cycle with the configured safety-pass setting
    pub fn run(&self, params: &CycleParameters) -> Result<CycleReport> {
        self.run_with(
            params,
            SequencerOptions {
                safety_pass: self.config.safety_pass,
            },
        )
    }

    /// Execute one keyway cycle.
    ///
    /// Blocks until the cycle's motion has physically completed. Fails
    /// with [`MachineError::CycleActive`] if another cycle holds the
    /// executor.
    pub fn run_with(
        &self,
        params: &CycleParameters,
        options: SequencerOptions,
    ) -> Result<CycleReport> {
        let mut executor = self
            .executor
            .try_lock()
            .ok_or(MachineError::CycleActive)?;
        let mut state = CycleState::new();

        match self.execute(&mut state, executor.as_mut(), params, options) {
            Ok(report) => Ok(report),
            Err(e) => {
                let _ = state.advance(CyclePhase::Aborted);
                debug!(
                    phase = %state.phase,
                    pass = state.pass,
                    repetition = state.repetition,
                    "cycle aborted"
                );
                self.emit(CycleEvent::PhaseChanged(CyclePhase::Aborted));
                self.emit(CycleEvent::CycleAborted(e.to_string()));
                Err(e)
            }
        }
    }

    fn emit(&self, event: CycleEvent) {
        self.events.publish(event);
    }

    fn execute(
        &self,
        state: &mut CycleState,
        executor: &mut dyn MotionExecutor,
        params: &CycleParameters,
        options: SequencerOptions,
    ) -> Result<CycleReport> {
        state.advance(CyclePhase::Positioning)?;
        self.emit(CycleEvent::PhaseChanged(CyclePhase::Positioning));

        // Drain in-flight motion so the captured position is the true
        // start; it is read exactly once and held for the whole cycle.
        executor.synchronize()?;
        let start = self.machine.position_mm()?;

        self.sink.write(&Message::info(CYCLE_START_MARKER));
        self.emit(CycleEvent::CycleStarted { start });
        info!(%start, "keyway cycle started");

        let geometry =
            match KeywayGeometry::compute(start, params.final_depth, params.tool_width) {
                Ok(g) => g,
                Err(e) => {
                    // Abort before any motion; the operator still sees
                    // both markers around the warning.
                    self.sink.write(&Message::warning(format!("keyway: {e}")));
                    self.sink.write(&Message::info(CYCLE_END_MARKER));
                    return Err(e.into());
                }
            };

        if self.config.trace_moves {
            self.sink.write(&Message::debug(format!(
                "geometry: bore R={:.3} sag={:.3} start X={:.3} depth={:.3} target X={:.3}",
                geometry.bore_radius,
                geometry.sag,
                geometry.compensated_start,
                geometry.compensated_depth,
                geometry.final_target
            )));
        }

        let sequencer = KeywaySequencer::new(*params, geometry, options);
        let moves = sequencer.generate();
        let passes = sequencer.pass_count();
        debug!(passes, moves = moves.len(), "cycle sequenced");

        let mut issued = 0usize;
        let mut announced: Option<(u32, u32)> = None;
        for m in &moves {
            let phase = phase_for(m);
            if state.phase != phase {
                state.advance(phase)?;
                self.emit(CycleEvent::PhaseChanged(phase));
            }
            if m.repetition >= 1 && announced != Some((m.pass, m.repetition)) {
                announced = Some((m.pass, m.repetition));
                state.pass = m.pass;
                state.repetition = m.repetition;
                self.emit(CycleEvent::PassStarted {
                    pass: m.pass,
                    repetition: m.repetition,
                    plunge_target: sequencer.plunge_target(m.pass),
                });
            }
            if self.config.trace_moves {
                self.sink.write(&Message::debug(format!(
                    "{} [{}] (pass={} rep={})",
                    m.waypoint, m.kind, m.pass, m.repetition
                )));
            }
            executor.queue_move(&m.waypoint)?;
            issued += 1;
            self.emit(CycleEvent::WaypointIssued(m.waypoint));
        }

        state.advance(CyclePhase::FinalReturn)?;
        self.emit(CycleEvent::PhaseChanged(CyclePhase::FinalReturn));
        let ret = sequencer.final_return();
        if self.config.trace_moves {
            self.sink
                .write(&Message::debug(format!("{} [return]", ret)));
        }
        executor.queue_move(&ret)?;
        issued += 1;
        self.emit(CycleEvent::WaypointIssued(ret));

        // The end marker must never precede physical completion.
        executor.synchronize()?;
        self.sink.write(&Message::info(CYCLE_END_MARKER));
        state.advance(CyclePhase::Done)?;
        self.emit(CycleEvent::PhaseChanged(CyclePhase::Done));
        self.emit(CycleEvent::CycleCompleted);
        info!(passes, issued, "keyway cycle complete");

        Ok(CycleReport {
            start,
            geometry,
            passes,
            waypoints_issued: issued,
        })
    }
}
