//! # keyseat
//!
//! A Rust-based internal keyway cycle engine for lathes:
//! - Sag compensation for finite-width tools cutting inside a bore
//! - Deterministic multi-pass waypoint sequencing with repetitions
//! - A cycle controller driving grblHAL-style motion executors
//! - Offline expansion of keyway cycle commands into plain G-code
//!
//! ## Architecture
//!
//! keyseat is organized as a workspace with multiple crates:
//!
//! 1. **keyseat-core** - Core types, errors, events, operator messages
//! 2. **keyseat-cycle** - Word validation, sag geometry, pass sequencing
//! 3. **keyseat-machine** - Executor/state traits, dispatch, controller
//! 4. **keyseat** - Facade and the offline cycle expander binary

pub use keyseat_core::{
    Axis, BufferSink, CycleEvent, CyclePhase, Error, EventDispatcher, GeometryError, LathePoint,
    MachineError, Message, MessageLevel, MessageSink, MotionMode, ParameterField, Result,
    StdoutSink, ValidationError, Waypoint,
};

pub use keyseat_cycle::{
    format_cycle, format_waypoint, write_program, CycleParameters, KeywayArgs, KeywayGeometry,
    KeywaySequencer, MoveKind, SequencedMove, SequencerOptions, ToolWidthRule,
    POSITION_TOLERANCE,
};

pub use keyseat_machine::{
    CommandBlock, CommandHandler, CommandRegistry, CommandStatus, CycleConfig, CycleController,
    CycleReport, HandlerHandle, KeywayHandler, MachineState, MotionExecutor, NoOpExecutor,
    ProgramExpander, SimulatedMachine, CYCLE_END_MARKER, CYCLE_START_MARKER,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output on stderr
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    // Logs go to stderr so the expanded G-code on stdout stays clean
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}
