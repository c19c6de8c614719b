//! # keyseat Machine
//!
//! Machine-facing layer for keyseat. Defines the collaborator interfaces
//! the cycle core drives — the motion executor and the machine state
//! store — plus the command dispatch registry, the cycle controller that
//! ties validation, geometry, and sequencing to real motion, and a
//! simulated machine for offline expansion and tests.

pub mod config;
pub mod controller;
pub mod dispatch;
pub mod executor;
pub mod keyway;
pub mod program;

pub use config::CycleConfig;
pub use controller::{CycleController, CycleReport, CYCLE_END_MARKER, CYCLE_START_MARKER};
pub use dispatch::{CommandBlock, CommandHandler, CommandRegistry, CommandStatus, HandlerHandle};
pub use executor::{MachineState, MotionExecutor, NoOpExecutor, SimulatedMachine};
pub use keyway::KeywayHandler;
pub use program::ProgramExpander;
