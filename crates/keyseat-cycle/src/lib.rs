//! # keyseat Cycle
//!
//! This crate provides the CAM content of the keyway cycle: everything
//! that can be computed without touching a machine.
//!
//! ## Components
//!
//! - **Parameters**: raw command words and the ordered validation rules
//!   that turn them into an immutable parameter set
//! - **Geometry**: sag compensation for a finite-width tool cutting
//!   inside a bore
//! - **Sequencer**: the pure, deterministic multi-pass waypoint generator
//! - **G-code**: rendering of sequenced moves as plain G0/G1 text
//!
//! All components are pure and hold no state across calls; re-running any
//! of them with identical inputs yields identical output.

pub mod gcode;
pub mod geometry;
pub mod params;
pub mod sequencer;

pub use gcode::{format_cycle, format_waypoint, write_program};
pub use geometry::KeywayGeometry;
pub use params::{CycleParameters, KeywayArgs, ToolWidthRule};
pub use sequencer::{
    KeywaySequencer, MoveKind, SequencedMove, SequencerOptions, POSITION_TOLERANCE,
};
