//! # keyseat Core
//!
//! Core types, traits, and utilities for keyseat.
//! Provides the fundamental abstractions for cycle state, waypoints,
//! events, and the operator message stream.

pub mod core;
pub mod data;
pub mod error;

pub use crate::core::{
    event::{CycleEvent, EventDispatcher},
    message::{BufferSink, Message, MessageLevel, MessageSink, StdoutSink},
};

pub use data::{Axis, CyclePhase, LathePoint, MotionMode, Waypoint};

pub use error::{
    Error, GeometryError, MachineError, ParameterField, Result, ValidationError,
};
