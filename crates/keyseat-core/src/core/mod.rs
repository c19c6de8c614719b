//! Core abstractions: cycle events and the operator message stream

pub mod event;
pub mod message;

pub use self::event::{CycleEvent, EventDispatcher};
pub use self::message::{BufferSink, Message, MessageLevel, MessageSink, StdoutSink};
