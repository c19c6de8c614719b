//! Error handling for keyseat
//!
//! Provides error types for the layers of the cycle engine:
//! - Validation errors (bad or missing command words)
//! - Geometry errors (infeasible sag compensation)
//! - Machine errors (motion executor and state-store failures)
//!
//! All error types use `thiserror` for ergonomic error handling.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Command word a validation rejection refers to.
///
/// The display form is the reason string surfaced to the operator and
/// matches the word table of the keyway commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterField {
    /// D — final plunge depth
    Depth,
    /// Q (or L in the plain form) — slot length along the travel axis
    Length,
    /// S — tool width
    ToolWidth,
    /// P — depth step per pass
    Step,
    /// R — travel-axis retract distance
    Retract,
    /// F — cutting feed rate
    Feed,
    /// L (or N in the plain form) — repetitions per depth level
    Repetitions,
    /// H — return-to-start flag
    ReturnFlag,
}

impl fmt::Display for ParameterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Depth => write!(f, "depth"),
            Self::Length => write!(f, "length"),
            Self::ToolWidth => write!(f, "tool-width"),
            Self::Step => write!(f, "step"),
            Self::Retract => write!(f, "retract"),
            Self::Feed => write!(f, "feed"),
            Self::Repetitions => write!(f, "repetitions"),
            Self::ReturnFlag => write!(f, "return-flag"),
        }
    }
}

/// Validation error type
///
/// Represents a rejected cycle command. The cycle never starts and no
/// motion is issued when validation fails.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required word is missing from the command block
    #[error("Missing required word for {field}")]
    Missing {
        /// The word that is missing.
        field: ParameterField,
    },

    /// A word that must be strictly positive is zero or negative
    #[error("Word for {field} must be positive, got {value}")]
    NotPositive {
        /// The word that was rejected.
        field: ParameterField,
        /// The rejected value.
        value: f64,
    },

    /// Step per pass exceeds the final depth
    #[error("Step per pass {step} exceeds final depth {depth}")]
    StepExceedsDepth {
        /// The requested step per pass.
        step: f64,
        /// The requested final depth.
        depth: f64,
    },

    /// Repetition count is not a positive integer
    #[error("Repetitions must be an integer >= 1, got {value}")]
    InvalidRepetitions {
        /// The rejected value.
        value: f64,
    },

    /// Return flag is neither 0 nor 1
    #[error("Return flag must be 0 or 1, got {value}")]
    InvalidReturnFlag {
        /// The rejected value.
        value: f64,
    },

    /// No usable feed rate: no F word and no positive ambient feed
    #[error("No positive feed rate available for cutting moves")]
    NoFeedRate,
}

impl ValidationError {
    /// The command word this rejection refers to
    pub fn field(&self) -> ParameterField {
        match self {
            Self::Missing { field } | Self::NotPositive { field, .. } => *field,
            Self::StepExceedsDepth { .. } => ParameterField::Step,
            Self::InvalidRepetitions { .. } => ParameterField::Repetitions,
            Self::InvalidReturnFlag { .. } => ParameterField::ReturnFlag,
            Self::NoFeedRate => ParameterField::Feed,
        }
    }
}

/// Geometry error type
///
/// Sag compensation is geometrically impossible. The cycle aborts before
/// any axis moves.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Tool half-width exceeds the bore radius
    #[error("Tool wider than bore: half width {half_width:.3} exceeds bore radius {bore_radius:.3}")]
    ToolWiderThanBore {
        /// Half of the tool width, in mm.
        half_width: f64,
        /// The bore radius derived from the captured start position, in mm.
        bore_radius: f64,
    },
}

/// Machine error type
///
/// Represents failures of the motion executor or the machine state store.
/// Once motion has begun these are fatal to the running cycle.
#[derive(Error, Debug, Clone)]
pub enum MachineError {
    /// Motion executor rejected a queued move
    #[error("Motion rejected: {reason}")]
    MotionRejected {
        /// The reason the move was rejected.
        reason: String,
    },

    /// Waiting for the motion queue to drain failed
    #[error("Motion queue synchronize failed: {reason}")]
    SyncFailed {
        /// The reason the drain failed.
        reason: String,
    },

    /// Machine position is not available
    #[error("Machine position unavailable: {reason}")]
    PositionUnavailable {
        /// The reason the position could not be read.
        reason: String,
    },

    /// A cycle is already running on this controller
    #[error("A keyway cycle is already active")]
    CycleActive,

    /// Invalid cycle phase transition
    #[error("Invalid cycle phase transition from {current} to {requested}")]
    InvalidPhaseTransition {
        /// The current phase name.
        current: String,
        /// The requested phase name.
        requested: String,
    },
}

/// Main error type for keyseat
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Validation error
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Geometry error
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Machine error
    #[error(transparent)]
    Machine(#[from] MachineError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Check if this is a geometry error
    pub fn is_geometry(&self) -> bool {
        matches!(self, Error::Geometry(_))
    }

    /// Check if this is a machine error
    pub fn is_machine(&self) -> bool {
        matches!(self, Error::Machine(_))
    }

    /// The rejected command word, when this is a validation error
    pub fn rejected_field(&self) -> Option<ParameterField> {
        match self {
            Error::Validation(e) => Some(e.field()),
            _ => None,
        }
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_field_display() {
        assert_eq!(ParameterField::Depth.to_string(), "depth");
        assert_eq!(ParameterField::ToolWidth.to_string(), "tool-width");
        assert_eq!(ParameterField::ReturnFlag.to_string(), "return-flag");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::NotPositive {
            field: ParameterField::Depth,
            value: -2.0,
        };
        assert_eq!(err.to_string(), "Word for depth must be positive, got -2");

        let err = ValidationError::StepExceedsDepth {
            step: 0.5,
            depth: 0.4,
        };
        assert_eq!(err.to_string(), "Step per pass 0.5 exceeds final depth 0.4");
    }

    #[test]
    fn test_validation_error_field() {
        let err = ValidationError::StepExceedsDepth {
            step: 0.5,
            depth: 0.4,
        };
        assert_eq!(err.field(), ParameterField::Step);
        assert_eq!(ValidationError::NoFeedRate.field(), ParameterField::Feed);
    }

    #[test]
    fn test_geometry_error_display() {
        let err = GeometryError::ToolWiderThanBore {
            half_width: 11.0,
            bore_radius: 10.0,
        };
        assert_eq!(
            err.to_string(),
            "Tool wider than bore: half width 11.000 exceeds bore radius 10.000"
        );
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = ValidationError::NoFeedRate.into();
        assert!(err.is_validation());
        assert_eq!(err.rejected_field(), Some(ParameterField::Feed));

        let err: Error = GeometryError::ToolWiderThanBore {
            half_width: 4.0,
            bore_radius: 2.0,
        }
        .into();
        assert!(err.is_geometry());
        assert_eq!(err.rejected_field(), None);

        let err: Error = MachineError::CycleActive.into();
        assert!(err.is_machine());
    }
}
