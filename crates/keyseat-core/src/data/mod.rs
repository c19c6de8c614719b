//! Data models for lathe positions, waypoints, and cycle phase
//!
//! This module provides:
//! - Two-axis lathe coordinates (plunge X, travel Z)
//! - Motion waypoints tagged rapid or feed
//! - The cycle phase state machine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lathe axes relevant to the keyway cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    /// Radial plunge axis (X)
    Plunge,
    /// Longitudinal travel axis (Z)
    Travel,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plunge => write!(f, "X"),
            Self::Travel => write!(f, "Z"),
        }
    }
}

/// A point in the lathe's X/Z plane, millimeters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LathePoint {
    /// Plunge-axis (X) position
    pub x: f64,
    /// Travel-axis (Z) position
    pub z: f64,
}

impl LathePoint {
    /// Create a new point
    pub fn new(x: f64, z: f64) -> Self {
        debug_assert!(
            x.is_finite() && z.is_finite(),
            "LathePoint axes must be finite: x={x}, z={z}"
        );
        Self { x, z }
    }

    /// Copy of this point with the plunge axis replaced
    pub fn with_x(self, x: f64) -> Self {
        Self { x, ..self }
    }

    /// Copy of this point with the travel axis replaced
    pub fn with_z(self, z: f64) -> Self {
        Self { z, ..self }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &LathePoint) -> f64 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Check whether both axes are within `tolerance` of another point
    pub fn approx_eq(&self, other: &LathePoint, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.z - other.z).abs() <= tolerance
    }
}

impl Default for LathePoint {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl fmt::Display for LathePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X:{:.3} Z:{:.3}", self.x, self.z)
    }
}

/// Motion mode for a waypoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MotionMode {
    /// Maximum-rate positioning move, no cutting
    Rapid,
    /// Controlled cutting move at the given feed rate (mm/min)
    Feed(f64),
}

impl MotionMode {
    /// Check if this is a rapid-traverse move
    pub fn is_rapid(&self) -> bool {
        matches!(self, Self::Rapid)
    }

    /// Feed rate of a cutting move, `None` for rapids
    pub fn feed_rate(&self) -> Option<f64> {
        match self {
            Self::Rapid => None,
            Self::Feed(rate) => Some(*rate),
        }
    }
}

impl fmt::Display for MotionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rapid => write!(f, "rapid"),
            Self::Feed(rate) => write!(f, "feed {:.1} mm/min", rate),
        }
    }
}

/// A single motion target in the cycle's emission order
///
/// Waypoints are issued strictly in emission order; no reordering or
/// batching is permitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Target position
    pub target: LathePoint,
    /// Rapid or feed motion
    pub mode: MotionMode,
}

impl Waypoint {
    /// Create a rapid-traverse waypoint
    pub fn rapid(x: f64, z: f64) -> Self {
        Self {
            target: LathePoint::new(x, z),
            mode: MotionMode::Rapid,
        }
    }

    /// Create a cutting-feed waypoint
    pub fn feed(x: f64, z: f64, feed_rate: f64) -> Self {
        Self {
            target: LathePoint::new(x, z),
            mode: MotionMode::Feed(feed_rate),
        }
    }

    /// Check whether this waypoint targets the same position as another,
    /// within `tolerance` per axis
    pub fn is_coincident(&self, other: &Waypoint, tolerance: f64) -> bool {
        self.target.approx_eq(&other.target, tolerance)
    }
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            MotionMode::Rapid => write!(f, "G0 X{:.3} Z{:.3}", self.target.x, self.target.z),
            MotionMode::Feed(rate) => write!(
                f,
                "G1 X{:.3} Z{:.3} F{:.1}",
                self.target.x, self.target.z, rate
            ),
        }
    }
}

/// Cycle phase state machine states
///
/// Tracks one cycle invocation from parameter acceptance through the final
/// motion-queue drain. `Done` and `Aborted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CyclePhase {
    /// No cycle running
    Idle,
    /// Start position captured, pre-positioning in progress
    Positioning,
    /// Zero-penetration safety pass
    FirstPass,
    /// Progressive depth passes
    RadialPasses,
    /// Returning to the start or parking position
    FinalReturn,
    /// Cycle complete, motion queue drained
    Done,
    /// Cycle aborted before completion
    Aborted,
}

impl CyclePhase {
    /// Check if this phase is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    /// Check if a cycle is in progress in this phase
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle) && !self.is_terminal()
    }

    /// Check if a transition from this phase to `target` is valid.
    ///
    /// Returns `true` for valid transitions:
    /// - Idle starts a cycle via Positioning, or aborts on validation failure
    /// - Positioning proceeds to FirstPass or straight to RadialPasses
    ///   (safety pass disabled); a degenerate cycle whose depth is below
    ///   the motion tolerance skips ahead to FinalReturn
    /// - Every non-terminal phase can abort
    /// - Done and Aborted are terminal
    pub fn can_transition_to(&self, target: CyclePhase) -> bool {
        use CyclePhase::*;
        if *self == target {
            return true;
        }
        match (self, target) {
            (Idle, Positioning | Aborted) => true,
            (Positioning, FirstPass | RadialPasses | FinalReturn | Aborted) => true,
            (FirstPass, RadialPasses | FinalReturn | Aborted) => true,
            (RadialPasses, FinalReturn | Aborted) => true,
            (FinalReturn, Done | Aborted) => true,
            _ => false,
        }
    }
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Positioning => write!(f, "Positioning"),
            Self::FirstPass => write!(f, "FirstPass"),
            Self::RadialPasses => write!(f, "RadialPasses"),
            Self::FinalReturn => write!(f, "FinalReturn"),
            Self::Done => write!(f, "Done"),
            Self::Aborted => write!(f, "Aborted"),
        }
    }
}
