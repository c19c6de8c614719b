//! Sag compensation geometry
//!
//! When cutting inside a bore the tool has a finite width, so its cutting
//! edge does not lie on the bore surface: referenced to the chord it
//! subtends, the edge sits inward of the nominal radius by a radial
//! offset called sag:
//!
//! ```text
//! sag = R - sqrt(R^2 - (W/2)^2)
//! ```
//!
//! The cycle shifts the starting plunge position inward by sag and
//! increases the commanded depth by sag, so the commanded final depth is
//! reached at the true cutting edge independent of tool width, and the
//! tool is never commanded past the geometrically safe envelope.

use keyseat_core::{GeometryError, LathePoint};
use serde::{Deserialize, Serialize};

/// Compensated geometry for one cycle invocation
///
/// Captured once per cycle from the machine's start position and held
/// immutable for the cycle's duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeywayGeometry {
    /// Plunge-axis position captured at cycle start (mm)
    pub start_plunge: f64,
    /// Travel-axis position captured at cycle start (mm)
    pub start_travel: f64,
    /// Bore radius used for compensation (equals `start_plunge`)
    pub bore_radius: f64,
    /// Radial sag offset (mm, >= 0; zero when compensation is disabled)
    pub sag: f64,
    /// Compensated plunge start: `start_plunge - sag`
    pub compensated_start: f64,
    /// Compensated total depth: `final_depth + sag`
    pub compensated_depth: f64,
    /// Final plunge-axis target: `compensated_start + compensated_depth`
    pub final_target: f64,
}

impl KeywayGeometry {
    /// Compute the compensated geometry from the captured start position.
    ///
    /// A `tool_width` of zero disables compensation: sag is zero and the
    /// compensated values equal the raw ones. With a positive width the
    /// tool half-width must not exceed the bore radius; otherwise the
    /// cycle must abort before any motion.
    pub fn compute(
        start: LathePoint,
        final_depth: f64,
        tool_width: f64,
    ) -> Result<Self, GeometryError> {
        let bore_radius = start.x;

        let sag = if tool_width > 0.0 {
            let half_width = tool_width / 2.0;
            if half_width > bore_radius {
                return Err(GeometryError::ToolWiderThanBore {
                    half_width,
                    bore_radius,
                });
            }
            let center_distance =
                (bore_radius * bore_radius - half_width * half_width).sqrt();
            bore_radius - center_distance
        } else {
            0.0
        };

        let compensated_start = start.x - sag;
        let compensated_depth = final_depth + sag;

        Ok(Self {
            start_plunge: start.x,
            start_travel: start.z,
            bore_radius,
            sag,
            compensated_start,
            compensated_depth,
            final_target: compensated_start + compensated_depth,
        })
    }

    /// The start position captured for this cycle
    pub fn start_point(&self) -> LathePoint {
        LathePoint::new(self.start_plunge, self.start_travel)
    }
}
