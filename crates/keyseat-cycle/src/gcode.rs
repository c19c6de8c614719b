//! G-code rendering of sequenced moves
//!
//! Renders waypoint streams as plain G0/G1 text, for offline expansion of
//! the cycle and for program export.

use anyhow::Result;
use keyseat_core::{MotionMode, Waypoint};
use std::fmt::Write as _;

use crate::geometry::KeywayGeometry;
use crate::params::CycleParameters;
use crate::sequencer::SequencedMove;

/// Format one waypoint as a G-code line
pub fn format_waypoint(wp: &Waypoint) -> String {
    match wp.mode {
        MotionMode::Rapid => format!("G0 X{:.3} Z{:.3}", wp.target.x, wp.target.z),
        MotionMode::Feed(rate) => format!(
            "G1 X{:.3} Z{:.3} F{:.1}",
            wp.target.x, wp.target.z, rate
        ),
    }
}

/// Render one sequenced keyway cycle as a G-code fragment with a
/// descriptive header
pub fn format_cycle(
    params: &CycleParameters,
    geometry: &KeywayGeometry,
    moves: &[SequencedMove],
) -> Result<String> {
    let mut gcode = String::new();

    // Header
    writeln!(gcode, "; Internal keyway cycle")?;
    writeln!(gcode, "; Final depth: {:.3} mm", params.final_depth)?;
    writeln!(gcode, "; Slot length: {:.3} mm", params.slot_length)?;
    if geometry.sag > 0.0 {
        writeln!(
            gcode,
            "; Tool width: {:.3} mm, sag compensation: {:.3} mm",
            params.tool_width, geometry.sag
        )?;
    }
    writeln!(
        gcode,
        "; Start: X{:.3} Z{:.3}, final target: X{:.3}",
        geometry.start_plunge, geometry.start_travel, geometry.final_target
    )?;

    for m in moves {
        writeln!(gcode, "{}", format_waypoint(&m.waypoint))?;
    }

    Ok(gcode)
}

/// Render an expanded program: header comment lines followed by one
/// G-code line per waypoint
pub fn write_program(header: &[String], waypoints: &[Waypoint]) -> Result<String> {
    let mut gcode = String::new();
    for line in header {
        writeln!(gcode, "; {}", line)?;
    }
    for wp in waypoints {
        writeln!(gcode, "{}", format_waypoint(wp))?;
    }
    Ok(gcode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ToolWidthRule;
    use crate::sequencer::{KeywaySequencer, SequencerOptions};
    use crate::KeywayArgs;
    use keyseat_core::LathePoint;

    #[test]
    fn test_format_waypoint() {
        assert_eq!(
            format_waypoint(&Waypoint::rapid(9.165, 52.0)),
            "G0 X9.165 Z52.000"
        );
        assert_eq!(
            format_waypoint(&Waypoint::feed(10.5, 40.0, 1000.0)),
            "G1 X10.500 Z40.000 F1000.0"
        );
    }

    #[test]
    fn test_format_cycle_contains_moves_and_header() {
        let args = KeywayArgs {
            depth: Some(2.0),
            length: Some(10.0),
            tool_width: Some(8.0),
            step: Some(0.5),
            retract: Some(2.0),
            feed: Some(1000.0),
            ..Default::default()
        };
        let params = args.validate(ToolWidthRule::Required, None).unwrap();
        let geometry =
            KeywayGeometry::compute(LathePoint::new(10.0, 50.0), 2.0, 8.0).unwrap();
        let seq = KeywaySequencer::new(params, geometry, SequencerOptions::default());

        let gcode = format_cycle(&params, &geometry, &seq.generate()).unwrap();
        assert!(gcode.starts_with("; Internal keyway cycle\n"));
        assert!(gcode.contains("sag compensation"));
        assert!(gcode.contains("G0 X9.165 Z52.000"));
        assert!(gcode.contains("G1 X12.000 Z52.000 F1000.0"));
    }

    #[test]
    fn test_write_program() {
        let out = write_program(
            &["Expanded by keyseat".to_string()],
            &[Waypoint::rapid(10.0, 52.0), Waypoint::feed(10.5, 40.0, 800.0)],
        )
        .unwrap();
        assert_eq!(
            out,
            "; Expanded by keyseat\nG0 X10.000 Z52.000\nG1 X10.500 Z40.000 F800.0\n"
        );
    }
}
