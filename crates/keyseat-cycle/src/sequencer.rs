//! Pass sequencing for the keyway cycle
//!
//! The sequencer turns validated parameters and compensated geometry into
//! the ordered waypoint stream of the cycle. It is pure and stateless:
//! re-running it with identical inputs yields an identical sequence.
//!
//! ## Contract
//!
//! - The number of radial passes is derived by accumulating the step per
//!   pass against the compensated depth until the remainder drops below
//!   [`POSITION_TOLERANCE`]; a remainder above the tolerance gets one
//!   extra pass whose plunge target is clamped to the final target, so
//!   the tool never overshoots from floating-point step accumulation.
//! - Each pass emits, per repetition: a rapid to the safe position, a
//!   feed plunge to the pass depth, a feed stroke over the full slot
//!   length (full-length strokes evacuate chips from the closed bore),
//!   a rapid clearing the plunge axis, and a rapid back to the safe
//!   position.
//! - An optional zero-penetration pass (pass 0) verifies clearance
//!   before any cutting depth is committed.
//! - A final feed plunge to the exact final target follows the last
//!   pass, independent of step rounding.
//! - Consecutive waypoints whose positions coincide within
//!   [`POSITION_TOLERANCE`] on both axes are elided, so no zero-length
//!   motion command is ever issued.

use keyseat_core::Waypoint;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::geometry::KeywayGeometry;
use crate::params::CycleParameters;

/// Positions closer than this (mm, per axis) are treated as identical
/// for waypoint elision, pass counting, and final-target clamping.
pub const POSITION_TOLERANCE: f64 = 1e-4;

/// Role of a sequenced move within its pass block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveKind {
    /// Initial rapid to the compensated start at the retract position
    Preposition,
    /// Rapid to the safe position ahead of a plunge
    Safe,
    /// Feed plunge to the pass depth
    Plunge,
    /// Feed stroke over the full slot length
    Stroke,
    /// Rapid clearing the plunge axis after a stroke
    ClearPlunge,
    /// Rapid back to the safe position after a stroke
    ClearTravel,
    /// Feed plunge to the exact final target after the last pass
    FinalPlunge,
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preposition => write!(f, "preposition"),
            Self::Safe => write!(f, "safe"),
            Self::Plunge => write!(f, "plunge"),
            Self::Stroke => write!(f, "stroke"),
            Self::ClearPlunge => write!(f, "clear plunge"),
            Self::ClearTravel => write!(f, "clear travel"),
            Self::FinalPlunge => write!(f, "final plunge"),
        }
    }
}

/// One waypoint with its structural context
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SequencedMove {
    /// The motion target handed to the executor
    pub waypoint: Waypoint,
    /// Role of this move within its pass block
    pub kind: MoveKind,
    /// Depth pass index; 0 is the zero-penetration safety pass
    pub pass: u32,
    /// Repetition index within the pass, starting at 1
    /// (0 for moves outside a pass block)
    pub repetition: u32,
}

/// Options modifying sequence generation
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SequencerOptions {
    /// Run a zero-penetration safety pass before the radial passes
    pub safety_pass: bool,
}

impl Default for SequencerOptions {
    fn default() -> Self {
        Self { safety_pass: true }
    }
}

/// Generator for the keyway pass sequence
pub struct KeywaySequencer {
    params: CycleParameters,
    geometry: KeywayGeometry,
    options: SequencerOptions,
}

impl KeywaySequencer {
    /// Create a new sequencer over validated parameters and geometry
    pub fn new(
        params: CycleParameters,
        geometry: KeywayGeometry,
        options: SequencerOptions,
    ) -> Self {
        Self {
            params,
            geometry,
            options,
        }
    }

    /// Number of radial passes for this cycle.
    ///
    /// Counted by step accumulation against the compensated depth: the
    /// count is exact when the depth divides evenly by the step, and a
    /// remainder above [`POSITION_TOLERANCE`] adds one clamped pass.
    pub fn pass_count(&self) -> u32 {
        let depth = self.geometry.compensated_depth;
        let step = self.params.step_per_pass;
        let mut passes = 0u32;
        let mut reached = 0.0;
        while depth - reached > POSITION_TOLERANCE {
            reached += step;
            passes += 1;
        }
        passes
    }

    /// Plunge-axis target for pass `pass`, clamped to the final target.
    ///
    /// Pass 0 is the zero-penetration safety pass and targets the
    /// compensated start.
    pub fn plunge_target(&self, pass: u32) -> f64 {
        if pass == 0 {
            return self.geometry.compensated_start;
        }
        let raw = self.geometry.compensated_start + pass as f64 * self.params.step_per_pass;
        raw.min(self.geometry.final_target)
    }

    /// Generate the full ordered move sequence, with zero-length moves
    /// elided.
    pub fn generate(&self) -> Vec<SequencedMove> {
        Self::elide(self.emit_all())
    }

    /// The waypoint ending the cycle: the captured start position when
    /// `return_to_start` is set, the safe position otherwise.
    pub fn final_return(&self) -> Waypoint {
        if self.params.return_to_start {
            Waypoint::rapid(self.geometry.start_plunge, self.geometry.start_travel)
        } else {
            Waypoint::rapid(self.geometry.compensated_start, self.safe_travel())
        }
    }

    fn safe_travel(&self) -> f64 {
        self.geometry.start_travel + self.params.retract
    }

    fn cut_travel(&self) -> f64 {
        self.geometry.start_travel - self.params.slot_length
    }

    /// Raw emission order, before elision
    fn emit_all(&self) -> Vec<SequencedMove> {
        let g = &self.geometry;
        let passes = self.pass_count();
        debug!(
            passes,
            repetitions = self.params.repetitions,
            safety_pass = self.options.safety_pass,
            "sequencing keyway cycle"
        );

        let mut moves = Vec::new();
        moves.push(SequencedMove {
            waypoint: Waypoint::rapid(g.compensated_start, self.safe_travel()),
            kind: MoveKind::Preposition,
            pass: 0,
            repetition: 0,
        });

        if self.options.safety_pass {
            self.emit_pass(0, &mut moves);
        }
        for pass in 1..=passes {
            self.emit_pass(pass, &mut moves);
        }

        moves.push(SequencedMove {
            waypoint: Waypoint::feed(g.final_target, self.safe_travel(), self.params.feed_rate),
            kind: MoveKind::FinalPlunge,
            pass: passes,
            repetition: 0,
        });
        moves
    }

    fn emit_pass(&self, pass: u32, moves: &mut Vec<SequencedMove>) {
        let g = &self.geometry;
        let feed = self.params.feed_rate;
        let x = self.plunge_target(pass);
        let safe_z = self.safe_travel();
        let cut_z = self.cut_travel();

        for repetition in 1..=self.params.repetitions {
            let block = [
                (MoveKind::Safe, Waypoint::rapid(g.compensated_start, safe_z)),
                (MoveKind::Plunge, Waypoint::feed(x, safe_z, feed)),
                (MoveKind::Stroke, Waypoint::feed(x, cut_z, feed)),
                (
                    MoveKind::ClearPlunge,
                    Waypoint::rapid(g.compensated_start, cut_z),
                ),
                (
                    MoveKind::ClearTravel,
                    Waypoint::rapid(g.compensated_start, safe_z),
                ),
            ];
            for (kind, waypoint) in block {
                moves.push(SequencedMove {
                    waypoint,
                    kind,
                    pass,
                    repetition,
                });
            }
        }
    }

    /// Drop moves whose target coincides with the previously kept one
    fn elide(moves: Vec<SequencedMove>) -> Vec<SequencedMove> {
        let mut kept: Vec<SequencedMove> = Vec::with_capacity(moves.len());
        for m in moves {
            if let Some(last) = kept.last() {
                if m.waypoint.is_coincident(&last.waypoint, POSITION_TOLERANCE) {
                    continue;
                }
            }
            kept.push(m);
        }
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyseat_core::{LathePoint, MotionMode};

    fn params(depth: f64, step: f64) -> CycleParameters {
        CycleParameters {
            final_depth: depth,
            slot_length: 10.0,
            tool_width: 0.0,
            step_per_pass: step,
            retract: 2.0,
            feed_rate: 1000.0,
            repetitions: 1,
            return_to_start: true,
        }
    }

    fn sequencer(depth: f64, step: f64, safety_pass: bool) -> KeywaySequencer {
        let p = params(depth, step);
        let g = KeywayGeometry::compute(LathePoint::new(10.0, 50.0), depth, 0.0).unwrap();
        KeywaySequencer::new(p, g, SequencerOptions { safety_pass })
    }

    #[test]
    fn test_pass_count_exact_division() {
        // D2 P0.5: exactly 4 passes, no truncated extra pass
        assert_eq!(sequencer(2.0, 0.5, false).pass_count(), 4);
        assert_eq!(sequencer(2.0, 2.0, false).pass_count(), 1);
    }

    #[test]
    fn test_pass_count_with_remainder() {
        // D2 P0.6: 3 full steps + one clamped pass
        assert_eq!(sequencer(2.0, 0.6, false).pass_count(), 4);
        // a remainder below the tolerance does not get its own pass
        assert_eq!(sequencer(2.0 + 0.5e-4, 0.5, false).pass_count(), 4);
    }

    #[test]
    fn test_plunge_target_clamped_to_final() {
        let seq = sequencer(2.0, 0.6, false);
        assert!((seq.plunge_target(1) - 10.6).abs() < 1e-9);
        assert!((seq.plunge_target(3) - 11.8).abs() < 1e-9);
        // pass 4 would reach 12.4 unclamped
        assert_eq!(seq.plunge_target(4), 12.0);
    }

    #[test]
    fn test_raw_blocks_are_five_moves_per_repetition() {
        // D2 Q10 S0 P0.5 R2: 4 radial passes, each a 5-waypoint block
        let seq = sequencer(2.0, 0.5, false);
        let raw = seq.emit_all();

        for pass in 1..=4u32 {
            let block: Vec<_> = raw.iter().filter(|m| m.pass == pass && m.repetition == 1).collect();
            assert_eq!(block.len(), 5, "pass {pass}");
            assert_eq!(block[0].kind, MoveKind::Safe);
            assert_eq!(block[1].kind, MoveKind::Plunge);
            assert_eq!(block[2].kind, MoveKind::Stroke);
            assert_eq!(block[3].kind, MoveKind::ClearPlunge);
            assert_eq!(block[4].kind, MoveKind::ClearTravel);
        }

        // final plunge reaches exactly start + depth
        let last = raw.last().unwrap();
        assert_eq!(last.kind, MoveKind::FinalPlunge);
        assert_eq!(last.waypoint.target, LathePoint::new(12.0, 52.0));
        assert_eq!(last.waypoint.mode, MotionMode::Feed(1000.0));
    }

    #[test]
    fn test_block_geometry() {
        let seq = sequencer(2.0, 0.5, false);
        let raw = seq.emit_all();

        let stroke = raw
            .iter()
            .find(|m| m.pass == 2 && m.kind == MoveKind::Stroke)
            .unwrap();
        // pass 2 cuts at X 10 + 2*0.5 over the full slot length
        assert_eq!(stroke.waypoint.target, LathePoint::new(11.0, 40.0));

        let safe = raw
            .iter()
            .find(|m| m.pass == 2 && m.kind == MoveKind::Safe)
            .unwrap();
        assert_eq!(safe.waypoint.target, LathePoint::new(10.0, 52.0));
        assert!(safe.waypoint.mode.is_rapid());
    }

    #[test]
    fn test_plunge_never_exceeds_final_target() {
        for (depth, step) in [(2.0, 0.5), (2.0, 0.6), (0.7, 0.3), (5.0, 1.7)] {
            let seq = sequencer(depth, step, true);
            let final_target = 10.0 + depth;
            for m in seq.generate() {
                assert!(
                    m.waypoint.target.x <= final_target + 1e-9,
                    "D{depth} P{step}: {:?} exceeds {final_target}",
                    m
                );
            }
        }
    }

    #[test]
    fn test_elision_removes_zero_length_moves() {
        let seq = sequencer(2.0, 0.5, false);
        let moves = seq.generate();

        for pair in moves.windows(2) {
            assert!(
                !pair[0].waypoint.is_coincident(&pair[1].waypoint, POSITION_TOLERANCE),
                "consecutive coincident waypoints survived elision: {:?}",
                pair
            );
        }

        // the Safe move of each block coincides with the previous
        // block's ClearTravel and must be gone
        assert!(!moves
            .iter()
            .any(|m| m.pass >= 2 && m.kind == MoveKind::Safe));
    }

    #[test]
    fn test_safety_pass_present_and_harmless() {
        let seq = sequencer(2.0, 0.5, true);
        let moves = seq.generate();

        // pass 0 survives elision only where it actually moves: the
        // stroke out and the travel back
        let pass0: Vec<_> = moves.iter().filter(|m| m.pass == 0 && m.repetition == 1).collect();
        assert_eq!(pass0.len(), 2);
        assert_eq!(pass0[0].kind, MoveKind::Stroke);
        assert_eq!(pass0[1].kind, MoveKind::ClearTravel);
        // zero penetration: the stroke stays at the compensated start
        assert_eq!(pass0[0].waypoint.target.x, 10.0);

        let seq = sequencer(2.0, 0.5, false);
        assert!(!seq.generate().iter().any(|m| m.pass == 0 && m.repetition > 0));
    }

    #[test]
    fn test_repetitions_repeat_each_level() {
        let mut p = params(1.0, 0.5);
        p.repetitions = 3;
        let g = KeywayGeometry::compute(LathePoint::new(10.0, 50.0), 1.0, 0.0).unwrap();
        let seq = KeywaySequencer::new(p, g, SequencerOptions { safety_pass: false });

        let strokes: Vec<_> = seq
            .generate()
            .into_iter()
            .filter(|m| m.pass == 1 && m.kind == MoveKind::Stroke)
            .collect();
        assert_eq!(strokes.len(), 3);
        assert!(strokes.iter().all(|m| m.waypoint.target.x == 10.5));
    }

    #[test]
    fn test_sequencer_is_deterministic() {
        let seq = sequencer(2.0, 0.6, true);
        assert_eq!(seq.generate(), seq.generate());
    }

    #[test]
    fn test_final_return_targets() {
        let seq = sequencer(2.0, 0.5, false);
        // H1: back to the captured start
        assert_eq!(seq.final_return().target, LathePoint::new(10.0, 50.0));

        let mut p = params(2.0, 0.5);
        p.return_to_start = false;
        let g = KeywayGeometry::compute(LathePoint::new(10.0, 50.0), 2.0, 0.0).unwrap();
        let seq = KeywaySequencer::new(p, g, SequencerOptions::default());
        // H0: park at the safe position instead
        assert_eq!(seq.final_return().target, LathePoint::new(10.0, 52.0));
    }

    #[test]
    fn test_compensated_sequence_starts_inward() {
        // with sag compensation the whole cycle runs from the shifted start
        let p = CycleParameters {
            tool_width: 8.0,
            ..params(2.0, 0.5)
        };
        let g = KeywayGeometry::compute(LathePoint::new(10.0, 50.0), 2.0, 8.0).unwrap();
        let seq = KeywaySequencer::new(p, g, SequencerOptions { safety_pass: false });
        let moves = seq.generate();

        let first = moves.first().unwrap();
        assert_eq!(first.kind, MoveKind::Preposition);
        assert!((first.waypoint.target.x - 9.165).abs() < 1e-3);

        let last = moves.last().unwrap();
        assert_eq!(last.kind, MoveKind::FinalPlunge);
        assert!((last.waypoint.target.x - 12.0).abs() < 1e-3);
    }
}
