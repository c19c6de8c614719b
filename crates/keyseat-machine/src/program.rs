//! Offline program expansion
//!
//! Runs a G-code program against the simulated machine: positioning and
//! modal lines are applied directly, keyway M-commands go through the
//! command registry, and the recorded motion comes back out as plain
//! G0/G1 text. This is how cycle commands are previewed without a
//! machine attached.

use anyhow::{bail, Context, Result};
use keyseat_core::{Message, MessageSink};
use keyseat_cycle::gcode::write_program;
use std::sync::Arc;

use crate::config::CycleConfig;
use crate::controller::CycleController;
use crate::dispatch::{parse_words, CommandRegistry, CommandStatus};
use crate::executor::{MachineState, MotionExecutor, SimulatedMachine};
use crate::keyway::KeywayHandler;
use keyseat_core::Waypoint;

/// Expands keyway cycle commands in a G-code program into plain moves
pub struct ProgramExpander {
    machine: SimulatedMachine,
    registry: CommandRegistry,
    sink: Arc<dyn MessageSink>,
}

impl ProgramExpander {
    /// Create an expander with a fresh simulated machine and both keyway
    /// command forms registered
    pub fn new(sink: Arc<dyn MessageSink>, config: CycleConfig) -> Self {
        let machine = SimulatedMachine::new();
        let controller = Arc::new(CycleController::new(
            Arc::new(machine.clone()),
            Box::new(machine.clone()),
            sink.clone(),
            config,
        ));
        let mut registry = CommandRegistry::new();
        registry.register(Box::new(KeywayHandler::internal(controller.clone())));
        registry.register(Box::new(KeywayHandler::plain(controller)));
        Self {
            machine,
            registry,
            sink,
        }
    }

    /// The simulated machine the program runs against
    pub fn machine(&self) -> &SimulatedMachine {
        &self.machine
    }

    /// Run a program and return the expanded G-code
    pub fn expand(&self, source: &str) -> Result<String> {
        self.machine.clear_issued();
        for (index, raw) in source.lines().enumerate() {
            self.apply_line(index + 1, raw)?;
        }
        let header = vec!["Expanded by keyseat".to_string()];
        write_program(&header, &self.machine.issued())
    }

    fn apply_line(&self, number: usize, raw: &str) -> Result<()> {
        // program start/end marker
        if raw.trim() == "%" {
            return Ok(());
        }
        let words =
            parse_words(raw).with_context(|| format!("line {number}: unreadable block"))?;
        let Some(&(letter, value)) = words.first() else {
            return Ok(());
        };

        match (letter, value) {
            ('G', g) if g == 0.0 || g == 1.0 => self.apply_motion(number, g, &words[1..]),
            // millimeters and absolute coordinates are the native modes
            ('G', g) if g == 21.0 || g == 90.0 => Ok(()),
            ('F', f) if f > 0.0 => {
                self.machine.set_feed_rate(f);
                Ok(())
            }
            // spindle stop and program end need no motion here
            ('M', m) if m == 5.0 || m == 30.0 => Ok(()),
            _ => match self.registry.dispatch_line(raw) {
                CommandStatus::Ok => Ok(()),
                CommandStatus::Unhandled => {
                    self.sink.write(&Message::warning(format!(
                        "line {number} ignored: {}",
                        raw.trim()
                    )));
                    Ok(())
                }
                status => bail!("line {number}: {status}"),
            },
        }
    }

    fn apply_motion(&self, number: usize, g: f64, words: &[(char, f64)]) -> Result<()> {
        let mut target = self
            .machine
            .position_mm()
            .with_context(|| format!("line {number}"))?;
        let mut feed = None;
        for &(letter, value) in words {
            match letter {
                'X' => target.x = value,
                'Z' => target.z = value,
                'F' if value > 0.0 => {
                    self.machine.set_feed_rate(value);
                    feed = Some(value);
                }
                _ => bail!("line {number}: unsupported word {letter}{value}"),
            }
        }

        let waypoint = if g == 0.0 {
            Waypoint::rapid(target.x, target.z)
        } else {
            let Some(feed) = feed.or_else(|| self.machine.feed_rate()) else {
                bail!("line {number}: G1 without a feed rate");
            };
            Waypoint::feed(target.x, target.z, feed)
        };

        let mut executor = self.machine.clone();
        executor
            .queue_move(&waypoint)
            .with_context(|| format!("line {number}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyseat_core::BufferSink;

    #[test]
    fn test_positioning_and_feed_lines() {
        let sink = Arc::new(BufferSink::new());
        let expander = ProgramExpander::new(sink, CycleConfig::default());

        let out = expander
            .expand("G21\nG90\nG0 X10 Z50\nF1000\nG1 X10.5\n")
            .unwrap();
        assert!(out.contains("G0 X10.000 Z50.000"));
        assert!(out.contains("G1 X10.500 Z50.000 F1000.0"));
    }

    #[test]
    fn test_unknown_line_is_skipped_with_warning() {
        let sink = Arc::new(BufferSink::new());
        let expander = ProgramExpander::new(sink.clone(), CycleConfig::default());

        expander.expand("T0101\n").unwrap();
        assert!(sink.lines().iter().any(|l| l.contains("line 1 ignored")));
    }

    #[test]
    fn test_g1_without_feed_fails() {
        let sink = Arc::new(BufferSink::new());
        let expander = ProgramExpander::new(sink, CycleConfig::default());
        assert!(expander.expand("G1 X5\n").is_err());
    }
}
