//! Keyway cycle parameters and validation
//!
//! Raw command words arrive as optional values; validation applies the
//! rules below in order, first failure wins, and produces an immutable
//! [`CycleParameters`] value:
//!
//! 1. depth, length, step, and retract must be strictly positive
//! 2. tool width must be positive when the command form compensates sag
//! 3. step must not exceed depth
//! 4. repetitions, when supplied, must be an integer >= 1 (default 1)
//! 5. the resolved feed rate must be positive — an explicit F word
//!    overrides, otherwise the machine's ambient feed applies
//! 6. the return flag, when supplied, must be exactly 0 or 1 (default 1)
//!
//! Validation has no side effects; a rejection names the offending word.

use keyseat_core::{ParameterField, ValidationError};
use serde::{Deserialize, Serialize};

/// Raw command words for a keyway cycle, before validation
///
/// Each field mirrors one word of the cycle command; `None` means the
/// word was absent from the block.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct KeywayArgs {
    /// D — final plunge depth (mm)
    pub depth: Option<f64>,
    /// Q, or L in the plain form — slot length along the travel axis (mm)
    pub length: Option<f64>,
    /// S — tool width for sag compensation (mm)
    pub tool_width: Option<f64>,
    /// P — depth step per pass (mm)
    pub step: Option<f64>,
    /// R — travel-axis retract before each plunge (mm)
    pub retract: Option<f64>,
    /// F — cutting feed override (mm/min)
    pub feed: Option<f64>,
    /// L, or N in the plain form — repetitions per depth level
    pub repetitions: Option<f64>,
    /// H — return-to-start flag (0 or 1)
    pub return_flag: Option<f64>,
}

/// How a command form interprets the tool-width word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolWidthRule {
    /// Tool width is required and must be positive (sag compensation)
    Required,
    /// Tool width is optional; absent or zero disables compensation
    Optional,
}

/// Validated, immutable cycle parameters
///
/// Invariant: `step_per_pass <= final_depth` is enforced at validation
/// time and never violated afterward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleParameters {
    /// Final plunge depth (mm, > 0)
    pub final_depth: f64,
    /// Slot length along the travel axis (mm, > 0)
    pub slot_length: f64,
    /// Tool width (mm, >= 0; zero disables sag compensation)
    pub tool_width: f64,
    /// Depth step per pass (mm, > 0, <= final_depth)
    pub step_per_pass: f64,
    /// Travel-axis retract distance before each plunge (mm, > 0)
    pub retract: f64,
    /// Feed rate for cutting moves (mm/min, > 0)
    pub feed_rate: f64,
    /// Repetitions per depth level (>= 1)
    pub repetitions: u32,
    /// Return to the captured start position at the end of the cycle
    pub return_to_start: bool,
}

fn require_positive(
    field: ParameterField,
    value: Option<f64>,
) -> Result<f64, ValidationError> {
    match value {
        None => Err(ValidationError::Missing { field }),
        Some(v) if v > 0.0 => Ok(v),
        Some(v) => Err(ValidationError::NotPositive { field, value: v }),
    }
}

impl KeywayArgs {
    /// Validate the raw words into an immutable parameter set.
    ///
    /// `ambient_feed` is the machine's currently active feed rate, used
    /// when the block carries no F word.
    pub fn validate(
        &self,
        rule: ToolWidthRule,
        ambient_feed: Option<f64>,
    ) -> Result<CycleParameters, ValidationError> {
        let final_depth = require_positive(ParameterField::Depth, self.depth)?;
        let slot_length = require_positive(ParameterField::Length, self.length)?;
        let step_per_pass = require_positive(ParameterField::Step, self.step)?;
        let retract = require_positive(ParameterField::Retract, self.retract)?;

        let tool_width = match rule {
            ToolWidthRule::Required => {
                require_positive(ParameterField::ToolWidth, self.tool_width)?
            }
            ToolWidthRule::Optional => match self.tool_width {
                Some(w) if w < 0.0 => {
                    return Err(ValidationError::NotPositive {
                        field: ParameterField::ToolWidth,
                        value: w,
                    })
                }
                Some(w) => w,
                None => 0.0,
            },
        };

        if step_per_pass > final_depth {
            return Err(ValidationError::StepExceedsDepth {
                step: step_per_pass,
                depth: final_depth,
            });
        }

        let repetitions = match self.repetitions {
            None => 1,
            Some(v) if v >= 1.0 && v.fract() == 0.0 => v as u32,
            Some(v) => return Err(ValidationError::InvalidRepetitions { value: v }),
        };

        let feed_rate = match self.feed.or(ambient_feed) {
            Some(f) if f > 0.0 => f,
            _ => return Err(ValidationError::NoFeedRate),
        };

        let return_to_start = match self.return_flag {
            None => true,
            Some(v) if v == 1.0 => true,
            Some(v) if v == 0.0 => false,
            Some(v) => return Err(ValidationError::InvalidReturnFlag { value: v }),
        };

        Ok(CycleParameters {
            final_depth,
            slot_length,
            tool_width,
            step_per_pass,
            retract,
            feed_rate,
            repetitions,
            return_to_start,
        })
    }
}
