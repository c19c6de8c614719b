//! Keyway cycle command handlers
//!
//! Two command forms are served:
//!
//! - `M800 D<depth> Q<length> S<tool-width> P<step> R<retract> [F<feed>]
//!   [L<reps>] [H<return>]` — internal keyway with sag compensation and
//!   a zero-penetration safety pass (per controller configuration)
//! - `M801 D<depth> L<length> P<step> R<retract> [F<feed>] [N<reps>]
//!   [H<return>]` — plain keyway without compensation or safety pass
//!
//! One feed policy applies to both: an explicit F word overrides,
//! otherwise the machine's ambient feed rate is used.

use keyseat_core::Result;
use keyseat_cycle::{CycleParameters, KeywayArgs, SequencerOptions, ToolWidthRule};
use std::sync::Arc;

use crate::controller::CycleController;
use crate::dispatch::{CommandBlock, CommandHandler};

/// Handler for one keyway command form
pub struct KeywayHandler {
    controller: Arc<CycleController>,
    mcode: u16,
    length_word: char,
    reps_word: char,
    tool_width_rule: ToolWidthRule,
    /// Per-form safety-pass override; `None` follows the controller
    /// configuration
    safety_pass: Option<bool>,
}

impl KeywayHandler {
    /// Internal keyway cycle with sag compensation (M800)
    pub fn internal(controller: Arc<CycleController>) -> Self {
        Self {
            controller,
            mcode: 800,
            length_word: 'Q',
            reps_word: 'L',
            tool_width_rule: ToolWidthRule::Required,
            safety_pass: None,
        }
    }

    /// Plain keyway cycle without compensation (M801)
    pub fn plain(controller: Arc<CycleController>) -> Self {
        Self {
            controller,
            mcode: 801,
            length_word: 'L',
            reps_word: 'N',
            tool_width_rule: ToolWidthRule::Optional,
            safety_pass: Some(false),
        }
    }

    fn collect_args(&self, block: &CommandBlock) -> KeywayArgs {
        KeywayArgs {
            depth: block.word('D'),
            length: block.word(self.length_word),
            tool_width: block.word('S'),
            step: block.word('P'),
            retract: block.word('R'),
            feed: block.word('F'),
            repetitions: block.word(self.reps_word),
            return_flag: block.word('H'),
        }
    }

    fn validated(&self, block: &CommandBlock) -> Result<CycleParameters> {
        let params = self
            .collect_args(block)
            .validate(self.tool_width_rule, self.controller.ambient_feed())?;
        Ok(params)
    }
}

impl CommandHandler for KeywayHandler {
    fn accepts(&self, mcode: u16) -> bool {
        mcode == self.mcode
    }

    fn validate(&self, block: &CommandBlock) -> Result<()> {
        self.validated(block).map(|_| ())
    }

    fn execute(&self, block: &CommandBlock) -> Result<()> {
        let params = self.validated(block)?;
        let options = SequencerOptions {
            safety_pass: self
                .safety_pass
                .unwrap_or(self.controller.config().safety_pass),
        };
        self.controller.run_with(&params, options)?;
        Ok(())
    }
}
