//! Engine configuration.

use std::fmt;
use std::str::FromStr;

/// What to do when a source is recognized but no amount can be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnAmountMissing {
    /// Produce a record with a zero amount for the user to correct.
    #[default]
    ZeroRecord,

    /// Produce no record, as for an unrecognized source.
    NoRecord,
}

impl FromStr for OnAmountMissing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "zero-record" | "zero" => Ok(OnAmountMissing::ZeroRecord),
            "no-record" | "skip" => Ok(OnAmountMissing::NoRecord),
            other => Err(format!(
                "unknown amount policy {:?} (expected zero-record or no-record)",
                other
            )),
        }
    }
}

impl fmt::Display for OnAmountMissing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnAmountMissing::ZeroRecord => f.write_str("zero-record"),
            OnAmountMissing::NoRecord => f.write_str("no-record"),
        }
    }
}

/// How a batch input stream is cut into messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageSplit {
    /// Messages are separated by one or more blank lines.
    #[default]
    BlankLine,

    /// Every non-blank line is a message.
    Line,
}

impl FromStr for MessageSplit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "blank-line" | "blank" => Ok(MessageSplit::BlankLine),
            "line" => Ok(MessageSplit::Line),
            other => Err(format!(
                "unknown split mode {:?} (expected blank-line or line)",
                other
            )),
        }
    }
}

impl fmt::Display for MessageSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageSplit::BlankLine => f.write_str("blank-line"),
            MessageSplit::Line => f.write_str("line"),
        }
    }
}

/// Tunable engine behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub on_amount_missing: OnAmountMissing,
}

impl EngineConfig {
    pub fn on_amount_missing(mut self, policy: OnAmountMissing) -> Self {
        self.on_amount_missing = policy;
        self
    }
}
