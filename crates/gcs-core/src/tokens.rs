//! Token Counts.

use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Non-negative token counters that accumulate across a turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCounts {
    /// Prompt / input tokens.
    pub input: u64,
    /// Completion / output tokens.
    pub output: u64,
    /// `input + output`, kept as a field (not computed) so a
    /// provider-reported total can be trusted when it disagrees slightly
    /// with the local sum.
    pub total: u64,
}

impl TokenCounts {
    /// Construct counts, computing `total` as `input + output`.
    #[must_use]
    pub fn new(input: u64, output: u64) -> Self {
        Self {
            input,
            output,
            total: input + output,
        }
    }
}

impl AddAssign for TokenCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.input += rhs.input;
        self.output += rhs.output;
        self.total += rhs.total;
    }
}
