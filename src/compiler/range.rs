//! Time-window accumulation and synthesis
//!
//! Lower-implying bounds tighten to the maximum seen; upper-implying bounds
//! to the minimum. When the upstream mandates a paired window and only one
//! side was supplied, the missing side is synthesized: epoch start below,
//! the compile-time instant above.
//!
//! `lower <= upper` is deliberately not enforced. An over-constrained window
//! is sent as-is and degrades to an empty result set, never an error.

use chrono::{DateTime, Utc};

use crate::timefmt::format_instant;

/// Accumulated interval bounds for one compile invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeState {
    lower: Option<DateTime<Utc>>,
    upper: Option<DateTime<Utc>>,
}

impl RangeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tighten the lower bound to the maximum of all candidates.
    /// An equal candidate leaves the bound unchanged.
    pub fn tighten_lower(&mut self, candidate: DateTime<Utc>) {
        self.lower = Some(match self.lower {
            Some(current) if current >= candidate => current,
            _ => candidate,
        });
    }

    /// Tighten the upper bound to the minimum of all candidates.
    pub fn tighten_upper(&mut self, candidate: DateTime<Utc>) {
        self.upper = Some(match self.upper {
            Some(current) if current <= candidate => current,
            _ => candidate,
        });
    }

    pub fn lower(&self) -> Option<DateTime<Utc>> {
        self.lower
    }

    pub fn upper(&self) -> Option<DateTime<Utc>> {
        self.upper
    }

    /// True when either side has been set
    pub fn has_any(&self) -> bool {
        self.lower.is_some() || self.upper.is_some()
    }

    /// True when both sides have been set
    pub fn is_complete(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }

    /// Complete a partial window: a missing lower bound becomes the epoch
    /// origin, a missing upper bound becomes `now`. A window with neither
    /// side set stays empty.
    pub fn synthesize(&mut self, now: DateTime<Utc>) {
        if self.lower.is_some() && self.upper.is_none() {
            self.upper = Some(now);
        } else if self.upper.is_some() && self.lower.is_none() {
            self.lower = Some(epoch());
        }
    }

    /// Wire strings for the set sides
    pub fn lower_wire(&self) -> Option<String> {
        self.lower.map(format_instant)
    }

    pub fn upper_wire(&self) -> Option<String> {
        self.upper.map(format_instant)
    }
}

/// The fixed epoch origin used for synthesized lower bounds
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}
