// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Hot-loop tick counter.
//!
//! All timing in the pipeline is expressed in ticks of the host's fixed-rate
//! loop. The host owns the clock and passes the current tick into every entry
//! point, so nothing in the core reads wall time.

use core::fmt;

use serde::Serialize;

/// Monotonic tick number of the hot loop.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Tick(pub u64);

impl Tick {
    /// Tick zero.
    pub const ZERO: Tick = Tick(0);

    /// The tick `ticks` after this one (saturating).
    #[must_use]
    pub const fn after(self, ticks: u64) -> Tick {
        Tick(self.0.saturating_add(ticks))
    }

    /// The next tick.
    #[must_use]
    pub const fn next(self) -> Tick {
        self.after(1)
    }

    /// Whether a deadline at `deadline` has been reached at this tick.
    pub const fn reached(self, deadline: Tick) -> bool {
        self.0 >= deadline.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}
