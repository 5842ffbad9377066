//! Count-out-of-capacity pairs.

use serde::{Deserialize, Serialize};

/// An occurrence count paired with the window capacity it was measured
/// against.
///
/// The denominator is always the window capacity, even before the window has
/// filled, so early observations are conservatively diluted. A zero count is
/// a valid measurement, not a marker for "never seen": a key observed and
/// since evicted reads identically to one never observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proportion {
    /// Occurrences within the window
    pub count: u64,
    /// Window capacity
    pub out_of: u64,
}

impl Proportion {
    pub fn new(count: u64, out_of: u64) -> Self {
        Self { count, out_of }
    }

    /// A zero measurement against the given capacity.
    pub fn zero(out_of: u64) -> Self {
        Self { count: 0, out_of }
    }

    /// The proportion as a fraction in [0, 1].
    pub fn as_f64(&self) -> f64 {
        if self.out_of == 0 {
            0.0
        } else {
            self.count as f64 / self.out_of as f64
        }
    }
}

impl std::fmt::Display for Proportion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.count, self.out_of)
    }
}
