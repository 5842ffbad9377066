//! Failed-password popularity tracking.
//!
//! A guessed password that shows up often among recent failures is a far
//! stronger attack signal than a rare one. This module estimates that
//! popularity exactly over several sliding windows of geometrically
//! increasing size.

mod frequency;
mod multiperiod;
mod proportion;

pub use frequency::FrequencyTracker;
pub use multiperiod::MultiperiodFrequencyTracker;
pub use proportion::Proportion;
