//! Per-account attempt budgets over multiple trailing time windows.

mod limiter;

pub use limiter::{ConsumeOutcome, CreditLimiter, LimitPerTimePeriod};
