//! Admission control under memory pressure.

use std::sync::Arc;
use tracing::warn;

use crate::credit::CreditLimiter;
use crate::error::{GuardpostError, Result};

/// Gatekeeper consulted before an attempt allocates per-account state.
///
/// Refusal is a recoverable, reportable condition
/// ([`GuardpostError::ResourceExhausted`]), never a crash, and refused
/// attempts leave no partial state behind.
pub trait MemoryGuard: Send + Sync {
    fn admit(&self) -> Result<()>;
}

/// Never refuses. For tests and deployments with external memory management.
#[derive(Default)]
pub struct UnboundedGuard;

impl MemoryGuard for UnboundedGuard {
    fn admit(&self) -> Result<()> {
        Ok(())
    }
}

/// Caps the number of resident credit ledgers, the dominant per-account
/// allocation on the hot path. Tracker memory is already fixed at
/// construction and needs no guarding.
pub struct LedgerCapGuard {
    credit: Arc<CreditLimiter>,
    max_ledgers: usize,
}

impl LedgerCapGuard {
    pub fn new(credit: Arc<CreditLimiter>, max_ledgers: usize) -> Self {
        Self { credit, max_ledgers }
    }
}

impl MemoryGuard for LedgerCapGuard {
    fn admit(&self) -> Result<()> {
        let resident = self.credit.ledger_count();
        if resident >= self.max_ledgers {
            // Drained ledgers may be reclaimable; one pruning pass before
            // refusing.
            self.credit.prune();
            let resident = self.credit.ledger_count();
            if resident >= self.max_ledgers {
                warn!(resident, cap = self.max_ledgers, "Refusing attempt under memory pressure");
                return Err(GuardpostError::ResourceExhausted(format!(
                    "{resident} resident ledgers at cap {}",
                    self.max_ledgers
                )));
            }
        }
        Ok(())
    }
}
