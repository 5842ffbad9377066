//! Terminal attempt classifications.

use serde::{Deserialize, Serialize};

use crate::grpc::proto;

/// The four terminal outcomes: credential correctness crossed with whether
/// the attempt was blocked.
///
/// A blocked-but-valid attempt matters: returning `Valid` to a caller that
/// guessed its way to the right password would hand the attacker the account,
/// so blocking is reported independently of correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptOutcome {
    /// Correct credential, attempt admitted.
    Valid,
    /// Correct credential, but blocking signals fired.
    ValidButBlocked,
    /// Incorrect credential, attempt admitted (normal failed login).
    Invalid,
    /// Incorrect credential and blocking signals fired.
    InvalidAndBlocked,
}

impl AttemptOutcome {
    /// Compose an outcome from the two independent judgments.
    pub fn from_parts(credentials_valid: bool, blocked: bool) -> Self {
        match (credentials_valid, blocked) {
            (true, false) => AttemptOutcome::Valid,
            (true, true) => AttemptOutcome::ValidButBlocked,
            (false, false) => AttemptOutcome::Invalid,
            (false, true) => AttemptOutcome::InvalidAndBlocked,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(
            self,
            AttemptOutcome::ValidButBlocked | AttemptOutcome::InvalidAndBlocked
        )
    }

    pub fn credentials_valid(&self) -> bool {
        matches!(self, AttemptOutcome::Valid | AttemptOutcome::ValidButBlocked)
    }

    /// Convert from the proto enum value, rejecting `UNSPECIFIED`.
    pub fn from_proto(value: i32) -> Option<Self> {
        match proto::AttemptOutcome::try_from(value).ok()? {
            proto::AttemptOutcome::Unspecified => None,
            proto::AttemptOutcome::Valid => Some(AttemptOutcome::Valid),
            proto::AttemptOutcome::ValidButBlocked => Some(AttemptOutcome::ValidButBlocked),
            proto::AttemptOutcome::Invalid => Some(AttemptOutcome::Invalid),
            proto::AttemptOutcome::InvalidAndBlocked => Some(AttemptOutcome::InvalidAndBlocked),
        }
    }

    /// Convert to the proto enum value.
    pub fn to_proto(self) -> i32 {
        let outcome = match self {
            AttemptOutcome::Valid => proto::AttemptOutcome::Valid,
            AttemptOutcome::ValidButBlocked => proto::AttemptOutcome::ValidButBlocked,
            AttemptOutcome::Invalid => proto::AttemptOutcome::Invalid,
            AttemptOutcome::InvalidAndBlocked => proto::AttemptOutcome::InvalidAndBlocked,
        };
        outcome as i32
    }
}
