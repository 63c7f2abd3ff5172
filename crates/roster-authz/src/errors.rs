use crate::Rank;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    #[error("caller identity could not be resolved")]
    CallerNotFound,
    #[error("forbidden: {0}")]
    Forbidden(DenyReason),
    #[error("invalid rank: {0}")]
    InvalidRank(String),
    #[error("invalid rank levels: {0}")]
    InvalidRankLevels(String),
}

/// The rule that rejected a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DenyReason {
    #[error("requires rank {required} or higher, caller holds {actual}")]
    BelowThreshold { required: Rank, actual: Rank },
    #[error("a password can only be changed by its owner")]
    PasswordChangeForOther,
    #[error("changing rank to {requested} requires {required} or higher")]
    RankChangeBelowThreshold { requested: Rank, required: Rank },
}

impl DenyReason {
    /// Stable label for metrics and structured logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::BelowThreshold { .. } => "below_threshold",
            DenyReason::PasswordChangeForOther => "password_change_for_other",
            DenyReason::RankChangeBelowThreshold { .. } => "rank_change_below_threshold",
        }
    }
}

pub type AuthzResult<T> = Result<T, AuthzError>;
