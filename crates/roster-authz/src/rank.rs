//! Officer ranks and the rank-to-level table.
//!
//! # Key invariants
//! - [`Rank::ALL`] lists every rank from lowest to highest standing.
//! - [`RankLevels`] stores one level per rank in a fixed array indexed by rank,
//!   so a rank without a level cannot be represented.
//! - Levels are positive and strictly increasing with standing.
use crate::{AuthzError, AuthzResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rank {
    ProbationaryPilot,
    Pilot,
    ExperiencedPilot,
    SeniorPilot,
    VeteranPilot,
    SubCommand,
    Command,
}

impl Rank {
    pub const COUNT: usize = 7;

    pub const ALL: [Rank; Rank::COUNT] = [
        Rank::ProbationaryPilot,
        Rank::Pilot,
        Rank::ExperiencedPilot,
        Rank::SeniorPilot,
        Rank::VeteranPilot,
        Rank::SubCommand,
        Rank::Command,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Rank::ProbationaryPilot => "PROBATIONARY_PILOT",
            Rank::Pilot => "PILOT",
            Rank::ExperiencedPilot => "EXPERIENCED_PILOT",
            Rank::SeniorPilot => "SENIOR_PILOT",
            Rank::VeteranPilot => "VETERAN_PILOT",
            Rank::SubCommand => "SUB_COMMAND",
            Rank::Command => "COMMAND",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Rank {
    type Err = AuthzError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Rank::ALL
            .into_iter()
            .find(|rank| rank.as_str() == value)
            .ok_or_else(|| AuthzError::InvalidRank(value.to_string()))
    }
}

/// Immutable rank-to-level table.
///
/// Built once at startup and handed to the
/// [`PermissionEvaluator`](crate::PermissionEvaluator); nothing mutates it
/// afterwards, so it is shared by copy.
///
/// ```rust
/// use roster_authz::{Rank, RankLevels};
///
/// let levels = RankLevels::default();
/// assert_eq!(levels.level(Rank::SubCommand), 30);
/// assert!(RankLevels::new([1, 2, 3, 3, 4, 5, 6]).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankLevels([u32; Rank::COUNT]);

impl RankLevels {
    const DEFAULT_LEVELS: [u32; Rank::COUNT] = [5, 10, 15, 20, 25, 30, 35];

    /// Build a table from levels listed in [`Rank::ALL`] order.
    ///
    /// # Errors
    /// - `InvalidRankLevels` if a level is zero or levels are not strictly
    ///   increasing with rank standing.
    pub fn new(levels: [u32; Rank::COUNT]) -> AuthzResult<Self> {
        if let Some(rank) = Rank::ALL.into_iter().find(|rank| levels[rank.index()] == 0) {
            return Err(AuthzError::InvalidRankLevels(format!(
                "level for {rank} must be positive"
            )));
        }
        for pair in Rank::ALL.windows(2) {
            let (lower, higher) = (pair[0], pair[1]);
            if levels[lower.index()] >= levels[higher.index()] {
                return Err(AuthzError::InvalidRankLevels(format!(
                    "{higher} must have a higher level than {lower}"
                )));
            }
        }
        Ok(Self(levels))
    }

    /// Build a table from `(rank, level)` entries, as read from configuration.
    ///
    /// Every rank must appear exactly once.
    pub fn from_entries(entries: impl IntoIterator<Item = (Rank, u32)>) -> AuthzResult<Self> {
        let mut levels: [Option<u32>; Rank::COUNT] = [None; Rank::COUNT];
        for (rank, level) in entries {
            if levels[rank.index()].replace(level).is_some() {
                return Err(AuthzError::InvalidRankLevels(format!(
                    "{rank} listed more than once"
                )));
            }
        }
        let mut resolved = [0u32; Rank::COUNT];
        for rank in Rank::ALL {
            resolved[rank.index()] = levels[rank.index()].ok_or_else(|| {
                AuthzError::InvalidRankLevels(format!("missing level for {rank}"))
            })?;
        }
        Self::new(resolved)
    }

    pub fn level(&self, rank: Rank) -> u32 {
        self.0[rank.index()]
    }
}

impl Default for RankLevels {
    fn default() -> Self {
        Self(Self::DEFAULT_LEVELS)
    }
}
