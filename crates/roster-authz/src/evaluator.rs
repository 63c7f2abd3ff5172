use crate::{Rank, RankLevels};

/// Answers "does caller rank R satisfy required rank Q" by level comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionEvaluator {
    levels: RankLevels,
}

impl PermissionEvaluator {
    pub fn new(levels: RankLevels) -> Self {
        Self { levels }
    }

    /// True iff the required rank's level is at or below the caller's level.
    pub fn satisfies(&self, caller: Rank, required: Rank) -> bool {
        self.levels.level(required) <= self.levels.level(caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator() -> PermissionEvaluator {
        PermissionEvaluator::new(RankLevels::default())
    }

    #[test]
    fn satisfies_is_reflexive() {
        let evaluator = evaluator();
        for rank in Rank::ALL {
            assert!(evaluator.satisfies(rank, rank), "{rank} should satisfy itself");
        }
    }

    #[test]
    fn satisfies_follows_rank_order_for_all_pairs() {
        let evaluator = evaluator();
        for (caller_pos, caller) in Rank::ALL.into_iter().enumerate() {
            for (required_pos, required) in Rank::ALL.into_iter().enumerate() {
                assert_eq!(
                    evaluator.satisfies(caller, required),
                    required_pos <= caller_pos,
                    "caller {caller} vs required {required}"
                );
            }
        }
    }

    #[test]
    fn satisfies_uses_injected_levels() {
        let levels = RankLevels::new([1, 2, 3, 4, 5, 100, 200]).expect("levels");
        assert_eq!(levels.level(Rank::SubCommand), 100);
        let evaluator = PermissionEvaluator::new(levels);
        assert!(evaluator.satisfies(Rank::Command, Rank::SubCommand));
        assert!(!evaluator.satisfies(Rank::VeteranPilot, Rank::SubCommand));
    }
}
