//! Split candidates, the best-split total order, and the result type
//! returned by the optimal-split search.

use crate::core::types::{BinIndex, FeatureIndex, Hist, SolutionVector};
use crate::dataset::policy::GroupingPolicy;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Identifies one (feature, threshold) split candidate.
///
/// `feature` indexes into the candidate's policy group; `threshold` is a
/// bin index, with documents whose bin is `<= threshold` routed left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitCandidate {
    /// Grouping policy the feature is stored under.
    pub policy: GroupingPolicy,
    /// Feature index within the policy.
    pub feature: FeatureIndex,
    /// Threshold bin; documents with `bin <= threshold` go left.
    pub threshold: BinIndex,
}

impl SplitCandidate {
    /// Secondary sort key used when scores tie: policy enumeration order,
    /// then feature index, then threshold index. Smaller key wins.
    pub fn tie_break_key(&self) -> (usize, FeatureIndex, BinIndex) {
        (self.policy.index(), self.feature, self.threshold)
    }
}

/// A split candidate with its computed score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    /// The candidate split.
    pub candidate: SplitCandidate,
    /// Expected loss reduction under the regularized pairwise objective;
    /// larger is better.
    pub score: Hist,
}

/// Total order over scored candidates: higher score wins; equal scores
/// fall back to the fixed secondary key of [`SplitCandidate::tie_break_key`],
/// smaller key winning. Returns `Greater` when `a` is the better split.
///
/// This comparison is the single source of truth for "best" — the search
/// must not re-derive the ordering at call sites. Non-finite scores order
/// below every finite score so a degenerate candidate can never win
/// against a real one.
pub fn compare_scored(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    let score_order = match (a.score.is_nan(), b.score.is_nan()) {
        (false, false) => a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal),
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
    };
    // Reverse the key comparison: the smaller identity key is the better
    // candidate at equal score.
    score_order.then_with(|| b.candidate.tie_break_key().cmp(&a.candidate.tie_break_key()))
}

/// Result of the optimal-split search: the winning scored candidate and,
/// when requested, the leaf-value solution vector for the tree after the
/// split (one value per terminal leaf).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestSplitResult {
    /// The globally best split under [`compare_scored`].
    pub best_split: ScoredCandidate,
    /// Leaf values for the split tree; empty unless the solve was
    /// requested.
    pub solution: SolutionVector,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(policy: GroupingPolicy, feature: FeatureIndex, threshold: BinIndex, score: Hist) -> ScoredCandidate {
        ScoredCandidate {
            candidate: SplitCandidate {
                policy,
                feature,
                threshold,
            },
            score,
        }
    }

    #[test]
    fn test_higher_score_wins() {
        let a = scored(GroupingPolicy::Byte, 5, 3, 2.0);
        let b = scored(GroupingPolicy::Binary, 0, 0, 1.0);
        assert_eq!(compare_scored(&a, &b), Ordering::Greater);
        assert_eq!(compare_scored(&b, &a), Ordering::Less);
    }

    #[test]
    fn test_tie_break_prefers_earlier_policy() {
        let binary = scored(GroupingPolicy::Binary, 3, 0, 1.0);
        let byte = scored(GroupingPolicy::Byte, 0, 0, 1.0);
        assert_eq!(compare_scored(&binary, &byte), Ordering::Greater);
    }

    #[test]
    fn test_tie_break_prefers_lower_feature_then_threshold() {
        let first = scored(GroupingPolicy::Byte, 1, 7, 1.0);
        let second = scored(GroupingPolicy::Byte, 2, 0, 1.0);
        assert_eq!(compare_scored(&first, &second), Ordering::Greater);

        let low = scored(GroupingPolicy::Byte, 1, 2, 1.0);
        let high = scored(GroupingPolicy::Byte, 1, 3, 1.0);
        assert_eq!(compare_scored(&low, &high), Ordering::Greater);
    }

    #[test]
    fn test_nan_never_wins() {
        let nan = scored(GroupingPolicy::Binary, 0, 0, Hist::NAN);
        let finite = scored(GroupingPolicy::Byte, 9, 9, -1.0);
        assert_eq!(compare_scored(&finite, &nan), Ordering::Greater);
    }

    #[test]
    fn test_selection_independent_of_insertion_order() {
        let a = scored(GroupingPolicy::HalfByte, 0, 1, 1.0);
        let b = scored(GroupingPolicy::HalfByte, 0, 0, 1.0);
        let forward = [a, b].into_iter().max_by(compare_scored_ref).unwrap();
        let backward = [b, a].into_iter().max_by(compare_scored_ref).unwrap();
        assert_eq!(forward, backward);
        assert_eq!(forward.candidate.threshold, 0);
    }

    fn compare_scored_ref(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
        compare_scored(a, b)
    }
}
