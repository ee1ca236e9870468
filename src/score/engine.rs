//! Per-policy pairwise score engine.
//!
//! One engine serves all features of a single grouping policy. For every
//! (feature, threshold) candidate it aggregates the pairwise statistics
//! restricted to the current leaf partition: the symmetric matrix of pair
//! weights between child leaves and the per-child-leaf gradient vector.
//! Each candidate is then scored by solving its regularized leaf system
//! and taking the loss reduction.
//!
//! Aggregation walks each pair once per feature. A pair's child-leaf
//! assignment as a function of the threshold changes only at the pair's
//! two bin values, so contributions are written to three threshold ranges
//! through difference arrays and recovered with a prefix sum over the
//! threshold axis.

use crate::config::TreeLearnerConfig;
use crate::core::error::Result;
use crate::core::types::{BinIndex, Hist, Score, SolutionVector};
use crate::dataset::compressed::{CompressedFeature, CompressedFeatureSet};
use crate::dataset::policy::GroupingPolicy;
use crate::dataset::subsets::OptimizationSubsets;
use crate::score::solver;
use crate::score::split::{ScoredCandidate, SplitCandidate};
use ndarray::{Array1, Array2};
use rayon::prelude::*;

/// Execution knobs for one score engine.
#[derive(Debug, Clone)]
pub struct ScoreEngineConfig {
    /// Number of worker threads; 1 forces the serial path.
    pub num_threads: usize,
}

impl Default for ScoreEngineConfig {
    fn default() -> Self {
        ScoreEngineConfig {
            num_threads: num_cpus::get(),
        }
    }
}

/// Aggregated pairwise statistics and score for one split candidate.
#[derive(Debug, Clone)]
pub struct CandidateStatistics {
    /// The candidate identity.
    pub candidate: SplitCandidate,
    /// Symmetric child-leaf pair-weight sums; the diagonal is unused.
    pub pair_weights: Array2<Hist>,
    /// Per-child-leaf gradient sums (the right-hand side of the leaf
    /// system).
    pub gradient_sums: Array1<Hist>,
    /// Loss reduction of the candidate's solved leaf system.
    pub score: Hist,
    /// The candidate's solution vector, retained only when the engine
    /// runs with temp-result storage enabled.
    pub solution: Option<SolutionVector>,
}

impl CandidateStatistics {
    /// The candidate together with its score, for the best-split order.
    pub fn scored(&self) -> ScoredCandidate {
        ScoredCandidate {
            candidate: self.candidate,
            score: self.score,
        }
    }
}

/// Computed split statistics of one policy, immutable once produced.
#[derive(Debug, Clone)]
pub struct SplitStatistics {
    policy: GroupingPolicy,
    candidates: Vec<CandidateStatistics>,
}

impl SplitStatistics {
    /// Policy these statistics belong to.
    pub fn policy(&self) -> GroupingPolicy {
        self.policy
    }

    /// All candidates of the policy, ordered by (feature, threshold).
    pub fn candidates(&self) -> &[CandidateStatistics] {
        &self.candidates
    }

    /// Number of (feature, threshold) candidates.
    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }
}

/// Score engine for one grouping policy.
///
/// Engines of distinct policies share the feature set and subsets
/// read-only and have no data dependency on each other.
#[derive(Debug)]
pub struct PairwiseScoreEngine<'a> {
    policy: GroupingPolicy,
    features: &'a CompressedFeatureSet,
    subsets: &'a OptimizationSubsets,
    tree_config: TreeLearnerConfig,
    engine_config: ScoreEngineConfig,
    store_temp_results: bool,
}

impl<'a> PairwiseScoreEngine<'a> {
    /// Creates an engine bound to one policy's features.
    pub fn new(
        policy: GroupingPolicy,
        features: &'a CompressedFeatureSet,
        subsets: &'a OptimizationSubsets,
        tree_config: TreeLearnerConfig,
        engine_config: ScoreEngineConfig,
        store_temp_results: bool,
    ) -> Self {
        PairwiseScoreEngine {
            policy,
            features,
            subsets,
            tree_config,
            engine_config,
            store_temp_results,
        }
    }

    /// Policy this engine serves.
    pub fn policy(&self) -> GroupingPolicy {
        self.policy
    }

    /// Number of features assigned to this engine.
    pub fn num_features(&self) -> usize {
        self.features.grid_size(self.policy)
    }

    /// Total number of split candidates across the engine's features.
    pub fn candidate_count(&self) -> usize {
        self.features.candidate_count(self.policy)
    }

    /// Aggregates and scores every candidate of this policy.
    ///
    /// Features are independent and processed in parallel; the returned
    /// candidate order is always (feature, threshold) regardless of the
    /// worker partitioning. Within one feature the pair reduction is a
    /// fixed-order pass, so per-candidate sums are reproducible up to
    /// floating-point tolerance across thread counts.
    pub fn compute(&self) -> Result<SplitStatistics> {
        let columns = self.features.features(self.policy);
        log::debug!(
            "computing pairwise scores: policy={} features={} pairs={}",
            self.policy,
            columns.len(),
            self.subsets.pairs().len()
        );
        let per_feature: Vec<Vec<CandidateStatistics>> = if self.engine_config.num_threads > 1 {
            columns
                .par_iter()
                .enumerate()
                .map(|(index, feature)| self.compute_feature(index, feature))
                .collect::<Result<_>>()?
        } else {
            columns
                .iter()
                .enumerate()
                .map(|(index, feature)| self.compute_feature(index, feature))
                .collect::<Result<_>>()?
        };
        Ok(SplitStatistics {
            policy: self.policy,
            candidates: per_feature.into_iter().flatten().collect(),
        })
    }

    /// Aggregates pair statistics for all thresholds of one feature and
    /// scores each resulting candidate.
    fn compute_feature(
        &self,
        feature_index: usize,
        feature: &CompressedFeature,
    ) -> Result<Vec<CandidateStatistics>> {
        let num_thresholds = feature.threshold_count();
        let num_child_leaves = 2 * self.subsets.num_leaves();

        // Difference arrays over the threshold axis; slot `t` carries the
        // contribution delta taking effect at threshold `t`.
        let mut weight_delta: Vec<Array2<Hist>> = (0..=num_thresholds)
            .map(|_| Array2::zeros((num_child_leaves, num_child_leaves)))
            .collect();
        let mut gradient_delta: Vec<Array1<Hist>> = (0..=num_thresholds)
            .map(|_| Array1::zeros(num_child_leaves))
            .collect();

        let mut add_range = |start: usize, end: usize, ca: usize, cb: usize, w: Hist, wg: Hist| {
            if start >= end || ca == cb {
                return;
            }
            weight_delta[start][[ca, cb]] += w;
            weight_delta[start][[cb, ca]] += w;
            weight_delta[end][[ca, cb]] -= w;
            weight_delta[end][[cb, ca]] -= w;
            gradient_delta[start][ca] += wg;
            gradient_delta[start][cb] -= wg;
            gradient_delta[end][ca] -= wg;
            gradient_delta[end][cb] += wg;
        };

        for pair in self.subsets.pairs() {
            let leaf_a = self.subsets.leaf_of(pair.a) as usize;
            let leaf_b = self.subsets.leaf_of(pair.b) as usize;
            let bin_a = feature.bin(pair.a) as usize;
            let bin_b = feature.bin(pair.b) as usize;
            let w = pair.weight as Hist;
            let wg = w * pair.gradient as Hist;

            let lo = bin_a.min(bin_b).min(num_thresholds);
            let hi = bin_a.max(bin_b).min(num_thresholds);

            // Thresholds below both bins route both documents right.
            add_range(0, lo, child(leaf_a, true), child(leaf_b, true), w, wg);
            // Between the bins the smaller-bin document goes left.
            if bin_a < bin_b {
                add_range(lo, hi, child(leaf_a, false), child(leaf_b, true), w, wg);
            } else {
                add_range(lo, hi, child(leaf_a, true), child(leaf_b, false), w, wg);
            }
            // At or above both bins, both documents go left.
            add_range(hi, num_thresholds, child(leaf_a, false), child(leaf_b, false), w, wg);
        }

        // Prefix sum over thresholds recovers each candidate's totals.
        let mut running_weights = Array2::<Hist>::zeros((num_child_leaves, num_child_leaves));
        let mut running_gradients = Array1::<Hist>::zeros(num_child_leaves);
        let mut candidates = Vec::with_capacity(num_thresholds);
        for threshold in 0..num_thresholds {
            running_weights += &weight_delta[threshold];
            running_gradients += &gradient_delta[threshold];

            let system = solver::build_system(
                &running_weights,
                self.tree_config.l2_reg,
                self.tree_config.pairwise_nondiag_reg,
            );
            let leaf_values = solver::cholesky_solve(system, &running_gradients)?;
            let score = solver::loss_reduction(&running_gradients, &leaf_values);
            let solution = self.store_temp_results.then(|| {
                leaf_values
                    .iter()
                    .map(|&value| value as Score)
                    .collect::<SolutionVector>()
            });

            candidates.push(CandidateStatistics {
                candidate: SplitCandidate {
                    policy: self.policy,
                    feature: feature_index,
                    threshold: threshold as BinIndex,
                },
                pair_weights: running_weights.clone(),
                gradient_sums: running_gradients.clone(),
                score,
                solution,
            });
        }
        Ok(candidates)
    }
}

/// Child leaf of a parent leaf under any candidate split: the parent
/// forks into `2 * leaf` (left, bin <= threshold) and `2 * leaf + 1`
/// (right).
#[inline]
fn child(leaf: usize, right: bool) -> usize {
    2 * leaf + usize::from(right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::DocPair;
    use approx::assert_relative_eq;

    fn small_setup() -> (CompressedFeatureSet, OptimizationSubsets) {
        // Depth 1, 4 documents, leaves [0, 0, 1, 1].
        // One binary feature separating docs {0, 2} from {1, 3}.
        let features = CompressedFeatureSet::from_binned_columns(
            &[(vec![0, 1, 0, 1], 2)],
            4,
        )
        .unwrap();
        let subsets = OptimizationSubsets::new(
            1,
            vec![0, 0, 1, 1],
            vec![
                DocPair::new(0, 1, 1.0, 1.0),
                DocPair::new(2, 3, 2.0, -0.5),
            ],
        )
        .unwrap();
        (features, subsets)
    }

    fn engine<'a>(
        features: &'a CompressedFeatureSet,
        subsets: &'a OptimizationSubsets,
        num_threads: usize,
    ) -> PairwiseScoreEngine<'a> {
        PairwiseScoreEngine::new(
            GroupingPolicy::Binary,
            features,
            subsets,
            TreeLearnerConfig::new(2, 1.0, 0.1),
            ScoreEngineConfig { num_threads },
            false,
        )
    }

    #[test]
    fn test_candidate_enumeration() {
        let (features, subsets) = small_setup();
        let stats = engine(&features, &subsets, 1).compute().unwrap();
        assert_eq!(stats.candidate_count(), 1);
        let candidate = &stats.candidates()[0];
        assert_eq!(candidate.candidate.policy, GroupingPolicy::Binary);
        assert_eq!(candidate.candidate.feature, 0);
        assert_eq!(candidate.candidate.threshold, 0);
    }

    #[test]
    fn test_aggregated_pair_weights() {
        let (features, subsets) = small_setup();
        let stats = engine(&features, &subsets, 1).compute().unwrap();
        let candidate = &stats.candidates()[0];
        // Pair (0, 1): leaf 0, bins (0, 1) -> children (0, 1), weight 1.
        // Pair (2, 3): leaf 1, bins (0, 1) -> children (2, 3), weight 2.
        assert_relative_eq!(candidate.pair_weights[[0, 1]], 1.0);
        assert_relative_eq!(candidate.pair_weights[[1, 0]], 1.0);
        assert_relative_eq!(candidate.pair_weights[[2, 3]], 2.0);
        assert_relative_eq!(candidate.pair_weights[[3, 2]], 2.0);
        assert_relative_eq!(candidate.pair_weights[[0, 2]], 0.0);
        // Gradient sums: +w*g at the first document's child leaf.
        assert_relative_eq!(candidate.gradient_sums[0], 1.0);
        assert_relative_eq!(candidate.gradient_sums[1], -1.0);
        assert_relative_eq!(candidate.gradient_sums[2], -1.0);
        assert_relative_eq!(candidate.gradient_sums[3], 1.0);
    }

    #[test]
    fn test_thread_counts_agree() {
        let (features, subsets) = small_setup();
        let serial = engine(&features, &subsets, 1).compute().unwrap();
        let parallel = engine(&features, &subsets, 4).compute().unwrap();
        assert_eq!(serial.candidate_count(), parallel.candidate_count());
        for (a, b) in serial.candidates().iter().zip(parallel.candidates()) {
            assert_eq!(a.candidate, b.candidate);
            assert_relative_eq!(a.score, b.score, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_same_child_pairs_contribute_nothing() {
        // Both documents of the pair share leaf and bin: no candidate can
        // separate them, so all statistics stay zero.
        let features =
            CompressedFeatureSet::from_binned_columns(&[(vec![1, 1], 2)], 2).unwrap();
        let subsets =
            OptimizationSubsets::new(0, vec![0, 0], vec![DocPair::new(0, 1, 3.0, 1.0)]).unwrap();
        let stats = engine(&features, &subsets, 1).compute().unwrap();
        let candidate = &stats.candidates()[0];
        assert_relative_eq!(candidate.pair_weights.sum(), 0.0);
        assert_relative_eq!(candidate.gradient_sums.sum(), 0.0);
        assert_relative_eq!(candidate.score, 0.0);
    }

    #[test]
    fn test_multi_bin_threshold_ranges() {
        // One nibble feature with 4 bins; a single pair with bins (1, 3).
        // Thresholds 0: both right; 1, 2: split; (none above: T = 3).
        let features =
            CompressedFeatureSet::from_binned_columns(&[(vec![1, 3], 4)], 2).unwrap();
        let subsets =
            OptimizationSubsets::new(0, vec![0, 0], vec![DocPair::new(0, 1, 1.0, 2.0)]).unwrap();
        let engine = PairwiseScoreEngine::new(
            GroupingPolicy::HalfByte,
            &features,
            &subsets,
            TreeLearnerConfig::new(1, 1.0, 0.0),
            ScoreEngineConfig { num_threads: 1 },
            false,
        );
        let stats = engine.compute().unwrap();
        assert_eq!(stats.candidate_count(), 3);
        // Threshold 0: both docs right (children 1, 1): nothing recorded.
        assert_relative_eq!(stats.candidates()[0].pair_weights.sum(), 0.0);
        // Thresholds 1 and 2: doc 0 left (child 0), doc 1 right (child 1).
        for t in [1, 2] {
            let candidate = &stats.candidates()[t];
            assert_relative_eq!(candidate.pair_weights[[0, 1]], 1.0);
            assert_relative_eq!(candidate.gradient_sums[0], 2.0);
            assert_relative_eq!(candidate.gradient_sums[1], -2.0);
            assert!(candidate.score > 0.0);
        }
    }

    #[test]
    fn test_engine_debug_format() {
        // Results wrapping engine references rely on the engine being
        // Debug, e.g. `unwrap_err` on an accessor miss.
        let (features, subsets) = small_setup();
        let rendered = format!("{:?}", engine(&features, &subsets, 1));
        assert!(rendered.contains("Binary"));
    }

    #[test]
    fn test_child_leaf_routing() {
        assert_eq!(child(3, false), 6);
        assert_eq!(child(3, true), 7);
        assert_eq!(child(0, false), 0);
        assert_eq!(child(0, true), 1);
    }

    #[test]
    fn test_store_temp_results_retains_solutions() {
        let (features, subsets) = small_setup();
        let engine = PairwiseScoreEngine::new(
            GroupingPolicy::Binary,
            &features,
            &subsets,
            TreeLearnerConfig::new(2, 1.0, 0.1),
            ScoreEngineConfig { num_threads: 1 },
            true,
        );
        let stats = engine.compute().unwrap();
        let solution = stats.candidates()[0].solution.as_ref().unwrap();
        assert_eq!(solution.len(), 4);
        assert!(solution.iter().all(|value| value.is_finite()));
    }
}
