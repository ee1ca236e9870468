//! Score calculator: owns one score engine per active grouping policy,
//! drives their computation and selects the globally best split.
//!
//! The calculator is constructed once per split decision. `compute()`
//! runs every engine to completion (policies are independent and run in
//! parallel); `find_optimal_split` then scans the per-policy results
//! under the best-split total order and optionally solves for the
//! winning candidate's leaf values.

use crate::config::TreeLearnerConfig;
use crate::core::error::{PairBoostError, Result};
use crate::dataset::compressed::CompressedFeatureSet;
use crate::dataset::policy::{GroupingPolicy, POLICY_COUNT};
use crate::dataset::subsets::OptimizationSubsets;
use crate::score::engine::{PairwiseScoreEngine, ScoreEngineConfig, SplitStatistics};
use crate::score::solver::PairwiseLeafSolver;
use crate::score::split::{compare_scored, BestSplitResult, ScoredCandidate};
use rayon::prelude::*;

/// Orchestrates per-policy score engines and best-split selection.
///
/// Holds non-owning references to the compressed features and the
/// optimization subsets; both must stay valid and unmodified for the
/// calculator's lifetime.
pub struct PairwiseScoreCalcer<'a> {
    features: &'a CompressedFeatureSet,
    subsets: &'a OptimizationSubsets,
    store_temp_results: bool,
    engines: [Option<PairwiseScoreEngine<'a>>; POLICY_COUNT],
    results: [Option<SplitStatistics>; POLICY_COUNT],
    solver: PairwiseLeafSolver,
}

impl<'a> PairwiseScoreCalcer<'a> {
    /// Creates a calculator with default engine execution settings.
    ///
    /// One engine is constructed per grouping policy with at least one
    /// assigned feature; no computation happens yet.
    pub fn new(
        features: &'a CompressedFeatureSet,
        tree_config: &TreeLearnerConfig,
        subsets: &'a OptimizationSubsets,
        store_temp_results: bool,
    ) -> Result<Self> {
        Self::with_engine_config(
            features,
            tree_config,
            subsets,
            store_temp_results,
            ScoreEngineConfig::default(),
        )
    }

    /// Creates a calculator with explicit engine execution settings.
    pub fn with_engine_config(
        features: &'a CompressedFeatureSet,
        tree_config: &TreeLearnerConfig,
        subsets: &'a OptimizationSubsets,
        store_temp_results: bool,
        engine_config: ScoreEngineConfig,
    ) -> Result<Self> {
        tree_config.validate()?;
        if subsets.depth() >= tree_config.max_depth {
            return Err(PairBoostError::config(format!(
                "subsets are at depth {} but max_depth {} leaves no level to split into",
                subsets.depth(),
                tree_config.max_depth
            )));
        }
        if features.num_docs() != subsets.num_docs() {
            return Err(PairBoostError::dimension_mismatch(
                format!("{} documents in feature set", features.num_docs()),
                format!("{} documents in subsets", subsets.num_docs()),
            ));
        }
        let mut engines: [Option<PairwiseScoreEngine<'a>>; POLICY_COUNT] = Default::default();
        for policy in GroupingPolicy::ALL {
            if features.grid_size(policy) > 0 {
                engines[policy.index()] = Some(PairwiseScoreEngine::new(
                    policy,
                    features,
                    subsets,
                    tree_config.clone(),
                    engine_config.clone(),
                    store_temp_results,
                ));
            }
        }
        Ok(PairwiseScoreCalcer {
            features,
            subsets,
            store_temp_results,
            engines,
            results: Default::default(),
            solver: PairwiseLeafSolver::new(tree_config.l2_reg, tree_config.pairwise_nondiag_reg),
        })
    }

    /// True iff an engine was constructed for the policy.
    pub fn has_engine_for_policy(&self, policy: GroupingPolicy) -> bool {
        self.engines[policy.index()].is_some()
    }

    /// The engine serving the policy.
    pub fn engine_for_policy(&self, policy: GroupingPolicy) -> Result<&PairwiseScoreEngine<'a>> {
        self.engines[policy.index()].as_ref().ok_or_else(|| {
            PairBoostError::precondition(format!("no engine for policy {}", policy))
        })
    }

    /// The computed split statistics of the policy.
    ///
    /// Fails with a precondition error when the policy has no engine and
    /// with a not-ready error before `compute()` has populated results.
    pub fn results_for_policy(&self, policy: GroupingPolicy) -> Result<&SplitStatistics> {
        if !self.has_engine_for_policy(policy) {
            return Err(PairBoostError::precondition(format!(
                "no engine for policy {}",
                policy
            )));
        }
        self.results[policy.index()].as_ref().ok_or_else(|| {
            PairBoostError::not_ready(format!(
                "results for policy {} requested before compute()",
                policy
            ))
        })
    }

    /// The leaf solver, exposed for diagnostics.
    pub fn solver(&self) -> &PairwiseLeafSolver {
        &self.solver
    }

    /// The compressed feature set the calculator was built over.
    pub fn features(&self) -> &CompressedFeatureSet {
        self.features
    }

    /// Whether intermediate solver vectors are retained.
    pub fn stores_temp_results(&self) -> bool {
        self.store_temp_results
    }

    /// Runs every active engine and stores its split statistics.
    ///
    /// Engines operate on disjoint features and the shared read-only
    /// subsets, so they run in parallel; this method returns only after
    /// every per-policy aggregation has completed. Calling it again
    /// recomputes from scratch — valid, merely wasteful.
    pub fn compute(&mut self) -> Result<()> {
        let computed: Vec<(usize, SplitStatistics)> = self
            .engines
            .as_slice()
            .par_iter()
            .filter_map(|slot| slot.as_ref())
            .map(|engine| {
                engine
                    .compute()
                    .map(|stats| (engine.policy().index(), stats))
            })
            .collect::<Result<_>>()?;
        for (index, stats) in computed {
            log::debug!(
                "policy {} produced {} split candidates",
                GroupingPolicy::ALL[index],
                stats.candidate_count()
            );
            self.results[index] = Some(stats);
        }
        Ok(())
    }

    /// Selects the globally best split across all active policies.
    ///
    /// When `need_best_solution` is set, the result carries the winning
    /// candidate's leaf-value vector, either reusing a retained solver
    /// vector or solving the candidate's system; otherwise the solution
    /// is empty and the leaf solver is never touched.
    pub fn find_optimal_split(&self, need_best_solution: bool) -> Result<BestSplitResult> {
        let mut best: Option<ScoredCandidate> = None;
        let mut any_active = false;
        for policy in GroupingPolicy::ALL {
            if !self.has_engine_for_policy(policy) {
                continue;
            }
            any_active = true;
            let stats = self.results_for_policy(policy)?;
            for candidate in stats.candidates() {
                let scored = candidate.scored();
                let better = match &best {
                    None => true,
                    Some(current) => compare_scored(&scored, current) == std::cmp::Ordering::Greater,
                };
                if better {
                    best = Some(scored);
                }
            }
        }
        if !any_active {
            return Err(PairBoostError::precondition(
                "no grouping policy has assigned features; nothing to split",
            ));
        }
        let best_split = best.ok_or_else(|| {
            PairBoostError::internal("active policies produced no split candidates")
        })?;
        log::debug!(
            "optimal split: policy={} feature={} threshold={} score={}",
            best_split.candidate.policy,
            best_split.candidate.feature,
            best_split.candidate.threshold,
            best_split.score
        );

        let solution = if need_best_solution {
            let stats = self.results_for_policy(best_split.candidate.policy)?;
            let winner = stats
                .candidates()
                .iter()
                .find(|candidate| candidate.candidate == best_split.candidate)
                .ok_or_else(|| {
                    PairBoostError::internal("winning candidate missing from its result store")
                })?;
            match &winner.solution {
                Some(retained) => retained.clone(),
                None => self.solver.solve(&winner.pair_weights, &winner.gradient_sums)?,
            }
        } else {
            Vec::new()
        };

        Ok(BestSplitResult {
            best_split,
            solution,
        })
    }

    /// Number of terminal leaves the tree will have after applying the
    /// selected split.
    pub fn num_child_leaves(&self) -> usize {
        2 * self.subsets.num_leaves()
    }
}
