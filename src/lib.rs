//! # pairboost
//!
//! A pure Rust split-search core for gradient boosted oblivious trees
//! trained with a pairwise (ranking) loss.
//!
//! The crate computes, for a tree grown level by level, the best next
//! binary split over a set of pre-binned features stored under several
//! packed layouts ("grouping policies"). For every candidate split it
//! aggregates pairwise loss statistics restricted to the current leaf
//! partition, scores the candidate under an L2-regularized pairwise
//! objective, selects the single best split under a deterministic total
//! order, and solves a small regularized linear system for the leaf
//! values of the extended tree.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pairboost::{
//!     CompressedFeatureSet, DocPair, OptimizationSubsets, PairwiseScoreCalcer,
//!     TreeLearnerConfigBuilder,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Two pre-binned features over four documents.
//! let features = CompressedFeatureSet::from_binned_columns(
//!     &[(vec![0, 1, 0, 1], 2), (vec![0, 3, 2, 1], 4)],
//!     4,
//! )?;
//!
//! // Root of the tree: one leaf, pairwise statistics from the loss layer.
//! let subsets = OptimizationSubsets::new(
//!     0,
//!     vec![0, 0, 0, 0],
//!     vec![DocPair::new(0, 1, 1.0, 0.5), DocPair::new(2, 3, 1.0, -0.5)],
//! )?;
//!
//! let config = TreeLearnerConfigBuilder::new()
//!     .max_depth(6)
//!     .l2_reg(3.0)
//!     .pairwise_nondiag_reg(0.1)
//!     .build()?;
//!
//! let mut calcer = PairwiseScoreCalcer::new(&features, &config, &subsets, false)?;
//! calcer.compute()?;
//! let best = calcer.find_optimal_split(true)?;
//! println!(
//!     "best split: {:?} score {} leaves {:?}",
//!     best.best_split.candidate, best.best_split.score, best.solution
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: fundamental types and error handling
//! - [`config`]: the tree learner's hyperparameter snapshot
//! - [`dataset`]: grouping policies, compressed features, optimization subsets
//! - [`score`]: per-policy engines, the score calculator, and the leaf solver

pub mod config;
pub mod core;
pub mod dataset;
pub mod score;

pub use crate::config::{TreeLearnerConfig, TreeLearnerConfigBuilder, MAX_TREE_DEPTH};
pub use crate::core::error::{PairBoostError, Result};
pub use crate::core::types::{
    BinIndex, DataSize, DocPair, FeatureIndex, Hist, LeafIndex, Score, SolutionVector,
};
pub use crate::dataset::{
    CompressedFeature, CompressedFeatureSet, GroupingPolicy, OptimizationSubsets, POLICY_COUNT,
};
pub use crate::score::{
    compare_scored, BestSplitResult, CandidateStatistics, PairwiseLeafSolver, PairwiseScoreCalcer,
    PairwiseScoreEngine, ScoreEngineConfig, ScoredCandidate, SplitCandidate, SplitStatistics,
};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
