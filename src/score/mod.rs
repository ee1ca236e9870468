//! The score-computation / best-split-selection / leaf-solve pipeline.
//!
//! `engine` aggregates pairwise statistics per grouping policy, `split`
//! defines candidates and the best-split total order, `solver` produces
//! leaf values from a winning candidate's statistics, and `calcer` ties
//! them together behind the two operations the tree-growing loop needs:
//! `compute()` and `find_optimal_split()`.

pub mod calcer;
pub mod engine;
pub mod solver;
pub mod split;

pub use calcer::PairwiseScoreCalcer;
pub use engine::{CandidateStatistics, PairwiseScoreEngine, ScoreEngineConfig, SplitStatistics};
pub use solver::PairwiseLeafSolver;
pub use split::{compare_scored, BestSplitResult, ScoredCandidate, SplitCandidate};
