//! Core data types for the pairboost split-search core.
//!
//! These aliases keep the numeric conventions in one place: 32-bit types
//! on the wide per-document paths, 64-bit accumulators wherever pairwise
//! statistics are summed.

use serde::{Deserialize, Serialize};

/// Document indexing type. 32-bit, supporting up to 4 billion documents.
pub type DataSize = u32;

/// Leaf value and solution-vector element type.
/// 32-bit float, matching the accelerator-side output precision.
pub type Score = f32;

/// Accumulation type for pairwise statistics.
/// 64-bit float for numerical stability of large reductions.
pub type Hist = f64;

/// Feature index within one grouping policy.
pub type FeatureIndex = usize;

/// Bin index for quantized feature values. Byte-packed features use the
/// full range; narrower policies use a prefix of it.
pub type BinIndex = u8;

/// Index of a leaf in the partially built oblivious tree.
pub type LeafIndex = u32;

/// Leaf values produced by the leaf solver, one per terminal leaf of the
/// tree after the chosen split is applied.
pub type SolutionVector = Vec<Score>;

/// One document pair contributing to the pairwise loss.
///
/// `weight` is the pairwise Hessian analogue, `gradient` the pairwise
/// residual the leaf-value difference `value(a) - value(b)` should move
/// towards. Both are precomputed by the loss layer; this core only
/// aggregates them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocPair {
    /// First document of the pair.
    pub a: DataSize,
    /// Second document of the pair.
    pub b: DataSize,
    /// Pairwise weight (second-order statistic), must be non-negative.
    pub weight: Score,
    /// Pairwise gradient (first-order statistic).
    pub gradient: Score,
}

impl DocPair {
    /// Creates a new document pair.
    pub fn new(a: DataSize, b: DataSize, weight: Score, gradient: Score) -> Self {
        DocPair {
            a,
            b,
            weight,
            gradient,
        }
    }
}
