//! Optimization subsets: the current leaf partition and the pairwise
//! statistics scoped to it.
//!
//! The tree is grown level by level; at depth `d` every document sits in
//! one of `2^d` leaves. The loss layer supplies document pairs with
//! precomputed pairwise gradients and weights. Both stay read-only for
//! the lifetime of a score calculator.

use crate::config::MAX_TREE_DEPTH;
use crate::core::error::{PairBoostError, Result};
use crate::core::types::{DataSize, DocPair, LeafIndex};

/// Current leaf assignment per document plus the pairwise loss
/// statistics restricted to those leaves.
#[derive(Debug, Clone)]
pub struct OptimizationSubsets {
    depth: usize,
    leaf_of: Vec<LeafIndex>,
    pairs: Vec<DocPair>,
}

impl OptimizationSubsets {
    /// Creates subsets from a leaf assignment at the given depth and the
    /// pair list. Validates leaf indices, document ids and pair weights.
    pub fn new(depth: usize, leaf_of: Vec<LeafIndex>, pairs: Vec<DocPair>) -> Result<Self> {
        if depth > MAX_TREE_DEPTH {
            return Err(PairBoostError::dataset(format!(
                "depth {} exceeds the supported maximum of {}",
                depth, MAX_TREE_DEPTH
            )));
        }
        let num_leaves = 1usize << depth;
        if let Some(&bad) = leaf_of.iter().find(|&&leaf| (leaf as usize) >= num_leaves) {
            return Err(PairBoostError::dataset(format!(
                "leaf index {} out of range for depth {} ({} leaves)",
                bad, depth, num_leaves
            )));
        }
        let num_docs = leaf_of.len() as DataSize;
        for pair in &pairs {
            if pair.a >= num_docs || pair.b >= num_docs {
                return Err(PairBoostError::dataset(format!(
                    "pair ({}, {}) references a document outside the {} assigned",
                    pair.a, pair.b, num_docs
                )));
            }
            if pair.a == pair.b {
                return Err(PairBoostError::dataset(format!(
                    "pair ({}, {}) relates a document to itself",
                    pair.a, pair.b
                )));
            }
            if !(pair.weight >= 0.0) || !pair.weight.is_finite() || !pair.gradient.is_finite() {
                return Err(PairBoostError::dataset(format!(
                    "pair ({}, {}) has invalid statistics: weight {}, gradient {}",
                    pair.a, pair.b, pair.weight, pair.gradient
                )));
            }
        }
        Ok(OptimizationSubsets {
            depth,
            leaf_of,
            pairs,
        })
    }

    /// Current tree depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of leaves at the current depth.
    pub fn num_leaves(&self) -> usize {
        1usize << self.depth
    }

    /// Number of documents assigned to leaves.
    pub fn num_docs(&self) -> usize {
        self.leaf_of.len()
    }

    /// Leaf of the given document.
    #[inline]
    pub fn leaf_of(&self, doc: DataSize) -> LeafIndex {
        self.leaf_of[doc as usize]
    }

    /// Pairwise statistics scoped to the current partition.
    pub fn pairs(&self) -> &[DocPair] {
        &self.pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_subsets() {
        let subsets = OptimizationSubsets::new(
            1,
            vec![0, 1, 0, 1],
            vec![DocPair::new(0, 1, 1.0, 0.5), DocPair::new(2, 3, 2.0, -0.5)],
        )
        .unwrap();
        assert_eq!(subsets.num_leaves(), 2);
        assert_eq!(subsets.num_docs(), 4);
        assert_eq!(subsets.leaf_of(2), 0);
        assert_eq!(subsets.pairs().len(), 2);
    }

    #[test]
    fn test_depth_beyond_supported_maximum_rejected() {
        for depth in [MAX_TREE_DEPTH + 1, 63, 64, 200] {
            let result = OptimizationSubsets::new(depth, vec![0, 0], vec![]);
            assert!(matches!(result, Err(PairBoostError::Dataset { .. })));
        }
        assert!(OptimizationSubsets::new(MAX_TREE_DEPTH, vec![0, 0], vec![]).is_ok());
    }

    #[test]
    fn test_leaf_out_of_range_rejected() {
        let result = OptimizationSubsets::new(1, vec![0, 2], vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_pair_doc_out_of_range_rejected() {
        let result = OptimizationSubsets::new(0, vec![0, 0], vec![DocPair::new(0, 5, 1.0, 0.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_self_pair_rejected() {
        let result = OptimizationSubsets::new(0, vec![0, 0], vec![DocPair::new(1, 1, 1.0, 0.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let result = OptimizationSubsets::new(0, vec![0, 0], vec![DocPair::new(0, 1, -1.0, 0.0)]);
        assert!(result.is_err());
    }
}
