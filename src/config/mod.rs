//! Tree learner configuration for the pairwise split-search core.
//!
//! The configuration is an immutable snapshot taken once per tree; every
//! per-policy score engine and the leaf solver read the same values.

use crate::core::error::{PairBoostError, Result};
use serde::{Deserialize, Serialize};

/// Deepest oblivious tree the learner supports. Leaf systems are solved
/// densely, so the leaf count `2^(depth+1)` has to stay small.
pub const MAX_TREE_DEPTH: usize = 16;

/// Hyperparameters of the oblivious tree learner used by the split
/// search: tree depth and the two regularization terms of the pairwise
/// objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeLearnerConfig {
    /// Maximum depth of the oblivious tree.
    pub max_depth: usize,
    /// L2 regularization added to the diagonal of the leaf system.
    pub l2_reg: f64,
    /// Regularization of the non-diagonal (cross-leaf) structure of the
    /// pairwise leaf system; keeps the system well conditioned when few
    /// pairs cross a given leaf boundary.
    pub pairwise_nondiag_reg: f64,
}

impl Default for TreeLearnerConfig {
    fn default() -> Self {
        TreeLearnerConfig {
            max_depth: 6,
            l2_reg: 3.0,
            pairwise_nondiag_reg: 0.1,
        }
    }
}

impl TreeLearnerConfig {
    /// Creates a configuration with explicit values.
    pub fn new(max_depth: usize, l2_reg: f64, pairwise_nondiag_reg: f64) -> Self {
        TreeLearnerConfig {
            max_depth,
            l2_reg,
            pairwise_nondiag_reg,
        }
    }

    /// Validates the configuration, returning the first violated
    /// constraint as an `InvalidParameter` error.
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(PairBoostError::invalid_parameter(
                "max_depth",
                self.max_depth.to_string(),
                "must be at least 1",
            ));
        }
        if self.max_depth > MAX_TREE_DEPTH {
            return Err(PairBoostError::invalid_parameter(
                "max_depth",
                self.max_depth.to_string(),
                "must be at most 16",
            ));
        }
        if !(self.l2_reg > 0.0) || !self.l2_reg.is_finite() {
            return Err(PairBoostError::invalid_parameter(
                "l2_reg",
                self.l2_reg.to_string(),
                "must be positive and finite",
            ));
        }
        if self.pairwise_nondiag_reg < 0.0 || !self.pairwise_nondiag_reg.is_finite() {
            return Err(PairBoostError::invalid_parameter(
                "pairwise_nondiag_reg",
                self.pairwise_nondiag_reg.to_string(),
                "must be non-negative and finite",
            ));
        }
        Ok(())
    }
}

/// Builder for `TreeLearnerConfig`.
#[derive(Debug, Clone, Default)]
pub struct TreeLearnerConfigBuilder {
    config: TreeLearnerConfig,
}

impl TreeLearnerConfigBuilder {
    /// Creates a builder initialized with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum tree depth.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Sets the L2 regularization term.
    pub fn l2_reg(mut self, l2_reg: f64) -> Self {
        self.config.l2_reg = l2_reg;
        self
    }

    /// Sets the pairwise non-diagonal regularization term.
    pub fn pairwise_nondiag_reg(mut self, reg: f64) -> Self {
        self.config.pairwise_nondiag_reg = reg;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> Result<TreeLearnerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TreeLearnerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_depth, 6);
    }

    #[test]
    fn test_builder() {
        let config = TreeLearnerConfigBuilder::new()
            .max_depth(4)
            .l2_reg(1.5)
            .pairwise_nondiag_reg(0.05)
            .build()
            .unwrap();
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.l2_reg, 1.5);
        assert_eq!(config.pairwise_nondiag_reg, 0.05);
    }

    #[test]
    fn test_invalid_l2_rejected() {
        let result = TreeLearnerConfigBuilder::new().l2_reg(0.0).build();
        assert!(matches!(
            result,
            Err(PairBoostError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_zero_depth_rejected() {
        let result = TreeLearnerConfigBuilder::new().max_depth(0).build();
        assert!(result.is_err());
    }
}
