//! Input data structures of the split search: grouping policies, the
//! compressed feature set and the current optimization subsets.

pub mod compressed;
pub mod policy;
pub mod subsets;

pub use compressed::{CompressedFeature, CompressedFeatureSet};
pub use policy::{GroupingPolicy, POLICY_COUNT};
pub use subsets::OptimizationSubsets;
