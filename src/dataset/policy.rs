//! Feature grouping policies.
//!
//! A grouping policy is a storage layout category for quantized feature
//! columns, chosen by bin cardinality so that many low-cardinality
//! features can be packed per storage unit. The set of policies is closed
//! and carries a canonical order: the order of [`GroupingPolicy::ALL`]
//! is the primary tie-break key of the best-split selection, so it must
//! never depend on runtime state.

use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;
use std::fmt;

/// Storage layout category for a group of quantized features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupingPolicy {
    /// One bit per document; features with at most 2 bins.
    Binary,
    /// Four bits per document; features with at most 16 bins.
    HalfByte,
    /// One byte per document; features with at most 256 bins.
    Byte,
}

/// Number of grouping policies.
pub const POLICY_COUNT: usize = 3;

// `index()` must stay a bijection onto 0..POLICY_COUNT.
const_assert_eq!(GroupingPolicy::Byte.index() + 1, POLICY_COUNT);

impl GroupingPolicy {
    /// All policies in canonical order. This order defines policy
    /// enumeration for engine construction and the tie-break in the
    /// best-split total order.
    pub const ALL: [GroupingPolicy; POLICY_COUNT] = [
        GroupingPolicy::Binary,
        GroupingPolicy::HalfByte,
        GroupingPolicy::Byte,
    ];

    /// Position of this policy in [`GroupingPolicy::ALL`].
    pub const fn index(self) -> usize {
        match self {
            GroupingPolicy::Binary => 0,
            GroupingPolicy::HalfByte => 1,
            GroupingPolicy::Byte => 2,
        }
    }

    /// Maximum number of bins a feature stored under this policy may have.
    pub const fn max_bins(self) -> usize {
        match self {
            GroupingPolicy::Binary => 2,
            GroupingPolicy::HalfByte => 16,
            GroupingPolicy::Byte => 256,
        }
    }

    /// Narrowest policy able to hold a feature with `bin_count` bins, or
    /// `None` if the feature does not fit any policy.
    pub fn for_bin_count(bin_count: usize) -> Option<GroupingPolicy> {
        GroupingPolicy::ALL
            .iter()
            .copied()
            .find(|policy| bin_count <= policy.max_bins())
    }
}

impl fmt::Display for GroupingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupingPolicy::Binary => write!(f, "binary"),
            GroupingPolicy::HalfByte => write!(f, "half_byte"),
            GroupingPolicy::Byte => write!(f, "byte"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_order_is_stable() {
        let indices: Vec<usize> = GroupingPolicy::ALL.iter().map(|p| p.index()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_routing_by_bin_count() {
        assert_eq!(
            GroupingPolicy::for_bin_count(2),
            Some(GroupingPolicy::Binary)
        );
        assert_eq!(
            GroupingPolicy::for_bin_count(3),
            Some(GroupingPolicy::HalfByte)
        );
        assert_eq!(
            GroupingPolicy::for_bin_count(16),
            Some(GroupingPolicy::HalfByte)
        );
        assert_eq!(GroupingPolicy::for_bin_count(17), Some(GroupingPolicy::Byte));
        assert_eq!(GroupingPolicy::for_bin_count(256), Some(GroupingPolicy::Byte));
        assert_eq!(GroupingPolicy::for_bin_count(257), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(GroupingPolicy::HalfByte.to_string(), "half_byte");
    }
}
