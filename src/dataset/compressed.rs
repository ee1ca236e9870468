//! Compressed feature storage partitioned by grouping policy.
//!
//! Quantized feature columns are routed to the narrowest grouping policy
//! whose bin capacity fits and stored in that policy's packed layout:
//! one bit, one nibble or one byte per document. The split search only
//! ever reads this structure; it is built once before a tree is grown and
//! shared read-only across every score engine.

use crate::core::error::{PairBoostError, Result};
use crate::core::types::{BinIndex, DataSize, FeatureIndex};
use crate::dataset::policy::{GroupingPolicy, POLICY_COUNT};

/// Packed bin storage for one feature column.
#[derive(Debug, Clone)]
enum PackedBins {
    /// 64 documents per word, one bit each.
    OneBit(Vec<u64>),
    /// Two documents per byte, low nibble first.
    Nibble(Vec<u8>),
    /// One document per byte.
    Byte(Vec<u8>),
}

impl PackedBins {
    fn pack(policy: GroupingPolicy, bins: &[BinIndex]) -> PackedBins {
        match policy {
            GroupingPolicy::Binary => {
                let mut words = vec![0u64; bins.len().div_ceil(64)];
                for (doc, &bin) in bins.iter().enumerate() {
                    words[doc / 64] |= u64::from(bin & 1) << (doc % 64);
                }
                PackedBins::OneBit(words)
            }
            GroupingPolicy::HalfByte => {
                let mut nibbles = vec![0u8; bins.len().div_ceil(2)];
                for (doc, &bin) in bins.iter().enumerate() {
                    nibbles[doc / 2] |= (bin & 0x0f) << ((doc % 2) * 4);
                }
                PackedBins::Nibble(nibbles)
            }
            GroupingPolicy::Byte => PackedBins::Byte(bins.to_vec()),
        }
    }

    #[inline]
    fn get(&self, doc: usize) -> BinIndex {
        match self {
            PackedBins::OneBit(words) => ((words[doc / 64] >> (doc % 64)) & 1) as BinIndex,
            PackedBins::Nibble(nibbles) => (nibbles[doc / 2] >> ((doc % 2) * 4)) & 0x0f,
            PackedBins::Byte(bytes) => bytes[doc],
        }
    }
}

/// One quantized feature column in its packed layout.
#[derive(Debug, Clone)]
pub struct CompressedFeature {
    bin_count: usize,
    bins: PackedBins,
}

impl CompressedFeature {
    /// Number of bins of this feature.
    pub fn bin_count(&self) -> usize {
        self.bin_count
    }

    /// Number of split thresholds this feature offers.
    pub fn threshold_count(&self) -> usize {
        self.bin_count - 1
    }

    /// Bin of the given document.
    #[inline]
    pub fn bin(&self, doc: DataSize) -> BinIndex {
        self.bins.get(doc as usize)
    }
}

/// Read-only collection of quantized features, partitioned by grouping
/// policy.
#[derive(Debug, Clone)]
pub struct CompressedFeatureSet {
    num_docs: usize,
    groups: [Vec<CompressedFeature>; POLICY_COUNT],
}

impl CompressedFeatureSet {
    /// Builds a feature set from raw binned columns.
    ///
    /// Each column is a `(bins, bin_count)` pair with one bin value per
    /// document. Columns are validated and routed to the narrowest policy
    /// that fits their bin count; within a policy, features keep the
    /// relative order in which they were supplied.
    pub fn from_binned_columns(columns: &[(Vec<BinIndex>, usize)], num_docs: usize) -> Result<Self> {
        let assigned: Vec<(Vec<BinIndex>, usize, GroupingPolicy)> = columns
            .iter()
            .enumerate()
            .map(|(column_idx, (bins, bin_count))| {
                let policy = GroupingPolicy::for_bin_count(*bin_count).ok_or_else(|| {
                    PairBoostError::dataset(format!(
                        "column {} has {} bins, exceeding the byte policy capacity",
                        column_idx, bin_count
                    ))
                })?;
                Ok((bins.clone(), *bin_count, policy))
            })
            .collect::<Result<_>>()?;
        Self::from_assigned_columns(&assigned, num_docs)
    }

    /// Builds a feature set with an explicit policy per column.
    ///
    /// Callers constructing synthetic grids (tests, diagnostics) may pin
    /// a column to a wider policy than its bin count requires; the bin
    /// count must still fit the policy's capacity.
    pub fn from_assigned_columns(
        columns: &[(Vec<BinIndex>, usize, GroupingPolicy)],
        num_docs: usize,
    ) -> Result<Self> {
        let mut groups: [Vec<CompressedFeature>; POLICY_COUNT] = Default::default();
        for (column_idx, (bins, bin_count, policy)) in columns.iter().enumerate() {
            if bins.len() != num_docs {
                return Err(PairBoostError::dimension_mismatch(
                    format!("{} documents", num_docs),
                    format!("{} bins in column {}", bins.len(), column_idx),
                ));
            }
            if *bin_count < 2 {
                return Err(PairBoostError::dataset(format!(
                    "column {} has {} bins, need at least 2 to be splittable",
                    column_idx, bin_count
                )));
            }
            if *bin_count > policy.max_bins() {
                return Err(PairBoostError::dataset(format!(
                    "column {} has {} bins, exceeding policy {} capacity of {}",
                    column_idx,
                    bin_count,
                    policy,
                    policy.max_bins()
                )));
            }
            if let Some(&bad) = bins.iter().find(|&&bin| bin as usize >= *bin_count) {
                return Err(PairBoostError::dataset(format!(
                    "column {} contains bin {} outside its {} bins",
                    column_idx, bad, bin_count
                )));
            }
            groups[policy.index()].push(CompressedFeature {
                bin_count: *bin_count,
                bins: PackedBins::pack(*policy, bins),
            });
        }
        Ok(CompressedFeatureSet { num_docs, groups })
    }

    /// Number of documents each column covers.
    pub fn num_docs(&self) -> usize {
        self.num_docs
    }

    /// Number of features stored under the given policy.
    pub fn grid_size(&self, policy: GroupingPolicy) -> usize {
        self.groups[policy.index()].len()
    }

    /// Features of the given policy, in supply order.
    pub fn features(&self, policy: GroupingPolicy) -> &[CompressedFeature] {
        &self.groups[policy.index()]
    }

    /// A single feature of the given policy.
    pub fn feature(&self, policy: GroupingPolicy, index: FeatureIndex) -> Result<&CompressedFeature> {
        self.groups[policy.index()].get(index).ok_or_else(|| {
            PairBoostError::precondition(format!(
                "policy {} has {} features, requested index {}",
                policy,
                self.grid_size(policy),
                index
            ))
        })
    }

    /// Total number of split candidates over all features of a policy.
    pub fn candidate_count(&self, policy: GroupingPolicy) -> usize {
        self.features(policy)
            .iter()
            .map(|feature| feature.threshold_count())
            .sum()
    }
}
