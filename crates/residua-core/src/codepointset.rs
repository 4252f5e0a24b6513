//! Canonical, disjoint-interval sets of Unicode code points.
//!
//! A [`CodePointSet`] is always kept in canonical form: intervals sorted,
//! non-empty, non-adjacent, non-overlapping. Two sets compare equal iff their
//! interval lists are identical, which is what lets [`CodePointSet`] serve as
//! a hash-consing key inside `Expr::Chars`.

use std::fmt;

use thiserror::Error;

/// Exclusive upper bound of the Unicode code-point range: `0..=0x10FFFF`.
pub const MAX_CODE_POINT_EXCLUSIVE: u32 = 0x110000;

/// Error constructing a [`CodePointSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum CodePointSetError {
    /// `lo >= hi`, or either bound lies outside `0..=0x110000`.
    #[error("invalid code point range [{lo}, {hi})")]
    InvalidRange { lo: u32, hi: u32 },
}

/// A canonical, ordered set of disjoint half-open intervals `[lo, hi)` over
/// `0..=0x10FFFF`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CodePointSet {
    ranges: Vec<(u32, u32)>,
}

impl fmt::Debug for CodePointSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.ranges.iter()).finish()
    }
}

impl CodePointSet {
    /// The empty set.
    pub fn empty() -> Self {
        Self { ranges: Vec::new() }
    }

    /// The full range `0..=0x10FFFF`.
    pub fn full() -> Self {
        Self {
            ranges: vec![(0, MAX_CODE_POINT_EXCLUSIVE)],
        }
    }

    /// A singleton-interval set `[lo, hi)`.
    pub fn of_range(lo: u32, hi: u32) -> Result<Self, CodePointSetError> {
        if lo >= hi || hi > MAX_CODE_POINT_EXCLUSIVE {
            return Err(CodePointSetError::InvalidRange { lo, hi });
        }
        Ok(Self { ranges: vec![(lo, hi)] })
    }

    /// A singleton set containing exactly one code point.
    pub fn of_char(c: u32) -> Result<Self, CodePointSetError> {
        Self::of_range(c, c + 1)
    }

    /// Build directly from a list of ranges, normalizing (sorting, merging
    /// overlapping/adjacent intervals, dropping empties) rather than erroring.
    pub fn from_ranges(mut ranges: Vec<(u32, u32)>) -> Self {
        ranges.retain(|&(lo, hi)| lo < hi);
        ranges.sort_unstable();

        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(ranges.len());
        for (lo, hi) in ranges {
            if let Some(last) = merged.last_mut() {
                if lo <= last.1 {
                    last.1 = last.1.max(hi);
                    continue;
                }
            }
            merged.push((lo, hi));
        }
        Self { ranges: merged }
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.ranges.as_slice() == [(0, MAX_CODE_POINT_EXCLUSIVE)]
    }

    /// Iterate over the canonical interval list in order.
    pub fn iter_ranges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.ranges.iter().copied()
    }

    pub fn contains(&self, cp: u32) -> bool {
        self.ranges
            .binary_search_by(|&(lo, hi)| {
                if cp < lo {
                    std::cmp::Ordering::Greater
                } else if cp >= hi {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    /// The smallest code point in the set, if any. Used by the DFA builder to
    /// pick a representative from each alphabet-partition class.
    pub fn min(&self) -> Option<u32> {
        self.ranges.first().map(|&(lo, _)| lo)
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut ranges = self.ranges.clone();
        ranges.extend_from_slice(&other.ranges);
        Self::from_ranges(ranges)
    }

    pub fn intersect(&self, other: &Self) -> Self {
        let mut result = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.ranges.len() && j < other.ranges.len() {
            let (a_lo, a_hi) = self.ranges[i];
            let (b_lo, b_hi) = other.ranges[j];
            let lo = a_lo.max(b_lo);
            let hi = a_hi.min(b_hi);
            if lo < hi {
                result.push((lo, hi));
            }
            if a_hi < b_hi {
                i += 1;
            } else {
                j += 1;
            }
        }
        Self { ranges: result }
    }

    pub fn complement(&self) -> Self {
        let mut result = Vec::with_capacity(self.ranges.len() + 1);
        let mut cursor = 0u32;
        for &(lo, hi) in &self.ranges {
            if cursor < lo {
                result.push((cursor, lo));
            }
            cursor = hi;
        }
        if cursor < MAX_CODE_POINT_EXCLUSIVE {
            result.push((cursor, MAX_CODE_POINT_EXCLUSIVE));
        }
        Self { ranges: result }
    }

    pub fn difference(&self, other: &Self) -> Self {
        self.intersect(&other.complement())
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.difference(other).is_empty()
    }
}
