//! Inefficiency flag set
//!
//! A closed enumeration of usage-pattern conditions, one bit each, so any
//! subset can co-occur on a single allocation site. The detector derives
//! most flags from one site's chunk list; the two percentile passes add
//! the relative-ranking flags across the whole trace collection.
//!
//! The mask serializes as its raw `u64` bits so the storage layer can
//! persist it alongside the integer fields of a trace record.

use bitflags::bitflags;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Detected usage-pattern conditions for one allocation site
    ///
    /// Flags are independent except for the access-mix triple: the
    /// detector sets at most one of `UNUSED`, `WRITE_ONLY`, `READ_ONLY`,
    /// and none of them when a site saw both reads and writes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Inefficiency: u64 {
        /// Never read or written over the site's whole lifetime
        const UNUSED = 1;
        /// Written at least once but never read
        const WRITE_ONLY = 1 << 1;
        /// Read at least once but never written
        const READ_ONLY = 1 << 2;
        /// Some chunk lived no longer than the configured threshold
        const SHORT_LIFETIME = 1 << 3;
        /// Some chunk sat untouched for more than half of its lifetime
        /// before deallocation
        const LATE_FREE = 1 << 4;
        /// Some chunk sat untouched for more than half of its lifetime
        /// after allocation
        const EARLY_ALLOC = 1 << 5;
        /// Consecutive chunk sizes were non-decreasing for at least the
        /// configured run length
        const INCREASING_REALLOCS = 1 << 6;
        /// More than one thread touched some chunk
        const MULTI_THREAD = 1 << 7;
        /// Some chunk's touched range covered less of the allocation than
        /// the configured ratio
        const LOW_ACCESS_COVERAGE = 1 << 8;
        /// Site ranks in the top fraction of traces by chunk count
        const TOP_PERCENTILE_CHUNKS = 1 << 9;
        /// Site ranks in the top fraction of traces by peak aggregate size
        const TOP_PERCENTILE_SIZE = 1 << 10;
    }
}

/// Pure bit test: true iff every bit of `flag` is set in `mask`
///
/// No side effects; the mask is not modified.
pub fn has_inefficiency(mask: Inefficiency, flag: Inefficiency) -> bool {
    mask.contains(flag)
}

impl Inefficiency {
    /// Every individually detectable condition, in bit order
    pub const ALL_FLAGS: [Inefficiency; 11] = [
        Inefficiency::UNUSED,
        Inefficiency::WRITE_ONLY,
        Inefficiency::READ_ONLY,
        Inefficiency::SHORT_LIFETIME,
        Inefficiency::LATE_FREE,
        Inefficiency::EARLY_ALLOC,
        Inefficiency::INCREASING_REALLOCS,
        Inefficiency::MULTI_THREAD,
        Inefficiency::LOW_ACCESS_COVERAGE,
        Inefficiency::TOP_PERCENTILE_CHUNKS,
        Inefficiency::TOP_PERCENTILE_SIZE,
    ];

    /// Iterate over the single-bit flags set in this mask, in bit order
    pub fn iter_set(self) -> impl Iterator<Item = Inefficiency> {
        Self::ALL_FLAGS
            .into_iter()
            .filter(move |flag| self.contains(*flag))
    }

    /// Short name for a single flag
    ///
    /// Returns `"unknown"` for empty or multi-bit masks; call this on the
    /// values produced by [`Inefficiency::iter_set`].
    pub fn label(self) -> &'static str {
        match self.bits() {
            b if b == Self::UNUSED.bits() => "unused",
            b if b == Self::WRITE_ONLY.bits() => "write-only",
            b if b == Self::READ_ONLY.bits() => "read-only",
            b if b == Self::SHORT_LIFETIME.bits() => "short-lifetime",
            b if b == Self::LATE_FREE.bits() => "late-free",
            b if b == Self::EARLY_ALLOC.bits() => "early-alloc",
            b if b == Self::INCREASING_REALLOCS.bits() => "increasing-reallocs",
            b if b == Self::MULTI_THREAD.bits() => "multi-thread",
            b if b == Self::LOW_ACCESS_COVERAGE.bits() => "low-access-coverage",
            b if b == Self::TOP_PERCENTILE_CHUNKS.bits() => "top-percentile-chunks",
            b if b == Self::TOP_PERCENTILE_SIZE.bits() => "top-percentile-size",
            _ => "unknown",
        }
    }

    /// Human-readable description of a single flag, for the reporting layer
    pub fn description(self) -> &'static str {
        match self.bits() {
            b if b == Self::UNUSED.bits() => {
                "Allocations from this site were never read or written."
            }
            b if b == Self::WRITE_ONLY.bits() => {
                "Allocations from this site were written but never read back."
            }
            b if b == Self::READ_ONLY.bits() => {
                "Allocations from this site were read but never written."
            }
            b if b == Self::SHORT_LIFETIME.bits() => {
                "Some allocation from this site was freed almost immediately."
            }
            b if b == Self::LATE_FREE.bits() => {
                "Some allocation from this site was freed long after its last use."
            }
            b if b == Self::EARLY_ALLOC.bits() => {
                "Some allocation from this site was made long before its first use."
            }
            b if b == Self::INCREASING_REALLOCS.bits() => {
                "This site repeatedly allocated progressively larger chunks."
            }
            b if b == Self::MULTI_THREAD.bits() => {
                "Allocations from this site were accessed by more than one thread."
            }
            b if b == Self::LOW_ACCESS_COVERAGE.bits() => {
                "Accesses touched only a small part of some allocation from this site."
            }
            b if b == Self::TOP_PERCENTILE_CHUNKS.bits() => {
                "This site ranks in the top percentile by number of allocations."
            }
            b if b == Self::TOP_PERCENTILE_SIZE.bits() => {
                "This site ranks in the top percentile by peak aggregate size."
            }
            _ => "Unknown inefficiency flag.",
        }
    }

    /// Recommended remediation for a single flag, for the reporting layer
    pub fn recommendation(self) -> &'static str {
        match self.bits() {
            b if b == Self::UNUSED.bits() => {
                "Remove the allocation, or allocate lazily on first use."
            }
            b if b == Self::WRITE_ONLY.bits() => {
                "Check whether the written data is ever consumed; drop the buffer if not."
            }
            b if b == Self::READ_ONLY.bits() => {
                "Consider sharing one immutable copy instead of re-allocating per use."
            }
            b if b == Self::SHORT_LIFETIME.bits() => {
                "Reuse a pooled buffer or hoist the allocation out of the hot path."
            }
            b if b == Self::LATE_FREE.bits() => {
                "Free the allocation closer to its last use to reduce peak footprint."
            }
            b if b == Self::EARLY_ALLOC.bits() => {
                "Defer the allocation until the data is actually needed."
            }
            b if b == Self::INCREASING_REALLOCS.bits() => {
                "Reserve the final capacity up front instead of growing incrementally."
            }
            b if b == Self::MULTI_THREAD.bits() => {
                "Check for false sharing and contention on this site's allocations."
            }
            b if b == Self::LOW_ACCESS_COVERAGE.bits() => {
                "Right-size the allocation to the range that is actually touched."
            }
            b if b == Self::TOP_PERCENTILE_CHUNKS.bits() => {
                "High allocation count: batch allocations or use an arena."
            }
            b if b == Self::TOP_PERCENTILE_SIZE.bits() => {
                "Large aggregate footprint: audit this site's sizing and lifetime."
            }
            _ => "No recommendation available.",
        }
    }
}

impl Default for Inefficiency {
    fn default() -> Self {
        Inefficiency::empty()
    }
}

// The mask persists as its raw bits, like every other integer field of a
// trace record.
impl Serialize for Inefficiency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.bits())
    }
}

impl<'de> Deserialize<'de> for Inefficiency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u64::deserialize(deserializer)?;
        Ok(Inefficiency::from_bits_truncate(bits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_are_unique() {
        for (i, a) in Inefficiency::ALL_FLAGS.iter().enumerate() {
            assert_eq!(a.bits().count_ones(), 1, "{} is not a single bit", a.label());
            for b in &Inefficiency::ALL_FLAGS[i + 1..] {
                assert_eq!(a.bits() & b.bits(), 0);
            }
        }
    }

    #[test]
    fn test_has_inefficiency_is_a_pure_bit_test() {
        for flag in Inefficiency::ALL_FLAGS {
            let mask = flag;
            assert!(has_inefficiency(mask, flag));

            // No other flag reads as set
            for other in Inefficiency::ALL_FLAGS {
                if other != flag {
                    assert!(!has_inefficiency(mask, other));
                }
            }
        }
    }

    #[test]
    fn test_has_inefficiency_on_combined_mask() {
        let mask = Inefficiency::UNUSED | Inefficiency::SHORT_LIFETIME;
        assert!(has_inefficiency(mask, Inefficiency::UNUSED));
        assert!(has_inefficiency(mask, Inefficiency::SHORT_LIFETIME));
        assert!(!has_inefficiency(mask, Inefficiency::MULTI_THREAD));
    }

    #[test]
    fn test_iter_set_preserves_bit_order() {
        let mask = Inefficiency::TOP_PERCENTILE_SIZE
            | Inefficiency::READ_ONLY
            | Inefficiency::LATE_FREE;
        let flags: Vec<_> = mask.iter_set().collect();
        assert_eq!(
            flags,
            vec![
                Inefficiency::READ_ONLY,
                Inefficiency::LATE_FREE,
                Inefficiency::TOP_PERCENTILE_SIZE,
            ]
        );
    }

    #[test]
    fn test_every_flag_has_metadata() {
        for flag in Inefficiency::ALL_FLAGS {
            assert_ne!(flag.label(), "unknown");
            assert!(!flag.description().is_empty());
            assert!(!flag.recommendation().is_empty());
        }
    }

    #[test]
    fn test_multi_bit_mask_has_no_label() {
        let mask = Inefficiency::UNUSED | Inefficiency::READ_ONLY;
        assert_eq!(mask.label(), "unknown");
        assert_eq!(Inefficiency::empty().label(), "unknown");
    }

    #[test]
    fn test_serde_round_trip_as_bits() {
        let mask = Inefficiency::WRITE_ONLY | Inefficiency::TOP_PERCENTILE_CHUNKS;
        let json = serde_json::to_string(&mask).unwrap();
        assert_eq!(json, format!("{}", mask.bits()));

        let back: Inefficiency = serde_json::from_str(&json).unwrap();
        assert_eq!(mask, back);
    }

    #[test]
    fn test_deserialize_drops_undefined_bits() {
        let bits = Inefficiency::UNUSED.bits() | (1 << 40);
        let mask: Inefficiency = serde_json::from_str(&bits.to_string()).unwrap();
        assert_eq!(mask, Inefficiency::UNUSED);
    }
}
