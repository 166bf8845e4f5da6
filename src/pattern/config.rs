// Configuration for one pattern-analysis run
//
// Populated by the profiler's configuration loader and handed to the
// analysis passes read-only. All thresholds are plain data so a run can be
// reproduced from its recorded configuration.

use serde::{Deserialize, Serialize};

/// Thresholds for the pattern detector and the percentile passes
///
/// # Example
/// ```
/// use memoria::pattern::PatternParams;
///
/// let params = PatternParams::default();
/// assert_eq!(params.percentile, 0.9);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternParams {
    /// Lifetime threshold (monotonic counter units) at or below which a
    /// chunk counts as short-lived
    ///
    /// The detector compares the site's minimum observed lifetime against
    /// this, so a single short-lived chunk flags the whole site.
    pub short_lifetime: u64,

    /// Minimum length of a run of consecutive non-decreasing chunk sizes
    /// that counts as a progressive-growth reallocation pattern
    ///
    /// Must be at least 1; a run of 1 would flag every non-empty site.
    pub alloc_min_run: u32,

    /// Minimum touched-range/size ratio a chunk must reach to avoid the
    /// low-access-coverage flag
    ///
    /// - 0.5 (default): flag chunks whose accesses covered less than half
    ///   of the allocation
    /// - 0.0: never flag
    pub access_coverage: f32,

    /// Fraction in `[0, 1]` defining the percentile cutoff for the two
    /// ranking passes
    ///
    /// 0.9 flags the top 10% of traces by chunk count and, separately, by
    /// peak aggregate size.
    pub percentile: f32,
}

impl Default for PatternParams {
    fn default() -> Self {
        Self {
            short_lifetime: 1_000,  // one thousand counter ticks
            alloc_min_run: 4,       // three growths in a row
            access_coverage: 0.5,   // half the allocation must be touched
            percentile: 0.9,        // top 10% of traces
        }
    }
}

impl PatternParams {
    /// Strict preset: only flagrant patterns are flagged
    ///
    /// Use when triaging a large trace collection down to the worst
    /// offenders.
    pub fn strict() -> Self {
        Self {
            short_lifetime: 100,
            alloc_min_run: 8,
            access_coverage: 0.25,
            percentile: 0.95,
        }
    }

    /// Permissive preset: surface anything remotely suspicious
    ///
    /// Use for an exploratory first pass over a new workload.
    pub fn permissive() -> Self {
        Self {
            short_lifetime: 10_000,
            alloc_min_run: 3,
            access_coverage: 0.75,
            percentile: 0.75,
        }
    }

    /// Validate thresholds
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.percentile) {
            return Err(format!(
                "percentile must be in [0, 1], got {}",
                self.percentile
            ));
        }

        if self.alloc_min_run == 0 {
            return Err("alloc_min_run must be >= 1".to_string());
        }

        if !self.access_coverage.is_finite() || self.access_coverage < 0.0 {
            return Err(format!(
                "access_coverage must be a non-negative finite ratio, got {}",
                self.access_coverage
            ));
        }

        Ok(())
    }
}
