//! Allocation site record
//!
//! A `Trace` aggregates every chunk allocated from one site (one call
//! stack). The capture/storage layers populate the aggregate fields while
//! grouping chunks; the analysis passes only ever mutate the
//! `inefficiencies` mask, and the driver pass fills the `usage_score`
//! slot.

use crate::inefficiency::Inefficiency;
use serde::{Deserialize, Serialize};

/// Aggregated record for one allocation site
///
/// External code holds positional indices into the trace collection
/// (chunk records point back at their parent trace by index), so no pass
/// in this crate may reorder a caller's trace slice. The size percentile
/// pass ranks through a side list of indices for exactly this reason.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Trace {
    /// Detected inefficiency flags for this site
    pub inefficiencies: Inefficiency,

    /// Peak aggregate byte size reached by this site's live chunks,
    /// precomputed by the storage layer
    pub max_aggregate: u64,

    /// Usage-density score for this site's chunk set
    pub usage_score: f32,

    /// Number of chunks recorded for this site; the driver keys its
    /// ascending pre-sort for the chunk-count percentile pass on this
    pub num_chunks: usize,
}

impl Trace {
    /// New site record with empty flags and zeroed aggregates
    pub fn new(max_aggregate: u64, num_chunks: usize) -> Self {
        Self {
            inefficiencies: Inefficiency::empty(),
            max_aggregate,
            usage_score: 0.0,
            num_chunks,
        }
    }
}
