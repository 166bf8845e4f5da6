// Percentile ranking across the whole trace collection
//
// Two passes, one flag each. The chunk-count pass relies on the caller's
// ascending pre-sort; the size pass ranks through a side list of
// (key, index) pairs because reordering the trace slice itself would
// invalidate the chunk-to-trace indices held by external code.

use super::PatternParams;
use crate::inefficiency::Inefficiency;
use crate::trace::Trace;

/// Flag the top `(1 - percentile)` fraction of traces by chunk count
///
/// Requires `traces` already sorted ascending by chunk count. Every trace
/// at or after index `floor(percentile * len)` receives
/// [`Inefficiency::TOP_PERCENTILE_CHUNKS`]; with `percentile = 0.9` that
/// is the top 10% of the collection. Trace order is preserved.
pub fn calculate_percentiles_chunk(traces: &mut [Trace], params: &PatternParams) {
    let cutoff = cutoff_index(traces.len(), params.percentile);
    for trace in &mut traces[cutoff..] {
        trace.inefficiencies |= Inefficiency::TOP_PERCENTILE_CHUNKS;
    }
}

/// Flag the top `(1 - percentile)` fraction of traces by peak aggregate size
///
/// Builds a side list of `(max_aggregate, original index)` pairs, sorts
/// that ascending, and writes [`Inefficiency::TOP_PERCENTILE_SIZE`] back
/// through the original indices at or after the cutoff. The caller's trace
/// order is never touched, and no pre-sort is required. The side sort is
/// stable, so ties in `max_aggregate` keep their original relative order
/// and results are reproducible across runs on identical input.
pub fn calculate_percentiles_size(traces: &mut [Trace], params: &PatternParams) {
    let mut ranked: Vec<(u64, usize)> = traces
        .iter()
        .enumerate()
        .map(|(index, trace)| (trace.max_aggregate, index))
        .collect();
    ranked.sort_by_key(|&(aggregate, _)| aggregate);

    let cutoff = cutoff_index(traces.len(), params.percentile);
    for &(_, original) in &ranked[cutoff..] {
        traces[original].inefficiencies |= Inefficiency::TOP_PERCENTILE_SIZE;
    }
}

// floor(percentile * len), clamped into [0, len] so degenerate
// configurations cannot index past the collection.
fn cutoff_index(len: usize, percentile: f32) -> usize {
    ((percentile * len as f32) as usize).min(len)
}
