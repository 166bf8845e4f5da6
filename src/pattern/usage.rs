// Usage-density scoring for chunk sets
//
// One float per site: the observed access spread accumulated over the
// accessed chunks, divided by their total byte size. Higher values mean
// touched ranges that are large relative to allocation size, a proxy for
// diffuse usage. Chunks that were never accessed stay out of both sides
// of the ratio.

use crate::chunk::Chunk;

/// Compute the usage-density score for one site's chunk set
///
/// Returns `0.0` when no chunk was ever accessed, when the accumulated
/// access spread is zero, or when the accessed chunks' total byte size is
/// zero. The numerator deliberately weighs each accessed chunk by the
/// extent of its touched byte range; downstream ranking is calibrated
/// against exactly this accumulator.
///
/// The score is a pure aggregation: chunk order does not affect it, and
/// the input is never modified.
///
/// # Example
///
/// ```
/// use memoria::chunk::Chunk;
/// use memoria::pattern::usage_score;
///
/// let chunk = Chunk {
///     size: 1024,
///     timestamp_start: 0,
///     timestamp_end: 100,
///     timestamp_first_access: 10,
///     timestamp_last_access: 90,
///     num_reads: 1,
///     num_writes: 0,
///     access_interval_low: 0,
///     access_interval_high: 512,
///     multi_thread: false,
/// };
///
/// assert_eq!(usage_score(&[chunk]), 0.5);
/// ```
pub fn usage_score(chunks: &[Chunk]) -> f32 {
    let mut sum = 0.0f64;
    let mut total_bytes: u64 = 0;

    for chunk in chunks {
        if !chunk.was_accessed() {
            continue;
        }
        sum += chunk.access_span() as f64;
        total_bytes += chunk.size;
    }

    if sum == 0.0 || total_bytes == 0 {
        return 0.0;
    }
    sum as f32 / total_bytes as f32
}
