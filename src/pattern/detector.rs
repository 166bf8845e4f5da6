// Per-site inefficiency detection
//
// One left-to-right pass over a site's chunk list accumulates the
// aggregate signals; the flag mask is derived after the pass. No hidden
// state: the same chunk list always yields the same mask.

use super::PatternParams;
use crate::chunk::Chunk;
use crate::inefficiency::Inefficiency;

/// Derive the inefficiency mask for one allocation site
///
/// Flags describe the site's aggregate behavior, not individual chunks: a
/// single chunk exhibiting a condition marks the whole site. An empty
/// chunk list yields an empty mask.
///
/// Signals accumulated during the pass:
///
/// - minimum observed lifetime, compared against `short_lifetime`
/// - read/write totals; a zero total sets exactly one of
///   [`Inefficiency::UNUSED`], [`Inefficiency::WRITE_ONLY`],
///   [`Inefficiency::READ_ONLY`]
/// - a first access later than half a chunk's lifetime sets
///   [`Inefficiency::EARLY_ALLOC`]; a last access more than half a
///   lifetime before deallocation sets [`Inefficiency::LATE_FREE`]
/// - the longest run of consecutive non-decreasing chunk sizes, compared
///   against `alloc_min_run`
/// - any multi-threaded chunk sets [`Inefficiency::MULTI_THREAD`]
/// - any chunk whose touched-range ratio falls below `access_coverage`
///   sets [`Inefficiency::LOW_ACCESS_COVERAGE`]
pub fn detect(chunks: &[Chunk], params: &PatternParams) -> Inefficiency {
    if chunks.is_empty() {
        return Inefficiency::empty();
    }

    let mut min_lifetime = u64::MAX;
    let mut total_reads: u64 = 0;
    let mut total_writes: u64 = 0;
    let mut has_early_alloc = false;
    let mut has_late_free = false;
    let mut has_multi_thread = false;
    let mut has_low_access_coverage = false;
    let mut last_size: Option<u64> = None;
    let mut current_run: u32 = 0;
    let mut longest_run: u32 = 0;

    for chunk in chunks {
        let lifetime = chunk.lifetime();
        if lifetime < min_lifetime {
            min_lifetime = lifetime;
        }

        total_reads += u64::from(chunk.num_reads);
        total_writes += u64::from(chunk.num_writes);

        // A first touch later than half the lifetime means the chunk sat
        // allocated but unused; a last touch more than half a lifetime
        // before the free means it sat unused until deallocation. Access
        // timestamps of never-touched chunks may sit at their recorded
        // defaults, so saturate instead of wrapping.
        let half_lifetime = lifetime / 2;
        if chunk
            .timestamp_first_access
            .saturating_sub(chunk.timestamp_start)
            > half_lifetime
        {
            has_early_alloc = true;
        }
        if chunk
            .timestamp_end
            .saturating_sub(chunk.timestamp_last_access)
            > half_lifetime
        {
            has_late_free = true;
        }

        // Run of non-decreasing sizes in iteration order. The first chunk
        // always starts a run of length 1; a decrease starts a fresh run
        // at the decreasing chunk.
        match last_size {
            Some(prev) if chunk.size < prev => {
                if current_run > longest_run {
                    longest_run = current_run;
                }
                current_run = 1;
            }
            _ => current_run += 1,
        }
        last_size = Some(chunk.size);

        if chunk.multi_thread {
            has_multi_thread = true;
        }

        if chunk.coverage() < params.access_coverage {
            has_low_access_coverage = true;
        }
    }
    if current_run > longest_run {
        longest_run = current_run;
    }

    let mut mask = Inefficiency::empty();

    if min_lifetime <= params.short_lifetime {
        mask |= Inefficiency::SHORT_LIFETIME;
    }

    // The access-mix triple is mutually exclusive; a site with both reads
    // and writes gets none of them.
    if total_reads == 0 || total_writes == 0 {
        if total_writes > 0 {
            mask |= Inefficiency::WRITE_ONLY;
        } else if total_reads > 0 {
            mask |= Inefficiency::READ_ONLY;
        } else {
            mask |= Inefficiency::UNUSED;
        }
    }

    if has_early_alloc {
        mask |= Inefficiency::EARLY_ALLOC;
    }
    if has_late_free {
        mask |= Inefficiency::LATE_FREE;
    }
    if longest_run >= params.alloc_min_run {
        mask |= Inefficiency::INCREASING_REALLOCS;
    }
    if has_multi_thread {
        mask |= Inefficiency::MULTI_THREAD;
    }
    if has_low_access_coverage {
        mask |= Inefficiency::LOW_ACCESS_COVERAGE;
    }

    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inefficiency::has_inefficiency;

    // A well-used chunk that triggers nothing under the default params.
    fn quiet_chunk() -> Chunk {
        Chunk {
            size: 1024,
            timestamp_start: 0,
            timestamp_end: 100_000,
            timestamp_first_access: 10,
            timestamp_last_access: 99_990,
            num_reads: 10,
            num_writes: 10,
            access_interval_low: 0,
            access_interval_high: 1024,
            multi_thread: false,
        }
    }

    #[test]
    fn test_empty_chunk_list_yields_empty_mask() {
        let params = PatternParams::default();
        assert!(detect(&[], &params).is_empty());
    }

    #[test]
    fn test_quiet_site_yields_empty_mask() {
        let params = PatternParams::default();
        assert!(detect(&[quiet_chunk()], &params).is_empty());
    }

    #[test]
    fn test_unused_excludes_read_write_flags() {
        let mut chunk = quiet_chunk();
        chunk.num_reads = 0;
        chunk.num_writes = 0;

        let mask = detect(&[chunk.clone(), chunk], &PatternParams::default());
        assert!(has_inefficiency(mask, Inefficiency::UNUSED));
        assert!(!has_inefficiency(mask, Inefficiency::READ_ONLY));
        assert!(!has_inefficiency(mask, Inefficiency::WRITE_ONLY));
    }

    #[test]
    fn test_read_only_site() {
        let mut chunk = quiet_chunk();
        chunk.num_writes = 0;

        let mask = detect(&[chunk], &PatternParams::default());
        assert!(has_inefficiency(mask, Inefficiency::READ_ONLY));
        assert!(!has_inefficiency(mask, Inefficiency::WRITE_ONLY));
        assert!(!has_inefficiency(mask, Inefficiency::UNUSED));
    }

    #[test]
    fn test_write_only_site() {
        let mut chunk = quiet_chunk();
        chunk.num_reads = 0;

        let mask = detect(&[chunk], &PatternParams::default());
        assert!(has_inefficiency(mask, Inefficiency::WRITE_ONLY));
        assert!(!has_inefficiency(mask, Inefficiency::READ_ONLY));
    }

    #[test]
    fn test_mixed_access_sets_no_access_mix_flag() {
        // One read-only chunk plus one write-only chunk: the totals are
        // both nonzero, so the site as a whole is neither.
        let mut reader = quiet_chunk();
        reader.num_writes = 0;
        let mut writer = quiet_chunk();
        writer.num_reads = 0;

        let mask = detect(&[reader, writer], &PatternParams::default());
        assert!(!has_inefficiency(mask, Inefficiency::READ_ONLY));
        assert!(!has_inefficiency(mask, Inefficiency::WRITE_ONLY));
        assert!(!has_inefficiency(mask, Inefficiency::UNUSED));
    }

    #[test]
    fn test_short_lifetime_uses_minimum_across_chunks() {
        let mut short = quiet_chunk();
        short.timestamp_end = short.timestamp_start + 1_000; // exactly at threshold
        short.timestamp_last_access = short.timestamp_end;

        let mask = detect(&[quiet_chunk(), short], &PatternParams::default());
        assert!(has_inefficiency(mask, Inefficiency::SHORT_LIFETIME));
    }

    #[test]
    fn test_lifetime_above_threshold_not_flagged() {
        let mut chunk = quiet_chunk();
        chunk.timestamp_end = chunk.timestamp_start + 1_001;
        chunk.timestamp_last_access = chunk.timestamp_end - 1;

        let mask = detect(&[chunk], &PatternParams::default());
        assert!(!has_inefficiency(mask, Inefficiency::SHORT_LIFETIME));
    }

    #[test]
    fn test_late_first_access_flags_early_alloc() {
        let mut chunk = quiet_chunk();
        chunk.timestamp_first_access = 60_000; // > half of the 100_000 lifetime

        let mask = detect(&[chunk], &PatternParams::default());
        assert!(has_inefficiency(mask, Inefficiency::EARLY_ALLOC));
        assert!(!has_inefficiency(mask, Inefficiency::LATE_FREE));
    }

    #[test]
    fn test_early_last_access_flags_late_free() {
        let mut chunk = quiet_chunk();
        chunk.timestamp_last_access = 40_000; // freed 60_000 ticks later

        let mask = detect(&[chunk], &PatternParams::default());
        assert!(has_inefficiency(mask, Inefficiency::LATE_FREE));
        assert!(!has_inefficiency(mask, Inefficiency::EARLY_ALLOC));
    }

    #[test]
    fn test_gap_of_exactly_half_lifetime_not_flagged() {
        let mut chunk = quiet_chunk();
        chunk.timestamp_first_access = 50_000;
        chunk.timestamp_last_access = 50_000;

        let mask = detect(&[chunk], &PatternParams::default());
        assert!(!has_inefficiency(mask, Inefficiency::EARLY_ALLOC));
        assert!(!has_inefficiency(mask, Inefficiency::LATE_FREE));
    }

    #[test]
    fn test_increasing_realloc_run() {
        let chunks: Vec<Chunk> = [256u64, 512, 1024, 2048]
            .iter()
            .map(|&size| {
                let mut chunk = quiet_chunk();
                chunk.size = size;
                chunk.access_interval_high = size; // keep coverage at 1.0
                chunk
            })
            .collect();

        let mask = detect(&chunks, &PatternParams::default());
        assert!(has_inefficiency(mask, Inefficiency::INCREASING_REALLOCS));
    }

    #[test]
    fn test_broken_run_not_flagged() {
        let chunks: Vec<Chunk> = [256u64, 512, 128, 1024, 64, 2048]
            .iter()
            .map(|&size| {
                let mut chunk = quiet_chunk();
                chunk.size = size;
                chunk.access_interval_high = size;
                chunk
            })
            .collect();

        // Longest non-decreasing run is 2, below the default of 4.
        let mask = detect(&chunks, &PatternParams::default());
        assert!(!has_inefficiency(mask, Inefficiency::INCREASING_REALLOCS));
    }

    #[test]
    fn test_equal_sizes_extend_a_run() {
        let chunks: Vec<Chunk> = [512u64, 512, 512, 512]
            .iter()
            .map(|&size| {
                let mut chunk = quiet_chunk();
                chunk.size = size;
                chunk.access_interval_high = size;
                chunk
            })
            .collect();

        let mask = detect(&chunks, &PatternParams::default());
        assert!(has_inefficiency(mask, Inefficiency::INCREASING_REALLOCS));
    }

    #[test]
    fn test_trailing_run_is_counted() {
        // The qualifying run ends at the last chunk; it must still count.
        let chunks: Vec<Chunk> = [2048u64, 64, 128, 256, 512]
            .iter()
            .map(|&size| {
                let mut chunk = quiet_chunk();
                chunk.size = size;
                chunk.access_interval_high = size;
                chunk
            })
            .collect();

        let mask = detect(&chunks, &PatternParams::default());
        assert!(has_inefficiency(mask, Inefficiency::INCREASING_REALLOCS));
    }

    #[test]
    fn test_multi_thread_chunk_marks_site() {
        let mut chunk = quiet_chunk();
        chunk.multi_thread = true;

        let mask = detect(&[quiet_chunk(), chunk], &PatternParams::default());
        assert!(has_inefficiency(mask, Inefficiency::MULTI_THREAD));
    }

    #[test]
    fn test_low_coverage_chunk_marks_site() {
        let mut chunk = quiet_chunk();
        chunk.access_interval_low = 0;
        chunk.access_interval_high = 100; // < 50% of 1024

        let mask = detect(&[quiet_chunk(), chunk], &PatternParams::default());
        assert!(has_inefficiency(mask, Inefficiency::LOW_ACCESS_COVERAGE));
    }

    #[test]
    fn test_full_coverage_not_flagged() {
        let mask = detect(&[quiet_chunk()], &PatternParams::default());
        assert!(!has_inefficiency(mask, Inefficiency::LOW_ACCESS_COVERAGE));
    }

    #[test]
    fn test_detect_is_deterministic() {
        let chunks: Vec<Chunk> = (0..32)
            .map(|i| {
                let mut chunk = quiet_chunk();
                chunk.size = 64 << (i % 5);
                chunk.num_reads = (i % 3) as u32;
                chunk.num_writes = ((i + 1) % 2) as u32;
                chunk
            })
            .collect();

        let params = PatternParams::default();
        assert_eq!(detect(&chunks, &params), detect(&chunks, &params));
    }
}
