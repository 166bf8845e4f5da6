#![no_main]

use libfuzzer_sys::fuzz_target;
use memoria::chunk::Chunk;
use memoria::pattern::{detect, usage_score, PatternParams};

// Decode one chunk per 26-byte window of the fuzz input. Field values are
// arbitrary; the passes must stay panic-free on anything the decoder
// produces.
fn decode_chunks(data: &[u8]) -> Vec<Chunk> {
    data.chunks_exact(26)
        .map(|window| {
            let word = |i: usize| {
                u32::from_le_bytes([window[i], window[i + 1], window[i + 2], window[i + 3]])
            };
            let start = u64::from(word(4));
            let lifetime = u64::from(word(8));
            let low = u64::from(word(16));
            Chunk {
                size: u64::from(word(0)),
                timestamp_start: start,
                timestamp_end: start + lifetime,
                timestamp_first_access: start + u64::from(word(12)) % (lifetime + 1),
                timestamp_last_access: start + lifetime,
                num_reads: u32::from(window[24]),
                num_writes: u32::from(window[25]),
                access_interval_low: low,
                access_interval_high: low + u64::from(word(20)),
                multi_thread: window[24] & 1 == 1,
            }
        })
        .collect()
}

fuzz_target!(|data: &[u8]| {
    let chunks = decode_chunks(data);

    let params = PatternParams::default();
    let first = detect(&chunks, &params);
    let second = detect(&chunks, &params);
    assert_eq!(first, second);

    let score = usage_score(&chunks);
    assert!(score >= 0.0);
});
