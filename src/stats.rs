//! Per-site aggregate statistics
//!
//! Summary numbers for one allocation site's chunk set, computed alongside
//! the flag detector and consumed by the reporting layer for ranking and
//! log lines.

use crate::chunk::Chunk;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate statistics for one site's chunk set
///
/// All fields are plain totals/extrema over the input; an empty chunk set
/// yields the all-zero default.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkStats {
    /// Number of chunks recorded for the site
    pub chunk_count: usize,

    /// Chunks with at least one read or write
    pub accessed_count: usize,

    /// Total bytes allocated across all chunks
    pub total_bytes: u64,

    /// Read accesses across all chunks
    pub total_reads: u64,

    /// Write accesses across all chunks
    pub total_writes: u64,

    /// Shortest observed chunk lifetime
    pub min_lifetime: u64,

    /// Longest observed chunk lifetime
    pub max_lifetime: u64,

    /// Mean chunk lifetime
    pub mean_lifetime: f64,
}

impl ChunkStats {
    /// Aggregate one site's chunk set
    pub fn from_chunks(chunks: &[Chunk]) -> Self {
        if chunks.is_empty() {
            return Self::default();
        }

        let mut stats = Self {
            chunk_count: chunks.len(),
            min_lifetime: u64::MAX,
            ..Self::default()
        };
        let mut lifetime_sum: u64 = 0;

        for chunk in chunks {
            if chunk.was_accessed() {
                stats.accessed_count += 1;
            }
            stats.total_bytes += chunk.size;
            stats.total_reads += u64::from(chunk.num_reads);
            stats.total_writes += u64::from(chunk.num_writes);

            let lifetime = chunk.lifetime();
            lifetime_sum += lifetime;
            if lifetime < stats.min_lifetime {
                stats.min_lifetime = lifetime;
            }
            if lifetime > stats.max_lifetime {
                stats.max_lifetime = lifetime;
            }
        }

        stats.mean_lifetime = lifetime_sum as f64 / chunks.len() as f64;
        stats
    }
}

impl fmt::Display for ChunkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} chunks ({} accessed), {} bytes, {} reads / {} writes, \
             lifetime min/mean/max {}/{:.1}/{}",
            self.chunk_count,
            self.accessed_count,
            self.total_bytes,
            self.total_reads,
            self.total_writes,
            self.min_lifetime,
            self.mean_lifetime,
            self.max_lifetime
        )
    }
}
