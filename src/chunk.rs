//! Allocation chunk record schema
//!
//! A `Chunk` is one observed memory allocation's lifecycle statistics as
//! recorded by the capture pipeline: when it was allocated and freed, when
//! it was first and last touched, how often it was read and written, and
//! which byte range of the allocation the accesses covered.
//!
//! Chunks are produced and owned by the capture/storage layers; the
//! analysis passes in this crate only ever read them.

use serde::{Deserialize, Serialize};

/// Lifecycle and access statistics for a single memory allocation
///
/// All timestamps are monotonic counter units from the capture pipeline,
/// with `timestamp_start <= timestamp_end` and, when any access occurred,
/// both access timestamps inside that window. Out-of-order timestamps are
/// a capture bug, not a condition this crate detects or reports.
///
/// # Example
///
/// ```
/// use memoria::chunk::Chunk;
///
/// let chunk = Chunk {
///     size: 4096,
///     timestamp_start: 100,
///     timestamp_end: 900,
///     timestamp_first_access: 150,
///     timestamp_last_access: 850,
///     num_reads: 12,
///     num_writes: 3,
///     access_interval_low: 0,
///     access_interval_high: 4096,
///     multi_thread: false,
/// };
///
/// assert_eq!(chunk.lifetime(), 800);
/// assert!(chunk.was_accessed());
/// assert_eq!(chunk.coverage(), 1.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Byte extent of the allocation (> 0 for real allocations)
    pub size: u64,

    /// Allocation time (monotonic counter units)
    pub timestamp_start: u64,

    /// Deallocation time; `>= timestamp_start`
    pub timestamp_end: u64,

    /// First touch time; stays at its recorded default when the chunk was
    /// never accessed
    pub timestamp_first_access: u64,

    /// Last touch time; stays at its recorded default when the chunk was
    /// never accessed
    pub timestamp_last_access: u64,

    /// Number of observed read accesses
    pub num_reads: u32,

    /// Number of observed write accesses
    pub num_writes: u32,

    /// Low bound of the byte-offset range touched within the allocation
    pub access_interval_low: u64,

    /// High bound of the byte-offset range touched within the allocation;
    /// `>= access_interval_low`
    pub access_interval_high: u64,

    /// Whether more than one thread accessed this chunk
    pub multi_thread: bool,
}

impl Chunk {
    /// Total lifetime of the allocation
    pub fn lifetime(&self) -> u64 {
        self.timestamp_end - self.timestamp_start
    }

    /// Extent of the observed access-offset range
    pub fn access_span(&self) -> u64 {
        self.access_interval_high - self.access_interval_low
    }

    /// True if the chunk saw at least one read or write
    pub fn was_accessed(&self) -> bool {
        self.num_reads > 0 || self.num_writes > 0
    }

    /// Fraction of the allocation covered by the touched byte range
    ///
    /// Zero-sized chunks report `0.0` rather than dividing by zero.
    pub fn coverage(&self) -> f32 {
        if self.size == 0 {
            return 0.0;
        }
        self.access_span() as f32 / self.size as f32
    }
}
