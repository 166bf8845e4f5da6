//! Driver pass composing the analysis core
//!
//! The surrounding profiler owns the sequencing: it groups captured
//! chunks by allocation site, runs the detector and the scorer per site,
//! stores the results on the trace records, then ranks the whole
//! collection. This module packages that sequencing for embedders that
//! want the standard composition instead of re-implementing it.
//!
//! The four core passes in [`crate::pattern`] stay independent; only this
//! module calls more than one of them.

use crate::chunk::Chunk;
use crate::inefficiency::Inefficiency;
use crate::pattern::{
    calculate_percentiles_chunk, calculate_percentiles_size, detect, usage_score, PatternParams,
};
use crate::stats::ChunkStats;
use crate::trace::Trace;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors from the driver pass
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("invalid pattern parameters: {0}")]
    InvalidParams(String),
}

/// Per-site analysis bundle: flags, density score, and summary statistics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteAnalysis {
    /// Inefficiency flags detected from the site's chunk list
    pub inefficiencies: Inefficiency,
    /// Usage-density score for the same chunk list
    pub usage_score: f32,
    /// Aggregate statistics over the chunk list
    pub stats: ChunkStats,
}

/// Analyze one site's chunk list
///
/// Bundles the detector, the usage scorer, and the aggregate statistics
/// for a single trace. The relative-ranking flags need visibility over
/// the whole collection and are only added by [`analyze_traces`].
pub fn analyze_site(chunks: &[Chunk], params: &PatternParams) -> SiteAnalysis {
    SiteAnalysis {
        inefficiencies: detect(chunks, params),
        usage_score: usage_score(chunks),
        stats: ChunkStats::from_chunks(chunks),
    }
}

/// Apply one site's analysis to its trace record
///
/// Merges the detected flags into the trace mask (ranking flags already
/// present are kept) and fills the score slot.
pub fn apply_site_analysis(trace: &mut Trace, analysis: &SiteAnalysis) {
    trace.inefficiencies |= analysis.inefficiencies;
    trace.usage_score = analysis.usage_score;
}

/// Trace population per flag after a ranking run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSummary {
    /// Number of traces examined
    pub total_traces: usize,
    /// Traces carrying each flag, in bit order; flags nobody carries are
    /// omitted
    pub counts: Vec<(Inefficiency, usize)>,
}

impl FlagSummary {
    fn from_traces(traces: &[Trace]) -> Self {
        let mut summary = Self {
            total_traces: traces.len(),
            counts: Vec::new(),
        };
        for flag in Inefficiency::ALL_FLAGS {
            let count = traces
                .iter()
                .filter(|trace| trace.inefficiencies.contains(flag))
                .count();
            if count > 0 {
                summary.counts.push((flag, count));
            }
        }
        summary
    }

    /// Number of traces carrying `flag` (0 if absent from the summary)
    pub fn count(&self, flag: Inefficiency) -> usize {
        self.counts
            .iter()
            .find(|(candidate, _)| *candidate == flag)
            .map_or(0, |&(_, count)| count)
    }
}

impl fmt::Display for FlagSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} traces", self.total_traces)?;
        for (flag, count) in &self.counts {
            write!(f, ", {} {}", count, flag.label())?;
        }
        Ok(())
    }
}

/// Rank a fully populated trace collection and summarize flag population
///
/// Runs both percentile passes over traces whose per-site masks and
/// scores were already filled in (see [`analyze_site`] and
/// [`apply_site_analysis`]). The collection must be sorted ascending by
/// `num_chunks`, the same contract as
/// [`calculate_percentiles_chunk`]; the slice order is preserved.
///
/// # Errors
///
/// Fails only when `params` does not validate.
pub fn analyze_traces(traces: &mut [Trace], params: &PatternParams) -> Result<FlagSummary> {
    if let Err(message) = params.validate() {
        return Err(AnalyzeError::InvalidParams(message).into());
    }

    calculate_percentiles_chunk(traces, params);
    calculate_percentiles_size(traces, params);

    let summary = FlagSummary::from_traces(traces);
    tracing::debug!(
        "ranked {} traces: {} in top percentile by chunk count, {} by aggregate size",
        summary.total_traces,
        summary.count(Inefficiency::TOP_PERCENTILE_CHUNKS),
        summary.count(Inefficiency::TOP_PERCENTILE_SIZE),
    );

    Ok(summary)
}
