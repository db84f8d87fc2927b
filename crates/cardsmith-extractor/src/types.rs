//! Report types for extraction runs

use cardsmith_gatekeeper::RejectionReason;
use serde::Serialize;
use std::collections::BTreeMap;

/// Outcome of one extraction run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionReport {
    /// Chunks produced by the segmenter
    pub chunks_total: usize,

    /// Chunks whose generation completed
    pub chunks_processed: usize,

    /// Chunks skipped after generation failed
    pub chunks_skipped: usize,

    /// Why each skipped chunk was skipped
    pub diagnostics: Vec<ChunkDiagnostic>,

    /// Items recognized in model responses
    pub candidates_parsed: usize,

    /// Recognized items dropped before the quality filter
    pub candidates_dropped: usize,

    /// Candidates rejected by the quality filter, per reason
    pub rejected: BTreeMap<RejectionReason, usize>,

    /// Flashcards added to the store
    pub accepted: usize,

    /// Candidates the store already held
    pub rejected_duplicate: usize,

    /// Chunk summaries, in chunk order
    pub summaries: Vec<ChunkSummary>,

    /// True when the input normalized to nothing
    pub empty_input: bool,

    /// Metadata about the extraction
    pub metadata: ExtractionMetadata,
}

impl ExtractionReport {
    /// Total candidates rejected by the quality filter
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }

    /// True when no chunk was skipped
    pub fn is_complete(&self) -> bool {
        self.chunks_skipped == 0
    }
}

/// A chunk that was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkDiagnostic {
    /// Chunk index
    pub index: usize,

    /// Error that caused the skip
    pub reason: String,
}

/// Model summary of one chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkSummary {
    /// Chunk index
    pub index: usize,

    /// Summary text
    pub summary: String,
}

/// Metadata about an extraction operation
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionMetadata {
    /// Source identifier, when the input carried one
    pub source_id: Option<String>,

    /// Name of the LLM model used
    pub model_name: String,

    /// Unix timestamp (seconds) when extraction finished
    pub timestamp: u64,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}
