//! Core Extractor implementation

use crate::chunking::Segmenter;
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::generator::{CandidateGenerator, ChunkGeneration};
use crate::normalizer::Normalizer;
use crate::types::{ChunkDiagnostic, ChunkSummary, ExtractionMetadata, ExtractionReport};
use cardsmith_domain::traits::{FlashcardStore, LlmProvider, SentenceSegmenter, TextSource};
use cardsmith_domain::{Chunk, RawText};
use cardsmith_gatekeeper::Gatekeeper;
use cardsmith_llm::UnicodeSentenceSegmenter;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::Semaphore;
use tokio::task::{self, JoinError, JoinSet};
use tracing::{debug, info, warn};

/// The Extractor turns text into flashcards
///
/// Text is normalized, segmented into chunks, and each chunk is sent to the
/// model. Candidates pass the quality filter and are merged into the store
/// in chunk order, whatever order generation finishes in.
pub struct Extractor<L, S, D = UnicodeSentenceSegmenter>
where
    L: LlmProvider,
    S: FlashcardStore,
{
    generator: CandidateGenerator<L>,
    store: Arc<Mutex<S>>,
    gatekeeper: Gatekeeper,
    segmenter: Segmenter<D>,
    normalizer: Normalizer,
    config: ExtractorConfig,
}

impl<L, S> Extractor<L, S>
where
    L: LlmProvider + Send + Sync + 'static,
    S: FlashcardStore,
    L::Error: Display,
    S::Error: Display,
{
    /// Create a new Extractor using Unicode sentence boundaries
    pub fn new(llm_provider: L, store: S, config: ExtractorConfig) -> Self {
        Self::from_parts(
            Arc::new(llm_provider),
            Arc::new(Mutex::new(store)),
            UnicodeSentenceSegmenter::new(),
            config,
        )
    }
}

impl<L, S, D> Extractor<L, S, D>
where
    L: LlmProvider + Send + Sync + 'static,
    S: FlashcardStore,
    L::Error: Display,
    S::Error: Display,
    D: SentenceSegmenter,
    D::Error: Display,
{
    /// Create an Extractor from shared components
    ///
    /// The provider and store may be shared with other extractors; inserts
    /// are serialized by the store mutex.
    pub fn from_parts(llm_provider: Arc<L>, store: Arc<Mutex<S>>, detector: D, config: ExtractorConfig) -> Self {
        Self {
            generator: CandidateGenerator::new(llm_provider, config.clone()),
            store,
            gatekeeper: Gatekeeper::new(config.filter_config()),
            segmenter: Segmenter::new(detector, config.segment_params()),
            normalizer: Normalizer::new().with_procedural_filter(config.drop_procedural_lines),
            config,
        }
    }

    /// Use a different sentence-boundary detector
    pub fn with_segmenter<D2>(self, detector: D2) -> Extractor<L, S, D2>
    where
        D2: SentenceSegmenter,
        D2::Error: Display,
    {
        Extractor {
            generator: self.generator,
            store: self.store,
            gatekeeper: self.gatekeeper,
            segmenter: Segmenter::new(detector, self.config.segment_params()),
            normalizer: self.normalizer,
            config: self.config,
        }
    }

    /// Use a different quality filter
    pub fn with_gatekeeper(mut self, gatekeeper: Gatekeeper) -> Self {
        self.gatekeeper = gatekeeper;
        self
    }

    /// Shared handle to the store
    pub fn store(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.store)
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Acquire text from `source` and extract flashcards from it
    pub async fn extract_from_source<T>(&self, text_source: &T, source: &str) -> Result<ExtractionReport, ExtractorError>
    where
        T: TextSource + ?Sized,
    {
        let raw = text_source.acquire_text(source)?;
        self.extract(raw).await
    }

    /// Extract flashcards from text
    ///
    /// Chunks whose generation fails are skipped and listed in the report.
    /// Configuration, length and persistence errors abort the run; cards
    /// stored by earlier chunks stay stored.
    pub async fn extract(&self, raw: RawText) -> Result<ExtractionReport, ExtractorError> {
        let started = Instant::now();
        self.config.validate().map_err(ExtractorError::Config)?;

        let length = raw.as_str().chars().count();
        if length > self.config.max_text_length {
            return Err(ExtractorError::TextTooLong(length, self.config.max_text_length));
        }

        let mut report = ExtractionReport {
            metadata: ExtractionMetadata {
                source_id: raw.source_id().map(str::to_string),
                model_name: self.generator.model_name().to_string(),
                ..ExtractionMetadata::default()
            },
            ..ExtractionReport::default()
        };

        info!(
            "Starting extraction for source '{}', text length {}",
            raw.source_id().unwrap_or("-"),
            length
        );

        let normalized = self.normalizer.normalize(&raw);
        if normalized.is_empty() {
            warn!("Input contains no text after normalization");
            report.empty_input = true;
            finish(&mut report, started);
            return Ok(report);
        }
        debug!("Normalized to {} words", normalized.word_count());

        let chunks = self.segmenter.segment(&normalized)?;
        report.chunks_total = chunks.total();
        info!("Split text into {} chunks", report.chunks_total);

        if self.config.max_concurrent_chunks <= 1 {
            for chunk in chunks {
                debug!("Processing chunk {}/{}", chunk.index + 1, report.chunks_total);
                let result = self.generator.generate(&chunk).await;
                self.absorb(chunk.index, result, &mut report)?;
            }
        } else {
            self.extract_concurrently(chunks, &mut report).await?;
        }

        finish(&mut report, started);
        info!(
            "Extraction complete: {} accepted, {} duplicates, {} rejected, {} chunks skipped",
            report.accepted,
            report.rejected_duplicate,
            report.rejected_total(),
            report.chunks_skipped
        );
        Ok(report)
    }

    /// Generate in parallel, merging results in chunk order
    async fn extract_concurrently(
        &self,
        chunks: impl Iterator<Item = Chunk>,
        report: &mut ExtractionReport,
    ) -> Result<(), ExtractorError> {
        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_chunks));
        let mut tasks = JoinSet::new();
        let mut indices = HashMap::new();

        for chunk in chunks {
            let generator = self.generator.clone();
            let permits = Arc::clone(&permits);
            let index = chunk.index;
            let handle = tasks.spawn(async move {
                match permits.acquire_owned().await {
                    Ok(_permit) => generator.generate(&chunk).await,
                    Err(e) => Err(ExtractorError::Llm(format!("Scheduler closed: {}", e))),
                }
            });
            indices.insert(handle.id(), index);
        }

        let mut finished = BTreeMap::new();
        let mut next = 0;
        while let Some(joined) = tasks.join_next_with_id().await {
            let Some((index, result)) = chunk_outcome(joined, &indices) else {
                continue;
            };
            finished.insert(index, result);

            while let Some(result) = finished.remove(&next) {
                // Dropping the JoinSet on error aborts the remaining tasks
                self.absorb(next, result, report)?;
                next += 1;
            }
        }
        Ok(())
    }

    /// Fold one chunk's generation into the report and the store
    fn absorb(
        &self,
        index: usize,
        result: Result<ChunkGeneration, ExtractorError>,
        report: &mut ExtractionReport,
    ) -> Result<(), ExtractorError> {
        let generation = match result {
            Ok(generation) => generation,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Skipping chunk {}: {}", index, e);
                report.chunks_skipped += 1;
                report.diagnostics.push(ChunkDiagnostic {
                    index,
                    reason: e.to_string(),
                });
                return Ok(());
            }
        };

        report.chunks_processed += 1;
        report.candidates_parsed += generation.parsed;
        report.candidates_dropped += generation.dropped;
        if let Some(summary) = generation.summary {
            report.summaries.push(ChunkSummary { index, summary });
        }
        if generation.candidates.is_empty() {
            debug!("Chunk {} produced no usable candidates", index);
            return Ok(());
        }

        let (accepted, rejected) = self.gatekeeper.partition(generation.candidates);
        for (candidate, reason) in &rejected {
            debug!("Rejected ({}): {}", reason, candidate.question);
            *report.rejected.entry(*reason).or_default() += 1;
        }
        if accepted.is_empty() {
            return Ok(());
        }

        // Lock only around the check-and-append
        let outcome = {
            let mut store = self
                .store
                .lock()
                .map_err(|e| ExtractorError::Persistence(format!("Store lock error: {}", e)))?;
            store
                .insert(&accepted)
                .map_err(|e| ExtractorError::Persistence(e.to_string()))?
        };
        debug!(
            "Chunk {}: {} stored, {} duplicates",
            index, outcome.accepted, outcome.rejected_duplicate
        );
        report.accepted += outcome.accepted;
        report.rejected_duplicate += outcome.rejected_duplicate;
        Ok(())
    }
}

type ChunkResult = Result<ChunkGeneration, ExtractorError>;

/// Pair a joined generation task with its chunk index
///
/// A task that panicked or was cancelled becomes a chunk-level error, so the
/// chunk is skipped and merging moves past it.
fn chunk_outcome(
    joined: Result<(task::Id, ChunkResult), JoinError>,
    indices: &HashMap<task::Id, usize>,
) -> Option<(usize, ChunkResult)> {
    match joined {
        Ok((id, result)) => indices.get(&id).map(|&index| (index, result)),
        Err(e) => indices
            .get(&e.id())
            .map(|&index| (index, Err(ExtractorError::Llm(format!("Generation task failed: {}", e))))),
    }
}

fn finish(report: &mut ExtractionReport, started: Instant) {
    report.metadata.processing_time_ms = started.elapsed().as_millis() as u64;
    report.metadata.timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
}
