//! Per-chunk candidate generation

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::parser::{parse_candidates, ParsedCandidates};
use crate::prompt::{summary_prompt, PromptBuilder};
use cardsmith_domain::traits::LlmProvider;
use cardsmith_domain::{Candidate, Chunk};
use std::collections::HashSet;
use std::fmt::Display;
use std::sync::Arc;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Output of generation for one chunk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkGeneration {
    /// Chunk index
    pub index: usize,
    /// Chunk summary, when requested and produced
    pub summary: Option<String>,
    /// Candidates for the quality filter, at most `questions_per_chunk`
    pub candidates: Vec<Candidate>,
    /// Items recognized in model responses
    pub parsed: usize,
    /// Recognized items not forwarded: unusable, repeated, or over the limit
    pub dropped: usize,
}

/// Drives the generative model for one chunk at a time
///
/// Cloning is cheap; clones share the provider.
pub struct CandidateGenerator<L> {
    llm: Arc<L>,
    config: ExtractorConfig,
}

impl<L> Clone for CandidateGenerator<L> {
    fn clone(&self) -> Self {
        Self {
            llm: Arc::clone(&self.llm),
            config: self.config.clone(),
        }
    }
}

impl<L> CandidateGenerator<L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
{
    /// Create a generator over a shared provider
    pub fn new(llm: Arc<L>, config: ExtractorConfig) -> Self {
        Self { llm, config }
    }

    /// Name of the underlying model
    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// Summarize the chunk, then ask for question/answer pairs
    ///
    /// A failed summary only loses the context. A failed first question
    /// round fails the chunk; a failed follow-up round keeps what earlier
    /// rounds produced.
    pub async fn generate(&self, chunk: &Chunk) -> Result<ChunkGeneration, ExtractorError> {
        let wanted = self.config.questions_per_chunk;
        let mut out = ChunkGeneration {
            index: chunk.index,
            summary: self.summarize(chunk).await,
            ..ChunkGeneration::default()
        };
        let mut seen = HashSet::new();

        for round in 0..self.config.max_generation_rounds {
            let missing = wanted.saturating_sub(out.candidates.len());
            if missing == 0 {
                break;
            }

            let prompt = PromptBuilder::new(&chunk.text, missing)
                .with_summary(out.summary.as_deref())
                .with_existing_questions(out.candidates.iter().map(|c| c.question.as_str()))
                .build();
            let budget = missing * (self.config.question_max_tokens + self.config.answer_max_tokens);

            let parsed = match self.request(&prompt, budget, chunk.index).await {
                Ok(parsed) => parsed,
                Err(e) if round > 0 => {
                    warn!("Chunk {}: follow-up round {} failed: {}", chunk.index, round + 1, e);
                    break;
                }
                Err(e) => return Err(e),
            };

            out.parsed += parsed.candidates.len() + parsed.dropped;
            out.dropped += parsed.dropped;

            let before = out.candidates.len();
            for candidate in parsed.candidates {
                if out.candidates.len() < wanted && seen.insert(candidate.key()) {
                    out.candidates.push(candidate);
                } else {
                    out.dropped += 1;
                }
            }

            debug!(
                "Chunk {} round {}: {} new candidates",
                chunk.index,
                round + 1,
                out.candidates.len() - before
            );
            if out.candidates.len() == before {
                break;
            }
        }

        Ok(out)
    }

    async fn summarize(&self, chunk: &Chunk) -> Option<String> {
        if !self.config.generate_summaries {
            return None;
        }
        let prompt = summary_prompt(&chunk.text);
        let result = self
            .with_retry(&prompt, self.config.summary_max_tokens, chunk.index, |response| {
                let summary = response.trim();
                if summary.is_empty() {
                    Err(ExtractorError::MalformedResponse("empty summary".to_string()))
                } else {
                    Ok(summary.to_string())
                }
            })
            .await;

        match result {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!("Chunk {}: continuing without summary: {}", chunk.index, e);
                None
            }
        }
    }

    async fn request(&self, prompt: &str, max_tokens: usize, index: usize) -> Result<ParsedCandidates, ExtractorError> {
        self.with_retry(prompt, max_tokens, index, |response| {
            parse_candidates(&response, index).map_err(|e| ExtractorError::MalformedResponse(e.to_string()))
        })
        .await
    }

    /// Call the model and interpret the response, retrying once after the backoff
    async fn with_retry<T>(
        &self,
        prompt: &str,
        max_tokens: usize,
        index: usize,
        interpret: impl Fn(String) -> Result<T, ExtractorError>,
    ) -> Result<T, ExtractorError> {
        let first = self.call_llm(prompt, max_tokens).await.and_then(&interpret);
        match first {
            Ok(value) => Ok(value),
            Err(e) => {
                let backoff = self.config.retry_backoff();
                warn!("Chunk {}: {}; retrying in {:?}", index, e, backoff);
                sleep(backoff).await;
                self.call_llm(prompt, max_tokens).await.and_then(&interpret)
            }
        }
    }

    /// Call the LLM provider
    async fn call_llm(&self, prompt: &str, max_tokens: usize) -> Result<String, ExtractorError> {
        let llm = Arc::clone(&self.llm);
        let prompt = prompt.to_string();

        // Call in a blocking context since LlmProvider is not async
        let task = tokio::task::spawn_blocking(move || {
            llm.generate(&prompt, max_tokens)
                .map_err(|e| ExtractorError::Llm(e.to_string()))
        });

        timeout(self.config.generation_timeout(), task)
            .await
            .map_err(|_| ExtractorError::Timeout(self.config.generation_timeout_secs))?
            .map_err(|e| ExtractorError::Llm(format!("Task join error: {}", e)))?
    }
}
