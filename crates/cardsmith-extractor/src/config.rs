//! Configuration for the Extractor

use crate::chunking::SegmentParams;
use cardsmith_gatekeeper::FilterConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the flashcard pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Target chunk size in words
    pub target_chunk_words: usize,

    /// Fraction of the target size repeated at the start of the next chunk
    pub chunk_overlap_ratio: f64,

    /// Chunks with fewer words are merged into a neighbour
    pub min_segment_words: usize,

    /// Sentences longer than this are cut at word boundaries
    pub max_sentence_words: usize,

    /// Question/answer pairs requested per chunk
    pub questions_per_chunk: usize,

    /// Minimum answer length in words (inclusive)
    pub min_answer_words: usize,

    /// Maximum answer length in words (inclusive)
    pub max_answer_words: usize,

    /// Token budget for the chunk summary
    pub summary_max_tokens: usize,

    /// Token budget per generated question
    pub question_max_tokens: usize,

    /// Token budget per generated answer
    pub answer_max_tokens: usize,

    /// Maximum input text length (characters)
    pub max_text_length: usize,

    /// Maximum time for a single model call (seconds)
    pub generation_timeout_secs: u64,

    /// Pause before the single retry of a failed model call (milliseconds)
    pub retry_backoff_ms: u64,

    /// Chunks generated in parallel; 1 processes them one after another
    pub max_concurrent_chunks: usize,

    /// Ask the model for a summary of each chunk first
    pub generate_summaries: bool,

    /// Question requests per chunk when earlier rounds come up short
    pub max_generation_rounds: usize,

    /// Drop lines that open with an instruction step ("First, click ...")
    pub drop_procedural_lines: bool,
}

impl ExtractorConfig {
    /// Get the generation timeout as a Duration
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    /// Get the retry backoff as a Duration
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Quality filter settings
    pub fn filter_config(&self) -> FilterConfig {
        FilterConfig::new(self.min_answer_words, self.max_answer_words)
    }

    /// Segmenter settings
    pub fn segment_params(&self) -> SegmentParams {
        SegmentParams {
            target_words: self.target_chunk_words,
            overlap_ratio: self.chunk_overlap_ratio,
            min_segment_words: self.min_segment_words,
            max_sentence_words: self.max_sentence_words,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.target_chunk_words == 0 {
            return Err("target_chunk_words must be greater than 0".to_string());
        }
        if !(0.0..1.0).contains(&self.chunk_overlap_ratio) {
            return Err(format!(
                "chunk_overlap_ratio must be in [0, 1), got {}",
                self.chunk_overlap_ratio
            ));
        }
        if self.max_sentence_words == 0 {
            return Err("max_sentence_words must be greater than 0".to_string());
        }
        if self.questions_per_chunk == 0 {
            return Err("questions_per_chunk must be greater than 0".to_string());
        }
        self.filter_config().validate().map_err(|e| e.to_string())?;
        if self.summary_max_tokens == 0 || self.question_max_tokens == 0 || self.answer_max_tokens == 0 {
            return Err("token budgets must be greater than 0".to_string());
        }
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if self.generation_timeout_secs == 0 {
            return Err("generation_timeout_secs must be greater than 0".to_string());
        }
        if self.max_concurrent_chunks == 0 {
            return Err("max_concurrent_chunks must be greater than 0".to_string());
        }
        if self.max_generation_rounds == 0 {
            return Err("max_generation_rounds must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            target_chunk_words: 220,
            chunk_overlap_ratio: 0.2,
            min_segment_words: 10,
            max_sentence_words: 600,
            questions_per_chunk: 3,
            min_answer_words: 3,
            max_answer_words: 100,
            summary_max_tokens: 200,
            question_max_tokens: 128,
            answer_max_tokens: 48,
            max_text_length: 500_000,
            generation_timeout_secs: 120,
            retry_backoff_ms: 500,
            max_concurrent_chunks: 1,
            generate_summaries: true,
            max_generation_rounds: 1,
            drop_procedural_lines: false,
        }
    }
}

impl ExtractorConfig {
    /// Fast preset: no summaries, fewer questions, shorter timeouts
    pub fn fast() -> Self {
        Self {
            questions_per_chunk: 2,
            generation_timeout_secs: 60,
            retry_backoff_ms: 250,
            max_concurrent_chunks: 4,
            generate_summaries: false,
            ..Self::default()
        }
    }

    /// Thorough preset: smaller chunks, more questions, follow-up rounds
    pub fn thorough() -> Self {
        Self {
            target_chunk_words: 160,
            chunk_overlap_ratio: 0.25,
            questions_per_chunk: 5,
            generation_timeout_secs: 300,
            retry_backoff_ms: 1_000,
            max_generation_rounds: 3,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.target_chunk_words, 220);
        assert_eq!(config.chunk_overlap_ratio, 0.2);
        assert_eq!(config.min_answer_words, 3);
        assert_eq!(config.max_answer_words, 100);
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(ExtractorConfig::fast().validate().is_ok());
        assert!(ExtractorConfig::thorough().validate().is_ok());
    }

    #[test]
    fn test_invalid_overlap_ratio() {
        let mut config = ExtractorConfig::default();
        config.chunk_overlap_ratio = 1.0;
        assert!(config.validate().is_err());

        config.chunk_overlap_ratio = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_answer_bounds() {
        let mut config = ExtractorConfig::default();
        config.min_answer_words = 50;
        config.max_answer_words = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_zero_sizes() {
        let mut config = ExtractorConfig::default();
        config.target_chunk_words = 0;
        assert!(config.validate().is_err());

        let mut config = ExtractorConfig::default();
        config.questions_per_chunk = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExtractorConfig::thorough();
        let toml_str = config.to_toml().unwrap();
        let parsed = ExtractorConfig::from_toml(&toml_str).unwrap();

        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed = ExtractorConfig::from_toml("questions_per_chunk = 7\n").unwrap();
        assert_eq!(parsed.questions_per_chunk, 7);
        assert_eq!(parsed.target_chunk_words, 220);
    }
}
