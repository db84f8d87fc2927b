//! Cardsmith Model Layer
//!
//! Model access for the flashcard pipeline: a process-wide registry of
//! heavyweight model handles, pluggable generative providers and the
//! sentence-boundary detector used by the segmenter.
//!
//! # Architecture
//!
//! This crate provides implementations of the `LlmProvider` and
//! `SentenceSegmenter` traits from `cardsmith-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OllamaProvider`: Local Ollama API integration
//! - `UnicodeSentenceSegmenter`: UAX #29 sentence boundaries
//!
//! # Examples
//!
//! ```
//! use cardsmith_llm::{MockProvider, ModelKey, ModelRegistry};
//! use cardsmith_domain::traits::LlmProvider;
//!
//! let registry = ModelRegistry::new();
//! let provider = registry
//!     .acquire(&ModelKey::generator("mock"), || {
//!         Ok::<_, std::convert::Infallible>(MockProvider::new("Hello from LLM!"))
//!     })
//!     .unwrap();
//! assert_eq!(provider.generate("test prompt", 16).unwrap(), "Hello from LLM!");
//! ```

#![warn(missing_docs)]

pub mod ollama;
pub mod registry;
pub mod sentence;

use cardsmith_domain::traits::LlmProvider as LlmProviderTrait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

pub use ollama::OllamaProvider;
pub use registry::{ModelKey, ModelKind, ModelRegistry, RegistryError};
pub use sentence::UnicodeSentenceSegmenter;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit or resource exhaustion
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Mock LLM provider for deterministic testing
///
/// This provider returns pre-configured responses without making any network
/// calls. Responses are resolved in this order: injected failures, scripted
/// responses whose pattern occurs in the prompt, queued responses, and
/// finally the default response.
///
/// # Examples
///
/// ```
/// use cardsmith_llm::MockProvider;
/// use cardsmith_domain::traits::LlmProvider;
///
/// // Simple fixed response
/// let provider = MockProvider::new("Fixed response");
/// assert_eq!(provider.generate("any prompt", 32).unwrap(), "Fixed response");
///
/// // Responses keyed by prompt content
/// let mut provider = MockProvider::default();
/// provider.add_response("Summarize", "A summary.");
/// provider.add_response("flashcards", "[]");
/// assert_eq!(provider.generate("Summarize this", 32).unwrap(), "A summary.");
/// assert_eq!(provider.generate("Write flashcards", 32).unwrap(), "[]");
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    scripted: Vec<(String, String)>,
    queued: VecDeque<String>,
    failures_remaining: usize,
    prompts: Vec<(String, usize)>,
}

const ERROR_SENTINEL: &str = "ERROR";

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Respond with `response` whenever the prompt contains `pattern`
    pub fn add_response(&mut self, pattern: impl Into<String>, response: impl Into<String>) {
        self.state().scripted.push((pattern.into(), response.into()));
    }

    /// Configure to return an error whenever the prompt contains `pattern`
    pub fn add_error(&mut self, pattern: impl Into<String>) {
        self.state()
            .scripted
            .push((pattern.into(), ERROR_SENTINEL.to_string()));
    }

    /// Queue a one-shot response, consumed in FIFO order
    pub fn push_response(&self, response: impl Into<String>) {
        self.state().queued.push_back(response.into());
    }

    /// Fail the next `count` calls regardless of prompt
    pub fn fail_next(&self, count: usize) {
        self.state().failures_remaining = count;
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.state().prompts.len()
    }

    /// Prompts received so far, with their token budgets
    pub fn prompts(&self) -> Vec<(String, usize)> {
        self.state().prompts.clone()
    }

    /// Reset the call history
    pub fn reset_call_count(&self) {
        self.state().prompts.clear();
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String, Self::Error> {
        let mut state = self.state();
        state.prompts.push((prompt.to_string(), max_tokens));

        if state.failures_remaining > 0 {
            state.failures_remaining -= 1;
            return Err(LlmError::Communication("Mock transient failure".to_string()));
        }

        let scripted = state
            .scripted
            .iter()
            .find(|(pattern, _)| prompt.contains(pattern.as_str()))
            .map(|(_, response)| response.clone());
        if let Some(response) = scripted {
            if response == ERROR_SENTINEL {
                return Err(LlmError::Other("Mock error".to_string()));
            }
            return Ok(response);
        }

        if let Some(response) = state.queued.pop_front() {
            return Ok(response);
        }

        Ok(self.default_response.clone())
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
