//! Cardsmith Extractor
//!
//! Turns unstructured text into question/answer flashcards.
//!
//! # Architecture
//!
//! ```text
//! RawText → Normalizer → Segmenter → per chunk: CandidateGenerator → Gatekeeper
//!                                                                      ↓
//!                                                                FlashcardStore
//! ```
//!
//! # Key Features
//!
//! - **Normalization**: tags, mojibake, boilerplate and page numbers removed;
//!   idempotent
//! - **Sentence-aligned chunking**: overlapping chunks sized in words, never
//!   splitting a sentence unless it has no boundary at all
//! - **Tolerant parsing**: JSON, fenced JSON, wrapped objects or `Q:`/`A:` lines
//! - **Skip and continue**: a failed chunk is retried once, then skipped and
//!   reported
//! - **Ordered merging**: with parallel generation, results still reach the
//!   store in chunk order
//!
//! # Example Usage
//!
//! ```no_run
//! use cardsmith_domain::RawText;
//! use cardsmith_extractor::{Extractor, ExtractorConfig};
//! use cardsmith_llm::MockProvider;
//! use cardsmith_store::JsonStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = MockProvider::new(r#"[{"question": "What is DNA?", "answer": "The molecule of heredity."}]"#);
//! let store = JsonStore::open("cards.json")?;
//! let extractor = Extractor::new(llm, store, ExtractorConfig::default());
//!
//! let report = extractor
//!     .extract(RawText::new("DNA carries the genetic instructions of living things."))
//!     .await?;
//!
//! println!("Accepted: {}", report.accepted);
//! println!("Duplicates: {}", report.rejected_duplicate);
//! println!("Chunks skipped: {}", report.chunks_skipped);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chunking;
mod config;
mod error;
mod extractor;
mod generator;
mod input;
mod normalizer;
mod parser;
mod prompt;
mod types;

#[cfg(test)]
mod tests;

pub use chunking::{Chunks, SegmentParams, Segmenter};
pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use extractor::Extractor;
pub use generator::{CandidateGenerator, ChunkGeneration};
pub use input::{FileKind, FileTextSource};
pub use normalizer::{normalize, Normalizer};
pub use parser::{parse_candidates, ParseError, ParsedCandidates};
pub use prompt::{summary_prompt, PromptBuilder};
pub use types::{ChunkDiagnostic, ChunkSummary, ExtractionMetadata, ExtractionReport};
