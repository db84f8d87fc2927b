//! Cardsmith Domain Layer
//!
//! This crate contains the core value types and trait seams of the flashcard
//! pipeline. It performs no I/O and defines the fundamental concepts that all
//! other crates depend upon.
//!
//! ## Key Concepts
//!
//! - **RawText / NormalizedText**: input text before and after cleaning
//! - **Chunk**: a bounded, sentence-aligned slice of normalized text
//! - **Candidate**: an unvalidated question/answer pair proposed by a model
//! - **Flashcard**: a validated, deduplicated, persisted question/answer record
//!
//! ## Architecture
//!
//! - Pure value types only
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod flashcard;
pub mod input;
pub mod text;
pub mod traits;

// Re-exports for convenience
pub use chunk::Chunk;
pub use flashcard::{question_key, Candidate, Flashcard, FlashcardId};
pub use input::{InputError, InputErrorKind};
pub use text::{NormalizedText, RawText};
pub use traits::InsertOutcome;
