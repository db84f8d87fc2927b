//! Chunk module - the unit of work handed to the generative model

/// A bounded, sentence-aligned slice of normalized text
///
/// Offsets are byte offsets into the normalized text the chunk was cut from,
/// and `text` is exactly the slice `[start_offset, end_offset)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Chunk text
    pub text: String,

    /// Position in the chunk sequence, starting at 0
    pub index: usize,

    /// Inclusive start byte offset
    pub start_offset: usize,

    /// Exclusive end byte offset (always greater than `start_offset`)
    pub end_offset: usize,
}

impl Chunk {
    /// Number of whitespace-separated words in the chunk
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Length of the covered span in bytes
    pub fn len(&self) -> usize {
        self.end_offset - self.start_offset
    }

    /// Chunks are never empty; provided for clippy's `len_without_is_empty`
    pub fn is_empty(&self) -> bool {
        self.end_offset <= self.start_offset
    }

    /// True when this chunk's span overlaps the other's
    pub fn overlaps(&self, other: &Chunk) -> bool {
        self.start_offset < other.end_offset && other.start_offset < self.end_offset
    }
}
