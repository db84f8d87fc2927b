//! Sentence-boundary detection using Unicode UAX #29 rules

use cardsmith_domain::traits::SentenceSegmenter;
use std::convert::Infallible;
use unicode_segmentation::UnicodeSegmentation;

/// Rule-based sentence segmenter
///
/// Spans returned cover the full input, trailing whitespace included, so
/// concatenating them reproduces the text exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeSentenceSegmenter;

impl UnicodeSentenceSegmenter {
    /// Create a new segmenter
    pub fn new() -> Self {
        Self
    }
}

impl SentenceSegmenter for UnicodeSentenceSegmenter {
    type Error = Infallible;

    fn segment_sentences(&self, text: &str) -> Result<Vec<(usize, usize)>, Self::Error> {
        Ok(text
            .split_sentence_bound_indices()
            .map(|(start, sentence)| (start, start + sentence.len()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(text: &str) -> Vec<(usize, usize)> {
        UnicodeSentenceSegmenter::new().segment_sentences(text).unwrap()
    }

    #[test]
    fn test_splits_simple_sentences() {
        let text = "Cells divide. DNA replicates first! Why? Energy.";
        let spans = spans(text);
        let sentences: Vec<&str> = spans.iter().map(|&(s, e)| &text[s..e]).collect();
        assert_eq!(sentences, vec!["Cells divide. ", "DNA replicates first! ", "Why? ", "Energy."]);
    }

    #[test]
    fn test_spans_cover_input() {
        let text = "Première phrase. Deuxième phrase…\n\nTroisième ligne sans point";
        let spans = spans(text);
        assert_eq!(spans.first().map(|s| s.0), Some(0));
        assert_eq!(spans.last().map(|s| s.1), Some(text.len()));
        for pair in spans.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
    }

    #[test]
    fn test_empty_text() {
        assert!(spans("").is_empty());
    }
}
