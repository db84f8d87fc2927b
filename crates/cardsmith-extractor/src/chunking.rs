//! Sentence-aligned chunking with overlap
//!
//! Normalized text is cut into chunks of whole sentences sized for one model
//! call. Consecutive chunks share roughly `overlap_ratio * target_words`
//! words so that facts straddling a boundary are seen in full at least once.

use crate::error::ExtractorError;
use cardsmith_domain::traits::SentenceSegmenter;
use cardsmith_domain::{Chunk, NormalizedText};
use std::sync::Arc;
use tracing::debug;

/// Sizing parameters for the segmenter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentParams {
    /// Target chunk size in words
    pub target_words: usize,
    /// Fraction of the target repeated at the start of the next chunk, in `[0, 1)`
    pub overlap_ratio: f64,
    /// Chunks below this many words are merged into a neighbour
    pub min_segment_words: usize,
    /// Sentences above this many words are cut at word boundaries
    pub max_sentence_words: usize,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            target_words: 220,
            overlap_ratio: 0.2,
            min_segment_words: 10,
            max_sentence_words: 600,
        }
    }
}

/// Splits normalized text into overlapping chunks
#[derive(Debug, Clone)]
pub struct Segmenter<D> {
    detector: D,
    params: SegmentParams,
}

impl<D> Segmenter<D>
where
    D: SentenceSegmenter,
    D::Error: std::fmt::Display,
{
    /// Create a segmenter over a sentence-boundary detector
    pub fn new(detector: D, params: SegmentParams) -> Self {
        Self { detector, params }
    }

    /// Active parameters
    pub fn params(&self) -> &SegmentParams {
        &self.params
    }

    /// Plan the chunks of `text`
    ///
    /// The returned iterator is lazy and can be cloned to replay the same
    /// sequence; calling `segment` again on the same input yields an
    /// identical sequence. Empty text yields no chunks.
    ///
    /// A sentence longer than the target becomes its own oversized chunk.
    /// Only a sentence longer than `max_sentence_words` is cut, at word
    /// boundaries, because the detector found no boundary inside it.
    pub fn segment<'a>(&self, text: &'a NormalizedText) -> Result<Chunks<'a>, ExtractorError> {
        let text = text.as_str();
        if text.trim().is_empty() {
            return Ok(Chunks::new(text, Vec::new()));
        }

        let spans = self
            .detector
            .segment_sentences(text)
            .map_err(|e| ExtractorError::Segmentation(e.to_string()))?;

        let sentences = self.split_long(text, merge_empty(text, covering_spans(text, &spans)));
        let words: Vec<usize> = sentences.iter().map(|&(s, e)| word_count(&text[s..e])).collect();

        let groups = merge_small(plan_groups(&words, &self.params), &words, self.params.min_segment_words);
        let ranges = groups
            .into_iter()
            .map(|(first, last)| (sentences[first].0, sentences[last - 1].1))
            .collect::<Vec<_>>();

        debug!("Planned {} chunks from {} sentences", ranges.len(), sentences.len());
        Ok(Chunks::new(text, ranges))
    }

    fn split_long(&self, text: &str, sentences: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
        let limit = self.params.max_sentence_words.max(1);
        let mut out = Vec::with_capacity(sentences.len());
        for (start, end) in sentences {
            let starts = word_starts(&text[start..end]);
            if starts.len() <= limit {
                out.push((start, end));
                continue;
            }
            debug!("Hard cut of a {}-word sentence at {} words", starts.len(), limit);
            let mut piece_start = start;
            for cut in starts.iter().skip(limit).step_by(limit) {
                out.push((piece_start, start + cut));
                piece_start = start + cut;
            }
            out.push((piece_start, end));
        }
        out
    }
}

/// Lazy, replayable sequence of chunks
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    ranges: Arc<[(usize, usize)]>,
    next: usize,
}

impl<'a> Chunks<'a> {
    fn new(text: &'a str, ranges: Vec<(usize, usize)>) -> Self {
        Self {
            text,
            ranges: ranges.into(),
            next: 0,
        }
    }

    /// Total number of chunks, including those already yielded
    pub fn total(&self) -> usize {
        self.ranges.len()
    }
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let &(start, end) = self.ranges.get(self.next)?;
        let chunk = Chunk {
            text: self.text[start..end].to_string(),
            index: self.next,
            start_offset: start,
            end_offset: end,
        };
        self.next += 1;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.ranges.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Chunks<'_> {}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Byte offsets at which words begin
fn word_starts(text: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut in_word = false;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            in_word = false;
        } else if !in_word {
            starts.push(i);
            in_word = true;
        }
    }
    starts
}

/// Turn detector output into contiguous spans covering the whole text
///
/// Only boundaries that fall on character boundaries inside the text are
/// kept, so gaps, overlaps and out-of-range offsets cannot leak through.
fn covering_spans(text: &str, spans: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let len = text.len();
    let mut cuts: Vec<usize> = spans
        .iter()
        .flat_map(|&(s, e)| [s, e])
        .filter(|&b| b > 0 && b < len && text.is_char_boundary(b))
        .collect();
    cuts.push(0);
    cuts.push(len);
    cuts.sort_unstable();
    cuts.dedup();
    cuts.windows(2).map(|w| (w[0], w[1])).collect()
}

/// Fold spans without any words into a neighbour
fn merge_empty(text: &str, spans: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    let mut out: Vec<(usize, usize)> = Vec::with_capacity(spans.len());
    let mut pending_start: Option<usize> = None;
    for (start, end) in spans {
        if word_count(&text[start..end]) == 0 {
            match out.last_mut() {
                Some(last) => last.1 = end,
                None => {
                    pending_start.get_or_insert(start);
                }
            }
            continue;
        }
        out.push((pending_start.take().unwrap_or(start), end));
    }
    out
}

/// Greedy sentence grouping with overlap
///
/// Returns half-open sentence index ranges.
fn plan_groups(words: &[usize], params: &SegmentParams) -> Vec<(usize, usize)> {
    let n = words.len();
    let target = params.target_words.max(1);
    let overlap_words = (params.overlap_ratio * target as f64).floor() as usize;

    let mut groups = Vec::new();
    let mut i = 0;
    while i < n {
        let mut j = i;
        let mut total = 0;
        // The first sentence is always taken so oversized sentences still progress
        while j < n && (j == i || total + words[j] <= target) {
            total += words[j];
            j += 1;
        }
        groups.push((i, j));
        if j >= n {
            break;
        }

        let mut k = j;
        let mut back = 0;
        while k > i + 1 && back < overlap_words {
            k -= 1;
            back += words[k];
        }
        // The next group must reach past `j`; give up overlap if sentence j won't fit
        while k < j && back + words[j] > target {
            back -= words[k];
            k += 1;
        }
        i = k;
    }
    groups
}

/// Merge groups below `min_words` into the previous group, or the next one
/// when the first group is too small
fn merge_small(groups: Vec<(usize, usize)>, words: &[usize], min_words: usize) -> Vec<(usize, usize)> {
    let count = |(a, b): (usize, usize)| words[a..b].iter().sum::<usize>();

    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(groups.len());
    for group in groups {
        if count(group) < min_words {
            if let Some(last) = merged.last_mut() {
                last.1 = last.1.max(group.1);
                continue;
            }
        }
        merged.push(group);
    }

    if merged.len() > 1 && count(merged[0]) < min_words {
        let first = merged.remove(0);
        merged[0].0 = first.0;
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardsmith_llm::UnicodeSentenceSegmenter;

    fn segmenter(target: usize, overlap: f64, min: usize) -> Segmenter<UnicodeSentenceSegmenter> {
        Segmenter::new(
            UnicodeSentenceSegmenter::new(),
            SegmentParams {
                target_words: target,
                overlap_ratio: overlap,
                min_segment_words: min,
                max_sentence_words: 600,
            },
        )
    }

    /// `count` sentences of `len` words each, numbered so they are distinct
    ///
    /// Words are capitalized: a lowercase word after ". " does not start a
    /// new sentence under UAX #29.
    fn sentences(count: usize, len: usize) -> String {
        (0..count)
            .map(|i| {
                let mut words: Vec<String> = (1..len).map(|w| format!("W{}x{}", i, w)).collect();
                words.push(format!("end{}.", i));
                words.join(" ")
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_three_paragraphs_make_two_overlapping_chunks() {
        // Three paragraphs of 100 words each, ten-word sentences
        let text = [sentences(10, 10), sentences(10, 10), sentences(10, 10)].join("\n\n");
        let normalized = NormalizedText::from_normalized(text);

        let chunks: Vec<Chunk> = segmenter(220, 0.2, 10).segment(&normalized).unwrap().collect();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[1].index, 1);
        assert!(chunks[1].start_offset < chunks[0].end_offset);
        assert_eq!(chunks[0].word_count(), 220);
        assert_eq!(chunks[1].end_offset, normalized.as_str().len());
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        let normalized = NormalizedText::from_normalized(String::new());
        let mut chunks = segmenter(220, 0.2, 10).segment(&normalized).unwrap();
        assert_eq!(chunks.total(), 0);
        assert!(chunks.next().is_none());
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let normalized = NormalizedText::from_normalized("Only a few words here.".to_string());
        let chunks: Vec<Chunk> = segmenter(220, 0.2, 10).segment(&normalized).unwrap().collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Only a few words here.");
    }

    #[test]
    fn test_oversized_sentence_is_kept_whole() {
        let long = sentences(1, 50);
        let text = format!("{} {}", long, sentences(3, 5));
        let normalized = NormalizedText::from_normalized(text);

        let chunks: Vec<Chunk> = segmenter(20, 0.0, 1).segment(&normalized).unwrap().collect();

        assert!(chunks[0].text.starts_with(&long));
        assert!(chunks[0].word_count() >= 50);
        assert_eq!(chunks.last().map(|c| c.end_offset), Some(normalized.as_str().len()));
    }

    #[test]
    fn test_hard_cut_without_sentence_boundary() {
        let words: Vec<String> = (0..25).map(|i| format!("w{}", i)).collect();
        let normalized = NormalizedText::from_normalized(words.join(" "));
        let seg = Segmenter::new(
            UnicodeSentenceSegmenter::new(),
            SegmentParams {
                target_words: 10,
                overlap_ratio: 0.0,
                min_segment_words: 1,
                max_sentence_words: 10,
            },
        );

        let chunks: Vec<Chunk> = seg.segment(&normalized).unwrap().collect();

        let counts: Vec<usize> = chunks.iter().map(|c| c.word_count()).collect();
        assert_eq!(counts, vec![10, 10, 5]);
        assert!(chunks[1].text.starts_with("w10 "));
    }

    #[test]
    fn test_small_tail_merges_backward() {
        // 22 words then a 3-word tail
        let text = format!("{} Tiny tail here.", sentences(2, 11));
        let normalized = NormalizedText::from_normalized(text);

        let chunks: Vec<Chunk> = segmenter(22, 0.0, 5).segment(&normalized).unwrap().collect();

        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].text.ends_with("Tiny tail here."));
    }

    #[test]
    fn test_small_head_merges_forward() {
        let words = vec![2, 30, 30];
        let groups = merge_small(vec![(0, 1), (1, 2), (2, 3)], &words, 5);
        assert_eq!(groups, vec![(0, 2), (2, 3)]);
    }

    #[test]
    fn test_plan_groups_always_progresses() {
        let words = vec![5, 300, 5, 5, 300, 5];
        let params = SegmentParams {
            target_words: 20,
            overlap_ratio: 0.5,
            min_segment_words: 1,
            max_sentence_words: 600,
        };
        let groups = plan_groups(&words, &params);
        for pair in groups.windows(2) {
            assert!(pair[1].0 > pair[0].0);
            assert!(pair[1].1 > pair[0].1);
        }
        assert_eq!(groups.last().map(|g| g.1), Some(words.len()));
    }

    #[test]
    fn test_covering_spans_repairs_detector_output() {
        let text = "abc def ghi";
        // Gap between 3 and 4, overlap at 6..8 and an out-of-range end
        let spans = covering_spans(text, &[(0, 3), (4, 8), (6, 40)]);
        assert_eq!(spans.first().map(|s| s.0), Some(0));
        assert_eq!(spans.last().map(|s| s.1), Some(text.len()));
        for pair in spans.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
    }

    #[test]
    fn test_chunks_replay() {
        let normalized = NormalizedText::from_normalized(sentences(40, 8));
        let chunks = segmenter(50, 0.2, 5).segment(&normalized).unwrap();
        let first: Vec<Chunk> = chunks.clone().collect();
        let second: Vec<Chunk> = chunks.collect();
        assert_eq!(first, second);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use cardsmith_llm::UnicodeSentenceSegmenter;
    use proptest::prelude::*;

    fn text_strategy() -> impl Strategy<Value = String> {
        proptest::collection::vec("[A-Z][a-z]{0,7}( [a-z]{1,8}){0,30}[.!?]", 0..40)
            .prop_map(|sentences| sentences.join(" "))
    }

    fn params_strategy() -> impl Strategy<Value = SegmentParams> {
        (1usize..80, 0.0f64..0.9, 0usize..15, 1usize..60).prop_map(|(t, r, m, s)| SegmentParams {
            target_words: t,
            overlap_ratio: r,
            min_segment_words: m,
            max_sentence_words: s,
        })
    }

    proptest! {
        /// Property: chunks cover every byte of the input without gaps
        #[test]
        fn test_segmentation_coverage(text in text_strategy(), params in params_strategy()) {
            let normalized = NormalizedText::from_normalized(text.clone());
            let chunks: Vec<Chunk> = Segmenter::new(UnicodeSentenceSegmenter::new(), params)
                .segment(&normalized)
                .unwrap()
                .collect();

            if text.trim().is_empty() {
                prop_assert!(chunks.is_empty());
            } else {
                prop_assert_eq!(chunks[0].start_offset, 0);
                prop_assert_eq!(chunks[chunks.len() - 1].end_offset, text.len());
                for pair in chunks.windows(2) {
                    prop_assert!(pair[1].start_offset <= pair[0].end_offset);
                    prop_assert!(pair[1].start_offset > pair[0].start_offset);
                    prop_assert!(pair[1].end_offset > pair[0].end_offset);
                }
                for (i, chunk) in chunks.iter().enumerate() {
                    prop_assert_eq!(chunk.index, i);
                    prop_assert!(chunk.end_offset > chunk.start_offset);
                    prop_assert_eq!(&chunk.text, &text[chunk.start_offset..chunk.end_offset]);
                }
            }
        }

        /// Property: same input and parameters give the same chunks
        #[test]
        fn test_segmentation_determinism(text in text_strategy(), params in params_strategy()) {
            let normalized = NormalizedText::from_normalized(text);
            let segmenter = Segmenter::new(UnicodeSentenceSegmenter::new(), params);
            let first: Vec<Chunk> = segmenter.segment(&normalized).unwrap().collect();
            let second: Vec<Chunk> = segmenter.segment(&normalized).unwrap().collect();
            prop_assert_eq!(first, second);
        }
    }
}
