//! Text normalization
//!
//! Turns raw extracted text into the canonical form the segmenter expects:
//! tags removed, encoding damage repaired, boilerplate and page markers
//! dropped, one space between words, one blank line between paragraphs.

use cardsmith_domain::{NormalizedText, RawText};
use cardsmith_gatekeeper::patterns;
use unicode_normalization::UnicodeNormalization;

/// UTF-8 text that was decoded as Windows-1252 somewhere upstream
const MOJIBAKE: &[(&str, &str)] = &[
    ("â€™", "'"),
    ("â€˜", "'"),
    ("â€œ", "\""),
    ("â€\u{9d}", "\""),
    ("â€“", "-"),
    ("â€”", "-"),
    ("â€¦", "..."),
    ("â€¢", "•"),
    ("Ã©", "é"),
    ("Ã¨", "è"),
    ("Ãª", "ê"),
    ("Ã¡", "á"),
    ("Ã\u{a0}", "à"),
    ("Ã¢", "â"),
    ("Ã§", "ç"),
    ("Ã¶", "ö"),
    ("Ã¼", "ü"),
    ("Ã¤", "ä"),
    ("Ã±", "ñ"),
    ("Ã³", "ó"),
    ("Ã\u{ad}", "í"),
    ("Ãº", "ú"),
];

const SMART_QUOTES: &[(char, char)] = &[
    ('\u{2018}', '\''),
    ('\u{2019}', '\''),
    ('\u{201a}', '\''),
    ('\u{201b}', '\''),
    ('\u{201c}', '"'),
    ('\u{201d}', '"'),
    ('\u{201e}', '"'),
    ('\u{201f}', '"'),
];

/// Cleaning passes stop after this many rounds even if text is still changing
const MAX_ROUNDS: usize = 8;

/// Deterministic text cleaner
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    drop_procedural: bool,
}

impl Normalizer {
    /// Create a normalizer with default rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Also drop lines that open with an instruction step
    pub fn with_procedural_filter(mut self, enabled: bool) -> Self {
        self.drop_procedural = enabled;
        self
    }

    /// Normalize raw text
    ///
    /// The result is a fixed point: normalizing it again returns it unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use cardsmith_domain::RawText;
    /// use cardsmith_extractor::Normalizer;
    ///
    /// let raw = RawText::new("<p>Cells   divide.</p>\nPage 4\n\n\n\nDNA  replicates first.");
    /// let normalized = Normalizer::new().normalize(&raw);
    /// assert_eq!(normalized.as_str(), "Cells divide.\n\nDNA replicates first.");
    /// ```
    pub fn normalize(&self, raw: &RawText) -> NormalizedText {
        // Each step can expose work for an earlier one (a compatibility form
        // that becomes a tag, a dropped line that joins a tag), so run whole
        // passes until the text stops changing.
        let mut current = self.pass(raw.as_str());
        for _ in 1..MAX_ROUNDS {
            let next = self.pass(&current);
            if next == current {
                break;
            }
            current = next;
        }
        NormalizedText::from_normalized(current)
    }

    fn pass(&self, text: &str) -> String {
        let stripped = patterns().strip_tags(text);
        let repaired = repair_characters(&stripped);
        self.clean_layout(&repaired)
    }

    fn is_noise(&self, line: &str) -> bool {
        let p = patterns();
        p.is_boilerplate(line) || p.is_page_number(line) || (self.drop_procedural && p.is_procedural(line))
    }

    fn clean_layout(&self, text: &str) -> String {
        let mut paragraphs: Vec<String> = Vec::new();
        let mut current: Vec<String> = Vec::new();

        for line in text.lines() {
            let line = collapse_whitespace(line);
            if line.is_empty() {
                self.close_paragraph(&mut current, &mut paragraphs);
                continue;
            }
            if self.is_noise(&line) {
                continue;
            }
            current.push(line);
        }
        self.close_paragraph(&mut current, &mut paragraphs);

        paragraphs.join("\n\n")
    }

    fn close_paragraph(&self, current: &mut Vec<String>, paragraphs: &mut Vec<String>) {
        if current.is_empty() {
            return;
        }
        let paragraph = current.join(" ");
        current.clear();
        // A notice broken over several lines only matches once joined. The
        // patterns accept short standalone notices, so a paragraph that
        // merely mentions rights is kept.
        if !self.is_noise(&paragraph) {
            paragraphs.push(paragraph);
        }
    }
}

/// Normalize with default rules
pub fn normalize(raw: &RawText) -> NormalizedText {
    Normalizer::new().normalize(raw)
}

fn collapse_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn repair_characters(text: &str) -> String {
    let mut fixed = text.replace('\u{feff}', "");
    for (broken, replacement) in MOJIBAKE {
        if fixed.contains(broken) {
            fixed = fixed.replace(broken, replacement);
        }
    }

    fixed
        .chars()
        .map(|c| {
            SMART_QUOTES
                .iter()
                .find(|(smart, _)| *smart == c)
                .map_or(c, |(_, plain)| *plain)
        })
        .nfkc()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(text: &str) -> String {
        normalize(&RawText::new(text)).as_str().to_string()
    }

    #[test]
    fn test_collapses_whitespace_and_paragraphs() {
        assert_eq!(
            norm("  The   cell\tcycle  \n has phases.\n\n\n\nMitosis   follows.  "),
            "The cell cycle has phases.\n\nMitosis follows."
        );
    }

    #[test]
    fn test_strips_tags() {
        assert_eq!(norm("<h1>Photosynthesis</h1><p>Light <em>drives</em> it.</p>"), "PhotosynthesisLight drives it.");
    }

    #[test]
    fn test_repairs_mojibake_and_quotes() {
        assert_eq!(norm("Itâ€™s a cafÃ© â€œdemoâ€\u{9d}"), "It's a café \"demo\"");
        assert_eq!(norm("\u{201c}Quoted\u{201d} and \u{2018}single\u{2019}"), "\"Quoted\" and 'single'");
    }

    #[test]
    fn test_compatibility_forms() {
        assert_eq!(norm("ﬁnal ｆｕｌｌ"), "final full");
    }

    #[test]
    fn test_drops_boilerplate_and_page_numbers() {
        let raw = "Enzymes speed up reactions.\nPage 12\n\nCopyright 2020 Example Press\n\n42\n\nThey are proteins.";
        assert_eq!(norm(raw), "Enzymes speed up reactions.\n\nThey are proteins.");
    }

    #[test]
    fn test_boilerplate_split_across_lines() {
        assert_eq!(norm("Real content here.\n\nCopyright\n2020 Acme"), "Real content here.");
    }

    #[test]
    fn test_prose_about_rights_is_kept() {
        let raw = "Enzymes speed up reactions.\n\nPowers not delegated to the union, all rights reserved to the states\nremain with the people, and courts have read this clause narrowly.";
        assert_eq!(
            norm(raw),
            "Enzymes speed up reactions.\n\nPowers not delegated to the union, all rights reserved to the states remain with the people, and courts have read this clause narrowly."
        );

        let act = "Copyright 1976 Act reformed United States law on authorship and fair use.";
        assert_eq!(norm(act), act);
    }

    #[test]
    fn test_notice_inside_paragraph_keeps_neighbours() {
        let raw = "Acme Press. All rights reserved.\nThe mitochondrion is the site of aerobic respiration.";
        assert_eq!(
            norm(raw),
            "The mitochondrion is the site of aerobic respiration."
        );
    }

    #[test]
    fn test_keeps_case() {
        assert_eq!(norm("DNA and RNA"), "DNA and RNA");
    }

    #[test]
    fn test_procedural_filter_is_opt_in() {
        let raw = RawText::new("First, open the lid.\nThe lid is red.");
        assert_eq!(Normalizer::new().normalize(&raw).as_str(), "First, open the lid. The lid is red.");
        assert_eq!(
            Normalizer::new().with_procedural_filter(true).normalize(&raw).as_str(),
            "The lid is red."
        );
    }

    #[test]
    fn test_empty_and_noise_only_input() {
        assert!(normalize(&RawText::new("")).is_empty());
        assert!(normalize(&RawText::new("  \n\n Page 3 \n 7 \n")).is_empty());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: normalization is idempotent
        #[test]
        fn test_normalize_idempotent(s in "\\PC{0,200}") {
            let once = normalize(&RawText::new(s));
            let twice = normalize(&RawText::new(once.as_str()));
            prop_assert_eq!(once.as_str(), twice.as_str());
        }

        /// Property: idempotent on text shaped like extracted documents
        #[test]
        fn test_normalize_idempotent_documents(
            lines in proptest::collection::vec("(<b>)?[A-Za-z ]{0,20}(â€™|Ã©|\u{2019})?[a-z ]{0,10}(</b>)?|Page [0-9]{1,3}|[0-9]{1,3}|", 0..12)
        ) {
            let raw = lines.join("\n");
            let once = normalize(&RawText::new(raw));
            let twice = normalize(&RawText::new(once.as_str()));
            prop_assert_eq!(once.as_str(), twice.as_str());
        }

        /// Property: no line of the output is boilerplate or a page marker
        #[test]
        fn test_output_has_no_noise_lines(s in "[A-Za-z0-9 \n]{0,200}") {
            let normalized = normalize(&RawText::new(s));
            for line in normalized.as_str().lines().filter(|l| !l.is_empty()) {
                prop_assert!(!patterns().is_page_number(line));
                prop_assert!(!patterns().is_boilerplate(line));
            }
        }
    }
}
