//! Pattern library
//!
//! Compiled text-matching rules shared by the normalizer and the quality
//! filter. The set is built once on first use and only ever read afterwards.

use regex::Regex;
use std::sync::LazyLock;

/// Notices longer than this are prose that happens to mention rights
const MAX_NOTICE_WORDS: usize = 12;

/// Name of a rights holder: capitalized words, years and joiners
/// ("Acme Corp.", "John Wiley & Sons, Inc.")
const RIGHTS_HOLDER: &str =
    r"(?-i:(?:[\p{Lu}\d©&]\S*|and|of|the)(?:\s+(?:[\p{Lu}\d©&]\S*|and|of|the))*)";

static PATTERNS: LazyLock<Patterns> = LazyLock::new(Patterns::compile);

/// Access the process-wide pattern set
pub fn patterns() -> &'static Patterns {
    &PATTERNS
}

/// Immutable set of compiled matchers
#[derive(Debug)]
pub struct Patterns {
    html_tag: Regex,
    boilerplate: Regex,
    page_number: Regex,
    procedural: Regex,
    generic_question: Regex,
}

impl Patterns {
    fn compile() -> Self {
        // Literals are fixed at build time; a failure here is a programming error
        let compile = |pattern: &str| Regex::new(pattern).unwrap();
        Self {
            html_tag: compile(r"</?[A-Za-z!][^<>]*>"),
            boilerplate: compile(&format!(
                r"(?i)^\s*(?:(?:copyright|\(c\)|©)\s*(?:©\s*)?(?:\d{{4}}(?:\s*[-–,]\s*\d{{4}})*|by)(?:\s+{holder})?(?:\s*[.,]?\s*all rights reserved)?|(?:{holder}\s*[.,]?\s+)?all rights reserved|privacy policy|cookie policy|terms (?:of|and) (?:use|service|conditions))\s*\.?\s*$",
                holder = RIGHTS_HOLDER
            )),
            page_number: compile(
                r"(?i)^\s*(?:page\s+\d+(?:\s+of\s+\d+)?|\d+|-\s*\d+\s*-|\d+\s*/\s*\d+)\s*$",
            ),
            procedural: compile(r"(?i)^\s*(?:first|next|then|click|select|enter|type)\s*,"),
            generic_question: compile(
                r"(?i)^\s*(?:question\s*\d*\s*[?.:]?|q\s*\d*\s*[?.:]?|your question(?:\s+here)?\s*[?.:]?|<\s*question\s*>|\[\s*question\s*\]|\.{3}|…|\?+)\s*$",
            ),
        }
    }

    /// Remove HTML-like tags, repeating until none remain
    ///
    /// # Examples
    ///
    /// ```
    /// use cardsmith_gatekeeper::patterns;
    ///
    /// assert_eq!(patterns().strip_tags("<p>Cells <b>divide</b>.</p>"), "Cells divide.");
    /// assert_eq!(patterns().strip_tags("a < b > c"), "a < b > c");
    /// ```
    pub fn strip_tags(&self, text: &str) -> String {
        let mut current = text.to_string();
        loop {
            let next = self.html_tag.replace_all(&current, "");
            if next == current {
                return current;
            }
            current = next.into_owned();
        }
    }

    /// True when a whole line is a short legal or navigation notice
    pub fn is_boilerplate(&self, line: &str) -> bool {
        line.split_whitespace().count() <= MAX_NOTICE_WORDS && self.boilerplate.is_match(line)
    }

    /// True when a whole line is a page number or page marker
    pub fn is_page_number(&self, line: &str) -> bool {
        self.page_number.is_match(line)
    }

    /// True when a line opens with an instruction step ("First, click ...")
    pub fn is_procedural(&self, line: &str) -> bool {
        self.procedural.is_match(line)
    }

    /// True when a question is a template placeholder rather than content
    pub fn is_generic_question(&self, question: &str) -> bool {
        self.generic_question.is_match(question)
    }
}
