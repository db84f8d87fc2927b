//! Prompts for summary and question generation

/// Questions listed as "already asked" are capped so prompts stay bounded
const MAX_AVOID_LISTED: usize = 20;

/// Build the summary request for one chunk
pub fn summary_prompt(text: &str) -> String {
    format!("{}\n\nText:\n---\n{}\n---\n\nSummary:", SUMMARY_INSTRUCTIONS, text.trim())
}

/// Builds the question/answer request for one chunk
#[derive(Debug, Clone)]
pub struct PromptBuilder<'a> {
    text: &'a str,
    count: usize,
    summary: Option<&'a str>,
    avoid: Vec<&'a str>,
}

impl<'a> PromptBuilder<'a> {
    /// Create a builder asking for `count` pairs about `text`
    pub fn new(text: &'a str, count: usize) -> Self {
        Self {
            text,
            count,
            summary: None,
            avoid: Vec::new(),
        }
    }

    /// Add the chunk summary as context
    pub fn with_summary(mut self, summary: Option<&'a str>) -> Self {
        self.summary = summary.map(str::trim).filter(|s| !s.is_empty());
        self
    }

    /// Questions the model should not repeat
    pub fn with_existing_questions(mut self, questions: impl IntoIterator<Item = &'a str>) -> Self {
        self.avoid = questions.into_iter().collect();
        self
    }

    /// Build the complete prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(&QUESTION_INSTRUCTIONS.replace("{count}", &self.count.to_string()));
        prompt.push_str("\n\n");

        if let Some(summary) = self.summary {
            prompt.push_str("Summary of the text:\n");
            prompt.push_str(summary);
            prompt.push_str("\n\n");
        }

        if !self.avoid.is_empty() {
            prompt.push_str("Do not repeat any of these questions:\n");
            for question in self.avoid.iter().take(MAX_AVOID_LISTED) {
                prompt.push_str("- ");
                prompt.push_str(question);
                prompt.push('\n');
            }
            prompt.push('\n');
        }

        prompt.push_str("Text:\n---\n");
        prompt.push_str(self.text.trim());
        prompt.push_str("\n---\n\n");

        prompt.push_str(OUTPUT_FORMAT_REMINDER);
        prompt
    }
}

const SUMMARY_INSTRUCTIONS: &str =
    "Summarize the following text in two or three sentences. Keep names, numbers and technical terms exactly as written.";

const QUESTION_INSTRUCTIONS: &str = r#"Write exactly {count} distinct flashcards based only on the text below.

Rules:
- Each question must be answerable from the text alone
- Ask about one fact, definition, cause or relationship per question
- Answers are short: one sentence, at most a few dozen words
- Never write placeholder questions such as "Question 1?"
- Never copy the question into the answer"#;

const OUTPUT_FORMAT_REMINDER: &str = r#"Output format (JSON array only, no additional text):
[
  {"question": "...", "answer": "..."}
]"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_includes_text_and_count() {
        let prompt = PromptBuilder::new("Mitochondria produce ATP.", 4).build();
        assert!(prompt.contains("Mitochondria produce ATP."));
        assert!(prompt.contains("exactly 4 distinct"));
        assert!(prompt.contains("\"question\""));
        assert!(!prompt.contains("Summary of the text"));
    }

    #[test]
    fn test_prompt_includes_summary() {
        let prompt = PromptBuilder::new("Text", 2)
            .with_summary(Some("Cells make energy."))
            .build();
        assert!(prompt.contains("Summary of the text:\nCells make energy."));

        let blank = PromptBuilder::new("Text", 2).with_summary(Some("  ")).build();
        assert!(!blank.contains("Summary of the text"));
    }

    #[test]
    fn test_limits_existing_questions() {
        let questions: Vec<String> = (0..30).map(|i| format!("Question about item {}?", i)).collect();
        let prompt = PromptBuilder::new("Text", 3)
            .with_existing_questions(questions.iter().map(String::as_str))
            .build();

        assert!(prompt.contains("Do not repeat"));
        assert!(prompt.contains("item 0?"));
        assert!(prompt.contains("item 19?"));
        assert!(!prompt.contains("item 20?"));
    }

    #[test]
    fn test_summary_prompt() {
        let prompt = summary_prompt("  Enzymes lower activation energy. ");
        assert!(prompt.starts_with("Summarize"));
        assert!(prompt.contains("---\nEnzymes lower activation energy.\n---"));
    }
}
