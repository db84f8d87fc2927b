//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use cardsmith_domain::Flashcard;
use cardsmith_extractor::ExtractionReport;
use cardsmith_store::FlashcardRecord;
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style, Width},
};

/// Column width for question and answer text in tables.
const TEXT_WIDTH: usize = 60;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format flashcards output.
    pub fn format_flashcards(&self, cards: &[Flashcard]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let records: Vec<FlashcardRecord> = cards.iter().map(FlashcardRecord::from).collect();
                Ok(serde_json::to_string_pretty(&records)?)
            }
            OutputFormat::Table => Ok(self.format_flashcards_table(cards)),
            OutputFormat::Quiet => Ok(cards.iter().map(|c| c.id.to_string()).collect::<Vec<_>>().join("\n")),
        }
    }

    fn format_flashcards_table(&self, cards: &[Flashcard]) -> String {
        if cards.is_empty() {
            return self.colorize("No flashcards found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Question", "Answer"]);
        for card in cards {
            let id = card.id.to_string();
            builder.push_record([&id[..8], card.question.as_str(), card.answer.as_str()]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .with(Modify::new(Rows::new(1..)).with(Width::wrap(TEXT_WIDTH)));

        table.to_string()
    }

    /// Format the outcome of a generate run.
    pub fn format_report(&self, report: &ExtractionReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Quiet => Ok(report.accepted.to_string()),
            OutputFormat::Table => Ok(self.format_report_table(report)),
        }
    }

    fn format_report_table(&self, report: &ExtractionReport) -> String {
        if report.empty_input {
            return self.warning("The document contains no text after cleaning.");
        }

        let mut builder = Builder::default();
        builder.push_record(["Stage", "Count"]);
        let rows = [
            ("Chunks", report.chunks_total),
            ("Chunks skipped", report.chunks_skipped),
            ("Pairs parsed", report.candidates_parsed),
            ("Pairs dropped", report.candidates_dropped),
            ("Rejected by filter", report.rejected_total()),
            ("Duplicates", report.rejected_duplicate),
            ("Flashcards added", report.accepted),
        ];
        for (stage, count) in rows {
            builder.push_record([stage.to_string(), count.to_string()]);
        }
        for (reason, count) in &report.rejected {
            builder.push_record([format!("  {}", reason), count.to_string()]);
        }

        let mut table = builder.build();
        table.with(Style::rounded());

        let mut out = table.to_string();
        for diagnostic in &report.diagnostics {
            out.push('\n');
            out.push_str(&self.warning(&format!("Chunk {} skipped: {}", diagnostic.index, diagnostic.reason)));
        }
        out.push('\n');
        out.push_str(&self.success(&format!(
            "Added {} flashcard(s) in {} ms",
            report.accepted, report.metadata.processing_time_ms
        )));
        out
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// True unless the quiet format was requested.
    pub fn is_verbose(&self) -> bool {
        self.format != OutputFormat::Quiet
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}
