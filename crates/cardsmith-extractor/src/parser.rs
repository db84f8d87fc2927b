//! Parse model output into flashcard candidates
//!
//! Models rarely return exactly the requested shape. The parser accepts, in
//! order of preference:
//!
//! 1. a JSON array of `{"question", "answer"}` objects (keys `q`/`a` and any
//!    letter case also work) or of two-element string arrays
//! 2. the same wrapped in a markdown code fence, an object such as
//!    `{"flashcards": [...]}`, or surrounded by prose
//! 3. `Q:` / `A:` lines
//!
//! Items missing a field, with an empty field, or with a placeholder question
//! are dropped and counted; only a response with no recognizable list at all
//! is an error.

use cardsmith_domain::Candidate;
use cardsmith_gatekeeper::patterns;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

const QUESTION_KEYS: &[&str] = &["question", "q"];
const ANSWER_KEYS: &[&str] = &["answer", "a"];
const WRAPPER_KEYS: &[&str] = &["flashcards", "questions", "cards", "items", "pairs"];

static QUESTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:[-*]\s*)?(?:\d+[.)]\s*)?(?:q|question)\s*\d*\s*[:.)]\s*(.*)$").unwrap()
});
static ANSWER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:[-*]\s*)?(?:a|answer)\s*\d*\s*[:.)]\s*(.*)$").unwrap());

/// Response-level parse failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The model returned nothing
    #[error("empty response")]
    Empty,

    /// No list of question/answer pairs could be found
    #[error("no list of question/answer pairs found")]
    NoListStructure,
}

/// Candidates recovered from one response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCandidates {
    /// Usable pairs, in response order
    pub candidates: Vec<Candidate>,
    /// Items that were recognized but unusable
    pub dropped: usize,
}

impl ParsedCandidates {
    fn push(&mut self, question: &str, answer: &str, chunk_index: usize) {
        let (question, answer) = (question.trim(), answer.trim());
        if question.is_empty() || answer.is_empty() {
            debug!("Dropping item with an empty field");
            self.dropped += 1;
        } else if patterns().is_generic_question(question) {
            debug!("Dropping placeholder question: {}", question);
            self.dropped += 1;
        } else {
            self.candidates.push(Candidate::new(question, answer, chunk_index));
        }
    }
}

/// Parse a model response for the chunk at `chunk_index`
///
/// An empty `candidates` list is a valid outcome.
pub fn parse_candidates(response: &str, chunk_index: usize) -> Result<ParsedCandidates, ParseError> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    let body = strip_code_fence(trimmed);
    if let Some(items) = json_lists(body).find(|items| items.iter().any(|item| item_fields(item).is_some())) {
        return Ok(parse_items(&items, chunk_index));
    }
    if let Some(parsed) = parse_lines(body, chunk_index) {
        return Ok(parsed);
    }
    // A list without a single usable pair still counts as an answer
    json_lists(body)
        .next()
        .map(|items| parse_items(&items, chunk_index))
        .ok_or(ParseError::NoListStructure)
}

fn parse_items(items: &[Value], chunk_index: usize) -> ParsedCandidates {
    let mut parsed = ParsedCandidates::default();
    for item in items {
        match item_fields(item) {
            Some((question, answer)) => parsed.push(&question, &answer, chunk_index),
            None => {
                debug!("Dropping item without question and answer: {}", item);
                parsed.dropped += 1;
            }
        }
    }
    parsed
}

/// Content of the first code fence, or the input when there is none
fn strip_code_fence(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text;
    };
    let after = &text[open + 3..];
    // Skip the language tag line
    let body_start = after.find('\n').map_or(after.len(), |i| i + 1);
    let body = &after[body_start..];
    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

/// Every list found by reading one JSON value at each `[` or `{`, in offset order
///
/// Prose around the list may contain brackets of its own, so no single
/// offset can be trusted.
fn json_lists(text: &str) -> impl Iterator<Item = Vec<Value>> + '_ {
    text.char_indices()
        .filter(|(_, c)| *c == '[' || *c == '{')
        .filter_map(move |(offset, _)| {
            serde_json::Deserializer::from_str(&text[offset..])
                .into_iter::<Value>()
                .next()?
                .ok()
        })
        .filter_map(list_of_items)
}

fn list_of_items(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => {
            if let Some(items) = WRAPPER_KEYS
                .iter()
                .find_map(|key| field(&map, key).and_then(Value::as_array))
            {
                return Some(items.clone());
            }
            // A single pair on its own
            item_fields_of_object(&map).map(|_| vec![Value::Object(map)])
        }
        _ => None,
    }
}

fn field<'v>(map: &'v Map<String, Value>, name: &str) -> Option<&'v Value> {
    map.iter()
        .find(|(key, _)| key.trim().eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
}

fn first_text(map: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| field(map, name))
        .and_then(value_text)
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn item_fields_of_object(map: &Map<String, Value>) -> Option<(String, String)> {
    Some((first_text(map, QUESTION_KEYS)?, first_text(map, ANSWER_KEYS)?))
}

fn item_fields(item: &Value) -> Option<(String, String)> {
    match item {
        Value::Object(map) => item_fields_of_object(map),
        Value::Array(pair) if pair.len() == 2 => Some((value_text(&pair[0])?, value_text(&pair[1])?)),
        _ => None,
    }
}

/// `Q:` / `A:` fallback; `None` when no question line exists
fn parse_lines(text: &str, chunk_index: usize) -> Option<ParsedCandidates> {
    let mut parsed = ParsedCandidates::default();
    let mut pending: Option<String> = None;
    let mut saw_question = false;

    for line in text.lines() {
        if let Some(caps) = QUESTION_LINE.captures(line) {
            if pending.replace(caps[1].to_string()).is_some() {
                // Previous question never got an answer
                parsed.dropped += 1;
            }
            saw_question = true;
        } else if let Some(caps) = ANSWER_LINE.captures(line) {
            match pending.take() {
                Some(question) => parsed.push(&question, &caps[1], chunk_index),
                None => parsed.dropped += 1,
            }
        }
    }
    if pending.is_some() {
        parsed.dropped += 1;
    }

    saw_question.then_some(parsed)
}
