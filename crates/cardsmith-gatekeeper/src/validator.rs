//! Candidate validation logic

use crate::{patterns, FilterConfig};
use cardsmith_domain::{question_key, Candidate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of candidate validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationResult {
    /// Whether the candidate passed validation
    pub status: ValidationStatus,

    /// First failing rule, if any
    pub reason: Option<RejectionReason>,
}

impl ValidationResult {
    fn accepted() -> Self {
        Self {
            status: ValidationStatus::Accepted,
            reason: None,
        }
    }

    fn rejected(reason: RejectionReason) -> Self {
        Self {
            status: ValidationStatus::Rejected,
            reason: Some(reason),
        }
    }

    /// True when the candidate may be stored
    pub fn is_accepted(&self) -> bool {
        self.status == ValidationStatus::Accepted
    }
}

/// Validation status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    /// Candidate accepted
    Accepted,

    /// Candidate rejected
    Rejected,
}

/// Reasons for rejection, in rule order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// Answer has fewer words than the minimum
    TooShort,

    /// Answer has more words than the maximum
    TooLong,

    /// Question is a template placeholder
    GenericQuestion,

    /// Question or answer is blank
    EmptyField,

    /// Question and answer say the same thing
    Identical,
}

impl RejectionReason {
    /// Stable reason code
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::TooShort => "too_short",
            RejectionReason::TooLong => "too_long",
            RejectionReason::GenericQuestion => "generic_question",
            RejectionReason::EmptyField => "empty_field",
            RejectionReason::Identical => "identical",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The Gatekeeper validates candidates before storage
#[derive(Debug, Clone, Copy, Default)]
pub struct Gatekeeper {
    config: FilterConfig,
}

impl Gatekeeper {
    /// Create a new Gatekeeper with the given configuration
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Validate a candidate against the configured rules
    ///
    /// Rules run in a fixed order and the first failing one is reported:
    /// answer too short, answer too long, generic question, empty field,
    /// identical question and answer.
    pub fn validate(&self, candidate: &Candidate) -> ValidationResult {
        let answer_words = candidate.answer.split_whitespace().count();

        if answer_words < self.config.min_answer_words {
            return ValidationResult::rejected(RejectionReason::TooShort);
        }
        if answer_words > self.config.max_answer_words {
            return ValidationResult::rejected(RejectionReason::TooLong);
        }
        if patterns().is_generic_question(&candidate.question) {
            return ValidationResult::rejected(RejectionReason::GenericQuestion);
        }
        if candidate.question.trim().is_empty() || candidate.answer.trim().is_empty() {
            return ValidationResult::rejected(RejectionReason::EmptyField);
        }
        if question_key(&candidate.question) == question_key(&candidate.answer) {
            return ValidationResult::rejected(RejectionReason::Identical);
        }

        ValidationResult::accepted()
    }

    /// Split candidates into accepted ones and rejections with their reasons
    ///
    /// Order within each group follows the input.
    pub fn partition(
        &self,
        candidates: Vec<Candidate>,
    ) -> (Vec<Candidate>, Vec<(Candidate, RejectionReason)>) {
        let mut accepted = Vec::with_capacity(candidates.len());
        let mut rejected = Vec::new();

        for candidate in candidates {
            match self.validate(&candidate).reason {
                None => accepted.push(candidate),
                Some(reason) => rejected.push((candidate, reason)),
            }
        }

        (accepted, rejected)
    }
}
