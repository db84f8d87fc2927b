//! Gatekeeper configuration

use crate::GatekeeperError;
use serde::{Deserialize, Serialize};

/// Configuration for candidate validation rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Minimum answer length in words (inclusive)
    pub min_answer_words: usize,

    /// Maximum answer length in words (inclusive)
    pub max_answer_words: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_answer_words: 3,
            max_answer_words: 100,
        }
    }
}

impl FilterConfig {
    /// Create a configuration with explicit answer bounds
    pub fn new(min_answer_words: usize, max_answer_words: usize) -> Self {
        Self {
            min_answer_words,
            max_answer_words,
        }
    }

    /// Check that the bounds describe a non-empty range
    pub fn validate(&self) -> Result<(), GatekeeperError> {
        if self.min_answer_words > self.max_answer_words {
            return Err(GatekeeperError::Config(format!(
                "min_answer_words ({}) exceeds max_answer_words ({})",
                self.min_answer_words, self.max_answer_words
            )));
        }
        if self.max_answer_words == 0 {
            return Err(GatekeeperError::Config(
                "max_answer_words must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FilterConfig::default();
        assert_eq!(config.min_answer_words, 3);
        assert_eq!(config.max_answer_words, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let config = FilterConfig::new(10, 5);
        assert!(matches!(config.validate(), Err(GatekeeperError::Config(_))));
    }

    #[test]
    fn test_zero_max_rejected() {
        assert!(FilterConfig::new(0, 0).validate().is_err());
    }
}
