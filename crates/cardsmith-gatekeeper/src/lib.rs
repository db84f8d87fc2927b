//! Cardsmith Gatekeeper
//!
//! Quality control for generated flashcard candidates.
//!
//! The Gatekeeper provides:
//! - The pattern library shared with the text normalizer
//! - Candidate validation (answer length, generic questions, empty fields)
//!
//! # Examples
//!
//! ```
//! use cardsmith_domain::Candidate;
//! use cardsmith_gatekeeper::{FilterConfig, Gatekeeper, RejectionReason};
//!
//! let gatekeeper = Gatekeeper::new(FilterConfig::default());
//!
//! let good = Candidate::new("What powers the cell?", "Mitochondria produce ATP.", 0);
//! assert!(gatekeeper.validate(&good).is_accepted());
//!
//! let vague = Candidate::new("Question 1?", "Mitochondria produce ATP.", 0);
//! assert_eq!(gatekeeper.validate(&vague).reason, Some(RejectionReason::GenericQuestion));
//! ```

#![warn(missing_docs)]

mod config;
mod error;
pub mod patterns;
mod validator;

pub use config::FilterConfig;
pub use error::GatekeeperError;
pub use patterns::{patterns, Patterns};
pub use validator::{Gatekeeper, RejectionReason, ValidationResult, ValidationStatus};
