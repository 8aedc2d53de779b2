//! Field validation policies
//!
//! Validators are plain predicates so product rules can be swapped without
//! touching the controller.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

/// Predicate deciding whether a committed value is acceptable
pub trait FieldValidator: Send + Sync {
    /// Whether `value` passes
    fn is_valid(&self, value: &str) -> bool;
}

impl<F> FieldValidator for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_valid(&self, value: &str) -> bool {
        self(value)
    }
}

/// Address plausibility check: `local@domain.tld`, no whitespace
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailPattern;

impl EmailPattern {
    fn regex() -> &'static Regex {
        static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
        EMAIL_REGEX.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@.]{2,}$").unwrap())
    }
}

impl FieldValidator for EmailPattern {
    fn is_valid(&self, value: &str) -> bool {
        Self::regex().is_match(value.trim())
    }
}

/// Password rule: minimum length plus character-class mix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PasswordPolicy {
    /// Minimum length in grapheme clusters
    pub min_length: usize,
    /// Require at least one ASCII letter
    pub require_letter: bool,
    /// Require at least one ASCII digit
    pub require_digit: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_letter: true,
            require_digit: true,
        }
    }
}

impl FieldValidator for PasswordPolicy {
    fn is_valid(&self, value: &str) -> bool {
        if value.graphemes(true).count() < self.min_length {
            return false;
        }
        if self.require_letter && !value.chars().any(|c| c.is_ascii_alphabetic()) {
            return false;
        }
        if self.require_digit && !value.chars().any(|c| c.is_ascii_digit()) {
            return false;
        }
        true
    }
}
