//! Form validation: an error accumulator plus the predicates used as its
//! conditions.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// RFC 5322 approximation used for signup and login forms.
pub static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .unwrap()
});

/// Collects field-scoped and non-field validation failures for one request.
///
/// Messages for the same field accumulate; nothing is ever overwritten, so
/// once a failure is recorded the validator stays invalid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validator {
    field_errors: BTreeMap<String, Vec<String>>,
    non_field_errors: Vec<String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    pub fn add_field_error(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.field_errors
            .entry(key.into())
            .or_default()
            .push(message.into());
    }

    /// Records `message` against `key` when `condition` is false.
    pub fn check_field(&mut self, condition: bool, key: &str, message: &str) {
        if !condition {
            self.add_field_error(key, message);
        }
    }

    pub fn add_non_field_error(&mut self, message: impl Into<String>) {
        self.non_field_errors.push(message.into());
    }

    /// All messages recorded for `key`, joined by newlines.
    pub fn field_error(&self, key: &str) -> Option<String> {
        self.field_errors.get(key).map(|messages| messages.join("\n"))
    }

    pub fn field_errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.field_errors
    }

    pub fn non_field_errors(&self) -> &[String] {
        &self.non_field_errors
    }
}

pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn matches(value: &str, pattern: &Regex) -> bool {
    pattern.is_match(value)
}

pub fn runes_equal_to(value: &str, n: usize) -> bool {
    value.chars().count() == n
}

pub fn runes_greater_than(value: &str, n: usize) -> bool {
    value.chars().count() > n
}

pub fn runes_less_than(value: &str, n: usize) -> bool {
    value.chars().count() < n
}

/// At least `n` code points.
pub fn runes_min(value: &str, n: usize) -> bool {
    !runes_less_than(value, n)
}

/// At most `n` code points.
pub fn runes_max(value: &str, n: usize) -> bool {
    !runes_greater_than(value, n)
}

pub fn permitted<T: PartialEq>(value: &T, permitted_values: &[T]) -> bool {
    permitted_values.contains(value)
}
