//! Literal and regex name matching for table filters.
//!
//! A pattern starting with `/` is a delimited regular expression such as
//! `/^tmp_/` or `/^LOG_/i`; every other pattern must equal the name exactly.
//! Patterns are compiled once, when settings are constructed.

use crate::{Result, error::DumpError};
use regex::Regex;

/// Character that marks a pattern as a regular expression.
pub const REGEX_DELIMITER: char = '/';

/// Compiled exclusion/no-data pattern list.
#[derive(Debug, Clone, Default)]
pub struct NameMatcher {
    literals: Vec<String>,
    patterns: Vec<Regex>,
}

impl NameMatcher {
    /// Compiles a pattern list.
    ///
    /// # Errors
    /// Returns a configuration error if a delimited pattern is unterminated,
    /// uses an unknown flag, or is not a valid regular expression.
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut matcher = Self::default();
        for pattern in patterns {
            if pattern.starts_with(REGEX_DELIMITER) {
                matcher.patterns.push(compile_delimited(pattern)?);
            } else {
                matcher.literals.push(pattern.clone());
            }
        }
        Ok(matcher)
    }

    /// True if any literal equals `name` or any regex matches it.
    pub fn matches(&self, name: &str) -> bool {
        let literal = self.literals.iter().any(|literal| literal == name);
        let pattern = self.patterns.iter().any(|regex| regex.is_match(name));
        literal || pattern
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty() && self.patterns.is_empty()
    }
}

/// One-shot form of [`NameMatcher::matches`].
///
/// # Errors
/// Returns a configuration error for an invalid regex pattern.
pub fn matches(name: &str, patterns: &[String]) -> Result<bool> {
    Ok(NameMatcher::new(patterns)?.matches(name))
}

fn compile_delimited(pattern: &str) -> Result<Regex> {
    let body_and_flags = &pattern[REGEX_DELIMITER.len_utf8()..];
    let closing = body_and_flags.rfind(REGEX_DELIMITER).ok_or_else(|| {
        DumpError::configuration(format!("Unterminated regex pattern '{}'", pattern))
    })?;
    let (body, flags) = body_and_flags.split_at(closing);
    let flags = &flags[REGEX_DELIMITER.len_utf8()..];

    let mut inline = String::new();
    for flag in flags.chars() {
        match flag {
            'i' | 'm' | 's' | 'x' | 'U' => inline.push(flag),
            other => {
                return Err(DumpError::configuration(format!(
                    "Unsupported regex flag '{}' in pattern '{}'",
                    other, pattern
                )));
            }
        }
    }

    let source = if inline.is_empty() {
        body.to_string()
    } else {
        format!("(?{}){}", inline, body)
    };

    Regex::new(&source).map_err(|e| {
        DumpError::configuration(format!("Invalid regex pattern '{}': {}", pattern, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_regex_and_literal_patterns() {
        let list = patterns(&["/^tmp_/", "exact_name"]);
        assert!(matches("tmp_foo", &list).unwrap());
        assert!(matches("exact_name", &list).unwrap());
        assert!(!matches("other", &list).unwrap());
    }

    #[test]
    fn test_literal_requires_exact_match() {
        let matcher = NameMatcher::new(&patterns(&["users"])).unwrap();
        assert!(matcher.matches("users"));
        assert!(!matcher.matches("users_archive"));
        assert!(!matcher.matches("USERS"));
    }

    #[test]
    fn test_regex_flags() {
        let matcher = NameMatcher::new(&patterns(&["/^log_/i"])).unwrap();
        assert!(matcher.matches("LOG_2024"));
        assert!(matcher.matches("log_2024"));
        assert!(!matcher.matches("audit_log_2024"));
    }

    #[test]
    fn test_regex_body_may_contain_delimiter() {
        let matcher = NameMatcher::new(&patterns(&["/a/b/"])).unwrap();
        assert!(matcher.matches("xa/by"));
    }

    #[test]
    fn test_invalid_patterns_rejected() {
        assert!(NameMatcher::new(&patterns(&["/unterminated"])).is_err());
        assert!(NameMatcher::new(&patterns(&["/(/"])).is_err());
        assert!(NameMatcher::new(&patterns(&["/x/q"])).is_err());
    }

    #[test]
    fn test_empty_matcher_matches_nothing() {
        let matcher = NameMatcher::new(&[]).unwrap();
        assert!(matcher.is_empty());
        assert!(!matcher.matches(""));
    }
}
