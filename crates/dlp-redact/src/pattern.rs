//! Sensitive-data patterns and the matchers behind them.
//!
//! A [`SensitivePattern`] pairs a category name with a [`Matcher`] and the
//! literal token that replaces every match. Matchers are side-effect free and
//! re-entrant; the same instance is called concurrently from every worker.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Byte range of a match inside a text value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A matcher could not evaluate its input.
///
/// The reason must describe the failure without quoting the input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct MatcherFailure(pub String);

/// Finds the spans of one category of sensitive data inside text.
pub trait Matcher: Send + Sync + fmt::Debug {
    /// Return the non-overlapping matches in `text`, scanning left to right.
    fn find_spans(&self, text: &str) -> std::result::Result<Vec<Span>, MatcherFailure>;

    /// Whether `text` contains at least one match.
    fn is_match(&self, text: &str) -> std::result::Result<bool, MatcherFailure> {
        Ok(!self.find_spans(text)?.is_empty())
    }
}

/// Regular-expression matcher (leftmost-first, non-overlapping).
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    regex: Regex,
}

impl RegexMatcher {
    pub fn new(regex: Regex) -> Self {
        Self { regex }
    }

    /// Compile `pattern` into a matcher.
    pub fn compile(pattern: &str) -> std::result::Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::new)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl Matcher for RegexMatcher {
    fn find_spans(&self, text: &str) -> std::result::Result<Vec<Span>, MatcherFailure> {
        Ok(self
            .regex
            .find_iter(text)
            .map(|m| Span::new(m.start(), m.end()))
            .collect())
    }

    fn is_match(&self, text: &str) -> std::result::Result<bool, MatcherFailure> {
        Ok(self.regex.is_match(text))
    }
}

/// A category of sensitive data with its matcher and redaction token.
#[derive(Debug, Clone)]
pub struct SensitivePattern {
    category: String,
    matcher: Arc<dyn Matcher>,
    redaction_token: String,
}

impl SensitivePattern {
    pub fn new(
        category: impl Into<String>,
        matcher: Arc<dyn Matcher>,
        redaction_token: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            matcher,
            redaction_token: redaction_token.into(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn matcher(&self) -> &dyn Matcher {
        self.matcher.as_ref()
    }

    pub fn redaction_token(&self) -> &str {
        &self.redaction_token
    }
}

/// Built-in pattern definition.
struct BuiltinPattern {
    category: &'static str,
    pattern: Lazy<Regex>,
    token: &'static str,
}

// Pre-compiled built-in patterns, in registration order.
static BUILTIN_PATTERNS: [BuiltinPattern; 3] = [
    BuiltinPattern {
        category: "email",
        pattern: Lazy::new(|| Regex::new(r"[\w\.-]+@[\w\.-]+").unwrap()),
        token: "[EMAIL_REDACTED]",
    },
    BuiltinPattern {
        category: "phone_number",
        pattern: Lazy::new(|| {
            Regex::new(
                r"\d{3}[-.\s]?\d{3}[-.\s]?\d{4}|\(\d{3}\)[-.\s]?\d{3}[-.\s]?\d{4}",
            )
            .unwrap()
        }),
        token: "[PHONE_REDACTED]",
    },
    BuiltinPattern {
        category: "credit_card",
        pattern: Lazy::new(|| Regex::new(r"\b(?:\d[ -]*?){13,16}\b").unwrap()),
        token: "[CC_REDACTED]",
    },
];

/// The built-in patterns (email, phone number, credit card), in registration order.
pub fn builtin_patterns() -> Vec<SensitivePattern> {
    BUILTIN_PATTERNS
        .iter()
        .map(|p| {
            SensitivePattern::new(
                p.category,
                Arc::new(RegexMatcher::new(Lazy::force(&p.pattern).clone())),
                p.token,
            )
        })
        .collect()
}
