//! Field-level redaction.
//!
//! Applies one category's matcher to one value and substitutes the
//! category's token for every match. Values without matches are returned
//! borrowed, so callers can keep sharing the original allocation.

use crate::pattern::SensitivePattern;
use crate::record::FieldValue;
use crate::{PatternRegistry, RedactionError, Result};
use std::borrow::Cow;
use std::sync::Arc;

/// Result of redacting one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redaction<'a> {
    /// The rewritten value (`None` for null input).
    pub value: Option<Cow<'a, str>>,

    /// Number of matches replaced.
    pub substitutions: usize,
}

impl Redaction<'_> {
    /// Whether any substitution took place.
    pub fn was_modified(&self) -> bool {
        self.substitutions > 0
    }
}

/// Applies registered patterns to individual field values.
#[derive(Debug, Clone)]
pub struct FieldRedactor {
    registry: Arc<PatternRegistry>,
}

impl FieldRedactor {
    pub fn new(registry: Arc<PatternRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    /// Redact `value` with the pattern registered for `category`.
    ///
    /// Nulls pass through with zero substitutions. Unknown categories fail even
    /// for nulls so configuration errors never hide behind sparse data.
    pub fn redact<'a>(&self, value: Option<&'a str>, category: &str) -> Result<Redaction<'a>> {
        let pattern = self.registry.lookup(category)?;
        match value {
            None => Ok(Redaction {
                value: None,
                substitutions: 0,
            }),
            Some(text) => {
                let (value, substitutions) = substitute(pattern, text)?;
                Ok(Redaction {
                    value: Some(value),
                    substitutions,
                })
            }
        }
    }

    /// Redact a cell value, keeping its type.
    ///
    /// Unchanged values are returned as clones that share the input allocation.
    /// Binary values are decoded as UTF-8 first; invalid UTF-8 is a matcher
    /// failure. Non text-like values are rejected.
    pub fn redact_value(&self, value: &FieldValue, category: &str) -> Result<(FieldValue, usize)> {
        let pattern = self.registry.lookup(category)?;
        match value {
            FieldValue::Null => Ok((FieldValue::Null, 0)),
            FieldValue::Text(text) => match substitute(pattern, text)? {
                (Cow::Borrowed(_), n) => Ok((value.clone(), n)),
                (Cow::Owned(out), n) => Ok((FieldValue::Text(Arc::from(out)), n)),
            },
            FieldValue::Binary(bytes) => {
                let text = std::str::from_utf8(bytes).map_err(|e| {
                    matcher_failure(
                        pattern,
                        format!("value is not valid UTF-8 (error at byte {})", e.valid_up_to()),
                    )
                })?;
                match substitute(pattern, text)? {
                    (Cow::Borrowed(_), n) => Ok((value.clone(), n)),
                    (Cow::Owned(out), n) => {
                        Ok((FieldValue::Binary(Arc::from(out.into_bytes())), n))
                    }
                }
            }
            other => Err(RedactionError::UnsupportedColumnType {
                column: String::new(),
                record: 0,
                data_type: other
                    .data_type()
                    .map(|t| t.to_string())
                    .unwrap_or_default(),
            }),
        }
    }
}

/// Replace every match of `pattern` in `text` with its token.
///
/// Spans reported by the matcher are checked before use; anything out of
/// order, overlapping, empty, or off a char boundary fails the call.
fn substitute<'a>(pattern: &SensitivePattern, text: &'a str) -> Result<(Cow<'a, str>, usize)> {
    let spans = pattern
        .matcher()
        .find_spans(text)
        .map_err(|e| matcher_failure(pattern, e.0))?;

    if spans.is_empty() {
        return Ok((Cow::Borrowed(text), 0));
    }

    let token = pattern.redaction_token();
    let mut out = String::with_capacity(text.len() + spans.len() * token.len());
    let mut cursor = 0;

    for span in &spans {
        if span.is_empty()
            || span.start < cursor
            || span.end > text.len()
            || !text.is_char_boundary(span.start)
            || !text.is_char_boundary(span.end)
        {
            return Err(matcher_failure(
                pattern,
                format!("matcher returned an invalid span {}..{}", span.start, span.end),
            ));
        }
        out.push_str(&text[cursor..span.start]);
        out.push_str(token);
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);

    Ok((Cow::Owned(out), spans.len()))
}

fn matcher_failure(pattern: &SensitivePattern, reason: impl Into<String>) -> RedactionError {
    RedactionError::MatcherExecution {
        category: pattern.category().to_string(),
        column: String::new(),
        record: 0,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{Matcher, MatcherFailure, Span};

    fn redactor() -> FieldRedactor {
        FieldRedactor::new(Arc::new(PatternRegistry::with_defaults().unwrap()))
    }

    #[test]
    fn test_null_passes_through() {
        let redactor = redactor();
        for category in crate::BUILTIN_CATEGORIES {
            let result = redactor.redact(None, category).unwrap();
            assert_eq!(result.value, None);
            assert_eq!(result.substitutions, 0);
        }
    }

    #[test]
    fn test_empty_string() {
        let result = redactor().redact(Some(""), "email").unwrap();
        assert_eq!(result.value.as_deref(), Some(""));
        assert_eq!(result.substitutions, 0);
    }

    #[test]
    fn test_unmatched_value_is_borrowed() {
        let input = String::from("no contact details here");
        let result = redactor().redact(Some(input.as_str()), "email").unwrap();

        match result.value {
            Some(Cow::Borrowed(s)) => assert!(std::ptr::eq(s, input.as_str())),
            other => panic!("expected borrowed value, got {:?}", other),
        }
        assert!(!result.was_modified());
    }

    #[test]
    fn test_multiple_matches_counted() {
        let result = redactor()
            .redact(Some("a@b.com, c@d.org and e@f.net"), "email")
            .unwrap();
        assert_eq!(
            result.value.as_deref(),
            Some("[EMAIL_REDACTED], [EMAIL_REDACTED] and [EMAIL_REDACTED]")
        );
        assert_eq!(result.substitutions, 3);
    }

    #[test]
    fn test_embedded_phone() {
        let result = redactor()
            .redact(Some("call (555) 123-4567 after 5pm"), "phone_number")
            .unwrap();
        assert_eq!(result.value.as_deref(), Some("call [PHONE_REDACTED] after 5pm"));
        assert_eq!(result.substitutions, 1);
    }

    #[test]
    fn test_unknown_category_fails_even_for_null() {
        let err = redactor().redact(None, "ssn").unwrap_err();
        assert_eq!(err, RedactionError::UnknownCategory("ssn".into()));
    }

    #[test]
    fn test_binary_value_redacted_as_binary() {
        let value = FieldValue::from(b"card 4111 1111 1111 1111".to_vec());
        let (out, n) = redactor().redact_value(&value, "credit_card").unwrap();
        assert_eq!(out, FieldValue::from(b"card [CC_REDACTED]".to_vec()));
        assert_eq!(n, 1);
    }

    #[test]
    fn test_invalid_utf8_is_matcher_failure() {
        let value = FieldValue::from(vec![0x61, 0xff, 0x40]);
        let err = redactor().redact_value(&value, "email").unwrap_err();
        match err {
            RedactionError::MatcherExecution { category, reason, .. } => {
                assert_eq!(category, "email");
                assert!(reason.contains("UTF-8"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_text_value_rejected() {
        let err = redactor()
            .redact_value(&FieldValue::Int64(5551234567), "phone_number")
            .unwrap_err();
        assert!(matches!(err, RedactionError::UnsupportedColumnType { .. }));
    }

    #[test]
    fn test_unchanged_value_shares_allocation() {
        let value = FieldValue::from("nothing to see");
        let (out, n) = redactor().redact_value(&value, "email").unwrap();
        assert_eq!(n, 0);
        assert!(out.shares_allocation(&value));
    }

    #[derive(Debug)]
    struct OverlappingMatcher;

    impl Matcher for OverlappingMatcher {
        fn find_spans(&self, _text: &str) -> std::result::Result<Vec<Span>, MatcherFailure> {
            Ok(vec![Span::new(0, 3), Span::new(2, 4)])
        }

        fn is_match(&self, text: &str) -> std::result::Result<bool, MatcherFailure> {
            Ok(text.starts_with("abc"))
        }
    }

    #[derive(Debug)]
    struct FailingMatcher;

    impl Matcher for FailingMatcher {
        fn find_spans(&self, text: &str) -> std::result::Result<Vec<Span>, MatcherFailure> {
            if text.contains('!') {
                Err(MatcherFailure("backend unavailable".into()))
            } else {
                Ok(Vec::new())
            }
        }
    }

    #[test]
    fn test_invalid_spans_rejected() {
        let mut registry = PatternRegistry::new();
        registry
            .register("overlap", Arc::new(OverlappingMatcher), "<x>")
            .unwrap();
        let redactor = FieldRedactor::new(Arc::new(registry));

        let err = redactor.redact(Some("abcdef"), "overlap").unwrap_err();
        assert!(matches!(err, RedactionError::MatcherExecution { .. }));
    }

    #[test]
    fn test_matcher_error_propagates() {
        let mut registry = PatternRegistry::new();
        registry
            .register("flaky", Arc::new(FailingMatcher), "<x>")
            .unwrap();
        let redactor = FieldRedactor::new(Arc::new(registry));

        assert_eq!(redactor.redact(Some("fine"), "flaky").unwrap().substitutions, 0);
        let err = redactor.redact(Some("boom!"), "flaky").unwrap_err();
        assert!(err.to_string().contains("backend unavailable"));
        assert!(!err.to_string().contains("boom"));
    }
}
