//! Registry of sensitive-data categories.
//!
//! The registry is populated once at startup and is read-only afterwards.
//! Workers share it through an `Arc` without any locking.

use crate::pattern::{builtin_patterns, Matcher, RegexMatcher, SensitivePattern};
use crate::{RedactionError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Ordered set of sensitive patterns keyed by category.
#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    patterns: Vec<SensitivePattern>,
    index: HashMap<String, usize>,
}

impl PatternRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in email, phone and credit card patterns.
    pub fn with_defaults() -> Result<Self> {
        let mut registry = Self::new();
        for pattern in builtin_patterns() {
            registry.insert(pattern)?;
        }
        Ok(registry)
    }

    /// Register a category with an arbitrary matcher.
    ///
    /// Fails with [`RedactionError::DuplicateCategory`] if the category exists and
    /// with [`RedactionError::InvalidPattern`] if the token is empty, the matcher
    /// accepts the empty string, or any token would be matched by any matcher.
    pub fn register(
        &mut self,
        category: impl Into<String>,
        matcher: Arc<dyn Matcher>,
        redaction_token: impl Into<String>,
    ) -> Result<()> {
        self.insert(SensitivePattern::new(category, matcher, redaction_token))
    }

    /// Compile a regular expression and register it under `category`.
    pub fn register_regex(
        &mut self,
        category: impl Into<String>,
        pattern: &str,
        redaction_token: impl Into<String>,
    ) -> Result<()> {
        let category = category.into();
        let matcher = RegexMatcher::compile(pattern).map_err(|e| RedactionError::InvalidPattern {
            category: category.clone(),
            reason: e.to_string(),
        })?;
        self.register(category, Arc::new(matcher), redaction_token)
    }

    /// Look up the pattern registered for `category`.
    pub fn lookup(&self, category: &str) -> Result<&SensitivePattern> {
        self.index
            .get(category)
            .map(|&i| &self.patterns[i])
            .ok_or_else(|| RedactionError::UnknownCategory(category.to_string()))
    }

    pub fn contains(&self, category: &str) -> bool {
        self.index.contains_key(category)
    }

    /// Categories in registration order.
    pub fn categories(&self) -> impl Iterator<Item = &str> + '_ {
        self.patterns.iter().map(|p| p.category())
    }

    /// Patterns in registration order.
    pub fn patterns(&self) -> &[SensitivePattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    fn insert(&mut self, pattern: SensitivePattern) -> Result<()> {
        let category = pattern.category().to_string();
        if category.trim().is_empty() {
            return Err(invalid(&category, "category must not be empty"));
        }
        if self.index.contains_key(&category) {
            return Err(RedactionError::DuplicateCategory(category));
        }
        if pattern.redaction_token().is_empty() {
            return Err(invalid(&category, "redaction token must not be empty"));
        }

        let accepts = |matcher: &dyn Matcher, text: &str| {
            matcher.is_match(text).map_err(|e| {
                invalid(&category, &format!("matcher failed during validation: {}", e))
            })
        };

        // Empty matches would splice tokens between characters and never converge.
        if accepts(pattern.matcher(), "")? {
            return Err(invalid(&category, "matcher accepts the empty string"));
        }
        if accepts(pattern.matcher(), pattern.redaction_token())? {
            return Err(invalid(&category, "redaction token is matched by its own matcher"));
        }
        for existing in &self.patterns {
            if accepts(existing.matcher(), pattern.redaction_token())? {
                return Err(invalid(
                    &category,
                    &format!("redaction token is matched by category '{}'", existing.category()),
                ));
            }
            if accepts(pattern.matcher(), existing.redaction_token())? {
                return Err(invalid(
                    &category,
                    &format!("matcher accepts the token of category '{}'", existing.category()),
                ));
            }
        }

        self.index.insert(category, self.patterns.len());
        self.patterns.push(pattern);
        Ok(())
    }
}

fn invalid(category: &str, reason: &str) -> RedactionError {
    RedactionError::InvalidPattern {
        category: category.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_registered_in_order() {
        let registry = PatternRegistry::with_defaults().unwrap();
        let categories: Vec<_> = registry.categories().collect();
        assert_eq!(categories, vec!["email", "phone_number", "credit_card"]);
        assert_eq!(registry.lookup("email").unwrap().redaction_token(), "[EMAIL_REDACTED]");
        assert_eq!(registry.lookup("phone_number").unwrap().redaction_token(), "[PHONE_REDACTED]");
        assert_eq!(registry.lookup("credit_card").unwrap().redaction_token(), "[CC_REDACTED]");
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let mut registry = PatternRegistry::with_defaults().unwrap();
        let err = registry
            .register_regex("email", r"\S+@\S+", "[MAIL]")
            .unwrap_err();
        assert_eq!(err, RedactionError::DuplicateCategory("email".into()));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_unknown_category() {
        let registry = PatternRegistry::with_defaults().unwrap();
        let err = registry.lookup("ssn").unwrap_err();
        assert_eq!(err, RedactionError::UnknownCategory("ssn".into()));
    }

    #[test]
    fn test_custom_pattern_registered_last() {
        let mut registry = PatternRegistry::with_defaults().unwrap();
        registry
            .register_regex("ssn", r"\d{3}-\d{2}-\d{4}", "[SSN_REDACTED]")
            .unwrap();
        assert_eq!(registry.categories().last(), Some("ssn"));
        assert!(registry.contains("ssn"));
    }

    #[test]
    fn test_empty_token_rejected() {
        let mut registry = PatternRegistry::new();
        let err = registry.register_regex("ssn", r"\d{3}-\d{2}-\d{4}", "").unwrap_err();
        assert!(matches!(err, RedactionError::InvalidPattern { .. }));
    }

    #[test]
    fn test_empty_match_rejected() {
        let mut registry = PatternRegistry::new();
        let err = registry.register_regex("digits", r"\d*", "[D]").unwrap_err();
        assert!(matches!(err, RedactionError::InvalidPattern { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_bad_regex_rejected() {
        let mut registry = PatternRegistry::new();
        let err = registry.register_regex("broken", r"(\d", "[X]").unwrap_err();
        assert!(matches!(
            err,
            RedactionError::InvalidPattern { ref category, .. } if category == "broken"
        ));
    }

    #[test]
    fn test_token_check_does_not_cover_reformed_matches() {
        let mut registry = PatternRegistry::new();
        registry.register_regex("code", "ab", "b").unwrap();
        let redactor = crate::FieldRedactor::new(Arc::new(registry));

        let once = redactor.redact(Some("aab"), "code").unwrap();
        assert_eq!(once.value.as_deref(), Some("ab"));
        let twice = redactor.redact(once.value.as_deref(), "code").unwrap();
        assert_eq!(twice.value.as_deref(), Some("b"));
    }

    #[test]
    fn test_token_matched_by_own_matcher_rejected() {
        let mut registry = PatternRegistry::new();
        let err = registry
            .register_regex("caps", r"[A-Z]+", "[REDACTED]")
            .unwrap_err();
        assert!(matches!(err, RedactionError::InvalidPattern { .. }));
    }

    #[test]
    fn test_token_matched_by_existing_matcher_rejected() {
        let mut registry = PatternRegistry::with_defaults().unwrap();
        // A token containing digits would be picked up by the phone pattern.
        let err = registry
            .register_regex("badge", r"BADGE-[a-z]{4}", "[555-123-4567]")
            .unwrap_err();
        assert!(matches!(err, RedactionError::InvalidPattern { .. }));
    }

    #[test]
    fn test_matcher_accepting_existing_token_rejected() {
        let mut registry = PatternRegistry::with_defaults().unwrap();
        let err = registry
            .register_regex("bracketed", r"\[[A-Z_]+\]", "<hidden>")
            .unwrap_err();
        assert!(matches!(err, RedactionError::InvalidPattern { .. }));
    }
}
