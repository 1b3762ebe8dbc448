//! Field validation for todo items.
//!
//! Validation accumulates every violation it finds rather than stopping
//! at the first one, so a caller can report the full list back to the
//! user in a single round trip.

use std::collections::BTreeSet;

/// Maximum length of the `text` field, in characters.
pub const MAX_TEXT_LEN: usize = 500;

/// Maximum length of the `description` field, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// A single validation violation, tied to the field that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    field: &'static str,
    message: String,
}

impl ValidationIssue {
    /// Create an issue for the given field.
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }

    /// The field the issue refers to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        self.field
    }

    /// Human-readable description of the violation.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationIssue {}

/// The complete set of violations found while validating an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    issues: Vec<ValidationIssue>,
}

impl ValidationErrors {
    /// Build from a list of issues.
    #[must_use]
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    /// The individual violations, in the order they were found.
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Number of violations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Whether no violations were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for issue in &self.issues {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{issue}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<Vec<ValidationIssue>> for ValidationErrors {
    fn from(issues: Vec<ValidationIssue>) -> Self {
        Self::new(issues)
    }
}

/// Trim and validate the `text` field.
///
/// # Errors
///
/// Returns an issue if the text is empty after trimming or longer than
/// [`MAX_TEXT_LEN`] characters.
pub fn normalize_text(raw: &str) -> Result<String, ValidationIssue> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationIssue::new("text", "must not be empty"));
    }
    if trimmed.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationIssue::new(
            "text",
            format!("exceeds {MAX_TEXT_LEN} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Trim and validate the optional `description` field.
///
/// A description that trims to the empty string is treated as absent.
///
/// # Errors
///
/// Returns an issue if the description is longer than
/// [`MAX_DESCRIPTION_LEN`] characters.
pub fn normalize_description(raw: &str) -> Result<Option<String>, ValidationIssue> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationIssue::new(
            "description",
            format!("exceeds {MAX_DESCRIPTION_LEN} characters"),
        ));
    }
    Ok(Some(trimmed.to_string()))
}

/// Normalize a list of tags into a deduplicated set.
///
/// Tags are trimmed and lower-cased; entries that trim to the empty
/// string are dropped. The set representation makes case-insensitive
/// duplicates impossible.
pub fn normalize_tags<I, S>(raw: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .map(|tag| tag.as_ref().trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_text_trims() {
        assert_eq!(normalize_text("  Buy milk  ").unwrap(), "Buy milk");
    }

    #[test]
    fn test_normalize_text_rejects_empty() {
        assert!(normalize_text("").is_err());
        assert!(normalize_text("   ").is_err());
        assert!(normalize_text("\t\n").is_err());
    }

    #[test]
    fn test_normalize_text_rejects_over_limit() {
        let long = "a".repeat(MAX_TEXT_LEN + 1);
        let err = normalize_text(&long).unwrap_err();
        assert_eq!(err.field(), "text");
        assert!(err.message().contains("500"));
    }

    #[test]
    fn test_normalize_text_accepts_at_limit() {
        let text = "a".repeat(MAX_TEXT_LEN);
        assert_eq!(normalize_text(&text).unwrap(), text);
    }

    #[test]
    fn test_normalize_description_empty_is_none() {
        assert_eq!(normalize_description("").unwrap(), None);
        assert_eq!(normalize_description("   ").unwrap(), None);
    }

    #[test]
    fn test_normalize_description_trims() {
        assert_eq!(
            normalize_description(" details ").unwrap(),
            Some("details".to_string())
        );
    }

    #[test]
    fn test_normalize_description_rejects_over_limit() {
        let long = "d".repeat(MAX_DESCRIPTION_LEN + 1);
        let err = normalize_description(&long).unwrap_err();
        assert_eq!(err.field(), "description");
    }

    #[test]
    fn test_normalize_tags_dedupes_case_insensitively() {
        let tags = normalize_tags(["Home", "home", " HOME "]);
        assert_eq!(tags.len(), 1);
        assert!(tags.contains("home"));
    }

    #[test]
    fn test_normalize_tags_drops_empty() {
        let tags = normalize_tags(["", "  ", "work"]);
        assert_eq!(tags.len(), 1);
        assert!(tags.contains("work"));
    }

    #[test]
    fn test_validation_errors_display() {
        let errors = ValidationErrors::new(vec![
            ValidationIssue::new("text", "must not be empty"),
            ValidationIssue::new("description", "too long"),
        ]);
        assert_eq!(
            errors.to_string(),
            "text: must not be empty; description: too long"
        );
        assert_eq!(errors.len(), 2);
        assert!(!errors.is_empty());
    }

    proptest! {
        #[test]
        fn prop_normalized_text_is_trimmed(raw in ".*") {
            if let Ok(text) = normalize_text(&raw) {
                prop_assert_eq!(text.trim(), text.as_str());
                prop_assert!(!text.is_empty());
                prop_assert!(text.chars().count() <= MAX_TEXT_LEN);
            }
        }

        #[test]
        fn prop_normalized_tags_are_lowercase(raw in proptest::collection::vec(".*", 0..8)) {
            let tags = normalize_tags(raw.iter());
            for tag in &tags {
                prop_assert_eq!(tag.trim(), tag.as_str());
                prop_assert_eq!(tag.to_lowercase(), tag.clone());
                prop_assert!(!tag.is_empty());
            }
        }
    }
}
