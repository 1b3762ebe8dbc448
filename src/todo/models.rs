//! Todo model types for the task-tracking core.

use crate::error::{Error, Result};
use crate::todo::validate::{
    self, normalize_description, normalize_tags, normalize_text, ValidationIssue,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// Todo priority levels, in ascending order of urgency.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low priority.
    Low,
    /// Medium priority (default).
    #[default]
    Medium,
    /// High priority.
    High,
    /// Critical priority - blocking issues.
    Critical,
}

impl Priority {
    /// Every variant, in ascending order.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Parse a priority from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid priority.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> std::result::Result<Self, InvalidPriority> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(InvalidPriority(s.to_string())),
        }
    }

    /// Get the string representation of the priority.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid priority string is provided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPriority(pub String);

impl std::fmt::Display for InvalidPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid priority: '{}' (must be one of: low, medium, high, critical)",
            self.0
        )
    }
}

impl std::error::Error for InvalidPriority {}

/// Todo lifecycle status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The item is open and actionable (default).
    #[default]
    Pending,
    /// The item has been finished.
    Completed,
    /// The item is kept for reference but no longer active.
    Archived,
}

impl Status {
    /// Every variant, in declaration order.
    pub const ALL: [Self; 3] = [Self::Pending, Self::Completed, Self::Archived];

    /// Parse a status from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid status.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> std::result::Result<Self, InvalidStatus> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "archived" => Ok(Self::Archived),
            _ => Err(InvalidStatus(s.to_string())),
        }
    }

    /// Get the string representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid status string is provided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidStatus(pub String);

impl std::fmt::Display for InvalidStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid status: '{}' (must be one of: pending, completed, archived)",
            self.0
        )
    }
}

impl std::error::Error for InvalidStatus {}

/// User-supplied data for creating a todo.
///
/// Only `text` is required; every other field falls back to its default.
#[derive(Debug, Clone, Default)]
pub struct NewTodo {
    /// The todo text. Trimmed and validated on creation.
    pub text: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Priority, defaulting to [`Priority::Medium`].
    pub priority: Option<Priority>,
    /// Status, defaulting to [`Status::Pending`].
    pub status: Option<Status>,
    /// Optional due date. A date in the past is accepted with a warning.
    pub due_date: Option<DateTime<Utc>>,
    /// Tags, normalized (trimmed, lower-cased, deduplicated) on creation.
    pub tags: Vec<String>,
}

impl NewTodo {
    /// Create an input with the given text and defaults for the rest.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Self::default() }
    }
}

/// Fields that can be changed on an existing todo.
///
/// Absent fields are left untouched; only present fields are validated.
#[derive(Debug, Default, Clone)]
pub struct TodoUpdate {
    /// New text (if Some).
    pub text: Option<String>,
    /// New description (if Some). A value that trims to empty clears it.
    pub description: Option<String>,
    /// New completion flag (if Some).
    pub complete: Option<bool>,
    /// New status (if Some).
    pub status: Option<Status>,
    /// New priority (if Some).
    pub priority: Option<Priority>,
    /// New due date. `Some(None)` clears an existing due date.
    pub due_date: Option<Option<DateTime<Utc>>>,
    /// Replacement tag list (if Some), normalized on apply.
    pub tags: Option<Vec<String>>,
}

impl TodoUpdate {
    /// Check if any fields are set for update.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.description.is_none()
            && self.complete.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.tags.is_none()
    }
}

fn deserialize_normalized_tags<'de, D>(deserializer: D) -> std::result::Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    Ok(normalize_tags(raw))
}

/// A single task item.
///
/// `id` and `created_at` are fixed at construction; every other field
/// changes only through [`Todo::apply`], which refreshes `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    complete: bool,
    status: Status,
    priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    due_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_normalized_tags")]
    tags: BTreeSet<String>,
}

impl Todo {
    /// Construct a validated todo from user input.
    ///
    /// Both timestamps are set to `now`. A due date in the past is
    /// accepted but logged as a warning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] listing every violated constraint.
    pub fn create(id: String, input: NewTodo, now: DateTime<Utc>) -> Result<Self> {
        let mut issues: Vec<ValidationIssue> = Vec::new();

        let text = match normalize_text(&input.text) {
            Ok(text) => text,
            Err(issue) => {
                issues.push(issue);
                String::new()
            }
        };
        let description = match input.description.as_deref() {
            Some(raw) => match normalize_description(raw) {
                Ok(description) => description,
                Err(issue) => {
                    issues.push(issue);
                    None
                }
            },
            None => None,
        };

        if !issues.is_empty() {
            return Err(Error::Validation(issues.into()));
        }

        if let Some(due) = input.due_date {
            if due < now {
                tracing::warn!(%due, "todo created with a due date in the past");
            }
        }

        Ok(Self {
            id,
            created_at: now,
            updated_at: now,
            text,
            description,
            complete: false,
            status: input.status.unwrap_or_default(),
            priority: input.priority.unwrap_or_default(),
            due_date: input.due_date,
            tags: normalize_tags(input.tags),
        })
    }

    /// Apply a partial update, validating only the fields it carries.
    ///
    /// `updated_at` is refreshed unconditionally once the update is
    /// accepted, and never moves backwards. `id` and `created_at` are
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] listing every violated constraint;
    /// the todo is unchanged in that case.
    pub fn apply(&mut self, update: &TodoUpdate, now: DateTime<Utc>) -> Result<()> {
        let mut issues: Vec<ValidationIssue> = Vec::new();

        let text = match update.text.as_deref() {
            Some(raw) => match normalize_text(raw) {
                Ok(text) => Some(text),
                Err(issue) => {
                    issues.push(issue);
                    None
                }
            },
            None => None,
        };
        let description = match update.description.as_deref() {
            Some(raw) => match normalize_description(raw) {
                Ok(description) => Some(description),
                Err(issue) => {
                    issues.push(issue);
                    None
                }
            },
            None => None,
        };

        if !issues.is_empty() {
            return Err(Error::Validation(issues.into()));
        }

        if let Some(text) = text {
            self.text = text;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(complete) = update.complete {
            self.complete = complete;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(due_date) = update.due_date {
            if let Some(due) = due_date {
                if due < now {
                    tracing::warn!(%due, id = %self.id, "todo updated with a due date in the past");
                }
            }
            self.due_date = due_date;
        }
        if let Some(tags) = &update.tags {
            self.tags = normalize_tags(tags);
        }

        self.updated_at = now.max(self.updated_at);
        Ok(())
    }

    /// Re-check the stored fields against the creation constraints.
    ///
    /// Used by integrity checks over items that entered the collection
    /// through deserialization rather than [`Todo::create`].
    ///
    /// # Errors
    ///
    /// Returns every violated constraint.
    pub fn validate(&self) -> std::result::Result<(), crate::todo::validate::ValidationErrors> {
        let mut issues: Vec<ValidationIssue> = Vec::new();
        if let Err(issue) = normalize_text(&self.text) {
            issues.push(issue);
        }
        if let Some(description) = &self.description {
            if description.chars().count() > validate::MAX_DESCRIPTION_LEN {
                issues.push(ValidationIssue::new(
                    "description",
                    format!("exceeds {} characters", validate::MAX_DESCRIPTION_LEN),
                ));
            }
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues.into())
        }
    }

    /// Unique identifier, fixed at creation.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Creation timestamp, fixed at creation.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Timestamp of the most recent accepted mutation.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// The todo text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Optional longer description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Completion flag.
    #[must_use]
    pub const fn complete(&self) -> bool {
        self.complete
    }

    /// Lifecycle status.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Priority level.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Optional due date.
    #[must_use]
    pub const fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Normalized tag set.
    #[must_use]
    pub const fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Whether the due date has passed without the item being completed.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.due_date.is_some_and(|due| due < now) && !self.complete
    }

    /// Whether the item is pending and not complete.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == Status::Pending && !self.complete
    }

    /// Whether the item is complete and marked completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.complete && self.status == Status::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn make(text: &str) -> Todo {
        Todo::create("todo-0001".to_string(), NewTodo::with_text(text), now()).unwrap()
    }

    #[test]
    fn test_priority_from_str() {
        assert_eq!(Priority::from_str("low").unwrap(), Priority::Low);
        assert_eq!(Priority::from_str("MEDIUM").unwrap(), Priority::Medium);
        assert_eq!(Priority::from_str("High").unwrap(), Priority::High);
        assert_eq!(Priority::from_str("critical").unwrap(), Priority::Critical);
        assert!(Priority::from_str("urgent").is_err());
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
        assert!(Priority::High < Priority::Critical);
    }

    #[test]
    fn test_priority_default() {
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_priority_serialization() {
        assert_eq!(serde_json::to_string(&Priority::Critical).unwrap(), "\"critical\"");
        let parsed: Priority = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(parsed, Priority::Low);
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(Status::from_str("pending").unwrap(), Status::Pending);
        assert_eq!(Status::from_str("Completed").unwrap(), Status::Completed);
        assert_eq!(Status::from_str("ARCHIVED").unwrap(), Status::Archived);
        assert!(Status::from_str("open").is_err());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(Status::Pending.to_string(), "pending");
        assert_eq!(Status::Archived.to_string(), "archived");
    }

    #[test]
    fn test_invalid_status_display() {
        let err = InvalidStatus("open".to_string());
        assert!(err.to_string().contains("open"));
        assert!(err.to_string().contains("pending"));
    }

    #[test]
    fn test_create_trims_text() {
        let todo = make("  Buy milk  ");
        assert_eq!(todo.text(), "Buy milk");
        assert_eq!(todo.status(), Status::Pending);
        assert_eq!(todo.priority(), Priority::Medium);
        assert!(!todo.complete());
    }

    #[test]
    fn test_create_rejects_empty_text() {
        let err = Todo::create("t".to_string(), NewTodo::with_text("   "), now()).unwrap_err();
        match err {
            Error::Validation(errors) => {
                assert_eq!(errors.issues().len(), 1);
                assert_eq!(errors.issues()[0].field(), "text");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_create_accumulates_all_violations() {
        let input = NewTodo {
            text: String::new(),
            description: Some("d".repeat(1001)),
            ..NewTodo::default()
        };
        let err = Todo::create("t".to_string(), input, now()).unwrap_err();
        match err {
            Error::Validation(errors) => {
                assert_eq!(errors.issues().len(), 2);
                let fields: Vec<_> = errors.issues().iter().map(|i| i.field()).collect();
                assert!(fields.contains(&"text"));
                assert!(fields.contains(&"description"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_create_accepts_past_due_date_with_warning() {
        let input = NewTodo {
            text: "Overdue already".to_string(),
            due_date: Some(now() - chrono::Duration::days(1)),
            ..NewTodo::default()
        };
        let todo = Todo::create("t".to_string(), input, now()).unwrap();
        assert!(todo.is_overdue(now()));
    }

    #[test]
    fn test_create_normalizes_tags() {
        let input = NewTodo {
            text: "Tagged".to_string(),
            tags: vec!["Home".to_string(), " home ".to_string(), "Work".to_string()],
            ..NewTodo::default()
        };
        let todo = Todo::create("t".to_string(), input, now()).unwrap();
        assert_eq!(todo.tags().len(), 2);
        assert!(todo.tags().contains("home"));
        assert!(todo.tags().contains("work"));
    }

    #[test]
    fn test_apply_never_touches_id_or_created_at() {
        let mut todo = make("Original");
        let id = todo.id().to_string();
        let created = todo.created_at();

        let later = now() + chrono::Duration::hours(1);
        todo.apply(
            &TodoUpdate { text: Some("Changed".to_string()), ..TodoUpdate::default() },
            later,
        )
        .unwrap();

        assert_eq!(todo.id(), id);
        assert_eq!(todo.created_at(), created);
        assert_eq!(todo.text(), "Changed");
        assert_eq!(todo.updated_at(), later);
    }

    #[test]
    fn test_apply_updated_at_is_monotone() {
        let mut todo = make("Monotone");
        let earlier = now() - chrono::Duration::hours(1);
        todo.apply(
            &TodoUpdate { complete: Some(true), ..TodoUpdate::default() },
            earlier,
        )
        .unwrap();
        assert_eq!(todo.updated_at(), now());
        assert!(todo.complete());
    }

    #[test]
    fn test_apply_rejects_invalid_text_without_changing_anything() {
        let mut todo = make("Keep me");
        let err = todo
            .apply(&TodoUpdate { text: Some("  ".to_string()), ..TodoUpdate::default() }, now())
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(todo.text(), "Keep me");
    }

    #[test]
    fn test_apply_validates_only_present_fields() {
        let mut todo = make("Valid");
        // No text in the update, so an over-long description is the only issue.
        let err = todo
            .apply(
                &TodoUpdate {
                    description: Some("d".repeat(1001)),
                    ..TodoUpdate::default()
                },
                now(),
            )
            .unwrap_err();
        match err {
            Error::Validation(errors) => assert_eq!(errors.issues().len(), 1),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_apply_clears_description_and_due_date() {
        let input = NewTodo {
            text: "Full".to_string(),
            description: Some("details".to_string()),
            due_date: Some(now() + chrono::Duration::days(1)),
            ..NewTodo::default()
        };
        let mut todo = Todo::create("t".to_string(), input, now()).unwrap();

        todo.apply(
            &TodoUpdate {
                description: Some("  ".to_string()),
                due_date: Some(None),
                ..TodoUpdate::default()
            },
            now(),
        )
        .unwrap();

        assert_eq!(todo.description(), None);
        assert_eq!(todo.due_date(), None);
    }

    #[test]
    fn test_derived_predicates() {
        let mut todo = make("Derived");
        assert!(todo.is_pending());
        assert!(!todo.is_completed());
        assert!(!todo.is_overdue(now()));

        todo.apply(
            &TodoUpdate {
                complete: Some(true),
                status: Some(Status::Completed),
                ..TodoUpdate::default()
            },
            now(),
        )
        .unwrap();
        assert!(todo.is_completed());
        assert!(!todo.is_pending());
    }

    #[test]
    fn test_overdue_requires_incomplete() {
        let input = NewTodo {
            text: "Late".to_string(),
            due_date: Some(now() - chrono::Duration::days(1)),
            ..NewTodo::default()
        };
        let mut todo = Todo::create("t".to_string(), input, now()).unwrap();
        assert!(todo.is_overdue(now()));

        todo.apply(&TodoUpdate { complete: Some(true), ..TodoUpdate::default() }, now())
            .unwrap();
        assert!(!todo.is_overdue(now()));
    }

    #[test]
    fn test_serialization_round_trip_preserves_everything() {
        let input = NewTodo {
            text: "Round trip".to_string(),
            description: Some("with description".to_string()),
            priority: Some(Priority::High),
            due_date: Some(now() + chrono::Duration::days(3)),
            tags: vec!["a".to_string(), "b".to_string()],
            ..NewTodo::default()
        };
        let todo = Todo::create("todo-ff01".to_string(), input, now()).unwrap();

        let json = serde_json::to_string(&todo).unwrap();
        let parsed: Todo = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, todo);
        assert_eq!(parsed.id(), "todo-ff01");
        assert_eq!(parsed.created_at(), todo.created_at());
        assert_eq!(parsed.updated_at(), todo.updated_at());
    }

    #[test]
    fn test_deserialization_normalizes_tags() {
        let json = r#"{
            "id": "todo-1", "created_at": "2024-06-01T12:00:00Z",
            "updated_at": "2024-06-01T12:00:00Z", "text": "Imported",
            "complete": false, "status": "pending", "priority": "low",
            "tags": ["Home", "home ", "WORK"]
        }"#;
        let todo: Todo = serde_json::from_str(json).unwrap();
        assert_eq!(todo.tags().len(), 2);
        assert!(todo.tags().contains("home"));
        assert!(todo.tags().contains("work"));
    }

    #[test]
    fn test_validate_catches_deserialized_violations() {
        let json = format!(
            r#"{{
                "id": "todo-1", "created_at": "2024-06-01T12:00:00Z",
                "updated_at": "2024-06-01T12:00:00Z", "text": "{}",
                "complete": false, "status": "pending", "priority": "low",
                "tags": []
            }}"#,
            "x".repeat(501)
        );
        let todo: Todo = serde_json::from_str(&json).unwrap();
        assert!(todo.validate().is_err());

        let ok = make("Fine");
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_clone_shares_no_state() {
        let original = make("Cloneable");
        let copy = original.clone();
        assert_eq!(copy, original);
        // Owned strings and an owned set; mutating the copy later can
        // never reach back into the original.
    }
}
