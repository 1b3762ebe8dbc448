//! Pure query utilities over todo collections.
//!
//! Everything here is stateless: functions take a slice of todos and
//! return fresh values, leaving the input untouched. The service layer
//! delegates its query surface to this module.

use crate::todo::models::{Priority, Status, Todo};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Filter criteria for querying todos.
///
/// Criteria are independently optional and ANDed when present; a
/// default-constructed filter matches everything.
#[derive(Debug, Default, Clone)]
pub struct TodoFilter {
    /// Match items whose status is in this set.
    pub status: Option<Vec<Status>>,
    /// Match items whose priority is in this set.
    pub priority: Option<Vec<Priority>>,
    /// Match items with this completion flag.
    pub complete: Option<bool>,
    /// Match items sharing at least one tag (case-insensitive).
    pub tags: Option<Vec<String>>,
    /// Match items due at or before this instant. Items without a due
    /// date never match.
    pub due_before: Option<DateTime<Utc>>,
    /// Match items due at or after this instant. Items without a due
    /// date never match.
    pub due_after: Option<DateTime<Utc>>,
    /// Case-insensitive substring search over text, description, and tags.
    pub search: Option<String>,
}

impl TodoFilter {
    /// Whether no criteria are set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.priority.is_none()
            && self.complete.is_none()
            && self.tags.is_none()
            && self.due_before.is_none()
            && self.due_after.is_none()
            && self.search.is_none()
    }

    /// Check whether a todo satisfies every present criterion.
    #[must_use]
    pub fn matches(&self, todo: &Todo) -> bool {
        if let Some(statuses) = &self.status {
            if !statuses.contains(&todo.status()) {
                return false;
            }
        }
        if let Some(priorities) = &self.priority {
            if !priorities.contains(&todo.priority()) {
                return false;
            }
        }
        if let Some(complete) = self.complete {
            if todo.complete() != complete {
                return false;
            }
        }
        if let Some(tags) = &self.tags {
            let any_overlap = tags
                .iter()
                .map(|tag| tag.trim().to_lowercase())
                .any(|tag| todo.tags().contains(&tag));
            if !any_overlap {
                return false;
            }
        }
        if let Some(bound) = self.due_before {
            if !todo.due_date().is_some_and(|due| due <= bound) {
                return false;
            }
        }
        if let Some(bound) = self.due_after {
            if !todo.due_date().is_some_and(|due| due >= bound) {
                return false;
            }
        }
        if let Some(query) = &self.search {
            if !search_matches(todo, query) {
                return false;
            }
        }
        true
    }
}

fn search_matches(todo: &Todo, query: &str) -> bool {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return true;
    }
    todo.text().to_lowercase().contains(&needle)
        || todo
            .description()
            .is_some_and(|description| description.to_lowercase().contains(&needle))
        || todo.tags().iter().any(|tag| tag.contains(&needle))
}

/// Return the todos satisfying the filter, preserving input order.
#[must_use]
pub fn filter_todos(todos: &[Todo], filter: &TodoFilter) -> Vec<Todo> {
    todos.iter().filter(|todo| filter.matches(todo)).cloned().collect()
}

/// Fields a collection can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    /// Case-insensitive text comparison.
    Text,
    /// Priority rank, low to critical.
    Priority,
    /// Status rank, pending to archived.
    Status,
    /// Completion flag, incomplete before complete.
    Complete,
    /// Creation timestamp.
    CreatedAt,
    /// Last-update timestamp.
    UpdatedAt,
    /// Due date; items without one sort last.
    DueDate,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Smallest key first.
    #[default]
    Ascending,
    /// Largest key first.
    Descending,
}

fn compare_by(a: &Todo, b: &Todo, field: SortField) -> std::cmp::Ordering {
    match field {
        SortField::Text => a.text().to_lowercase().cmp(&b.text().to_lowercase()),
        SortField::Priority => a.priority().cmp(&b.priority()),
        SortField::Status => a.status().cmp(&b.status()),
        SortField::Complete => a.complete().cmp(&b.complete()),
        SortField::CreatedAt => a.created_at().cmp(&b.created_at()),
        SortField::UpdatedAt => a.updated_at().cmp(&b.updated_at()),
        SortField::DueDate => match (a.due_date(), b.due_date()) {
            (Some(left), Some(right)) => left.cmp(&right),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        },
    }
}

/// Stable sort by the given field; equal keys keep their input order.
#[must_use]
pub fn sort_todos(todos: &[Todo], field: SortField, direction: SortDirection) -> Vec<Todo> {
    let mut sorted = todos.to_vec();
    sorted.sort_by(|a, b| {
        let ordering = compare_by(a, b, field);
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
    sorted
}

/// Fields a collection can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupField {
    /// Group by status name.
    Status,
    /// Group by priority name.
    Priority,
    /// Group by completion flag (`"true"` / `"false"`).
    Complete,
    /// Group by due day (`YYYY-MM-DD`, or `"none"` without a due date).
    DueDate,
}

fn group_key(todo: &Todo, field: GroupField) -> String {
    match field {
        GroupField::Status => todo.status().as_str().to_string(),
        GroupField::Priority => todo.priority().as_str().to_string(),
        GroupField::Complete => todo.complete().to_string(),
        GroupField::DueDate => todo
            .due_date()
            .map_or_else(|| "none".to_string(), |due| due.format("%Y-%m-%d").to_string()),
    }
}

/// Group todos by a field value; each sub-list preserves input order.
#[must_use]
pub fn group_todos(todos: &[Todo], field: GroupField) -> BTreeMap<String, Vec<Todo>> {
    let mut groups: BTreeMap<String, Vec<Todo>> = BTreeMap::new();
    for todo in todos {
        groups.entry(group_key(todo, field)).or_default().push(todo.clone());
    }
    groups
}

/// Aggregate counts over a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoStats {
    /// Number of items.
    pub total: usize,
    /// Items with `complete == true`.
    pub completed: usize,
    /// Items not complete (`total - completed`).
    pub pending: usize,
    /// Items past their due date and not complete.
    pub overdue: usize,
    /// Count per status, zero-filled over every variant.
    pub by_status: BTreeMap<Status, usize>,
    /// Count per priority, zero-filled over every variant.
    pub by_priority: BTreeMap<Priority, usize>,
}

/// Compute aggregate statistics for a collection.
#[must_use]
pub fn statistics(todos: &[Todo], now: DateTime<Utc>) -> TodoStats {
    let mut by_status: BTreeMap<Status, usize> =
        Status::ALL.iter().map(|status| (*status, 0)).collect();
    let mut by_priority: BTreeMap<Priority, usize> =
        Priority::ALL.iter().map(|priority| (*priority, 0)).collect();

    let mut completed = 0;
    let mut overdue = 0;
    for todo in todos {
        if todo.complete() {
            completed += 1;
        }
        if todo.is_overdue(now) {
            overdue += 1;
        }
        *by_status.entry(todo.status()).or_default() += 1;
        *by_priority.entry(todo.priority()).or_default() += 1;
    }

    TodoStats {
        total: todos.len(),
        completed,
        pending: todos.len() - completed,
        overdue,
        by_status,
        by_priority,
    }
}
