//! The stateful store/service that owns the todo collection.
//!
//! Every observable effect flows through here: CRUD and bulk operations
//! mutate the canonical collection, each accepted mutation ends in a
//! commit (replace the collection, persist it to the primary storage
//! slot, notify the change listener with a copy), and queries delegate
//! to the pure utilities in [`crate::todo::query`].

use crate::error::{Error, Result};
use crate::storage::BlobStore;
use crate::todo::id::{IdGenerator, RandomIdGenerator};
use crate::todo::models::{NewTodo, Priority, Status, Todo, TodoUpdate};
use crate::todo::query::{self, GroupField, SortDirection, SortField, TodoFilter, TodoStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Operation tag reported to the operation listener for each mutated item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// An item was appended to the collection.
    Add,
    /// An existing item was changed.
    Update,
    /// An item was removed from the collection.
    Delete,
}

impl Operation {
    /// Get the string representation of the operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Callback invoked after every commit with a copy of the collection.
pub type ChangeListener = Box<dyn FnMut(&[Todo])>;

/// Callback invoked once per mutated item with the operation tag.
pub type OperationListener = Box<dyn FnMut(Operation, &Todo)>;

/// Service configuration: storage slot keys and the snapshot version.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Key of the primary slot holding the serialized collection.
    pub primary_key: String,
    /// Key of the secondary slot holding the latest backup snapshot.
    pub backup_key: String,
    /// Version string stamped into export snapshots. Import does not
    /// check it.
    pub snapshot_version: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            primary_key: crate::storage::keys::TODOS.to_string(),
            backup_key: crate::storage::keys::BACKUP.to_string(),
            snapshot_version: "1.0".to_string(),
        }
    }
}

/// Versioned serialized form of the whole collection, used for
/// export, backup, import, and restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Snapshot format version.
    pub version: String,
    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,
    /// The items, in collection order.
    pub items: Vec<Todo>,
}

/// The stateful todo store.
///
/// Owns the canonical in-memory collection and the durable blob store.
/// Single-threaded and fully synchronous: every operation runs to
/// completion before returning, and listeners are invoked inline.
pub struct TodoService {
    todos: Vec<Todo>,
    store: Box<dyn BlobStore>,
    ids: Box<dyn IdGenerator>,
    config: ServiceConfig,
    on_change: Option<ChangeListener>,
    on_operation: Option<OperationListener>,
}

impl TodoService {
    /// Create a service over the given blob store with default id
    /// generation and configuration.
    ///
    /// Performs one load from the primary slot; on read failure or
    /// absence the service starts from an empty collection. The
    /// constructor never fails.
    #[must_use]
    pub fn new(store: Box<dyn BlobStore>) -> Self {
        Self::with_parts(store, Box::new(RandomIdGenerator::new()), ServiceConfig::default())
    }

    /// Create a service with an explicit id generator and configuration.
    #[must_use]
    pub fn with_parts(
        store: Box<dyn BlobStore>,
        ids: Box<dyn IdGenerator>,
        config: ServiceConfig,
    ) -> Self {
        let todos = match store.read(&config.primary_key) {
            Ok(Some(json)) => match serde_json::from_str::<Vec<Todo>>(&json) {
                Ok(todos) => todos,
                Err(error) => {
                    tracing::warn!(%error, "stored collection is unreadable, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(error) => {
                tracing::warn!(%error, "loading stored collection failed, starting empty");
                Vec::new()
            }
        };
        Self { todos, store, ids, config, on_change: None, on_operation: None }
    }

    // ========================================================================
    // Commit and notification
    // ========================================================================

    /// Replace the collection, persist it, and notify the change listener.
    fn commit(&mut self, todos: Vec<Todo>) -> Result<()> {
        self.todos = todos;
        let json = serde_json::to_string(&self.todos)?;
        self.store.write(&self.config.primary_key, &json).map_err(|error| match error {
            Error::Storage(_) => error,
            other => Error::storage(other),
        })?;
        self.notify_change();
        Ok(())
    }

    fn notify_change(&mut self) {
        if let Some(listener) = self.on_change.as_mut() {
            let copy = self.todos.clone();
            listener(&copy);
        }
    }

    fn notify_operation(&mut self, operation: Operation, todo: &Todo) {
        if let Some(listener) = self.on_operation.as_mut() {
            listener(operation, todo);
        }
    }

    /// Register the change listener. Re-registering overwrites the
    /// previous listener; there is a single slot, not a subscriber list.
    pub fn set_change_listener(&mut self, listener: ChangeListener) {
        self.on_change = Some(listener);
    }

    /// Register the per-item operation listener. Re-registering
    /// overwrites the previous listener.
    pub fn set_operation_listener(&mut self, listener: OperationListener) {
        self.on_operation = Some(listener);
    }

    // ========================================================================
    // CRUD
    // ========================================================================

    /// Create a todo with the given text and medium priority.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for invalid text and
    /// [`Error::Storage`] if the commit cannot be persisted.
    pub fn add(&mut self, text: &str) -> Result<Todo> {
        self.add_with_priority(text, Priority::default())
    }

    /// Create a todo with the given text and priority.
    ///
    /// # Errors
    ///
    /// Same as [`TodoService::add`].
    pub fn add_with_priority(&mut self, text: &str, priority: Priority) -> Result<Todo> {
        let input = NewTodo {
            text: text.to_string(),
            priority: Some(priority),
            ..NewTodo::default()
        };
        self.add_item(input)
    }

    /// Create a todo from a full input value.
    ///
    /// # Errors
    ///
    /// Same as [`TodoService::add`].
    pub fn add_item(&mut self, input: NewTodo) -> Result<Todo> {
        let now = Utc::now();
        let todo = Todo::create(self.ids.next_id(), input, now)?;
        let mut todos = self.todos.clone();
        todos.push(todo.clone());
        self.commit(todos)?;
        self.notify_operation(Operation::Add, &todo);
        Ok(todo)
    }

    /// Look up a todo by id. No side effects.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Todo> {
        self.todos.iter().find(|todo| todo.id() == id).cloned()
    }

    /// Apply a partial update to the todo with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the id is absent,
    /// [`Error::Validation`] if a touched field is invalid, and
    /// [`Error::Storage`] if the commit cannot be persisted.
    pub fn update(&mut self, id: &str, update: &TodoUpdate) -> Result<Todo> {
        let now = Utc::now();
        let index = self.position(id).ok_or_else(|| Error::NotFound(id.to_string()))?;
        let mut todos = self.todos.clone();
        todos[index].apply(update, now)?;
        let updated = todos[index].clone();
        self.commit(todos)?;
        self.notify_operation(Operation::Update, &updated);
        Ok(updated)
    }

    /// Remove the todo with the given id.
    ///
    /// Returns `false` without side effects (and without notifying any
    /// listener) if the id is absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the commit cannot be persisted.
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        let Some(index) = self.position(id) else {
            return Ok(false);
        };
        let mut todos = self.todos.clone();
        let removed = todos.remove(index);
        self.commit(todos)?;
        self.notify_operation(Operation::Delete, &removed);
        Ok(true)
    }

    /// Flip the completion flag, synchronizing `status` between Pending
    /// and Completed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the id is absent and
    /// [`Error::UnsupportedTransition`] for archived items, whose toggle
    /// behavior the state machine does not define.
    pub fn toggle(&mut self, id: &str) -> Result<Todo> {
        let current = self.get(id).ok_or_else(|| Error::NotFound(id.to_string()))?;
        if current.status() == Status::Archived {
            return Err(Error::UnsupportedTransition(format!(
                "cannot toggle archived todo {id}"
            )));
        }
        self.update(id, &toggle_update(&current))
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.todos.iter().position(|todo| todo.id() == id)
    }

    // ========================================================================
    // Bulk operations
    // ========================================================================

    /// Create one todo per text, skipping invalid entries.
    ///
    /// Each text is validated independently; invalid entries are logged
    /// and skipped so a single bad entry never blocks the batch. All
    /// accepted todos are persisted in one commit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the commit cannot be persisted.
    pub fn add_many<S: AsRef<str>>(&mut self, texts: &[S]) -> Result<Vec<Todo>> {
        let now = Utc::now();
        let mut todos = self.todos.clone();
        let mut accepted = Vec::new();
        for text in texts {
            let input = NewTodo::with_text(text.as_ref());
            match Todo::create(self.ids.next_id(), input, now) {
                Ok(todo) => {
                    todos.push(todo.clone());
                    accepted.push(todo);
                }
                Err(error) => {
                    tracing::warn!(%error, text = text.as_ref(), "skipping invalid entry in bulk add");
                }
            }
        }
        if accepted.is_empty() {
            return Ok(accepted);
        }
        self.commit(todos)?;
        for todo in &accepted {
            self.notify_operation(Operation::Add, todo);
        }
        Ok(accepted)
    }

    /// Remove every todo whose id is in `ids`, in one commit.
    ///
    /// Returns the number of todos removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the commit cannot be persisted.
    pub fn remove_many<S: AsRef<str>>(&mut self, ids: &[S]) -> Result<usize> {
        let targets: HashSet<&str> = ids.iter().map(AsRef::as_ref).collect();
        let (removed, retained): (Vec<Todo>, Vec<Todo>) =
            self.todos.iter().cloned().partition(|todo| targets.contains(todo.id()));
        if removed.is_empty() {
            return Ok(0);
        }
        self.commit(retained)?;
        for todo in &removed {
            self.notify_operation(Operation::Delete, todo);
        }
        Ok(removed.len())
    }

    /// Set the completion flag on every non-archived todo, with the
    /// toggle status synchronization, in one commit.
    ///
    /// Archived items are skipped since their toggle transition is
    /// undefined. Returns the number of todos touched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the commit cannot be persisted.
    pub fn toggle_all(&mut self, complete: bool) -> Result<usize> {
        let now = Utc::now();
        let update = TodoUpdate {
            complete: Some(complete),
            status: Some(if complete { Status::Completed } else { Status::Pending }),
            ..TodoUpdate::default()
        };
        let mut todos = self.todos.clone();
        let mut touched = Vec::new();
        for todo in &mut todos {
            if todo.status() == Status::Archived {
                continue;
            }
            todo.apply(&update, now)?;
            touched.push(todo.clone());
        }
        if touched.is_empty() {
            return Ok(0);
        }
        self.commit(todos)?;
        for todo in &touched {
            self.notify_operation(Operation::Update, todo);
        }
        Ok(touched.len())
    }

    /// Remove every complete todo in one commit.
    ///
    /// Returns the number of todos removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the commit cannot be persisted.
    pub fn clear_completed(&mut self) -> Result<usize> {
        let (removed, retained): (Vec<Todo>, Vec<Todo>) =
            self.todos.iter().cloned().partition(Todo::complete);
        if removed.is_empty() {
            return Ok(0);
        }
        self.commit(retained)?;
        for todo in &removed {
            self.notify_operation(Operation::Delete, todo);
        }
        Ok(removed.len())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// A copy of the whole collection, in insertion order.
    #[must_use]
    pub fn all(&self) -> Vec<Todo> {
        self.todos.clone()
    }

    /// Number of todos in the collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.todos.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    /// Todos matching the filter, in collection order.
    #[must_use]
    pub fn find(&self, filter: &TodoFilter) -> Vec<Todo> {
        query::filter_todos(&self.todos, filter)
    }

    /// Case-insensitive substring search over text, description, and tags.
    #[must_use]
    pub fn search(&self, text: &str) -> Vec<Todo> {
        self.find(&TodoFilter { search: Some(text.to_string()), ..TodoFilter::default() })
    }

    /// Todos with the given status.
    #[must_use]
    pub fn by_status(&self, status: Status) -> Vec<Todo> {
        self.find(&TodoFilter { status: Some(vec![status]), ..TodoFilter::default() })
    }

    /// Todos with the given priority.
    #[must_use]
    pub fn by_priority(&self, priority: Priority) -> Vec<Todo> {
        self.find(&TodoFilter { priority: Some(vec![priority]), ..TodoFilter::default() })
    }

    /// Incomplete todos whose due date has passed, as of now.
    #[must_use]
    pub fn overdue(&self) -> Vec<Todo> {
        let now = Utc::now();
        self.todos.iter().filter(|todo| todo.is_overdue(now)).cloned().collect()
    }

    /// Todos due on the current UTC calendar day.
    #[must_use]
    pub fn due_today(&self) -> Vec<Todo> {
        let today = Utc::now().date_naive();
        self.todos
            .iter()
            .filter(|todo| todo.due_date().is_some_and(|due| due.date_naive() == today))
            .cloned()
            .collect()
    }

    /// The collection sorted by a field; equal keys keep collection order.
    #[must_use]
    pub fn sorted(&self, field: SortField, direction: SortDirection) -> Vec<Todo> {
        query::sort_todos(&self.todos, field, direction)
    }

    /// The collection grouped by a field value.
    #[must_use]
    pub fn grouped(&self, field: GroupField) -> BTreeMap<String, Vec<Todo>> {
        query::group_todos(&self.todos, field)
    }

    /// Aggregate statistics, with overdue computed as of now.
    #[must_use]
    pub fn stats(&self) -> TodoStats {
        query::statistics(&self.todos, Utc::now())
    }

    // ========================================================================
    // Export / import / backup / restore
    // ========================================================================

    /// Take a versioned snapshot of the collection.
    #[must_use]
    pub fn export(&self) -> Snapshot {
        Snapshot {
            version: self.config.snapshot_version.clone(),
            timestamp: Utc::now(),
            items: self.todos.clone(),
        }
    }

    /// Import items from a serialized snapshot, appending them to the
    /// collection in one commit.
    ///
    /// Each item is validated; invalid ones are logged and dropped.
    /// The snapshot version is not checked. Returns the accepted count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] if the payload is not JSON or
    /// lacks a top-level `items` array, and [`Error::Storage`] if the
    /// commit cannot be persisted.
    pub fn import(&mut self, json: &str) -> Result<usize> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|error| Error::InvalidData(error.to_string()))?;
        let Some(items) = value.get("items").and_then(serde_json::Value::as_array) else {
            return Err(Error::InvalidData("missing top-level items array".to_string()));
        };

        let mut todos = self.todos.clone();
        let mut accepted = 0;
        for item in items {
            let todo = match serde_json::from_value::<Todo>(item.clone()) {
                Ok(todo) => todo,
                Err(error) => {
                    tracing::warn!(%error, "dropping unreadable item from import");
                    continue;
                }
            };
            if let Err(error) = todo.validate() {
                tracing::warn!(%error, id = todo.id(), "dropping invalid item from import");
                continue;
            }
            todos.push(todo);
            accepted += 1;
        }

        self.commit(todos)?;
        Ok(accepted)
    }

    /// Write an export snapshot to the backup slot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the backup cannot be persisted.
    pub fn backup(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.export())?;
        self.store.write(&self.config.backup_key, &json).map_err(|error| match error {
            Error::Storage(_) => error,
            other => Error::storage(other),
        })
    }

    /// Replace the collection with the contents of a serialized snapshot.
    ///
    /// Clears the current collection, then imports. Any failure along
    /// the way is caught and reported as `false`, never propagated.
    pub fn restore(&mut self, json: &str) -> bool {
        self.todos.clear();
        match self.import(json) {
            Ok(count) => {
                tracing::debug!(count, "restored collection from snapshot");
                true
            }
            Err(error) => {
                tracing::warn!(%error, "restore failed");
                false
            }
        }
    }

    /// Restore from the snapshot in the backup slot, if one exists.
    ///
    /// Reports `false` when the slot is empty or unreadable, like
    /// [`TodoService::restore`].
    pub fn restore_from_backup(&mut self) -> bool {
        match self.store.read(&self.config.backup_key) {
            Ok(Some(json)) => self.restore(&json),
            Ok(None) => {
                tracing::warn!("no backup snapshot to restore");
                false
            }
            Err(error) => {
                tracing::warn!(%error, "reading backup snapshot failed");
                false
            }
        }
    }

    // ========================================================================
    // Integrity
    // ========================================================================

    /// Ids of items currently failing validation.
    ///
    /// Items can only enter an invalid state through external data
    /// (a hand-edited blob, an old persisted collection), never through
    /// the service's own operations.
    #[must_use]
    pub fn validate_all(&self) -> Vec<String> {
        self.todos
            .iter()
            .filter(|todo| todo.validate().is_err())
            .map(|todo| todo.id().to_string())
            .collect()
    }

    /// Remove every item failing validation.
    ///
    /// Commits only if something was actually removed. Returns the
    /// removed count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the commit cannot be persisted.
    pub fn repair(&mut self) -> Result<usize> {
        let failing: HashSet<String> = self.validate_all().into_iter().collect();
        if failing.is_empty() {
            return Ok(0);
        }
        let retained: Vec<Todo> =
            self.todos.iter().filter(|todo| !failing.contains(todo.id())).cloned().collect();
        let removed = self.todos.len() - retained.len();
        self.commit(retained)?;
        Ok(removed)
    }
}

fn toggle_update(todo: &Todo) -> TodoUpdate {
    TodoUpdate {
        complete: Some(!todo.complete()),
        status: Some(if todo.complete() { Status::Pending } else { Status::Completed }),
        ..TodoUpdate::default()
    }
}
