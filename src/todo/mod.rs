//! Task-tracking core.
//!
//! This module provides the todo entity, the pure query utilities over
//! collections of todos, and the stateful service that owns the
//! canonical collection and persists it to a durable blob store:
//! - Todos with text, description, priority, status, due date, and tags
//! - Validation that reports every violated constraint at once
//! - Filtering, sorting, grouping, and aggregate statistics
//! - CRUD plus bulk operations, each ending in a single commit
//! - Export/import, backup/restore, and integrity repair
//!
//! # Example
//!
//! ```no_run
//! use todo_core::storage::SqliteBlobStore;
//! use todo_core::todo::{Priority, TodoService};
//!
//! let store = SqliteBlobStore::new("/tmp/todos.sqlite3").unwrap();
//! let mut service = TodoService::new(Box::new(store));
//!
//! // Create a couple of todos
//! let todo = service.add("Buy milk").unwrap();
//! service.add_with_priority("File taxes", Priority::High).unwrap();
//!
//! // Complete one and look at the numbers
//! service.toggle(todo.id()).unwrap();
//! let stats = service.stats();
//! assert_eq!(stats.completed, 1);
//! ```

pub mod id;
pub mod models;
pub mod query;
pub mod service;
pub mod validate;

pub use id::{IdGenerator, RandomIdGenerator, SequentialIdGenerator};
pub use models::{
    InvalidPriority, InvalidStatus, NewTodo, Priority, Status, Todo, TodoUpdate,
};
pub use query::{
    filter_todos, group_todos, sort_todos, statistics, GroupField, SortDirection, SortField,
    TodoFilter, TodoStats,
};
pub use service::{
    ChangeListener, Operation, OperationListener, ServiceConfig, Snapshot, TodoService,
};
pub use validate::{ValidationErrors, ValidationIssue};
