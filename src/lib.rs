//! # `todo_core`
//!
//! An embeddable task-tracking core: entity model, pure query
//! utilities, and a stateful service persisting to a durable key-value
//! blob store.

pub mod error;
pub mod storage;
pub mod todo;

pub use error::{Error, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }
}
