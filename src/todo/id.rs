//! Unique id generation for todo items.
//!
//! Ids are opaque strings assigned once at creation. The generator is a
//! capability owned by the service, so tests can swap in a deterministic
//! implementation without touching global state.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};

/// Capability for producing unique todo ids.
pub trait IdGenerator {
    /// Produce the next id. Ids must never repeat within a session.
    fn next_id(&mut self) -> String;
}

/// Default generator: non-deterministic, unique within a session.
///
/// Each id hashes a per-call random state together with the clock and a
/// call counter, so even calls within the same nanosecond differ.
#[derive(Debug, Default)]
pub struct RandomIdGenerator {
    counter: u64,
}

impl RandomIdGenerator {
    /// Create a new generator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for RandomIdGenerator {
    fn next_id(&mut self) -> String {
        self.counter += 1;
        let state = RandomState::new();
        let mut hasher = state.build_hasher();
        hasher.write_u64(
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map_or(0, |d| u64::try_from(d.as_nanos() & u128::from(u64::MAX)).unwrap_or(0)),
        );
        hasher.write_u64(self.counter);
        format!("todo-{:016x}", hasher.finish())
    }
}

/// Deterministic generator for tests: a prefix plus a counter.
#[derive(Debug, Clone)]
pub struct SequentialIdGenerator {
    prefix: String,
    counter: u64,
}

impl SequentialIdGenerator {
    /// Create a generator producing `todo-0001`, `todo-0002`, ...
    #[must_use]
    pub fn new() -> Self {
        Self::with_prefix("todo")
    }

    /// Create a generator with a custom prefix.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), counter: 0 }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self) -> String {
        self.counter += 1;
        format!("{}-{:04}", self.prefix, self.counter)
    }
}
