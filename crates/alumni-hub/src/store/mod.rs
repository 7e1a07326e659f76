//! Persistence contract shared by both workflows, plus in-memory backends.

pub mod memory;

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

pub use memory::{MemoryActorDirectory, MemoryAdmissionStore, MemoryEntityStore, MemoryOutbox};

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    AlreadyExists,
    #[error("record not found")]
    NotFound,
    #[error("record was modified concurrently (expected version {expected}, found {found})")]
    VersionMismatch { expected: u64, found: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Commit counter shared by every store so notification intents reach pollers in the
/// order their transitions were committed.
#[derive(Debug, Clone, Default)]
pub struct CommitSequence(Arc<Mutex<u64>>);

impl CommitSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `write` as the next numbered commit. No other commit is numbered until it
    /// returns, so whatever it publishes lands in sequence order. Call it while the
    /// committing store still holds its own write lock.
    pub fn commit<T>(&self, write: impl FnOnce(u64) -> T) -> T {
        let mut last = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        let sequence = *last + 1;
        let output = write(sequence);
        *last = sequence;
        output
    }

    pub fn last(&self) -> u64 {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A value that has been durably written, tagged with its commit sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Committed<T> {
    pub value: T,
    pub sequence: u64,
}

/// Hook a store runs inside its commit critical section, typically to publish the
/// notification intent for the write.
pub type OnCommit<'a, T> = &'a dyn Fn(&Committed<T>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commits_are_numbered_from_one() {
        let sequence = CommitSequence::new();
        assert_eq!(sequence.last(), 0);
        assert_eq!(sequence.commit(|number| number), 1);
        assert_eq!(sequence.commit(|number| number * 10), 20);
        assert_eq!(sequence.last(), 2);
    }

    #[test]
    fn clones_share_one_counter() {
        let sequence = CommitSequence::new();
        let other = sequence.clone();
        sequence.commit(|_| ());
        assert_eq!(other.commit(|number| number), 2);
    }
}
