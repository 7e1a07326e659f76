use serde::Serialize;

use super::domain::{EntityId, EntityKind, EntityRecord, ModerationStatus};
use crate::store::{Committed, OnCommit, RepositoryError};

/// Entity Store contract. Writes after insertion go through `compare_and_swap` so
/// conflicting transitions on one entity are linearized by version.
pub trait EntityRepository: Send + Sync {
    fn insert(&self, record: EntityRecord) -> Result<EntityRecord, RepositoryError>;
    fn fetch(&self, id: &EntityId) -> Result<Option<EntityRecord>, RepositoryError>;
    /// Replace the stored record only if its version still equals `expected_version`.
    /// `on_commit` runs before the write lock is released.
    fn compare_and_swap(
        &self,
        record: EntityRecord,
        expected_version: u64,
        on_commit: OnCommit<'_, EntityRecord>,
    ) -> Result<Committed<EntityRecord>, RepositoryError>;
    fn list(&self, kind: EntityKind) -> Result<Vec<EntityRecord>, RepositoryError>;
}

/// Sanitized representation of an entity's exposed moderation state.
#[derive(Debug, Clone, Serialize)]
pub struct EntityStatusView {
    pub id: EntityId,
    pub kind: EntityKind,
    pub status: ModerationStatus,
    pub previous_status: Option<ModerationStatus>,
    pub version: u64,
}

impl EntityRecord {
    pub fn status_view(&self) -> EntityStatusView {
        EntityStatusView {
            id: self.id,
            kind: self.kind,
            status: self.status,
            previous_status: self.history.last().map(|change| change.from),
            version: self.version,
        }
    }
}
