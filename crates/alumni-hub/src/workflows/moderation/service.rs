use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use super::domain::{EntityId, EntityKind, EntityRecord, ModerationStatus};
use super::projection::{project, QueryFilters};
use super::repository::EntityRepository;
use super::transitions::TransitionTable;
use crate::access::{Actor, ActorDirectory, AuthorizationGate, ChapterScope, Role, UserId};
use crate::clock::{Clock, SystemClock};
use crate::notifications::{
    Channel, IntentSubject, NotificationEmitter, NotificationIntent, NotificationSink,
};
use crate::store::{Committed, RepositoryError};
use crate::workflows::error::WorkflowError;

/// Generic approval state machine shared by every moderatable entity kind.
pub struct ModerationService<R, N> {
    repository: Arc<R>,
    directory: Arc<dyn ActorDirectory>,
    gate: AuthorizationGate,
    notifications: NotificationEmitter<N>,
    clock: Arc<dyn Clock>,
}

impl<R, N> ModerationService<R, N>
where
    R: EntityRepository + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(
        repository: Arc<R>,
        directory: Arc<dyn ActorDirectory>,
        sink: Arc<N>,
        table: Arc<TransitionTable>,
    ) -> Self {
        Self {
            repository,
            directory,
            gate: AuthorizationGate::new(table),
            notifications: NotificationEmitter::new(sink),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn gate(&self) -> &AuthorizationGate {
        &self.gate
    }

    fn resolve(&self, actor_id: &UserId) -> Result<Actor, WorkflowError> {
        self.directory
            .resolve(actor_id)?
            .ok_or(WorkflowError::Forbidden)
    }

    fn load(&self, kind: EntityKind, id: &EntityId) -> Result<EntityRecord, WorkflowError> {
        self.repository
            .fetch(id)?
            .filter(|record| record.kind == kind)
            .ok_or_else(|| WorkflowError::NotFound(format!("{kind} {id}")))
    }

    /// Create a new `pending` entity owned by the submitting actor.
    pub fn submit(
        &self,
        kind: EntityKind,
        actor_id: &UserId,
        chapter_scope: Option<ChapterScope>,
        payload: Value,
    ) -> Result<EntityRecord, WorkflowError> {
        let actor = self.resolve(actor_id)?;
        if !payload.is_object() {
            return Err(WorkflowError::Invalid(
                "payload must be a JSON object".to_string(),
            ));
        }

        let scope = chapter_scope.or_else(|| actor.chapter.clone());
        if actor.role != Role::Admin && scope.is_some() && scope != actor.chapter {
            return Err(WorkflowError::Forbidden);
        }

        let record = EntityRecord::pending(kind, actor.id.clone(), scope, payload, self.clock.now());
        let stored = self.repository.insert(record)?;
        info!(%kind, id = %stored.id, owner = %stored.owner_id, "entity submitted for moderation");
        Ok(stored)
    }

    /// Move an entity to `to`, enforcing authorization and the kind's transition table.
    /// The notification intent is recorded inside the store's commit critical section.
    pub fn transition(
        &self,
        kind: EntityKind,
        id: &EntityId,
        actor_id: &UserId,
        to: ModerationStatus,
    ) -> Result<EntityRecord, WorkflowError> {
        let record = self.load(kind, id)?;
        let actor = self.resolve(actor_id)?;
        let from = record.status;

        if !self.gate.can_view(&actor, &record) {
            return Err(WorkflowError::NotFound(format!("{kind} {id}")));
        }
        if !self.gate.can_transition(&actor, &record, from, to) {
            return Err(WorkflowError::Forbidden);
        }
        if !self.gate.table().permits(kind, from, to) {
            return Err(WorkflowError::IllegalTransition {
                kind: kind.label().to_string(),
                from: from.label().to_string(),
                to: to.label().to_string(),
            });
        }

        let now = self.clock.now();
        let next = record.advanced(to, &actor.id, now);
        let announce = |committed: &Committed<EntityRecord>| {
            self.notifications.record(NotificationIntent {
                sequence: committed.sequence,
                template: format!("{}_{}", kind.label(), to.label()),
                subject: IntentSubject::Entity { kind, id: *id },
                old_status: from.label().to_string(),
                new_status: to.label().to_string(),
                actor_id: actor.id.clone(),
                recipients: vec![committed.value.owner_id.clone()],
                channels: vec![Channel::Email, Channel::Toast],
                recorded_at: now,
            });
        };
        let committed = self
            .repository
            .compare_and_swap(next, record.version, &announce)
            .map_err(|err| match err {
                RepositoryError::NotFound => WorkflowError::NotFound(format!("{kind} {id}")),
                other => WorkflowError::from(other),
            })?;

        info!(
            %kind,
            %id,
            %from,
            %to,
            actor = %actor.id,
            sequence = committed.sequence,
            "moderation transition committed"
        );
        Ok(committed.value)
    }

    pub fn get(
        &self,
        kind: EntityKind,
        id: &EntityId,
        actor_id: &UserId,
    ) -> Result<EntityRecord, WorkflowError> {
        let actor = self.resolve(actor_id)?;
        let record = self.load(kind, id)?;
        if !self.gate.can_view(&actor, &record) {
            // invisible records are reported as missing
            return Err(WorkflowError::NotFound(format!("{kind} {id}")));
        }
        Ok(record)
    }

    /// Role-scoped, read-only query over one entity kind.
    pub fn query(
        &self,
        kind: EntityKind,
        actor_id: &UserId,
        filters: &QueryFilters,
    ) -> Result<Vec<EntityRecord>, WorkflowError> {
        let actor = self.resolve(actor_id)?;
        let records = self.repository.list(kind)?;
        let visible = project(records, kind, &actor, &self.gate, filters);
        debug!(%kind, actor = %actor.id, results = visible.len(), "moderation query");
        Ok(visible)
    }
}
