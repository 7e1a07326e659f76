use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use crate::access::{Actor, Role, UserId};
use crate::clock::FixedClock;
use crate::store::{
    Committed, MemoryActorDirectory, MemoryEntityStore, MemoryOutbox, OnCommit, RepositoryError,
};
use crate::workflows::moderation::domain::{EntityId, EntityKind, EntityRecord};
use crate::workflows::moderation::repository::EntityRepository;
use crate::workflows::moderation::{moderation_router, ModerationService, TransitionTable};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn directory() -> MemoryActorDirectory {
    MemoryActorDirectory::with_actors([
        Actor::new("admin-1", Role::Admin, None),
        Actor::new("north-admin", Role::ChapterAdmin, Some("north")),
        Actor::new("south-admin", Role::ChapterAdmin, Some("south")),
        Actor::new("mentor-1", Role::Mentor, Some("north")),
        Actor::new("member-1", Role::Member, Some("north")),
        Actor::new("member-2", Role::Member, Some("south")),
        Actor::new("drifter", Role::Member, None),
    ])
}

pub(super) fn uid(raw: &str) -> UserId {
    UserId::new(raw)
}

pub(super) type MemoryModeration = ModerationService<MemoryEntityStore, MemoryOutbox>;

pub(super) fn build_service_with(
    table: TransitionTable,
) -> (MemoryModeration, Arc<MemoryEntityStore>, Arc<MemoryOutbox>) {
    let repository = Arc::new(MemoryEntityStore::default());
    let outbox = Arc::new(MemoryOutbox::default());
    let service = ModerationService::new(
        repository.clone(),
        Arc::new(directory()),
        outbox.clone(),
        Arc::new(table),
    )
    .with_clock(Arc::new(FixedClock(now())));
    (service, repository, outbox)
}

pub(super) fn build_service() -> (MemoryModeration, Arc<MemoryEntityStore>, Arc<MemoryOutbox>) {
    build_service_with(TransitionTable::standard())
}

pub(super) fn resource_payload(title: &str) -> Value {
    json!({
        "title": title,
        "author": "Ada Lovelace",
        "category": "careers",
        "type": "guide",
    })
}

pub(super) fn blog_payload(title: &str, tags: &[&str]) -> Value {
    json!({
        "title": title,
        "author": "Grace Hopper",
        "excerpt": "Notes from the last chapter meetup",
        "category": "events",
        "tags": tags,
    })
}

pub(super) fn mentorship_payload(focus: &str) -> Value {
    json!({
        "title": "Backend pairing",
        "mentor_name": "Linus",
        "mentee_name": "Margaret",
        "focus_area": focus,
    })
}

/// Entity store that is never reachable.
pub(super) struct UnavailableStore;

impl EntityRepository for UnavailableStore {
    fn insert(&self, _record: EntityRecord) -> Result<EntityRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &EntityId) -> Result<Option<EntityRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn compare_and_swap(
        &self,
        _record: EntityRecord,
        _expected_version: u64,
        _on_commit: OnCommit<'_, EntityRecord>,
    ) -> Result<Committed<EntityRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _kind: EntityKind) -> Result<Vec<EntityRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Entity store whose writes always lose the version race.
pub(super) struct RacingStore {
    pub(super) inner: MemoryEntityStore,
}

impl EntityRepository for RacingStore {
    fn insert(&self, record: EntityRecord) -> Result<EntityRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn fetch(&self, id: &EntityId) -> Result<Option<EntityRecord>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn compare_and_swap(
        &self,
        _record: EntityRecord,
        expected_version: u64,
        _on_commit: OnCommit<'_, EntityRecord>,
    ) -> Result<Committed<EntityRecord>, RepositoryError> {
        Err(RepositoryError::VersionMismatch {
            expected: expected_version,
            found: expected_version + 1,
        })
    }

    fn list(&self, kind: EntityKind) -> Result<Vec<EntityRecord>, RepositoryError> {
        self.inner.list(kind)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service(service: MemoryModeration) -> axum::Router {
    moderation_router(Arc::new(service))
}
