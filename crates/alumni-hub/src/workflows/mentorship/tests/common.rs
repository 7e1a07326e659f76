use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::access::{Actor, AuthorizationGate, Role, UserId};
use crate::clock::FixedClock;
use crate::store::{MemoryActorDirectory, MemoryAdmissionStore, MemoryOutbox};
use crate::workflows::mentorship::domain::{Application, MentorshipProgram, NewProgram};
use crate::workflows::mentorship::{mentorship_router, AdmissionController};
use crate::workflows::moderation::TransitionTable;

pub(super) const APPLICANTS: usize = 24;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn uid(raw: &str) -> UserId {
    UserId::new(raw)
}

pub(super) fn applicant(index: usize) -> UserId {
    UserId::new(format!("member-{index}"))
}

pub(super) fn directory() -> Arc<MemoryActorDirectory> {
    let staff = [
        Actor::new("admin-1", Role::Admin, None),
        Actor::new("north-admin", Role::ChapterAdmin, Some("north")),
        Actor::new("south-admin", Role::ChapterAdmin, Some("south")),
        Actor::new("mentor-1", Role::Mentor, Some("north")),
        Actor::new("mentor-2", Role::Mentor, Some("north")),
    ];
    let members = (0..APPLICANTS)
        .map(|index| Actor::new(format!("member-{index}"), Role::Member, Some("north")));
    Arc::new(MemoryActorDirectory::with_actors(staff.into_iter().chain(members)))
}

pub(super) fn gate() -> AuthorizationGate {
    AuthorizationGate::new(Arc::new(TransitionTable::standard()))
}

pub(super) type MemoryAdmissions = AdmissionController<MemoryAdmissionStore, MemoryOutbox>;

pub(super) struct Harness {
    pub(super) controller: MemoryAdmissions,
    pub(super) store: Arc<MemoryAdmissionStore>,
    pub(super) outbox: Arc<MemoryOutbox>,
    pub(super) directory: Arc<MemoryActorDirectory>,
}

impl Harness {
    pub(super) fn new() -> Self {
        let store = Arc::new(MemoryAdmissionStore::default());
        let outbox = Arc::new(MemoryOutbox::default());
        let directory = directory();
        let controller = Self::controller_at(&store, &outbox, &directory, now());
        Self {
            controller,
            store,
            outbox,
            directory,
        }
    }

    /// A second controller over the same store whose clock reads `at`.
    pub(super) fn at(&self, at: DateTime<Utc>) -> MemoryAdmissions {
        Self::controller_at(&self.store, &self.outbox, &self.directory, at)
    }

    fn controller_at(
        store: &Arc<MemoryAdmissionStore>,
        outbox: &Arc<MemoryOutbox>,
        directory: &Arc<MemoryActorDirectory>,
        at: DateTime<Utc>,
    ) -> MemoryAdmissions {
        AdmissionController::new(store.clone(), directory.clone(), outbox.clone(), gate())
            .with_clock(Arc::new(FixedClock(at)))
    }

    pub(super) fn program(&self, max_participants: u32) -> MentorshipProgram {
        self.controller
            .create_program(&uid("mentor-1"), new_program(max_participants))
            .expect("program created")
    }

    pub(super) fn apply_many(&self, program: &MentorshipProgram, count: usize) -> Vec<Application> {
        (0..count)
            .map(|index| {
                self.controller
                    .submit_application(&program.id, &applicant(index))
                    .expect("application accepted")
            })
            .collect()
    }
}

pub(super) fn new_program(max_participants: u32) -> NewProgram {
    NewProgram {
        title: "Backend engineering circle".to_string(),
        max_participants,
        application_deadline: Some(now() + Duration::days(7)),
        chapter_scope: None,
        mentor_id: None,
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_for(harness: Harness) -> axum::Router {
    mentorship_router(Arc::new(harness.controller))
}
