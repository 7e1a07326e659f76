use alumni_hub::access::{Actor, AuthorizationGate, Role};
use alumni_hub::clock::Clock;
use alumni_hub::config::ModerationConfig;
use alumni_hub::store::{
    CommitSequence, MemoryActorDirectory, MemoryAdmissionStore, MemoryEntityStore, MemoryOutbox,
};
use alumni_hub::workflows::mentorship::AdmissionController;
use alumni_hub::workflows::moderation::ModerationService;
use chrono::{DateTime, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type Moderation = ModerationService<MemoryEntityStore, MemoryOutbox>;
pub(crate) type Admissions = AdmissionController<MemoryAdmissionStore, MemoryOutbox>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) outbox: Arc<MemoryOutbox>,
}

/// In-memory stores wired to one commit sequence and one outbox.
pub(crate) struct Backends {
    pub(crate) entities: Arc<MemoryEntityStore>,
    pub(crate) admissions: Arc<MemoryAdmissionStore>,
    pub(crate) outbox: Arc<MemoryOutbox>,
    pub(crate) directory: Arc<MemoryActorDirectory>,
    pub(crate) sequence: CommitSequence,
}

impl Backends {
    pub(crate) fn in_memory(actors: Vec<Actor>) -> Self {
        let sequence = CommitSequence::new();
        Self {
            entities: Arc::new(MemoryEntityStore::with_sequence(sequence.clone())),
            admissions: Arc::new(MemoryAdmissionStore::with_sequence(sequence.clone())),
            outbox: Arc::new(MemoryOutbox::default()),
            directory: Arc::new(MemoryActorDirectory::with_actors(actors)),
            sequence,
        }
    }

    pub(crate) fn services(
        &self,
        policy: &ModerationConfig,
        clock: Arc<dyn Clock>,
    ) -> (Arc<Moderation>, Arc<Admissions>) {
        let table = Arc::new(policy.transition_table());
        let moderation = ModerationService::new(
            self.entities.clone(),
            self.directory.clone(),
            self.outbox.clone(),
            table.clone(),
        )
        .with_clock(clock.clone());
        let admissions = AdmissionController::new(
            self.admissions.clone(),
            self.directory.clone(),
            self.outbox.clone(),
            AuthorizationGate::new(table),
        )
        .with_clock(clock);
        (Arc::new(moderation), Arc::new(admissions))
    }
}

/// Fixed roster used until an identity provider is wired in.
pub(crate) fn seed_actors() -> Vec<Actor> {
    vec![
        Actor::new("admin", Role::Admin, None),
        Actor::new("lagos-admin", Role::ChapterAdmin, Some("lagos")),
        Actor::new("nairobi-admin", Role::ChapterAdmin, Some("nairobi")),
        Actor::new("amara", Role::Mentor, Some("lagos")),
        Actor::new("kofi", Role::Mentor, Some("nairobi")),
        Actor::new("chidi", Role::Member, Some("lagos")),
        Actor::new("zainab", Role::Member, Some("lagos")),
        Actor::new("tunde", Role::Member, Some("lagos")),
        Actor::new("wanjiru", Role::Member, Some("nairobi")),
    ]
}

pub(crate) fn parse_date(raw: &str) -> Result<DateTime<Utc>, String> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))?;
    date.and_hms_opt(12, 0, 0)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("'{raw}' has no midday instant"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alumni_hub::access::{ActorDirectory, UserId};
    use chrono::Datelike;

    #[test]
    fn parse_date_accepts_iso_dates() {
        let parsed = parse_date(" 2025-09-24 ").expect("valid date");
        assert_eq!((parsed.year(), parsed.month(), parsed.day()), (2025, 9, 24));
        assert!(parse_date("24/09/2025").is_err());
    }

    #[test]
    fn seeded_directory_resolves_roster() {
        let backends = Backends::in_memory(seed_actors());
        let actor = backends
            .directory
            .resolve(&UserId::new("lagos-admin"))
            .expect("directory available")
            .expect("seeded");
        assert_eq!(actor.role, Role::ChapterAdmin);
        assert_eq!(backends.sequence.last(), 0);
    }
}
