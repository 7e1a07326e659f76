use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use super::{CommitSequence, Committed, OnCommit, RepositoryError};
use crate::access::{Actor, ActorDirectory, UserId};
use crate::clock::Clock;
use crate::notifications::{NotificationError, NotificationIntent, NotificationSink};
use crate::workflows::mentorship::domain::{
    AdmissionCommit, Application, ApplicationChange, ApplicationId, MentorshipProgram, ProgramId,
    ProgramUpdate, SeatChange,
};
use crate::workflows::mentorship::repository::{AdmissionRepository, AdmissionStoreError};
use crate::workflows::moderation::domain::{EntityId, EntityKind, EntityRecord};
use crate::workflows::moderation::repository::EntityRepository;

fn poisoned(what: &str) -> RepositoryError {
    RepositoryError::Unavailable(format!("{what} lock poisoned"))
}

/// Entity store keeping every record behind one lock; writes are version-checked.
#[derive(Debug, Default)]
pub struct MemoryEntityStore {
    records: RwLock<HashMap<EntityId, EntityRecord>>,
    sequence: CommitSequence,
}

impl MemoryEntityStore {
    pub fn with_sequence(sequence: CommitSequence) -> Self {
        Self {
            records: RwLock::default(),
            sequence,
        }
    }
}

impl EntityRepository for MemoryEntityStore {
    fn insert(&self, record: EntityRecord) -> Result<EntityRecord, RepositoryError> {
        let mut records = self.records.write().map_err(|_| poisoned("entity"))?;
        if records.contains_key(&record.id) {
            return Err(RepositoryError::AlreadyExists);
        }
        records.insert(record.id, record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &EntityId) -> Result<Option<EntityRecord>, RepositoryError> {
        let records = self.records.read().map_err(|_| poisoned("entity"))?;
        Ok(records.get(id).cloned())
    }

    fn compare_and_swap(
        &self,
        record: EntityRecord,
        expected_version: u64,
        on_commit: OnCommit<'_, EntityRecord>,
    ) -> Result<Committed<EntityRecord>, RepositoryError> {
        let mut records = self.records.write().map_err(|_| poisoned("entity"))?;
        let current = records.get(&record.id).ok_or(RepositoryError::NotFound)?;
        if current.version != expected_version {
            return Err(RepositoryError::VersionMismatch {
                expected: expected_version,
                found: current.version,
            });
        }
        Ok(self.sequence.commit(|sequence| {
            records.insert(record.id, record.clone());
            let committed = Committed {
                value: record,
                sequence,
            };
            on_commit(&committed);
            committed
        }))
    }

    fn list(&self, kind: EntityKind) -> Result<Vec<EntityRecord>, RepositoryError> {
        let records = self.records.read().map_err(|_| poisoned("entity"))?;
        Ok(records
            .values()
            .filter(|record| record.kind == kind)
            .cloned()
            .collect())
    }
}

/// A program together with every application filed against it. One mutex per shard
/// serializes all writes that touch the program's seat counter.
#[derive(Debug)]
struct ProgramShard {
    program: MentorshipProgram,
    applications: HashMap<ApplicationId, Application>,
}

/// Admission store sharded by program so unrelated programs never contend.
#[derive(Debug, Default)]
pub struct MemoryAdmissionStore {
    shards: RwLock<HashMap<ProgramId, Arc<Mutex<ProgramShard>>>>,
    index: RwLock<HashMap<ApplicationId, ProgramId>>,
    sequence: CommitSequence,
}

impl MemoryAdmissionStore {
    pub fn with_sequence(sequence: CommitSequence) -> Self {
        Self {
            shards: RwLock::default(),
            index: RwLock::default(),
            sequence,
        }
    }

    fn shard(&self, id: &ProgramId) -> Result<Option<Arc<Mutex<ProgramShard>>>, RepositoryError> {
        let shards = self.shards.read().map_err(|_| poisoned("program index"))?;
        Ok(shards.get(id).cloned())
    }

    fn program_of(&self, id: &ApplicationId) -> Result<Option<ProgramId>, RepositoryError> {
        let index = self.index.read().map_err(|_| poisoned("application index"))?;
        Ok(index.get(id).copied())
    }

    fn lock(shard: &Mutex<ProgramShard>) -> Result<MutexGuard<'_, ProgramShard>, RepositoryError> {
        shard.lock().map_err(|_| poisoned("program"))
    }
}

impl AdmissionRepository for MemoryAdmissionStore {
    fn insert_program(
        &self,
        program: MentorshipProgram,
    ) -> Result<MentorshipProgram, AdmissionStoreError> {
        if program.current_participants() != 0 {
            return Err(AdmissionStoreError::Invalid(format!(
                "program {} already holds {} participants",
                program.id,
                program.current_participants()
            )));
        }
        let mut shards = self.shards.write().map_err(|_| poisoned("program index"))?;
        if shards.contains_key(&program.id) {
            return Err(RepositoryError::AlreadyExists.into());
        }
        shards.insert(
            program.id,
            Arc::new(Mutex::new(ProgramShard {
                program: program.clone(),
                applications: HashMap::new(),
            })),
        );
        Ok(program)
    }

    fn fetch_program(&self, id: &ProgramId) -> Result<Option<MentorshipProgram>, RepositoryError> {
        let Some(shard) = self.shard(id)? else {
            return Ok(None);
        };
        let guard = Self::lock(&shard)?;
        Ok(Some(guard.program.clone()))
    }

    fn update_program(
        &self,
        id: &ProgramId,
        update: &ProgramUpdate,
        clock: &dyn Clock,
    ) -> Result<MentorshipProgram, AdmissionStoreError> {
        let shard = self.shard(id)?.ok_or(RepositoryError::NotFound)?;
        let mut guard = Self::lock(&shard)?;
        let mut draft = guard.program.clone();
        update.apply(&mut draft, clock.now())?;
        guard.program = draft.clone();
        Ok(draft)
    }

    fn insert_application(
        &self,
        program_id: &ProgramId,
        applicant_id: &UserId,
        clock: &dyn Clock,
    ) -> Result<Application, AdmissionStoreError> {
        let shard = self.shard(program_id)?.ok_or(RepositoryError::NotFound)?;
        let mut guard = Self::lock(&shard)?;

        let duplicate = guard
            .applications
            .values()
            .any(|existing| &existing.applicant_id == applicant_id && existing.status.is_open());
        if duplicate {
            return Err(AdmissionStoreError::Duplicate);
        }
        let now = clock.now();
        guard.program.check_open(now)?;

        let application = Application::submitted(*program_id, applicant_id.clone(), now);

        let mut index = self
            .index
            .write()
            .map_err(|_| poisoned("application index"))?;
        if index.contains_key(&application.id) {
            return Err(RepositoryError::AlreadyExists.into());
        }
        index.insert(application.id, application.program_id);
        guard
            .applications
            .insert(application.id, application.clone());
        Ok(application)
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        let Some(program_id) = self.program_of(id)? else {
            return Ok(None);
        };
        let shard = self.shard(&program_id)?.ok_or(RepositoryError::NotFound)?;
        let guard = Self::lock(&shard)?;
        Ok(guard.applications.get(id).cloned())
    }

    fn applications_for(
        &self,
        program_id: &ProgramId,
    ) -> Result<Vec<Application>, RepositoryError> {
        let shard = self.shard(program_id)?.ok_or(RepositoryError::NotFound)?;
        let guard = Self::lock(&shard)?;
        let mut applications: Vec<_> = guard.applications.values().cloned().collect();
        applications.sort_by_key(|application| (application.submitted_at, application.id));
        Ok(applications)
    }

    fn commit(
        &self,
        change: ApplicationChange,
        clock: &dyn Clock,
        on_commit: OnCommit<'_, AdmissionCommit>,
    ) -> Result<Committed<AdmissionCommit>, AdmissionStoreError> {
        let ApplicationChange {
            current,
            to,
            actor_id,
            seat,
        } = change;

        let shard = self
            .shard(&current.program_id)?
            .ok_or(RepositoryError::NotFound)?;
        let mut guard = Self::lock(&shard)?;

        let found = guard
            .applications
            .get(&current.id)
            .map(|stored| stored.version)
            .ok_or(RepositoryError::NotFound)?;
        if found != current.version {
            return Err(RepositoryError::VersionMismatch {
                expected: current.version,
                found,
            }
            .into());
        }

        let at = clock.now();
        // a refused claim must leave the shard untouched
        let mut program = guard.program.clone();
        match seat {
            SeatChange::Claim => program.claim_seat(at)?,
            SeatChange::Release => program.release_seat(at),
            SeatChange::Keep => {}
        }
        let application = current.advanced(to, &actor_id, at);

        Ok(self.sequence.commit(|sequence| {
            guard.program = program.clone();
            guard
                .applications
                .insert(application.id, application.clone());
            let committed = Committed {
                value: AdmissionCommit {
                    application,
                    program,
                },
                sequence,
            };
            on_commit(&committed);
            committed
        }))
    }
}

/// Notification sink that buffers intents for external pollers.
#[derive(Debug, Default)]
pub struct MemoryOutbox {
    intents: Mutex<Vec<NotificationIntent>>,
}

impl MemoryOutbox {
    fn sorted(mut intents: Vec<NotificationIntent>) -> Vec<NotificationIntent> {
        intents.sort_by_key(|intent| intent.sequence);
        intents
    }

    /// Snapshot of buffered intents in commit order.
    pub fn pending(&self) -> Vec<NotificationIntent> {
        match self.intents.lock() {
            Ok(intents) => Self::sorted(intents.clone()),
            Err(poison) => Self::sorted(poison.into_inner().clone()),
        }
    }

    /// Remove and return every buffered intent in commit order.
    pub fn drain(&self) -> Vec<NotificationIntent> {
        let mut intents = match self.intents.lock() {
            Ok(intents) => intents,
            Err(poison) => poison.into_inner(),
        };
        Self::sorted(std::mem::take(&mut *intents))
    }
}

impl NotificationSink for MemoryOutbox {
    fn publish(&self, intent: NotificationIntent) -> Result<(), NotificationError> {
        let mut intents = self
            .intents
            .lock()
            .map_err(|_| NotificationError::Transport("outbox lock poisoned".to_string()))?;
        intents.push(intent);
        Ok(())
    }
}

/// Static identity directory, standing in for the external auth collaborator.
#[derive(Debug, Default)]
pub struct MemoryActorDirectory {
    actors: RwLock<HashMap<UserId, Actor>>,
}

impl MemoryActorDirectory {
    pub fn with_actors(actors: impl IntoIterator<Item = Actor>) -> Self {
        let directory = Self::default();
        for actor in actors {
            directory.register(actor);
        }
        directory
    }

    pub fn register(&self, actor: Actor) {
        let mut actors = match self.actors.write() {
            Ok(actors) => actors,
            Err(poison) => poison.into_inner(),
        };
        actors.insert(actor.id.clone(), actor);
    }
}

impl ActorDirectory for MemoryActorDirectory {
    fn resolve(&self, id: &UserId) -> Result<Option<Actor>, RepositoryError> {
        let actors = self.actors.read().map_err(|_| poisoned("directory"))?;
        Ok(actors.get(id).cloned())
    }
}
