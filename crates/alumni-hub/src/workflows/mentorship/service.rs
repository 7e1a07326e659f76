use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{
    AdmissionCommit, Application, ApplicationChange, ApplicationId, ApplicationStatus,
    MentorshipProgram, NewProgram, ProgramId, ProgramUpdate, SeatChange,
};
use super::repository::AdmissionRepository;
use crate::access::{Actor, ActorDirectory, AuthorizationGate, ProgramCapability, Role, UserId};
use crate::clock::{Clock, SystemClock};
use crate::notifications::{
    Channel, IntentSubject, NotificationEmitter, NotificationIntent, NotificationSink,
};
use crate::store::Committed;
use crate::workflows::error::WorkflowError;

/// Capacity- and deadline-aware admission for mentorship programs.
///
/// The participant counter is only ever changed by [`AdmissionController::admit`] and
/// [`AdmissionController::withdraw`], each of which hands a single [`ApplicationChange`]
/// to the repository so the status write and the counter move land together.
pub struct AdmissionController<R, N> {
    repository: Arc<R>,
    directory: Arc<dyn ActorDirectory>,
    gate: AuthorizationGate,
    notifications: NotificationEmitter<N>,
    clock: Arc<dyn Clock>,
}

impl<R, N> AdmissionController<R, N>
where
    R: AdmissionRepository + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(
        repository: Arc<R>,
        directory: Arc<dyn ActorDirectory>,
        sink: Arc<N>,
        gate: AuthorizationGate,
    ) -> Self {
        Self {
            repository,
            directory,
            gate,
            notifications: NotificationEmitter::new(sink),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    fn resolve(&self, actor_id: &UserId) -> Result<Actor, WorkflowError> {
        self.directory
            .resolve(actor_id)?
            .ok_or(WorkflowError::Forbidden)
    }

    fn load_program(&self, id: &ProgramId) -> Result<MentorshipProgram, WorkflowError> {
        self.repository
            .fetch_program(id)?
            .ok_or_else(|| WorkflowError::NotFound(format!("program {id}")))
    }

    fn load_application(&self, id: &ApplicationId) -> Result<Application, WorkflowError> {
        self.repository
            .fetch_application(id)?
            .ok_or_else(|| WorkflowError::NotFound(format!("application {id}")))
    }

    fn authorize(
        &self,
        actor: &Actor,
        program: &MentorshipProgram,
        capability: ProgramCapability,
    ) -> Result<(), WorkflowError> {
        if self.gate.can_manage_program(actor, program, capability) {
            Ok(())
        } else {
            Err(WorkflowError::Forbidden)
        }
    }

    fn ensure_transition(
        application: &Application,
        to: ApplicationStatus,
    ) -> Result<(), WorkflowError> {
        if application.status.can_become(to) {
            Ok(())
        } else {
            Err(WorkflowError::IllegalTransition {
                kind: "application".to_string(),
                from: application.status.label().to_string(),
                to: to.label().to_string(),
            })
        }
    }

    /// Create a program; it starts active with no participants.
    pub fn create_program(
        &self,
        actor_id: &UserId,
        request: NewProgram,
    ) -> Result<MentorshipProgram, WorkflowError> {
        let actor = self.resolve(actor_id)?;
        if !self.gate.can_create_program(&actor) {
            return Err(WorkflowError::Forbidden);
        }

        let NewProgram {
            title,
            max_participants,
            application_deadline,
            chapter_scope,
            mentor_id,
        } = request;

        let mentor_id = match (actor.role, mentor_id) {
            (Role::Admin | Role::ChapterAdmin, Some(mentor)) => mentor,
            _ => actor.id.clone(),
        };
        let chapter_scope = chapter_scope.or_else(|| actor.chapter.clone());
        if actor.role == Role::ChapterAdmin && !actor.administers(chapter_scope.as_ref()) {
            return Err(WorkflowError::Forbidden);
        }

        let program = MentorshipProgram::new(
            mentor_id,
            title,
            max_participants,
            application_deadline,
            chapter_scope,
            self.clock.now(),
        )?;
        let stored = self.repository.insert_program(program)?;
        info!(
            program = %stored.id,
            mentor = %stored.mentor_id,
            max_participants = stored.max_participants(),
            "mentorship program created"
        );
        Ok(stored)
    }

    /// Change capacity, deadline, or the active flag. Never touches the participant count.
    pub fn update_program(
        &self,
        program_id: &ProgramId,
        actor_id: &UserId,
        update: ProgramUpdate,
    ) -> Result<MentorshipProgram, WorkflowError> {
        let program = self.load_program(program_id)?;
        let actor = self.resolve(actor_id)?;
        self.authorize(&actor, &program, ProgramCapability::Configure)?;

        let updated = self
            .repository
            .update_program(program_id, &update, self.clock.as_ref())?;
        info!(
            program = %updated.id,
            actor = %actor.id,
            is_active = updated.is_active,
            max_participants = updated.max_participants(),
            "mentorship program updated"
        );
        Ok(updated)
    }

    pub fn program(&self, program_id: &ProgramId) -> Result<MentorshipProgram, WorkflowError> {
        self.load_program(program_id)
    }

    /// File a `submitted` application for `applicant_id`.
    pub fn submit_application(
        &self,
        program_id: &ProgramId,
        applicant_id: &UserId,
    ) -> Result<Application, WorkflowError> {
        let applicant = self.resolve(applicant_id)?;
        let program = self.load_program(program_id)?;
        if program.mentor_id == applicant.id {
            return Err(WorkflowError::Forbidden);
        }

        let stored = self
            .repository
            .insert_application(&program.id, &applicant.id, self.clock.as_ref())
            .map_err(WorkflowError::from)?;
        info!(
            program = %program.id,
            application = %stored.id,
            applicant = %stored.applicant_id,
            "mentorship application submitted"
        );
        Ok(stored)
    }

    /// Move a submitted application to `admitted`, consuming one capacity slot.
    pub fn admit(
        &self,
        application_id: &ApplicationId,
        actor_id: &UserId,
    ) -> Result<Application, WorkflowError> {
        let application = self.load_application(application_id)?;
        let program = self.load_program(&application.program_id)?;
        let actor = self.resolve(actor_id)?;
        self.authorize(&actor, &program, ProgramCapability::Admit)?;
        Self::ensure_transition(&application, ApplicationStatus::Admitted)?;

        let committed = self
            .apply(&application, &actor, ApplicationStatus::Admitted, SeatChange::Claim, false)
            .map_err(|err| {
                if matches!(
                    err,
                    WorkflowError::ProgramFull
                        | WorkflowError::DeadlinePassed
                        | WorkflowError::ProgramInactive
                ) {
                    warn!(
                        program = %application.program_id,
                        application = %application.id,
                        code = err.code(),
                        "admission refused"
                    );
                }
                err
            })?;

        info!(
            program = %committed.value.program.id,
            application = %application.id,
            current_participants = committed.value.program.current_participants(),
            max_participants = committed.value.program.max_participants(),
            "application admitted"
        );
        Ok(committed.value.application)
    }

    /// Moderator decision to decline a submitted application. Capacity is unchanged.
    pub fn reject(
        &self,
        application_id: &ApplicationId,
        actor_id: &UserId,
    ) -> Result<Application, WorkflowError> {
        let application = self.load_application(application_id)?;
        let program = self.load_program(&application.program_id)?;
        let actor = self.resolve(actor_id)?;
        self.authorize(&actor, &program, ProgramCapability::Reject)?;
        Self::ensure_transition(&application, ApplicationStatus::Rejected)?;

        let committed = self.apply(
            &application,
            &actor,
            ApplicationStatus::Rejected,
            SeatChange::Keep,
            false,
        )?;
        info!(application = %application.id, actor = %actor.id, "application rejected");
        Ok(committed.value.application)
    }

    /// Applicant withdraws; an admitted applicant's seat is released in the same write.
    pub fn withdraw(
        &self,
        application_id: &ApplicationId,
        actor_id: &UserId,
    ) -> Result<Application, WorkflowError> {
        let application = self.load_application(application_id)?;
        let actor = self.resolve(actor_id)?;
        if application.applicant_id != actor.id {
            return Err(WorkflowError::Forbidden);
        }
        Self::ensure_transition(&application, ApplicationStatus::Withdrawn)?;

        let seat = if application.status == ApplicationStatus::Admitted {
            SeatChange::Release
        } else {
            SeatChange::Keep
        };
        let committed = self.apply(&application, &actor, ApplicationStatus::Withdrawn, seat, true)?;
        info!(
            application = %application.id,
            released_seat = seat == SeatChange::Release,
            current_participants = committed.value.program.current_participants(),
            "application withdrawn"
        );
        Ok(committed.value.application)
    }

    /// Every application filed against a program, oldest first.
    pub fn applications(
        &self,
        program_id: &ProgramId,
        actor_id: &UserId,
    ) -> Result<Vec<Application>, WorkflowError> {
        let program = self.load_program(program_id)?;
        let actor = self.resolve(actor_id)?;
        self.authorize(&actor, &program, ProgramCapability::ViewApplications)?;
        Ok(self.repository.applications_for(program_id)?)
    }

    /// A single application, visible to its applicant and to the program's moderators.
    pub fn application(
        &self,
        application_id: &ApplicationId,
        actor_id: &UserId,
    ) -> Result<Application, WorkflowError> {
        let application = self.load_application(application_id)?;
        let actor = self.resolve(actor_id)?;
        if application.applicant_id == actor.id {
            return Ok(application);
        }
        let program = self.load_program(&application.program_id)?;
        self.authorize(&actor, &program, ProgramCapability::ViewApplications)?;
        Ok(application)
    }

    /// Hand the change to the store; the intent is recorded inside the store's commit
    /// critical section so pollers see intents in commit order.
    fn apply(
        &self,
        application: &Application,
        actor: &Actor,
        to: ApplicationStatus,
        seat: SeatChange,
        notify_mentor: bool,
    ) -> Result<Committed<AdmissionCommit>, WorkflowError> {
        let from = application.status;
        let change = ApplicationChange {
            current: application.clone(),
            to,
            actor_id: actor.id.clone(),
            seat,
        };
        let announce = |committed: &Committed<AdmissionCommit>| {
            self.announce(committed, from, actor, notify_mentor)
        };
        self.repository
            .commit(change, self.clock.as_ref(), &announce)
            .map_err(WorkflowError::from)
    }

    fn announce(
        &self,
        committed: &Committed<AdmissionCommit>,
        from: ApplicationStatus,
        actor: &Actor,
        notify_mentor: bool,
    ) {
        let AdmissionCommit {
            application,
            program,
        } = &committed.value;

        let mut recipients = vec![application.applicant_id.clone()];
        if notify_mentor && program.mentor_id != application.applicant_id {
            recipients.push(program.mentor_id.clone());
        }

        self.notifications.record(NotificationIntent {
            sequence: committed.sequence,
            template: format!("application_{}", application.status.label()),
            subject: IntentSubject::Application {
                program_id: application.program_id,
                application_id: application.id,
            },
            old_status: from.label().to_string(),
            new_status: application.status.label().to_string(),
            actor_id: actor.id.clone(),
            recipients,
            channels: vec![Channel::Email, Channel::Toast],
            recorded_at: application.updated_at,
        });
    }
}
