use super::domain::{
    AdmissionCommit, Application, ApplicationChange, ApplicationId, MentorshipProgram, ProgramId,
    ProgramUpdate, SeatRefusal,
};
use crate::access::UserId;
use crate::clock::Clock;
use crate::store::{Committed, OnCommit, RepositoryError};
use crate::workflows::error::WorkflowError;

/// Storage for programs and their applications.
///
/// Every method that writes must run as one indivisible unit per program: the capacity
/// check, the counter change, and the application write either all land or none do.
/// Writers read `clock` only after acquiring the program, so a request that waited on a
/// busy program is judged at the time it actually runs.
/// A SQL backend would express `commit` as a single transaction with a guarded
/// `UPDATE ... SET current_participants = current_participants + 1 WHERE
/// current_participants < max_participants` and inspect the affected-row count.
pub trait AdmissionRepository: Send + Sync {
    /// Store a freshly created program. Programs that already hold seats are refused.
    fn insert_program(
        &self,
        program: MentorshipProgram,
    ) -> Result<MentorshipProgram, AdmissionStoreError>;

    fn fetch_program(&self, id: &ProgramId) -> Result<Option<MentorshipProgram>, RepositoryError>;

    fn update_program(
        &self,
        id: &ProgramId,
        update: &ProgramUpdate,
        clock: &dyn Clock,
    ) -> Result<MentorshipProgram, AdmissionStoreError>;

    /// File a `submitted` application if the applicant has no open application for the
    /// program and the program is still accepting applications.
    fn insert_application(
        &self,
        program_id: &ProgramId,
        applicant_id: &UserId,
        clock: &dyn Clock,
    ) -> Result<Application, AdmissionStoreError>;

    fn fetch_application(&self, id: &ApplicationId)
        -> Result<Option<Application>, RepositoryError>;

    fn applications_for(&self, program_id: &ProgramId)
        -> Result<Vec<Application>, RepositoryError>;

    /// Apply an application status change and its seat effect atomically, running
    /// `on_commit` before the program is released.
    fn commit(
        &self,
        change: ApplicationChange,
        clock: &dyn Clock,
        on_commit: OnCommit<'_, AdmissionCommit>,
    ) -> Result<Committed<AdmissionCommit>, AdmissionStoreError>;
}

/// Error enumeration for admission store writes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionStoreError {
    #[error(transparent)]
    Refused(#[from] SeatRefusal),
    #[error("applicant already holds an open application")]
    Duplicate,
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<AdmissionStoreError> for WorkflowError {
    fn from(value: AdmissionStoreError) -> Self {
        match value {
            AdmissionStoreError::Refused(refusal) => refusal.into(),
            AdmissionStoreError::Duplicate => WorkflowError::DuplicateApplication,
            AdmissionStoreError::Invalid(reason) => WorkflowError::Invalid(reason),
            AdmissionStoreError::Repository(err) => err.into(),
        }
    }
}
