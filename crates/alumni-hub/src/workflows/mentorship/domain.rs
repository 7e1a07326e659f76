use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::repository::AdmissionStoreError;
use crate::access::{ChapterScope, UserId};
use crate::workflows::error::WorkflowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgramId(pub Uuid);

impl ProgramId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub Uuid);

impl ApplicationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Why a program refused to hand out a seat. Each maps to a distinct user-facing error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SeatRefusal {
    #[error("program is full")]
    Full,
    #[error("program is inactive")]
    Inactive,
    #[error("application deadline passed")]
    DeadlinePassed,
}

impl From<SeatRefusal> for WorkflowError {
    fn from(value: SeatRefusal) -> Self {
        match value {
            SeatRefusal::Full => WorkflowError::ProgramFull,
            SeatRefusal::Inactive => WorkflowError::ProgramInactive,
            SeatRefusal::DeadlinePassed => WorkflowError::DeadlinePassed,
        }
    }
}

/// A mentor-owned program with a bounded number of participant seats.
///
/// `current_participants` is derived from admissions and can only change through
/// [`MentorshipProgram::claim_seat`] and [`MentorshipProgram::release_seat`], which are
/// crate-private and only invoked by admission stores while they hold the program lock.
/// Programs are serialized for responses but never read back from callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MentorshipProgram {
    pub id: ProgramId,
    pub mentor_id: UserId,
    pub title: String,
    pub chapter_scope: Option<ChapterScope>,
    max_participants: u32,
    current_participants: u32,
    pub application_deadline: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
}

impl MentorshipProgram {
    pub fn new(
        mentor_id: UserId,
        title: impl Into<String>,
        max_participants: u32,
        application_deadline: Option<DateTime<Utc>>,
        chapter_scope: Option<ChapterScope>,
        now: DateTime<Utc>,
    ) -> Result<Self, WorkflowError> {
        if max_participants == 0 {
            return Err(WorkflowError::Invalid(
                "max_participants must be positive".to_string(),
            ));
        }

        Ok(Self {
            id: ProgramId::generate(),
            mentor_id,
            title: title.into(),
            chapter_scope,
            max_participants,
            current_participants: 0,
            application_deadline,
            is_active: true,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    pub fn max_participants(&self) -> u32 {
        self.max_participants
    }

    pub fn current_participants(&self) -> u32 {
        self.current_participants
    }

    pub fn available_slots(&self) -> u32 {
        self.max_participants.saturating_sub(self.current_participants)
    }

    pub fn is_full(&self) -> bool {
        self.available_slots() == 0
    }

    /// Checks, in order, that the program is active, within its deadline, and has room.
    pub fn check_open(&self, now: DateTime<Utc>) -> Result<(), SeatRefusal> {
        if !self.is_active {
            return Err(SeatRefusal::Inactive);
        }
        if self
            .application_deadline
            .is_some_and(|deadline| now > deadline)
        {
            return Err(SeatRefusal::DeadlinePassed);
        }
        if self.is_full() {
            return Err(SeatRefusal::Full);
        }
        Ok(())
    }

    pub(crate) fn claim_seat(&mut self, now: DateTime<Utc>) -> Result<(), SeatRefusal> {
        self.check_open(now)?;
        self.current_participants += 1;
        self.touch(now);
        Ok(())
    }

    pub(crate) fn release_seat(&mut self, now: DateTime<Utc>) {
        debug_assert!(self.current_participants > 0, "released an unclaimed seat");
        self.current_participants = self.current_participants.saturating_sub(1);
        self.touch(now);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.version += 1;
    }

    pub fn view(&self, now: DateTime<Utc>) -> ProgramView {
        ProgramView {
            id: self.id,
            mentor_id: self.mentor_id.clone(),
            title: self.title.clone(),
            chapter_scope: self.chapter_scope.clone(),
            max_participants: self.max_participants,
            current_participants: self.current_participants,
            available_slots: self.available_slots(),
            is_full: self.is_full(),
            is_active: self.is_active,
            application_deadline: self.application_deadline,
            accepting_applications: self.check_open(now).is_ok(),
        }
    }
}

/// Caller-visible snapshot with the derived capacity figures filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramView {
    pub id: ProgramId,
    pub mentor_id: UserId,
    pub title: String,
    pub chapter_scope: Option<ChapterScope>,
    pub max_participants: u32,
    pub current_participants: u32,
    pub available_slots: u32,
    pub is_full: bool,
    pub is_active: bool,
    pub application_deadline: Option<DateTime<Utc>>,
    pub accepting_applications: bool,
}

/// Request to create a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProgram {
    pub title: String,
    pub max_participants: u32,
    #[serde(default)]
    pub application_deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub chapter_scope: Option<ChapterScope>,
    /// Only honoured when an admin creates a program on a mentor's behalf.
    #[serde(default)]
    pub mentor_id: Option<UserId>,
}

/// Mentor-editable settings. The participant count is not among them.
///
/// `application_deadline` distinguishes a missing field (keep) from an explicit `null`
/// (clear) and a timestamp (replace).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramUpdate {
    #[serde(default)]
    pub max_participants: Option<u32>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub application_deadline: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ProgramUpdate {
    pub fn deactivate() -> Self {
        Self {
            is_active: Some(false),
            ..Self::default()
        }
    }

    pub fn clear_deadline() -> Self {
        Self {
            application_deadline: Some(None),
            ..Self::default()
        }
    }

    pub(crate) fn apply(
        &self,
        program: &mut MentorshipProgram,
        now: DateTime<Utc>,
    ) -> Result<(), AdmissionStoreError> {
        if let Some(max) = self.max_participants {
            if max == 0 {
                return Err(AdmissionStoreError::Invalid(
                    "max_participants must be positive".to_string(),
                ));
            }
            if max < program.current_participants {
                return Err(AdmissionStoreError::Invalid(format!(
                    "max_participants {max} is below the {} participants already admitted",
                    program.current_participants
                )));
            }
            program.max_participants = max;
        }
        if let Some(deadline) = self.application_deadline {
            program.application_deadline = deadline;
        }
        if let Some(active) = self.is_active {
            program.is_active = active;
        }
        program.touch(now);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Submitted,
    Admitted,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::Admitted => "admitted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    /// Submitted and admitted applications block a second application to the same program.
    pub const fn is_open(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Submitted | ApplicationStatus::Admitted
        )
    }

    pub const fn can_become(self, to: ApplicationStatus) -> bool {
        matches!(
            (self, to),
            (ApplicationStatus::Submitted, ApplicationStatus::Admitted)
                | (ApplicationStatus::Submitted, ApplicationStatus::Rejected)
                | (ApplicationStatus::Submitted, ApplicationStatus::Withdrawn)
                | (ApplicationStatus::Admitted, ApplicationStatus::Withdrawn)
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub program_id: ProgramId,
    pub applicant_id: UserId,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub decided_by: Option<UserId>,
    pub version: u64,
}

impl Application {
    pub fn submitted(program_id: ProgramId, applicant_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: ApplicationId::generate(),
            program_id,
            applicant_id,
            status: ApplicationStatus::Submitted,
            submitted_at: now,
            updated_at: now,
            decided_by: None,
            version: 0,
        }
    }

    pub(crate) fn advanced(
        &self,
        to: ApplicationStatus,
        actor_id: &UserId,
        now: DateTime<Utc>,
    ) -> Self {
        let mut next = self.clone();
        next.status = to;
        next.updated_at = now;
        next.decided_by = Some(actor_id.clone());
        next.version = self.version + 1;
        next
    }
}

/// Seat accounting carried by an application write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatChange {
    Claim,
    Release,
    Keep,
}

/// One indivisible admission-store write: the status an application should move to and
/// its seat effect. The store stamps the change with the time it acquires the program
/// lock, and rejects it if `current` is no longer the stored version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationChange {
    pub current: Application,
    pub to: ApplicationStatus,
    pub actor_id: UserId,
    pub seat: SeatChange,
}

/// Both halves of a committed admission write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdmissionCommit {
    pub application: Application,
    pub program: MentorshipProgram,
}
