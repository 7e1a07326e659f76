//! Mentorship programs and the capacity-bounded admission controller.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Application, ApplicationId, ApplicationStatus, MentorshipProgram, NewProgram, ProgramId,
    ProgramUpdate, ProgramView, SeatRefusal,
};
pub use repository::{AdmissionRepository, AdmissionStoreError};
pub use router::mentorship_router;
pub use service::AdmissionController;
