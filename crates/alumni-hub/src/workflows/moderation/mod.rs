//! Generic approval workflow for resources, blog posts, mentor requests, and mentorships.

pub mod domain;
pub mod projection;
pub mod repository;
pub mod router;
pub mod service;
pub mod transitions;

#[cfg(test)]
mod tests;

pub use domain::{EntityId, EntityKind, EntityRecord, ModerationStatus, StatusChange};
pub use projection::{QueryFilters, QueryOrder};
pub use repository::{EntityRepository, EntityStatusView};
pub use router::moderation_router;
pub use service::ModerationService;
pub use transitions::TransitionTable;
