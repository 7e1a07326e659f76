//! Moderation and mentorship admission engine for alumni chapters.
//!
//! The crate exposes two workflows that share an authorization gate and a notification
//! emitter: a generic approval state machine for moderatable content and a
//! capacity-bounded admission controller for mentorship programs.

pub mod access;
pub mod clock;
pub mod config;
pub mod error;
pub mod notifications;
pub mod store;
pub mod telemetry;
pub mod workflows;
