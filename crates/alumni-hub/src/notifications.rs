//! Outbound notification intents. Delivery is owned by an external collaborator; the
//! engine only records what should be sent.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::access::UserId;
use crate::workflows::mentorship::domain::{ApplicationId, ProgramId};
use crate::workflows::moderation::domain::{EntityId, EntityKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Toast,
}

/// What the intent is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntentSubject {
    Entity {
        kind: EntityKind,
        id: EntityId,
    },
    Application {
        program_id: ProgramId,
        application_id: ApplicationId,
    },
}

/// One notice per committed transition, ordered by `sequence`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationIntent {
    pub sequence: u64,
    pub template: String,
    pub subject: IntentSubject,
    pub old_status: String,
    pub new_status: String,
    pub actor_id: UserId,
    pub recipients: Vec<UserId>,
    pub channels: Vec<Channel>,
    pub recorded_at: DateTime<Utc>,
}

impl NotificationIntent {
    pub fn subject_label(&self) -> String {
        match &self.subject {
            IntentSubject::Entity { kind, id } => format!("{kind}/{id}"),
            IntentSubject::Application { application_id, .. } => {
                format!("application/{application_id}")
            }
        }
    }
}

/// Dispatch error raised by a sink.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Trait describing outbound notification hooks (e-mail, in-app toasts).
pub trait NotificationSink: Send + Sync {
    fn publish(&self, intent: NotificationIntent) -> Result<(), NotificationError>;
}

/// Best-effort wrapper: a sink failure is logged and never reaches the caller.
pub struct NotificationEmitter<N> {
    sink: Arc<N>,
}

impl<N> Clone for NotificationEmitter<N> {
    fn clone(&self) -> Self {
        Self {
            sink: self.sink.clone(),
        }
    }
}

impl<N: NotificationSink> NotificationEmitter<N> {
    pub fn new(sink: Arc<N>) -> Self {
        Self { sink }
    }

    pub fn record(&self, intent: NotificationIntent) {
        let sequence = intent.sequence;
        let subject = intent.subject_label();
        if let Err(err) = self.sink.publish(intent) {
            warn!(sequence, %subject, error = %err, "dropping notification intent");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingSink {
        attempts: AtomicUsize,
    }

    impl NotificationSink for FailingSink {
        fn publish(&self, _intent: NotificationIntent) -> Result<(), NotificationError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(NotificationError::Transport("smtp offline".to_string()))
        }
    }

    #[test]
    fn record_swallows_sink_failures() {
        let sink = Arc::new(FailingSink {
            attempts: AtomicUsize::new(0),
        });
        let emitter = NotificationEmitter::new(sink.clone());

        emitter.record(NotificationIntent {
            sequence: 7,
            template: "entity_approved".to_string(),
            subject: IntentSubject::Entity {
                kind: EntityKind::Resource,
                id: EntityId::generate(),
            },
            old_status: "pending".to_string(),
            new_status: "approved".to_string(),
            actor_id: UserId::new("admin"),
            recipients: vec![UserId::new("owner")],
            channels: vec![Channel::Email, Channel::Toast],
            recorded_at: Utc::now(),
        });

        assert_eq!(sink.attempts.load(Ordering::SeqCst), 1);
    }
}
