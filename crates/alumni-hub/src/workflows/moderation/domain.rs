use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::access::{ChapterScope, UserId};

/// Identifier wrapper for moderatable entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The content families that share the approval workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Resource,
    Blog,
    MentorRequest,
    Mentorship,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Resource,
        EntityKind::Blog,
        EntityKind::MentorRequest,
        EntityKind::Mentorship,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            EntityKind::Resource => "resource",
            EntityKind::Blog => "blog",
            EntityKind::MentorRequest => "mentor_request",
            EntityKind::Mentorship => "mentorship",
        }
    }

    /// Payload fields matched by free-text search.
    pub const fn search_fields(self) -> &'static [&'static str] {
        match self {
            EntityKind::Resource => &["title", "author", "category"],
            EntityKind::Blog => &["title", "author", "excerpt", "tags"],
            EntityKind::MentorRequest => &["name", "expertise", "message"],
            EntityKind::Mentorship => &["title", "mentor_name", "mentee_name", "focus_area"],
        }
    }

    /// Payload field compared against the `type` filter.
    pub const fn type_field(self) -> &'static str {
        match self {
            EntityKind::Resource => "type",
            EntityKind::Blog => "category",
            EntityKind::MentorRequest => "expertise",
            EntityKind::Mentorship => "focus_area",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown entity kind '{0}'")]
pub struct UnknownEntityKind(pub String);

impl FromStr for EntityKind {
    type Err = UnknownEntityKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "resource" | "resources" => Ok(EntityKind::Resource),
            "blog" | "blogs" | "blog_post" => Ok(EntityKind::Blog),
            "mentor_request" | "mentor_requests" => Ok(EntityKind::MentorRequest),
            "mentorship" | "mentorships" => Ok(EntityKind::Mentorship),
            _ => Err(UnknownEntityKind(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
    Active,
    Completed,
    Cancelled,
}

impl ModerationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ModerationStatus::Pending => "pending",
            ModerationStatus::Approved => "approved",
            ModerationStatus::Rejected => "rejected",
            ModerationStatus::Active => "active",
            ModerationStatus::Completed => "completed",
            ModerationStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Audit entry written before a status is overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: ModerationStatus,
    pub to: ModerationStatus,
    pub actor_id: UserId,
    pub at: DateTime<Utc>,
}

/// Generic envelope over every moderatable entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,
    pub kind: EntityKind,
    pub status: ModerationStatus,
    pub owner_id: UserId,
    pub chapter_scope: Option<ChapterScope>,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
    #[serde(default)]
    pub history: Vec<StatusChange>,
}

impl EntityRecord {
    pub fn pending(
        kind: EntityKind,
        owner_id: UserId,
        chapter_scope: Option<ChapterScope>,
        payload: Value,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EntityId::generate(),
            kind,
            status: ModerationStatus::Pending,
            owner_id,
            chapter_scope,
            payload,
            created_at: now,
            updated_at: now,
            version: 0,
            history: Vec::new(),
        }
    }

    /// Returns the successor record with the audit entry appended and the version bumped.
    pub(crate) fn advanced(
        &self,
        to: ModerationStatus,
        actor_id: &UserId,
        now: DateTime<Utc>,
    ) -> Self {
        let mut next = self.clone();
        next.history.push(StatusChange {
            from: self.status,
            to,
            actor_id: actor_id.clone(),
            at: now,
        });
        next.status = to;
        next.updated_at = now;
        next.version = self.version + 1;
        next
    }

    /// Lower-cased string values stored under `field`, flattening string arrays.
    pub fn text_values(&self, field: &str) -> Vec<String> {
        match self.payload.get(field) {
            Some(Value::String(text)) => vec![text.to_lowercase()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_lowercase)
                .collect(),
            Some(Value::Number(number)) => vec![number.to_string()],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_parses_route_segments() {
        assert_eq!("resources".parse::<EntityKind>(), Ok(EntityKind::Resource));
        assert_eq!(
            "mentor-requests".parse::<EntityKind>(),
            Ok(EntityKind::MentorRequest)
        );
        assert!("orders".parse::<EntityKind>().is_err());
    }

    #[test]
    fn advanced_records_previous_status() {
        let now = Utc::now();
        let record = EntityRecord::pending(
            EntityKind::Blog,
            UserId::new("author"),
            None,
            json!({ "title": "Hello" }),
            now,
        );
        let next = record.advanced(ModerationStatus::Approved, &UserId::new("admin"), now);

        assert_eq!(next.status, ModerationStatus::Approved);
        assert_eq!(next.version, 1);
        assert_eq!(next.history.len(), 1);
        assert_eq!(next.history[0].from, ModerationStatus::Pending);
        assert_eq!(record.status, ModerationStatus::Pending);
    }

    #[test]
    fn text_values_flatten_tag_arrays() {
        let record = EntityRecord::pending(
            EntityKind::Blog,
            UserId::new("author"),
            None,
            json!({ "tags": ["Career", "Networking", 3] }),
            Utc::now(),
        );
        assert_eq!(record.text_values("tags"), vec!["career", "networking"]);
        assert!(record.text_values("missing").is_empty());
    }
}
