//! Role-to-capability mapping shared by the moderation and admission workflows.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::store::RepositoryError;
use crate::workflows::mentorship::domain::MentorshipProgram;
use crate::workflows::moderation::domain::{EntityRecord, ModerationStatus};
use crate::workflows::moderation::transitions::TransitionTable;

/// Opaque identifier of a person as resolved by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Organizational partition limiting a chapter admin's authority.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChapterScope(pub String);

impl ChapterScope {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Admin,
    #[serde(alias = "branch-admin")]
    ChapterAdmin,
    #[serde(alias = "alumni")]
    Mentor,
    Member,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::ChapterAdmin => "chapter-admin",
            Role::Mentor => "mentor",
            Role::Member => "member",
        }
    }
}

/// Resolved identity for a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
    pub chapter: Option<ChapterScope>,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role, chapter: Option<&str>) -> Self {
        Self {
            id: UserId::new(id),
            role,
            chapter: chapter.map(ChapterScope::new),
        }
    }

    /// True when the actor is a chapter admin whose scope matches `scope`.
    pub fn administers(&self, scope: Option<&ChapterScope>) -> bool {
        match (self.role, self.chapter.as_ref(), scope) {
            (Role::ChapterAdmin, Some(own), Some(target)) => own == target,
            _ => false,
        }
    }
}

/// Identity collaborator: maps an actor id onto role and chapter scope.
pub trait ActorDirectory: Send + Sync {
    fn resolve(&self, id: &UserId) -> Result<Option<Actor>, RepositoryError>;
}

/// Anything the gate can reason about: it has an owner and may carry a chapter scope.
pub trait Governed {
    fn owner(&self) -> &UserId;
    fn chapter_scope(&self) -> Option<&ChapterScope>;
}

impl Governed for EntityRecord {
    fn owner(&self) -> &UserId {
        &self.owner_id
    }

    fn chapter_scope(&self) -> Option<&ChapterScope> {
        self.chapter_scope.as_ref()
    }
}

impl Governed for MentorshipProgram {
    fn owner(&self) -> &UserId {
        &self.mentor_id
    }

    fn chapter_scope(&self) -> Option<&ChapterScope> {
        self.chapter_scope.as_ref()
    }
}

/// Operations on a mentorship program that require authority over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramCapability {
    Admit,
    Reject,
    Configure,
    ViewApplications,
}

/// Pure predicate over role, scope, and ownership. Never mutates anything.
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    table: Arc<TransitionTable>,
}

impl AuthorizationGate {
    pub fn new(table: Arc<TransitionTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    pub fn can_transition(
        &self,
        actor: &Actor,
        entity: &EntityRecord,
        from: ModerationStatus,
        to: ModerationStatus,
    ) -> bool {
        match actor.role {
            Role::Admin => true,
            Role::ChapterAdmin => actor.administers(entity.chapter_scope()),
            Role::Mentor => {
                entity.owner() == &actor.id && self.table.owner_may(entity.kind, from, to)
            }
            Role::Member => false,
        }
    }

    pub fn can_create_program(&self, actor: &Actor) -> bool {
        match actor.role {
            Role::Admin | Role::Mentor => true,
            Role::ChapterAdmin => actor.chapter.is_some(),
            Role::Member => false,
        }
    }

    pub fn can_manage_program(
        &self,
        actor: &Actor,
        program: &MentorshipProgram,
        capability: ProgramCapability,
    ) -> bool {
        match actor.role {
            Role::Admin => true,
            // program settings stay with the owning mentor and global admins
            Role::ChapterAdmin => {
                capability != ProgramCapability::Configure
                    && actor.administers(program.chapter_scope())
            }
            Role::Mentor => program.owner() == &actor.id,
            Role::Member => false,
        }
    }

    /// Non-admin roles only see what is in their chapter or what they own.
    pub fn can_view<E: Governed>(&self, actor: &Actor, entity: &E) -> bool {
        if actor.role == Role::Admin || entity.owner() == &actor.id {
            return true;
        }
        match (actor.chapter.as_ref(), entity.chapter_scope()) {
            (Some(own), Some(target)) => own == target,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::moderation::domain::{EntityKind, EntityRecord};
    use serde_json::json;

    fn gate() -> AuthorizationGate {
        AuthorizationGate::new(Arc::new(TransitionTable::standard()))
    }

    fn resource(owner: &str, chapter: Option<&str>) -> EntityRecord {
        EntityRecord::pending(
            EntityKind::Resource,
            UserId::new(owner),
            chapter.map(ChapterScope::new),
            json!({ "title": "Resume clinic" }),
            chrono::Utc::now(),
        )
    }

    #[test]
    fn admin_may_perform_any_transition() {
        let admin = Actor::new("root", Role::Admin, None);
        let entity = resource("member-1", Some("north"));
        assert!(gate().can_transition(
            &admin,
            &entity,
            ModerationStatus::Pending,
            ModerationStatus::Approved
        ));
    }

    #[test]
    fn chapter_admin_is_limited_to_matching_scope() {
        let scoped = Actor::new("ca-1", Role::ChapterAdmin, Some("north"));
        let inside = resource("member-1", Some("north"));
        let outside = resource("member-1", Some("south"));
        let unscoped = resource("member-1", None);

        let from = ModerationStatus::Pending;
        let to = ModerationStatus::Approved;
        assert!(gate().can_transition(&scoped, &inside, from, to));
        assert!(!gate().can_transition(&scoped, &outside, from, to));
        assert!(!gate().can_transition(&scoped, &unscoped, from, to));
    }

    #[test]
    fn mentor_cannot_approve_their_own_submission() {
        let mentor = Actor::new("mentor-1", Role::Mentor, Some("north"));
        let entity = resource("mentor-1", Some("north"));
        assert!(!gate().can_transition(
            &mentor,
            &entity,
            ModerationStatus::Pending,
            ModerationStatus::Approved
        ));
    }

    #[test]
    fn members_are_denied_every_transition() {
        let member = Actor::new("member-1", Role::Member, Some("north"));
        let entity = resource("member-1", Some("north"));
        assert!(!gate().can_transition(
            &member,
            &entity,
            ModerationStatus::Pending,
            ModerationStatus::Rejected
        ));
    }

    #[test]
    fn roles_accept_legacy_aliases() {
        let role: Role = serde_json::from_value(json!("branch-admin")).expect("alias parses");
        assert_eq!(role, Role::ChapterAdmin);
        let role: Role = serde_json::from_value(json!("alumni")).expect("alias parses");
        assert_eq!(role, Role::Mentor);
    }
}
