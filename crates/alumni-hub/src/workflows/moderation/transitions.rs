use std::collections::{BTreeMap, BTreeSet};

use super::domain::{EntityKind, ModerationStatus};

type Edge = (ModerationStatus, ModerationStatus);

/// Legal edges for one entity kind plus the subset an owning mentor may drive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindRules {
    edges: BTreeSet<Edge>,
    owner_edges: BTreeSet<Edge>,
}

impl KindRules {
    fn with_edges(edges: &[Edge]) -> Self {
        Self {
            edges: edges.iter().copied().collect(),
            owner_edges: BTreeSet::new(),
        }
    }

    fn owner_may(mut self, edges: &[Edge]) -> Self {
        self.owner_edges.extend(edges.iter().copied());
        self
    }

    pub fn permits(&self, from: ModerationStatus, to: ModerationStatus) -> bool {
        self.edges.contains(&(from, to))
    }

    pub fn targets_from(&self, from: ModerationStatus) -> Vec<ModerationStatus> {
        self.edges
            .iter()
            .filter(|(source, _)| *source == from)
            .map(|(_, target)| *target)
            .collect()
    }
}

/// Per-kind transition tables. Reopening (`rejected -> pending`) is opt-in per kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
    kinds: BTreeMap<EntityKind, KindRules>,
}

impl TransitionTable {
    pub fn standard() -> Self {
        use ModerationStatus::*;

        let mut kinds = BTreeMap::new();
        let content = [(Pending, Approved), (Pending, Rejected), (Approved, Rejected)];
        kinds.insert(EntityKind::Resource, KindRules::with_edges(&content));
        kinds.insert(EntityKind::Blog, KindRules::with_edges(&content));
        kinds.insert(
            EntityKind::MentorRequest,
            KindRules::with_edges(&[(Pending, Approved), (Pending, Rejected)]),
        );
        kinds.insert(
            EntityKind::Mentorship,
            KindRules::with_edges(&[
                (Pending, Approved),
                (Pending, Rejected),
                (Pending, Cancelled),
                (Approved, Active),
                (Approved, Cancelled),
                (Active, Completed),
                (Active, Cancelled),
            ])
            .owner_may(&[
                (Pending, Cancelled),
                (Approved, Active),
                (Approved, Cancelled),
                (Active, Completed),
                (Active, Cancelled),
            ]),
        );

        Self { kinds }
    }

    /// Standard tables with reopening enabled for each listed kind.
    pub fn with_reopenable(kinds: &[EntityKind]) -> Self {
        kinds
            .iter()
            .fold(Self::standard(), |table, kind| table.allow_reopen(*kind))
    }

    pub fn allow_reopen(mut self, kind: EntityKind) -> Self {
        self.kinds
            .entry(kind)
            .or_default()
            .edges
            .insert((ModerationStatus::Rejected, ModerationStatus::Pending));
        self
    }

    pub fn rules(&self, kind: EntityKind) -> Option<&KindRules> {
        self.kinds.get(&kind)
    }

    pub fn permits(&self, kind: EntityKind, from: ModerationStatus, to: ModerationStatus) -> bool {
        self.rules(kind)
            .map(|rules| rules.permits(from, to))
            .unwrap_or(false)
    }

    pub fn owner_may(&self, kind: EntityKind, from: ModerationStatus, to: ModerationStatus) -> bool {
        self.rules(kind)
            .map(|rules| rules.permits(from, to) && rules.owner_edges.contains(&(from, to)))
            .unwrap_or(false)
    }

    pub fn reopenable(&self, kind: EntityKind) -> bool {
        self.permits(kind, ModerationStatus::Rejected, ModerationStatus::Pending)
    }

    pub fn is_terminal(&self, kind: EntityKind, status: ModerationStatus) -> bool {
        self.rules(kind)
            .map(|rules| rules.targets_from(status).is_empty())
            .unwrap_or(true)
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::standard()
    }
}
