//! Read-only views over moderatable entities. Nothing here mutates a record.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use super::domain::{EntityKind, EntityRecord, ModerationStatus};
use crate::access::{Actor, AuthorizationGate};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOrder {
    #[default]
    Newest,
    Relevance,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilters {
    #[serde(default)]
    pub status: Option<ModerationStatus>,
    #[serde(default, alias = "q")]
    pub free_text: Option<String>,
    #[serde(default, rename = "type")]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub order: QueryOrder,
}

impl QueryFilters {
    pub fn status(status: ModerationStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    fn needle(&self) -> Option<String> {
        self.free_text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_lowercase)
    }
}

/// Number of searchable fields containing `needle`; zero means no match.
fn relevance(record: &EntityRecord, needle: &str) -> usize {
    record
        .kind
        .search_fields()
        .iter()
        .filter(|field| {
            record
                .text_values(field)
                .iter()
                .any(|value| value.contains(needle))
        })
        .count()
}

fn matches_type(record: &EntityRecord, wanted: &str) -> bool {
    let wanted = wanted.trim().to_lowercase();
    record
        .text_values(record.kind.type_field())
        .iter()
        .any(|value| *value == wanted)
}

/// Applies role-scoped visibility first, then the caller's filters.
pub fn project(
    records: Vec<EntityRecord>,
    kind: EntityKind,
    actor: &Actor,
    gate: &AuthorizationGate,
    filters: &QueryFilters,
) -> Vec<EntityRecord> {
    let needle = filters.needle();

    let mut scored: Vec<(usize, EntityRecord)> = records
        .into_iter()
        .filter(|record| record.kind == kind)
        .filter(|record| gate.can_view(actor, record))
        .filter(|record| filters.status.map_or(true, |status| record.status == status))
        .filter(|record| {
            filters
                .entity_type
                .as_deref()
                .map_or(true, |wanted| matches_type(record, wanted))
        })
        .filter_map(|record| match needle.as_deref() {
            Some(needle) => {
                let score = relevance(&record, needle);
                (score > 0).then_some((score, record))
            }
            None => Some((0, record)),
        })
        .collect();

    match filters.order {
        QueryOrder::Relevance if needle.is_some() => scored.sort_by_key(|(score, record)| {
            (Reverse(*score), Reverse(record.created_at), record.id.0)
        }),
        _ => scored.sort_by_key(|(_, record)| (Reverse(record.created_at), record.id.0)),
    }

    scored.into_iter().map(|(_, record)| record).collect()
}
