//! Availability across mount commitments
//!
//! Before a device or platform can be scheduled into a configuration, its
//! existing mounts across all configurations must leave the requested
//! window free. The check is a pure scan over the entity's action list;
//! nothing is cached between queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::actions::MountAction;
use crate::hierarchy::{EntityId, NodeKey};

/// Result of checking whether an entity is free during a window.
///
/// Recomputed per query, never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Availability {
    /// No mount commitment overlaps the requested window.
    Free,
    /// At least one commitment overlaps. Only the earliest-starting
    /// conflict is reported; callers needing the full set query again
    /// with the reported window excluded.
    Occupied {
        begin_date: DateTime<Utc>,
        end_date: Option<DateTime<Utc>>,
        configuration_id: EntityId,
    },
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Free)
    }
}

/// Check one entity against a half-open `[begin, end)` window.
///
/// An absent `end` means "unbounded future", so an open mount conflicts
/// with every window that does not close before the mount begins.
pub fn check(
    entity: &NodeKey,
    begin: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    actions: &[MountAction],
) -> Availability {
    let conflict = actions
        .iter()
        .filter(|a| a.entity.key() == *entity)
        .filter(|a| a.overlaps(begin, end))
        .min_by_key(|a| a.begin_date);

    match conflict {
        Some(action) => Availability::Occupied {
            begin_date: action.begin_date,
            end_date: action.end_date,
            configuration_id: action.configuration_id.clone(),
        },
        None => Availability::Free,
    }
}

/// Check a whole selection of entities against the same window, the way a
/// scheduling dialog asks for it.
pub fn check_many(
    entities: &[NodeKey],
    begin: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    actions: &[MountAction],
) -> BTreeMap<NodeKey, Availability> {
    entities
        .iter()
        .map(|key| (key.clone(), check(key, begin, end, actions)))
        .collect()
}
