//! Reconstruction of mount trees from flat action lists
//!
//! The backend hands over every mount action of a configuration; the tree
//! valid at any instant is derived from scratch on each call. Calling
//! twice with the same inputs yields structurally identical trees.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::IntegrityError;
use crate::actions::MountAction;
use crate::hierarchy::{EntityId, MountNode, MountTree, NodeKey};

/// All mount actions of one configuration, ready to be queried.
#[derive(Clone, Debug, Default)]
pub struct MountingActionTimeline {
    actions: Vec<MountAction>,
}

impl MountingActionTimeline {
    pub fn new(actions: Vec<MountAction>) -> Self {
        Self { actions }
    }

    pub fn actions(&self) -> &[MountAction] {
        &self.actions
    }

    /// The tree as it stands today: only open-ended mounts qualify.
    pub fn current_tree(&self) -> Result<MountTree, IntegrityError> {
        self.tree_at(None)
    }

    /// Reconstruct the tree valid at `at`.
    ///
    /// An action qualifies when its half-open `[begin_date, end_date)`
    /// interval contains the instant; `None` means "now" and selects
    /// open-ended actions. A qualifying action whose parent is not itself
    /// mounted at the instant becomes a root: the parent's absence is a
    /// legitimate state of the record, not an error.
    pub fn tree_at(&self, at: Option<DateTime<Utc>>) -> Result<MountTree, IntegrityError> {
        let qualifying: Vec<&MountAction> = self
            .actions
            .iter()
            .filter(|a| a.is_active_at(at))
            .collect();

        // One action per entity, or the record contradicts physical
        // reality. Reported, never resolved by picking one.
        let mut counts: HashMap<NodeKey, usize> = HashMap::new();
        for action in &qualifying {
            *counts.entry(action.entity.key()).or_insert(0) += 1;
        }
        for action in &qualifying {
            let count = counts[&action.entity.key()];
            if count > 1 {
                log::warn!(
                    "entity {} is mounted {} times at once in configuration {}",
                    action.entity.id(),
                    count,
                    action.configuration_id
                );
                return Err(IntegrityError::OverlappingMounts {
                    entity_id: action.entity.id().clone(),
                    count,
                });
            }
        }

        // Link children to parents by entity id, in action order.
        let index_by_id: HashMap<&EntityId, usize> = qualifying
            .iter()
            .enumerate()
            .map(|(i, a)| (a.entity.id(), i))
            .collect();
        let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); qualifying.len()];
        let mut root_indices: Vec<usize> = Vec::new();
        for (i, action) in qualifying.iter().enumerate() {
            match action.parent_id.as_ref().and_then(|pid| index_by_id.get(pid)) {
                Some(&parent_index) if parent_index == i => {
                    return Err(IntegrityError::ParentCycle {
                        entity_id: action.entity.id().clone(),
                    });
                }
                Some(&parent_index) => children_of[parent_index].push(i),
                None => root_indices.push(i),
            }
        }

        let mut visited = vec![false; qualifying.len()];
        let mut roots = Vec::with_capacity(root_indices.len());
        for &i in &root_indices {
            roots.push(build_node(i, &qualifying, &children_of, &mut visited)?);
        }

        // Every qualifying action must be reachable from a root; a
        // leftover means the parent references close into a loop.
        if let Some(i) = visited.iter().position(|v| !v) {
            return Err(IntegrityError::ParentCycle {
                entity_id: qualifying[i].entity.id().clone(),
            });
        }

        Ok(MountTree { roots })
    }

    /// Sorted, deduplicated instants at which the tree's shape changes:
    /// every begin and every end date in the action list.
    pub fn change_timepoints(&self) -> Vec<DateTime<Utc>> {
        let mut points: Vec<DateTime<Utc>> = self
            .actions
            .iter()
            .flat_map(|a| [Some(a.begin_date), a.end_date])
            .flatten()
            .collect();
        points.sort();
        points.dedup();
        points
    }
}

fn build_node(
    index: usize,
    qualifying: &[&MountAction],
    children_of: &[Vec<usize>],
    visited: &mut [bool],
) -> Result<MountNode, IntegrityError> {
    visited[index] = true;
    let action = qualifying[index];
    let mut node = MountNode::new(
        action.entity.clone(),
        action.offset,
        action.begin_date,
        action.end_date,
    )
    .map_err(|_| IntegrityError::NonFiniteOffset {
        entity_id: action.entity.id().clone(),
    })?;
    for &child_index in &children_of[index] {
        // Keys are unique and linking is parent-of-child, so pushing
        // directly cannot violate the tree invariants.
        node.children
            .push(build_node(child_index, qualifying, children_of, visited)?);
    }
    Ok(node)
}
