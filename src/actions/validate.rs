//! Data-quality scan over action lists
//!
//! A non-failing audit: every finding becomes an issue instead of aborting
//! the scan, so upstream can show the full picture at once. The timeline
//! operations themselves still fail hard on the violations they cannot
//! work around.

use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::location::LocationAction;
use super::mount::MountAction;
use crate::hierarchy::NodeKey;

/// A finding from scanning an action list.
#[derive(Clone, Debug)]
pub struct ValidationIssue {
    pub item_id: Option<String>,
    pub severity: IssueSeverity,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IssueSeverity {
    Warning,
    Error,
}

impl ValidationIssue {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            item_id: None,
            severity: IssueSeverity::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            item_id: None,
            severity: IssueSeverity::Warning,
            message: message.into(),
        }
    }

    pub fn for_item(mut self, item_id: impl Into<String>) -> Self {
        self.item_id = Some(item_id.into());
        self
    }
}

/// Audit a mount action list against the invariants the timeline engine
/// depends on.
pub fn validate_mount_actions(actions: &[MountAction]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let mut seen_ids: HashSet<Uuid> = HashSet::new();
    for action in actions {
        if !seen_ids.insert(action.id) {
            issues.push(
                ValidationIssue::error(format!("duplicate mount action id {}", action.id))
                    .for_item(action.entity.id().clone()),
            );
        }

        if let Some(end) = action.end_date {
            if end <= action.begin_date {
                issues.push(
                    ValidationIssue::error(format!(
                        "mount of '{}' ends at or before it begins",
                        action.entity.id()
                    ))
                    .for_item(action.entity.id().clone()),
                );
            }
        }

        if !action.offset.is_finite() {
            issues.push(
                ValidationIssue::error(format!(
                    "mount of '{}' has a non-finite offset component",
                    action.entity.id()
                ))
                .for_item(action.entity.id().clone()),
            );
        }

        if action.parent_id.as_ref() == Some(action.entity.id()) {
            issues.push(
                ValidationIssue::error(format!(
                    "'{}' is recorded as mounted on itself",
                    action.entity.id()
                ))
                .for_item(action.entity.id().clone()),
            );
        }
    }

    // Overlapping commitments per entity. Two open-ended mounts always
    // overlap, which covers the "mounted twice without an unmount" case.
    let mut per_entity: HashMap<NodeKey, Vec<&MountAction>> = HashMap::new();
    for action in actions {
        per_entity.entry(action.entity.key()).or_default().push(action);
    }
    let mut flagged: Vec<NodeKey> = Vec::new();
    for (key, group) in &per_entity {
        let overlapping = group.iter().enumerate().any(|(i, a)| {
            group[i + 1..]
                .iter()
                .any(|b| a.overlaps(b.begin_date, b.end_date))
        });
        if overlapping {
            flagged.push(key.clone());
        }
    }
    flagged.sort();
    for key in flagged {
        issues.push(
            ValidationIssue::error(format!("{} has overlapping mount intervals", key))
                .for_item(key.id.clone()),
        );
    }

    // Dangling parents are legitimate at reconstruction time (the child is
    // promoted to a root), but worth surfacing to the maintainer.
    for action in actions {
        let Some(parent_id) = &action.parent_id else {
            continue;
        };
        if parent_id == action.entity.id() {
            continue;
        }
        let parent_mounted = actions.iter().any(|other| {
            other.entity.id() == parent_id && other.overlaps(action.begin_date, action.end_date)
        });
        if !parent_mounted {
            issues.push(
                ValidationIssue::warning(format!(
                    "parent '{}' of '{}' is not mounted during the mount interval",
                    parent_id,
                    action.entity.id()
                ))
                .for_item(action.entity.id().clone()),
            );
        }
    }

    issues
}

/// Audit a location action list: every end must close an earlier start of
/// the same id and kind, and no id may open or close twice.
pub fn validate_location_actions(actions: &[LocationAction]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let mut ordered: Vec<&LocationAction> = actions.iter().collect();
    ordered.sort_by_key(|a| a.timepoint);

    let mut open: HashMap<Uuid, &LocationAction> = HashMap::new();
    for action in ordered {
        if action.is_start() {
            if open.insert(action.id, action).is_some() {
                issues.push(
                    ValidationIssue::error(format!(
                        "location {} begins twice without an end",
                        action.id
                    ))
                    .for_item(action.id.to_string()),
                );
            }
            if action.label.as_deref().map_or(true, str::is_empty) {
                issues.push(
                    ValidationIssue::warning(format!("location {} has no label", action.id))
                        .for_item(action.id.to_string()),
                );
            }
        } else {
            match open.remove(&action.id) {
                Some(start) if start.kind() == action.kind() => {}
                _ => {
                    issues.push(
                        ValidationIssue::error(format!(
                            "location end {} has no open matching start",
                            action.id
                        ))
                        .for_item(action.id.to_string()),
                    );
                }
            }
        }
    }

    issues
}
