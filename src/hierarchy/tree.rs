//! The mount tree: an ordered forest with all-or-nothing mutations
//!
//! Lookup is plain traversal over the owned nodes; there is no cached
//! index. Every mutating operation validates before it touches the
//! structure.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::node::{EntityId, EntityRef, MountNode, NodeKey, Offset};
use super::HierarchyError;
use crate::actions::MountAction;

/// An ordered forest of mount nodes.
///
/// Roots are entities mounted directly on the configuration's reference
/// frame, in mount order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MountTree {
    pub(crate) roots: Vec<MountNode>,
}

impl MountTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roots(&self) -> &[MountNode] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of nodes in the forest.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.find(key).is_some()
    }

    /// Attach `node` (and its subtree) under `parent`, or as a new root
    /// when `parent` is `None`.
    ///
    /// Fails with `NotFound` when the parent key resolves to nothing,
    /// `Cycle` when the incoming subtree carries a key already on the
    /// ancestor path, and `Duplicate` when it carries a key already
    /// present anywhere else in the tree. The tree is unchanged on
    /// failure.
    pub fn insert(
        &mut self,
        parent: Option<&NodeKey>,
        node: MountNode,
    ) -> Result<(), HierarchyError> {
        if let Some(bad) = node.find_non_finite() {
            return Err(HierarchyError::NonFiniteOffset(bad));
        }
        let subtree = node.subtree_keys();

        if let Some(parent_key) = parent {
            let ancestor_path = self
                .path_nodes(parent_key)
                .ok_or_else(|| HierarchyError::NotFound(parent_key.clone()))?;
            if let Some(hit) = ancestor_path
                .iter()
                .map(|n| n.key())
                .find(|k| subtree.contains(k))
            {
                return Err(HierarchyError::Cycle(hit));
            }
        }
        if let Some(dup) = self.iter().map(|n| n.key()).find(|k| subtree.contains(k)) {
            return Err(HierarchyError::Duplicate(dup));
        }

        match parent {
            None => {
                self.roots.push(node);
                Ok(())
            }
            Some(parent_key) => match self.find_mut(parent_key) {
                Some(parent_node) => {
                    parent_node.children.push(node);
                    Ok(())
                }
                None => Err(HierarchyError::NotFound(parent_key.clone())),
            },
        }
    }

    /// Detach the node with `key` and splice its children into the former
    /// parent's child list (or the root list) at the node's old position.
    ///
    /// Offsets are not recomputed: a child's offset stays relative to the
    /// mount action that originally attached it. Returns the detached
    /// node, childless.
    pub fn remove(&mut self, key: &NodeKey) -> Result<MountNode, HierarchyError> {
        Self::remove_in(&mut self.roots, key)
            .ok_or_else(|| HierarchyError::NotFound(key.clone()))
    }

    fn remove_in(nodes: &mut Vec<MountNode>, key: &NodeKey) -> Option<MountNode> {
        if let Some(pos) = nodes.iter().position(|n| n.key() == *key) {
            let mut node = nodes.remove(pos);
            let orphans = std::mem::take(&mut node.children);
            nodes.splice(pos..pos, orphans);
            return Some(node);
        }
        for node in nodes.iter_mut() {
            if let Some(found) = Self::remove_in(&mut node.children, key) {
                return Some(found);
            }
        }
        None
    }

    /// The node with `key`, reflecting the current tree shape exactly.
    pub fn find(&self, key: &NodeKey) -> Option<&MountNode> {
        self.iter().find(|n| n.key() == *key)
    }

    fn find_mut(&mut self, key: &NodeKey) -> Option<&mut MountNode> {
        fn find_in<'a>(nodes: &'a mut [MountNode], key: &NodeKey) -> Option<&'a mut MountNode> {
            for node in nodes {
                if node.key() == *key {
                    return Some(node);
                }
                if let Some(found) = find_in(&mut node.children, key) {
                    return Some(found);
                }
            }
            None
        }
        find_in(&mut self.roots, key)
    }

    /// Vector sum of offsets along the root-to-node path, inclusive.
    pub fn cumulative_offset(&self, key: &NodeKey) -> Result<Offset, HierarchyError> {
        let path = self
            .path_nodes(key)
            .ok_or_else(|| HierarchyError::NotFound(key.clone()))?;
        Ok(path
            .iter()
            .fold(Offset::ZERO, |acc, node| acc.add(&node.offset)))
    }

    /// Entity references along the root-to-node path, inclusive. Feeds
    /// breadcrumb displays upstream.
    pub fn path(&self, key: &NodeKey) -> Result<Vec<&EntityRef>, HierarchyError> {
        let path = self
            .path_nodes(key)
            .ok_or_else(|| HierarchyError::NotFound(key.clone()))?;
        Ok(path.iter().map(|node| &node.entity).collect())
    }

    fn path_nodes(&self, key: &NodeKey) -> Option<Vec<&MountNode>> {
        fn descend<'a>(
            nodes: &'a [MountNode],
            key: &NodeKey,
            path: &mut Vec<&'a MountNode>,
        ) -> bool {
            for node in nodes {
                path.push(node);
                if node.key() == *key || descend(&node.children, key, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        if descend(&self.roots, key, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    /// Lazy pre-order traversal: roots in stored order, each node's
    /// children before its siblings.
    pub fn iter(&self) -> Preorder<'_> {
        Preorder {
            stack: self.roots.iter().rev().collect(),
        }
    }

    /// Export the forest back into mount action records.
    ///
    /// Configuration frame nodes are implicit in the action list: their
    /// children export as actions with no parent. Action ids are freshly
    /// minted; the external service layer owns persisted identities.
    pub fn to_mount_actions(&self, configuration_id: impl Into<EntityId>) -> Vec<MountAction> {
        let configuration_id = configuration_id.into();
        let mut out = Vec::new();
        for root in &self.roots {
            Self::export_node(root, None, &configuration_id, &mut out);
        }
        out
    }

    fn export_node(
        node: &MountNode,
        parent: Option<&EntityId>,
        configuration_id: &EntityId,
        out: &mut Vec<MountAction>,
    ) {
        if let EntityRef::Configuration { .. } = node.entity {
            for child in &node.children {
                Self::export_node(child, None, configuration_id, out);
            }
            return;
        }
        out.push(MountAction {
            id: Uuid::new_v4(),
            configuration_id: configuration_id.clone(),
            entity: node.entity.clone(),
            parent_id: parent.cloned(),
            begin_date: node.begin_date,
            end_date: node.end_date,
            offset: node.offset,
        });
        for child in &node.children {
            Self::export_node(child, Some(node.entity.id()), configuration_id, out);
        }
    }
}

/// Pre-order iterator over a tree, driven by an explicit stack.
pub struct Preorder<'a> {
    stack: Vec<&'a MountNode>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a MountNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn platform(id: &str, offset: Offset) -> MountNode {
        MountNode::new(
            EntityRef::platform(id, format!("Platform {}", id)),
            offset,
            date(2021, 1, 1),
            None,
        )
        .unwrap()
    }

    fn device(id: &str, offset: Offset) -> MountNode {
        MountNode::new(
            EntityRef::device(id, format!("Device {}", id)),
            offset,
            date(2021, 1, 1),
            None,
        )
        .unwrap()
    }

    fn sample_tree() -> MountTree {
        // p1 ── p2 ── d1
        //   └── d2
        let mut tree = MountTree::new();
        tree.insert(None, platform("p1", Offset::new(1.0, 2.0, 3.0)))
            .unwrap();
        tree.insert(
            Some(&NodeKey::platform("p1")),
            platform("p2", Offset::new(4.0, 5.0, 6.0)),
        )
        .unwrap();
        tree.insert(
            Some(&NodeKey::platform("p2")),
            device("d1", Offset::new(0.5, 0.5, 0.5)),
        )
        .unwrap();
        tree.insert(
            Some(&NodeKey::platform("p1")),
            device("d2", Offset::ZERO),
        )
        .unwrap();
        tree
    }

    #[test]
    fn test_insert_and_find() {
        let tree = sample_tree();
        assert_eq!(tree.len(), 4);
        assert!(tree.contains(&NodeKey::device("d1")));
        assert!(!tree.contains(&NodeKey::device("p1")));

        let p2 = tree.find(&NodeKey::platform("p2")).unwrap();
        assert_eq!(p2.children().len(), 1);
    }

    #[test]
    fn test_insert_unknown_parent() {
        let mut tree = sample_tree();
        let err = tree
            .insert(Some(&NodeKey::platform("ghost")), device("d9", Offset::ZERO))
            .unwrap_err();
        assert_eq!(err, HierarchyError::NotFound(NodeKey::platform("ghost")));
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_insert_cycle_rejected() {
        let mut tree = sample_tree();
        // A subtree carrying p1's key may not land under p2.
        let mut subtree = device("d3", Offset::ZERO);
        subtree
            .push_child(platform("p1", Offset::ZERO))
            .unwrap();

        let err = tree
            .insert(Some(&NodeKey::platform("p2")), subtree)
            .unwrap_err();
        assert_eq!(err, HierarchyError::Cycle(NodeKey::platform("p1")));
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_insert_duplicate_elsewhere_rejected() {
        let mut tree = sample_tree();
        // d2 already lives under p1; a second d2 under p2 would make the
        // key appear twice.
        let err = tree
            .insert(Some(&NodeKey::platform("p2")), device("d2", Offset::ZERO))
            .unwrap_err();
        assert_eq!(err, HierarchyError::Duplicate(NodeKey::device("d2")));
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_remove_splices_children_in_place() {
        let mut tree = sample_tree();
        let removed = tree.remove(&NodeKey::platform("p2")).unwrap();
        assert!(removed.children().is_empty());

        // d1 now hangs off p1, at p2's former position, before d2.
        let p1 = tree.find(&NodeKey::platform("p1")).unwrap();
        let child_keys: Vec<NodeKey> = p1.children().iter().map(|c| c.key()).collect();
        assert_eq!(
            child_keys,
            vec![NodeKey::device("d1"), NodeKey::device("d2")]
        );
        // Offsets stay as recorded by the original mount.
        assert_eq!(p1.children()[0].offset(), Offset::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn test_remove_root_promotes_children() {
        let mut tree = sample_tree();
        tree.remove(&NodeKey::platform("p1")).unwrap();
        let root_keys: Vec<NodeKey> = tree.roots().iter().map(|r| r.key()).collect();
        assert_eq!(
            root_keys,
            vec![NodeKey::platform("p2"), NodeKey::device("d2")]
        );
    }

    #[test]
    fn test_remove_unknown() {
        let mut tree = sample_tree();
        assert_eq!(
            tree.remove(&NodeKey::device("ghost")).unwrap_err(),
            HierarchyError::NotFound(NodeKey::device("ghost"))
        );
    }

    #[test]
    fn test_cumulative_offset() {
        let tree = sample_tree();
        let sum = tree.cumulative_offset(&NodeKey::platform("p2")).unwrap();
        assert_eq!(sum, Offset::new(5.0, 7.0, 9.0));

        let deep = tree.cumulative_offset(&NodeKey::device("d1")).unwrap();
        assert_eq!(deep, Offset::new(5.5, 7.5, 9.5));

        assert_eq!(
            tree.cumulative_offset(&NodeKey::device("ghost")).unwrap_err(),
            HierarchyError::NotFound(NodeKey::device("ghost"))
        );
    }

    #[test]
    fn test_preorder_children_before_siblings() {
        let tree = sample_tree();
        let order: Vec<NodeKey> = tree.iter().map(|n| n.key()).collect();
        assert_eq!(
            order,
            vec![
                NodeKey::platform("p1"),
                NodeKey::platform("p2"),
                NodeKey::device("d1"),
                NodeKey::device("d2"),
            ]
        );
    }

    #[test]
    fn test_path() {
        let tree = sample_tree();
        let path = tree.path(&NodeKey::device("d1")).unwrap();
        let ids: Vec<&EntityId> = path.iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec!["p1", "p2", "d1"]);
    }

    #[test]
    fn test_export_parent_links() {
        let tree = sample_tree();
        let actions = tree.to_mount_actions("c1");
        assert_eq!(actions.len(), 4);

        let d1 = actions
            .iter()
            .find(|a| a.entity.id() == "d1")
            .unwrap();
        assert_eq!(d1.parent_id.as_deref(), Some("p2"));
        assert_eq!(d1.configuration_id, "c1");

        let p1 = actions
            .iter()
            .find(|a| a.entity.id() == "p1")
            .unwrap();
        assert_eq!(p1.parent_id, None);
    }
}
