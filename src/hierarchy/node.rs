//! Mount node data model types
//!
//! A mount node records that one entity was attached somewhere with a
//! positional offset, valid over a half-open `[begin_date, end_date)`
//! interval. Nodes own their children, so a tree can never share a node
//! between two parents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::HierarchyError;

/// Backend identifier of a configuration, platform or device.
pub type EntityId = String;

/// 3D displacement of a mounted entity relative to its parent's frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Offset {
    pub const ZERO: Offset = Offset {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// True when every component is a finite number (no NaN or infinity).
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Component-wise vector sum.
    pub fn add(&self, other: &Offset) -> Offset {
        Offset::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

/// The kind of entity a node refers to.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub enum EntityKind {
    Configuration,
    Platform,
    Device,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Configuration => write!(f, "configuration"),
            EntityKind::Platform => write!(f, "platform"),
            EntityKind::Device => write!(f, "device"),
        }
    }
}

/// Tagged reference to the backend entity a node stands for.
///
/// A configuration only ever appears as the reference frame a tree hangs
/// off, so it carries no display label.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum EntityRef {
    Configuration { id: EntityId },
    Platform { id: EntityId, label: String },
    Device { id: EntityId, label: String },
}

impl EntityRef {
    pub fn configuration(id: impl Into<EntityId>) -> Self {
        EntityRef::Configuration { id: id.into() }
    }

    pub fn platform(id: impl Into<EntityId>, label: impl Into<String>) -> Self {
        EntityRef::Platform {
            id: id.into(),
            label: label.into(),
        }
    }

    pub fn device(id: impl Into<EntityId>, label: impl Into<String>) -> Self {
        EntityRef::Device {
            id: id.into(),
            label: label.into(),
        }
    }

    pub fn id(&self) -> &EntityId {
        match self {
            EntityRef::Configuration { id } => id,
            EntityRef::Platform { id, .. } => id,
            EntityRef::Device { id, .. } => id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Configuration { .. } => EntityKind::Configuration,
            EntityRef::Platform { .. } => EntityKind::Platform,
            EntityRef::Device { .. } => EntityKind::Device,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            EntityRef::Configuration { .. } => None,
            EntityRef::Platform { label, .. } => Some(label),
            EntityRef::Device { label, .. } => Some(label),
        }
    }

    pub fn key(&self) -> NodeKey {
        NodeKey {
            kind: self.kind(),
            id: self.id().clone(),
        }
    }
}

/// Identity of a node within a tree snapshot: entity kind plus entity id.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub struct NodeKey {
    pub kind: EntityKind,
    pub id: EntityId,
}

impl NodeKey {
    pub fn new(kind: EntityKind, id: impl Into<EntityId>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn configuration(id: impl Into<EntityId>) -> Self {
        Self::new(EntityKind::Configuration, id)
    }

    pub fn platform(id: impl Into<EntityId>) -> Self {
        Self::new(EntityKind::Platform, id)
    }

    pub fn device(id: impl Into<EntityId>) -> Self {
        Self::new(EntityKind::Device, id)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// A node in a mount tree.
///
/// Children are kept in mount order. A missing end date means the entity
/// is still mounted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MountNode {
    pub(crate) entity: EntityRef,
    pub(crate) offset: Offset,
    pub(crate) begin_date: DateTime<Utc>,
    pub(crate) end_date: Option<DateTime<Utc>>,
    pub(crate) children: Vec<MountNode>,
}

impl MountNode {
    /// Build a childless node. Rejects non-finite offset components.
    pub fn new(
        entity: EntityRef,
        offset: Offset,
        begin_date: DateTime<Utc>,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<Self, HierarchyError> {
        if !offset.is_finite() {
            return Err(HierarchyError::NonFiniteOffset(entity.key()));
        }
        Ok(Self {
            entity,
            offset,
            begin_date,
            end_date,
            children: Vec::new(),
        })
    }

    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    pub fn key(&self) -> NodeKey {
        self.entity.key()
    }

    pub fn offset(&self) -> Offset {
        self.offset
    }

    pub fn begin_date(&self) -> DateTime<Utc> {
        self.begin_date
    }

    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        self.end_date
    }

    pub fn children(&self) -> &[MountNode] {
        &self.children
    }

    /// True when the node has no end date, i.e. the entity is still mounted.
    pub fn is_open(&self) -> bool {
        self.end_date.is_none()
    }

    /// Half-open containment: `begin_date <= t` and, when an end date
    /// exists, `t < end_date`. `None` asks about "now" and matches only
    /// open-ended nodes.
    pub fn is_active_at(&self, at: Option<DateTime<Utc>>) -> bool {
        match at {
            None => self.end_date.is_none(),
            Some(t) => self.begin_date <= t && self.end_date.map_or(true, |end| t < end),
        }
    }

    /// Attach a child directly to this detached node.
    ///
    /// Fails with `Cycle` when the child's subtree carries this node's own
    /// key, and with `Duplicate` when a sibling already carries the
    /// child's key. The node is unchanged on failure.
    pub fn push_child(&mut self, child: MountNode) -> Result<(), HierarchyError> {
        if child.subtree_keys().contains(&self.key()) {
            return Err(HierarchyError::Cycle(self.key()));
        }
        if self.children.iter().any(|c| c.key() == child.key()) {
            return Err(HierarchyError::Duplicate(child.key()));
        }
        self.children.push(child);
        Ok(())
    }

    /// Keys of this node and every descendant.
    pub(crate) fn subtree_keys(&self) -> HashSet<NodeKey> {
        let mut keys = HashSet::new();
        self.collect_keys(&mut keys);
        keys
    }

    fn collect_keys(&self, out: &mut HashSet<NodeKey>) {
        out.insert(self.key());
        for child in &self.children {
            child.collect_keys(out);
        }
    }

    /// First node in this subtree whose offset has a non-finite component.
    pub(crate) fn find_non_finite(&self) -> Option<NodeKey> {
        if !self.offset.is_finite() {
            return Some(self.key());
        }
        self.children.iter().find_map(|c| c.find_non_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_offset_add() {
        let a = Offset::new(1.0, 2.0, 3.0);
        let b = Offset::new(4.0, 5.0, 6.0);
        assert_eq!(a.add(&b), Offset::new(5.0, 7.0, 9.0));
    }

    #[test]
    fn test_non_finite_offset_rejected() {
        let result = MountNode::new(
            EntityRef::device("d1", "Thermometer"),
            Offset::new(f64::NAN, 0.0, 0.0),
            date(2021, 1, 1),
            None,
        );
        assert_eq!(
            result.unwrap_err(),
            HierarchyError::NonFiniteOffset(NodeKey::device("d1"))
        );
    }

    #[test]
    fn test_half_open_interval() {
        let node = MountNode::new(
            EntityRef::device("d1", "Thermometer"),
            Offset::ZERO,
            date(2020, 1, 1),
            Some(date(2020, 2, 1)),
        )
        .unwrap();

        assert!(node.is_active_at(Some(date(2020, 1, 1))));
        assert!(node.is_active_at(Some(date(2020, 1, 31))));
        assert!(!node.is_active_at(Some(date(2020, 2, 1))));
        // Closed nodes are never part of the current tree.
        assert!(!node.is_active_at(None));
    }

    #[test]
    fn test_push_child_rejects_own_key() {
        let mut parent = MountNode::new(
            EntityRef::platform("p1", "Mast"),
            Offset::ZERO,
            date(2021, 1, 1),
            None,
        )
        .unwrap();
        let impostor = MountNode::new(
            EntityRef::platform("p1", "Mast again"),
            Offset::ZERO,
            date(2021, 1, 1),
            None,
        )
        .unwrap();

        assert_eq!(
            parent.push_child(impostor).unwrap_err(),
            HierarchyError::Cycle(NodeKey::platform("p1"))
        );
        assert!(parent.children().is_empty());
    }

    #[test]
    fn test_push_child_rejects_duplicate_sibling() {
        let mut parent = MountNode::new(
            EntityRef::platform("p1", "Mast"),
            Offset::ZERO,
            date(2021, 1, 1),
            None,
        )
        .unwrap();
        let make_child = || {
            MountNode::new(
                EntityRef::device("d1", "Anemometer"),
                Offset::ZERO,
                date(2021, 1, 2),
                None,
            )
            .unwrap()
        };

        parent.push_child(make_child()).unwrap();
        assert_eq!(
            parent.push_child(make_child()).unwrap_err(),
            HierarchyError::Duplicate(NodeKey::device("d1"))
        );
        assert_eq!(parent.children().len(), 1);
    }

    #[test]
    fn test_same_id_different_kind_is_distinct() {
        let mut parent = MountNode::new(
            EntityRef::platform("x", "Mast"),
            Offset::ZERO,
            date(2021, 1, 1),
            None,
        )
        .unwrap();
        let device = MountNode::new(
            EntityRef::device("x", "Sensor"),
            Offset::ZERO,
            date(2021, 1, 1),
            None,
        )
        .unwrap();

        // Identity is kind plus id, so a device may share a bare id with
        // its platform parent.
        assert!(parent.push_child(device).is_ok());
    }
}
