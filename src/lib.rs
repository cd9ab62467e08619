// Gantry - Mounting Hierarchy & Temporal Timeline Engine

pub mod actions;
pub mod availability;
pub mod hierarchy;
pub mod timeline;

pub use actions::{
    LocationAction, LocationActionType, LocationKind, MountAction, ValidationIssue,
};
pub use availability::Availability;
pub use hierarchy::{
    EntityId, EntityKind, EntityRef, HierarchyError, MountNode, MountTree, NodeKey, Offset,
};
pub use timeline::{IntegrityError, LocationInterval, LocationTimeline, MountingActionTimeline};
