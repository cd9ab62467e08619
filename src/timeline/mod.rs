//! Temporal timelines over action records
//!
//! Pure reconstruction: a flat list of time-stamped actions in, the state
//! of the world at a requested instant out. Nothing here mutates its
//! input, keeps a cache, or consults a clock; the instant is always an
//! explicit parameter.

pub mod location;
pub mod mounting;

pub use location::{LocationInterval, LocationTimeline};
pub use mounting::MountingActionTimeline;

use crate::hierarchy::EntityId;
use thiserror::Error;
use uuid::Uuid;

/// A violation of the invariants the engine depends on, found in the
/// input action lists. Surfaced instead of guessed around: picking a
/// resolution here would silently corrupt a physical equipment record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegrityError {
    #[error("entity {entity_id} has {count} mount actions in effect at the requested instant")]
    OverlappingMounts { entity_id: EntityId, count: usize },

    #[error("mount parent references loop back through entity {entity_id}")]
    ParentCycle { entity_id: EntityId },

    #[error("mount of {entity_id} carries a non-finite offset")]
    NonFiniteOffset { entity_id: EntityId },

    #[error("location end {id} has no open matching start")]
    UnmatchedEnd { id: Uuid },

    #[error("location {id} begins twice without an end")]
    DuplicateLocationEdge { id: Uuid },

    #[error("{count} location starts coincide at the decisive timepoint")]
    AmbiguousActiveLocation { count: usize },
}
