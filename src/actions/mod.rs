//! Action records: the engine's input boundary
//!
//! Two record shapes arrive from the external fetch layer: mount actions
//! (who was attached where, and when) and location actions (where a
//! configuration was declared to be, and when). Everything the engine
//! produces is derived from these flat lists.

pub mod location;
pub mod mount;
pub mod validate;

pub use location::{LocationAction, LocationActionType, LocationKind};
pub use mount::MountAction;
pub use validate::{validate_location_actions, validate_mount_actions, IssueSeverity, ValidationIssue};
