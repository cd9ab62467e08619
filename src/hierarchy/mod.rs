//! Mounting hierarchy: nodes and trees
//!
//! A configuration's physical setup is a forest of platforms and devices
//! nested via mount events, each carrying a positional offset relative to
//! its parent. The tree owns its nodes, mutations are all-or-nothing, and
//! every failure leaves the structure exactly as it was.

pub mod node;
pub mod tree;

pub use node::{EntityId, EntityKind, EntityRef, MountNode, NodeKey, Offset};
pub use tree::{MountTree, Preorder};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HierarchyError {
    #[error("no node {0} in the tree")]
    NotFound(NodeKey),

    #[error("inserting under {0} would make a node its own descendant")]
    Cycle(NodeKey),

    #[error("a node {0} already exists at this level")]
    Duplicate(NodeKey),

    #[error("offset of {0} has a non-finite component")]
    NonFiniteOffset(NodeKey),
}
