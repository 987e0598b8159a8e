//! Rooted taxonomy tree construction and traversal.
//!
//! The tree is an arena of [`Node`]s addressed by [`NodeIndex`]. Each node
//! stores its parent's index and an ordered list of child indices, so there
//! are no reference cycles and no shared ownership.
//!
//! # Structure
//!
//! ```text
//! edges (parent_id, id) ──► TreeBuilder ──► Tree (arena)
//!                               │
//!                               └── validation: unique ids, one root,
//!                                   resolvable parents, full reachability
//! ```
//!
//! Child order is the order in which edges were read. It is significant:
//! it fixes the depth-first traversal order and therefore the layout.

mod arena;
mod builder;
mod error;
mod node;
pub mod traverse;

pub use arena::Tree;
pub use builder::TreeBuilder;
pub use error::{MalformedInputError, TreeError};
pub use node::{Edge, Node, NodeIndex, TaxonId};
pub use traverse::Hierarchy;
