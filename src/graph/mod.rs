//! Graph store for the interaction network.
//!
//! Nodes and edges live in arenas indexed by [`NodeId`] / [`EdgeId`].
//! Edges own their direction ledger and attribute map; nothing else holds
//! references into them.

mod edge;
mod node;
mod store;

pub use edge::{attr, Edge, EdgeId};
pub use node::{Node, NodeId};
pub use store::GraphStore;
