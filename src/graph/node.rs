use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityType, OriginalId};
use crate::value::AttrValue;

/// Arena handle of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in the arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A molecular entity of the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Canonical identifier (unique among live nodes).
    pub identifier: String,

    pub entity_type: EntityType,

    /// Namespace of the canonical identifier.
    pub id_type: String,

    /// NCBI taxonomy id.
    pub taxon: u32,

    /// Identifiers resources used for this node before translation.
    #[serde(default)]
    pub original_ids: BTreeSet<OriginalId>,

    #[serde(default)]
    pub attrs: BTreeMap<String, AttrValue>,
}

impl Node {
    /// Creates a node without attributes.
    #[must_use]
    pub fn new(
        identifier: impl Into<String>,
        entity_type: EntityType,
        id_type: impl Into<String>,
        taxon: u32,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            entity_type,
            id_type: id_type.into(),
            taxon,
            original_ids: BTreeSet::new(),
            attrs: BTreeMap::new(),
        }
    }

    /// Original identifiers of one namespace.
    pub fn original_ids_of<'a>(&'a self, id_type: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.original_ids
            .iter()
            .filter(move |o| o.id_type == id_type)
            .map(|o| o.name.as_str())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} ({}, taxon {})",
            self.id_type, self.identifier, self.entity_type, self.taxon
        )
    }
}
