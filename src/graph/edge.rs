use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::combine::Combiner;
use crate::direction::DirectionLedger;
use crate::error::MergeError;
use crate::value::AttrValue;

use super::node::NodeId;

/// Names of the attributes every edge maintains.
pub mod attr {
    /// Set of resources with any evidence on the edge.
    pub const SOURCES: &str = "sources";
    /// Set of all literature references.
    pub const REFERENCES: &str = "references";
    /// Map of resource name to the set of references it cites.
    pub const REFS_BY_SOURCE: &str = "refs_by_source";
    /// Map of interaction type to the set of resources claiming it.
    pub const SOURCES_BY_TYPE: &str = "sources_by_type";
    /// Set of interaction types.
    pub const TYPE: &str = "type";
}

/// Arena handle of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub(crate) usize);

impl EdgeId {
    /// Position of the edge in the arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// The single edge between two nodes.
///
/// Endpoints are stored in the ledger's canonical order: `source` carries
/// the identifier that sorts first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub(crate) source: NodeId,
    pub(crate) target: NodeId,

    /// Direction and sign evidence.
    pub ledger: DirectionLedger,

    #[serde(default)]
    pub attrs: BTreeMap<String, AttrValue>,
}

impl Edge {
    pub(crate) fn new(source: NodeId, target: NodeId, ledger: DirectionLedger) -> Self {
        Self {
            source,
            target,
            ledger,
            attrs: BTreeMap::new(),
        }
    }

    /// Endpoints in canonical order.
    #[must_use]
    pub const fn endpoints(&self) -> (NodeId, NodeId) {
        (self.source, self.target)
    }

    /// The endpoint across from `node`, if `node` is an endpoint.
    #[must_use]
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if node == self.source {
            Some(self.target)
        } else if node == self.target {
            Some(self.source)
        } else {
            None
        }
    }

    /// Returns true if both endpoints are the same node.
    #[must_use]
    pub fn is_loop(&self) -> bool {
        self.source == self.target
    }

    /// Folds one resource's claim into the bookkeeping attributes.
    ///
    /// # Errors
    ///
    /// Fails with [`MergeError::IncompatibleAttributeTypes`] if a caller
    /// stored a differently shaped value under one of the [`attr`] keys.
    /// The attributes are left unchanged in that case.
    pub fn record_evidence(
        &mut self,
        combiner: &Combiner,
        source: &str,
        references: &BTreeSet<String>,
        interaction_type: &str,
    ) -> Result<(), MergeError> {
        let mut attrs = self.attrs.clone();
        Self::fold_evidence(combiner, &mut attrs, source, references, interaction_type)?;
        self.attrs = attrs;
        Ok(())
    }

    /// [`Self::record_evidence`] on a detached attribute map. May leave
    /// `attrs` half updated on error.
    pub(crate) fn fold_evidence(
        combiner: &Combiner,
        attrs: &mut BTreeMap<String, AttrValue>,
        source: &str,
        references: &BTreeSet<String>,
        interaction_type: &str,
    ) -> Result<(), MergeError> {
        let refs = AttrValue::Set(references.clone());
        combiner.combine_into(attrs, attr::SOURCES, AttrValue::set([source]))?;
        combiner.combine_into(attrs, attr::REFERENCES, refs.clone())?;
        combiner.combine_into(attrs, attr::REFS_BY_SOURCE, AttrValue::map([(source, refs)]))?;
        combiner.combine_into(
            attrs,
            attr::SOURCES_BY_TYPE,
            AttrValue::map([(interaction_type, AttrValue::set([source]))]),
        )?;
        combiner.combine_into(attrs, attr::TYPE, AttrValue::set([interaction_type]))
    }

    fn strings_of(&self, key: &str) -> BTreeSet<&str> {
        self.attrs.get(key).map(AttrValue::strings).unwrap_or_default()
    }

    fn nested_strings_of<'a>(&'a self, key: &str, inner: &str) -> BTreeSet<&'a str> {
        self.attrs
            .get(key)
            .and_then(AttrValue::as_map)
            .and_then(|m| m.get(inner))
            .map(AttrValue::strings)
            .unwrap_or_default()
    }

    /// Resources with any evidence on this edge.
    #[must_use]
    pub fn sources(&self) -> BTreeSet<&str> {
        self.strings_of(attr::SOURCES)
    }

    /// All literature references.
    #[must_use]
    pub fn references(&self) -> BTreeSet<&str> {
        self.strings_of(attr::REFERENCES)
    }

    /// References cited by one resource.
    #[must_use]
    pub fn references_of(&self, source: &str) -> BTreeSet<&str> {
        self.nested_strings_of(attr::REFS_BY_SOURCE, source)
    }

    /// Interaction types claimed for this edge.
    #[must_use]
    pub fn interaction_types(&self) -> BTreeSet<&str> {
        self.strings_of(attr::TYPE)
    }

    /// Resources claiming one interaction type.
    #[must_use]
    pub fn sources_of_type(&self, interaction_type: &str) -> BTreeSet<&str> {
        self.nested_strings_of(attr::SOURCES_BY_TYPE, interaction_type)
    }
}
