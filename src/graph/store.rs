use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::combine::Combiner;
use crate::direction::DirectionLedger;
use crate::entity::{EntityType, OriginalId};
use crate::error::{IngestError, MergeError, NetworkResult};
use crate::value::AttrValue;

use super::edge::{Edge, EdgeId};
use super::node::{Node, NodeId};

const MAX_REDIRECT_HOPS: usize = 128;

/// Serialized form of a [`GraphStore`]. Lookup indexes are rebuilt on load.
#[derive(Serialize, Deserialize)]
struct GraphSnapshot {
    nodes: Vec<Option<Node>>,
    edges: Vec<Option<Edge>>,
    #[serde(default)]
    merged_into: BTreeMap<String, String>,
    #[serde(default)]
    combiner: Combiner,
}

/// In-memory node and edge tables of one network.
///
/// Nodes and edges live in arenas addressed by [`NodeId`] / [`EdgeId`].
/// Deleting a node or edge leaves a tombstone, so handles of other items stay
/// valid; handles of deleted items resolve to `None`.
///
/// # Examples
///
/// ```
/// use interactome::{EntityType, GraphStore};
///
/// let mut graph = GraphStore::new();
/// let a = graph.get_or_create_node("P00533", EntityType::Protein, "uniprot", 9606, None);
/// let b = graph.get_or_create_node("P01133", EntityType::Protein, "uniprot", 9606, None);
/// let e1 = graph.get_or_create_edge(a, b).unwrap();
/// let e2 = graph.get_or_create_edge(b, a).unwrap();
/// assert_eq!(e1, e2);
/// assert_eq!(graph.edge_count(), 1);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "GraphSnapshot", into = "GraphSnapshot")]
pub struct GraphStore {
    nodes: Vec<Option<Node>>,
    edges: Vec<Option<Edge>>,
    merged_into: BTreeMap<String, String>,
    combiner: Combiner,

    by_identifier: HashMap<String, NodeId>,
    edge_index: HashMap<(NodeId, NodeId), EdgeId>,
    incident: Vec<BTreeSet<EdgeId>>,
}

impl TryFrom<GraphSnapshot> for GraphStore {
    type Error = MergeError;

    fn try_from(snapshot: GraphSnapshot) -> Result<Self, Self::Error> {
        let mut store = Self {
            nodes: snapshot.nodes,
            edges: snapshot.edges,
            merged_into: snapshot.merged_into,
            combiner: snapshot.combiner,
            ..Self::default()
        };
        store.rebuild_indexes()?;
        Ok(store)
    }
}

impl From<GraphStore> for GraphSnapshot {
    fn from(store: GraphStore) -> Self {
        Self {
            nodes: store.nodes,
            edges: store.edges,
            merged_into: store.merged_into,
            combiner: store.combiner,
        }
    }
}

impl GraphStore {
    /// Creates an empty store with the default combiner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that unifies attributes with `combiner`.
    #[must_use]
    pub fn with_combiner(combiner: Combiner) -> Self {
        Self {
            combiner,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn combiner(&self) -> &Combiner {
        &self.combiner
    }

    /// Number of live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.by_identifier.len()
    }

    /// Number of live edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_index.len()
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0).and_then(Option::as_ref)
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Live nodes in handle order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|n| (NodeId(i), n)))
    }

    /// Live edges in handle order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (EdgeId(i), e)))
    }

    fn require_node(&self, id: NodeId) -> Result<&Node, MergeError> {
        self.node(id).ok_or_else(|| MergeError::NodeNotFound { id: id.to_string() })
    }

    fn require_edge(&self, id: EdgeId) -> Result<&Edge, MergeError> {
        self.edge(id).ok_or_else(|| MergeError::EdgeNotFound { id: id.to_string() })
    }

    /// Follows merge redirects from `identifier` to the identifier that
    /// replaced it. Identifiers never merged away resolve to themselves.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::UnknownIdentifier`] if the redirect chain
    /// loops or exceeds the hop limit.
    pub fn canonical_identifier<'a>(&'a self, identifier: &'a str) -> Result<&'a str, MergeError> {
        let mut current = identifier;
        for _ in 0..MAX_REDIRECT_HOPS {
            let Some(next) = self.merged_into.get(current) else {
                return Ok(current);
            };
            if next.as_str() == current {
                break;
            }
            current = next.as_str();
        }
        Err(MergeError::UnknownIdentifier {
            identifier: identifier.to_string(),
        })
    }

    /// Looks up a live node by identifier, following merge redirects.
    #[must_use]
    pub fn resolve_identifier(&self, identifier: &str) -> Option<NodeId> {
        let canonical = self.canonical_identifier(identifier).ok()?;
        self.by_identifier.get(canonical).copied()
    }

    /// Returns the node for `identifier`, creating it if needed.
    ///
    /// An existing node keeps its namespace and folds in the original
    /// identifier. When the entity type or taxon disagree, the smaller value
    /// is kept, so the outcome does not depend on which claim came first.
    pub fn get_or_create_node(
        &mut self,
        identifier: &str,
        entity_type: EntityType,
        id_type: &str,
        taxon: u32,
        original: Option<OriginalId>,
    ) -> NodeId {
        if let Some(id) = self.resolve_identifier(identifier) {
            if let Some(node) = self.node_mut(id) {
                if node.entity_type != entity_type || node.taxon != taxon {
                    debug!(
                        identifier,
                        existing_type = %node.entity_type,
                        incoming_type = %entity_type,
                        existing_taxon = node.taxon,
                        incoming_taxon = taxon,
                        "node kind mismatch; keeping the smaller"
                    );
                    if entity_type < node.entity_type {
                        node.entity_type = entity_type;
                    }
                    node.taxon = node.taxon.min(taxon);
                }
                node.original_ids.extend(original);
            }
            return id;
        }

        // A stale redirect (its target was deleted) must not shadow the new node.
        self.merged_into.remove(identifier);

        let id = NodeId(self.nodes.len());
        let mut node = Node::new(identifier, entity_type, id_type, taxon);
        node.original_ids.extend(original);
        self.nodes.push(Some(node));
        self.incident.push(BTreeSet::new());
        self.by_identifier.insert(identifier.to_string(), id);
        id
    }

    /// Folds `attrs` into a node's attributes. All-or-nothing.
    ///
    /// # Errors
    ///
    /// [`MergeError::NodeNotFound`] for a dead handle, or the combiner's
    /// error for an incompatible value.
    pub fn update_node_attrs(
        &mut self,
        id: NodeId,
        attrs: BTreeMap<String, AttrValue>,
    ) -> Result<(), MergeError> {
        let combined = self
            .combiner
            .combine_maps(self.require_node(id)?.attrs.clone(), attrs)?;
        if let Some(node) = self.node_mut(id) {
            node.attrs = combined;
        }
        Ok(())
    }

    /// Folds `attrs` into an edge's attributes. All-or-nothing.
    ///
    /// # Errors
    ///
    /// [`MergeError::EdgeNotFound`] for a dead handle, or the combiner's
    /// error for an incompatible value.
    pub fn update_edge_attrs(
        &mut self,
        id: EdgeId,
        attrs: BTreeMap<String, AttrValue>,
    ) -> Result<(), MergeError> {
        let combined = self
            .combiner
            .combine_maps(self.require_edge(id)?.attrs.clone(), attrs)?;
        if let Some(edge) = self.edge_mut(id) {
            edge.attrs = combined;
        }
        Ok(())
    }

    /// Sets `key` to `default` on every live node that lacks it.
    pub fn init_node_attr(&mut self, key: &str, default: &AttrValue) {
        for node in self.nodes.iter_mut().flatten() {
            node.attrs
                .entry(key.to_string())
                .or_insert_with(|| default.clone());
        }
    }

    /// Sets `key` to `default` on every live edge that lacks it.
    pub fn init_edge_attr(&mut self, key: &str, default: &AttrValue) {
        for edge in self.edges.iter_mut().flatten() {
            edge.attrs
                .entry(key.to_string())
                .or_insert_with(|| default.clone());
        }
    }

    /// Orders two nodes by identifier.
    fn canonical_pair(&self, a: NodeId, b: NodeId) -> Result<(NodeId, NodeId), MergeError> {
        let ia = &self.require_node(a)?.identifier;
        let ib = &self.require_node(b)?.identifier;
        Ok(if ia <= ib { (a, b) } else { (b, a) })
    }

    /// The edge between two nodes, in either order.
    #[must_use]
    pub fn find_edge(&self, a: NodeId, b: NodeId) -> Option<EdgeId> {
        let key = self.canonical_pair(a, b).ok()?;
        self.edge_index.get(&key).copied()
    }

    /// Returns the single edge between `a` and `b`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::NodeNotFound`] if either node is dead.
    pub fn get_or_create_edge(&mut self, a: NodeId, b: NodeId) -> Result<EdgeId, MergeError> {
        let key = self.canonical_pair(a, b)?;
        if let Some(id) = self.edge_index.get(&key) {
            return Ok(*id);
        }
        let ledger = DirectionLedger::new(
            self.require_node(key.0)?.identifier.clone(),
            self.require_node(key.1)?.identifier.clone(),
        );
        let id = EdgeId(self.edges.len());
        self.edges.push(Some(Edge::new(key.0, key.1, ledger)));
        self.edge_index.insert(key, id);
        self.link(id, key);
        Ok(id)
    }

    fn link(&mut self, edge: EdgeId, (a, b): (NodeId, NodeId)) {
        for n in [a, b] {
            if let Some(set) = self.incident.get_mut(n.0) {
                set.insert(edge);
            }
        }
    }

    fn unlink(&mut self, edge: EdgeId, (a, b): (NodeId, NodeId)) {
        for n in [a, b] {
            if let Some(set) = self.incident.get_mut(n.0) {
                set.remove(&edge);
            }
        }
    }

    /// Edges touching a node.
    pub fn edges_of(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.incident.get(node.0).into_iter().flatten().copied()
    }

    /// Nodes sharing an edge with `node`. A self-loop makes a node its own
    /// neighbour.
    #[must_use]
    pub fn neighbors(&self, node: NodeId) -> BTreeSet<NodeId> {
        self.edges_of(node)
            .filter_map(|e| self.edge(e).and_then(|e| e.other(node)))
            .collect()
    }

    /// Number of edges touching a node.
    #[must_use]
    pub fn degree(&self, node: NodeId) -> usize {
        self.incident.get(node.0).map_or(0, BTreeSet::len)
    }

    /// Deletes an edge and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::EdgeNotFound`] for a dead handle.
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<Edge, MergeError> {
        let edge = self
            .edges
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or_else(|| MergeError::EdgeNotFound { id: id.to_string() })?;
        let key = edge.endpoints();
        self.edge_index.remove(&key);
        self.unlink(id, key);
        Ok(edge)
    }

    /// Deletes a node together with its edges and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::NodeNotFound`] for a dead handle.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, MergeError> {
        self.require_node(id)?;
        let incident: Vec<EdgeId> = self.edges_of(id).collect();
        for e in incident {
            self.remove_edge(e)?;
        }
        let node = self
            .nodes
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or_else(|| MergeError::NodeNotFound { id: id.to_string() })?;
        self.by_identifier.remove(&node.identifier);
        Ok(node)
    }

    /// Collapses `ids` into one node.
    ///
    /// The primary defaults to the lowest live handle. Attributes of the
    /// other nodes are combined into the primary, their edges are re-pointed
    /// to it (edges that become parallel are merged, edges inside the group
    /// become self-loops), then they are deleted and their identifiers
    /// redirect to the primary's.
    ///
    /// Dead handles among `ids` are ignored, so calling this again with an
    /// overlapping set is harmless. The store is left unchanged on error.
    ///
    /// # Errors
    ///
    /// [`MergeError::NodeNotFound`] if `primary` is dead or no handle in
    /// `ids` is live; any combiner or ledger error while staging.
    pub fn merge_nodes(
        &mut self,
        ids: &[NodeId],
        primary: Option<NodeId>,
    ) -> Result<NodeId, MergeError> {
        let mut group: BTreeSet<NodeId> = ids
            .iter()
            .copied()
            .filter(|id| self.node(*id).is_some())
            .collect();
        let primary = match primary {
            Some(p) => {
                self.require_node(p)?;
                group.insert(p);
                p
            }
            None => *group.first().ok_or_else(|| MergeError::NodeNotFound {
                id: ids.first().map_or_else(|| "<none>".to_string(), ToString::to_string),
            })?,
        };
        let secondaries: Vec<NodeId> = group.iter().copied().filter(|id| *id != primary).collect();
        if secondaries.is_empty() {
            return Ok(primary);
        }

        // Stage the primary node.
        let mut merged = self.require_node(primary)?.clone();
        for &sec in &secondaries {
            let node = self.require_node(sec)?;
            merged.attrs = self.combiner.combine_maps(merged.attrs, node.attrs.clone())?;
            merged.original_ids.extend(node.original_ids.iter().cloned());
            merged
                .original_ids
                .insert(OriginalId::new(node.identifier.clone(), node.id_type.clone()));
        }

        let remap = |n: NodeId| if group.contains(&n) { primary } else { n };

        // Stage the re-pointed edges, grouped by their new endpoints.
        let affected: BTreeSet<EdgeId> = secondaries
            .iter()
            .flat_map(|&n| self.edges_of(n))
            .collect();
        let mut names: HashMap<String, String> = HashMap::new();
        let mut regrouped: BTreeMap<(NodeId, NodeId), Vec<EdgeId>> = BTreeMap::new();
        for &eid in &affected {
            let (a, b) = self.require_edge(eid)?.endpoints();
            for n in [a, b] {
                names.insert(
                    self.require_node(n)?.identifier.clone(),
                    self.require_node(remap(n))?.identifier.clone(),
                );
            }
            let key = self.canonical_pair(remap(a), remap(b))?;
            regrouped.entry(key).or_default().push(eid);
        }
        for (key, members) in &mut regrouped {
            if let Some(existing) = self.edge_index.get(key) {
                if !affected.contains(existing) {
                    let (a, b) = *key;
                    for n in [a, b] {
                        let ident = self.require_node(n)?.identifier.clone();
                        names.insert(ident.clone(), ident);
                    }
                    members.push(*existing);
                }
            }
            members.sort_unstable();
        }

        let mut staged: Vec<((NodeId, NodeId), EdgeId, Edge)> =
            Vec::with_capacity(regrouped.len());
        for (key, members) in &regrouped {
            let mut out: Option<Edge> = None;
            for &eid in members {
                let edge = self.require_edge(eid)?;
                let ledger = edge.ledger.translate(&names)?;
                match out.as_mut() {
                    None => {
                        let mut fresh = Edge::new(key.0, key.1, ledger);
                        fresh.attrs = edge.attrs.clone();
                        out = Some(fresh);
                    }
                    Some(acc) => {
                        acc.ledger.merge(&ledger)?;
                        acc.attrs = self
                            .combiner
                            .combine_maps(std::mem::take(&mut acc.attrs), edge.attrs.clone())?;
                    }
                }
            }
            if let (Some(edge), Some(&survivor)) = (out, members.first()) {
                staged.push((*key, survivor, edge));
            }
        }

        // Commit.
        let collapsed = regrouped.values().map(Vec::len).sum::<usize>() - staged.len();
        for &eid in &affected {
            if let Some(edge) = self.edges.get_mut(eid.0).and_then(Option::take) {
                let key = edge.endpoints();
                self.edge_index.remove(&key);
                self.unlink(eid, key);
            }
        }
        for (key, survivor, edge) in staged {
            if let Some(old) = self.edges.get_mut(survivor.0).and_then(Option::take) {
                let old_key = old.endpoints();
                self.edge_index.remove(&old_key);
                self.unlink(survivor, old_key);
            }
            if let Some(members) = regrouped.get(&key) {
                for &m in members.iter().filter(|m| **m != survivor) {
                    if let Some(dropped) = self.edges.get_mut(m.0).and_then(Option::take) {
                        let k = dropped.endpoints();
                        self.edge_index.remove(&k);
                        self.unlink(m, k);
                    }
                }
            }
            self.edges[survivor.0] = Some(edge);
            self.edge_index.insert(key, survivor);
            self.link(survivor, key);
        }

        let primary_identifier = merged.identifier.clone();
        for &sec in &secondaries {
            if let Some(node) = self.nodes.get_mut(sec.0).and_then(Option::take) {
                self.by_identifier.remove(&node.identifier);
                self.merged_into
                    .insert(node.identifier, primary_identifier.clone());
            }
            if let Some(set) = self.incident.get_mut(sec.0) {
                set.clear();
            }
        }
        self.nodes[primary.0] = Some(merged);

        debug!(
            primary = %primary_identifier,
            merged = secondaries.len(),
            edges_repointed = affected.len(),
            edges_collapsed = collapsed,
            "merged nodes"
        );
        Ok(primary)
    }

    /// Removes nodes without edges. Returns how many were removed.
    pub fn simplify(&mut self) -> usize {
        let isolated: Vec<NodeId> = self
            .nodes()
            .map(|(id, _)| id)
            .filter(|id| self.degree(*id) == 0)
            .collect();
        let removed = isolated
            .into_iter()
            .filter(|id| self.remove_node(*id).is_ok())
            .count();
        info!(removed, nodes = self.node_count(), "removed isolated nodes");
        removed
    }

    /// Removes nodes (and their edges) whose taxon is not in `taxa`.
    /// Returns how many nodes were removed.
    pub fn retain_taxa(&mut self, taxa: &BTreeSet<u32>) -> usize {
        let foreign: Vec<NodeId> = self
            .nodes()
            .filter(|(_, n)| !taxa.contains(&n.taxon))
            .map(|(id, _)| id)
            .collect();
        let removed = foreign
            .into_iter()
            .filter(|id| self.remove_node(*id).is_ok())
            .count();
        info!(removed, nodes = self.node_count(), "pruned nodes by taxon");
        removed
    }

    /// Folds every node, edge and redirect of `other` into this store.
    ///
    /// This is the reduction step of parallel ingestion. Nodes match by
    /// identifier (following this store's merge redirects), ledgers are
    /// merged and attributes combined. Evidence, sets, maps, numbers and
    /// node kinds come out the same whatever order several stores are
    /// absorbed in; list attributes keep arrival order. On error the
    /// evidence absorbed before the failing item stays in place.
    ///
    /// # Errors
    ///
    /// Any combiner or ledger error.
    pub fn absorb(&mut self, other: Self) -> Result<(), MergeError> {
        let mut mapping: HashMap<NodeId, NodeId> = HashMap::with_capacity(other.node_count());
        let mut names: HashMap<String, String> = HashMap::with_capacity(other.node_count());
        for (other_id, node) in other.nodes() {
            let id = self.get_or_create_node(
                &node.identifier,
                node.entity_type.clone(),
                &node.id_type,
                node.taxon,
                None,
            );
            if let Some(local) = self.node_mut(id) {
                local.original_ids.extend(node.original_ids.iter().cloned());
            }
            self.update_node_attrs(id, node.attrs.clone())?;
            names.insert(node.identifier.clone(), self.require_node(id)?.identifier.clone());
            mapping.insert(other_id, id);
        }

        for (_, edge) in other.edges() {
            let (a, b) = edge.endpoints();
            let (Some(&a), Some(&b)) = (mapping.get(&a), mapping.get(&b)) else {
                continue;
            };
            let ledger = edge.ledger.translate(&names)?;
            let eid = self.get_or_create_edge(a, b)?;
            let combined = self
                .combiner
                .combine_maps(self.require_edge(eid)?.attrs.clone(), edge.attrs.clone())?;
            if let Some(local) = self.edge_mut(eid) {
                local.ledger.merge(&ledger)?;
                local.attrs = combined;
            }
        }

        for (from, to) in other.merged_into {
            if !self.by_identifier.contains_key(&from) {
                self.merged_into.entry(from).or_insert(to);
            }
        }
        debug!(nodes = self.node_count(), edges = self.edge_count(), "absorbed store");
        Ok(())
    }

    /// Every resource with evidence anywhere in the graph.
    #[must_use]
    pub fn sources(&self) -> BTreeSet<&str> {
        self.edges()
            .flat_map(|(_, e)| e.ledger.sources().into_iter().chain(e.sources()))
            .collect()
    }

    /// Content hash of the live graph, independent of handle numbering and
    /// of the order evidence arrived in.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if an item cannot be encoded.
    pub fn digest(&self) -> NetworkResult<String> {
        let mut nodes: Vec<Vec<u8>> = self
            .nodes()
            .map(|(_, n)| serde_json::to_vec(n))
            .collect::<Result<_, _>>()?;
        nodes.sort_unstable();

        let mut edges: Vec<Vec<u8>> = Vec::with_capacity(self.edge_count());
        for (_, edge) in self.edges() {
            let (a, b) = edge.endpoints();
            let a = self.node(a).map(|n| n.identifier.as_str());
            let b = self.node(b).map(|n| n.identifier.as_str());
            edges.push(serde_json::to_vec(&(a, b, &edge.ledger, &edge.attrs))?);
        }
        edges.sort_unstable();

        let mut hasher = blake3::Hasher::new();
        for item in nodes.iter().chain(edges.iter()) {
            hasher.update(&(item.len() as u64).to_le_bytes());
            hasher.update(item);
        }
        Ok(hasher.finalize().to_hex().to_string())
    }

    /// Serializes the whole store.
    ///
    /// # Errors
    ///
    /// Returns a serialization error.
    pub fn to_json(&self) -> NetworkResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restores a store serialized with [`Self::to_json`].
    ///
    /// # Errors
    ///
    /// Returns a serialization error for malformed input, including edges
    /// that reference missing nodes.
    pub fn from_json(json: &str) -> NetworkResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Writes the store to a file.
    ///
    /// # Errors
    ///
    /// Returns a serialization or I/O error.
    pub fn write_json(&self, path: impl AsRef<Path>) -> NetworkResult<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(IngestError::from)?;
        Ok(())
    }

    /// Reads a store written with [`Self::write_json`].
    ///
    /// # Errors
    ///
    /// Returns a serialization or I/O error.
    pub fn read_json(path: impl AsRef<Path>) -> NetworkResult<Self> {
        let json = std::fs::read_to_string(path).map_err(IngestError::from)?;
        Self::from_json(&json)
    }

    fn rebuild_indexes(&mut self) -> Result<(), MergeError> {
        self.by_identifier.clear();
        self.edge_index.clear();
        self.incident = vec![BTreeSet::new(); self.nodes.len()];

        for (i, node) in self.nodes.iter().enumerate() {
            if let Some(node) = node {
                self.by_identifier.insert(node.identifier.clone(), NodeId(i));
            }
        }
        for i in 0..self.edges.len() {
            let Some(key) = self.edges[i].as_ref().map(Edge::endpoints) else {
                continue;
            };
            self.require_node(key.0)?;
            self.require_node(key.1)?;
            self.edge_index.insert(key, EdgeId(i));
            self.link(EdgeId(i), key);
        }
        Ok(())
    }
}
