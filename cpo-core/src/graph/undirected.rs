//! Undirected Graph
//!
//! The base graph container. Nodes and edges live in labeled lists, so each
//! present element has a dense label that other structures (such as the
//! closure matrix) can index by. A weight index provides the reverse mapping
//! from weights to elements.
//!
//! Every structural mutation bumps [`Graph::change_count`]. Derived
//! computations cache that value next to their result and recompute when it
//! no longer matches.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use smallvec::SmallVec;

use super::element::{Edge, EdgeId, Element, Node, NodeId};
use super::element_list::ElementList;
use super::labeled_list::LabeledList;
use crate::error::{Error, Result};

/// Incident edges of one node. Most nodes in practice have a handful.
pub(crate) type Incidence = SmallVec<[EdgeId; 4]>;

/// A graph whose edges have no orientation.
#[derive(Debug, Clone)]
pub struct Graph<W> {
    nodes: LabeledList<NodeId, Node<W>>,
    edges: LabeledList<EdgeId, Edge<W>>,
    node_weights: ElementList<W, NodeId>,
    edge_weights: ElementList<W, EdgeId>,
    incidence: HashMap<NodeId, Incidence>,
    change_count: u64,
}

impl<W> Graph<W>
where
    W: Clone + Eq + Hash + Debug,
{
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Create an empty graph with room for the given number of elements.
    pub fn with_capacity(node_count: usize, edge_count: usize) -> Self {
        Self {
            nodes: LabeledList::with_capacity(node_count),
            edges: LabeledList::with_capacity(edge_count),
            node_weights: ElementList::with_capacity(node_count),
            edge_weights: ElementList::new(),
            incidence: HashMap::with_capacity(node_count),
            change_count: 0,
        }
    }

    /// Add a node carrying `weight`.
    ///
    /// Fails if a node with an equal weight is already present.
    pub fn add(&mut self, weight: W) -> Result<NodeId> {
        if self.node_weights.contains(&weight) {
            return Err(Error::DuplicateWeight(format!("{weight:?}")));
        }
        let node = Node::new(weight.clone());
        let id = node.id();
        self.node_weights.insert(weight, id);
        self.insert_node(node);
        Ok(id)
    }

    /// Add a node without a weight.
    pub fn add_unweighted(&mut self) -> NodeId {
        let node = Node::unweighted();
        let id = node.id();
        self.insert_node(node);
        id
    }

    fn insert_node(&mut self, node: Node<W>) {
        let id = node.id();
        self.nodes.insert(id, node);
        self.incidence.insert(id, Incidence::new());
        self.change_count += 1;
    }

    /// Add an unweighted edge between two nodes of this graph.
    ///
    /// Parallel edges are allowed and are distinct edges.
    pub fn add_edge(&mut self, n1: NodeId, n2: NodeId) -> Result<EdgeId> {
        self.insert_edge(Edge::new(n1, n2, None))
    }

    /// Add a weighted edge between two nodes of this graph.
    pub fn add_weighted_edge(&mut self, n1: NodeId, n2: NodeId, weight: W) -> Result<EdgeId> {
        self.insert_edge(Edge::new(n1, n2, Some(weight)))
    }

    /// Add an edge between the nodes carrying `w1` and `w2`.
    pub fn add_edge_between(&mut self, w1: &W, w2: &W) -> Result<EdgeId> {
        let n1 = self.node_with_weight(w1)?;
        let n2 = self.node_with_weight(w2)?;
        self.add_edge(n1, n2)
    }

    fn insert_edge(&mut self, edge: Edge<W>) -> Result<EdgeId> {
        let (source, sink) = (edge.source(), edge.sink());
        for endpoint in [source, sink] {
            if !self.nodes.contains(&endpoint) {
                return Err(Error::NodeNotFound(endpoint));
            }
        }

        let id = edge.id();
        if let Some(weight) = edge.weight_opt() {
            self.edge_weights.insert(weight.clone(), id);
        }
        self.edges.insert(id, edge);

        self.incidence.entry(source).or_default().push(id);
        if sink != source {
            self.incidence.entry(sink).or_default().push(id);
        }
        self.change_count += 1;
        Ok(id)
    }

    /// Remove an edge. Labels of later edges shift down by one.
    pub fn remove_edge(&mut self, edge: EdgeId) -> Result<Edge<W>> {
        let removed = self.edges.remove(&edge).ok_or(Error::EdgeNotFound(edge))?;
        for endpoint in [removed.source(), removed.sink()] {
            if let Some(incident) = self.incidence.get_mut(&endpoint) {
                incident.retain(|other| *other != edge);
            }
        }
        if let Some(weight) = removed.weight_opt() {
            self.edge_weights.remove(weight, edge);
        }
        self.change_count += 1;
        Ok(removed)
    }

    /// Remove a node and every edge incident to it.
    pub fn remove_node(&mut self, node: NodeId) -> Result<Node<W>> {
        let incident = self.incident_edges(node)?.to_vec();
        for edge in incident {
            self.remove_edge(edge)?;
        }

        let removed = self.nodes.remove(&node).ok_or(Error::NodeNotFound(node))?;
        self.incidence.remove(&node);
        if let Some(weight) = removed.weight_opt() {
            self.node_weights.remove(weight, node);
        }
        self.change_count += 1;
        Ok(removed)
    }

    /// Replace the weight of a node.
    ///
    /// The new weight must not be carried by another node.
    pub fn set_node_weight(&mut self, node: NodeId, weight: W) -> Result<()> {
        if let Some(owner) = self.node_weights.first(&weight) {
            if owner == node {
                return Ok(());
            }
            return Err(Error::DuplicateWeight(format!("{weight:?}")));
        }
        let entry = self.nodes.get_mut(&node).ok_or(Error::NodeNotFound(node))?;
        if let Some(old) = entry.set_weight(weight.clone()) {
            self.node_weights.remove(&old, node);
        }
        self.node_weights.insert(weight, node);
        self.change_count += 1;
        Ok(())
    }

    /// Replace the weight of an edge. Edge weights need not be unique.
    pub fn set_edge_weight(&mut self, edge: EdgeId, weight: W) -> Result<()> {
        let entry = self.edges.get_mut(&edge).ok_or(Error::EdgeNotFound(edge))?;
        if let Some(old) = entry.set_weight(weight.clone()) {
            self.edge_weights.remove(&old, edge);
        }
        self.edge_weights.insert(weight, edge);
        self.change_count += 1;
        Ok(())
    }

    /// Number of structural mutations so far. Never decreases.
    pub fn change_count(&self) -> u64 {
        self.change_count
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All node ids in label order.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.nodes.keys().collect()
    }

    /// All edge ids in label order.
    pub fn edges(&self) -> Vec<EdgeId> {
        self.edges.keys().collect()
    }

    pub fn node(&self, id: NodeId) -> Result<&Node<W>> {
        self.nodes.get(&id).ok_or(Error::NodeNotFound(id))
    }

    pub fn edge(&self, id: EdgeId) -> Result<&Edge<W>> {
        self.edges.get(&id).ok_or(Error::EdgeNotFound(id))
    }

    /// The weight of a node; a weight error if it is unweighted.
    pub fn node_weight(&self, id: NodeId) -> Result<&W> {
        self.node(id)?.weight()
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edges.contains(&id)
    }

    /// Whether some node carries `weight`.
    pub fn contains_weight(&self, weight: &W) -> bool {
        self.node_weights.contains(weight)
    }

    /// The node carrying `weight`.
    pub fn node_with_weight(&self, weight: &W) -> Result<NodeId> {
        self.node_weights
            .first(weight)
            .ok_or_else(|| Error::WeightNotFound(format!("{weight:?}")))
    }

    /// All edges carrying `weight`, in insertion order.
    pub fn edges_with_weight(&self, weight: &W) -> &[EdgeId] {
        self.edge_weights.get(weight)
    }

    pub fn node_label(&self, id: NodeId) -> Result<usize> {
        self.nodes.label(&id).ok_or(Error::NodeNotFound(id))
    }

    pub fn edge_label(&self, id: EdgeId) -> Result<usize> {
        self.edges.label(&id).ok_or(Error::EdgeNotFound(id))
    }

    /// The node currently holding `label`.
    pub fn node_at(&self, label: usize) -> Option<NodeId> {
        self.nodes.key_at(label)
    }

    pub(crate) fn edge_entries(&self) -> impl Iterator<Item = &Edge<W>> + '_ {
        self.edges.values()
    }

    /// Edges touching `node`. A self loop appears once.
    pub fn incident_edges(&self, node: NodeId) -> Result<&[EdgeId]> {
        self.incidence
            .get(&node)
            .map(|edges| edges.as_slice())
            .ok_or(Error::NodeNotFound(node))
    }

    /// Number of incident edges.
    pub fn degree(&self, node: NodeId) -> Result<usize> {
        Ok(self.incident_edges(node)?.len())
    }

    /// Nodes adjacent to `node`, one entry per incident edge.
    pub fn neighbors(&self, node: NodeId) -> Result<Vec<NodeId>> {
        let mut neighbors = Vec::new();
        for edge in self.incident_edges(node)? {
            let edge = self.edge(*edge)?;
            if let Some(other) = edge.opposite(node) {
                neighbors.push(other);
            }
        }
        Ok(neighbors)
    }
}

impl<W> Default for Graph<W>
where
    W: Clone + Eq + Hash + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn add_assigns_dense_labels() {
        let mut graph = Graph::new();
        let a = graph.add("a").unwrap();
        let b = graph.add("b").unwrap();
        let c = graph.add_unweighted();

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.node_label(a), Ok(0));
        assert_eq!(graph.node_label(b), Ok(1));
        assert_eq!(graph.node_label(c), Ok(2));
        assert_eq!(graph.node_at(1), Some(b));
        assert_eq!(graph.nodes(), vec![a, b, c]);
    }

    #[test]
    fn duplicate_weight_rejected() {
        let mut graph = Graph::new();
        graph.add(1).unwrap();
        let err = graph.add(1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn edge_requires_existing_endpoints() {
        let mut graph = Graph::new();
        let a = graph.add('a').unwrap();
        let stranger = NodeId::new();
        assert_eq!(graph.add_edge(a, stranger), Err(Error::NodeNotFound(stranger)));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn parallel_edges_and_degree() {
        let mut graph = Graph::new();
        let a = graph.add('a').unwrap();
        let b = graph.add('b').unwrap();
        let e1 = graph.add_edge(a, b).unwrap();
        let e2 = graph.add_edge(a, b).unwrap();
        let loop_edge = graph.add_edge(a, a).unwrap();

        assert_ne!(e1, e2);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.degree(a), Ok(3));
        assert_eq!(graph.degree(b), Ok(2));
        assert_eq!(graph.neighbors(a).unwrap(), vec![b, b, a]);
        assert!(graph.edge(loop_edge).unwrap().is_self_loop());
    }

    #[test]
    fn removal_shifts_labels_and_drops_incident_edges() {
        let mut graph = Graph::new();
        let a = graph.add("a").unwrap();
        let b = graph.add("b").unwrap();
        let c = graph.add("c").unwrap();
        graph.add_edge(a, b).unwrap();
        let bc = graph.add_edge(b, c).unwrap();

        graph.remove_node(a).unwrap();
        assert_eq!(graph.node_label(b), Ok(0));
        assert_eq!(graph.node_label(c), Ok(1));
        assert_eq!(graph.edges(), vec![bc]);
        assert_eq!(graph.edge_label(bc), Ok(0));
        assert!(!graph.contains_weight(&"a"));
        assert_eq!(graph.degree(b), Ok(1));
        assert!(graph.remove_node(a).is_err());
    }

    #[test]
    fn change_count_tracks_every_mutation() {
        let mut graph = Graph::new();
        assert_eq!(graph.change_count(), 0);
        let a = graph.add(1).unwrap();
        let b = graph.add(2).unwrap();
        let e = graph.add_edge(a, b).unwrap();
        let after_adds = graph.change_count();
        assert_eq!(after_adds, 3);

        graph.set_node_weight(a, 10).unwrap();
        graph.remove_edge(e).unwrap();
        assert!(graph.change_count() > after_adds);

        // failed mutations leave the counter alone
        let before = graph.change_count();
        assert!(graph.add(2).is_err());
        assert_eq!(graph.change_count(), before);
    }

    #[test]
    fn weight_lookup() {
        let mut graph = Graph::new();
        let a = graph.add("a").unwrap();
        let b = graph.add("b").unwrap();
        assert_eq!(graph.node_with_weight(&"b"), Ok(b));
        assert_eq!(
            graph.node_with_weight(&"z").unwrap_err().kind(),
            ErrorKind::Weight
        );

        assert!(graph.set_node_weight(a, "b").is_err());
        graph.set_node_weight(a, "a2").unwrap();
        assert_eq!(graph.node_weight(a), Ok(&"a2"));
        assert!(!graph.contains_weight(&"a"));

        let e = graph.add_weighted_edge(a, b, "link").unwrap();
        assert_eq!(graph.edges_with_weight(&"link"), &[e]);
        graph.set_edge_weight(e, "other").unwrap();
        assert!(graph.edges_with_weight(&"link").is_empty());
    }

    #[test]
    fn add_edge_between_weights() {
        let mut graph = Graph::new();
        let x = graph.add("x").unwrap();
        let y = graph.add("y").unwrap();
        let e = graph.add_edge_between(&"x", &"y").unwrap();
        assert_eq!(graph.edge(e).unwrap().source(), x);
        assert_eq!(graph.edge(e).unwrap().sink(), y);
        assert!(graph.add_edge_between(&"x", &"nope").is_err());
    }
}
