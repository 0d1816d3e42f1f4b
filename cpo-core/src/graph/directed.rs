//! Directed Graph
//!
//! A [`Graph`] whose edges point from source to sink. On top of the base
//! container it keeps per-node in-degrees up to date on every mutation and
//! lazily computes the transitive closure.
//!
//! # Closure caching
//!
//! The closure is computed on first use and stored together with the
//! graph's change count at that moment. Any later query compares the stored
//! count with the current one and recomputes only on mismatch. There are no
//! listeners to register or unregister; a stale cache is simply ignored.
//!
//! The cache lives in a `RefCell`, so a `DirectedGraph` is not `Sync`.
//! Queries and mutations must come from a single thread.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;

use tracing::debug;

use super::closure::ClosureMatrix;
use super::element::{Edge, EdgeId, Element, Node, NodeId};
use super::undirected::Graph;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
struct CachedClosure {
    change_count: u64,
    matrix: ClosureMatrix,
}

/// A graph with directed edges.
#[derive(Debug, Clone)]
pub struct DirectedGraph<W> {
    graph: Graph<W>,
    in_degree: HashMap<NodeId, usize>,
    closure: RefCell<Option<CachedClosure>>,
}

impl<W> DirectedGraph<W>
where
    W: Clone + Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    pub fn with_capacity(node_count: usize, edge_count: usize) -> Self {
        Self {
            graph: Graph::with_capacity(node_count, edge_count),
            in_degree: HashMap::with_capacity(node_count),
            closure: RefCell::new(None),
        }
    }

    /// Read-only view of the underlying graph.
    pub fn graph(&self) -> &Graph<W> {
        &self.graph
    }

    /// Add a node carrying `weight`. Duplicate weights are rejected.
    pub fn add(&mut self, weight: W) -> Result<NodeId> {
        let id = self.graph.add(weight)?;
        self.in_degree.insert(id, 0);
        Ok(id)
    }

    pub fn add_unweighted(&mut self) -> NodeId {
        let id = self.graph.add_unweighted();
        self.in_degree.insert(id, 0);
        id
    }

    /// Add an edge `source -> sink`.
    pub fn add_edge(&mut self, source: NodeId, sink: NodeId) -> Result<EdgeId> {
        let id = self.graph.add_edge(source, sink)?;
        *self.in_degree.entry(sink).or_insert(0) += 1;
        Ok(id)
    }

    pub fn add_weighted_edge(&mut self, source: NodeId, sink: NodeId, weight: W) -> Result<EdgeId> {
        let id = self.graph.add_weighted_edge(source, sink, weight)?;
        *self.in_degree.entry(sink).or_insert(0) += 1;
        Ok(id)
    }

    /// Add an edge from the node carrying `lower` to the node carrying `higher`.
    pub fn add_edge_between(&mut self, lower: &W, higher: &W) -> Result<EdgeId> {
        let source = self.graph.node_with_weight(lower)?;
        let sink = self.graph.node_with_weight(higher)?;
        self.add_edge(source, sink)
    }

    pub fn remove_edge(&mut self, edge: EdgeId) -> Result<Edge<W>> {
        let removed = self.graph.remove_edge(edge)?;
        if let Some(count) = self.in_degree.get_mut(&removed.sink()) {
            *count = count.saturating_sub(1);
        }
        Ok(removed)
    }

    /// Remove a node together with its incident edges.
    pub fn remove_node(&mut self, node: NodeId) -> Result<Node<W>> {
        let incident = self.graph.incident_edges(node)?.to_vec();
        for edge in incident {
            self.remove_edge(edge)?;
        }
        let removed = self.graph.remove_node(node)?;
        self.in_degree.remove(&node);
        Ok(removed)
    }

    pub fn set_node_weight(&mut self, node: NodeId, weight: W) -> Result<()> {
        self.graph.set_node_weight(node, weight)
    }

    pub fn change_count(&self) -> u64 {
        self.graph.change_count()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn nodes(&self) -> Vec<NodeId> {
        self.graph.nodes()
    }

    /// Number of edges whose sink is `node`.
    pub fn in_degree(&self, node: NodeId) -> Result<usize> {
        self.in_degree
            .get(&node)
            .copied()
            .ok_or(Error::NodeNotFound(node))
    }

    /// Number of edges whose source is `node`.
    pub fn out_degree(&self, node: NodeId) -> Result<usize> {
        Ok(self.output_edges(node)?.len())
    }

    /// Edges whose sink is `node`.
    pub fn input_edges(&self, node: NodeId) -> Result<Vec<EdgeId>> {
        self.incident_matching(node, |edge| edge.sink() == node)
    }

    /// Edges whose source is `node`.
    pub fn output_edges(&self, node: NodeId) -> Result<Vec<EdgeId>> {
        self.incident_matching(node, |edge| edge.source() == node)
    }

    fn incident_matching<F>(&self, node: NodeId, keep: F) -> Result<Vec<EdgeId>>
    where
        F: Fn(&Edge<W>) -> bool,
    {
        let mut matching = Vec::new();
        for &id in self.graph.incident_edges(node)? {
            if keep(self.graph.edge(id)?) {
                matching.push(id);
            }
        }
        Ok(matching)
    }

    /// Sources of the input edges of `node`, one entry per edge.
    pub fn predecessors(&self, node: NodeId) -> Result<Vec<NodeId>> {
        self.input_edges(node)?
            .into_iter()
            .map(|edge| Ok(self.graph.edge(edge)?.source()))
            .collect()
    }

    /// Sinks of the output edges of `node`, one entry per edge.
    pub fn successors(&self, node: NodeId) -> Result<Vec<NodeId>> {
        self.output_edges(node)?
            .into_iter()
            .map(|edge| Ok(self.graph.edge(edge)?.sink()))
            .collect()
    }

    /// Run `f` against an up-to-date closure, recomputing it if the graph
    /// changed since the last computation.
    pub(crate) fn with_closure<R>(&self, f: impl FnOnce(&ClosureMatrix) -> R) -> R {
        let current = self.graph.change_count();
        let mut cache = self.closure.borrow_mut();
        let stale = cache
            .as_ref()
            .map_or(true, |cached| cached.change_count != current);
        if stale {
            debug!(
                nodes = self.graph.node_count(),
                change_count = current,
                "recomputing transitive closure"
            );
            *cache = Some(CachedClosure {
                change_count: current,
                matrix: self.compute_closure(),
            });
        }
        match cache.as_ref() {
            Some(cached) => f(&cached.matrix),
            None => f(&ClosureMatrix::new(0)),
        }
    }

    fn compute_closure(&self) -> ClosureMatrix {
        let labels: HashMap<NodeId, usize> = self
            .graph
            .nodes()
            .into_iter()
            .enumerate()
            .map(|(label, id)| (id, label))
            .collect();
        let pairs = self
            .graph
            .edge_entries()
            .filter_map(|edge| Some((*labels.get(&edge.source())?, *labels.get(&edge.sink())?)));
        ClosureMatrix::from_edges(self.graph.node_count(), pairs)
    }

    /// Snapshot of the transitive closure, indexed by node label.
    pub fn transitive_closure(&self) -> ClosureMatrix {
        self.with_closure(ClosureMatrix::clone)
    }

    /// Whether a non-empty path leads from `from` to `to`.
    pub fn reachable(&self, from: NodeId, to: NodeId) -> Result<bool> {
        let i = self.graph.node_label(from)?;
        let j = self.graph.node_label(to)?;
        Ok(self.with_closure(|closure| closure.get(i, j)))
    }

    /// Nodes reachable from `node` by a non-empty path, in label order.
    pub fn reachable_nodes(&self, node: NodeId) -> Result<Vec<NodeId>> {
        let i = self.graph.node_label(node)?;
        let labels: Vec<usize> = self.with_closure(|closure| closure.successors(i).collect());
        Ok(self.ids_of(labels))
    }

    /// Nodes from which `node` is reachable by a non-empty path.
    pub fn backward_reachable_nodes(&self, node: NodeId) -> Result<Vec<NodeId>> {
        let j = self.graph.node_label(node)?;
        let labels: Vec<usize> = self.with_closure(|closure| {
            (0..closure.size()).filter(|&i| closure.get(i, j)).collect()
        });
        Ok(self.ids_of(labels))
    }

    fn ids_of(&self, labels: Vec<usize>) -> Vec<NodeId> {
        labels
            .into_iter()
            .filter_map(|label| self.graph.node_at(label))
            .collect()
    }

    /// Whether the graph has no directed cycle (self loops included).
    pub fn is_acyclic(&self) -> bool {
        self.with_closure(ClosureMatrix::is_acyclic)
    }

    /// Some node lying on a cycle, if the graph is cyclic.
    pub fn cycle_node(&self) -> Option<NodeId> {
        let label = self.with_closure(ClosureMatrix::first_on_cycle)?;
        self.graph.node_at(label)
    }

    /// Topological order of all nodes, using Kahn's algorithm over the
    /// in-degree counts. O(|N| + |E|).
    ///
    /// Returns a topology error naming a node on a cycle when the graph is
    /// cyclic.
    pub fn topological_sort(&self) -> Result<Vec<NodeId>> {
        let nodes = self.graph.nodes();
        let mut remaining: HashMap<NodeId, usize> = HashMap::with_capacity(nodes.len());
        let mut ready = VecDeque::new();
        for &node in &nodes {
            let degree = self.in_degree(node)?;
            if degree == 0 {
                ready.push_back(node);
            }
            remaining.insert(node, degree);
        }

        let mut order = Vec::with_capacity(nodes.len());
        while let Some(node) = ready.pop_front() {
            order.push(node);
            for sink in self.successors(node)? {
                if let Some(degree) = remaining.get_mut(&sink) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push_back(sink);
                    }
                }
            }
        }

        if order.len() < nodes.len() {
            // nodes left over may only sit behind a cycle; name one on it
            let on_cycle = self.cycle_node().or_else(|| {
                nodes
                    .into_iter()
                    .find(|node| remaining.get(node).is_some_and(|&degree| degree > 0))
            });
            if let Some(node) = on_cycle {
                return Err(self.cycle_error(node));
            }
        }
        Ok(order)
    }

    /// Topology error naming `node`.
    pub(crate) fn cycle_error(&self, node: NodeId) -> Error {
        let name = match self.graph.node(node).map(|entry| entry.weight_opt()) {
            Ok(Some(weight)) => format!("{weight:?}"),
            _ => node.to_string(),
        };
        Error::Cycle { id: node, node: name }
    }
}

impl<W> Default for DirectedGraph<W>
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

    fn chain() -> (DirectedGraph<&'static str>, [NodeId; 3]) {
        let mut graph = DirectedGraph::new();
        let a = graph.add("A").unwrap();
        let b = graph.add("B").unwrap();
        let c = graph.add("C").unwrap();
        graph.add_edge(a, b).unwrap();
        graph.add_edge(b, c).unwrap();
        (graph, [a, b, c])
    }

    #[test]
    fn in_degree_tracks_edges() {
        let (mut graph, [a, b, c]) = chain();
        assert_eq!(graph.in_degree(a), Ok(0));
        assert_eq!(graph.in_degree(b), Ok(1));
        let extra = graph.add_edge(a, c).unwrap();
        assert_eq!(graph.in_degree(c), Ok(2));
        assert_eq!(graph.out_degree(a), Ok(2));

        graph.remove_edge(extra).unwrap();
        assert_eq!(graph.in_degree(c), Ok(1));

        graph.remove_node(b).unwrap();
        assert_eq!(graph.in_degree(c), Ok(0));
        assert!(graph.in_degree(b).is_err());
    }

    #[test]
    fn neighbors_follow_direction() {
        let (graph, [a, b, c]) = chain();
        assert_eq!(graph.successors(b).unwrap(), vec![c]);
        assert_eq!(graph.predecessors(b).unwrap(), vec![a]);
        assert!(graph.predecessors(a).unwrap().is_empty());
    }

    #[test]
    fn closure_and_reachability() {
        let (graph, [a, b, c]) = chain();
        assert_eq!(graph.reachable(a, c), Ok(true));
        assert_eq!(graph.reachable(c, a), Ok(false));
        assert_eq!(graph.reachable(a, a), Ok(false));
        assert_eq!(graph.reachable_nodes(a).unwrap(), vec![b, c]);
        assert_eq!(graph.backward_reachable_nodes(c).unwrap(), vec![a, b]);
        assert!(graph.is_acyclic());
        assert_eq!(graph.cycle_node(), None);
    }

    #[test]
    fn closure_recomputed_after_mutation() {
        let (mut graph, [a, _, c]) = chain();
        assert!(graph.is_acyclic());
        let before = graph.transitive_closure();

        graph.add_edge(c, a).unwrap();
        assert!(!graph.is_acyclic());
        assert_ne!(graph.transitive_closure(), before);
        assert!(graph.cycle_node().is_some());
    }

    #[test]
    fn topological_sort_orders_chain() {
        let (graph, ids) = chain();
        assert_eq!(graph.topological_sort().unwrap(), ids.to_vec());
    }

    #[test]
    fn topological_sort_rejects_cycles() {
        let (mut graph, [a, _, c]) = chain();
        graph.add_edge(c, a).unwrap();
        let err = graph.topological_sort().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Topology);
    }

    #[test]
    fn cycle_error_names_a_node_on_the_cycle() {
        // a sits downstream of the b <-> c cycle and has the lowest label
        let mut graph = DirectedGraph::new();
        let a = graph.add("A").unwrap();
        let b = graph.add("B").unwrap();
        let c = graph.add("C").unwrap();
        graph.add_edge(b, c).unwrap();
        graph.add_edge(c, b).unwrap();
        graph.add_edge(b, a).unwrap();

        assert_eq!(graph.cycle_node(), Some(b));
        match graph.topological_sort() {
            Err(Error::Cycle { id, node }) => {
                assert_eq!(id, b);
                assert_eq!(node, "\"B\"");
            }
            other => panic!("expected a cycle error, got {other:?}"),
        }
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let mut graph = DirectedGraph::new();
        let a = graph.add(1).unwrap();
        graph.add_edge(a, a).unwrap();
        assert!(!graph.is_acyclic());
        assert_eq!(graph.cycle_node(), Some(a));
        assert!(graph.topological_sort().is_err());
    }
}
