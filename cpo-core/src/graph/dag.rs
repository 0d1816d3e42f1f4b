//! Directed Acyclic Graph
//!
//! A [`DirectedGraph`] read as the Hasse diagram of a finite partial order:
//! an edge `a -> b` means `a < b`. Every node carries a weight, and order
//! queries address elements by weight.
//!
//! Acyclicity is not checked while the graph is built (self loops aside).
//! The first order query after a mutation validates the graph: it brings the
//! transitive closure up to date, fails with a topology error if the closure
//! diagonal shows a cycle, and otherwise caches
//!
//! - the closure, used by upward operations (lub, up-set, least element),
//! - its transpose, used by the dual downward operations,
//! - the bottom and top elements.
//!
//! The cache is keyed by the graph's change count, exactly like the closure
//! cache of the underlying directed graph.

use std::cell::RefCell;
use std::fmt::Debug;
use std::hash::Hash;

use tracing::{debug, warn};

use super::closure::ClosureMatrix;
use super::cpo::{least_of, BoundKind, CompareCode, Cpo, NonLatticeCounterexample};
use super::directed::DirectedGraph;
use super::element::{Edge, EdgeId, NodeId};
use crate::error::{Error, Result};

/// Which order relation an operation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// The order as given by the edges.
    Up,
    /// The reversed order, for the dual operations.
    Down,
}

#[derive(Debug, Clone)]
struct OrderCache {
    change_count: u64,
    closure: ClosureMatrix,
    reverse_closure: ClosureMatrix,
    bottom: Option<usize>,
    top: Option<usize>,
}

impl OrderCache {
    fn relation(&self, direction: Direction) -> &ClosureMatrix {
        match direction {
            Direction::Up => &self.closure,
            Direction::Down => &self.reverse_closure,
        }
    }

    fn size(&self) -> usize {
        self.closure.size()
    }

    fn compare(&self, direction: Direction, i1: usize, i2: usize) -> CompareCode {
        let relation = self.relation(direction);
        if i1 == i2 {
            CompareCode::Same
        } else if relation.get(i1, i2) {
            CompareCode::Lower
        } else if relation.get(i2, i1) {
            CompareCode::Higher
        } else {
            CompareCode::Incomparable
        }
    }

    fn least_of(&self, direction: Direction, labels: Vec<usize>) -> Result<Option<usize>> {
        least_of(labels, |&a, &b| Ok(self.compare(direction, a, b)))
    }

    /// Least upper bound of two labels (greatest lower bound for `Down`).
    fn bound(&self, direction: Direction, i1: usize, i2: usize) -> Result<Option<usize>> {
        match self.compare(direction, i1, i2) {
            CompareCode::Lower | CompareCode::Same => Ok(Some(i2)),
            CompareCode::Higher => Ok(Some(i1)),
            CompareCode::Incomparable => {
                let relation = self.relation(direction);
                let upper: Vec<usize> = (0..self.size())
                    .filter(|&k| relation.get(i1, k) && relation.get(i2, k))
                    .collect();
                match upper.len() {
                    0 => Ok(None),
                    1 => Ok(upper.first().copied()),
                    _ => self.least_of(direction, upper),
                }
            }
        }
    }

    /// Bound of an arbitrary subset. The empty subset has every element as
    /// an upper bound, which yields bottom (or top for `Down`).
    fn bound_of(&self, direction: Direction, subset: &[usize]) -> Result<Option<usize>> {
        let upper: Vec<usize> = (0..self.size())
            .filter(|&k| {
                subset
                    .iter()
                    .all(|&s| self.compare(direction, k, s).is_higher_or_same())
            })
            .collect();
        self.least_of(direction, upper)
    }

    /// The label itself followed by everything above it, ascending.
    fn up_set(&self, direction: Direction, label: usize) -> Vec<usize> {
        std::iter::once(label)
            .chain(self.relation(direction).successors(label))
            .collect()
    }

    fn first_missing_bound(&self) -> Result<Option<(BoundKind, usize, usize)>> {
        let n = self.size();
        for i in 0..n {
            for j in (i + 1)..n {
                if self.bound(Direction::Up, i, j)?.is_none() {
                    return Ok(Some((BoundKind::LeastUpper, i, j)));
                }
                if self.bound(Direction::Down, i, j)?.is_none() {
                    return Ok(Some((BoundKind::GreatestLower, i, j)));
                }
            }
        }
        Ok(None)
    }
}

/// A directed acyclic graph that doubles as a finite CPO.
///
/// Not `Sync`: order queries fill a cache behind a `RefCell`.
#[derive(Debug, Clone)]
pub struct DirectedAcyclicGraph<W> {
    graph: DirectedGraph<W>,
    order: RefCell<Option<OrderCache>>,
}

impl<W> DirectedAcyclicGraph<W>
where
    W: Clone + Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// An empty DAG with room for `node_count` elements.
    pub fn with_capacity(node_count: usize) -> Self {
        Self {
            graph: DirectedGraph::with_capacity(node_count, node_count),
            order: RefCell::new(None),
        }
    }

    /// Read-only view of the underlying directed graph.
    pub fn graph(&self) -> &DirectedGraph<W> {
        &self.graph
    }

    /// Add an element. Equal weights cannot both be added.
    pub fn add(&mut self, weight: W) -> Result<NodeId> {
        self.graph.add(weight)
    }

    /// Make `lower` lower than `higher`.
    ///
    /// Parallel edges are allowed and have no effect on order queries.
    /// A self loop is rejected immediately; longer cycles are only detected
    /// by the next order query.
    pub fn add_edge(&mut self, lower: &W, higher: &W) -> Result<EdgeId> {
        if lower == higher {
            return Err(Error::SelfLoop(format!("{lower:?}")));
        }
        self.graph.add_edge_between(lower, higher)
    }

    /// Like [`add_edge`](Self::add_edge), addressing nodes by id.
    pub fn add_edge_by_id(&mut self, lower: NodeId, higher: NodeId) -> Result<EdgeId> {
        if lower == higher {
            let name = match self.graph.graph().node_weight(lower) {
                Ok(weight) => format!("{weight:?}"),
                Err(_) => lower.to_string(),
            };
            return Err(Error::SelfLoop(name));
        }
        self.graph.add_edge(lower, higher)
    }

    /// Remove the element carrying `weight` and its edges.
    pub fn remove(&mut self, weight: &W) -> Result<NodeId> {
        let node = self.graph.graph().node_with_weight(weight)?;
        self.graph.remove_node(node)?;
        Ok(node)
    }

    pub fn remove_edge(&mut self, edge: EdgeId) -> Result<Edge<W>> {
        self.graph.remove_edge(edge)
    }

    pub fn contains(&self, weight: &W) -> bool {
        self.graph.graph().contains_weight(weight)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All elements in insertion (label) order.
    pub fn weights(&self) -> Result<Vec<&W>> {
        (0..self.node_count()).map(|label| self.weight_at(label)).collect()
    }

    fn label_of(&self, weight: &W) -> Result<usize> {
        let graph = self.graph.graph();
        graph.node_label(graph.node_with_weight(weight)?)
    }

    fn labels_of(&self, weights: &[W]) -> Result<Vec<usize>> {
        weights.iter().map(|weight| self.label_of(weight)).collect()
    }

    fn weight_at(&self, label: usize) -> Result<&W> {
        let graph = self.graph.graph();
        let node = graph
            .node_at(label)
            .ok_or_else(|| Error::WeightNotFound(format!("label {label}")))?;
        graph.node_weight(node)
    }

    fn weight_at_opt(&self, label: Option<usize>) -> Result<Option<&W>> {
        label.map(|label| self.weight_at(label)).transpose()
    }

    fn weights_at(&self, labels: Vec<usize>) -> Result<Vec<&W>> {
        labels.into_iter().map(|label| self.weight_at(label)).collect()
    }

    /// Run `f` against a validated order cache.
    fn with_order<R>(&self, f: impl FnOnce(&OrderCache) -> Result<R>) -> Result<R> {
        let current = self.graph.change_count();
        let mut slot = self.order.borrow_mut();
        let cache = match slot.take() {
            Some(cache) if cache.change_count == current => cache,
            _ => self.build_order(current)?,
        };
        f(slot.insert(cache))
    }

    fn build_order(&self, change_count: u64) -> Result<OrderCache> {
        let closure = self.graph.transitive_closure();
        if let Some(label) = closure.first_on_cycle() {
            let node = self
                .graph
                .graph()
                .node_at(label)
                .ok_or_else(|| Error::WeightNotFound(format!("label {label}")))?;
            let err = self.graph.cycle_error(node);
            warn!(%err, "partial order graph is cyclic");
            return Err(err);
        }

        let mut bottom = Extremum::None;
        let mut top = Extremum::None;
        for (label, node) in self.graph.nodes().into_iter().enumerate() {
            if self.graph.in_degree(node)? == 0 {
                bottom.offer(label);
            }
            if self.graph.out_degree(node)? == 0 {
                top.offer(label);
            }
        }
        let (bottom, top) = (bottom.unique(), top.unique());
        debug!(
            nodes = closure.size(),
            change_count,
            ?bottom,
            ?top,
            "validated partial order"
        );

        Ok(OrderCache {
            change_count,
            reverse_closure: closure.transpose(),
            closure,
            bottom,
            top,
        })
    }

    /// The least element, if the order has one.
    pub fn bottom(&self) -> Result<Option<&W>> {
        let label = self.with_order(|order| Ok(order.bottom))?;
        self.weight_at_opt(label)
    }

    /// The greatest element, if the order has one.
    pub fn top(&self) -> Result<Option<&W>> {
        let label = self.with_order(|order| Ok(order.top))?;
        self.weight_at_opt(label)
    }

    pub fn compare(&self, e1: &W, e2: &W) -> Result<CompareCode> {
        let (i1, i2) = (self.label_of(e1)?, self.label_of(e2)?);
        self.with_order(|order| Ok(order.compare(Direction::Up, i1, i2)))
    }

    fn bound(&self, direction: Direction, e1: &W, e2: &W) -> Result<Option<&W>> {
        let (i1, i2) = (self.label_of(e1)?, self.label_of(e2)?);
        let label = self.with_order(|order| order.bound(direction, i1, i2))?;
        self.weight_at_opt(label)
    }

    /// Least upper bound of two elements, or `None` if it does not exist.
    pub fn least_upper_bound(&self, e1: &W, e2: &W) -> Result<Option<&W>> {
        self.bound(Direction::Up, e1, e2)
    }

    /// Greatest lower bound of two elements, or `None` if it does not exist.
    pub fn greatest_lower_bound(&self, e1: &W, e2: &W) -> Result<Option<&W>> {
        self.bound(Direction::Down, e1, e2)
    }

    fn bound_of(&self, direction: Direction, subset: &[W]) -> Result<Option<&W>> {
        let labels = self.labels_of(subset)?;
        let label = self.with_order(|order| order.bound_of(direction, &labels))?;
        self.weight_at_opt(label)
    }

    /// Least upper bound of a subset. The empty subset yields bottom.
    pub fn least_upper_bound_of(&self, subset: &[W]) -> Result<Option<&W>> {
        self.bound_of(Direction::Up, subset)
    }

    /// Greatest lower bound of a subset. The empty subset yields top.
    pub fn greatest_lower_bound_of(&self, subset: &[W]) -> Result<Option<&W>> {
        self.bound_of(Direction::Down, subset)
    }

    fn extreme_element(&self, direction: Direction, subset: &[W]) -> Result<Option<&W>> {
        let labels = self.labels_of(subset)?;
        let label = self.with_order(|order| order.least_of(direction, labels))?;
        self.weight_at_opt(label)
    }

    /// The least element of `subset`, if it has one.
    pub fn least_element(&self, subset: &[W]) -> Result<Option<&W>> {
        self.extreme_element(Direction::Up, subset)
    }

    /// The greatest element of `subset`, if it has one.
    pub fn greatest_element(&self, subset: &[W]) -> Result<Option<&W>> {
        self.extreme_element(Direction::Down, subset)
    }

    fn closed_set(&self, direction: Direction, element: &W) -> Result<Vec<&W>> {
        let label = self.label_of(element)?;
        let labels = self.with_order(|order| Ok(order.up_set(direction, label)))?;
        self.weights_at(labels)
    }

    /// `element` and every element above it.
    pub fn up_set(&self, element: &W) -> Result<Vec<&W>> {
        self.closed_set(Direction::Up, element)
    }

    /// `element` and every element below it.
    pub fn down_set(&self, element: &W) -> Result<Vec<&W>> {
        self.closed_set(Direction::Down, element)
    }

    /// All elements in a topological order, lower elements first.
    ///
    /// Kahn's algorithm, repeatedly sweeping the labels for elements whose
    /// remaining in-degree is zero. Fails with a topology error when some
    /// elements can never be emitted because they lie on or behind a cycle.
    pub fn topological_sort(&self) -> Result<Vec<&W>> {
        let nodes = self.graph.nodes();
        let graph = self.graph.graph();

        let mut remaining = Vec::with_capacity(nodes.len());
        let mut successors = Vec::with_capacity(nodes.len());
        for &node in &nodes {
            remaining.push(Some(self.graph.in_degree(node)?));
            let sinks = self
                .graph
                .successors(node)?
                .into_iter()
                .map(|sink| graph.node_label(sink))
                .collect::<Result<Vec<_>>>()?;
            successors.push(sinks);
        }

        let mut order = Vec::with_capacity(nodes.len());
        loop {
            let mut progressed = false;
            for label in 0..nodes.len() {
                if remaining[label] != Some(0) {
                    continue;
                }
                progressed = true;
                remaining[label] = None;
                order.push(self.weight_at(label)?);
                for &sink in &successors[label] {
                    if let Some(Some(degree)) = remaining.get_mut(sink) {
                        *degree = degree.saturating_sub(1);
                    }
                }
            }
            if !progressed {
                break;
            }
        }

        if let Some(stuck) = remaining.iter().position(Option::is_some) {
            let node = self.graph.cycle_node().unwrap_or(nodes[stuck]);
            return Err(self.graph.cycle_error(node));
        }
        Ok(order)
    }

    /// Sort the given elements so that lower elements come first.
    ///
    /// Pairwise exchange sort over `compare`, O(n²). The relative order of
    /// incomparable elements is unspecified.
    pub fn topological_sort_of(&self, elements: &[W]) -> Result<Vec<&W>> {
        let mut labels = self.labels_of(elements)?;
        self.with_order(|order| {
            for i in 0..labels.len() {
                for j in (i + 1)..labels.len() {
                    if order.compare(Direction::Up, labels[i], labels[j]) == CompareCode::Higher {
                        labels.swap(i, j);
                    }
                }
            }
            Ok(())
        })?;
        self.weights_at(labels)
    }

    /// Why this order is not a lattice, or `None` if it is one.
    ///
    /// A cycle is reported first. Otherwise every unordered pair is checked,
    /// in label order, for a least upper bound and then a greatest lower
    /// bound, and the first missing one is reported.
    pub fn non_lattice_reason(&self) -> Option<NonLatticeCounterexample<W>> {
        if let Some(node) = self.graph.cycle_node() {
            let weight = self.graph.graph().node_weight(node).ok()?;
            return Some(NonLatticeCounterexample::cycle(weight.clone()));
        }

        let (kind, i, j) = self.with_order(OrderCache::first_missing_bound).ok()??;
        let e1 = self.weight_at(i).ok()?.clone();
        let e2 = self.weight_at(j).ok()?.clone();
        match kind {
            BoundKind::GreatestLower => Some(NonLatticeCounterexample::missing_greatest_lower(e1, e2)),
            _ => Some(NonLatticeCounterexample::missing_least_upper(e1, e2)),
        }
    }

    /// Whether every pair of elements has both a least upper bound and a
    /// greatest lower bound. A cyclic graph is never a lattice.
    pub fn is_lattice(&self) -> bool {
        self.non_lattice_reason().is_none()
    }
}

impl<W> Default for DirectedAcyclicGraph<W>
where
    W: Clone + Eq + Hash + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks whether exactly one label qualified as bottom (or top).
enum Extremum {
    None,
    Unique(usize),
    Ambiguous,
}

impl Extremum {
    fn offer(&mut self, label: usize) {
        *self = match self {
            Extremum::None => Extremum::Unique(label),
            _ => Extremum::Ambiguous,
        };
    }

    fn unique(self) -> Option<usize> {
        match self {
            Extremum::Unique(label) => Some(label),
            _ => None,
        }
    }
}

impl<W> Cpo for DirectedAcyclicGraph<W>
where
    W: Clone + Eq + Hash + Debug,
{
    type Element = W;

    fn bottom(&self) -> Result<Option<W>> {
        Ok(DirectedAcyclicGraph::bottom(self)?.cloned())
    }

    fn top(&self) -> Result<Option<W>> {
        Ok(DirectedAcyclicGraph::top(self)?.cloned())
    }

    fn compare(&self, e1: &W, e2: &W) -> Result<CompareCode> {
        DirectedAcyclicGraph::compare(self, e1, e2)
    }

    fn least_upper_bound(&self, e1: &W, e2: &W) -> Result<Option<W>> {
        Ok(DirectedAcyclicGraph::least_upper_bound(self, e1, e2)?.cloned())
    }

    fn greatest_lower_bound(&self, e1: &W, e2: &W) -> Result<Option<W>> {
        Ok(DirectedAcyclicGraph::greatest_lower_bound(self, e1, e2)?.cloned())
    }

    fn least_upper_bound_of(&self, subset: &[W]) -> Result<Option<W>> {
        Ok(DirectedAcyclicGraph::least_upper_bound_of(self, subset)?.cloned())
    }

    fn greatest_lower_bound_of(&self, subset: &[W]) -> Result<Option<W>> {
        Ok(DirectedAcyclicGraph::greatest_lower_bound_of(self, subset)?.cloned())
    }

    fn least_element(&self, subset: &[W]) -> Result<Option<W>> {
        Ok(DirectedAcyclicGraph::least_element(self, subset)?.cloned())
    }

    fn greatest_element(&self, subset: &[W]) -> Result<Option<W>> {
        Ok(DirectedAcyclicGraph::greatest_element(self, subset)?.cloned())
    }

    fn non_lattice_reason(&self) -> Option<NonLatticeCounterexample<W>> {
        DirectedAcyclicGraph::non_lattice_reason(self)
    }
}
