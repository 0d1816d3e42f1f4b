//! Graphs and Partial Orders
//!
//! Three graph layers, each wrapping the one below:
//!
//! - [`Graph`]: undirected, with nodes and edges that may carry weights,
//! - [`DirectedGraph`]: adds edge direction, degree counts and a cached
//!   transitive closure,
//! - [`DirectedAcyclicGraph`]: reads the edges as a Hasse diagram and
//!   answers order queries through the [`Cpo`] trait.
//!
//! # Labels
//!
//! Every node and edge has a stable id and a dense label, its position in
//! insertion order. Removing an element shifts the labels of everything
//! after it down by one. Closure matrices are indexed by node label.
//!
//! # Caching
//!
//! Each mutation bumps a change counter. Derived data (the closure, the
//! order cache of a DAG) remembers the counter it was built at and is
//! rebuilt on the first query after it goes stale. Caches live behind a
//! `RefCell`, so the graph types are not `Sync`.

mod closure;
mod cpo;
mod dag;
mod directed;
mod element;
mod element_list;
mod labeled_list;
mod undirected;

pub use closure::ClosureMatrix;
pub use cpo::{least_of, BoundKind, CompareCode, Cpo, NonLatticeCounterexample};
pub use dag::DirectedAcyclicGraph;
pub use directed::DirectedGraph;
pub use element::{Edge, EdgeId, Element, Node, NodeId};
pub use element_list::ElementList;
pub use labeled_list::LabeledList;
pub use undirected::Graph;
