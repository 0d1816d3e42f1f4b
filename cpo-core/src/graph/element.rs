//! Graph Elements
//!
//! Nodes and edges are the two kinds of graph element. Both may carry an
//! optional weight; an element without one is "unweighted", which is a
//! distinct state and not a missing value.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Unique identifier for a node.
///
/// Ids are never reused, so a stale id can be detected instead of silently
/// pointing at a newer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Unique identifier for an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(u64);

impl EdgeId {
    /// Generate a new unique edge ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u64> for EdgeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Behaviour shared by nodes and edges.
pub trait Element {
    type Weight;

    /// The weight, or `None` when the element is unweighted.
    fn weight_opt(&self) -> Option<&Self::Weight>;

    /// Short description used in error messages.
    fn describe(&self) -> String;

    fn has_weight(&self) -> bool {
        self.weight_opt().is_some()
    }

    /// The weight of a weighted element.
    ///
    /// Returns a weight error for unweighted elements.
    fn weight(&self) -> Result<&Self::Weight> {
        self.weight_opt()
            .ok_or_else(|| Error::Unweighted(self.describe()))
    }
}

/// A graph vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<W> {
    id: NodeId,
    weight: Option<W>,
}

impl<W> Node<W> {
    /// Create a weighted node with a fresh id.
    pub fn new(weight: W) -> Self {
        Self {
            id: NodeId::new(),
            weight: Some(weight),
        }
    }

    /// Create an unweighted node with a fresh id.
    pub fn unweighted() -> Self {
        Self {
            id: NodeId::new(),
            weight: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Replace the weight, returning the previous one.
    pub(crate) fn set_weight(&mut self, weight: W) -> Option<W> {
        self.weight.replace(weight)
    }
}

impl<W> Element for Node<W> {
    type Weight = W;

    fn weight_opt(&self) -> Option<&W> {
        self.weight.as_ref()
    }

    fn describe(&self) -> String {
        format!("node {}", self.id)
    }
}

/// A connection from `source` to `sink`.
///
/// Undirected graphs ignore the orientation; directed graphs read the edge
/// as `source -> sink`.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge<W> {
    id: EdgeId,
    source: NodeId,
    sink: NodeId,
    weight: Option<W>,
}

impl<W> Edge<W> {
    pub fn new(source: NodeId, sink: NodeId, weight: Option<W>) -> Self {
        Self {
            id: EdgeId::new(),
            source,
            sink,
            weight,
        }
    }

    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn sink(&self) -> NodeId {
        self.sink
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.sink
    }

    /// The endpoint opposite `node`, or `None` if `node` is not an endpoint.
    pub fn opposite(&self, node: NodeId) -> Option<NodeId> {
        if node == self.source {
            Some(self.sink)
        } else if node == self.sink {
            Some(self.source)
        } else {
            None
        }
    }

    pub(crate) fn set_weight(&mut self, weight: W) -> Option<W> {
        self.weight.replace(weight)
    }
}

impl<W> Element for Edge<W> {
    type Weight = W;

    fn weight_opt(&self) -> Option<&W> {
        self.weight.as_ref()
    }

    fn describe(&self) -> String {
        format!("edge {} ({} -> {})", self.id, self.source, self.sink)
    }
}
