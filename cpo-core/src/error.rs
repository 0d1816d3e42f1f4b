//! Error types shared by the graph, order and solver modules.
//!
//! Every failure is fail-fast: the library never tries to repair a graph
//! that was mutated into an inconsistent state. Callers that only care about
//! the broad category can match on [`Error::kind`].

use thiserror::Error;

use crate::graph::{EdgeId, NodeId};

/// Broad category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad graph construction: duplicate weights, self loops, dangling ids.
    Construction,
    /// An order query ran against a graph that turned out to be cyclic.
    Topology,
    /// Weight access on an unweighted element, or an unknown weight.
    Weight,
    /// The solver needed a lattice property that the CPO does not have.
    State,
}

/// Unified error type for `cpo-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A node carrying an equal weight is already in the graph.
    #[error("construction error: a node with weight `{0}` already exists")]
    DuplicateWeight(String),

    /// Self loops are rejected by acyclic graphs when the edge is added.
    #[error("construction error: cannot add a self loop on `{0}` to an acyclic graph")]
    SelfLoop(String),

    #[error("construction error: node {0} is not in the graph")]
    NodeNotFound(NodeId),

    #[error("construction error: edge {0} is not in the graph")]
    EdgeNotFound(EdgeId),

    /// The graph is cyclic; `node` lies on one of the cycles.
    #[error("topology error: graph is cyclic (cycle through `{node}`)")]
    Cycle { id: NodeId, node: String },

    #[error("weight error: {0} has no weight")]
    Unweighted(String),

    #[error("weight error: no element has weight `{0}`")]
    WeightNotFound(String),

    /// The CPO has no bottom (or top) element where one is required.
    #[error("state error: the CPO has no {0} element")]
    MissingExtremum(&'static str),

    /// A least upper bound or greatest lower bound did not exist.
    #[error("state error: the CPO is not a lattice: {0}")]
    NotALattice(String),

    #[error("state error: variable `{0}` has no value")]
    UnsetVariable(String),
}

impl Error {
    /// The taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::DuplicateWeight(_)
            | Error::SelfLoop(_)
            | Error::NodeNotFound(_)
            | Error::EdgeNotFound(_) => ErrorKind::Construction,
            Error::Cycle { .. } => ErrorKind::Topology,
            Error::Unweighted(_) | Error::WeightNotFound(_) => ErrorKind::Weight,
            Error::MissingExtremum(_) | Error::NotALattice(_) | Error::UnsetVariable(_) => {
                ErrorKind::State
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(Error::DuplicateWeight("a".into()).kind(), ErrorKind::Construction);
        assert_eq!(Error::SelfLoop("a".into()).kind(), ErrorKind::Construction);
        assert_eq!(
            Error::Cycle { id: NodeId::from(3), node: "a".into() }.kind(),
            ErrorKind::Topology
        );
        assert_eq!(Error::WeightNotFound("x".into()).kind(), ErrorKind::Weight);
        assert_eq!(Error::MissingExtremum("bottom").kind(), ErrorKind::State);
    }

    #[test]
    fn messages_name_the_offender() {
        let err = Error::Cycle { id: NodeId::from(7), node: "\"B\"".into() };
        assert!(err.to_string().contains("\"B\""));
        assert_eq!(
            Error::MissingExtremum("top").to_string(),
            "state error: the CPO has no top element"
        );
    }
}
