//! CPO Core
//!
//! Graph data structures and an order-theoretic constraint solver.
//!
//! - `graph`: undirected, directed and directed acyclic graphs with weighted
//!   elements, transitive closure and topological sorting. A directed
//!   acyclic graph doubles as a finite complete partial order.
//! - `inequality`: terms, inequalities, and a solver that computes least or
//!   greatest solutions over any CPO.
//! - `error`: the crate-wide error type.
//!
//! # Example
//!
//! ```rust
//! use cpo_core::graph::{CompareCode, DirectedAcyclicGraph};
//!
//! // a < b, a < c, b < d, c < d
//! let mut dag = DirectedAcyclicGraph::new();
//! for w in ['a', 'b', 'c', 'd'] {
//!     dag.add(w)?;
//! }
//! dag.add_edge(&'a', &'b')?;
//! dag.add_edge(&'a', &'c')?;
//! dag.add_edge(&'b', &'d')?;
//! dag.add_edge(&'c', &'d')?;
//!
//! assert_eq!(dag.compare(&'b', &'c')?, CompareCode::Incomparable);
//! assert_eq!(dag.least_upper_bound(&'b', &'c')?, Some(&'d'));
//! assert!(dag.is_lattice());
//! # Ok::<(), cpo_core::Error>(())
//! ```

pub mod error;
pub mod graph;
pub mod inequality;

pub use error::{Error, ErrorKind, Result};
pub use graph::{CompareCode, Cpo, DirectedAcyclicGraph, DirectedGraph, Graph};
pub use inequality::{Inequality, InequalitySolver, Term, Variable};
