//! Inequality Constraints
//!
//! Terms, inequalities between terms, and the worklist solver that finds
//! least or greatest solutions over any [`Cpo`](crate::graph::Cpo).
//!
//! # Example
//!
//! ```rust
//! use cpo_core::graph::DirectedAcyclicGraph;
//! use cpo_core::inequality::{Inequality, InequalitySolver, Term, Variable};
//!
//! let mut dag = DirectedAcyclicGraph::new();
//! for w in ["bot", "mid", "top"] {
//!     dag.add(w)?;
//! }
//! dag.add_edge(&"bot", &"mid")?;
//! dag.add_edge(&"mid", &"top")?;
//!
//! let x = Variable::new("x");
//! let mut solver = InequalitySolver::new(&dag);
//! solver.add_inequality(Inequality::new(Term::constant("mid"), &x));
//!
//! assert!(solver.solve_least()?);
//! assert_eq!(x.get(), Some("mid"));
//! # Ok::<(), cpo_core::Error>(())
//! ```

mod constraint;
mod solver;
mod term;

pub use constraint::Inequality;
pub use solver::InequalitySolver;
pub use term::{FunctionTerm, Term, Variable, VariableId};
