//! Inequality Solver
//!
//! Finds the least (or greatest) values of the variables that satisfy a set
//! of inequalities over a CPO, by worklist propagation in the style of
//! Rehof and Mogensen.
//!
//! # Algorithm (least solution)
//!
//! 1. Every variable starts at the CPO's bottom.
//! 2. An inequality whose greater side is a variable can be fixed by raising
//!    that variable; these form the updatable set. All others are only
//!    checked at the end.
//! 3. The worklist starts with every unsatisfied updatable inequality.
//! 4. Pop one, raise its greater variable to the least upper bound of its
//!    current value and the lesser side's value, then re-test every other
//!    updatable inequality mentioning that variable, adding the newly
//!    unsatisfied ones to the worklist and dropping the newly satisfied.
//! 5. When the worklist is empty, the system is solved iff every
//!    non-updatable inequality holds.
//!
//! Greatest solutions are the dual: start at top, lower lesser variables
//! with greatest lower bounds.
//!
//! # Completeness
//!
//! For definite systems (every greater side a constant or a variable when
//! solving for the least solution, every lesser side when solving for the
//! greatest) the answer is exact. For other systems a `true` result is
//! still a solution, but `false` does not prove that none exists.

use std::collections::VecDeque;
use std::fmt::Debug;

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

use super::constraint::Inequality;
use super::term::{Term, Variable, VariableId};
use crate::error::{Error, Result};
use crate::graph::Cpo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Goal {
    Least,
    Greatest,
}

impl Goal {
    /// The side whose variable moves.
    fn updatable<E>(self, inequality: &Inequality<E>) -> &Term<E>
    where
        E: Clone + PartialEq + Debug,
    {
        match self {
            Goal::Least => inequality.greater(),
            Goal::Greatest => inequality.lesser(),
        }
    }

    fn fixed<E>(self, inequality: &Inequality<E>) -> &Term<E>
    where
        E: Clone + PartialEq + Debug,
    {
        match self {
            Goal::Least => inequality.lesser(),
            Goal::Greatest => inequality.greater(),
        }
    }
}

#[derive(Debug)]
struct VariableUses<E> {
    variable: Variable<E>,
    inequalities: SmallVec<[usize; 4]>,
}

/// Solves inequality constraints over one CPO.
///
/// Variables are updated in place; after a solve, read them through any
/// clone of the [`Variable`] handles used to build the inequalities.
#[derive(Debug)]
pub struct InequalitySolver<'a, C: Cpo> {
    cpo: &'a C,
    inequalities: Vec<Inequality<C::Element>>,
    uses: IndexMap<VariableId, VariableUses<C::Element>>,
}

impl<'a, C: Cpo> InequalitySolver<'a, C> {
    pub fn new(cpo: &'a C) -> Self {
        Self {
            cpo,
            inequalities: Vec::new(),
            uses: IndexMap::new(),
        }
    }

    pub fn add_inequality(&mut self, inequality: Inequality<C::Element>) {
        let index = self.inequalities.len();
        for variable in inequality.variables() {
            self.uses
                .entry(variable.id())
                .or_insert_with(|| VariableUses {
                    variable: variable.clone(),
                    inequalities: SmallVec::new(),
                })
                .inequalities
                .push(index);
        }
        self.inequalities.push(inequality);
    }

    pub fn add_inequalities<I>(&mut self, inequalities: I)
    where
        I: IntoIterator<Item = Inequality<C::Element>>,
    {
        for inequality in inequalities {
            self.add_inequality(inequality);
        }
    }

    pub fn inequalities(&self) -> &[Inequality<C::Element>] {
        &self.inequalities
    }

    /// Every variable mentioned by some inequality, in order of first use.
    pub fn variables(&self) -> Vec<Variable<C::Element>> {
        self.uses.values().map(|uses| uses.variable.clone()).collect()
    }

    /// One inequality per line.
    pub fn description(&self) -> String {
        self.inequalities
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Solve for the least values satisfying all inequalities.
    ///
    /// Returns `Ok(false)` if some inequality stays unsatisfied; variables
    /// then hold the last values computed. Fails with a state error if the
    /// CPO has no bottom or a needed least upper bound does not exist.
    pub fn solve_least(&self) -> Result<bool> {
        self.solve(Goal::Least)
    }

    /// Solve for the greatest values satisfying all inequalities.
    pub fn solve_greatest(&self) -> Result<bool> {
        self.solve(Goal::Greatest)
    }

    fn solve(&self, goal: Goal) -> Result<bool> {
        debug!(
            ?goal,
            inequalities = self.inequalities.len(),
            variables = self.uses.len(),
            "solving inequalities"
        );

        let start = match goal {
            Goal::Least => self.cpo.bottom()?.ok_or(Error::MissingExtremum("bottom"))?,
            Goal::Greatest => self.cpo.top()?.ok_or(Error::MissingExtremum("top"))?,
        };
        for uses in self.uses.values() {
            uses.variable.set(start.clone());
        }

        let updatable: Vec<bool> = self
            .inequalities
            .iter()
            .map(|inequality| goal.updatable(inequality).is_settable())
            .collect();

        let mut queued = vec![false; self.inequalities.len()];
        let mut worklist = VecDeque::new();
        for (index, inequality) in self.inequalities.iter().enumerate() {
            if updatable[index] && !inequality.is_satisfied(self.cpo)? {
                queued[index] = true;
                worklist.push_back(index);
            }
        }

        let mut updates = 0usize;
        while let Some(index) = worklist.pop_front() {
            // entries dropped after being queued stay in the deque
            if !queued[index] {
                continue;
            }
            queued[index] = false;

            let inequality = &self.inequalities[index];
            let Some(variable) = goal.updatable(inequality).as_variable() else {
                continue;
            };
            let current = variable.value()?;
            let other = goal.fixed(inequality).value()?;
            let bound = match goal {
                Goal::Least => self.cpo.least_upper_bound(&current, &other)?,
                Goal::Greatest => self.cpo.greatest_lower_bound(&current, &other)?,
            };
            let Some(bound) = bound else {
                return Err(Error::NotALattice(format!(
                    "no {} for {current:?} and {other:?}",
                    match goal {
                        Goal::Least => "least upper bound",
                        Goal::Greatest => "greatest lower bound",
                    }
                )));
            };
            trace!(variable = variable.name(), value = ?bound, "update");
            variable.set(bound);
            updates += 1;

            let Some(uses) = self.uses.get(&variable.id()) else {
                continue;
            };
            for &other_index in &uses.inequalities {
                if other_index == index || !updatable[other_index] {
                    continue;
                }
                if self.inequalities[other_index].is_satisfied(self.cpo)? {
                    queued[other_index] = false;
                } else if !queued[other_index] {
                    queued[other_index] = true;
                    worklist.push_back(other_index);
                }
            }
        }

        let mut solved = true;
        for (index, inequality) in self.inequalities.iter().enumerate() {
            if !updatable[index] && !inequality.is_satisfied(self.cpo)? {
                solved = false;
                break;
            }
        }
        debug!(?goal, solved, updates, "solver finished");
        Ok(solved)
    }

    /// Variables whose current value is the CPO's bottom.
    pub fn bottom_variables(&self) -> Result<Vec<Variable<C::Element>>> {
        let bottom = self.cpo.bottom()?;
        Ok(self.variables_at(bottom))
    }

    /// Variables whose current value is the CPO's top.
    pub fn top_variables(&self) -> Result<Vec<Variable<C::Element>>> {
        let top = self.cpo.top()?;
        Ok(self.variables_at(top))
    }

    fn variables_at(&self, value: Option<C::Element>) -> Vec<Variable<C::Element>> {
        let Some(value) = value else {
            return Vec::new();
        };
        self.uses
            .values()
            .filter(|uses| uses.variable.get().as_ref() == Some(&value))
            .map(|uses| uses.variable.clone())
            .collect()
    }

    /// Every inequality the current values violate.
    pub fn unsatisfied_inequalities(&self) -> Result<Vec<&Inequality<C::Element>>> {
        let mut unsatisfied = Vec::new();
        for inequality in &self.inequalities {
            if !inequality.is_satisfied(self.cpo)? {
                unsatisfied.push(inequality);
            }
        }
        Ok(unsatisfied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::graph::DirectedAcyclicGraph;

    /// bot < {a, b} < top
    fn diamond() -> DirectedAcyclicGraph<&'static str> {
        let mut dag = DirectedAcyclicGraph::new();
        for w in ["bot", "a", "b", "top"] {
            dag.add(w).unwrap();
        }
        for (lo, hi) in [("bot", "a"), ("bot", "b"), ("a", "top"), ("b", "top")] {
            dag.add_edge(&lo, &hi).unwrap();
        }
        dag
    }

    #[test]
    fn least_solution_joins_lower_bounds() {
        let dag = diamond();
        let x = Variable::new("x");
        let y = Variable::new("y");
        let mut solver = InequalitySolver::new(&dag);
        solver.add_inequality(Inequality::new(Term::constant("a"), &x));
        solver.add_inequality(Inequality::new(Term::constant("b"), &x));
        solver.add_inequality(Inequality::new(&x, &y));

        assert_eq!(solver.solve_least(), Ok(true));
        assert_eq!(x.get(), Some("top"));
        assert_eq!(y.get(), Some("top"));
        assert!(solver.unsatisfied_inequalities().unwrap().is_empty());
    }

    #[test]
    fn greatest_solution_meets_upper_bounds() {
        let dag = diamond();
        let x = Variable::new("x");
        let mut solver = InequalitySolver::new(&dag);
        solver.add_inequalities([
            Inequality::new(&x, Term::constant("a")),
            Inequality::new(&x, Term::constant("b")),
        ]);

        assert_eq!(solver.solve_greatest(), Ok(true));
        assert_eq!(x.get(), Some("bot"));
        assert_eq!(solver.bottom_variables().unwrap().len(), 1);
        assert!(solver.top_variables().unwrap().is_empty());
    }

    #[test]
    fn unsatisfiable_constant_bound() {
        let dag = diamond();
        let x = Variable::new("x");
        let mut solver = InequalitySolver::new(&dag);
        solver.add_inequality(Inequality::new(Term::constant("a"), &x));
        solver.add_inequality(Inequality::new(&x, Term::constant("b")));

        assert_eq!(solver.solve_least(), Ok(false));
        assert_eq!(x.get(), Some("a"));
        let unsatisfied = solver.unsatisfied_inequalities().unwrap();
        assert_eq!(unsatisfied.len(), 1);
        assert_eq!(unsatisfied[0].to_string(), "x <= \"b\"");
    }

    #[test]
    fn unused_variables_stay_at_bottom() {
        let dag = diamond();
        let x = Variable::new("x");
        let y = Variable::new("y");
        let mut solver = InequalitySolver::new(&dag);
        solver.add_inequality(Inequality::new(&y, &x));

        assert_eq!(solver.solve_least(), Ok(true));
        let names: Vec<String> = solver
            .bottom_variables()
            .unwrap()
            .iter()
            .map(|v| v.name().to_string())
            .collect();
        assert_eq!(names, vec!["y", "x"]);
    }

    #[test]
    fn missing_bottom_is_a_state_error() {
        let mut dag = DirectedAcyclicGraph::new();
        dag.add('p').unwrap();
        dag.add('q').unwrap();
        let x = Variable::new("x");
        let mut solver = InequalitySolver::new(&dag);
        solver.add_inequality(Inequality::new(Term::constant('p'), &x));

        let err = solver.solve_least().unwrap_err();
        assert_eq!(err, Error::MissingExtremum("bottom"));
        assert_eq!(err.kind(), ErrorKind::State);
    }

    #[test]
    fn missing_join_is_a_state_error() {
        // bottom exists but c and d have two incomparable upper bounds
        let mut dag = DirectedAcyclicGraph::new();
        for w in ["bot", "c", "d", "u1", "u2"] {
            dag.add(w).unwrap();
        }
        for (lo, hi) in [
            ("bot", "c"),
            ("bot", "d"),
            ("c", "u1"),
            ("c", "u2"),
            ("d", "u1"),
            ("d", "u2"),
        ] {
            dag.add_edge(&lo, &hi).unwrap();
        }
        let x = Variable::new("x");
        let mut solver = InequalitySolver::new(&dag);
        solver.add_inequality(Inequality::new(Term::constant("c"), &x));
        solver.add_inequality(Inequality::new(Term::constant("d"), &x));

        assert!(matches!(solver.solve_least(), Err(Error::NotALattice(_))));
    }

    #[test]
    fn description_lists_inequalities() {
        let dag = diamond();
        let x = Variable::new("x");
        let mut solver = InequalitySolver::new(&dag);
        solver.add_inequality(Inequality::new(Term::constant("a"), &x));
        solver.add_inequality(Inequality::new(&x, Term::constant("top")));
        assert_eq!(solver.description(), "\"a\" <= x\nx <= \"top\"");
        assert_eq!(solver.variables().len(), 1);
        assert_eq!(solver.inequalities().len(), 2);
    }
}
