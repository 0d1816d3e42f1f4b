//! Inequalities over a CPO.

use std::fmt::{self, Debug};

use super::term::{Term, Variable};
use crate::error::Result;
use crate::graph::Cpo;

/// The constraint `lesser <= greater`.
#[derive(Debug, Clone)]
pub struct Inequality<E> {
    lesser: Term<E>,
    greater: Term<E>,
}

impl<E: Clone + PartialEq + Debug> Inequality<E> {
    pub fn new(lesser: impl Into<Term<E>>, greater: impl Into<Term<E>>) -> Self {
        Self {
            lesser: lesser.into(),
            greater: greater.into(),
        }
    }

    pub fn lesser(&self) -> &Term<E> {
        &self.lesser
    }

    pub fn greater(&self) -> &Term<E> {
        &self.greater
    }

    /// Whether the current values satisfy the constraint in `cpo`.
    pub fn is_satisfied<C>(&self, cpo: &C) -> Result<bool>
    where
        C: Cpo<Element = E> + ?Sized,
    {
        let code = cpo.compare(&self.lesser.value()?, &self.greater.value()?)?;
        Ok(code.is_lower_or_same())
    }

    /// Every variable on either side, without duplicates.
    pub fn variables(&self) -> Vec<Variable<E>> {
        let mut found = self.lesser.variables();
        for variable in self.greater.variables() {
            if !found.iter().any(|known| known.id() == variable.id()) {
                found.push(variable);
            }
        }
        found
    }

    /// Definite for least solving: the greater side is a constant or a
    /// single variable.
    pub fn is_definite_for_least(&self) -> bool {
        !matches!(self.greater, Term::Function(_))
    }

    /// Definite for greatest solving: the lesser side is a constant or a
    /// single variable.
    pub fn is_definite_for_greatest(&self) -> bool {
        !matches!(self.lesser, Term::Function(_))
    }
}

impl<E: Debug> fmt::Display for Inequality<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <= {}", self.lesser, self.greater)
    }
}
