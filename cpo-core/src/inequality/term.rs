//! Inequality Terms
//!
//! A term is one side of an inequality. There are exactly three kinds:
//!
//! - constants, whose value never changes,
//! - variables, the only settable terms,
//! - functions, whose value is computed from argument terms.
//!
//! # Variables are shared slots
//!
//! Cloning a [`Variable`] clones a handle, not the value. Every clone reads
//! and writes the same slot, so one variable can appear in many
//! inequalities and the solver updates all of them at once. The slot is an
//! `Rc<RefCell<_>>`; variables stay on the thread that created them.

use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};

/// Unique identifier for a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(u64);

impl VariableId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// A settable term.
pub struct Variable<E> {
    id: VariableId,
    name: Rc<str>,
    value: Rc<RefCell<Option<E>>>,
}

impl<E: Clone> Variable<E> {
    /// A variable with no value yet.
    pub fn new(name: impl Into<Rc<str>>) -> Self {
        Self {
            id: VariableId::next(),
            name: name.into(),
            value: Rc::new(RefCell::new(None)),
        }
    }

    /// A variable starting at `value`.
    pub fn with_value(name: impl Into<Rc<str>>, value: E) -> Self {
        let variable = Self::new(name);
        variable.set(value);
        variable
    }

    pub fn id(&self) -> VariableId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current value, if one was set.
    pub fn get(&self) -> Option<E> {
        self.value.borrow().clone()
    }

    /// The current value, or a state error if none was set.
    pub fn value(&self) -> Result<E> {
        self.get()
            .ok_or_else(|| Error::UnsetVariable(self.name.to_string()))
    }

    /// Overwrite the value. Visible through every clone of this handle.
    pub fn set(&self, value: E) {
        *self.value.borrow_mut() = Some(value);
    }

    pub fn is_set(&self) -> bool {
        self.value.borrow().is_some()
    }
}

impl<E> Clone for Variable<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: Rc::clone(&self.name),
            value: Rc::clone(&self.value),
        }
    }
}

impl<E: Debug> Debug for Variable<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("value", &self.value.borrow())
            .finish()
    }
}

type Evaluate<E> = Rc<dyn Fn(&[E]) -> E>;

/// A term computed from argument terms.
///
/// The function should be monotone in its arguments for the solver's
/// results to be meaningful.
pub struct FunctionTerm<E> {
    name: Rc<str>,
    args: Vec<Term<E>>,
    evaluate: Evaluate<E>,
}

impl<E: Clone> FunctionTerm<E> {
    pub fn new<F>(name: impl Into<Rc<str>>, args: Vec<Term<E>>, evaluate: F) -> Self
    where
        F: Fn(&[E]) -> E + 'static,
    {
        Self {
            name: name.into(),
            args,
            evaluate: Rc::new(evaluate),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Term<E>] {
        &self.args
    }

    /// Evaluate the arguments, then the function.
    pub fn value(&self) -> Result<E> {
        let values = self
            .args
            .iter()
            .map(Term::value)
            .collect::<Result<Vec<E>>>()?;
        Ok((self.evaluate)(&values))
    }
}

impl<E: Clone> Clone for FunctionTerm<E> {
    fn clone(&self) -> Self {
        Self {
            name: Rc::clone(&self.name),
            args: self.args.clone(),
            evaluate: Rc::clone(&self.evaluate),
        }
    }
}

impl<E: Debug> Debug for FunctionTerm<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTerm")
            .field("name", &self.name)
            .field("args", &self.args)
            .finish()
    }
}

/// One side of an inequality.
#[derive(Debug)]
pub enum Term<E> {
    Constant(E),
    Variable(Variable<E>),
    Function(FunctionTerm<E>),
}

impl<E: Clone> Term<E> {
    pub fn constant(value: E) -> Self {
        Term::Constant(value)
    }

    pub fn function<F>(name: impl Into<Rc<str>>, args: Vec<Term<E>>, evaluate: F) -> Self
    where
        F: Fn(&[E]) -> E + 'static,
    {
        Term::Function(FunctionTerm::new(name, args, evaluate))
    }

    /// The current value. Fails if a variable involved has no value.
    pub fn value(&self) -> Result<E> {
        match self {
            Term::Constant(value) => Ok(value.clone()),
            Term::Variable(variable) => variable.value(),
            Term::Function(function) => function.value(),
        }
    }

    /// Only variables can be set.
    pub fn is_settable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    pub fn as_variable(&self) -> Option<&Variable<E>> {
        match self {
            Term::Variable(variable) => Some(variable),
            _ => None,
        }
    }

    /// Every variable this term depends on, without duplicates, in order of
    /// first appearance.
    pub fn variables(&self) -> Vec<Variable<E>> {
        let mut found = Vec::new();
        self.collect_variables(&mut found);
        found
    }

    fn collect_variables(&self, found: &mut Vec<Variable<E>>) {
        match self {
            Term::Constant(_) => {}
            Term::Variable(variable) => {
                if !found.iter().any(|known| known.id() == variable.id()) {
                    found.push(variable.clone());
                }
            }
            Term::Function(function) => {
                for arg in function.args() {
                    arg.collect_variables(found);
                }
            }
        }
    }
}

impl<E: Clone> From<Variable<E>> for Term<E> {
    fn from(variable: Variable<E>) -> Self {
        Term::Variable(variable)
    }
}

impl<E: Clone> From<&Variable<E>> for Term<E> {
    fn from(variable: &Variable<E>) -> Self {
        Term::Variable(variable.clone())
    }
}

impl<E: Clone> Clone for Term<E> {
    fn clone(&self) -> Self {
        match self {
            Term::Constant(value) => Term::Constant(value.clone()),
            Term::Variable(variable) => Term::Variable(variable.clone()),
            Term::Function(function) => Term::Function(function.clone()),
        }
    }
}

impl<E: Debug> fmt::Display for Term<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Constant(value) => write!(f, "{value:?}"),
            Term::Variable(variable) => write!(f, "{}", variable.name),
            Term::Function(function) => {
                write!(f, "{}(", function.name)?;
                for (i, arg) in function.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}
