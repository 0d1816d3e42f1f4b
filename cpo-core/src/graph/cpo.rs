//! Complete Partial Orders
//!
//! The [`Cpo`] trait is the order oracle consumed by the inequality solver.
//! [`DirectedAcyclicGraph`](super::DirectedAcyclicGraph) implements it for
//! finite orders given by their Hasse diagram; small hand-written orders only
//! need the extremal elements, `compare` and the pairwise bounds.

use std::fmt::{self, Debug};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Outcome of comparing two elements of a partial order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareCode {
    Lower,
    Same,
    Higher,
    Incomparable,
}

impl CompareCode {
    /// The code obtained by swapping the two compared elements.
    pub fn reverse(self) -> Self {
        match self {
            CompareCode::Lower => CompareCode::Higher,
            CompareCode::Higher => CompareCode::Lower,
            other => other,
        }
    }

    pub fn is_lower_or_same(self) -> bool {
        matches!(self, CompareCode::Lower | CompareCode::Same)
    }

    pub fn is_higher_or_same(self) -> bool {
        matches!(self, CompareCode::Higher | CompareCode::Same)
    }
}

/// What a [`NonLatticeCounterexample`] demonstrates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundKind {
    /// The graph has a cycle through the named element.
    GraphCycle,
    /// The two named elements have no least upper bound.
    LeastUpper,
    /// The two named elements have no greatest lower bound.
    GreatestLower,
}

/// Evidence that an order is not a lattice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonLatticeCounterexample<E> {
    kind: BoundKind,
    elements: Vec<E>,
}

impl<E> NonLatticeCounterexample<E> {
    pub fn cycle(node: E) -> Self {
        Self {
            kind: BoundKind::GraphCycle,
            elements: vec![node],
        }
    }

    pub fn missing_least_upper(e1: E, e2: E) -> Self {
        Self {
            kind: BoundKind::LeastUpper,
            elements: vec![e1, e2],
        }
    }

    pub fn missing_greatest_lower(e1: E, e2: E) -> Self {
        Self {
            kind: BoundKind::GreatestLower,
            elements: vec![e1, e2],
        }
    }

    pub fn kind(&self) -> BoundKind {
        self.kind
    }

    /// One element for a cycle, the offending pair otherwise.
    pub fn elements(&self) -> &[E] {
        &self.elements
    }
}

impl<E: Debug> fmt::Display for NonLatticeCounterexample<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            BoundKind::GraphCycle => write!(f, "cycle through {:?}", self.elements),
            BoundKind::LeastUpper => write!(f, "no least upper bound for {:?}", self.elements),
            BoundKind::GreatestLower => {
                write!(f, "no greatest lower bound for {:?}", self.elements)
            }
        }
    }
}

/// A finite partial order with the bound operations the solver relies on.
///
/// Operations return `Ok(None)` when the requested element does not exist,
/// and an error when the order itself is unusable (for example a graph that
/// became cyclic) or an argument is not an element.
pub trait Cpo {
    type Element: Clone + PartialEq + Debug;

    /// The least element of the whole order.
    fn bottom(&self) -> Result<Option<Self::Element>>;

    /// The greatest element of the whole order.
    fn top(&self) -> Result<Option<Self::Element>>;

    fn compare(&self, e1: &Self::Element, e2: &Self::Element) -> Result<CompareCode>;

    fn least_upper_bound(
        &self,
        e1: &Self::Element,
        e2: &Self::Element,
    ) -> Result<Option<Self::Element>>;

    fn greatest_lower_bound(
        &self,
        e1: &Self::Element,
        e2: &Self::Element,
    ) -> Result<Option<Self::Element>>;

    /// Least upper bound of a subset; bottom for the empty subset.
    ///
    /// The default folds the pairwise bound, which is exact for lattices.
    /// Orders that are not lattices should override it.
    fn least_upper_bound_of(&self, subset: &[Self::Element]) -> Result<Option<Self::Element>> {
        let Some((first, rest)) = subset.split_first() else {
            return self.bottom();
        };
        let mut bound = first.clone();
        for element in rest {
            match self.least_upper_bound(&bound, element)? {
                Some(next) => bound = next,
                None => return Ok(None),
            }
        }
        Ok(Some(bound))
    }

    /// Greatest lower bound of a subset; top for the empty subset.
    fn greatest_lower_bound_of(&self, subset: &[Self::Element]) -> Result<Option<Self::Element>> {
        let Some((first, rest)) = subset.split_first() else {
            return self.top();
        };
        let mut bound = first.clone();
        for element in rest {
            match self.greatest_lower_bound(&bound, element)? {
                Some(next) => bound = next,
                None => return Ok(None),
            }
        }
        Ok(Some(bound))
    }

    /// The least element of `subset`, if it has one.
    fn least_element(&self, subset: &[Self::Element]) -> Result<Option<Self::Element>> {
        least_of(subset.to_vec(), |a, b| self.compare(a, b))
    }

    /// The greatest element of `subset`, if it has one.
    fn greatest_element(&self, subset: &[Self::Element]) -> Result<Option<Self::Element>> {
        least_of(subset.to_vec(), |a, b| Ok(self.compare(a, b)?.reverse()))
    }

    /// A reason this order is not a lattice, or `None` if it is one.
    fn non_lattice_reason(&self) -> Option<NonLatticeCounterexample<Self::Element>>;

    fn is_lattice(&self) -> bool {
        self.non_lattice_reason().is_none()
    }
}

/// Least element of `candidates` under `compare`, by pairwise elimination.
///
/// Each round pairs up the remaining candidates. The lower of a comparable
/// pair advances (the earlier one on `Same`); both members of an
/// incomparable pair move to a side list; an unpaired trailing candidate
/// advances unchallenged. Rounds repeat until at most one candidate is left.
/// A survivor is the least element only if it is lower than or equal to
/// everything on the side list.
pub fn least_of<T, F>(candidates: Vec<T>, mut compare: F) -> Result<Option<T>>
where
    F: FnMut(&T, &T) -> Result<CompareCode>,
{
    let mut current = candidates;
    let mut incomparables = Vec::new();

    while current.len() > 1 {
        let mut next = Vec::with_capacity(current.len() / 2 + 1);
        let mut remaining = current.into_iter();
        while let Some(first) = remaining.next() {
            let Some(second) = remaining.next() else {
                next.push(first);
                break;
            };
            match compare(&first, &second)? {
                CompareCode::Lower | CompareCode::Same => next.push(first),
                CompareCode::Higher => next.push(second),
                CompareCode::Incomparable => {
                    incomparables.push(first);
                    incomparables.push(second);
                }
            }
        }
        current = next;
    }

    let Some(candidate) = current.pop() else {
        return Ok(None);
    };
    for other in &incomparables {
        if !compare(&candidate, other)?.is_lower_or_same() {
            return Ok(None);
        }
    }
    Ok(Some(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Divisibility on small positive integers.
    fn divides(a: &u32, b: &u32) -> Result<CompareCode> {
        Ok(if a == b {
            CompareCode::Same
        } else if b % a == 0 {
            CompareCode::Lower
        } else if a % b == 0 {
            CompareCode::Higher
        } else {
            CompareCode::Incomparable
        })
    }

    #[test]
    fn reverse_is_an_involution() {
        for code in [
            CompareCode::Lower,
            CompareCode::Same,
            CompareCode::Higher,
            CompareCode::Incomparable,
        ] {
            assert_eq!(code.reverse().reverse(), code);
        }
        assert_eq!(CompareCode::Lower.reverse(), CompareCode::Higher);
        assert_eq!(CompareCode::Incomparable.reverse(), CompareCode::Incomparable);
    }

    #[test]
    fn least_of_empty_and_single() {
        assert_eq!(least_of(Vec::<u32>::new(), divides), Ok(None));
        assert_eq!(least_of(vec![6], divides), Ok(Some(6)));
    }

    #[test]
    fn least_of_finds_divisor_of_all() {
        assert_eq!(least_of(vec![12, 4, 2, 8, 6], divides), Ok(Some(2)));
        // odd length, least element is the unpaired trailing one
        assert_eq!(least_of(vec![12, 6, 3], divides), Ok(Some(3)));
    }

    #[test]
    fn least_of_checks_side_list() {
        // 4 and 6 are incomparable and nothing divides both in the set
        assert_eq!(least_of(vec![4, 6], divides), Ok(None));
        // survivor 4 does not divide 6 from the side list
        assert_eq!(least_of(vec![6, 9, 4, 8], divides), Ok(None));
        // survivor 1 divides the side list entries
        assert_eq!(least_of(vec![6, 9, 1, 3], divides), Ok(Some(1)));
    }

    #[test]
    fn least_of_prefers_earlier_on_same() {
        let pairs = vec![(1, 'a'), (1, 'b')];
        let result = least_of(pairs, |x, y| divides(&x.0, &y.0));
        assert_eq!(result, Ok(Some((1, 'a'))));
    }

    #[test]
    fn counterexample_accessors() {
        let example = NonLatticeCounterexample::missing_least_upper("x", "y");
        assert_eq!(example.kind(), BoundKind::LeastUpper);
        assert_eq!(example.elements(), &["x", "y"]);
        assert_eq!(example.to_string(), "no least upper bound for [\"x\", \"y\"]");
        assert_eq!(NonLatticeCounterexample::cycle(3).elements(), &[3]);
    }
}
