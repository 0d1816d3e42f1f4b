//! Transitive Closure
//!
//! A square boolean matrix indexed by node label. After
//! [`ClosureMatrix::from_edges`], cell `(a, b)` is set iff there is a
//! directed path of length at least one from `a` to `b`, so a set diagonal
//! cell means the node lies on a cycle.

/// Dense boolean reachability matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureMatrix {
    size: usize,
    cells: Vec<bool>,
}

impl ClosureMatrix {
    /// An all-false `size x size` matrix.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![false; size * size],
        }
    }

    /// Seed the matrix with the given `(source, sink)` label pairs and close
    /// it transitively with Warshall's algorithm. O(size³).
    pub fn from_edges<I>(size: usize, edges: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut matrix = Self::new(size);
        for (source, sink) in edges {
            matrix.set(source, sink);
        }
        matrix.close();
        matrix
    }

    fn close(&mut self) {
        let n = self.size;
        for k in 0..n {
            for i in 0..n {
                if !self.cells[i * n + k] {
                    continue;
                }
                for j in 0..n {
                    if self.cells[k * n + j] {
                        self.cells[i * n + j] = true;
                    }
                }
            }
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether `to` is reachable from `from` by a non-empty path.
    pub fn get(&self, from: usize, to: usize) -> bool {
        from < self.size && to < self.size && self.cells[from * self.size + to]
    }

    fn set(&mut self, from: usize, to: usize) {
        self.cells[from * self.size + to] = true;
    }

    /// The matrix of the reversed relation.
    pub fn transpose(&self) -> Self {
        let n = self.size;
        let mut transposed = Self::new(n);
        for i in 0..n {
            for j in 0..n {
                transposed.cells[j * n + i] = self.cells[i * n + j];
            }
        }
        transposed
    }

    /// The first label whose diagonal cell is set, if any.
    pub fn first_on_cycle(&self) -> Option<usize> {
        (0..self.size).find(|&i| self.cells[i * self.size + i])
    }

    pub fn is_acyclic(&self) -> bool {
        self.first_on_cycle().is_none()
    }

    /// Labels reachable from `from`, ascending.
    pub fn successors(&self, from: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.size).filter(move |&to| self.get(from, to))
    }
}
