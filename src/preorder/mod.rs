//! Incrementally maintained preordered set.
//!
//! Elements can be added at any time and enter incomparable to everything
//! already tracked. Each `learn` pins one relation and then updates the
//! transitive closure, so `cmp` is always a plain lookup:
//! - Storage is a lower-triangular matrix indexed by insertion order.
//! - The canonical direction of a pair is "earlier inserted first".
//! - A contradiction leaves the set exactly as it was before the call.

mod render;

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use crate::relation::Relation;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreorderError {
    #[error("{pair}: known to be {was}, now claimed to be {claimed}")]
    Contradiction {
        pair: String,
        was: Relation,
        claimed: Relation,
    },
    #[error("element is not tracked: {0}")]
    UnknownElement(String),
    #[error("cannot assert an incomparable relation for {0}")]
    IncomparableAssertion(String),
}

impl PreorderError {
    pub fn is_contradiction(&self) -> bool {
        matches!(self, PreorderError::Contradiction { .. })
    }
}

/// A set equipped with a preorder that is only partly known.
#[derive(Debug, Clone)]
pub struct PreorderedSet<T> {
    elements: Vec<T>,
    index: HashMap<T, usize>,
    /// `rows[j][i]` (for `i < j`) is the relation of element `i` to element `j`.
    rows: Vec<Vec<Relation>>,
}

impl<T> Default for PreorderedSet<T> {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
            index: HashMap::new(),
            rows: Vec::new(),
        }
    }
}

impl<T: Clone + Eq + Hash + Debug> PreorderedSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_elements(elements: impl IntoIterator<Item = T>) -> Self {
        let mut set = Self::new();
        for x in elements {
            set.add(x);
        }
        set
    }

    /// Build a set and learn each `(a, b, rel)` in order.
    pub fn with_relations(
        elements: impl IntoIterator<Item = T>,
        relations: impl IntoIterator<Item = (T, T, Relation)>,
    ) -> Result<Self, PreorderError> {
        let mut set = Self::from_elements(elements);
        for (a, b, rel) in relations {
            set.learn(&a, &b, rel)?;
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, x: &T) -> bool {
        self.index.contains_key(x)
    }

    /// Tracked elements in insertion order.
    pub fn elements(&self) -> &[T] {
        &self.elements
    }

    /// Track `x`. Returns false if it was already tracked.
    pub fn add(&mut self, x: T) -> bool {
        if self.index.contains_key(&x) {
            return false;
        }
        let position = self.elements.len();
        self.rows.push(vec![Relation::Incomparable; position]);
        self.index.insert(x.clone(), position);
        self.elements.push(x);
        true
    }

    /// Relation of `a` to `b`, or `None` if either is untracked.
    pub fn try_cmp(&self, a: &T, b: &T) -> Option<Relation> {
        let ia = *self.index.get(a)?;
        let ib = *self.index.get(b)?;
        Some(self.rel(ia, ib))
    }

    /// Relation of `a` to `b`.
    ///
    /// # Panics
    ///
    /// Panics if either element is not tracked.
    pub fn cmp(&self, a: &T, b: &T) -> Relation {
        match self.try_cmp(a, b) {
            Some(rel) => rel,
            None => panic!("cmp on untracked element: {a:?} vs {b:?}"),
        }
    }

    /// Assert `rel` between `a` and `b` and extend the transitive closure.
    ///
    /// Returns the canonical pairs that were newly pinned, the asserted pair
    /// first. An empty list means the fact was already known.
    pub fn learn(&mut self, a: &T, b: &T, rel: Relation) -> Result<Vec<(T, T)>, PreorderError> {
        if !rel.is_known() {
            return Err(PreorderError::IncomparableAssertion(format!("({a:?}, {b:?})")));
        }
        let ia = self.position(a)?;
        let ib = self.position(b)?;

        let mut pinned: Vec<(usize, usize)> = Vec::new();
        let outcome = self.learn_indices(ia, ib, rel, &mut pinned);
        if let Err(err) = outcome {
            for &(i, j) in &pinned {
                self.rows[j][i] = Relation::Incomparable;
            }
            return Err(err);
        }

        Ok(pinned
            .into_iter()
            .map(|(i, j)| (self.elements[i].clone(), self.elements[j].clone()))
            .collect())
    }

    /// Elements of `among` (default: all) comparable to every member of
    /// `among` and beaten by fewer than `n` of them (or beating fewer than
    /// `n` of them when `bottom`).
    pub fn extreme(&self, n: usize, among: Option<&[T]>, bottom: bool) -> HashSet<T> {
        let members = self.members(among);
        let beaten_by = if bottom {
            Relation::Greater
        } else {
            Relation::Less
        };
        members
            .iter()
            .filter(|&&x| {
                let mut beaten = 0usize;
                for &y in &members {
                    match self.rel(x, y) {
                        Relation::Incomparable => return false,
                        rel if rel == beaten_by => beaten += 1,
                        _ => {}
                    }
                }
                beaten < n
            })
            .map(|&x| self.elements[x].clone())
            .collect()
    }

    pub fn maxes(&self, among: Option<&[T]>) -> HashSet<T> {
        self.extreme(1, among, false)
    }

    pub fn mins(&self, among: Option<&[T]>) -> HashSet<T> {
        self.extreme(1, among, true)
    }

    /// Restriction to `subset`, keeping relations verbatim.
    pub fn get_subset(&self, subset: &[T]) -> Result<Self, PreorderError> {
        for x in subset {
            self.position(x)?;
        }
        Ok(self.restrict(subset))
    }

    /// Like [`get_subset`](Self::get_subset), skipping untracked elements.
    pub fn restrict(&self, subset: &[T]) -> Self {
        let mut positions = Vec::with_capacity(subset.len());
        let mut out = Self::new();
        for x in subset {
            let Some(&position) = self.index.get(x) else {
                continue;
            };
            if out.add(x.clone()) {
                positions.push(position);
            }
        }
        for (j, &pj) in positions.iter().enumerate() {
            for (i, &pi) in positions[..j].iter().enumerate() {
                out.rows[j][i] = self.rel(pi, pj);
            }
        }
        out
    }

    /// Known relations as canonical `(a, b, rel)` triples.
    pub fn known_relations(&self) -> impl Iterator<Item = (&T, &T, Relation)> + '_ {
        self.rows.iter().enumerate().flat_map(move |(j, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, rel)| rel.is_known())
                .map(move |(i, &rel)| (&self.elements[i], &self.elements[j], rel))
        })
    }

    /// Number of unordered pairs within `among` (default: all) still unknown.
    pub fn incomparable_pairs(&self, among: Option<&[T]>) -> usize {
        let members = self.members(among);
        let mut count = 0;
        for (j, &y) in members.iter().enumerate() {
            for &x in &members[..j] {
                if !self.rel(x, y).is_known() {
                    count += 1;
                }
            }
        }
        count
    }

    fn members(&self, among: Option<&[T]>) -> Vec<usize> {
        match among {
            Some(xs) => {
                let mut seen = HashSet::new();
                xs.iter()
                    .filter_map(|x| self.index.get(x).copied())
                    .filter(|&i| seen.insert(i))
                    .collect()
            }
            None => (0..self.elements.len()).collect(),
        }
    }

    fn position(&self, x: &T) -> Result<usize, PreorderError> {
        self.index
            .get(x)
            .copied()
            .ok_or_else(|| PreorderError::UnknownElement(format!("{x:?}")))
    }

    fn rel(&self, i: usize, j: usize) -> Relation {
        match i.cmp(&j) {
            std::cmp::Ordering::Equal => Relation::Equal,
            std::cmp::Ordering::Less => self.rows[j][i],
            std::cmp::Ordering::Greater => self.rows[i][j].invert(),
        }
    }

    /// Pin a single relation. Returns true if the matrix changed.
    fn set(&mut self, i: usize, j: usize, rel: Relation) -> Result<bool, PreorderError> {
        if i == j {
            if rel != Relation::Equal {
                return Err(self.contradiction(i, j, Relation::Equal, rel));
            }
            return Ok(false);
        }
        let (lo, hi, rel) = if i < j { (i, j, rel) } else { (j, i, rel.invert()) };
        let was = self.rows[hi][lo];
        if was == Relation::Incomparable {
            self.rows[hi][lo] = rel;
            Ok(true)
        } else if was == rel {
            Ok(false)
        } else {
            Err(self.contradiction(lo, hi, was, rel))
        }
    }

    fn learn_indices(
        &mut self,
        a: usize,
        b: usize,
        rel: Relation,
        pinned: &mut Vec<(usize, usize)>,
    ) -> Result<(), PreorderError> {
        if !self.set(a, b, rel)? {
            return Ok(());
        }
        pinned.push(canonical(a, b));

        // Warshall's algorithm restricted to the two endpoints.
        let n = self.elements.len();
        for k in [a, b] {
            for i in 0..n {
                for j in 0..n {
                    let r1 = self.rel(i, k);
                    let r2 = self.rel(k, j);
                    let forced = (r1.is_known() && r2 == Relation::Equal)
                        || (r1 == Relation::Less && r2 == Relation::Less);
                    if forced && self.set(i, j, r1)? {
                        pinned.push(canonical(i, j));
                    }
                }
            }
        }
        Ok(())
    }

    fn contradiction(&self, i: usize, j: usize, was: Relation, claimed: Relation) -> PreorderError {
        PreorderError::Contradiction {
            pair: format!("({:?}, {:?})", self.elements[i], self.elements[j]),
            was,
            claimed,
        }
    }
}

fn canonical(i: usize, j: usize) -> (usize, usize) {
    if i < j {
        (i, j)
    } else {
        (j, i)
    }
}
