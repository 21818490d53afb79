//! Criteria, items and the item space.
//!
//! A criterion is an ordered list of levels where later levels are better.
//! Level values are opaque: only their position inside the criterion is
//! ever consulted, so every comparison goes through rank vectors.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::relation::Relation;

/// Bound shared by every level type the engine can work with.
pub trait Level: Clone + Eq + Hash + Debug + Send + Sync {}

impl<T: Clone + Eq + Hash + Debug + Send + Sync> Level for T {}

/// One level per criterion, in criterion order.
pub type Item<L> = Vec<L>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpaceError {
    #[error("at least one criterion is required")]
    NoCriteria,
    #[error("criterion {0} has no levels")]
    EmptyCriterion(usize),
    #[error("criterion {criterion} lists level {level} more than once")]
    DuplicateLevel { criterion: usize, level: String },
    #[error("item has {got} levels, expected {expected}")]
    WrongArity { expected: usize, got: usize },
    #[error("level {level} is not part of criterion {criterion}")]
    UnknownLevel { criterion: usize, level: String },
}

/// Validated criteria with a per-criterion level index.
#[derive(Debug, Clone)]
pub struct Criteria<L: Level> {
    levels: Vec<Vec<L>>,
    ranks: Vec<HashMap<L, usize>>,
}

impl<L: Level> Criteria<L> {
    pub fn new<C, I>(criteria: C) -> Result<Self, SpaceError>
    where
        C: IntoIterator<Item = I>,
        I: IntoIterator<Item = L>,
    {
        let levels: Vec<Vec<L>> = criteria
            .into_iter()
            .map(|c| c.into_iter().collect())
            .collect();
        if levels.is_empty() {
            return Err(SpaceError::NoCriteria);
        }

        let mut ranks = Vec::with_capacity(levels.len());
        for (ci, criterion) in levels.iter().enumerate() {
            if criterion.is_empty() {
                return Err(SpaceError::EmptyCriterion(ci));
            }
            let mut index = HashMap::with_capacity(criterion.len());
            for (rank, level) in criterion.iter().enumerate() {
                if index.insert(level.clone(), rank).is_some() {
                    return Err(SpaceError::DuplicateLevel {
                        criterion: ci,
                        level: format!("{level:?}"),
                    });
                }
            }
            ranks.push(index);
        }
        Ok(Self { levels, ranks })
    }

    /// Number of criteria.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always false for validated criteria.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn levels(&self) -> &[Vec<L>] {
        &self.levels
    }

    pub fn rank_of(&self, criterion: usize, level: &L) -> Option<usize> {
        self.ranks.get(criterion)?.get(level).copied()
    }

    /// Per-criterion level indices of `item`.
    pub fn rank_vector(&self, item: &[L]) -> Result<Vec<usize>, SpaceError> {
        if item.len() != self.len() {
            return Err(SpaceError::WrongArity {
                expected: self.len(),
                got: item.len(),
            });
        }
        item.iter()
            .enumerate()
            .map(|(ci, level)| {
                self.rank_of(ci, level).ok_or_else(|| SpaceError::UnknownLevel {
                    criterion: ci,
                    level: format!("{level:?}"),
                })
            })
            .collect()
    }

    pub fn validate_item(&self, item: &[L]) -> Result<(), SpaceError> {
        self.rank_vector(item).map(|_| ())
    }

    /// Number of items in the space.
    pub fn space_size(&self) -> usize {
        self.levels.iter().map(Vec::len).product()
    }

    /// Cartesian product of all criteria, last criterion varying fastest.
    pub fn item_space(&self) -> Vec<Item<L>> {
        let mut items: Vec<Item<L>> = vec![Vec::with_capacity(self.len())];
        for criterion in &self.levels {
            items = items
                .into_iter()
                .flat_map(|prefix| {
                    criterion.iter().map(move |level| {
                        let mut item = prefix.clone();
                        item.push(level.clone());
                        item
                    })
                })
                .collect();
        }
        items
    }

    /// The item at the top level of every criterion.
    pub fn best_item(&self) -> Item<L> {
        self.levels
            .iter()
            .filter_map(|criterion| criterion.last().cloned())
            .collect()
    }

    /// The best item, except on `criteria` where it takes `from`'s levels.
    pub fn deviate(&self, criteria: &[usize], from: &[L]) -> Item<L> {
        self.levels
            .iter()
            .enumerate()
            .filter_map(|(ci, levels)| {
                if criteria.contains(&ci) {
                    from.get(ci).cloned()
                } else {
                    levels.last().cloned()
                }
            })
            .collect()
    }

    /// Dominance relation between two items, if one weakly dominates.
    pub fn dominance(&self, a: &[L], b: &[L]) -> Result<Option<Relation>, SpaceError> {
        Ok(dominance(&self.rank_vector(a)?, &self.rank_vector(b)?))
    }
}

/// Dominance between two rank vectors: `Some(Less)` if `b` is at least as
/// good as `a` everywhere, `Some(Greater)` for the reverse, `Some(Equal)`
/// when identical, `None` when each side wins somewhere.
pub fn dominance(a: &[usize], b: &[usize]) -> Option<Relation> {
    let mut less = false;
    let mut greater = false;
    for (x, y) in a.iter().zip(b) {
        match x.cmp(y) {
            std::cmp::Ordering::Less => less = true,
            std::cmp::Ordering::Greater => greater = true,
            std::cmp::Ordering::Equal => {}
        }
    }
    match (less, greater) {
        (true, true) => None,
        (true, false) => Some(Relation::Less),
        (false, true) => Some(Relation::Greater),
        (false, false) => Some(Relation::Equal),
    }
}
