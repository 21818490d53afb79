//! Four-valued relation algebra shared by the preorder and the engine.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Known (or unknown) relation between two elements, read left to right:
/// `Less` means the left element is less preferred than the right one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Nothing is known yet.
    #[default]
    Incomparable,
    Less,
    Equal,
    Greater,
}

impl Relation {
    /// The same relation read right to left.
    pub fn invert(self) -> Self {
        match self {
            Relation::Less => Relation::Greater,
            Relation::Greater => Relation::Less,
            other => other,
        }
    }

    /// Compare two naturally ordered values.
    pub fn compare<T: Ord + ?Sized>(a: &T, b: &T) -> Self {
        a.cmp(b).into()
    }

    pub fn is_known(self) -> bool {
        self != Relation::Incomparable
    }

    /// One-character form used by summaries and traces.
    pub fn symbol(self) -> &'static str {
        match self {
            Relation::Incomparable => "?",
            Relation::Less => "<",
            Relation::Equal => "=",
            Relation::Greater => ">",
        }
    }
}

impl From<Ordering> for Relation {
    fn from(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => Relation::Less,
            Ordering::Equal => Relation::Equal,
            Ordering::Greater => Relation::Greater,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Relation::Incomparable => "incomparable",
            Relation::Less => "less",
            Relation::Equal => "equal",
            Relation::Greater => "greater",
        };
        f.write_str(name)
    }
}
