//! Request/outcome types for an elicitation session.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::preorder::{PreorderError, PreorderedSet};
use crate::space::{Item, Level, SpaceError};

use super::trace::TraceError;

/// Default cap on combined deviating criteria per question.
pub const DEFAULT_MAX_DEV: usize = 2;

/// `(left, right)`: how many criteria each probe item takes from its own
/// side of the pair under comparison.
pub type Split = (usize, usize);

// =============================================================================
// Request
// =============================================================================

/// What the session is trying to learn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    /// Identify the top `k` alternatives.
    FindBest(usize),
    /// Make every pair of alternatives comparable.
    RankAlternatives,
    /// Make every pair of the whole item space comparable.
    RankSpace,
}

impl Goal {
    /// Size of the extreme set reported as "best".
    pub fn best_count(&self) -> usize {
        match self {
            Goal::FindBest(k) => *k,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ElicitRequest<L: Level> {
    /// Level sequences, worst level first.
    pub criteria: Vec<Vec<L>>,
    /// Items under decision. `None` means the whole item space.
    pub alternatives: Option<Vec<Item<L>>>,
    pub goal: Goal,
    /// Maximum deviating criteria summed over both probe items.
    pub max_dev: usize,
}

impl<L: Level> ElicitRequest<L> {
    pub fn new(criteria: Vec<Vec<L>>, goal: Goal) -> Self {
        Self {
            criteria,
            alternatives: None,
            goal,
            max_dev: DEFAULT_MAX_DEV,
        }
    }

    pub fn with_alternatives(mut self, alternatives: Vec<Item<L>>) -> Self {
        self.alternatives = Some(alternatives);
        self
    }

    pub fn with_max_dev(mut self, max_dev: usize) -> Self {
        self.max_dev = max_dev;
        self
    }
}

// =============================================================================
// Outcome
// =============================================================================

/// Why the session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The goal's stopping predicate holds.
    GoalMet,
    /// Every schedule step ran and some pairs stayed incomparable.
    Exhausted,
    /// The oracle abandoned the session.
    Aborted,
}

#[derive(Debug, Clone, Serialize)]
pub struct ElicitMeta {
    pub goal: Goal,
    pub stop_reason: StopReason,
    pub max_dev: usize,
    /// Oracle questions answered.
    pub questions_asked: usize,
    /// Probes answered from the known order without asking.
    pub probes_known: usize,
    pub pairs_resolved: usize,
    pub pairs_deferred: usize,
    /// Schedule steps entered.
    pub schedule_steps: usize,
    /// Alternative pairs still incomparable at the end.
    pub incomparable_pairs: usize,
    pub latency_ms: u128,
}

#[derive(Debug, Clone)]
pub struct ElicitOutcome<L: Level> {
    /// Everything learned, probe items included.
    pub prefs: PreorderedSet<Item<L>>,
    /// Alternatives as requested (the whole space when none were given).
    pub alternatives: Vec<Item<L>>,
    /// Most preferred item of the last pair examined (FindBest only).
    pub focus: Option<Item<L>>,
    pub meta: ElicitMeta,
}

impl<L: Level> ElicitOutcome<L> {
    /// The learned order restricted to the alternatives.
    pub fn ranking(&self) -> PreorderedSet<Item<L>> {
        self.prefs.restrict(&self.alternatives)
    }

    /// Alternatives known to be among the best `goal.best_count()`.
    pub fn best(&self) -> HashSet<Item<L>> {
        self.prefs
            .extreme(self.meta.goal.best_count(), Some(self.alternatives.as_slice()), false)
    }
}

// =============================================================================
// Error type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ElicitError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Item space error: {0}")]
    Space(#[from] SpaceError),
    #[error("Preference error: {0}")]
    Preorder(#[from] PreorderError),
    #[error("Invalid answer: oracle called {a} and {b} incomparable")]
    InvalidAnswer { a: String, b: String },
    #[error("Trace error: {0}")]
    Trace(#[from] TraceError),
}

impl ElicitError {
    /// True when the oracle's answers were inconsistent.
    pub fn is_contradiction(&self) -> bool {
        matches!(self, ElicitError::Preorder(err) if err.is_contradiction())
    }
}
