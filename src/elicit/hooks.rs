//! Extension hooks for hosts that drive a session.
//!
//! The engine never prints. Hosts that want progress output (a terminal
//! front end, a test harness counting passes) implement [`SessionObserver`].

use crate::relation::Relation;
use crate::space::{Item, Level};

use super::types::Split;

/// How the engine finished with one candidate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    /// The pair is now known to stand in this relation.
    Resolved(Relation),
    /// The current splits were not enough; retried on a later step.
    Deferred,
}

#[derive(Debug, Clone)]
pub struct PairEvent<L: Level> {
    /// 1-based schedule step.
    pub step: usize,
    pub a: Item<L>,
    pub b: Item<L>,
    pub outcome: PairOutcome,
    /// Oracle questions asked so far in the session.
    pub questions_asked: usize,
}

pub trait SessionObserver<L: Level>: Send {
    /// Called once when a schedule step starts, with its splits newest first.
    fn on_schedule(&mut self, _step: usize, _splits: &[Split]) {}

    fn on_pair(&mut self, _event: &PairEvent<L>) {}
}

/// Closure adapter for hosts that only care about schedule changes.
pub struct ScheduleCallback<F>(pub F);

impl<L, F> SessionObserver<L> for ScheduleCallback<F>
where
    L: Level,
    F: FnMut(usize, &[Split]) + Send,
{
    fn on_schedule(&mut self, step: usize, splits: &[Split]) {
        (self.0)(step, splits)
    }
}
