//! Elicitation session orchestrator.
//!
//! Core loop, once per schedule step:
//! 1. Check the goal's stopping predicate.
//! 2. Drop candidate pairs that are already comparable (and, for
//!    `FindBest`, pairs touching alternatives that cannot make the top k).
//! 3. Take the greatest remaining pair in rank order and search for its
//!    relation by probing deviation items of the two sides.
//! 4. Fold every oracle answer back into the preorder, which extends the
//!    transitive closure; record a resolved pair, defer an unresolved one.
//!
//! When no candidate is left but some pair of the pool is still unknown,
//! the next step unlocks larger splits and the pass starts over.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt};

use crate::preorder::PreorderedSet;
use crate::relation::Relation;
use crate::space::{dominance, Criteria, Item, Level};

use super::hooks::{PairEvent, PairOutcome, SessionObserver};
use super::oracle::Oracle;
use super::schedule::{combinations, split_schedule};
use super::trace::{epoch_ms, QuestionTrace, TraceSink};
use super::types::{
    ElicitError, ElicitMeta, ElicitOutcome, ElicitRequest, Goal, Split, StopReason,
};

/// Where the deviation search for one pair ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Search {
    Resolved(Relation),
    Unresolved,
    Aborted,
}

// =============================================================================
// Validation
// =============================================================================

pub fn validate_request<L: Level>(req: &ElicitRequest<L>) -> Result<(), ElicitError> {
    prepare(req).map(|_| ())
}

/// Validated criteria plus the alternatives (the whole space when omitted).
fn prepare<L: Level>(req: &ElicitRequest<L>) -> Result<(Criteria<L>, Vec<Item<L>>), ElicitError> {
    let criteria = Criteria::new(req.criteria.iter().cloned())?;

    let max_dev_limit = 2 * criteria.len();
    if req.max_dev < 2 || req.max_dev > max_dev_limit {
        return Err(ElicitError::InvalidRequest(format!(
            "max_dev must be in 2..={max_dev_limit} (got {})",
            req.max_dev
        )));
    }

    let alternatives = match &req.alternatives {
        Some(alternatives) => {
            if alternatives.is_empty() {
                return Err(ElicitError::InvalidRequest(
                    "alternatives must not be empty".into(),
                ));
            }
            let mut seen: HashSet<&Item<L>> = HashSet::new();
            for alt in alternatives {
                criteria.validate_item(alt)?;
                if !seen.insert(alt) {
                    return Err(ElicitError::InvalidRequest(format!(
                        "duplicate alternative: {alt:?}"
                    )));
                }
            }
            alternatives.clone()
        }
        None => criteria.item_space(),
    };

    if let Goal::FindBest(k) = req.goal {
        if k == 0 {
            return Err(ElicitError::InvalidRequest("find_best must be >= 1".into()));
        }
        if k > alternatives.len() {
            return Err(ElicitError::InvalidRequest(format!(
                "find_best must be <= number of alternatives (k={k}, n={})",
                alternatives.len()
            )));
        }
    }

    Ok((criteria, alternatives))
}

// =============================================================================
// Entry points
// =============================================================================

/// Run an elicitation session against `oracle`.
pub async fn elicit<L, O>(req: ElicitRequest<L>, oracle: &mut O) -> Result<ElicitOutcome<L>, ElicitError>
where
    L: Level,
    O: Oracle<L> + ?Sized,
{
    elicit_with_trace(req, oracle, None, None).await
}

/// Run an elicitation session with an optional observer and trace output.
pub async fn elicit_with_trace<L, O>(
    req: ElicitRequest<L>,
    oracle: &mut O,
    observer: Option<&mut dyn SessionObserver<L>>,
    trace: Option<&dyn TraceSink>,
) -> Result<ElicitOutcome<L>, ElicitError>
where
    L: Level,
    O: Oracle<L> + ?Sized,
{
    let (criteria, alternatives) = prepare(&req)?;
    let pool = match req.goal {
        Goal::RankSpace => criteria.item_space(),
        Goal::FindBest(_) | Goal::RankAlternatives => alternatives.clone(),
    };

    let session = Session {
        criteria,
        goal: req.goal,
        prefs: PreorderedSet::new(),
        ranks: HashMap::new(),
        oracle,
        observer,
        trace,
        focus: None,
        step: 0,
        questions_asked: 0,
        probes_known: 0,
        pairs_resolved: 0,
        pairs_deferred: 0,
    };
    session.run(pool, alternatives, req.max_dev).await
}

/// Blocking form of [`elicit`] for synchronous oracles.
pub fn elicit_blocking<L, O>(req: ElicitRequest<L>, oracle: &mut O) -> Result<ElicitOutcome<L>, ElicitError>
where
    L: Level,
    O: Oracle<L> + ?Sized,
{
    futures::executor::block_on(elicit(req, oracle))
}

// =============================================================================
// Session state
// =============================================================================

struct Session<'a, 'o, L: Level, O: ?Sized> {
    criteria: Criteria<L>,
    goal: Goal,
    prefs: PreorderedSet<Item<L>>,
    /// Rank vector of every tracked item.
    ranks: HashMap<Item<L>, Vec<usize>>,
    oracle: &'a mut O,
    observer: Option<&'a mut (dyn SessionObserver<L> + 'o)>,
    trace: Option<&'a dyn TraceSink>,
    focus: Option<Item<L>>,
    step: usize,
    questions_asked: usize,
    probes_known: usize,
    pairs_resolved: usize,
    pairs_deferred: usize,
}

impl<L: Level, O: Oracle<L> + ?Sized> Session<'_, '_, L, O> {
    async fn run(
        mut self,
        mut pool: Vec<Item<L>>,
        alternatives: Vec<Item<L>>,
        max_dev: usize,
    ) -> Result<ElicitOutcome<L>, ElicitError> {
        let started = Instant::now();

        for item in pool.iter().chain(&alternatives) {
            self.seed(item)?;
        }
        pool.sort_by(|a, b| self.ranks.get(a).cmp(&self.ranks.get(b)));

        let schedule = split_schedule(max_dev, self.criteria.len());
        tracing::debug!(
            goal = ?self.goal,
            criteria = self.criteria.len(),
            pool = pool.len(),
            alternatives = alternatives.len(),
            steps = schedule.len(),
            "elicitation started"
        );

        let stop_reason = self.drive(&pool, &alternatives, &schedule).await?;
        let incomparable_pairs = self.prefs.incomparable_pairs(Some(alternatives.as_slice()));
        if stop_reason == StopReason::Exhausted {
            tracing::warn!(
                incomparable_pairs,
                questions = self.questions_asked,
                "split schedule exhausted with pairs left incomparable"
            );
        }

        let meta = ElicitMeta {
            goal: self.goal,
            stop_reason,
            max_dev,
            questions_asked: self.questions_asked,
            probes_known: self.probes_known,
            pairs_resolved: self.pairs_resolved,
            pairs_deferred: self.pairs_deferred,
            schedule_steps: self.step,
            incomparable_pairs,
            latency_ms: started.elapsed().as_millis(),
        };
        tracing::debug!(
            stop_reason = ?meta.stop_reason,
            questions = meta.questions_asked,
            "elicitation finished"
        );

        Ok(ElicitOutcome {
            prefs: self.prefs,
            alternatives,
            focus: self.focus,
            meta,
        })
    }

    async fn drive(
        &mut self,
        pool: &[Item<L>],
        alternatives: &[Item<L>],
        schedule: &[Vec<Split>],
    ) -> Result<StopReason, ElicitError> {
        let n = pool.len();

        for (index, splits) in schedule.iter().enumerate() {
            self.step = index + 1;
            tracing::debug!(step = self.step, splits = ?splits, "schedule step");
            if let Some(observer) = self.observer.as_deref_mut() {
                observer.on_schedule(self.step, splits);
            }

            // Ascending (i, j) over the rank-sorted pool, so the greatest
            // pair in rank order is always last.
            let mut to_try: Vec<(usize, usize)> = (0..n)
                .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
                .collect();

            loop {
                if let Goal::FindBest(k) = self.goal {
                    if self.prefs.extreme(k, Some(alternatives), false).len() >= k {
                        return Ok(StopReason::GoalMet);
                    }
                }

                to_try.retain(|&(i, j)| !self.prefs.cmp(&pool[i], &pool[j]).is_known());

                if let Goal::FindBest(k) = self.goal {
                    let excluded: Vec<bool> = pool
                        .iter()
                        .map(|x| {
                            alternatives
                                .iter()
                                .filter(|y| self.prefs.cmp(x, y) == Relation::Less)
                                .count()
                                >= k
                        })
                        .collect();
                    to_try.retain(|&(i, j)| !excluded[i] && !excluded[j]);
                }

                let Some((i, j)) = to_try.pop() else {
                    if self.prefs.incomparable_pairs(Some(pool)) > 0 {
                        break;
                    }
                    return Ok(StopReason::GoalMet);
                };

                let pair = (pool[i].clone(), pool[j].clone());
                let differing: Vec<usize> = (0..self.criteria.len())
                    .filter(|&c| pair.0[c] != pair.1[c])
                    .collect();

                let outcome = match self
                    .search(&pair, splits, Relation::Equal, differing.clone(), differing)
                    .await?
                {
                    Search::Aborted => {
                        tracing::debug!(questions = self.questions_asked, "oracle aborted");
                        return Ok(StopReason::Aborted);
                    }
                    Search::Resolved(rel) => {
                        self.prefs.learn(&pair.0, &pair.1, rel)?;
                        self.pairs_resolved += 1;
                        PairOutcome::Resolved(rel)
                    }
                    Search::Unresolved => {
                        self.pairs_deferred += 1;
                        PairOutcome::Deferred
                    }
                };
                tracing::debug!(a = ?pair.0, b = ?pair.1, outcome = ?outcome, "pair finished");

                if let Goal::FindBest(_) = self.goal {
                    self.focus = Some(match outcome {
                        PairOutcome::Resolved(Relation::Greater) => pair.0.clone(),
                        _ => pair.1.clone(),
                    });
                }
                if let Some(observer) = self.observer.as_deref_mut() {
                    observer.on_pair(&PairEvent {
                        step: self.step,
                        a: pair.0,
                        b: pair.1,
                        outcome,
                        questions_asked: self.questions_asked,
                    });
                }
            }
        }

        Ok(StopReason::Exhausted)
    }

    /// Find the relation of `pair.0` to `pair.1` from probes that deviate
    /// from the best item on `cs1` (left) and `cs2` (right) only.
    fn search<'s>(
        &'s mut self,
        pair: &'s (Item<L>, Item<L>),
        splits: &'s [Split],
        rel: Relation,
        cs1: Vec<usize>,
        cs2: Vec<usize>,
    ) -> BoxFuture<'s, Result<Search, ElicitError>> {
        async move {
            if cs1.is_empty() {
                return Ok(Search::Resolved(rel));
            }
            // At the top level only the newest splits are worth trying.
            let usable = if cs1.len() == self.criteria.len() {
                &splits[..splits.len().min(2)]
            } else {
                splits
            };

            for &(size1, size2) in usable {
                if size1 > cs1.len()
                    || size2 > cs2.len()
                    || (size1 == cs1.len()) != (size2 == cs2.len())
                {
                    continue;
                }
                for c1 in combinations(&cs1, size1) {
                    for c2 in combinations(&cs2, size2) {
                        let x = self.criteria.deviate(&c1, &pair.0);
                        let y = self.criteria.deviate(&c2, &pair.1);
                        let Some(p) = self.get_pref(x, y).await? else {
                            return Ok(Search::Aborted);
                        };
                        if rel != Relation::Equal && p != Relation::Equal && p != rel {
                            continue;
                        }
                        let next = if rel == Relation::Equal { p } else { rel };
                        let rest1 = cs1.iter().copied().filter(|c| !c1.contains(c)).collect();
                        let rest2 = cs2.iter().copied().filter(|c| !c2.contains(c)).collect();
                        match self.search(pair, splits, next, rest1, rest2).await? {
                            Search::Unresolved => {}
                            done => return Ok(done),
                        }
                    }
                }
            }
            Ok(Search::Unresolved)
        }
        .boxed()
    }

    /// Relation of `x` to `y`: from the known order when possible,
    /// otherwise from the oracle. `None` when the oracle aborts.
    async fn get_pref(&mut self, x: Item<L>, y: Item<L>) -> Result<Option<Relation>, ElicitError> {
        self.seed(&x)?;
        self.seed(&y)?;

        let known = self.prefs.cmp(&x, &y);
        if known.is_known() {
            self.probes_known += 1;
            return Ok(Some(known));
        }

        let Ok(answer) = self.oracle.ask(&x, &y).await else {
            return Ok(None);
        };
        let question_index = self.questions_asked;
        self.questions_asked += 1;
        tracing::trace!(question = question_index, a = ?x, b = ?y, answer = %answer, "oracle answered");

        if !answer.is_known() {
            return Err(ElicitError::InvalidAnswer {
                a: format!("{x:?}"),
                b: format!("{y:?}"),
            });
        }

        let learned = self.prefs.learn(&x, &y, answer);
        if let Some(sink) = self.trace {
            sink.record(QuestionTrace {
                timestamp_ms: epoch_ms(),
                question_index,
                step: self.step,
                a: x.iter().map(|level| format!("{level:?}")).collect(),
                b: y.iter().map(|level| format!("{level:?}")).collect(),
                a_ranks: self.ranks.get(&x).cloned().unwrap_or_default(),
                b_ranks: self.ranks.get(&y).cloned().unwrap_or_default(),
                answer,
                pinned: learned.as_ref().map(Vec::len).unwrap_or(0),
                error: learned.as_ref().err().map(ToString::to_string),
            })?;
        }
        learned?;
        Ok(Some(answer))
    }

    /// Track `x` and learn every relation dominance implies against the
    /// items already tracked.
    fn seed(&mut self, x: &Item<L>) -> Result<(), ElicitError> {
        if self.prefs.contains(x) {
            return Ok(());
        }
        let ranks = self.criteria.rank_vector(x)?;
        let implied: Vec<(Item<L>, Relation)> = self
            .prefs
            .elements()
            .iter()
            .filter_map(|y| {
                let rel = dominance(&ranks, self.ranks.get(y)?)?;
                Some((y.clone(), rel))
            })
            .collect();

        self.prefs.add(x.clone());
        self.ranks.insert(x.clone(), ranks);
        for (y, rel) in implied {
            self.prefs.learn(x, &y, rel)?;
        }
        Ok(())
    }
}
