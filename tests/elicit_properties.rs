use std::collections::HashMap;

use ordinal_harness::elicit::evaluation::{benchmark_scenarios, AdditiveOracle, BenchmarkScenario};
use ordinal_harness::{
    elicit, elicit_blocking, elicit_with_trace, Abort, ElicitError, ElicitRequest, FnOracle, Goal,
    Item, Oracle, PairEvent, Relation, SessionObserver, Split, StopReason,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn cube() -> BenchmarkScenario {
    benchmark_scenarios()
        .into_iter()
        .find(|s| s.name == "cube_3x3x3")
        .unwrap()
}

fn request(scenario: &BenchmarkScenario, goal: Goal, max_dev: usize) -> ElicitRequest<usize> {
    ElicitRequest::new(scenario.criteria(), goal)
        .with_alternatives(scenario.alternatives.clone())
        .with_max_dev(max_dev)
}

#[test]
fn single_criterion_needs_no_questions() {
    let mut oracle = FnOracle::new(|_: &[&'static str], _: &[&'static str]| -> Result<Relation, Abort> {
        panic!("nothing to ask")
    });
    let req = ElicitRequest::new(vec![vec!["low", "mid", "high"]], Goal::RankSpace);
    let outcome = elicit_blocking(req, &mut oracle).unwrap();
    assert_eq!(outcome.meta.questions_asked, 0);
    assert_eq!(outcome.meta.stop_reason, StopReason::GoalMet);
    assert_eq!(outcome.alternatives.len(), 3);
    assert_eq!(outcome.meta.incomparable_pairs, 0);
    assert_eq!(
        outcome.prefs.cmp(&vec!["low"], &vec!["high"]),
        Relation::Less
    );
}

#[test]
fn dominant_alternative_is_best_without_questions() {
    let mut oracle = FnOracle::new(|_: &[u8], _: &[u8]| -> Result<Relation, Abort> {
        panic!("nothing to ask")
    });
    // [2, 2, 1] dominates both other alternatives.
    let req = ElicitRequest::new(vec![vec![0u8, 1, 2], vec![0, 1, 2], vec![0, 1]], Goal::FindBest(1))
        .with_alternatives(vec![vec![2, 2, 1], vec![2, 0, 1], vec![0, 2, 0]])
        .with_max_dev(6);
    let outcome = elicit_blocking(req, &mut oracle).unwrap();
    assert_eq!(outcome.meta.questions_asked, 0);
    assert_eq!(outcome.meta.stop_reason, StopReason::GoalMet);
    assert_eq!(outcome.best().into_iter().collect::<Vec<_>>(), vec![vec![2, 2, 1]]);
}

#[test]
fn invalid_requests_never_reach_the_oracle() {
    let mut calls = 0;
    let mut oracle = FnOracle::new(|_: &[usize], _: &[usize]| {
        calls += 1;
        Ok::<_, Abort>(Relation::Equal)
    });
    let scenario = cube();
    for req in [
        request(&scenario, Goal::FindBest(0), 2),
        request(&scenario, Goal::FindBest(7), 2),
        request(&scenario, Goal::RankAlternatives, 1),
        request(&scenario, Goal::RankAlternatives, 7),
        request(&scenario, Goal::RankSpace, 2).with_alternatives(vec![vec![0, 0, 3]]),
    ] {
        let err = elicit_blocking(req, &mut oracle).unwrap_err();
        assert!(
            matches!(err, ElicitError::InvalidRequest(_) | ElicitError::Space(_)),
            "{err}"
        );
    }
    drop(oracle);
    assert_eq!(calls, 0);
}

#[test]
fn recoding_levels_does_not_change_the_session() {
    let scenario = cube();
    let truth = scenario.oracle();
    let mut numeric_asked: Vec<(Item<usize>, Item<usize>)> = Vec::new();
    let mut numeric = FnOracle::new(|a: &[usize], b: &[usize]| {
        numeric_asked.push((a.to_vec(), b.to_vec()));
        Ok::<_, Abort>(truth.relation(a, b))
    });
    let plain = elicit_blocking(request(&scenario, Goal::RankAlternatives, 6), &mut numeric).unwrap();
    drop(numeric);

    // Same levels renamed; the engine only sees their order.
    let names = ["poor", "fair", "good"];
    let encode = |item: &[usize]| -> Item<String> { item.iter().map(|&l| names[l].to_string()).collect() };
    let decode = |item: &[String]| -> Vec<usize> {
        item.iter()
            .map(|l| names.iter().position(|n| *n == l.as_str()).unwrap())
            .collect()
    };
    let mut named_asked: Vec<(Item<usize>, Item<usize>)> = Vec::new();
    let mut named = FnOracle::new(|a: &[String], b: &[String]| {
        let (a, b) = (decode(a), decode(b));
        let answer = truth.relation(&a, &b);
        named_asked.push((a, b));
        Ok::<_, Abort>(answer)
    });
    let criteria = vec![names.iter().map(|n| n.to_string()).collect::<Vec<_>>(); 3];
    let req = ElicitRequest::new(criteria, Goal::RankAlternatives)
        .with_alternatives(scenario.alternatives.iter().map(|a| encode(a.as_slice())).collect())
        .with_max_dev(6);
    let recoded = elicit_blocking(req, &mut named).unwrap();
    drop(named);

    assert!(!numeric_asked.is_empty());
    assert_eq!(numeric_asked, named_asked);
    assert_eq!(plain.meta.questions_asked, recoded.meta.questions_asked);
    assert_eq!(plain.meta.probes_known, recoded.meta.probes_known);
    for a in &scenario.alternatives {
        for b in &scenario.alternatives {
            assert_eq!(
                plain.prefs.cmp(a, b),
                recoded.prefs.cmp(&encode(a.as_slice()), &encode(b.as_slice()))
            );
        }
    }
}

#[test]
fn abort_keeps_what_was_learned() {
    let scenario = cube();
    let truth = scenario.oracle();
    let mut asked = 0;
    let mut oracle = FnOracle::new(|a: &[usize], b: &[usize]| {
        if asked == 3 {
            return Err(Abort);
        }
        asked += 1;
        Ok(truth.relation(a, b))
    });
    let outcome = elicit_blocking(request(&scenario, Goal::RankSpace, 6), &mut oracle).unwrap();
    assert_eq!(outcome.meta.stop_reason, StopReason::Aborted);
    assert_eq!(outcome.meta.questions_asked, 3);

    let elements = outcome.prefs.elements();
    for a in elements {
        for b in elements {
            let learned = outcome.prefs.cmp(a, b);
            if learned.is_known() {
                assert_eq!(learned, truth.relation(a, b), "{a:?} vs {b:?}");
            }
        }
    }
}

#[derive(Default)]
struct Counter {
    schedules: Vec<(usize, Vec<Split>)>,
    pairs: Vec<PairEvent<usize>>,
}

impl SessionObserver<usize> for Counter {
    fn on_schedule(&mut self, step: usize, splits: &[Split]) {
        self.schedules.push((step, splits.to_vec()));
    }

    fn on_pair(&mut self, event: &PairEvent<usize>) {
        self.pairs.push(event.clone());
    }
}

#[tokio::test]
async fn observer_sees_every_step_and_pair() {
    let scenario = cube();
    let mut oracle = scenario.oracle();
    let mut counter = Counter::default();
    let observer: &mut dyn SessionObserver<usize> = &mut counter;
    let outcome = elicit_with_trace(
        request(&scenario, Goal::RankSpace, 6),
        &mut oracle,
        Some(observer),
        None,
    )
    .await
    .unwrap();

    assert_eq!(counter.schedules.len(), outcome.meta.schedule_steps);
    for (i, (step, splits)) in counter.schedules.iter().enumerate() {
        assert_eq!(*step, i + 1);
        assert_eq!(splits.last(), Some(&(1, 1)));
    }
    assert_eq!(
        counter.pairs.len(),
        outcome.meta.pairs_resolved + outcome.meta.pairs_deferred
    );
    let last = counter.pairs.last().unwrap();
    assert_eq!(last.questions_asked, outcome.meta.questions_asked);
}

/// Sleeps before every answer, so the session really suspends.
struct SlowOracle(AdditiveOracle);

#[async_trait::async_trait]
impl Oracle<usize> for SlowOracle {
    async fn ask(&mut self, a: &[usize], b: &[usize]) -> Result<Relation, Abort> {
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        tokio::task::yield_now().await;
        Ok(self.0.relation(a, b))
    }
}

#[tokio::test]
async fn async_oracle_matches_blocking_oracle() {
    let scenario = cube();
    let mut slow = SlowOracle(scenario.oracle());
    let suspended = elicit(request(&scenario, Goal::RankAlternatives, 2), &mut slow)
        .await
        .unwrap();

    let mut fast = scenario.oracle();
    let blocking = elicit_blocking(request(&scenario, Goal::RankAlternatives, 2), &mut fast).unwrap();

    assert_eq!(suspended.meta.questions_asked, blocking.meta.questions_asked);
    assert_eq!(
        suspended.ranking().known_relations().count(),
        blocking.ranking().known_relations().count()
    );
}

#[tokio::test]
async fn sessions_run_on_worker_tasks() {
    let handles: Vec<_> = benchmark_scenarios()
        .into_iter()
        .map(|scenario| {
            tokio::spawn(async move {
                let mut oracle = scenario.oracle();
                let req = request(&scenario, Goal::FindBest(1), 2);
                elicit(req, &mut oracle).await.map(|o| o.meta.stop_reason)
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), StopReason::GoalMet);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    // Any answers at all, as long as they are not "incomparable", yield a
    // consistent order that agrees with every answer given.
    #[test]
    fn arbitrary_answers_stay_consistent(seed in any::<u64>(), rank_space in any::<bool>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut answers: HashMap<(Item<usize>, Item<usize>), Relation> = HashMap::new();
        let mut oracle = FnOracle::new(|a: &[usize], b: &[usize]| {
            let rel = match rng.gen_range(0..3) {
                0 => Relation::Less,
                1 => Relation::Equal,
                _ => Relation::Greater,
            };
            answers.insert((a.to_vec(), b.to_vec()), rel);
            Ok::<_, Abort>(rel)
        });
        let goal = if rank_space { Goal::RankSpace } else { Goal::RankAlternatives };
        let outcome = elicit_blocking(request(&cube(), goal, 6), &mut oracle).unwrap();
        drop(oracle);

        prop_assert_eq!(answers.len(), outcome.meta.questions_asked);
        for ((a, b), rel) in &answers {
            prop_assert_eq!(outcome.prefs.cmp(a, b), *rel);
        }
    }
}
