//! Offline evaluation harness for the elicitation engine.
//!
//! Runs scenarios through the real session loop, replacing the human with
//! a deterministic additive-utility oracle, and checks what the engine
//! concluded against the utility ground truth.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::relation::Relation;

use super::oracle::{Abort, Oracle};
use super::session::elicit_blocking;
use super::types::{ElicitError, ElicitRequest, Goal, StopReason};

// =============================================================================
// Scenario definitions
// =============================================================================

/// Criteria with integer levels `0..shape[i]` and a hidden utility per level.
#[derive(Debug, Clone)]
pub struct BenchmarkScenario {
    pub name: String,
    /// Utility of each level, strictly increasing within a criterion.
    pub utilities: Vec<Vec<i64>>,
    pub alternatives: Vec<Vec<usize>>,
}

impl BenchmarkScenario {
    pub fn criteria(&self) -> Vec<Vec<usize>> {
        self.utilities.iter().map(|u| (0..u.len()).collect()).collect()
    }

    pub fn oracle(&self) -> AdditiveOracle {
        AdditiveOracle {
            utilities: self.utilities.clone(),
        }
    }
}

/// Prefers the item with the larger summed level utility.
#[derive(Debug, Clone)]
pub struct AdditiveOracle {
    pub utilities: Vec<Vec<i64>>,
}

impl AdditiveOracle {
    pub fn utility(&self, item: &[usize]) -> i64 {
        item.iter()
            .zip(&self.utilities)
            .map(|(&level, u)| u.get(level).copied().unwrap_or(0))
            .sum()
    }

    pub fn relation(&self, a: &[usize], b: &[usize]) -> Relation {
        Relation::compare(&self.utility(a), &self.utility(b))
    }
}

#[async_trait::async_trait]
impl Oracle<usize> for AdditiveOracle {
    async fn ask(&mut self, a: &[usize], b: &[usize]) -> Result<Relation, Abort> {
        Ok(self.relation(a, b))
    }
}

#[derive(Debug, Clone)]
pub struct EvaluationCase {
    pub name: String,
    pub scenario: BenchmarkScenario,
    pub goal: Goal,
    pub max_dev: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct EvaluationResult {
    pub case_name: String,
    pub scenario: String,
    pub goal: Goal,
    pub max_dev: usize,
    pub questions_asked: usize,
    pub probes_known: usize,
    pub stop_reason: StopReason,
    /// Alternative pairs left incomparable.
    pub incomparable_pairs: usize,
    /// Alternative pairs whose learned relation disagrees with the utilities.
    pub pairs_wrong: usize,
    /// Whether the learned best set equals the true one.
    pub best_correct: bool,
    pub latency_ms: u128,
}

// =============================================================================
// Public API
// =============================================================================

/// Fixed scenarios with recorded question counts.
pub fn benchmark_scenarios() -> Vec<BenchmarkScenario> {
    let scenario = |name: &str, utilities: Vec<Vec<i64>>, alternatives: Vec<Vec<usize>>| {
        BenchmarkScenario {
            name: name.to_string(),
            utilities,
            alternatives,
        }
    };

    vec![
        scenario(
            "cube_3x3x3",
            vec![vec![0, 4, 8], vec![0, 3, 4], vec![0, 2, 7]],
            vec![
                vec![2, 1, 0],
                vec![2, 2, 1],
                vec![2, 2, 0],
                vec![0, 1, 2],
                vec![2, 1, 2],
                vec![1, 1, 2],
            ],
        ),
        scenario(
            "mixed_4x3x2",
            vec![vec![0, 2, 6, 11], vec![0, 2, 7], vec![0, 5]],
            vec![
                vec![1, 1, 0],
                vec![0, 0, 1],
                vec![1, 2, 0],
                vec![1, 0, 1],
                vec![3, 0, 0],
                vec![2, 1, 1],
            ],
        ),
        scenario(
            "binary_2x2x2x2",
            vec![vec![0, 3], vec![0, 3], vec![0, 2], vec![0, 5]],
            vec![
                vec![0, 1, 0, 0],
                vec![0, 0, 1, 0],
                vec![1, 1, 0, 1],
                vec![1, 0, 0, 0],
                vec![0, 1, 0, 1],
                vec![1, 0, 0, 1],
            ],
        ),
        scenario(
            "hypercube_3x3x3x3",
            vec![vec![0, 5, 9], vec![0, 5, 7], vec![0, 4, 6], vec![0, 4, 9]],
            vec![
                vec![2, 0, 0, 2],
                vec![0, 0, 2, 1],
                vec![1, 0, 1, 2],
                vec![1, 0, 2, 2],
                vec![2, 2, 0, 0],
                vec![1, 1, 2, 2],
            ],
        ),
        scenario(
            "pair_5x4",
            vec![vec![0, 1, 3, 4, 9], vec![0, 3, 6, 11]],
            vec![
                vec![0, 1],
                vec![4, 1],
                vec![4, 3],
                vec![2, 2],
                vec![2, 1],
                vec![4, 0],
            ],
        ),
        scenario(
            "mixed_3x2x3x2",
            vec![vec![0, 4, 8], vec![0, 5], vec![0, 2, 5], vec![0, 2]],
            vec![
                vec![0, 0, 2, 0],
                vec![1, 0, 2, 0],
                vec![2, 0, 2, 0],
                vec![2, 1, 2, 1],
                vec![1, 0, 0, 1],
                vec![2, 0, 1, 1],
            ],
        ),
    ]
}

/// Random scenario: strictly increasing utilities (steps of 1..=5) and
/// `n_alternatives` distinct items drawn from the space.
pub fn generate_scenario(
    name: impl Into<String>,
    shape: &[usize],
    n_alternatives: usize,
    seed: u64,
) -> BenchmarkScenario {
    let mut rng = StdRng::seed_from_u64(seed);
    let utilities: Vec<Vec<i64>> = shape
        .iter()
        .map(|&levels| {
            let mut u = Vec::with_capacity(levels);
            let mut total = 0i64;
            for level in 0..levels {
                if level > 0 {
                    total += rng.gen_range(1..=5);
                }
                u.push(total);
            }
            u
        })
        .collect();

    let mut space: Vec<Vec<usize>> = vec![Vec::new()];
    for &levels in shape {
        space = space
            .into_iter()
            .flat_map(|prefix| {
                (0..levels).map(move |level| {
                    let mut item = prefix.clone();
                    item.push(level);
                    item
                })
            })
            .collect();
    }
    space.shuffle(&mut rng);
    space.truncate(n_alternatives.max(1));

    BenchmarkScenario {
        name: name.into(),
        utilities,
        alternatives: space,
    }
}

/// Every goal at the smallest and the largest `max_dev`.
pub fn evaluation_cases(scenarios: &[BenchmarkScenario]) -> Vec<EvaluationCase> {
    let mut cases = Vec::new();
    for scenario in scenarios {
        let n = scenario.utilities.len();
        let mut goals = vec![Goal::FindBest(1)];
        if scenario.alternatives.len() >= 2 {
            goals.push(Goal::FindBest(2));
        }
        goals.extend([Goal::RankAlternatives, Goal::RankSpace]);

        for goal in goals {
            let mut max_devs = vec![2];
            if 2 * n > 2 {
                max_devs.push(2 * n);
            }
            for max_dev in max_devs {
                cases.push(EvaluationCase {
                    name: format!("{}/{}/{max_dev}", scenario.name, goal_label(goal)),
                    scenario: scenario.clone(),
                    goal,
                    max_dev,
                });
            }
        }
    }
    cases
}

/// Run the benchmark cases whose name starts with `filter` (all if `None`).
pub fn run_benchmark_suite(filter: Option<&str>) -> Result<Vec<EvaluationResult>, ElicitError> {
    evaluation_cases(&benchmark_scenarios())
        .iter()
        .filter(|case| filter.map_or(true, |f| case.name.starts_with(f)))
        .map(run_evaluation_case)
        .collect()
}

pub fn run_evaluation_case(case: &EvaluationCase) -> Result<EvaluationResult, ElicitError> {
    let scenario = &case.scenario;
    let mut oracle = scenario.oracle();
    let req = ElicitRequest::new(scenario.criteria(), case.goal)
        .with_alternatives(scenario.alternatives.clone())
        .with_max_dev(case.max_dev);
    let outcome = elicit_blocking(req, &mut oracle)?;

    let alternatives = &outcome.alternatives;
    let mut pairs_wrong = 0;
    for (i, a) in alternatives.iter().enumerate() {
        for b in &alternatives[i + 1..] {
            let learned = outcome.prefs.cmp(a, b);
            if learned.is_known() && learned != oracle.relation(a, b) {
                pairs_wrong += 1;
            }
        }
    }

    let k = case.goal.best_count();
    let true_best: HashSet<Vec<usize>> = alternatives
        .iter()
        .filter(|a| {
            alternatives
                .iter()
                .filter(|b| oracle.relation(a, b) == Relation::Less)
                .count()
                < k
        })
        .cloned()
        .collect();

    tracing::debug!(
        case = %case.name,
        questions = outcome.meta.questions_asked,
        pairs_wrong,
        "evaluation case finished"
    );

    Ok(EvaluationResult {
        case_name: case.name.clone(),
        scenario: scenario.name.clone(),
        goal: case.goal,
        max_dev: case.max_dev,
        questions_asked: outcome.meta.questions_asked,
        probes_known: outcome.meta.probes_known,
        stop_reason: outcome.meta.stop_reason,
        incomparable_pairs: outcome.meta.incomparable_pairs,
        pairs_wrong,
        best_correct: outcome.best() == true_best,
        latency_ms: outcome.meta.latency_ms,
    })
}

pub fn goal_label(goal: Goal) -> String {
    match goal {
        Goal::FindBest(k) => format!("find_best_{k}"),
        Goal::RankAlternatives => "rank_alts".to_string(),
        Goal::RankSpace => "rank_space".to_string(),
    }
}
