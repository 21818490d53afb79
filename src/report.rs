//! Report generation for scenario runs.

use serde::Serialize;

use crate::elicit::{ElicitMeta, ElicitOutcome, Goal};
use crate::relation::Relation;
use crate::scenario::Scenario;

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub scenario_hash: String,
    pub summary: ElicitMeta,
    /// Named best alternatives (top `k` for `find_best`, else the maxima).
    pub best: Vec<String>,
    /// Known relations among the alternatives.
    pub relations: Vec<ReportRelation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportRelation {
    pub worse: String,
    pub better: String,
    /// `less` or `equal`.
    pub relation: Relation,
}

pub fn build_report(scenario: &Scenario, outcome: &ElicitOutcome<String>) -> SessionReport {
    let ranking = outcome.ranking();

    let mut best: Vec<String> = outcome.best().iter().map(|item| scenario.name_item(item)).collect();
    best.sort();

    let mut relations: Vec<ReportRelation> = ranking
        .known_relations()
        .map(|(a, b, rel)| {
            let (worse, better, rel) = match rel {
                Relation::Greater => (b, a, Relation::Less),
                _ => (a, b, rel),
            };
            ReportRelation {
                worse: scenario.name_item(worse),
                better: scenario.name_item(better),
                relation: rel,
            }
        })
        .collect();
    relations.sort_by(|x, y| (&x.worse, &x.better).cmp(&(&y.worse, &y.better)));

    SessionReport {
        scenario_hash: scenario.hash(),
        summary: outcome.meta.clone(),
        best,
        relations,
    }
}

/// One-line result: the best alternatives for `find_best`, the learned
/// preferences otherwise.
pub fn results_text(scenario: &Scenario, outcome: &ElicitOutcome<String>) -> String {
    match scenario.goal {
        Goal::FindBest(_) => {
            let mut names: Vec<String> =
                outcome.best().iter().map(|item| scenario.name_item(item)).collect();
            names.sort();
            format!("Best: {}", names.join(", "))
        }
        Goal::RankAlternatives | Goal::RankSpace => format!(
            "Preferences: {}",
            outcome
                .ranking()
                .summary_with(|item| scenario.name_item(item))
        ),
    }
}

pub fn render_report_markdown(report: &SessionReport) -> String {
    let mut out = String::new();
    out.push_str("# Elicitation Report\n\n");
    out.push_str(&format!("- Scenario hash: `{}`\n", report.scenario_hash));
    out.push_str(&format!("- Goal: {:?}\n", report.summary.goal));
    out.push_str(&format!("- Stop reason: {:?}\n", report.summary.stop_reason));
    out.push_str(&format!("- max_dev: {}\n", report.summary.max_dev));
    out.push_str(&format!(
        "- Questions asked / probes known: {}/{}\n",
        report.summary.questions_asked, report.summary.probes_known
    ));
    out.push_str(&format!(
        "- Pairs resolved / deferred: {}/{}\n",
        report.summary.pairs_resolved, report.summary.pairs_deferred
    ));
    out.push_str(&format!(
        "- Incomparable pairs left: {}\n",
        report.summary.incomparable_pairs
    ));
    out.push_str(&format!("- Latency: {} ms\n", report.summary.latency_ms));

    out.push_str("\n## Best\n\n");
    for name in &report.best {
        out.push_str(&format!("- {name}\n"));
    }

    if !report.relations.is_empty() {
        out.push_str("\n## Relations\n\n");
        for r in &report.relations {
            out.push_str(&format!(
                "- {} {} {}\n",
                r.worse,
                r.relation.symbol(),
                r.better
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elicit::{elicit_blocking, Abort, FnOracle};

    fn run(raw: &str) -> (Scenario, ElicitOutcome<String>) {
        let scenario = Scenario::from_json_str(raw).unwrap();
        // Prefer the item with more top levels; ties are equal.
        let mut oracle = FnOracle::new(|a: &[String], b: &[String]| {
            let score = |x: &[String]| x.iter().filter(|l| l.as_str() == "hi").count();
            Ok::<_, Abort>(Relation::compare(&score(a), &score(b)))
        });
        let outcome = elicit_blocking(scenario.request(), &mut oracle).unwrap();
        (scenario, outcome)
    }

    const TRADEOFF: &str = r#"{
        "criteria": {"x": ["lo", "hi"], "y": ["lo", "hi"]},
        "alts": {"Left": {"x": "hi", "y": "lo"}, "Right": {"x": "lo", "y": "hi"}, "Top": {"x": "hi", "y": "hi"}}
    }"#;

    #[test]
    fn results_text_uses_alternative_names() {
        let (scenario, outcome) = run(TRADEOFF);
        assert_eq!(results_text(&scenario, &outcome), "Preferences: Left<Top Left=Right Right<Top");
    }

    #[test]
    fn report_lists_best_and_relations() {
        let (scenario, outcome) = run(TRADEOFF);
        let report = build_report(&scenario, &outcome);
        assert_eq!(report.best, vec!["Top"]);
        assert_eq!(report.relations.len(), 3);
        assert_eq!(report.summary.questions_asked, outcome.meta.questions_asked);

        let md = render_report_markdown(&report);
        assert!(md.starts_with("# Elicitation Report\n"));
        assert!(md.contains("- Top\n"));
        assert!(md.contains("- Left < Top\n"));
    }

    #[test]
    fn find_best_prints_best_names() {
        let raw = TRADEOFF.replacen('{', r#"{"find_best": 1,"#, 1);
        let (scenario, outcome) = run(&raw);
        assert_eq!(results_text(&scenario, &outcome), "Best: Top");
        assert_eq!(outcome.meta.questions_asked, 0);
    }
}
