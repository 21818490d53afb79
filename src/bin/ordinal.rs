#![forbid(unsafe_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tokio::io::BufReader;

use ordinal_harness::elicit::evaluation::{
    evaluation_cases, generate_scenario, run_benchmark_suite, run_evaluation_case,
};
use ordinal_harness::{
    build_report, elicit, elicit_with_trace, render_report_markdown, results_text, Abort,
    ElicitOutcome, FnOracle, Goal, JsonlTraceSink, PromptOracle, Relation, Scenario,
    ScheduleCallback, SessionObserver, Split, TraceSink,
};

#[derive(Parser)]
#[command(name = "ordinal", version, about = "Verbal decision analysis from pairwise questions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactively elicit preferences for a scenario file
    Run {
        /// Path to a JSON scenario
        scenario: PathBuf,
        /// Write the learned order over the alternatives as Graphviz DOT
        #[arg(long)]
        dot: Option<PathBuf>,
        /// Write a markdown session report
        #[arg(long)]
        report: Option<PathBuf>,
        /// Write one JSON line per question asked
        #[arg(long)]
        trace: Option<PathBuf>,
    },
    /// Run the offline evaluation suite with simulated decision makers
    Eval {
        /// Only run cases whose name starts with this prefix
        #[arg(long)]
        case: Option<String>,
        #[arg(long)]
        out: PathBuf,
        /// Evaluate one random scenario with these level counts (e.g. 3,3,2)
        #[arg(long, value_delimiter = ',')]
        random_shape: Option<Vec<usize>>,
        /// Number of alternatives in the random scenario
        #[arg(long, default_value_t = 6)]
        random_alts: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Show what dominance alone settles in a scenario's item space
    Space {
        scenario: PathBuf,
        #[arg(long)]
        dot: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            scenario,
            dot,
            report,
            trace,
        } => {
            let scenario = Scenario::load(&scenario)?;
            let mut oracle = PromptOracle::new(
                &scenario,
                BufReader::new(tokio::io::stdin()),
                tokio::io::stdout(),
            );
            let mut callback = ScheduleCallback(|_step: usize, splits: &[Split]| {
                if splits.len() > 1 {
                    println!("Allowed pairs now: {:?}", splits[0]);
                }
            });
            let observer: &mut dyn SessionObserver<String> = &mut callback;

            let (trace_sink, trace_worker) = if let Some(path) = trace {
                let (sink, worker) = JsonlTraceSink::new(path)?;
                (Some(sink), Some(worker))
            } else {
                (None, None)
            };
            let trace_ref = trace_sink.as_ref().map(|sink| sink as &dyn TraceSink);

            let outcome =
                elicit_with_trace(scenario.request(), &mut oracle, Some(observer), trace_ref)
                    .await?;

            drop(trace_sink);
            if let Some(worker) = trace_worker {
                let written = worker.join()?;
                if written != outcome.meta.questions_asked {
                    tracing::warn!(
                        written,
                        asked = outcome.meta.questions_asked,
                        "trace is missing questions"
                    );
                }
            }

            println!("{}", results_text(&scenario, &outcome));
            if let Some(path) = dot {
                write_dot(&path, &scenario, &outcome)?;
            }
            if let Some(path) = report {
                let report = build_report(&scenario, &outcome);
                std::fs::write(path, render_report_markdown(&report))?;
            }
        }
        Commands::Eval {
            case,
            out,
            random_shape,
            random_alts,
            seed,
        } => {
            let results = match random_shape {
                Some(shape) => {
                    let scenario =
                        generate_scenario(format!("random_{seed}"), &shape, random_alts, seed);
                    evaluation_cases(&[scenario])
                        .iter()
                        .filter(|c| case.as_deref().map_or(true, |f| c.name.starts_with(f)))
                        .map(run_evaluation_case)
                        .collect::<Result<Vec<_>, _>>()?
                }
                None => run_benchmark_suite(case.as_deref())?,
            };
            let mut file = File::create(out)?;
            for result in &results {
                let line = serde_json::to_string(result)?;
                writeln!(file, "{line}")?;
            }
            let wrong: usize = results.iter().map(|r| r.pairs_wrong).sum();
            eprintln!("[eval] {} cases, {wrong} wrong pairs", results.len());
        }
        Commands::Space { scenario, dot } => {
            let mut scenario = Scenario::load(&scenario)?;
            scenario.goal = Goal::RankSpace;
            scenario.alternatives = None;
            scenario.alternative_names = None;

            // Seeding learns every dominance relation before the first question.
            let mut oracle = FnOracle::new(|_: &[String], _: &[String]| -> Result<Relation, Abort> {
                Err(Abort)
            });
            let outcome = elicit(scenario.request(), &mut oracle).await?;

            println!("Items: {}", outcome.alternatives.len());
            println!(
                "Pairs left incomparable by dominance: {}",
                outcome.meta.incomparable_pairs
            );
            println!("{}", results_text(&scenario, &outcome));
            if let Some(path) = dot {
                write_dot(&path, &scenario, &outcome)?;
            }
        }
    }

    Ok(())
}

fn write_dot(
    path: &Path,
    scenario: &Scenario,
    outcome: &ElicitOutcome<String>,
) -> std::io::Result<()> {
    let dot = outcome.ranking().graph(|item| scenario.name_item(item));
    std::fs::write(path, dot)
}
