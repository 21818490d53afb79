#![forbid(unsafe_code)]

//! # ordinal-harness
//!
//! Verbal decision analysis: learn which multi-criteria options a decision
//! maker prefers while asking as few pairwise questions as possible.
//!
//! Every criterion is an ordered list of verbal levels ("cheap", "moderate",
//! "expensive"). Instead of asking for weights or scores, the engine shows two
//! hypothetical items that differ on only a few criteria and asks which one is
//! better. Answers are folded into a transitively closed preorder
//! ([`PreorderedSet`]), dominance is learned for free, and the session stops as
//! soon as the goal (best `k`, a ranking of the alternatives, or a ranking of
//! the whole item space) is settled.

pub mod elicit;
pub mod interactive;
pub mod preorder;
pub mod relation;
pub mod report;
pub mod scenario;
pub mod space;

pub use elicit::{
    elicit, elicit_blocking, elicit_with_trace, split_schedule, validate_request, Abort,
    ElicitError, ElicitMeta, ElicitOutcome, ElicitRequest, FnOracle, Goal, JsonlTraceSink,
    Oracle, PairEvent, PairOutcome, QuestionTrace, ScheduleCallback, SessionObserver, Split,
    StopReason, TraceError, TraceSink, TraceWorker, DEFAULT_MAX_DEV,
};
pub use interactive::PromptOracle;
pub use preorder::{PreorderError, PreorderedSet};
pub use relation::Relation;
pub use report::{build_report, render_report_markdown, results_text, SessionReport};
pub use scenario::{Scenario, ScenarioError};
pub use space::{dominance, Criteria, Item, Level, SpaceError};
