//! Elicitation engine.
//!
//! Learns a preference order over items by asking an oracle as few pairwise
//! questions as possible:
//! - Dominance between items is learned up front, without asking.
//! - Real pairs are never shown directly; the engine probes deviation items
//!   that differ from the best item on a few criteria only.
//! - Every answer is folded into a transitively closed preorder, so later
//!   probes are often answered from what is already known.

pub mod evaluation;
pub mod hooks;
pub mod oracle;
pub mod schedule;
pub mod session;
pub mod trace;
pub mod types;

pub use hooks::{PairEvent, PairOutcome, ScheduleCallback, SessionObserver};
pub use oracle::{Abort, FnOracle, Oracle};
pub use schedule::split_schedule;
pub use session::{elicit, elicit_blocking, elicit_with_trace, validate_request};
pub use trace::{JsonlTraceSink, QuestionTrace, TraceError, TraceSink, TraceWorker};
pub use types::*;
