//! Question trace capture for elicitation sessions.
//!
//! Each line is one answered question. Answers come from a person and cannot
//! be asked again cheaply, so the writer pushes every line to disk as soon as
//! it arrives: a session killed mid-way keeps everything answered so far.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, LineWriter, Write};
use std::path::Path;
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::relation::Relation;

/// One oracle question and its answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionTrace {
    pub timestamp_ms: i64,
    /// 0-based index among oracle questions of the session.
    pub question_index: usize,
    /// 1-based schedule step during which the question was asked.
    pub step: usize,
    /// Items as `Debug` renderings of their levels.
    pub a: Vec<String>,
    pub b: Vec<String>,
    pub a_ranks: Vec<usize>,
    pub b_ranks: Vec<usize>,
    /// Relation of `a` to `b` as answered.
    pub answer: Relation,
    /// Canonical pairs newly pinned by the answer (0 if it contradicted).
    pub pinned: usize,
    pub error: Option<String>,
}

impl QuestionTrace {
    /// Load a trace written by [`JsonlTraceSink`]. Blank lines are skipped.
    pub fn read_jsonl(path: impl AsRef<Path>) -> Result<Vec<Self>, TraceError> {
        let reader = BufReader::new(File::open(path)?);
        let mut questions = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            questions.push(serde_json::from_str(&line)?);
        }
        Ok(questions)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("trace channel closed")]
    Closed,
    #[error("trace writer thread panicked")]
    WriterPanicked,
}

pub trait TraceSink: Send + Sync {
    fn record(&self, event: QuestionTrace) -> Result<(), TraceError>;
}

/// Sends questions to a writer thread that appends one JSON object per line.
#[derive(Clone)]
pub struct JsonlTraceSink {
    sender: mpsc::Sender<QuestionTrace>,
}

/// Owns the writer thread. Drop every sink clone, then [`join`](Self::join).
pub struct TraceWorker {
    handle: Option<JoinHandle<Result<usize, TraceError>>>,
}

impl TraceWorker {
    /// Wait for the writer to drain. Returns the number of lines written.
    pub fn join(mut self) -> Result<usize, TraceError> {
        let Some(handle) = self.handle.take() else {
            return Ok(0);
        };
        handle.join().map_err(|_| TraceError::WriterPanicked)?
    }
}

impl JsonlTraceSink {
    pub fn new(path: impl AsRef<Path>) -> Result<(Self, TraceWorker), TraceError> {
        let file = File::create(path)?;
        let (sender, receiver) = mpsc::channel::<QuestionTrace>();
        let handle = std::thread::spawn(move || write_questions(LineWriter::new(file), receiver));
        Ok((
            Self { sender },
            TraceWorker {
                handle: Some(handle),
            },
        ))
    }
}

impl TraceSink for JsonlTraceSink {
    fn record(&self, event: QuestionTrace) -> Result<(), TraceError> {
        self.sender.send(event).map_err(|_| TraceError::Closed)
    }
}

fn write_questions<W: Write>(
    mut out: W,
    receiver: mpsc::Receiver<QuestionTrace>,
) -> Result<usize, TraceError> {
    let mut written = 0;
    for question in receiver {
        serde_json::to_writer(&mut out, &question)?;
        // LineWriter flushes on the newline.
        out.write_all(b"\n")?;
        written += 1;
    }
    out.flush()?;
    Ok(written)
}

pub fn epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
