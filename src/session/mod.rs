//! Playground session state, independent of any UI.

use std::time::{Duration, Instant};

use crate::catalog::Example;
use crate::execution::ExecutionResult;

/// How long the `copied` acknowledgement stays visible.
pub const COPY_ACK_TTL: Duration = Duration::from_secs(2);

/// Lifecycle of the most recent execution request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Idle,
    Running,
    Succeeded { sql: String },
    Failed { message: String },
}

/// Program source, the last outcome, and the transient copy ack.
///
/// Outcomes are replaced whole; there is never a partial or mixed state.
#[derive(Debug)]
pub struct Session {
    source: String,
    outcome: Outcome,
    copied_at: Option<Instant>,
}

impl Session {
    pub fn new(source: impl Into<String>) -> Self {
        Session {
            source: source.into(),
            outcome: Outcome::Idle,
            copied_at: None,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Replace the source; any edit clears the prior result and ack.
    pub fn edit(&mut self, source: impl Into<String>) {
        self.source = source.into();
        self.outcome = Outcome::Idle;
        self.copied_at = None;
    }

    /// Load an example: its code becomes the source, the outcome resets.
    pub fn load(&mut self, example: &Example) {
        self.edit(example.code);
    }

    /// Mark the run visible before the synchronous execute call.
    pub fn begin_run(&mut self) {
        self.outcome = Outcome::Running;
        self.copied_at = None;
    }

    /// Record the result, replacing the whole prior outcome.
    pub fn complete(&mut self, result: ExecutionResult) {
        self.outcome = match result {
            ExecutionResult::Success { sql } => Outcome::Succeeded { sql },
            ExecutionResult::Failure { message } => Outcome::Failed { message },
        };
    }

    /// Record a finished clipboard write. Meaningless without a success,
    /// so anything else ignores it.
    pub fn mark_copied(&mut self, now: Instant) {
        if matches!(self.outcome, Outcome::Succeeded { .. }) {
            self.copied_at = Some(now);
        }
    }

    /// True while the copy acknowledgement is fresh; it expires on its
    /// own after [`COPY_ACK_TTL`] with no user input.
    pub fn copy_acknowledged(&self, now: Instant) -> bool {
        match self.copied_at {
            Some(at) => now.duration_since(at) < COPY_ACK_TTL,
            None => false,
        }
    }

    /// SQL available for copying, when the last run succeeded.
    pub fn sql(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Succeeded { sql } => Some(sql),
            _ => None,
        }
    }
}
