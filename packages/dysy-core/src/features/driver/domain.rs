//! Driver domain models: iteration outcomes, sinks, session report

use serde::Serialize;

use crate::features::constraints::{BranchKey, ConstraintKey};
use crate::features::interpreter::ExecError;

/// Result of one driver iteration
#[derive(Debug, Clone, PartialEq)]
pub enum IterationOutcome {
    /// Worklist empty, nothing attempted
    Exhausted,

    /// Popped conjunction has no solution; the key is dropped for good
    Unsat { key: ConstraintKey },

    /// Solver gave no answer (timeout, translation failure); entry dropped
    Skipped { key: ConstraintKey, reason: String },

    /// Call solved at least one new branch outcome
    Covered {
        call: String,
        new_branches: Vec<BranchKey>,
    },

    /// Call ran but covered nothing new
    AlreadyCovered { call: String },

    /// Call raised or hit a limit; store rolled back
    Failed { call: String, error: ExecError },
}

impl IterationOutcome {
    /// Call text for the sink; empty when no call was attempted
    pub fn call_text(&self) -> &str {
        match self {
            IterationOutcome::Covered { call, .. }
            | IterationOutcome::AlreadyCovered { call }
            | IterationOutcome::Failed { call, .. } => call,
            IterationOutcome::Exhausted
            | IterationOutcome::Unsat { .. }
            | IterationOutcome::Skipped { .. } => "",
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, IterationOutcome::Covered { .. })
    }

    /// No call was attempted; the session reseeds after these
    pub fn is_dead_end(&self) -> bool {
        matches!(
            self,
            IterationOutcome::Exhausted
                | IterationOutcome::Unsat { .. }
                | IterationOutcome::Skipped { .. }
        )
    }
}

/// Consumer of generated calls
///
/// `call_text` is empty iff no call was attempted in that iteration.
pub trait TestSink {
    fn on_call(&mut self, call_text: &str, is_new: bool);
}

impl<T: TestSink + ?Sized> TestSink for &mut T {
    fn on_call(&mut self, call_text: &str, is_new: bool) {
        (**self).on_call(call_text, is_new)
    }
}

/// Sink that keeps every call in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub calls: Vec<(String, bool)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls that covered something new, in order
    pub fn new_calls(&self) -> impl Iterator<Item = &str> {
        self.calls
            .iter()
            .filter(|(_, is_new)| *is_new)
            .map(|(call, _)| call.as_str())
    }
}

impl TestSink for RecordingSink {
    fn on_call(&mut self, call_text: &str, is_new: bool) {
        self.calls.push((call_text.to_string(), is_new));
    }
}

/// Summary of one session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionReport {
    pub function: String,
    pub iterations: usize,
    /// Calls that covered a new branch outcome
    pub added: usize,
    /// Calls that covered nothing new
    pub skipped: usize,
    pub failed: usize,
    pub unsat: usize,
    /// Pops the solver could not decide
    pub solver_skipped: usize,
    pub reseeds: usize,
    pub solved_branches: usize,
    pub total_branch_outcomes: usize,
    pub infeasible: usize,
    pub elapsed_ms: u128,
    /// Worklist was empty when the session ended
    pub exhausted: bool,
}

impl SessionReport {
    pub fn new(function: impl Into<String>, total_branch_outcomes: usize) -> Self {
        Self {
            function: function.into(),
            total_branch_outcomes,
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: &IterationOutcome) {
        self.iterations += 1;
        match outcome {
            IterationOutcome::Exhausted => {}
            IterationOutcome::Unsat { .. } => self.unsat += 1,
            IterationOutcome::Skipped { .. } => self.solver_skipped += 1,
            IterationOutcome::Covered { .. } => self.added += 1,
            IterationOutcome::AlreadyCovered { .. } => self.skipped += 1,
            IterationOutcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Share of branch outcomes solved, 1.0 for branch-free functions
    pub fn coverage(&self) -> f64 {
        if self.total_branch_outcomes == 0 {
            1.0
        } else {
            self.solved_branches as f64 / self.total_branch_outcomes as f64
        }
    }
}
