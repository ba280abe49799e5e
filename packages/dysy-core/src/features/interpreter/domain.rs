//! Interpreter domain models: locals, line events, hooks, errors

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::shared::models::{Line, Value};

/// Local variables of one frame
pub type Locals = FxHashMap<String, Value>;

/// One line event, fired before the statement at `line` executes
///
/// For `if`/`elif`/`while` the predicate has already been evaluated once
/// and its outcome is attached; the statement then proceeds with exactly
/// that outcome.
#[derive(Debug, Clone, Copy)]
pub struct LineEvent<'a> {
    pub function: &'a str,
    pub line: Line,
    pub locals: &'a Locals,
    pub branch_outcome: Option<bool>,
    /// Frame depth, 1 for the outermost call
    pub depth: usize,
}

/// Observer of interpreted execution
pub trait LineHook {
    fn on_line(&mut self, event: &LineEvent<'_>) -> Result<(), ExecError>;

    fn on_enter(&mut self, _function: &str, _depth: usize) {}

    fn on_exit(&mut self, _function: &str, _depth: usize) {}
}

/// Hook that observes nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHook;

impl LineHook for NoopHook {
    fn on_line(&mut self, _event: &LineEvent<'_>) -> Result<(), ExecError> {
        Ok(())
    }
}

/// Per-call resource caps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionLimits {
    /// Statement executions per top-level call
    pub max_steps: usize,
    /// Live frames
    pub max_depth: usize,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            max_steps: 100_000,
            max_depth: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecError {
    #[error("NameError: name '{0}' is not defined")]
    Name(String),

    #[error("TypeError: {0}")]
    Type(String),

    #[error("ValueError: {0}")]
    Value(String),

    #[error("ZeroDivisionError: division by zero")]
    ZeroDivision,

    #[error("IndexError: index {index} out of range for length {len}")]
    Index { index: i64, len: usize },

    #[error("OverflowError: integer result out of range")]
    Overflow,

    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    #[error("{function}() takes {expected} arguments but {got} were given")]
    Arity {
        function: String,
        expected: usize,
        got: usize,
    },

    /// `raise` statement in the subject
    #[error("Raised {0}")]
    Raised(String),

    #[error("'{0}' outside loop")]
    OutsideLoop(&'static str),

    #[error("Step limit of {0} statements exceeded")]
    StepLimit(usize),

    #[error("Call depth limit of {0} frames exceeded")]
    RecursionLimit(usize),

    /// Hook reported an inconsistent event
    #[error("Trace failure: {0}")]
    Trace(String),

    #[error("line {line}: {source}")]
    AtLine {
        line: Line,
        #[source]
        source: Box<ExecError>,
    },
}

impl ExecError {
    /// Attach the line of the innermost failing statement
    pub fn at_line(self, line: Line) -> Self {
        match self {
            ExecError::AtLine { .. } => self,
            other => ExecError::AtLine {
                line,
                source: Box::new(other),
            },
        }
    }

    /// Error without line context
    pub fn root(&self) -> &ExecError {
        match self {
            ExecError::AtLine { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        ExecError::Type(message.into())
    }
}
