//! Concrete interpreter for the Python subset
//!
//! Runs subject functions on concrete values and reports every executed
//! line to a [`LineHook`]. Branch statements evaluate their predicate once
//! and report the outcome with the event, so observers never re-evaluate
//! subject code.
//!
//! ```text
//! Interpreter ──on_line(LineEvent)──→ LineHook (TraceContext, NoopHook, ...)
//!      │
//!      └── evaluate(Expr, Locals, CallResolver) ──→ builtins / module functions
//! ```

mod builtins;
mod domain;
mod evaluator;
mod interpreter;

pub use builtins::call_builtin;
pub use domain::{ExecError, ExecutionLimits, LineEvent, LineHook, Locals, NoopHook};
pub use evaluator::{evaluate, evaluate_pure, evaluate_pure_in, CallResolver};
pub use interpreter::{module_globals, Interpreter};
