//! Execution Tracer
//!
//! [`TraceContext`] is the interpreter's [`LineHook`] for one concolic run.
//! It watches only frames of the target function and, line by line:
//!
//! - binds assignment targets to their symbolic right-hand side
//! - marks the taken branch outcome solved and pushes the untaken outcome
//!   (current path conjunction + negated predicate) onto the worklist
//!
//! [`LineHook`]: crate::features::interpreter::LineHook

mod context;

pub use context::{TraceContext, TracePhase};
