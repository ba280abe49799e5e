//! Concolic Driver
//!
//! Pops the latest worklist entry, solves it, runs the target on the
//! decoded arguments under a fresh [`TraceContext`], and classifies the
//! run. [`run_session`] repeats that under a time budget and feeds every
//! call to a [`TestSink`].
//!
//! ```text
//! ConstraintStore ─pop→ ConstraintSolver ─model→ ArgumentSynthesizer
//!       ↑                                              │
//!       └──── TraceContext ←── Interpreter ←── ConcreteArguments
//! ```
//!
//! [`TraceContext`]: crate::features::tracer::TraceContext

mod domain;
mod driver;
mod session;

pub use domain::{IterationOutcome, RecordingSink, SessionReport, TestSink};
pub use driver::ConcolicDriver;
pub use session::run_session;
