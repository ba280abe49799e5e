//! Constraint Store / Worklist
//!
//! Tracks every branch outcome seen during a session:
//!
//! - `unsolved`: discovered but never driven, with the path conjunction
//!   that reaches it (LIFO over discovery)
//! - `solved`: driven at least once
//! - `infeasible`: proven unreachable by the solver
//!
//! A key lives in at most one of the three; `solved` and `infeasible`
//! only grow.

mod store;

pub use store::{BranchKey, ConstraintKey, ConstraintStore};
