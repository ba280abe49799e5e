//! SMT (Satisfiability Modulo Theories) Bridge
//!
//! Decides path conjunctions and turns models into per-variable values.
//!
//! ## Architecture
//!
//! ```text
//! SMT
//! ├── domain/               # SolverOutcome, ModelValue, ConstraintSolver
//! └── infrastructure/       # Implementation
//!     ├── translator        # SymExpr → z3 AST
//!     └── z3_bridge         # Fresh context per query
//! ```

pub mod domain;
pub mod infrastructure;

pub use domain::{ConstraintSolver, ModelValue, SmtError, SolverModel, SolverOutcome};
pub use infrastructure::Z3Bridge;
