//! SMT domain models

use std::collections::BTreeMap;
use thiserror::Error;

use crate::features::naming::SolverVar;
use crate::features::symbolic::SymExpr;
use crate::shared::models::Value;

/// Value the solver picked for one variable
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelValue {
    Int(i64),
    Real(f64),
}

impl ModelValue {
    pub fn to_value(self) -> Value {
        match self {
            ModelValue::Int(i) => Value::Int(i),
            ModelValue::Real(f) => Value::Float(f),
        }
    }
}

/// Variable assignment model (only variables the solver decided)
pub type SolverModel = BTreeMap<SolverVar, ModelValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum SolverOutcome {
    /// Satisfiable (with the decided variables)
    Sat(SolverModel),

    /// Unsatisfiable (contradiction)
    Unsat,

    /// Unknown (timeout, incomplete theory)
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SmtError {
    /// Literal with no rational counterpart (NaN, infinity)
    #[error("Cannot encode non-finite literal {0}")]
    NonFinite(f64),

    #[error("Cannot encode {0}")]
    Unsupported(String),
}

/// Solver capability trait
pub trait ConstraintSolver {
    /// Name of this solver
    fn name(&self) -> &'static str;

    /// Check the conjunction of `constraints`
    fn solve(&mut self, constraints: &[SymExpr]) -> Result<SolverOutcome, SmtError>;
}
