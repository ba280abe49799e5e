//! Z3 SMT Solver Bridge
//!
//! Stateless: every query builds its own `Config`/`Context`/`Solver`, so
//! nothing leaks between the path conjunctions of one session.
//!
//! ## Installation
//!
//! ```bash
//! # Install Z3 library
//! apt-get install libz3-dev  # Linux
//! brew install z3            # macOS
//!
//! # Or build and link z3 from source
//! cargo build --release --features static-link-z3
//! ```

use z3::{Config, Context, SatResult, Solver};

use tracing::debug;

use super::translator::{parse_real_text, Translator};
use crate::features::naming::{NumericDomain, SolverVar};
use crate::features::smt::domain::{
    ConstraintSolver, ModelValue, SmtError, SolverModel, SolverOutcome,
};
use crate::features::symbolic::SymExpr;

pub struct Z3Bridge {
    timeout_ms: u64,
}

impl Z3Bridge {
    /// Create new bridge with default timeout (5000ms)
    pub fn new() -> Self {
        Self::with_timeout(5000)
    }

    /// Create new bridge with custom per-query timeout
    pub fn with_timeout(timeout_ms: u64) -> Self {
        Self { timeout_ms }
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }
}

impl ConstraintSolver for Z3Bridge {
    fn name(&self) -> &'static str {
        "z3"
    }

    fn solve(&mut self, constraints: &[SymExpr]) -> Result<SolverOutcome, SmtError> {
        let mut cfg = Config::new();
        cfg.set_model_generation(true);
        cfg.set_timeout_msec(self.timeout_ms);

        let ctx = Context::new(&cfg);
        let solver = Solver::new(&ctx);
        let translator = Translator::new(&ctx);

        for constraint in constraints {
            solver.assert(&translator.constraint(constraint)?);
        }

        let mut vars: Vec<&SolverVar> = constraints.iter().flat_map(SymExpr::variables).collect();
        vars.sort();
        vars.dedup();

        match solver.check() {
            SatResult::Unsat => Ok(SolverOutcome::Unsat),
            SatResult::Unknown => {
                debug!(constraints = constraints.len(), "Solver returned unknown");
                Ok(SolverOutcome::Unknown)
            }
            SatResult::Sat => {
                let Some(model) = solver.get_model() else {
                    return Ok(SolverOutcome::Unknown);
                };

                let mut decoded = SolverModel::new();
                for var in vars {
                    let name = var.to_string();
                    // Err carries the text of a value with no f64/i64 form
                    // (algebraic numbers, integers past i64)
                    let value = match var.domain {
                        NumericDomain::Integer => {
                            model.eval(&translator.int_var(&name), false).map(|v| {
                                v.as_i64().map(ModelValue::Int).ok_or_else(|| v.to_string())
                            })
                        }
                        NumericDomain::Real => {
                            model.eval(&translator.real_var(&name), false).map(|v| {
                                v.as_real()
                                    .map(|(num, den)| num as f64 / den as f64)
                                    .or_else(|| parse_real_text(&v.to_string()))
                                    .map(ModelValue::Real)
                                    .ok_or_else(|| v.to_string())
                            })
                        }
                    };
                    // Anything not decoded here is filled in randomly later
                    match value {
                        Some(Ok(value)) => {
                            decoded.insert(var.clone(), value);
                        }
                        // An open constant evaluates to itself (printed `|x#|`)
                        Some(Err(text)) if text.trim_matches('|') != name => {
                            debug!(var = %name, value = %text, "Model value not decodable");
                        }
                        _ => {}
                    }
                }
                Ok(SolverOutcome::Sat(decoded))
            }
        }
    }
}
