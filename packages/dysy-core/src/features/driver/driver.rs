use tracing::{debug, info, warn};

use super::domain::IterationOutcome;
use crate::config::SessionConfig;
use crate::features::analysis::ProgramAnalysis;
use crate::features::constraints::ConstraintStore;
use crate::features::interpreter::{ExecutionLimits, Interpreter};
use crate::features::naming::{ArgumentSynthesizer, ConcreteArguments, ParamSpec, Shape};
use crate::features::smt::{ConstraintSolver, SolverOutcome, Z3Bridge};
use crate::features::symbolic::SymExpr;
use crate::features::tracer::TraceContext;
use crate::shared::models::Value;

/// Concolic driver for one target function
///
/// Owns the constraint store and the RNG for the whole session. The
/// worklist starts with one seed entry reproducing a random argument set.
pub struct ConcolicDriver<'a, S: ConstraintSolver = Z3Bridge> {
    analysis: &'a ProgramAnalysis,
    module_name: String,
    solver: S,
    synthesizer: ArgumentSynthesizer,
    store: ConstraintStore,
    limits: ExecutionLimits,
    max_iterations: Option<usize>,
    stop_when_exhausted: bool,
}

impl<'a> ConcolicDriver<'a, Z3Bridge> {
    /// Driver backed by z3 with the configured per-query timeout
    pub fn new(
        analysis: &'a ProgramAnalysis,
        module_name: impl Into<String>,
        config: &SessionConfig,
    ) -> Self {
        let solver = Z3Bridge::with_timeout(config.solver_timeout_ms);
        Self::with_solver(analysis, module_name, config, solver)
    }
}

impl<'a, S: ConstraintSolver> ConcolicDriver<'a, S> {
    pub fn with_solver(
        analysis: &'a ProgramAnalysis,
        module_name: impl Into<String>,
        config: &SessionConfig,
        solver: S,
    ) -> Self {
        let mut driver = Self {
            analysis,
            module_name: module_name.into(),
            solver,
            synthesizer: ArgumentSynthesizer::new(config.seed, config.random_ranges()),
            store: ConstraintStore::new(),
            limits: config.execution_limits(),
            max_iterations: config.max_iterations,
            stop_when_exhausted: config.stop_when_exhausted,
        };
        driver.reseed();
        driver
    }

    pub fn analysis(&self) -> &'a ProgramAnalysis {
        self.analysis
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn store(&self) -> &ConstraintStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ConstraintStore {
        &mut self.store
    }

    pub fn max_iterations(&self) -> Option<usize> {
        self.max_iterations
    }

    pub fn stop_when_exhausted(&self) -> bool {
        self.stop_when_exhausted
    }

    /// Push a fresh seed entry: equality constraints reproducing one
    /// random argument set
    pub fn reseed(&mut self) {
        let params = &self.analysis.signature.params;
        let args = self.synthesizer.random_arguments(params);
        let constraints = seed_constraints(params, &args);
        debug!(
            function = %self.analysis.signature.name,
            constraints = constraints.len(),
            "Reinit symbolic executor"
        );
        self.store.seed(constraints);
    }

    /// Solve the latest worklist entry and run the target on the result
    pub fn next_call(&mut self) -> IterationOutcome {
        let Some((key, constraints)) = self.store.pop_latest() else {
            info!("NO-CONSTRAINT");
            return IterationOutcome::Exhausted;
        };

        debug!(
            key = %key,
            constraints = %render_conjunction(&constraints),
            solver = self.solver.name(),
            "Solving constraints"
        );
        let model = match self.solver.solve(&constraints) {
            Ok(SolverOutcome::Sat(model)) => model,
            Ok(SolverOutcome::Unsat) => {
                info!(key = %key, "SKIP - Unsatisfiable constraints");
                self.store.mark_infeasible(key);
                return IterationOutcome::Unsat { key };
            }
            Ok(SolverOutcome::Unknown) => {
                warn!(key = %key, "SKIP - Solver returned unknown");
                return IterationOutcome::Skipped {
                    key,
                    reason: "solver returned unknown".to_string(),
                };
            }
            Err(e) => {
                warn!(key = %key, error = %e, "SKIP - Constraints not encodable");
                return IterationOutcome::Skipped {
                    key,
                    reason: e.to_string(),
                };
            }
        };

        let analysis = self.analysis;
        let signature = &analysis.signature;
        let args = self.synthesizer.arguments_from_assignments(
            &signature.params,
            model.into_iter().map(|(var, value)| (var, value.to_value())),
        );
        let call = args.render_call(&self.module_name, &signature.name);
        info!(call = %call, "CALLING");

        let snapshot = self.store.clone();
        let solved_before = self.store.solved_count();
        let (result, new_branches) = {
            let mut trace = TraceContext::new(analysis, &mut self.store);
            let result = Interpreter::new(&analysis.module, &mut trace, self.limits)
                .call_function(&signature.name, args.values());
            (result, trace.newly_solved().to_vec())
        };

        match result {
            Err(error) => {
                warn!(call = %call, error = %error, "Run failed, discarding its constraints");
                self.store = snapshot;
                IterationOutcome::Failed { call, error }
            }
            Ok(_) if self.store.solved_count() > solved_before => {
                info!(call = %call, new = new_branches.len(), "ADD");
                IterationOutcome::Covered { call, new_branches }
            }
            Ok(_) => {
                info!(call = %call, "SKIP - Already covered");
                IterationOutcome::AlreadyCovered { call }
            }
        }
    }
}

fn literal(value: &Value) -> SymExpr {
    match value {
        Value::Int(i) => SymExpr::Int(*i),
        Value::Float(f) => SymExpr::Real(*f),
        Value::Bool(b) => SymExpr::Bool(*b),
        other => SymExpr::Free(other.to_string()),
    }
}

/// `x# == v` per scalar, `x#i == v_i` per sequence slot
fn seed_constraints(params: &[ParamSpec], args: &ConcreteArguments) -> Vec<SymExpr> {
    let mut constraints = Vec::new();
    for spec in params {
        let Some(value) = args.get(&spec.name) else {
            continue;
        };
        match (spec.shape, value) {
            (Shape::Sequence(_), Value::List(list)) => {
                for (i, item) in list.to_vec().iter().enumerate() {
                    constraints.push(SymExpr::equals(
                        SymExpr::var(spec.element_var(i)),
                        literal(item),
                    ));
                }
            }
            _ => constraints.push(SymExpr::equals(
                SymExpr::var(spec.scalar_var()),
                literal(value),
            )),
        }
    }
    constraints
}

fn render_conjunction(constraints: &[SymExpr]) -> String {
    constraints
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
