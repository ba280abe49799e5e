use tracing::{debug, trace};

use crate::features::analysis::ProgramAnalysis;
use crate::features::constraints::{BranchKey, ConstraintStore};
use crate::features::interpreter::{ExecError, LineEvent, LineHook};
use crate::features::parsing::AssignTarget;
use crate::features::symbolic::{SymExpr, SymbolicExpressionBuilder, SymbolicState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracePhase {
    /// Target function not entered yet
    Idle,
    /// Inside the outermost target frame
    Running,
    /// Outermost target frame returned (or unwound)
    Finished,
}

/// Per-run trace state; borrows the session's constraint store mutably
pub struct TraceContext<'a> {
    analysis: &'a ProgramAnalysis,
    builder: SymbolicExpressionBuilder<'a>,
    store: &'a mut ConstraintStore,
    state: SymbolicState,
    conjunction: Vec<SymExpr>,
    phase: TracePhase,
    outer_depth: Option<usize>,
    newly_solved: Vec<BranchKey>,
}

impl<'a> TraceContext<'a> {
    pub fn new(analysis: &'a ProgramAnalysis, store: &'a mut ConstraintStore) -> Self {
        Self {
            analysis,
            builder: SymbolicExpressionBuilder::new(&analysis.signature)
                .with_globals(&analysis.globals),
            store,
            state: SymbolicState::new(),
            conjunction: Vec::new(),
            phase: TracePhase::Idle,
            outer_depth: None,
            newly_solved: Vec::new(),
        }
    }

    pub fn phase(&self) -> TracePhase {
        self.phase
    }

    /// Path conjunction of the predicates taken so far
    pub fn conjunction(&self) -> &[SymExpr] {
        &self.conjunction
    }

    pub fn state(&self) -> &SymbolicState {
        &self.state
    }

    /// Branch outcomes this run solved for the first time
    pub fn newly_solved(&self) -> &[BranchKey] {
        &self.newly_solved
    }

    fn is_target(&self, function: &str) -> bool {
        function == self.analysis.signature.name
    }

    fn on_assignment(&mut self, event: &LineEvent<'_>) {
        let Some(site) = self.analysis.assignment(event.line) else {
            return;
        };
        match &site.target {
            AssignTarget::Name(name) => {
                let value = self.builder.build(&site.rhs, &self.state, event.locals);
                trace!(line = event.line, target = %name, value = %value, "Bind");
                self.state.bind(name.clone(), value);
            }
            // Element writes are not tracked symbolically
            AssignTarget::Subscript { .. } => {}
        }
    }

    fn on_branch(&mut self, event: &LineEvent<'_>) -> Result<(), ExecError> {
        let analysis = self.analysis;
        let Some(site) = analysis.branch(event.line) else {
            return Ok(());
        };
        let outcome = event.branch_outcome.ok_or_else(|| {
            ExecError::Trace(format!("branch at line {} reported no outcome", event.line))
        })?;

        let predicate = self.builder.build(&site.predicate, &self.state, event.locals);
        let (taken_predicate, untaken_predicate) = if outcome {
            (predicate.clone(), SymExpr::not(predicate))
        } else {
            (SymExpr::not(predicate.clone()), predicate)
        };

        let taken = BranchKey::new(event.line, outcome);
        if self.store.mark_solved(taken) {
            debug!(branch = %taken, predicate = %site.predicate_text, "Solved branch outcome");
            self.newly_solved.push(taken);
        }

        let untaken = taken.flipped();
        let mut path = self.conjunction.clone();
        path.push(untaken_predicate);
        if self.store.record_unsolved(untaken, path) {
            debug!(
                branch = %untaken,
                continuation = if untaken.outcome { site.line } else { site.continuation_line },
                "ADD constraint"
            );
        }

        self.conjunction.push(taken_predicate);
        Ok(())
    }
}

impl<'a> LineHook for TraceContext<'a> {
    fn on_line(&mut self, event: &LineEvent<'_>) -> Result<(), ExecError> {
        if self.phase != TracePhase::Running || !self.is_target(event.function) {
            return Ok(());
        }

        if self.analysis.branches.contains_key(&event.line) {
            self.on_branch(event)
        } else {
            self.on_assignment(event);
            Ok(())
        }
    }

    fn on_enter(&mut self, function: &str, depth: usize) {
        if self.phase == TracePhase::Idle && self.is_target(function) {
            self.phase = TracePhase::Running;
            self.outer_depth = Some(depth);
        }
    }

    fn on_exit(&mut self, function: &str, depth: usize) {
        if self.phase == TracePhase::Running
            && self.is_target(function)
            && self.outer_depth == Some(depth)
        {
            self.phase = TracePhase::Finished;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::analysis::ProgramAnalyzer;
    use crate::features::constraints::ConstraintKey;
    use crate::features::interpreter::{ExecutionLimits, Interpreter, Locals};
    use crate::shared::models::Value;
    use pretty_assertions::assert_eq;

    const SUBJECT: &str = "\
def f(real_a, real_b):
    c = real_a + helper(real_b)
    if c > 10:
        if real_b < 3:
            return 1
    return 0

def helper(x):
    if x > 100:
        return 1
    return 2
";

    fn run(analysis: &ProgramAnalysis, store: &mut ConstraintStore, a: f64, b: f64) -> TracePhase {
        let mut trace = TraceContext::new(analysis, store);
        Interpreter::new(&analysis.module, &mut trace, ExecutionLimits::default())
            .call_function("f", vec![Value::Float(a), Value::Float(b)])
            .unwrap();
        trace.phase()
    }

    #[test]
    fn test_taken_solved_and_untaken_queued() {
        let analysis = ProgramAnalyzer::new().unwrap().analyze(SUBJECT).unwrap();
        let mut store = ConstraintStore::new();
        let phase = run(&analysis, &mut store, 20.0, 5.0);

        assert_eq!(phase, TracePhase::Finished);
        assert_eq!(
            store.solved_keys(),
            vec![BranchKey::new(3, true), BranchKey::new(4, false)]
        );

        // helper's branch at line 9 is never traced
        let pending: Vec<String> = store.unsolved_keys().map(|k| k.to_string()).collect();
        assert_eq!(pending, vec!["3:F", "4:T"]);

        // Untaken inner outcome carries the outer taken predicate
        let inner = store
            .pending(&ConstraintKey::Branch(BranchKey::new(4, true)))
            .unwrap();
        let rendered: Vec<String> = inner.iter().map(|e| e.to_string()).collect();
        assert_eq!(rendered, vec!["(real_a# + 15) > 10", "real_b# < 3"]);

        let outer = store
            .pending(&ConstraintKey::Branch(BranchKey::new(3, false)))
            .unwrap();
        assert_eq!(outer[0].to_string(), "Not((real_a# + 15) > 10)");
    }

    #[test]
    fn test_rerun_moves_solved_out_of_worklist() {
        let analysis = ProgramAnalyzer::new().unwrap().analyze(SUBJECT).unwrap();
        let mut store = ConstraintStore::new();
        run(&analysis, &mut store, 20.0, 5.0);
        run(&analysis, &mut store, 20.0, 1.0);

        assert!(store.is_solved(&BranchKey::new(4, true)));
        assert!(!store.is_pending(&ConstraintKey::Branch(BranchKey::new(4, true))));
        assert_eq!(store.solved_count(), 3);
    }

    #[test]
    fn test_branch_event_without_outcome_fails() {
        let analysis = ProgramAnalyzer::new().unwrap().analyze(SUBJECT).unwrap();
        let mut store = ConstraintStore::new();
        let mut trace = TraceContext::new(&analysis, &mut store);
        trace.on_enter("f", 1);

        let locals = Locals::default();
        let event = LineEvent {
            function: "f",
            line: 3,
            locals: &locals,
            branch_outcome: None,
            depth: 1,
        };
        assert!(matches!(trace.on_line(&event), Err(ExecError::Trace(_))));
    }
}
