use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::domain::{IterationOutcome, SessionReport, TestSink};
use super::driver::ConcolicDriver;
use crate::features::smt::ConstraintSolver;

/// Drive `driver` until `budget` elapses (or the iteration cap is hit)
///
/// Every iteration reports `(call_text, is_new)` to `sink`. Iterations
/// that attempt no call reseed the worklist, unless the driver is set to
/// stop once the worklist runs dry.
pub fn run_session<S, K>(
    driver: &mut ConcolicDriver<'_, S>,
    mut sink: K,
    budget: Duration,
) -> SessionReport
where
    S: ConstraintSolver,
    K: TestSink,
{
    let start = Instant::now();
    let analysis = driver.analysis();
    let mut report = SessionReport::new(
        analysis.signature.name.clone(),
        analysis.branch_outcome_count(),
    );

    while start.elapsed() < budget {
        if driver
            .max_iterations()
            .is_some_and(|max| report.iterations >= max)
        {
            debug!(iterations = report.iterations, "Iteration cap reached");
            break;
        }

        let outcome = driver.next_call();
        report.record(&outcome);
        sink.on_call(outcome.call_text(), outcome.is_new());

        if outcome.is_dead_end() {
            if driver.stop_when_exhausted() {
                if matches!(outcome, IterationOutcome::Exhausted) {
                    break;
                }
                continue;
            }
            driver.reseed();
            report.reseeds += 1;
        }
    }

    let store = driver.store();
    report.solved_branches = store.solved_count();
    report.infeasible = store.infeasible_count();
    report.exhausted = store.is_exhausted();
    report.elapsed_ms = start.elapsed().as_millis();

    info!(
        function = %report.function,
        added = report.added,
        skipped = report.skipped,
        solved = report.solved_branches,
        total = report.total_branch_outcomes,
        "Session finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::features::analysis::ProgramAnalyzer;
    use crate::features::driver::RecordingSink;

    const SUBJECT: &str = "\
def classify(int_n):
    if int_n > 50:
        return 2
    elif int_n > 20:
        return 1
    return 0
";

    #[test]
    fn test_stops_when_exhausted() {
        let analysis = ProgramAnalyzer::new().unwrap().analyze(SUBJECT).unwrap();
        let config = SessionConfig {
            seed: Some(3),
            stop_when_exhausted: true,
            ..SessionConfig::default()
        };
        let mut driver = ConcolicDriver::new(&analysis, "subject", &config);
        let mut sink = RecordingSink::new();

        let report = run_session(&mut driver, &mut sink, Duration::from_secs(30));

        assert!(report.exhausted);
        assert_eq!(report.solved_branches, 4);
        assert_eq!(report.total_branch_outcomes, 4);
        assert_eq!(report.reseeds, 0);
        // Seed plus one call per flipped outcome
        assert_eq!(report.added, 3);
        assert_eq!(sink.new_calls().count(), 3);
        // Final iteration is the empty-worklist marker
        assert_eq!(sink.calls.last(), Some(&(String::new(), false)));
    }

    #[test]
    fn test_iteration_cap_and_reseeding() {
        let analysis = ProgramAnalyzer::new().unwrap().analyze(SUBJECT).unwrap();
        let config = SessionConfig {
            seed: Some(3),
            max_iterations: Some(12),
            ..SessionConfig::default()
        };
        let mut driver = ConcolicDriver::new(&analysis, "subject", &config);
        let mut sink = RecordingSink::new();

        let report = run_session(&mut driver, &mut sink, Duration::from_secs(30));

        assert_eq!(report.iterations, 12);
        assert_eq!(sink.calls.len(), 12);
        assert_eq!(report.solved_branches, 4);
        // Three covering calls, then empty worklist and reseeded call alternate
        assert_eq!(report.added, 3);
        assert_eq!(report.reseeds, 5);
        assert_eq!(report.skipped, 4);
    }

    #[test]
    fn test_zero_budget_runs_nothing() {
        let analysis = ProgramAnalyzer::new().unwrap().analyze(SUBJECT).unwrap();
        let mut driver = ConcolicDriver::new(&analysis, "subject", &SessionConfig::default());
        let report = run_session(&mut driver, RecordingSink::new(), Duration::ZERO);
        assert_eq!(report.iterations, 0);
        assert_eq!(report.solved_branches, 0);
    }
}
