//! End-to-end concolic sessions on the fixture subjects

mod common;

use common::*;
use dysy_core::features::constraints::{BranchKey, ConstraintKey};
use dysy_core::features::driver::{ConcolicDriver, IterationOutcome};
use dysy_core::SessionConfig;
use pretty_assertions::assert_eq;

#[test]
fn test_non_linear_covers_every_outcome() {
    let (report, sink) = run_fixture("non_linear", &exhaustive_config(11));

    assert_eq!(report.total_branch_outcomes, 6);
    assert_eq!(report.solved_branches, 6);
    assert_eq!(report.unsat, 0);
    assert!(report.exhausted);

    // Some call reaches the `return True` side of the non-linear predicate
    let hit = sink.new_calls().map(parse_scalar_args).any(|args| {
        let (a, b) = (args[0].1, args[1].1);
        a >= 1000.0 && b >= 1000.0 && (a + b).powf(2.0) - 1_230_000_000.0 < 1e-10
    });
    assert!(hit, "no call reached line 7: {:?}", sink.calls);
}

#[test]
fn test_non_linear_call_text() {
    let (_, sink) = run_fixture("non_linear", &exhaustive_config(5));
    let first = sink.new_calls().next().unwrap();
    assert!(first.starts_with("non_linear.non_linear(real_a="));
    assert!(first.contains(", real_b="));
    assert!(first.ends_with(')'));
}

#[test]
fn test_contradiction_is_unsat_exactly_once() {
    let (report, _) = run_fixture("contradiction", &exhaustive_config(2));
    assert_eq!(report.added, 2);
    assert_eq!(report.unsat, 1);
    assert_eq!(report.infeasible, 1);
    assert_eq!(report.solved_branches, 3);

    // Reseeding for a while never brings the dead branch back
    let config = SessionConfig {
        seed: Some(2),
        max_iterations: Some(40),
        ..SessionConfig::default()
    };
    let analysis = analyze_fixture("contradiction");
    let mut driver = ConcolicDriver::new(&analysis, "contradiction", &config);
    let dead = BranchKey::new(3, true);
    let mut unsat = 0;
    for _ in 0..40 {
        let outcome = driver.next_call();
        if let IterationOutcome::Unsat { key } = &outcome {
            assert_eq!(*key, ConstraintKey::Branch(dead));
            unsat += 1;
        }
        if outcome.is_dead_end() {
            driver.reseed();
        }
        if unsat > 0 {
            assert!(!driver.store().is_pending(&ConstraintKey::Branch(dead)));
        }
    }
    assert_eq!(unsat, 1);
    assert!(driver.store().is_infeasible(&dead));
}

#[test]
fn test_triangle_reaches_all_classes() {
    let (report, sink) = run_fixture("triangle", &exhaustive_config(21));
    assert_eq!(report.total_branch_outcomes, 8);
    assert_eq!(report.solved_branches, 8);
    assert_eq!(report.added, sink.new_calls().count());
}

#[test]
fn test_sequence_parameter_gets_fifteen_elements() {
    let (report, sink) = run_fixture("seq_max", &exhaustive_config(4));
    assert_eq!(report.solved_branches, 4);

    let first = sink.new_calls().next().unwrap();
    let list = &first[first.find('[').unwrap()..=first.rfind(']').unwrap()];
    assert_eq!(list.matches(", ").count(), 14);
}

#[test]
fn test_helper_branches_are_not_traced() {
    let analysis = analyze_fixture("scaled");
    let mut driver = ConcolicDriver::new(&analysis, "scaled", &exhaustive_config(8));
    while !matches!(driver.next_call(), IterationOutcome::Exhausted) {}

    let lines: Vec<u32> = driver.store().solved_keys().iter().map(|k| k.line).collect();
    assert!(lines.iter().all(|line| *line == 5 || *line == 7));
    assert_eq!(driver.store().solved_count(), 4);
}

#[test]
fn test_module_constants_reach_the_solver_as_values() {
    let (report, sink) = run_fixture("module_limits", &exhaustive_config(6));
    assert_eq!(report.failed, 0);
    assert_eq!(report.solved_branches, 4);
    assert!(report.exhausted);

    let calls: Vec<Vec<(String, f64)>> = sink.new_calls().map(parse_scalar_args).collect();
    assert!(calls.iter().any(|args| args[0].1 > 100.0));
    assert!(calls
        .iter()
        .any(|args| args[0].1 <= 100.0 && args[1].1 < -50.0));
}

#[test]
fn test_missing_function_is_fatal() {
    let err = dysy_core::ProgramAnalyzer::new()
        .unwrap()
        .analyze("x = 1\n")
        .unwrap_err();
    assert!(matches!(err, dysy_core::features::analysis::AnalysisError::NoFunction));
}
