//! Common test utilities for dysy-core
//!
//! Fixture loading, session builders and call-text parsing shared by the
//! integration tests.

#![allow(dead_code)]

use dysy_core::features::driver::{run_session, ConcolicDriver, RecordingSink, SessionReport};
use dysy_core::{ProgramAnalysis, ProgramAnalyzer, SessionConfig};
use std::path::PathBuf;
use std::time::Duration;

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(format!("{name}.py"))
}

pub fn analyze_fixture(name: &str) -> ProgramAnalysis {
    ProgramAnalyzer::new()
        .unwrap()
        .analyze_file(fixture_path(name))
        .unwrap()
}

/// Seeded config that stops once the worklist runs dry
pub fn exhaustive_config(seed: u64) -> SessionConfig {
    SessionConfig {
        seed: Some(seed),
        stop_when_exhausted: true,
        max_iterations: Some(200),
        ..SessionConfig::default()
    }
}

/// Run a whole session on a fixture
pub fn run_fixture(name: &str, config: &SessionConfig) -> (SessionReport, RecordingSink) {
    let analysis = analyze_fixture(name);
    let mut driver = ConcolicDriver::new(&analysis, name, config);
    let mut sink = RecordingSink::new();
    let report = run_session(&mut driver, &mut sink, Duration::from_secs(60));
    (report, sink)
}

/// Parse `m.f(a=1.5, b=2)` into `[("a", 1.5), ("b", 2.0)]` (scalars only)
pub fn parse_scalar_args(call: &str) -> Vec<(String, f64)> {
    let open = call.find('(').unwrap();
    let inner = &call[open + 1..call.len() - 1];
    inner
        .split(", ")
        .map(|pair| {
            let (name, value) = pair.split_once('=').unwrap();
            (name.to_string(), value.parse::<f64>().unwrap())
        })
        .collect()
}
