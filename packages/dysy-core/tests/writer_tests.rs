//! Generated test modules on disk, through the library and the CLI

mod common;

use common::*;
use dysy_core::{run_session, ConcolicDriver, UnittestWriter};
use std::process::Command;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_session_writes_unittest_module() {
    let dir = TempDir::new().unwrap();
    let analysis = analyze_fixture("non_linear");
    let mut driver = ConcolicDriver::new(&analysis, "non_linear", &exhaustive_config(17));

    let (mut writer, path) = UnittestWriter::create(dir.path(), "non_linear").unwrap();
    let report = run_session(&mut driver, &mut writer, Duration::from_secs(60));
    assert_eq!(writer.calls_written(), report.added);
    writer.finish().unwrap();

    assert_eq!(path, dir.path().join("Test_non_linear_Test.py"));
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("import non_linear\nimport unittest\n"));
    assert!(text.contains("  def test1(self) :\n"));
    // No reseed before exhaustion, so a single method
    assert!(!text.contains("def test2"));
    assert_eq!(text.matches("    non_linear.non_linear(").count(), report.added);
    assert!(text.ends_with("unittest.TextTestRunner(verbosity=2).run(suite)\n"));
}

#[test]
fn test_cli_end_to_end() {
    let dir = TempDir::new().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_dysy-gen"))
        .arg(fixture_path("contradiction"))
        .arg(dir.path())
        .arg("4")
        .args(["--seed", "5", "--max-iterations", "10", "--report", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("ADDED - 2"));
    assert!(stdout.contains("SKIPPED - "));
    let json_start = stdout.find('{').unwrap();
    let report: serde_json::Value = serde_json::from_str(&stdout[json_start..]).unwrap();
    assert_eq!(report["function"], "contradiction");
    assert_eq!(report["unsat"], 1);

    let written = dir.path().join("Test_contradiction_Test.py");
    let text = std::fs::read_to_string(written).unwrap();
    assert!(text.contains("contradiction.contradiction(int_x="));
}

#[test]
fn test_cli_rejects_missing_function() {
    let dir = TempDir::new().unwrap();
    let subject = dir.path().join("empty.py");
    std::fs::write(&subject, "x = 1\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_dysy-gen"))
        .arg(&subject)
        .arg(dir.path().join("out"))
        .arg("3")
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No function definition"));
}
