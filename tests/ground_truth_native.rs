//! Ground truth through the real native compiler. Skipped when `g++` is not
//! installed.

mod common;

use common::{init_logging, IDENTITY_WAIN};
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use wlp_harness::pipeline::Observe;
use wlp_harness::{
    extract_trailer, run_ground_truth, HarnessKind, PipelineRunner, ProcessExecutor, RunOptions,
    RunReport, Toolchain,
};

fn native_compiler_available() -> bool {
    let found = Command::new("g++")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success());
    if !found {
        eprintln!("g++ not found, skipping");
    }
    found
}

fn ground_truth(kind: HarnessKind, source: &str, input: &str) -> RunReport {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("in.txt");
    fs::write(&input_path, input).unwrap();
    let options = RunOptions {
        input: Some(Path::new(&input_path)),
        observe: Observe::Capture,
        keep_artifacts: None,
    };
    run_ground_truth(
        &mut PipelineRunner::new(ProcessExecutor),
        &Toolchain::default(),
        kind,
        source,
        &options,
    )
    .unwrap_or_else(|e| panic!("{kind} ground truth failed: {e}"))
}

#[test]
fn test_two_ints_identity() {
    init_logging();
    if !native_compiler_available() {
        return;
    }
    let report = ground_truth(HarnessKind::TwoInts, IDENTITY_WAIN, "5 7\n");
    let stdout = report.stdout_text();
    assert_eq!(stdout.matches("wain returned").count(), 1);
    assert_eq!(stdout.lines().last(), Some("wain returned 5"));
    assert_eq!(extract_trailer(&stdout, ""), Some(5));
    // Prompts stay off stdout.
    assert!(!stdout.contains("Enter"));
    assert!(report.stderr_text().contains("Enter second integer: "));
}

#[test]
fn test_array_sum() {
    if !native_compiler_available() {
        return;
    }
    let source = "int wain(int* a, int n) {\n\
                  \x20 int s = 0;\n\
                  \x20 int i = 0;\n\
                  \x20 while (i < n) { s = s + *(a + i); i = i + 1; }\n\
                  \x20 return s;\n\
                  }\n";
    let report = ground_truth(HarnessKind::Array, source, "3\n4 5 6\n");
    assert_eq!(extract_trailer(&report.stdout_text(), ""), Some(15));
    assert_eq!(
        report
            .stderr_text()
            .matches("Enter value of array element")
            .count(),
        3
    );
}

#[test]
fn test_println_output_precedes_trailer() {
    if !native_compiler_available() {
        return;
    }
    let source = "int wain(int a, int b) {\n  println(a + b);\n  return NULL;\n}\n";
    let report = ground_truth(HarnessKind::Stepper, source, "2\n3\n");
    assert_eq!(report.stdout_text(), "5\nwain returned 0\n");
}

#[test]
fn test_stdin_kind_leaves_input_to_program() {
    if !native_compiler_available() {
        return;
    }
    let source = "int wain(int a, int b) {\n  return a + b + 9;\n}\n";
    let report = ground_truth(HarnessKind::Stdin, source, "ignored\n");
    assert_eq!(report.stdout_text(), "wain returned 9\n");
    assert_eq!(report.stderr_text(), "");
}
