//! Runner behavior observed through a recording executor.

mod common;

use common::{init_logging, SpyExecutor, IDENTITY_WAIN};
use std::fs;
use wlp_harness::pipeline::{Observe, RunState, StderrBinding, StdinBinding, StdoutBinding};
use wlp_harness::simulated::simulated_unit;
use wlp_harness::{
    run_ground_truth, run_simulated, Artifact, CompileMode, HarnessError, HarnessKind, Pipeline,
    PipelineRunner, RunOptions, Toolchain,
};

#[test]
fn test_simulated_stage_order_and_wiring() {
    init_logging();
    let mut runner = PipelineRunner::new(SpyExecutor::default());
    run_simulated(
        &mut runner,
        &Toolchain::default(),
        CompileMode::Optimized,
        HarnessKind::TwoInts,
        IDENTITY_WAIN,
        &RunOptions::default(),
    )
    .unwrap_or_else(|e| panic!("simulated run failed: {e}"));

    assert_eq!(runner.state(), RunState::Succeeded);
    let spy = runner.into_executor();
    assert_eq!(
        spy.names(),
        vec!["compile", "assemble", "link", "relocate", "simulate"]
    );

    let inv = &spy.launched;
    assert_eq!(inv[0].program.as_os_str(), "build/compiler_cpp");
    assert_eq!(inv[0].args[1].as_os_str(), "--emit-mips");
    assert_eq!(inv[0].stdin, StdinBinding::Null);
    assert_eq!(inv[2].stdin, StdinBinding::Null);
    assert_eq!(inv[3].stderr, StderrBinding::Discard);
    assert_eq!(inv[4].program.as_os_str(), "mips.twoints");
    // No input file: the simulator talks to the terminal.
    assert_eq!(inv[4].stdin, StdinBinding::Inherit);
    assert_eq!(inv[4].stdout, StdoutBinding::Inherit);

    // Each stage reads the file its predecessor wrote.
    let written = |i: usize| match &spy.launched[i].stdout {
        StdoutBinding::File(path) => path.clone(),
        other => panic!("stage {i} stdout is {other:?}"),
    };
    assert_eq!(inv[1].stdin, StdinBinding::File(written(0)));
    assert_eq!(inv[2].args[0], written(1).into_os_string());
    assert_eq!(inv[3].stdin, StdinBinding::File(written(2)));
    assert_eq!(inv[4].args[0], written(3).into_os_string());
}

#[test]
fn test_every_failing_stage_stops_the_run() {
    init_logging();
    for failing in 0..5 {
        let mut runner = PipelineRunner::new(SpyExecutor::failing_at(failing, 3));
        let err = run_simulated(
            &mut runner,
            &Toolchain::default(),
            CompileMode::Naive,
            HarnessKind::Array,
            IDENTITY_WAIN,
            &RunOptions::default(),
        )
        .unwrap_err();

        match err {
            HarnessError::StageFailed { stage, code, .. } => {
                assert_eq!(stage, failing);
                assert_eq!(code, 3);
            }
            other => panic!("expected StageFailed, got {other}"),
        }
        assert_eq!(
            runner.state(),
            RunState::Failed {
                stage: failing,
                code: 3
            }
        );
        assert_eq!(runner.executor().launched.len(), failing + 1);
    }
}

#[test]
fn test_input_file_feeds_only_the_interactive_stage() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    fs::write(&input, "5\n7\n").unwrap();

    let mut runner = PipelineRunner::new(SpyExecutor::default());
    let options = RunOptions {
        input: Some(&input),
        ..RunOptions::default()
    };
    run_simulated(
        &mut runner,
        &Toolchain::default(),
        CompileMode::Optimized,
        HarnessKind::Stdin,
        IDENTITY_WAIN,
        &options,
    )
    .unwrap();

    let spy = runner.into_executor();
    assert_eq!(spy.launched[4].stdin, StdinBinding::File(input.clone()));
    assert_eq!(spy.stdin_contents[4].as_deref(), Some("5\n7\n"));
    for inv in &spy.launched[..4] {
        assert_ne!(inv.stdin, StdinBinding::File(input.clone()));
        assert_ne!(inv.stdin, StdinBinding::Inherit);
    }
}

#[test]
fn test_missing_input_file_launches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.txt");

    let mut runner = PipelineRunner::new(SpyExecutor::default());
    let options = RunOptions {
        input: Some(&missing),
        ..RunOptions::default()
    };
    let err = run_simulated(
        &mut runner,
        &Toolchain::default(),
        CompileMode::Optimized,
        HarnessKind::TwoInts,
        IDENTITY_WAIN,
        &options,
    )
    .unwrap_err();

    assert!(matches!(err, HarnessError::Io { .. }));
    assert!(runner.executor().launched.is_empty());
    assert_eq!(runner.state(), RunState::Pending);
}

#[test]
fn test_scoped_workdir_removed_after_failure() {
    let mut runner = PipelineRunner::new(SpyExecutor::failing_at(2, 1));
    let result = run_simulated(
        &mut runner,
        &Toolchain::default(),
        CompileMode::Optimized,
        HarnessKind::TwoInts,
        IDENTITY_WAIN,
        &RunOptions::default(),
    );
    assert!(result.is_err());

    let workdir = runner
        .executor()
        .workdir
        .clone()
        .unwrap_or_else(|| panic!("no work directory recorded"));
    assert!(!workdir.exists(), "{} left behind", workdir.display());
}

#[test]
fn test_kept_artifacts_hold_the_source_unit() {
    let dir = tempfile::tempdir().unwrap();
    let keep = dir.path().join("artifacts");

    let mut runner = PipelineRunner::new(SpyExecutor::default());
    let options = RunOptions {
        keep_artifacts: Some(&keep),
        ..RunOptions::default()
    };
    run_simulated(
        &mut runner,
        &Toolchain::default(),
        CompileMode::Optimized,
        HarnessKind::TwoInts,
        IDENTITY_WAIN,
        &options,
    )
    .unwrap();

    let unit = fs::read_to_string(keep.join(Artifact::Source.file_name())).unwrap();
    assert!(unit.contains(IDENTITY_WAIN));
    assert_eq!(runner.executor().workdir.as_deref(), Some(keep.as_path()));
}

#[test]
fn test_capture_applies_to_the_final_stage_only() {
    let mut runner = PipelineRunner::new(SpyExecutor::with_stdout("wain returned 5\n"));
    let options = RunOptions {
        observe: Observe::Capture,
        ..RunOptions::default()
    };
    let report = run_simulated(
        &mut runner,
        &Toolchain::default(),
        CompileMode::Optimized,
        HarnessKind::Stepper,
        IDENTITY_WAIN,
        &options,
    )
    .unwrap();

    assert_eq!(report.stages_run, 5);
    assert_eq!(report.stdout_text(), "wain returned 5\n");
    let spy = runner.executor();
    assert_eq!(spy.launched[4].stdout, StdoutBinding::Capture);
    assert_eq!(spy.launched[4].stderr, StderrBinding::Capture);
    assert!(spy.launched[..4]
        .iter()
        .all(|inv| inv.stdout != StdoutBinding::Capture));
}

#[test]
fn test_runs_are_isolated() {
    let mut runner = PipelineRunner::new(SpyExecutor::default());
    let tc = Toolchain::default();
    let options = RunOptions::default();
    for _ in 0..2 {
        run_ground_truth(
            &mut runner,
            &tc,
            HarnessKind::TwoInts,
            IDENTITY_WAIN,
            &options,
        )
        .unwrap();
    }
    let spy = runner.into_executor();
    let binaries: Vec<_> = spy
        .launched
        .iter()
        .filter(|inv| inv.name == "native-run")
        .map(|inv| inv.program.clone())
        .collect();
    assert_eq!(binaries.len(), 2);
    assert_ne!(binaries[0], binaries[1]);
}

#[test]
fn test_simulator_unit_rejected_by_native_pipeline() {
    let tc = Toolchain::default();
    let pipeline = Pipeline::ground_truth(&tc).unwrap();
    let unit = simulated_unit(HarnessKind::TwoInts, IDENTITY_WAIN).unwrap();

    let mut runner = PipelineRunner::new(SpyExecutor::default());
    let err = runner
        .run(&pipeline, &unit, &RunOptions::default())
        .unwrap_err();
    assert!(matches!(err, HarnessError::InvalidPipeline { .. }));
    assert!(runner.executor().launched.is_empty());
}
