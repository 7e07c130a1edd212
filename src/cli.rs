//! Command-line front-ends.
//!
//! Each binary is a thin `main` around one of the `*_main` functions here,
//! which take the argument list and a [`StageExecutor`] so the whole path
//! from argv to launched processes can be driven by a fake in tests.
//!
//! Usage errors (missing arguments, unknown harness selector) print the
//! usage line to stdout and return 1 before any stage is launched.

use crate::core::error::HarnessError;
use crate::core::toolchain::{CompileMode, Toolchain};
use crate::differential::{compare_files, DiffRequest};
use crate::ground_truth::run_ground_truth;
use crate::harness::HarnessKind;
use crate::pipeline::{PipelineRunner, RunOptions, StageExecutor};
use crate::simulated::run_simulated;
use clap::error::ErrorKind;
use clap::{Args, Parser};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

const SELECTORS: &str = "--twoints|--array|--stepper|--stdin";

/// Harness-kind selector shared by all front-ends. At most one may be given.
#[derive(Args, Debug, Clone, Default)]
#[group(multiple = false)]
pub struct HarnessSelector {
    /// int wain(int, int), two prompted integers
    #[arg(long)]
    pub twoints: bool,
    /// int wain(int*, int), prompted length and elements
    #[arg(long)]
    pub array: bool,
    /// int wain(int, int), one value per step
    #[arg(long)]
    pub stepper: bool,
    /// int wain(int, int), stdin passed through untouched
    #[arg(long)]
    pub stdin: bool,
    /// Harness kind by name
    #[arg(long, value_name = "KIND")]
    pub harness: Option<HarnessKind>,
}

impl HarnessSelector {
    pub fn kind(&self) -> Option<HarnessKind> {
        if self.twoints {
            Some(HarnessKind::TwoInts)
        } else if self.array {
            Some(HarnessKind::Array)
        } else if self.stepper {
            Some(HarnessKind::Stepper)
        } else if self.stdin {
            Some(HarnessKind::Stdin)
        } else {
            self.harness
        }
    }
}

/// Overrides for the external tool paths.
#[derive(Args, Debug, Clone, Default)]
pub struct ToolchainArgs {
    /// Course compiler
    #[arg(long, env = "WLP_COMPILER", value_name = "PATH")]
    pub compiler: Option<PathBuf>,
    /// Assembler reading assembly on stdin
    #[arg(long, env = "WLP_ASSEMBLER", value_name = "PATH")]
    pub assembler: Option<PathBuf>,
    #[arg(long, env = "WLP_LINKER", value_name = "PATH")]
    pub linker: Option<PathBuf>,
    /// Relocator producing the simulator image
    #[arg(long, env = "WLP_RELOCATOR", value_name = "PATH")]
    pub relocator: Option<PathBuf>,
    /// Runtime-support object linked after the program (repeatable)
    #[arg(
        long = "runtime-module",
        env = "WLP_RUNTIME_MODULES",
        value_name = "PATH",
        value_delimiter = ','
    )]
    pub runtime_modules: Vec<PathBuf>,
    #[arg(long, env = "WLP_RUNNER_TWOINTS", value_name = "PATH")]
    pub runner_twoints: Option<PathBuf>,
    #[arg(long, env = "WLP_RUNNER_ARRAY", value_name = "PATH")]
    pub runner_array: Option<PathBuf>,
    #[arg(long, env = "WLP_RUNNER_STEPPER", value_name = "PATH")]
    pub runner_stepper: Option<PathBuf>,
    #[arg(long, env = "WLP_RUNNER_STDIN", value_name = "PATH")]
    pub runner_stdin: Option<PathBuf>,
    /// Native C++ compiler for ground truth
    #[arg(long, env = "WLP_NATIVE_COMPILER", value_name = "PATH")]
    pub native_compiler: Option<PathBuf>,
}

impl ToolchainArgs {
    /// Apply the overrides on top of `base`.
    pub fn apply(&self, mut base: Toolchain) -> Toolchain {
        let set = |slot: &mut PathBuf, value: &Option<PathBuf>| {
            if let Some(value) = value {
                *slot = value.clone();
            }
        };
        set(&mut base.compiler, &self.compiler);
        set(&mut base.assembler, &self.assembler);
        set(&mut base.linker, &self.linker);
        set(&mut base.relocator, &self.relocator);
        set(&mut base.runners.twoints, &self.runner_twoints);
        set(&mut base.runners.array, &self.runner_array);
        set(&mut base.runners.stepper, &self.runner_stepper);
        set(&mut base.runners.stdin, &self.runner_stdin);
        set(&mut base.native_compiler, &self.native_compiler);
        if !self.runtime_modules.is_empty() {
            base.runtime_modules = self.runtime_modules.clone();
        }
        base
    }
}

/// Compile, link and simulate a program inside an I/O harness.
#[derive(Parser, Debug)]
#[command(name = "wlp-run", version)]
pub struct RunCli {
    /// Source program
    pub input_file: PathBuf,
    /// File supplying the program's stdin (interactive when omitted)
    pub stdin_file: Option<PathBuf>,
    #[command(flatten)]
    pub harness: HarnessSelector,
    /// Compiler backend
    #[arg(long, value_enum, default_value_t = CompileMode::default(), env = "WLP_MODE")]
    pub mode: CompileMode,
    /// Keep intermediate artifacts in DIR instead of a temporary directory
    #[arg(long, value_name = "DIR")]
    pub keep_artifacts: Option<PathBuf>,
    #[command(flatten)]
    pub toolchain: ToolchainArgs,
}

/// Compile a program natively inside its harness to produce reference output.
#[derive(Parser, Debug)]
#[command(name = "wlp-ground-truth", version)]
pub struct GroundTruthCli {
    /// Source program
    pub input_file: PathBuf,
    /// File supplying the program's stdin (interactive when omitted)
    pub stdin_file: Option<PathBuf>,
    #[command(flatten)]
    pub harness: HarnessSelector,
    /// Keep the unit and binary in DIR instead of a temporary directory
    #[arg(long, value_name = "DIR")]
    pub keep_artifacts: Option<PathBuf>,
    #[command(flatten)]
    pub toolchain: ToolchainArgs,
}

/// Compare simulated output against ground truth for a batch of programs.
#[derive(Parser, Debug)]
#[command(name = "wlp-diff", version)]
pub struct DiffCli {
    /// Source programs
    #[arg(required = true)]
    pub sources: Vec<PathBuf>,
    /// File supplying stdin to every run
    #[arg(long, short = 'i', value_name = "FILE")]
    pub input: PathBuf,
    #[command(flatten)]
    pub harness: HarnessSelector,
    #[arg(long, value_enum, default_value_t = CompileMode::default(), env = "WLP_MODE")]
    pub mode: CompileMode,
    /// Programs compared in parallel
    #[arg(long, short = 'j', default_value_t = 1)]
    pub jobs: usize,
    #[command(flatten)]
    pub toolchain: ToolchainArgs,
}

fn program_name(args: &[OsString], fallback: &str) -> String {
    args.first()
        .and_then(|arg| Path::new(arg).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| fallback.to_string())
}

/// Parse, mapping clap failures onto the usage-error contract.
fn parse<P: Parser>(args: &[OsString], usage: &str) -> Result<P, i32> {
    match P::try_parse_from(args) {
        Ok(cli) => Ok(cli),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{err}");
            Err(0)
        }
        Err(err) => {
            log::debug!("Argument error: {err}");
            Err(usage_error(usage))
        }
    }
}

/// Usage goes to stdout, not stderr.
fn usage_error(usage: &str) -> i32 {
    let err = HarnessError::Usage(usage.to_string());
    println!("{err}");
    err.exit_code()
}

fn read_source(path: &Path) -> Result<String, i32> {
    fs::read_to_string(path).map_err(|e| {
        eprintln!("Error: failed to read {}: {e}", path.display());
        1
    })
}

/// `wlp-run` entry point. Returns the process exit status.
pub fn run_main<I, T, E>(args: I, executor: E) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
    E: StageExecutor,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let program = program_name(&args, "wlp-run");
    let usage = format!("Usage: {program} input.c [{SELECTORS}] [stdin_file]");

    let cli: RunCli = match parse(&args, &usage) {
        Ok(cli) => cli,
        Err(code) => return code,
    };
    let Some(kind) = cli.harness.kind() else {
        return usage_error(&usage);
    };
    let source = match read_source(&cli.input_file) {
        Ok(source) => source,
        Err(code) => return code,
    };

    let toolchain = cli.toolchain.apply(Toolchain::default());
    let options = RunOptions {
        input: cli.stdin_file.as_deref(),
        keep_artifacts: cli.keep_artifacts.as_deref(),
        ..RunOptions::default()
    };
    let mut runner = PipelineRunner::new(executor);
    match run_simulated(&mut runner, &toolchain, cli.mode, kind, &source, &options) {
        Ok(report) => report.exit_code,
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    }
}

/// `wlp-ground-truth` entry point. Returns the process exit status.
pub fn ground_truth_main<I, T, E>(args: I, executor: E) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
    E: StageExecutor,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let program = program_name(&args, "wlp-ground-truth");
    let usage = format!("Usage: {program} input.c [stdin_file] [{SELECTORS}]");

    let cli: GroundTruthCli = match parse(&args, &usage) {
        Ok(cli) => cli,
        Err(code) => return code,
    };
    let kind = cli.harness.kind().unwrap_or(HarnessKind::TwoInts);
    let source = match read_source(&cli.input_file) {
        Ok(source) => source,
        Err(code) => return code,
    };

    let toolchain = cli.toolchain.apply(Toolchain::default());
    let options = RunOptions {
        input: cli.stdin_file.as_deref(),
        keep_artifacts: cli.keep_artifacts.as_deref(),
        ..RunOptions::default()
    };
    let mut runner = PipelineRunner::new(executor);
    match run_ground_truth(&mut runner, &toolchain, kind, &source, &options) {
        Ok(report) => report.exit_code,
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    }
}

/// `wlp-diff` entry point. Returns 0 when every program matches.
pub fn diff_main<I, T, E, F>(args: I, make_executor: F) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
    E: StageExecutor,
    F: Fn() -> E + Sync,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let program = program_name(&args, "wlp-diff");
    let usage = format!("Usage: {program} [{SELECTORS}] --input FILE source.c...");

    let cli: DiffCli = match parse(&args, &usage) {
        Ok(cli) => cli,
        Err(code) => return code,
    };
    let Some(kind) = cli.harness.kind() else {
        return usage_error(&usage);
    };

    let toolchain = cli.toolchain.apply(Toolchain::default());
    let request = DiffRequest {
        toolchain: &toolchain,
        mode: cli.mode,
        kind,
        input: &cli.input,
    };

    let reports = compare_files(make_executor, &request, &cli.sources, cli.jobs);
    let mut failures = 0;
    for report in &reports {
        let name = report.path.display();
        match &report.result {
            Ok(verdict) if verdict.is_match() => println!("PASS {name}: {verdict}"),
            Ok(verdict) => {
                failures += 1;
                println!("FAIL {name}: {verdict}");
            }
            Err(e) => {
                failures += 1;
                println!("ERROR {name}: {e}");
            }
        }
    }
    println!("{} passed, {failures} failed", reports.len() - failures);

    i32::from(failures > 0)
}
