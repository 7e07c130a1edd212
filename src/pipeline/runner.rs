//! Pipeline execution.
//!
//! The runner walks a [`Pipeline`] stage by stage, resolving artifact
//! placeholders against the run's [`WorkDir`], binding stdin/stdout/stderr,
//! and handing each [`Invocation`] to a [`StageExecutor`]. The first
//! non-zero exit stops the run; later stages are never launched.
//!
//! # State machine
//!
//! ```text
//! Pending → Running(0) → Running(1) → ... → Succeeded
//!                  ╰──────────────────────→ Failed(i, code)
//! ```

use super::{Pipeline, PipelineStage, Program, StageArg, StderrSink, StdinSource, StdoutSink};
use crate::core::error::{HarnessError, HarnessResult};
use crate::core::workdir::{Artifact, WorkDir};
use crate::harness::TranslationUnit;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

/// Where a launched process reads stdin from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StdinBinding {
    Null,
    File(PathBuf),
    Inherit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StdoutBinding {
    File(PathBuf),
    Inherit,
    Capture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StderrBinding {
    Inherit,
    Discard,
    Capture,
}

/// A fully resolved stage, ready to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub stage: usize,
    pub name: &'static str,
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub stdin: StdinBinding,
    pub stdout: StdoutBinding,
    pub stderr: StderrBinding,
}

impl Invocation {
    /// Shell-like rendering for logs.
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        if let StdinBinding::File(path) = &self.stdin {
            line.push_str(&format!(" < {}", path.display()));
        }
        if let StdoutBinding::File(path) = &self.stdout {
            line.push_str(&format!(" > {}", path.display()));
        }
        if self.stderr == StderrBinding::Discard {
            line.push_str(" 2> /dev/null");
        }
        line
    }
}

/// Result of one launched stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOutcome {
    pub code: i32,
    pub stdout: Option<Vec<u8>>,
    pub stderr: Option<Vec<u8>>,
}

impl StageOutcome {
    pub fn success() -> Self {
        Self::default()
    }

    pub fn exited(code: i32) -> Self {
        Self {
            code,
            ..Self::default()
        }
    }
}

/// Launches resolved stages. Swapped for a fake in tests.
pub trait StageExecutor {
    /// Run one invocation to completion.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be started or its redirections
    /// cannot be opened. A non-zero exit is an `Ok` outcome.
    fn execute(&mut self, invocation: &Invocation) -> io::Result<StageOutcome>;
}

impl<E: StageExecutor + ?Sized> StageExecutor for &mut E {
    fn execute(&mut self, invocation: &Invocation) -> io::Result<StageOutcome> {
        (**self).execute(invocation)
    }
}

/// Runs stages as real child processes, blocking until each exits.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl StageExecutor for ProcessExecutor {
    fn execute(&mut self, invocation: &Invocation) -> io::Result<StageOutcome> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);

        cmd.stdin(match &invocation.stdin {
            StdinBinding::Null => Stdio::null(),
            StdinBinding::File(path) => Stdio::from(File::open(path)?),
            StdinBinding::Inherit => Stdio::inherit(),
        });
        cmd.stdout(match &invocation.stdout {
            StdoutBinding::File(path) => Stdio::from(File::create(path)?),
            StdoutBinding::Inherit => Stdio::inherit(),
            StdoutBinding::Capture => Stdio::piped(),
        });
        cmd.stderr(match invocation.stderr {
            StderrBinding::Inherit => Stdio::inherit(),
            StderrBinding::Discard => Stdio::null(),
            StderrBinding::Capture => Stdio::piped(),
        });

        let output = cmd.spawn()?.wait_with_output()?;

        Ok(StageOutcome {
            code: exit_code(output.status),
            stdout: (invocation.stdout == StdoutBinding::Capture).then_some(output.stdout),
            stderr: (invocation.stderr == StderrBinding::Capture).then_some(output.stderr),
        })
    }
}

/// Exit code of a finished process; death by signal maps to `128 + signal`.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt as _;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

/// How the final stage's output reaches the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Observe {
    /// Straight to the terminal.
    #[default]
    Terminal,
    /// Collected into the [`RunReport`].
    Capture,
}

/// Per-run settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions<'a> {
    /// File fed to the interactive stage instead of the terminal.
    pub input: Option<&'a Path>,
    pub observe: Observe,
    /// Keep artifacts here instead of a scoped temporary directory.
    pub keep_artifacts: Option<&'a Path>,
}

/// Position of a run in its linear lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Running(usize),
    Succeeded,
    Failed { stage: usize, code: i32 },
}

impl RunState {
    /// Whether `next` is a legal successor. No retries, no going back.
    pub fn can_advance_to(self, next: RunState) -> bool {
        match (self, next) {
            (RunState::Pending, RunState::Running(0)) => true,
            (RunState::Running(i), RunState::Running(j)) => j == i + 1,
            (RunState::Running(_), RunState::Succeeded) => true,
            (RunState::Running(i), RunState::Failed { stage, .. }) => stage == i,
            _ => false,
        }
    }

    pub fn is_finished(self) -> bool {
        matches!(self, RunState::Succeeded | RunState::Failed { .. })
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Exit status of the final stage.
    pub exit_code: i32,
    pub stages_run: usize,
    /// Final stage stdout, when captured.
    pub stdout: Option<Vec<u8>>,
    /// Final stage stderr, when captured.
    pub stderr: Option<Vec<u8>>,
}

impl RunReport {
    pub fn stdout_text(&self) -> String {
        lossy(self.stdout.as_deref())
    }

    pub fn stderr_text(&self) -> String {
        lossy(self.stderr.as_deref())
    }
}

fn lossy(bytes: Option<&[u8]>) -> String {
    bytes
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .unwrap_or_default()
}

/// Sequences a pipeline's stages through an executor.
#[derive(Debug)]
pub struct PipelineRunner<E> {
    executor: E,
    state: RunState,
}

impl<E: StageExecutor> PipelineRunner<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            state: RunState::Pending,
        }
    }

    /// State reached by the most recent run.
    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn into_executor(self) -> E {
        self.executor
    }

    /// Run `pipeline` on `unit`.
    ///
    /// The unit is written into a fresh work directory, which is removed when
    /// the run ends unless `options.keep_artifacts` names a directory.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::StageFailed`] for the first stage exiting
    /// non-zero, [`HarnessError::Spawn`] if a stage cannot be launched, and
    /// [`HarnessError::Io`] for work-directory or input-file problems. No
    /// stage after a failing one is launched.
    pub fn run(
        &mut self,
        pipeline: &Pipeline,
        unit: &TranslationUnit,
        options: &RunOptions<'_>,
    ) -> HarnessResult<RunReport> {
        self.state = RunState::Pending;

        if unit.target() != pipeline.target() {
            return Err(HarnessError::InvalidPipeline {
                stage: 0,
                reason: format!(
                    "{} expects a {:?} unit, got {:?}",
                    pipeline.label(),
                    pipeline.target(),
                    unit.target()
                ),
            });
        }
        if let Some(input) = options.input {
            fs::metadata(input).map_err(|e| HarnessError::io("read input file", input, e))?;
        }

        let workdir = match options.keep_artifacts {
            Some(dir) => WorkDir::kept(dir)?,
            None => WorkDir::scoped()?,
        };
        workdir.write(Artifact::Source, unit.text())?;

        log::info!(
            "🔧 Running {} ({} stages) in {}",
            pipeline.label(),
            pipeline.len(),
            workdir.path().display()
        );

        let mut last = StageOutcome::success();
        for (index, stage) in pipeline.stages().iter().enumerate() {
            self.advance(RunState::Running(index));

            let invocation = resolve(index, stage, &workdir, options);
            log::debug!("[{index}] {}: {}", stage.name, invocation.command_line());

            let outcome = match self.executor.execute(&invocation) {
                Ok(outcome) => outcome,
                Err(source) => {
                    self.advance(RunState::Failed { stage: index, code: 1 });
                    return Err(HarnessError::Spawn {
                        stage: index,
                        program: invocation.program.display().to_string(),
                        source,
                    });
                }
            };

            if outcome.code != 0 {
                self.advance(RunState::Failed {
                    stage: index,
                    code: outcome.code,
                });
                log::warn!("Stage {index} ({}) exited with {}", stage.name, outcome.code);
                return Err(HarnessError::StageFailed {
                    stage: index,
                    name: stage.name,
                    code: outcome.code,
                });
            }
            last = outcome;
        }

        self.advance(RunState::Succeeded);
        log::info!("✅ {} finished", pipeline.label());

        Ok(RunReport {
            exit_code: last.code,
            stages_run: pipeline.len(),
            stdout: last.stdout,
            stderr: last.stderr,
        })
    }

    fn advance(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal run transition {:?} -> {:?}",
            self.state,
            next
        );
        log::debug!("Run state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Bind a stage description to concrete paths for this run.
fn resolve(
    index: usize,
    stage: &PipelineStage,
    workdir: &WorkDir,
    options: &RunOptions<'_>,
) -> Invocation {
    let program = match &stage.program {
        Program::Tool(path) => path.clone(),
        Program::Artifact(artifact) => workdir.artifact(*artifact),
    };

    let args = stage
        .args
        .iter()
        .map(|arg| match arg {
            StageArg::Literal(value) => value.clone(),
            StageArg::Input(artifact) | StageArg::Output(artifact) => {
                workdir.artifact(*artifact).into_os_string()
            }
        })
        .collect();

    let stdin = match stage.stdin {
        StdinSource::Null => StdinBinding::Null,
        StdinSource::Artifact(artifact) => StdinBinding::File(workdir.artifact(artifact)),
        StdinSource::Interactive => match options.input {
            Some(path) => StdinBinding::File(path.to_path_buf()),
            None => StdinBinding::Inherit,
        },
    };

    let capture = options.observe == Observe::Capture && stage.stdout == StdoutSink::Observed;
    let stdout = match stage.stdout {
        StdoutSink::Artifact(artifact) => StdoutBinding::File(workdir.artifact(artifact)),
        StdoutSink::Inherit => StdoutBinding::Inherit,
        StdoutSink::Observed if capture => StdoutBinding::Capture,
        StdoutSink::Observed => StdoutBinding::Inherit,
    };
    let stderr = match stage.stderr {
        StderrSink::Discard => StderrBinding::Discard,
        StderrSink::Inherit if capture => StderrBinding::Capture,
        StderrSink::Inherit => StderrBinding::Inherit,
    };

    Invocation {
        stage: index,
        name: stage.name,
        program,
        args,
        stdin,
        stdout,
        stderr,
    }
}
