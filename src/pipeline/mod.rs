// This module describes pipelines as plain data. A PipelineStage names one external tool
// invocation: the program (a tool on disk or an artifact produced earlier in the run), its
// arguments with placeholders for the artifacts it reads and writes, where its stdin comes
// from, where its stdout and stderr go. A Pipeline is an ordered list of stages whose
// shape is validated once at construction: the first stage consumes the source unit, each
// later stage consumes what the previous one produced, only the last stage is interactive
// and only the last stage's output is observed by the caller. Concrete paths are resolved
// by the runner against the run's work directory, so the same Pipeline value can be run
// many times, in parallel, without any process-wide working-directory change.

//! Pipeline and stage descriptions.
//!
//! Two shapes are built here:
//!
//! ```text
//! simulated:    compile → assemble → link → relocate → simulate
//! ground truth: native-compile → native-run
//! ```

pub mod runner;

use crate::core::error::{HarnessError, HarnessResult};
use crate::core::toolchain::{CompileMode, Toolchain};
use crate::core::workdir::Artifact;
use crate::harness::{HarnessKind, Target};
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

pub use runner::{
    Invocation, Observe, PipelineRunner, ProcessExecutor, RunOptions, RunReport, RunState,
    StageExecutor, StageOutcome, StderrBinding, StdinBinding, StdoutBinding,
};

/// What a stage executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Program {
    /// External tool, looked up like any command.
    Tool(PathBuf),
    /// Executable produced by an earlier stage.
    Artifact(Artifact),
}

/// One command-line argument, possibly a placeholder for an artifact path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageArg {
    Literal(OsString),
    /// Path of an artifact the stage reads.
    Input(Artifact),
    /// Path of an artifact the stage writes.
    Output(Artifact),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdinSource {
    /// Nothing; the stage must not wait for input.
    Null,
    /// Read from an artifact.
    Artifact(Artifact),
    /// The user's input file if one is supplied, else the terminal.
    Interactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdoutSink {
    /// Write to an artifact.
    Artifact(Artifact),
    /// Pass through to the harness's own stdout.
    Inherit,
    /// The program's observable result; shown or captured per run options.
    Observed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StderrSink {
    Inherit,
    Discard,
}

/// A single external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStage {
    pub name: &'static str,
    pub program: Program,
    pub args: Vec<StageArg>,
    pub stdin: StdinSource,
    pub stdout: StdoutSink,
    pub stderr: StderrSink,
}

impl PipelineStage {
    /// A stage with no arguments, no stdin, inherited stdout and stderr.
    pub fn new(name: &'static str, program: Program) -> Self {
        Self {
            name,
            program,
            args: Vec::new(),
            stdin: StdinSource::Null,
            stdout: StdoutSink::Inherit,
            stderr: StderrSink::Inherit,
        }
    }

    pub fn tool(name: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::new(name, Program::Tool(path.into()))
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(StageArg::Literal(arg.into()));
        self
    }

    pub fn input(mut self, artifact: Artifact) -> Self {
        self.args.push(StageArg::Input(artifact));
        self
    }

    pub fn output(mut self, artifact: Artifact) -> Self {
        self.args.push(StageArg::Output(artifact));
        self
    }

    pub fn stdin_from(mut self, artifact: Artifact) -> Self {
        self.stdin = StdinSource::Artifact(artifact);
        self
    }

    pub fn interactive(mut self) -> Self {
        self.stdin = StdinSource::Interactive;
        self
    }

    pub fn stdout_to(mut self, artifact: Artifact) -> Self {
        self.stdout = StdoutSink::Artifact(artifact);
        self
    }

    pub fn observed(mut self) -> Self {
        self.stdout = StdoutSink::Observed;
        self
    }

    pub fn discard_stderr(mut self) -> Self {
        self.stderr = StderrSink::Discard;
        self
    }

    /// Artifacts this stage reads, in program/argument/stdin order.
    pub fn inputs(&self) -> Vec<Artifact> {
        let mut inputs = Vec::new();
        if let Program::Artifact(artifact) = self.program {
            inputs.push(artifact);
        }
        inputs.extend(self.args.iter().filter_map(|arg| match arg {
            StageArg::Input(artifact) => Some(*artifact),
            _ => None,
        }));
        if let StdinSource::Artifact(artifact) = self.stdin {
            inputs.push(artifact);
        }
        inputs
    }

    /// Artifact this stage writes, via stdout redirection or an output argument.
    pub fn output_artifact(&self) -> Option<Artifact> {
        if let StdoutSink::Artifact(artifact) = self.stdout {
            return Some(artifact);
        }
        self.args.iter().find_map(|arg| match arg {
            StageArg::Output(artifact) => Some(*artifact),
            _ => None,
        })
    }
}

/// An ordered, validated list of stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    label: String,
    target: Target,
    stages: Vec<PipelineStage>,
}

impl Pipeline {
    /// Validate the stage chain and build a pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::InvalidPipeline`] if the stage list is empty,
    /// the first stage does not read the source unit, a stage does not read
    /// what its predecessor wrote, or the interactive/observed stage is not
    /// the last one.
    pub fn new(
        label: impl Into<String>,
        target: Target,
        stages: Vec<PipelineStage>,
    ) -> HarnessResult<Self> {
        let invalid = |stage: usize, reason: String| HarnessError::InvalidPipeline { stage, reason };

        let last = match stages.len() {
            0 => return Err(invalid(0, "pipeline has no stages".into())),
            n => n - 1,
        };

        for (i, stage) in stages.iter().enumerate() {
            let expected = if i == 0 {
                Some(Artifact::Source)
            } else {
                stages[i - 1].output_artifact()
            };
            match expected {
                Some(artifact) if stage.inputs().contains(&artifact) => {}
                Some(artifact) => {
                    return Err(invalid(
                        i,
                        format!("{} does not read {artifact}", stage.name),
                    ))
                }
                None => {
                    return Err(invalid(
                        i - 1,
                        format!("{} produces no artifact for the next stage", stages[i - 1].name),
                    ))
                }
            }

            if i != last && stage.stdin == StdinSource::Interactive {
                return Err(invalid(i, format!("{} is interactive but not last", stage.name)));
            }
            if i != last && stage.stdout == StdoutSink::Observed {
                return Err(invalid(i, format!("{} is observed but not last", stage.name)));
            }
        }

        if stages[last].stdout != StdoutSink::Observed {
            return Err(invalid(
                last,
                format!("final stage {} has no observed output", stages[last].name),
            ));
        }

        Ok(Self {
            label: label.into(),
            target,
            stages,
        })
    }

    /// compile → assemble → link → relocate → simulate, for one compile mode
    /// and harness kind.
    pub fn simulated(
        toolchain: &Toolchain,
        mode: CompileMode,
        kind: HarnessKind,
    ) -> HarnessResult<Self> {
        let mut link = PipelineStage::tool("link", &toolchain.linker).input(Artifact::Object);
        for module in &toolchain.runtime_modules {
            link = link.arg(module);
        }

        let stages = vec![
            PipelineStage::tool("compile", &toolchain.compiler)
                .input(Artifact::Source)
                .arg(mode.flag())
                .stdout_to(Artifact::Assembly),
            PipelineStage::tool("assemble", &toolchain.assembler)
                .stdin_from(Artifact::Assembly)
                .stdout_to(Artifact::Object),
            link.stdout_to(Artifact::Linked),
            PipelineStage::tool("relocate", &toolchain.relocator)
                .arg(&toolchain.load_address)
                .stdin_from(Artifact::Linked)
                .stdout_to(Artifact::Binary)
                .discard_stderr(),
            PipelineStage::tool("simulate", toolchain.runner(kind))
                .input(Artifact::Binary)
                .interactive()
                .observed(),
        ];

        Pipeline::new(format!("simulated/{kind}/{mode}"), Target::Simulator, stages)
    }

    /// native-compile → native-run.
    pub fn ground_truth(toolchain: &Toolchain) -> HarnessResult<Self> {
        let stages = vec![
            PipelineStage::tool("native-compile", &toolchain.native_compiler)
                .arg("-xc++")
                .arg("-")
                .arg("-o")
                .output(Artifact::NativeBinary)
                .stdin_from(Artifact::Source),
            PipelineStage::new("native-run", Program::Artifact(Artifact::NativeBinary))
                .interactive()
                .observed(),
        ];

        Pipeline::new("ground-truth", Target::Native, stages)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.label)?;
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            f.write_str(stage.name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_shape() {
        let tc = Toolchain::default();
        let p = Pipeline::simulated(&tc, CompileMode::Naive, HarnessKind::Array).unwrap();
        assert_eq!(
            p.to_string(),
            "simulated/array/naive: compile -> assemble -> link -> relocate -> simulate"
        );
        assert_eq!(p.target(), Target::Simulator);

        let stages = p.stages();
        assert_eq!(
            stages[0].args,
            vec![
                StageArg::Input(Artifact::Source),
                StageArg::Literal("--emit-naive-mips".into())
            ]
        );
        assert_eq!(stages[0].stdin, StdinSource::Null);
        assert_eq!(stages[2].stdin, StdinSource::Null);
        assert_eq!(
            stages[2].args,
            vec![
                StageArg::Input(Artifact::Object),
                StageArg::Literal("references/print.merl".into()),
                StageArg::Literal("references/alloc.merl".into()),
            ]
        );
        assert_eq!(stages[3].stderr, StderrSink::Discard);
        assert_eq!(stages[4].program, Program::Tool("mips.array".into()));
        assert_eq!(stages[4].stdin, StdinSource::Interactive);
    }

    #[test]
    fn test_ground_truth_shape() {
        let p = Pipeline::ground_truth(&Toolchain::default()).unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(p.target(), Target::Native);
        assert_eq!(p.stages()[0].output_artifact(), Some(Artifact::NativeBinary));
        assert_eq!(p.stages()[1].inputs(), vec![Artifact::NativeBinary]);
    }

    #[test]
    fn test_rejects_broken_chain() {
        let stages = vec![
            PipelineStage::tool("compile", "cc")
                .input(Artifact::Source)
                .stdout_to(Artifact::Assembly),
            PipelineStage::tool("link", "ld")
                .stdin_from(Artifact::Object)
                .observed(),
        ];
        let err = Pipeline::new("broken", Target::Simulator, stages).unwrap_err();
        assert!(matches!(err, HarnessError::InvalidPipeline { stage: 1, .. }));
    }

    #[test]
    fn test_rejects_first_stage_without_source() {
        let stages = vec![PipelineStage::tool("run", "true").observed()];
        let err = Pipeline::new("no-source", Target::Native, stages).unwrap_err();
        assert!(matches!(err, HarnessError::InvalidPipeline { stage: 0, .. }));
    }

    #[test]
    fn test_rejects_early_interactive_stage() {
        let stages = vec![
            PipelineStage::tool("compile", "cc")
                .input(Artifact::Source)
                .interactive()
                .stdout_to(Artifact::Assembly),
            PipelineStage::tool("run", "sim")
                .input(Artifact::Assembly)
                .observed(),
        ];
        let err = Pipeline::new("interactive", Target::Simulator, stages).unwrap_err();
        assert!(matches!(err, HarnessError::InvalidPipeline { stage: 0, .. }));
    }

    #[test]
    fn test_rejects_empty_and_unobserved() {
        assert!(Pipeline::new("empty", Target::Native, Vec::new()).is_err());
        let stages = vec![PipelineStage::tool("compile", "cc").input(Artifact::Source)];
        let err = Pipeline::new("quiet", Target::Native, stages).unwrap_err();
        assert!(matches!(err, HarnessError::InvalidPipeline { stage: 0, .. }));
    }
}
