//! Primary mode: the course compiler, assembler, linker and simulator.

use crate::core::error::HarnessResult;
use crate::core::toolchain::{CompileMode, Toolchain};
use crate::harness::{inject, HarnessKind, HarnessTemplate, TranslationUnit};
use crate::pipeline::{Pipeline, PipelineRunner, RunOptions, RunReport, StageExecutor};

/// Unit fed to the course compiler. The simulator front-end for `kind`
/// supplies the driver, so this is the source itself.
pub fn simulated_unit(kind: HarnessKind, source: &str) -> HarnessResult<TranslationUnit> {
    inject(&HarnessTemplate::simulator(kind), source)
}

/// Compile `source` with the course toolchain and run it under the
/// simulator front-end for `kind`.
///
/// # Errors
///
/// Fails on the first stage that cannot be launched or exits non-zero.
pub fn run_simulated<E: StageExecutor>(
    runner: &mut PipelineRunner<E>,
    toolchain: &Toolchain,
    mode: CompileMode,
    kind: HarnessKind,
    source: &str,
    options: &RunOptions<'_>,
) -> HarnessResult<RunReport> {
    let pipeline = Pipeline::simulated(toolchain, mode, kind)?;
    let unit = simulated_unit(kind, source)?;
    runner.run(&pipeline, &unit, options)
}
