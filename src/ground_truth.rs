//! Ground-truth mode.
//!
//! Bypasses the course toolchain: the source is injected into the native
//! C++ driver for its harness kind, compiled with the native compiler and
//! executed directly. The output is the reference the simulated pipeline is
//! compared against. The run gets its own work directory and never touches
//! the simulated pipeline's artifacts.

use crate::core::error::HarnessResult;
use crate::core::toolchain::Toolchain;
use crate::harness::{inject, HarnessKind, TranslationUnit};
use crate::pipeline::{Pipeline, PipelineRunner, RunOptions, RunReport, StageExecutor};

/// Native translation unit: the kind's driver with `source` spliced in.
pub fn ground_truth_unit(kind: HarnessKind, source: &str) -> HarnessResult<TranslationUnit> {
    inject(&kind.template(), source)
}

/// Compile and run `source` natively inside the `kind` harness.
///
/// Stdin wiring matches the simulated pipeline: `options.input` if given,
/// otherwise the terminal.
///
/// # Errors
///
/// Fails if the native compiler rejects the unit, the binary exits
/// non-zero, or either cannot be launched.
pub fn run_ground_truth<E: StageExecutor>(
    runner: &mut PipelineRunner<E>,
    toolchain: &Toolchain,
    kind: HarnessKind,
    source: &str,
    options: &RunOptions<'_>,
) -> HarnessResult<RunReport> {
    let pipeline = Pipeline::ground_truth(toolchain)?;
    let unit = ground_truth_unit(kind, source)?;
    runner.run(&pipeline, &unit, options)
}
