//! wlp-harness - run and test harness for the WLP4 course toolchain.
//!
//! Drives a source program through the external compile → assemble → link
//! → relocate → simulate tools, or through a native C++ compiler for
//! ground-truth output, wrapped in one of four I/O harness shapes.
//!
//! # Primary Usage
//!
//! ```ignore
//! use wlp_harness::{run_simulated, CompileMode, HarnessKind, PipelineRunner};
//! use wlp_harness::{ProcessExecutor, RunOptions, Toolchain};
//!
//! let mut runner = PipelineRunner::new(ProcessExecutor);
//! let report = run_simulated(
//!     &mut runner,
//!     &Toolchain::default(),
//!     CompileMode::Optimized,
//!     HarnessKind::TwoInts,
//!     &source,
//!     &RunOptions::default(),
//! )?;
//! ```
//!
//! # Architecture
//!
//! - [`harness`] - Harness descriptors, templates and source injection
//! - [`pipeline`] - Stage descriptions and the fail-stop runner
//! - [`simulated`] - Course toolchain mode
//! - [`ground_truth`] - Native reference mode
//! - [`differential`] - Trailer comparison between the two
//! - [`core`] - Errors, toolchain paths, scoped work directory
//! - [`cli`] - Front-ends behind the `wlp-*` binaries

pub mod cli;
pub mod core;
pub mod differential;
pub mod ground_truth;
pub mod harness;
pub mod pipeline;
pub mod simulated;

pub use self::core::{Artifact, CompileMode, HarnessError, HarnessResult, Toolchain, WorkDir};
pub use differential::{compare, extract_trailer, Verdict};
pub use ground_truth::run_ground_truth;
pub use harness::{inject, HarnessKind, HarnessTemplate, TranslationUnit};
pub use pipeline::{
    Pipeline, PipelineRunner, PipelineStage, ProcessExecutor, RunOptions, RunReport,
    StageExecutor,
};
pub use simulated::run_simulated;
