// This module collects the infrastructure every harness run shares, independent of which
// harness kind or pipeline is in play: the error taxonomy (fail-stop, carrying the failing
// stage index and the external tool's exit code), the toolchain description (paths of the
// compiler, assembler, linker, relocator, simulator front-ends and native compiler, plus
// the compile mode), and the scoped work directory that names every artifact of a run by
// fixed convention and removes them when the run ends.

//! Core harness infrastructure.
//!
//! ## Errors (`error`)
//! - `HarnessError` / `HarnessResult` built on `thiserror`
//!
//! ## Toolchain (`toolchain`)
//! - External tool paths with course defaults
//! - `CompileMode` backend selection
//!
//! ## Work directory (`workdir`)
//! - Fixed artifact names (`unit.c`, `output.asm`, ..., `final.mips`)
//! - Scoped `tempfile` directory or a kept directory for inspection

pub mod error;
pub mod toolchain;
pub mod workdir;

pub use error::{HarnessError, HarnessResult};
pub use toolchain::{CompileMode, HarnessRunners, Toolchain};
pub use workdir::{Artifact, WorkDir};
