//! External toolchain configuration.
//!
//! Every collaborator the harness drives is named here by path. Defaults
//! match the course setup (compiler built into `build/`, the `cs241.*`
//! tools on `PATH`, runtime modules under `references/`); the front-ends
//! override them from flags or `WLP_*` environment variables.

use crate::harness::HarnessKind;
use std::fmt;
use std::path::PathBuf;

/// Code-generation backend of the external compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CompileMode {
    /// Straight-line code generation, no optimization passes.
    Naive,
    /// Full optimizing backend.
    #[default]
    Optimized,
}

impl CompileMode {
    /// Compiler flag selecting this backend.
    pub fn flag(self) -> &'static str {
        match self {
            CompileMode::Naive => "--emit-naive-mips",
            CompileMode::Optimized => "--emit-mips",
        }
    }
}

impl fmt::Display for CompileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileMode::Naive => write!(f, "naive"),
            CompileMode::Optimized => write!(f, "optimized"),
        }
    }
}

/// Simulator front-end per harness kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessRunners {
    pub twoints: PathBuf,
    pub array: PathBuf,
    pub stepper: PathBuf,
    pub stdin: PathBuf,
}

impl Default for HarnessRunners {
    fn default() -> Self {
        Self {
            twoints: "mips.twoints".into(),
            array: "mips.array".into(),
            stepper: "mips.stepper_twoints".into(),
            stdin: "mips.stdin".into(),
        }
    }
}

/// Paths of every external tool a run may invoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// Source-to-assembly compiler.
    pub compiler: PathBuf,
    /// Assembler producing a relocatable object from stdin.
    pub assembler: PathBuf,
    /// Linker combining the user object with the runtime modules.
    pub linker: PathBuf,
    /// Relocator turning the linked object into a loadable image.
    pub relocator: PathBuf,
    /// Load address passed to the relocator.
    pub load_address: String,
    /// Runtime-support objects linked after the user object (print, alloc).
    pub runtime_modules: Vec<PathBuf>,
    pub runners: HarnessRunners,
    /// Native C++ compiler used for ground truth.
    pub native_compiler: PathBuf,
}

impl Toolchain {
    /// Simulator front-end that drives the given harness kind.
    pub fn runner(&self, kind: HarnessKind) -> &PathBuf {
        match kind {
            HarnessKind::TwoInts => &self.runners.twoints,
            HarnessKind::Array => &self.runners.array,
            HarnessKind::Stepper => &self.runners.stepper,
            HarnessKind::Stdin => &self.runners.stdin,
        }
    }
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            compiler: "build/compiler_cpp".into(),
            assembler: "cs241.linkasm".into(),
            linker: "cs241.linker".into(),
            relocator: "cs241.merl".into(),
            load_address: "0".into(),
            runtime_modules: vec![
                "references/print.merl".into(),
                "references/alloc.merl".into(),
            ],
            runners: HarnessRunners::default(),
            native_compiler: "g++".into(),
        }
    }
}
