// This module defines the error taxonomy for the harness using the thiserror crate.
// HarnessError covers every way a run can stop: command-line misuse, an unknown harness
// selector, a template without its substitution marker, a statically malformed pipeline,
// an external tool that exited non-zero, a tool that could not be launched at all, and
// filesystem failures around the scoped work directory. Every variant is fail-stop; none
// is retried. StageFailed carries the stage index, its name and the tool's exit code so
// a caller can tell "my source does not compile" from "the linker failed" from "the
// simulated program crashed". HarnessResult<T> is the convenience alias.

//! Error types for the harness.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for harness runs.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("{0}")]
    Usage(String),

    #[error("Unknown harness kind: {0} (expected --twoints, --array, --stepper or --stdin)")]
    UnknownHarnessKind(String),

    #[error("Harness template has no substitution marker")]
    TemplateMarkerMissing,

    #[error("Invalid pipeline at stage {stage}: {reason}")]
    InvalidPipeline {
        stage: usize,
        reason: String,
    },

    #[error("Stage {stage} ({name}) failed with exit code {code}")]
    StageFailed {
        stage: usize,
        name: &'static str,
        code: i32,
    },

    #[error("Stage {stage} could not launch {program}: {source}")]
    Spawn {
        stage: usize,
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to {context} {}: {source}", path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl HarnessError {
    /// Process exit status a front-end should use for this error.
    ///
    /// A failed stage propagates the tool's own code; everything else is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            HarnessError::StageFailed { code, .. } if *code != 0 => *code,
            _ => 1,
        }
    }

    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        HarnessError::Io {
            context,
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;
