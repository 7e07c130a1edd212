//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::fs;
use std::io;
use std::path::PathBuf;
use wlp_harness::pipeline::{Invocation, StageOutcome, StdinBinding, StdoutBinding};
use wlp_harness::StageExecutor;

/// Records every invocation instead of launching it.
#[derive(Debug, Default)]
pub struct SpyExecutor {
    pub launched: Vec<Invocation>,
    /// Stage index and exit code to fail with.
    pub fail_at: Option<(usize, i32)>,
    /// Returned as stdout when the stage's output is captured.
    pub captured_stdout: Vec<u8>,
    /// Contents of every file-bound stdin, read at launch time.
    pub stdin_contents: Vec<Option<String>>,
    /// Directory holding the first resolved artifact of the run.
    pub workdir: Option<PathBuf>,
}

impl SpyExecutor {
    pub fn failing_at(stage: usize, code: i32) -> Self {
        Self {
            fail_at: Some((stage, code)),
            ..Self::default()
        }
    }

    pub fn with_stdout(stdout: &str) -> Self {
        Self {
            captured_stdout: stdout.as_bytes().to_vec(),
            ..Self::default()
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.launched.iter().map(|inv| inv.name).collect()
    }
}

impl StageExecutor for SpyExecutor {
    fn execute(&mut self, invocation: &Invocation) -> io::Result<StageOutcome> {
        if self.workdir.is_none() {
            if let StdoutBinding::File(path) = &invocation.stdout {
                self.workdir = path.parent().map(PathBuf::from);
            }
        }
        let stdin = match &invocation.stdin {
            StdinBinding::File(path) => fs::read_to_string(path).ok(),
            _ => None,
        };
        self.stdin_contents.push(stdin);
        self.launched.push(invocation.clone());

        let code = match self.fail_at {
            Some((stage, code)) if stage == invocation.stage => code,
            _ => 0,
        };
        let captured = invocation.stdout == StdoutBinding::Capture;
        Ok(StageOutcome {
            stdout: captured.then(|| self.captured_stdout.clone()),
            stderr: captured.then(Vec::new),
            ..StageOutcome::exited(code)
        })
    }
}

pub const IDENTITY_WAIN: &str = "int wain(int a, int b) {\n  return a;\n}\n";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
