//! Differential testing between the simulated pipeline and ground truth.
//!
//! Both pipelines run on the same source and the same input file with their
//! output captured; the verdict compares the values `wain` returned.

use crate::core::error::{HarnessError, HarnessResult};
use crate::core::toolchain::{CompileMode, Toolchain};
use crate::ground_truth::run_ground_truth;
use crate::harness::{HarnessKind, TRAILER_PREFIX};
use crate::pipeline::{Observe, PipelineRunner, RunOptions, RunReport, StageExecutor};
use crate::simulated::run_simulated;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

/// Register holding `wain`'s return value in the simulator's dump.
const RETURN_REGISTER: &str = "$03 = 0x";

/// Which pipeline produced an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Simulated,
    GroundTruth,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Simulated => f.write_str("simulated"),
            Side::GroundTruth => f.write_str("ground truth"),
        }
    }
}

/// Value `wain` returned, read from a run's output.
///
/// The last `wain returned <n>` line on stdout wins. Simulator front-ends
/// that only dump registers on stderr are read from `$03` instead, as a
/// signed 32-bit word.
pub fn extract_trailer(stdout: &str, stderr: &str) -> Option<i64> {
    let from_stdout = stdout
        .lines()
        .rev()
        .find_map(|line| line.trim().strip_prefix(TRAILER_PREFIX))
        .and_then(|value| value.trim().parse::<i64>().ok());
    if from_stdout.is_some() {
        return from_stdout;
    }

    let start = stderr.rfind(RETURN_REGISTER)? + RETURN_REGISTER.len();
    let digits = stderr.get(start..start + 8)?;
    let word = u32::from_str_radix(digits, 16).ok()?;
    Some(i64::from(word as i32))
}

fn report_trailer(report: &RunReport) -> Option<i64> {
    extract_trailer(&report.stdout_text(), &report.stderr_text())
}

/// Result of comparing one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Match(i64),
    Mismatch { expected: i64, actual: i64 },
    MissingTrailer(Side),
}

impl Verdict {
    pub fn is_match(self) -> bool {
        matches!(self, Verdict::Match(_))
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Match(value) => write!(f, "{TRAILER_PREFIX}{value}"),
            Verdict::Mismatch { expected, actual } => {
                write!(f, "ground truth returned {expected}, simulated returned {actual}")
            }
            Verdict::MissingTrailer(side) => write!(f, "no trailer in {side} output"),
        }
    }
}

/// Everything but the source that a comparison needs.
#[derive(Debug, Clone, Copy)]
pub struct DiffRequest<'a> {
    pub toolchain: &'a Toolchain,
    pub mode: CompileMode,
    pub kind: HarnessKind,
    /// Stdin for both runs.
    pub input: &'a Path,
}

/// Run both pipelines on `source` and compare their trailers.
///
/// # Errors
///
/// Fails if either pipeline fails; a ground-truth failure is reported first.
pub fn compare<E: StageExecutor>(
    mut executor: E,
    request: &DiffRequest<'_>,
    source: &str,
) -> HarnessResult<Verdict> {
    let options = RunOptions {
        input: Some(request.input),
        observe: Observe::Capture,
        keep_artifacts: None,
    };

    let expected = run_ground_truth(
        &mut PipelineRunner::new(&mut executor),
        request.toolchain,
        request.kind,
        source,
        &options,
    )?;
    let actual = run_simulated(
        &mut PipelineRunner::new(&mut executor),
        request.toolchain,
        request.mode,
        request.kind,
        source,
        &options,
    )?;

    let verdict = match (report_trailer(&expected), report_trailer(&actual)) {
        (None, _) => Verdict::MissingTrailer(Side::GroundTruth),
        (_, None) => Verdict::MissingTrailer(Side::Simulated),
        (Some(expected), Some(actual)) if expected == actual => Verdict::Match(expected),
        (Some(expected), Some(actual)) => Verdict::Mismatch { expected, actual },
    };
    if !verdict.is_match() {
        log::warn!("Differential mismatch for {} harness: {verdict}", request.kind);
    }
    Ok(verdict)
}

/// Verdict for one source file of a batch.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub result: HarnessResult<Verdict>,
}

impl FileReport {
    pub fn passed(&self) -> bool {
        matches!(&self.result, Ok(verdict) if verdict.is_match())
    }
}

/// Compare every file in `files`, spreading them over up to `jobs` threads.
///
/// Each comparison owns its executor and work directories, so runs never
/// share state. Reports come back in input order.
pub fn compare_files<E, F>(
    make_executor: F,
    request: &DiffRequest<'_>,
    files: &[PathBuf],
    jobs: usize,
) -> Vec<FileReport>
where
    E: StageExecutor,
    F: Fn() -> E + Sync,
{
    if files.is_empty() {
        return Vec::new();
    }
    let chunk_size = files.len().div_ceil(jobs.max(1));

    let compare_file = |path: &PathBuf| {
        let result = fs::read_to_string(path)
            .map_err(|e| HarnessError::io("read source", path, e))
            .and_then(|source| compare(make_executor(), request, &source));
        FileReport {
            path: path.clone(),
            result,
        }
    };

    thread::scope(|scope| {
        let handles: Vec<_> = files
            .chunks(chunk_size)
            .map(|chunk| scope.spawn(move || chunk.iter().map(compare_file).collect::<Vec<_>>()))
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailer_from_stdout() {
        assert_eq!(extract_trailer("1\n2\nwain returned 5\n", ""), Some(5));
        assert_eq!(extract_trailer("wain returned -12", ""), Some(-12));
        assert_eq!(
            extract_trailer("wain returned 1\nwain returned 2\n", ""),
            Some(2)
        );
        assert_eq!(extract_trailer("3\n4\n", ""), None);
        assert_eq!(extract_trailer("wain returned x\n", ""), None);
    }

    #[test]
    fn test_trailer_from_register_dump() {
        let dump = "Running MIPS program.\n\
                    $01 = 0x00000005   $02 = 0x00000007   $03 = 0x0000000c   $04 = 0x00000000\n";
        assert_eq!(extract_trailer("", dump), Some(12));
        let negative = "$03 = 0xffffffff   $04 = 0x00000000";
        assert_eq!(extract_trailer("", negative), Some(-1));
        assert_eq!(extract_trailer("", "$03 = 0x12"), None);
    }

    #[test]
    fn test_stdout_trailer_preferred() {
        assert_eq!(
            extract_trailer("wain returned 4\n", "$03 = 0x00000009"),
            Some(4)
        );
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(Verdict::Match(5).to_string(), "wain returned 5");
        assert_eq!(
            Verdict::Mismatch {
                expected: 5,
                actual: 7
            }
            .to_string(),
            "ground truth returned 5, simulated returned 7"
        );
        assert_eq!(
            Verdict::MissingTrailer(Side::Simulated).to_string(),
            "no trailer in simulated output"
        );
    }
}
