//! Scoped per-run work directory.
//!
//! Every run owns one directory holding its source unit, intermediates and
//! final binary, named by fixed convention. The default directory is a
//! `tempfile::TempDir`, removed when the `WorkDir` drops, on success and on
//! stage failure alike. A persistent directory can be requested to keep the
//! intermediates around for inspection.

use crate::core::error::{HarnessError, HarnessResult};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A file produced or consumed by a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    /// Injected translation unit.
    Source,
    /// Compiler output.
    Assembly,
    /// Assembler output.
    Object,
    /// Linker output.
    Linked,
    /// Relocated image loaded by the simulator.
    Binary,
    /// Executable produced by the native compiler.
    NativeBinary,
}

impl Artifact {
    /// Fixed file name inside the work directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Artifact::Source => "unit.c",
            Artifact::Assembly => "output.asm",
            Artifact::Object => "output.merl",
            Artifact::Linked => "linked.merl",
            Artifact::Binary => "final.mips",
            Artifact::NativeBinary => "a.out",
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

enum Location {
    Scoped(TempDir),
    Kept(PathBuf),
}

/// Directory holding one run's artifacts.
pub struct WorkDir {
    location: Location,
}

impl WorkDir {
    /// Create a fresh scoped directory, removed on drop.
    pub fn scoped() -> HarnessResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix("wlp-run-")
            .tempdir()
            .map_err(|e| HarnessError::io("create work directory in", std::env::temp_dir(), e))?;
        log::trace!("Created scoped work directory {}", dir.path().display());
        Ok(Self {
            location: Location::Scoped(dir),
        })
    }

    /// Use (and create if needed) a directory that outlives the run.
    pub fn kept(path: impl Into<PathBuf>) -> HarnessResult<Self> {
        let path = path.into();
        fs::create_dir_all(&path).map_err(|e| HarnessError::io("create work directory", &path, e))?;
        log::trace!("Using kept work directory {}", path.display());
        Ok(Self {
            location: Location::Kept(path),
        })
    }

    pub fn path(&self) -> &Path {
        match &self.location {
            Location::Scoped(dir) => dir.path(),
            Location::Kept(path) => path,
        }
    }

    /// Location of an artifact in this directory.
    pub fn artifact(&self, artifact: Artifact) -> PathBuf {
        self.path().join(artifact.file_name())
    }

    /// Write `contents` as the given artifact.
    pub fn write(&self, artifact: Artifact, contents: &str) -> HarnessResult<PathBuf> {
        let path = self.artifact(artifact);
        fs::write(&path, contents).map_err(|e| HarnessError::io("write", &path, e))?;
        log::trace!("Materialized {} ({} bytes)", path.display(), contents.len());
        Ok(path)
    }

    pub fn is_scoped(&self) -> bool {
        matches!(self.location, Location::Scoped(_))
    }
}

impl fmt::Debug for WorkDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkDir")
            .field("path", &self.path())
            .field("scoped", &self.is_scoped())
            .finish()
    }
}
