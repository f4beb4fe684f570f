//! Working directory the toolchain runs in.
//!
//! GHDL is only ever shown sandboxed names: rewritten sources are written
//! as `src<N>.vhd` and data files the testbench reads are copied in under
//! their `src<N>_in<K>` names. Files the testbench writes are copied back
//! to their original paths after the run.

use std::fs;
use std::path::{Path, PathBuf};

use ggfront_syntax::text::write_latin1;
use ggfront_syntax::{DataFile, SourceAnalysis};
use tracing::debug;

use crate::error::StageError;

/// Name of the trace GHDL is asked to write.
pub const TRACE_FILE: &str = "wave.vcd";

/// Sandboxed working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workdir {
    root: PathBuf,
}

impl Workdir {
    /// Working directory at `root`. Nothing is touched until
    /// [`Self::prepare`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Where GHDL writes the trace.
    #[must_use]
    pub fn trace_path(&self) -> PathBuf {
        self.root.join(TRACE_FILE)
    }

    /// Create the directory, or delete the files left by a previous run.
    pub fn prepare(&self) -> Result<(), StageError> {
        let prepare_err = |source: std::io::Error| StageError::Prepare {
            path: self.root.clone(),
            source,
        };
        fs::create_dir_all(&self.root).map_err(prepare_err)?;
        for entry in fs::read_dir(&self.root).map_err(prepare_err)? {
            let path = entry.map_err(prepare_err)?.path();
            if path.is_file() {
                fs::remove_file(&path).map_err(prepare_err)?;
            }
        }
        debug!("working directory {} ready", self.root.display());
        Ok(())
    }

    /// Write a rewritten source and copy in the data files it reads.
    /// Only data files opened from the top module's subtree are copied.
    pub fn stage(&self, analysis: &SourceAnalysis) -> Result<(), StageError> {
        let file = &analysis.file;
        write_latin1(self.root.join(file.internal.as_str()), &file.content).map_err(|source| {
            StageError::WriteSource {
                internal: file.internal.clone(),
                source,
            }
        })?;
        for data in analysis.in_files.iter().filter(|data| data.referenced) {
            let dest = self.root.join(data.internal.as_str());
            fs::copy(&data.original, &dest).map_err(|source| copy_error(analysis, data, source))?;
            debug!("staged {} as {}", data.original.display(), data.internal);
        }
        Ok(())
    }

    /// Copy the data files written by the simulation back to their
    /// original paths, replacing existing files.
    pub fn collect(&self, analysis: &SourceAnalysis) -> Result<(), StageError> {
        for data in analysis.out_files.iter().filter(|data| data.referenced) {
            let produced = self.root.join(data.internal.as_str());
            fs::copy(&produced, &data.original)
                .map_err(|source| copy_error(analysis, data, source))?;
            debug!("collected {} into {}", data.internal, data.original.display());
        }
        Ok(())
    }
}

fn copy_error(analysis: &SourceAnalysis, data: &DataFile, source: std::io::Error) -> StageError {
    StageError::CopyData {
        opened_by: file_name(&analysis.file.original),
        file_name: file_name(&data.original),
        source,
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}
