//! Scoped, exclusively-owned temporary storage for one pipeline run.

use std::path::{Path, PathBuf};

use crate::foundation::error::{LayercompError, LayercompResult};

/// File name of the composited artifact inside every workspace.
pub const OUTPUT_FILE_NAME: &str = "temp.png";

/// Where workspaces are allocated.
#[derive(Clone, Debug, Default)]
pub struct WorkspaceOpts {
    /// Parent directory for workspaces. `None` uses the system temp directory.
    pub root: Option<PathBuf>,
}

/// Private temporary directory plus the canonical output path inside it.
///
/// The directory is removed by [`Workspace::release`] or, failing that, when the value is dropped,
/// so every exit path of a pipeline run releases it exactly once.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<tempfile::TempDir>,
    directory: PathBuf,
    output: PathBuf,
    slot_taken: bool,
}

impl Workspace {
    /// Allocate a fresh workspace.
    #[tracing::instrument(skip(opts))]
    pub fn acquire(opts: &WorkspaceOpts) -> LayercompResult<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("layercomp-");
        let dir = match &opts.root {
            Some(root) => {
                std::fs::create_dir_all(root).map_err(|e| {
                    LayercompError::workspace(format!(
                        "failed to create workspace root '{}': {e}",
                        root.display()
                    ))
                })?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
        .map_err(|e| LayercompError::workspace(format!("failed to create temp directory: {e}")))?;

        let directory = dir.path().to_path_buf();
        let output = directory.join(OUTPUT_FILE_NAME);
        tracing::debug!(dir = %directory.display(), "workspace acquired");

        Ok(Self {
            dir: Some(dir),
            directory,
            output,
            slot_taken: false,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Canonical artifact path. The file does not exist until the canvas is initialized.
    pub fn output_path(&self) -> &Path {
        &self.output
    }

    pub fn is_released(&self) -> bool {
        self.dir.is_none()
    }

    /// Hand out the single write handle for the output file.
    pub fn take_output_slot(&mut self) -> LayercompResult<OutputSlot> {
        if self.is_released() {
            return Err(LayercompError::workspace("workspace already released"));
        }
        if self.slot_taken {
            return Err(LayercompError::workspace(
                "workspace output slot already taken",
            ));
        }
        self.slot_taken = true;
        Ok(OutputSlot {
            path: self.output.clone(),
        })
    }

    /// Remove the directory and everything in it. Calling this again is a no-op.
    pub fn release(&mut self) -> LayercompResult<()> {
        let Some(dir) = self.dir.take() else {
            return Ok(());
        };
        dir.close().map_err(|e| {
            LayercompError::workspace(format!(
                "failed to remove workspace '{}': {e}",
                self.directory.display()
            ))
        })?;
        tracing::debug!(dir = %self.directory.display(), "workspace released");
        Ok(())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!("{e}");
        }
    }
}

/// Exclusive right to create the workspace's output file.
#[derive(Debug)]
pub struct OutputSlot {
    path: PathBuf,
}

impl OutputSlot {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn into_path(self) -> PathBuf {
        self.path
    }
}

#[cfg(test)]
#[path = "../tests/unit/workspace.rs"]
mod tests;
