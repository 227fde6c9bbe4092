use std::path::{Path, PathBuf};

use crate::{
    foundation::{core::Canvas, error::LayercompResult},
    render::magick::Magick,
    workspace::OutputSlot,
};

/// The output file of a pipeline run, passed by value from stage to stage.
///
/// Only [`init_blank`] creates one, and every compositor step consumes and returns it, so the file
/// never has two writers.
#[derive(Debug)]
pub struct Artifact {
    path: PathBuf,
    canvas: Canvas,
    layers_applied: usize,
}

impl Artifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Number of layers rendered into the file so far (skipped kinds excluded).
    pub fn layers_applied(&self) -> usize {
        self.layers_applied
    }

    pub(crate) fn record_layer(mut self) -> Self {
        self.layers_applied += 1;
        self
    }

    pub(crate) fn into_path(self) -> PathBuf {
        self.path
    }
}

/// Create the transparent base canvas. This is the first write to the output file.
#[tracing::instrument(skip(slot, magick), fields(out = %slot.path().display()))]
pub fn init_blank(slot: OutputSlot, canvas: Canvas, magick: &Magick<'_>) -> LayercompResult<Artifact> {
    magick.create_blank(slot.path(), canvas)?;
    Ok(Artifact {
        path: slot.into_path(),
        canvas,
        layers_applied: 0,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/canvas.rs"]
mod tests;
