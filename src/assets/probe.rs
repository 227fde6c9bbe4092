use std::path::Path;

use crate::foundation::{
    core::Canvas,
    error::{LayercompError, LayercompResult},
};

/// Reads the intrinsic pixel size of an image file.
pub trait DimensionProbe: Send + Sync {
    fn dimensions(&self, path: &Path) -> LayercompResult<Canvas>;
}

/// [`DimensionProbe`] that sniffs the format and reads only the image header.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeaderProbe;

impl DimensionProbe for HeaderProbe {
    fn dimensions(&self, path: &Path) -> LayercompResult<Canvas> {
        let probe_err = |reason: String| LayercompError::probe(path.display().to_string(), reason);

        let reader = image::ImageReader::open(path)
            .map_err(|e| probe_err(e.to_string()))?
            .with_guessed_format()
            .map_err(|e| probe_err(e.to_string()))?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| probe_err(e.to_string()))?;
        Ok(Canvas::new(width, height))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/probe.rs"]
mod tests;
