use crate::{
    assets::probe::DimensionProbe,
    foundation::{core::Canvas, error::LayercompResult},
    layers::model::{ProcessingOptions, ResolvedLayer},
};

/// Determine the canvas size for a resolved stack.
///
/// Explicit dimensions in `options` win without touching the probe. Otherwise the canvas is the
/// component-wise maximum over every image layer that has a file; text and unknown layers never
/// contribute. A stack without such layers yields a zero-sized canvas.
#[tracing::instrument(skip_all, fields(layers = layers.len()))]
pub fn derive_canvas(
    layers: &[ResolvedLayer],
    options: &ProcessingOptions,
    probe: &dyn DimensionProbe,
) -> LayercompResult<Canvas> {
    if let Some(canvas) = options.explicit_canvas() {
        tracing::debug!(?canvas, "using explicit canvas size");
        return Ok(canvas);
    }

    let mut canvas = Canvas::default();
    for path in layers.iter().filter_map(ResolvedLayer::image_file) {
        let size = probe.dimensions(path)?;
        tracing::debug!(path = %path.display(), ?size, "probed");
        canvas = canvas.union(size);
    }
    Ok(canvas)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/sizing.rs"]
mod tests;
