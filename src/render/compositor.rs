use crate::{
    foundation::error::{LayercompError, LayercompResult},
    layers::model::ResolvedLayer,
    render::{canvas::Artifact, magick::Magick},
};

/// Compositor policy knobs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompositorOpts {
    /// Reject layers of unrecognized kind instead of skipping them.
    ///
    /// Off by default: unknown kinds have always been silently skipped and existing layer
    /// documents rely on that.
    pub strict_kinds: bool,
}

/// Applies layers to the artifact strictly in stack order.
pub struct Compositor<'a> {
    magick: Magick<'a>,
    opts: CompositorOpts,
}

impl<'a> Compositor<'a> {
    pub fn new(magick: Magick<'a>, opts: CompositorOpts) -> Self {
        Self { magick, opts }
    }

    /// Apply every layer in order. The first failure aborts the rest; layers already applied stay
    /// in the file.
    #[tracing::instrument(skip_all, fields(layers = layers.len()))]
    pub fn apply(&self, artifact: Artifact, layers: &[ResolvedLayer]) -> LayercompResult<Artifact> {
        let mut artifact = artifact;
        for (index, layer) in layers.iter().enumerate() {
            artifact = self.apply_layer(artifact, index, layer)?;
        }
        Ok(artifact)
    }

    fn apply_layer(
        &self,
        artifact: Artifact,
        index: usize,
        layer: &ResolvedLayer,
    ) -> LayercompResult<Artifact> {
        match layer {
            ResolvedLayer::Text(text) => {
                tracing::debug!(index, text = %text.text, "annotating");
                self.magick
                    .annotate(artifact.path(), artifact.canvas(), text)?;
                Ok(artifact.record_layer())
            }
            ResolvedLayer::Image(image) => {
                let Some(source) = image.file.as_deref() else {
                    return Err(LayercompError::MissingSource { index });
                };
                tracing::debug!(index, source = %source.display(), "overlaying");
                self.magick
                    .overlay(artifact.path(), source, image.offset)?;
                Ok(artifact.record_layer())
            }
            ResolvedLayer::Unknown if self.opts.strict_kinds => Err(LayercompError::validation(
                format!("layer #{index} has an unrecognized type"),
            )),
            ResolvedLayer::Unknown => {
                tracing::debug!(index, "skipping layer of unrecognized type");
                Ok(artifact)
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
