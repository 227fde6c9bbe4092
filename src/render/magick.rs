//! ImageMagick command contracts used by the canvas initializer and the compositor.
//!
//! Argument order is part of the contract: every operation reads and writes the same output file,
//! so the last two path arguments of the in-place operations are identical.

use std::{ffi::OsString, path::Path};

use crate::{
    foundation::{
        core::{Canvas, Offset},
        error::LayercompResult,
    },
    layers::model::TextLayer,
    render::process::ProcessRunner,
};

/// Program names for the two ImageMagick entry points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MagickOpts {
    /// Program used for canvas creation and text annotation.
    pub convert: String,
    /// Program used for image overlay.
    pub composite: String,
}

impl Default for MagickOpts {
    fn default() -> Self {
        Self {
            convert: "convert".to_string(),
            composite: "composite".to_string(),
        }
    }
}

/// Issues renderer operations through a [`ProcessRunner`].
pub struct Magick<'a> {
    opts: &'a MagickOpts,
    runner: &'a dyn ProcessRunner,
}

impl<'a> Magick<'a> {
    pub fn new(opts: &'a MagickOpts, runner: &'a dyn ProcessRunner) -> Self {
        Self { opts, runner }
    }

    /// Create a fully transparent canvas at `out`, replacing any prior content.
    pub fn create_blank(&self, out: &Path, canvas: Canvas) -> LayercompResult<()> {
        self.runner.run(&self.opts.convert, &blank_args(out, canvas))
    }

    /// Stamp `layer` onto `out` in place.
    pub fn annotate(&self, out: &Path, canvas: Canvas, layer: &TextLayer) -> LayercompResult<()> {
        self.runner
            .run(&self.opts.convert, &annotate_args(out, canvas, layer))
    }

    /// Composite `source` centered and displaced by `offset` over `out`, in place.
    pub fn overlay(&self, out: &Path, source: &Path, offset: Offset) -> LayercompResult<()> {
        self.runner
            .run(&self.opts.composite, &overlay_args(out, source, offset))
    }
}

pub(crate) fn blank_args(out: &Path, canvas: Canvas) -> Vec<OsString> {
    vec![
        "-size".into(),
        canvas.geometry().into(),
        "xc:none".into(),
        out.into(),
    ]
}

pub(crate) fn annotate_args(out: &Path, canvas: Canvas, layer: &TextLayer) -> Vec<OsString> {
    let mut args = Vec::<OsString>::with_capacity(12);
    if let Some(font) = &layer.font {
        args.push("-font".into());
        args.push(font.into());
    }
    if let Some(size) = layer.pointsize.and_then(|p| p.to_arg(canvas.height)) {
        args.push("-pointsize".into());
        args.push(size.into());
    }
    args.push("-gravity".into());
    args.push(layer.gravity.as_str().into());
    args.push("-annotate".into());
    args.push(layer.offset().to_string().into());
    args.push((&layer.text).into());
    args.push("-fill".into());
    args.push((&layer.color).into());
    args.push(out.into());
    args.push(out.into());
    args
}

pub(crate) fn overlay_args(out: &Path, source: &Path, offset: Offset) -> Vec<OsString> {
    vec![
        "-gravity".into(),
        "center".into(),
        "-geometry".into(),
        offset.to_string().into(),
        source.into(),
        out.into(),
        out.into(),
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/render/magick.rs"]
mod tests;
