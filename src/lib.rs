//! layercomp composes a stack of layers (raster images and text annotations) into one image file.
//!
//! Pixel work is delegated to ImageMagick (`convert` / `composite`) run as subprocesses; this crate
//! owns the orchestration around it.
//!
//! # Pipeline overview
//!
//! 1. **Workspace**: allocate a private temp directory and the output path inside it
//! 2. **Fetch**: resolve layer files, downloading remote URLs concurrently (fail-fast)
//! 3. **Size**: take the explicit canvas size, or the maximum size over all image layers
//! 4. **Blank**: create a transparent canvas at the output path
//! 5. **Composite**: apply each layer in stack order, mutating the output file in place
//!
//! The workspace is released on every exit path. On success it lives as long as the returned
//! [`CompositeOutput`].
//!
//! ```no_run
//! use layercomp::{Layer, ProcessingOptions, compose};
//!
//! let layers = vec![Layer::image("base.png"), Layer::text("Label")];
//! let out = compose(layers, &ProcessingOptions::default())?;
//! out.persist("labelled.png")?;
//! # Ok::<(), layercomp::LayercompError>(())
//! ```
#![forbid(unsafe_code)]

mod foundation;
mod layers;

/// Layer source resolution: classification, downloads and dimension probing.
pub mod assets;
/// Pipeline driver and canvas sizing.
pub mod pipeline;
/// Renderer command contracts, process execution and layer application.
pub mod render;
/// Scoped temporary storage for one pipeline run.
pub mod workspace;

pub use assets::fetch::{
    AssetMap, CancelToken, Downloader, FetchOpts, HttpDownloader, fetch_assets,
};
pub use assets::probe::{DimensionProbe, HeaderProbe};
pub use assets::source::{AssetSource, remote_file_name};
pub use foundation::core::{Canvas, Offset};
pub use foundation::error::{LayercompError, LayercompResult};
pub use layers::model::{
    Gravity, ImageLayer, Layer, PointSize, ProcessingOptions, ResolvedImage, ResolvedLayer,
    TextLayer, parse_layers, read_layers,
};
pub use pipeline::run::{CompositeOutput, Pipeline, PipelineOpts, compose};
pub use pipeline::sizing::derive_canvas;
pub use render::canvas::{Artifact, init_blank};
pub use render::compositor::{Compositor, CompositorOpts};
pub use render::magick::{Magick, MagickOpts};
pub use render::process::{ProcessRunner, SystemRunner, is_program_on_path};
pub use reqwest::Url;
pub use workspace::{OUTPUT_FILE_NAME, OutputSlot, Workspace, WorkspaceOpts};
