use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;

use crate::{
    assets::{
        fetch::{Downloader, FetchOpts, HttpDownloader, fetch_assets},
        probe::{DimensionProbe, HeaderProbe},
    },
    foundation::{
        core::Canvas,
        error::{LayercompError, LayercompResult},
    },
    layers::model::{Layer, ProcessingOptions},
    pipeline::sizing::derive_canvas,
    render::{
        canvas::{Artifact, init_blank},
        compositor::{Compositor, CompositorOpts},
        magick::{Magick, MagickOpts},
        process::{ProcessRunner, SystemRunner},
    },
    workspace::{Workspace, WorkspaceOpts},
};

/// Configuration for every stage of a pipeline run.
#[derive(Clone, Debug, Default)]
pub struct PipelineOpts {
    pub workspace: WorkspaceOpts,
    pub fetch: FetchOpts,
    pub magick: MagickOpts,
    pub compositor: CompositorOpts,
    /// Fail before rendering when the derived canvas has zero area instead of only warning.
    pub reject_empty_canvas: bool,
}

/// Layer compositing pipeline with pluggable collaborators.
///
/// Stages, in order:
/// 1. acquire a private [`Workspace`]
/// 2. resolve layer files, downloading remote ones concurrently
/// 3. derive the [`Canvas`]
/// 4. create the transparent base canvas
/// 5. apply layers in stack order
///
/// Every run owns its workspace, so one `Pipeline` may serve concurrent callers.
pub struct Pipeline {
    opts: PipelineOpts,
    runner: Arc<dyn ProcessRunner>,
    probe: Arc<dyn DimensionProbe>,
    downloader: Arc<dyn Downloader>,
}

impl Pipeline {
    /// Pipeline using the system renderer, header probing and HTTP downloads.
    pub fn new(opts: PipelineOpts) -> LayercompResult<Self> {
        let downloader = HttpDownloader::new(&opts.fetch)?;
        Ok(Self {
            opts,
            runner: Arc::new(SystemRunner),
            probe: Arc::new(HeaderProbe),
            downloader: Arc::new(downloader),
        })
    }

    pub fn with_runner(mut self, runner: impl ProcessRunner + 'static) -> Self {
        self.runner = Arc::new(runner);
        self
    }

    pub fn with_probe(mut self, probe: impl DimensionProbe + 'static) -> Self {
        self.probe = Arc::new(probe);
        self
    }

    pub fn with_downloader(mut self, downloader: impl Downloader + 'static) -> Self {
        self.downloader = Arc::new(downloader);
        self
    }

    pub fn opts(&self) -> &PipelineOpts {
        &self.opts
    }

    /// Run the pipeline and hand back the artifact together with its workspace.
    ///
    /// On failure the workspace is released before the error is returned. On success it lives
    /// until the returned [`CompositeOutput`] is released or dropped.
    #[tracing::instrument(skip_all, fields(layers = layers.len()))]
    pub fn compose(
        &self,
        layers: Vec<Layer>,
        options: &ProcessingOptions,
    ) -> LayercompResult<CompositeOutput> {
        options.validate()?;
        let layers = options.effective_layers(layers);
        if layers.is_empty() {
            return Err(LayercompError::validation(
                "layer stack must contain at least one layer",
            ));
        }

        let mut workspace = Workspace::acquire(&self.opts.workspace)?;
        let artifact = self.run_stages(&mut workspace, &layers, options)?;
        tracing::info!(
            out = %artifact.path().display(),
            width = artifact.canvas().width,
            height = artifact.canvas().height,
            applied = artifact.layers_applied(),
            "composited layers"
        );

        Ok(CompositeOutput {
            canvas: artifact.canvas(),
            layers_applied: artifact.layers_applied(),
            path: artifact.into_path(),
            workspace,
        })
    }

    /// Run the pipeline, let `consume` read the artifact, then release the workspace.
    ///
    /// The workspace is released on every path, including failures inside `consume`.
    pub fn compose_scoped<T>(
        &self,
        layers: Vec<Layer>,
        options: &ProcessingOptions,
        consume: impl FnOnce(&Path) -> LayercompResult<T>,
    ) -> LayercompResult<T> {
        let output = self.compose(layers, options)?;
        let result = consume(output.path());
        output.release()?;
        result
    }

    fn run_stages(
        &self,
        workspace: &mut Workspace,
        layers: &[Layer],
        options: &ProcessingOptions,
    ) -> LayercompResult<Artifact> {
        let assets = fetch_assets(
            layers,
            workspace.directory(),
            self.downloader.as_ref(),
            &self.opts.fetch,
        )?;
        let resolved = assets.resolve(layers);

        let canvas = derive_canvas(&resolved, options, self.probe.as_ref())?;
        if canvas.is_degenerate() {
            if self.opts.reject_empty_canvas {
                return Err(LayercompError::validation(format!(
                    "derived canvas is {}; give an explicit size or at least one image layer",
                    canvas.geometry()
                )));
            }
            tracing::warn!(
                ?canvas,
                "canvas has zero area; no image layer and no explicit size was given"
            );
        }

        let magick = Magick::new(&self.opts.magick, self.runner.as_ref());
        let artifact = init_blank(workspace.take_output_slot()?, canvas, &magick)?;
        Compositor::new(magick, self.opts.compositor).apply(artifact, &resolved)
    }
}

/// Final artifact of a successful run. Dropping it removes the workspace and the file.
#[derive(Debug)]
pub struct CompositeOutput {
    path: PathBuf,
    canvas: Canvas,
    layers_applied: usize,
    workspace: Workspace,
}

impl CompositeOutput {
    /// Artifact location inside the workspace.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn layers_applied(&self) -> usize {
        self.layers_applied
    }

    /// Copy the artifact to `dest`, creating parent directories as needed.
    pub fn persist(&self, dest: impl AsRef<Path>) -> LayercompResult<u64> {
        let dest = dest.as_ref();
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
        }
        let bytes = std::fs::copy(&self.path, dest).with_context(|| {
            format!(
                "failed to copy '{}' to '{}'",
                self.path.display(),
                dest.display()
            )
        })?;
        Ok(bytes)
    }

    /// Read the artifact into memory.
    pub fn read_bytes(&self) -> LayercompResult<Vec<u8>> {
        let bytes = std::fs::read(&self.path)
            .with_context(|| format!("failed to read '{}'", self.path.display()))?;
        Ok(bytes)
    }

    /// Release the workspace now, reporting any cleanup failure.
    pub fn release(mut self) -> LayercompResult<()> {
        self.workspace.release()
    }
}

/// Compose `layers` with default settings and collaborators.
pub fn compose(layers: Vec<Layer>, options: &ProcessingOptions) -> LayercompResult<CompositeOutput> {
    Pipeline::new(PipelineOpts::default())?.compose(layers, options)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/run.rs"]
mod tests;
