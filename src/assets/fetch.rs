use std::{
    collections::{BTreeMap, HashSet},
    fs::File,
    io::Write as _,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use rayon::prelude::*;
use reqwest::Url;
use tokio_util::sync::CancellationToken;

use crate::{
    assets::source::{AssetSource, remote_file_name},
    foundation::error::{LayercompError, LayercompResult},
    layers::model::{Layer, ResolvedImage, ResolvedLayer},
    workspace::OUTPUT_FILE_NAME,
};

/// Download settings.
#[derive(Clone, Debug)]
pub struct FetchOpts {
    /// Maximum number of simultaneous downloads. Must be >= 1.
    pub concurrency: usize,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for FetchOpts {
    fn default() -> Self {
        Self {
            concurrency: 8,
            timeout: Some(Duration::from_secs(60)),
            user_agent: concat!("layercomp/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Shared signal that tells in-flight downloads to stop.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(CancellationToken);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }

    /// Completes once [`cancel`](Self::cancel) has been called on any clone.
    pub async fn cancelled(&self) {
        self.0.cancelled().await
    }
}

/// Retrieves one remote resource into a local file.
///
/// Implementations should stop promptly once `cancel` fires and return
/// [`LayercompError::Cancelled`], leaving no partial file behind.
pub trait Downloader: Send + Sync {
    fn download(&self, url: &Url, dest: &Path, cancel: &CancelToken) -> LayercompResult<()>;
}

/// [`Downloader`] that streams an HTTP GET to disk.
///
/// Requests run on a small private runtime so that cancellation drops the connection, even
/// while waiting for response headers.
#[derive(Clone, Debug)]
pub struct HttpDownloader {
    client: reqwest::Client,
    runtime: Arc<tokio::runtime::Runtime>,
}

impl HttpDownloader {
    pub fn new(opts: &FetchOpts) -> LayercompResult<Self> {
        let mut builder = reqwest::Client::builder().user_agent(opts.user_agent.clone());
        if let Some(timeout) = opts.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| LayercompError::download("<client>", e.to_string()))?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("layercomp-http")
            .enable_all()
            .build()
            .map_err(|e| {
                LayercompError::Other(anyhow::anyhow!("failed to start HTTP runtime: {e}"))
            })?;
        Ok(Self {
            client,
            runtime: Arc::new(runtime),
        })
    }

    async fn fetch_to(&self, url: &Url, dest: &Path) -> LayercompResult<()> {
        let fail = |reason: String| LayercompError::download(url.as_str(), reason);

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fail(format!("HTTP {status}")));
        }

        let mut file = File::create(dest)
            .map_err(|e| fail(format!("failed to create '{}': {e}", dest.display())))?;
        while let Some(chunk) = response.chunk().await.map_err(|e| fail(e.to_string()))? {
            file.write_all(&chunk)
                .map_err(|e| fail(format!("failed to write '{}': {e}", dest.display())))?;
        }
        file.flush()
            .map_err(|e| fail(format!("failed to flush '{}': {e}", dest.display())))
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &Url, dest: &Path, cancel: &CancelToken) -> LayercompResult<()> {
        if cancel.is_cancelled() {
            return Err(LayercompError::Cancelled);
        }

        let mut guard = PartialFileGuard(Some(dest.to_path_buf()));
        let result = self.runtime.block_on(async {
            tokio::select! {
                result = self.fetch_to(url, dest) => result,
                () = cancel.cancelled() => Err(LayercompError::Cancelled),
            }
        });
        if result.is_ok() {
            guard.disarm();
        }
        result
    }
}

struct PartialFileGuard(Option<PathBuf>);

impl PartialFileGuard {
    fn disarm(&mut self) {
        self.0 = None;
    }
}

impl Drop for PartialFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Local path of every layer that references a file, keyed by the layer's stack index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetMap {
    paths: BTreeMap<usize, PathBuf>,
}

impl AssetMap {
    pub fn get(&self, index: usize) -> Option<&Path> {
        self.paths.get(&index).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Join `layers` (the same stack that was fetched) with their local paths.
    pub fn resolve(&self, layers: &[Layer]) -> Vec<ResolvedLayer> {
        layers
            .iter()
            .enumerate()
            .map(|(index, layer)| match layer {
                Layer::Text(text) => ResolvedLayer::Text(text.clone()),
                Layer::Image(image) => ResolvedLayer::Image(ResolvedImage {
                    offset: image.offset(),
                    file: self.paths.get(&index).cloned(),
                }),
                Layer::Unknown => ResolvedLayer::Unknown,
            })
            .collect()
    }
}

struct DownloadJob {
    index: usize,
    url: Url,
    dest: PathBuf,
}

/// Resolve every layer file to a local path, downloading remote ones into `directory`.
///
/// Downloads run concurrently. The first failure cancels the rest and is returned once every
/// worker has stopped.
#[tracing::instrument(skip_all, fields(layers = layers.len(), dir = %directory.display()))]
pub fn fetch_assets(
    layers: &[Layer],
    directory: &Path,
    downloader: &dyn Downloader,
    opts: &FetchOpts,
) -> LayercompResult<AssetMap> {
    let mut paths = BTreeMap::new();
    let mut jobs = Vec::new();
    let mut taken = HashSet::from([OUTPUT_FILE_NAME.to_string()]);

    for (index, layer) in layers.iter().enumerate() {
        let Some(file) = layer.file() else {
            continue;
        };
        match AssetSource::classify(file) {
            AssetSource::Local(path) => {
                paths.insert(index, path);
            }
            AssetSource::Remote(url) => {
                let name = unique_file_name(index, &url, &mut taken);
                jobs.push(DownloadJob {
                    index,
                    url,
                    dest: directory.join(name),
                });
            }
        }
    }

    if jobs.is_empty() {
        return Ok(AssetMap { paths });
    }

    let pool = build_fetch_pool(opts.concurrency, jobs.len())?;
    let cancel = CancelToken::default();
    let first_error = Mutex::new(None::<LayercompError>);

    let fetched: Vec<Option<(usize, PathBuf)>> = pool.install(|| {
        jobs.into_par_iter()
            .map(|job| {
                if cancel.is_cancelled() {
                    return None;
                }
                match downloader.download(&job.url, &job.dest, &cancel) {
                    Ok(()) => {
                        tracing::debug!(url = %job.url, dest = %job.dest.display(), "downloaded");
                        Some((job.index, job.dest))
                    }
                    Err(LayercompError::Cancelled) => None,
                    Err(e) => {
                        cancel.cancel();
                        let mut slot = first_error.lock().unwrap_or_else(|p| p.into_inner());
                        if slot.is_none() {
                            *slot = Some(e);
                        }
                        None
                    }
                }
            })
            .collect()
    });

    if let Some(e) = first_error.into_inner().unwrap_or_else(|p| p.into_inner()) {
        return Err(e);
    }
    for item in fetched {
        let (index, path) = item.ok_or(LayercompError::Cancelled)?;
        paths.insert(index, path);
    }
    Ok(AssetMap { paths })
}

fn unique_file_name(index: usize, url: &Url, taken: &mut HashSet<String>) -> String {
    let base = remote_file_name(url).unwrap_or_else(|| format!("download-{index}"));
    if taken.insert(base.clone()) {
        return base;
    }
    let mut candidate = format!("{index}-{base}");
    let mut n = 1usize;
    while !taken.insert(candidate.clone()) {
        candidate = format!("{index}-{n}-{base}");
        n += 1;
    }
    candidate
}

fn build_fetch_pool(concurrency: usize, jobs: usize) -> LayercompResult<rayon::ThreadPool> {
    if concurrency == 0 {
        return Err(LayercompError::validation(
            "fetch concurrency must be >= 1",
        ));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(concurrency.min(jobs))
        .thread_name(|i| format!("layercomp-fetch-{i}"))
        .build()
        .map_err(|e| LayercompError::Other(anyhow::anyhow!("failed to build fetch pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fetch.rs"]
mod tests;
