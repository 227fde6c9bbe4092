use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::{Duration, Instant},
};

use super::*;
use crate::{
    foundation::core::Offset,
    layers::model::{ImageLayer, TextLayer},
};

/// Writes the URL into the destination. URLs containing `fail` error out, URLs containing `slow`
/// spin until cancelled.
#[derive(Default)]
struct FakeDownloader {
    started: AtomicUsize,
    cancelled: AtomicUsize,
}

impl Downloader for FakeDownloader {
    fn download(&self, url: &Url, dest: &Path, cancel: &CancelToken) -> LayercompResult<()> {
        self.started.fetch_add(1, Ordering::SeqCst);
        if url.as_str().contains("fail") {
            std::thread::sleep(Duration::from_millis(20));
            return Err(LayercompError::download(url.as_str(), "HTTP 500"));
        }
        if url.as_str().contains("slow") {
            let deadline = Instant::now() + Duration::from_secs(10);
            while Instant::now() < deadline {
                if cancel.is_cancelled() {
                    self.cancelled.fetch_add(1, Ordering::SeqCst);
                    return Err(LayercompError::Cancelled);
                }
                std::thread::sleep(Duration::from_millis(5));
            }
        }
        std::fs::write(dest, url.as_str()).unwrap();
        Ok(())
    }
}

fn opts(concurrency: usize) -> FetchOpts {
    FetchOpts {
        concurrency,
        ..FetchOpts::default()
    }
}

#[test]
fn local_paths_pass_through_and_urls_are_downloaded() {
    let dir = tempfile::tempdir().unwrap();
    let layers = vec![
        Layer::image("local/base.png"),
        Layer::text("caption"),
        Layer::image("https://cdn.example.com/img/logo.png"),
        Layer::Unknown,
    ];
    let downloader = FakeDownloader::default();

    let map = fetch_assets(&layers, dir.path(), &downloader, &opts(4)).unwrap();

    assert_eq!(map.len(), 2);
    assert_eq!(map.get(0), Some(Path::new("local/base.png")));
    assert_eq!(map.get(1), None);
    let logo = map.get(2).unwrap();
    assert_eq!(logo, dir.path().join("logo.png"));
    assert_eq!(
        std::fs::read_to_string(logo).unwrap(),
        "https://cdn.example.com/img/logo.png"
    );
    assert_eq!(map.get(3), None);
}

#[test]
fn resolve_replaces_urls_with_local_paths() {
    let dir = tempfile::tempdir().unwrap();
    let mut text = TextLayer::new("caption");
    text.x = 3;
    let layers = vec![
        Layer::image("https://cdn.example.com/logo.png"),
        Layer::Text(text.clone()),
        Layer::Image(ImageLayer {
            x: 1,
            y: 2,
            file: None,
        }),
    ];
    let map = fetch_assets(&layers, dir.path(), &FakeDownloader::default(), &opts(2)).unwrap();
    let resolved = map.resolve(&layers);

    assert_eq!(
        resolved,
        vec![
            ResolvedLayer::Image(ResolvedImage {
                offset: Offset::default(),
                file: Some(dir.path().join("logo.png")),
            }),
            ResolvedLayer::Text(text),
            ResolvedLayer::Image(ResolvedImage {
                offset: Offset::new(1, 2),
                file: None,
            }),
        ]
    );
}

#[test]
fn colliding_base_names_get_distinct_paths() {
    let dir = tempfile::tempdir().unwrap();
    let layers = vec![
        Layer::image("https://a.example.com/logo.png"),
        Layer::image("https://b.example.com/logo.png"),
        Layer::image("https://c.example.com/x/temp.png"),
        Layer::image("https://c.example.com/"),
    ];
    let map = fetch_assets(&layers, dir.path(), &FakeDownloader::default(), &opts(4)).unwrap();

    let paths: HashSet<_> = (0..4).map(|i| map.get(i).unwrap().to_path_buf()).collect();
    assert_eq!(paths.len(), 4);
    assert_eq!(map.get(0).unwrap(), dir.path().join("logo.png"));
    assert_eq!(map.get(1).unwrap(), dir.path().join("1-logo.png"));
    assert_eq!(map.get(2).unwrap(), dir.path().join("2-temp.png"));
    assert_eq!(map.get(3).unwrap(), dir.path().join("download-3"));
}

#[test]
fn first_failure_aborts_and_cancels_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let layers = vec![
        Layer::image("https://example.com/slow-1.png"),
        Layer::image("https://example.com/fail.png"),
        Layer::image("https://example.com/slow-2.png"),
    ];
    let downloader = FakeDownloader::default();

    let started = Instant::now();
    let err = fetch_assets(&layers, dir.path(), &downloader, &opts(3)).unwrap_err();

    match err {
        LayercompError::Download { url, reason } => {
            assert_eq!(url, "https://example.com/fail.png");
            assert_eq!(reason, "HTTP 500");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(downloader.cancelled.load(Ordering::SeqCst) >= 1);
    assert!(!dir.path().join("slow-1.png").exists());
}

#[test]
fn queued_downloads_are_skipped_after_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut layers = vec![Layer::image("https://example.com/fail.png")];
    for i in 0..16 {
        layers.push(Layer::image(format!("https://example.com/{i}.png")));
    }
    let downloader = FakeDownloader::default();

    assert!(fetch_assets(&layers, dir.path(), &downloader, &opts(1)).is_err());
    assert!(downloader.started.load(Ordering::SeqCst) < layers.len());
}

#[test]
fn no_remote_layers_needs_no_downloads() {
    let dir = tempfile::tempdir().unwrap();
    let layers = vec![Layer::image("a.png"), Layer::text("t")];
    let downloader = FakeDownloader::default();
    let map = fetch_assets(&layers, dir.path(), &downloader, &opts(0)).unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(downloader.started.load(Ordering::SeqCst), 0);
}

#[test]
fn zero_concurrency_is_rejected_when_downloads_exist() {
    let dir = tempfile::tempdir().unwrap();
    let layers = vec![Layer::image("https://example.com/a.png")];
    let err = fetch_assets(&layers, dir.path(), &FakeDownloader::default(), &opts(0)).unwrap_err();
    assert!(matches!(err, LayercompError::Validation(_)));
}

#[test]
fn cancel_token_is_shared_between_clones() {
    let token = CancelToken::default();
    let other = token.clone();
    assert!(!other.is_cancelled());
    token.cancel();
    assert!(other.is_cancelled());
}
