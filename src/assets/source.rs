use std::path::PathBuf;

use reqwest::Url;

/// Where a layer's `file` value points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetSource {
    /// Absolute `http`/`https` URL that must be downloaded into the workspace.
    Remote(Url),
    /// Filesystem path, used as given.
    Local(PathBuf),
}

impl AssetSource {
    pub fn classify(value: &str) -> Self {
        match Url::parse(value.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
                Self::Remote(url)
            }
            _ => Self::Local(PathBuf::from(value)),
        }
    }

    pub fn is_remote(value: &str) -> bool {
        matches!(Self::classify(value), Self::Remote(_))
    }
}

/// Base name of the remote resource: the last non-empty path segment.
pub fn remote_file_name(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .next_back()
        .map(str::to_string)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
