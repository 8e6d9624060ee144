use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

/// Default download timeout.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("download {url}: {message}")]
    Download { url: String, message: String },

    #[error("source not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Makes a reference source available as a local file.
pub trait SourceFetcher: Send + Sync {
    /// Returns the local path of `source`. Remote sources are written to
    /// `dest`; local ones may be returned in place.
    fn fetch(&self, source: &str, dest: &Path) -> Result<PathBuf, FetchError>;
}

/// Fetches HTTP(S) URLs with `ureq` and resolves local paths and
/// `file://` URLs in place.
pub struct DefaultFetcher {
    agent: ureq::Agent,
}

impl DefaultFetcher {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_DOWNLOAD_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self { agent }
    }

    fn download(&self, url: &str, dest: &Path) -> Result<PathBuf, FetchError> {
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let download_err = |e: ureq::Error| FetchError::Download {
            url: url.to_string(),
            message: e.to_string(),
        };
        let mut response = self.agent.get(url).call().map_err(download_err)?;
        let mut reader = response.body_mut().as_reader();
        let mut file = File::create(dest)?;
        let bytes = io::copy(&mut reader, &mut file)?;

        info!(url, bytes, "downloaded reference audio");
        Ok(dest.to_path_buf())
    }
}

impl Default for DefaultFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceFetcher for DefaultFetcher {
    fn fetch(&self, source: &str, dest: &Path) -> Result<PathBuf, FetchError> {
        if is_remote(source) {
            return self.download(source, dest);
        }
        let path = PathBuf::from(source.strip_prefix("file://").unwrap_or(source));
        if !path.is_file() {
            return Err(FetchError::NotFound(path));
        }
        debug!(path = %path.display(), "using local reference audio");
        Ok(path)
    }
}

pub(crate) fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// File extension of a source, ignoring URL query and fragment.
/// Defaults to `wav`.
pub fn source_extension(source: &str) -> String {
    let path = source.split(['?', '#']).next().unwrap_or(source);
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= 5
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => "wav".to_string(),
    }
}
