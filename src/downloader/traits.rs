// Downloader backend trait definitions

use std::path::Path;

use async_trait::async_trait;

use super::errors::DownloadError;
use super::models::{DownloadOptions, DownloadedFile};

/// Multi-site backend driven by format-selection rules (yt-dlp)
#[async_trait]
pub trait DownloaderBackend: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &'static str;

    /// Extract and download `url` according to `options`
    async fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
    ) -> Result<DownloadedFile, DownloadError>;
}

/// Backend specialised for a single platform's posts (instaloader)
#[async_trait]
pub trait PostDownloader: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &'static str;

    /// Download the post identified by `shortcode` into `target_dir`
    async fn download_post(&self, shortcode: &str, target_dir: &Path)
        -> Result<(), DownloadError>;
}
