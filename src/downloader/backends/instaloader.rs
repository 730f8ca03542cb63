use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::downloader::errors::DownloadError;
use crate::downloader::traits::PostDownloader;
use crate::downloader::utils::{find_tool, last_error_line, run_output_with_timeout};

/// Instagram post/reel backend driving the `instaloader` CLI
pub struct InstaloaderBackend {
    binary_path: PathBuf,
    timeout: Option<Duration>,
}

impl InstaloaderBackend {
    pub fn new(binary_path: Option<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            binary_path: binary_path.unwrap_or_else(|| find_tool("instaloader")),
            timeout,
        }
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Shortcodes are base64url-ish; anything else would be read as an
    /// instaloader target of another kind (profile, hashtag, ...)
    fn is_valid_shortcode(shortcode: &str) -> bool {
        !shortcode.is_empty()
            && shortcode
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }

    /// Videos only: no pictures, thumbnails, geotags, comments or metadata
    fn build_args(shortcode: &str, target_dir: &Path) -> Vec<String> {
        vec![
            "--quiet".to_string(),
            "--no-pictures".to_string(),
            "--no-video-thumbnails".to_string(),
            "--no-metadata-json".to_string(),
            "--no-compress-json".to_string(),
            "--no-captions".to_string(),
            "--dirname-pattern".to_string(),
            target_dir.to_string_lossy().to_string(),
            "--filename-pattern".to_string(),
            "{shortcode}".to_string(),
            "--".to_string(),
            format!("-{}", shortcode),
        ]
    }
}

#[async_trait]
impl PostDownloader for InstaloaderBackend {
    fn name(&self) -> &'static str {
        "instaloader"
    }

    async fn download_post(
        &self,
        shortcode: &str,
        target_dir: &Path,
    ) -> Result<(), DownloadError> {
        if !Self::is_valid_shortcode(shortcode) {
            return Err(DownloadError::InvalidUrl(format!(
                "not a post shortcode: {:?}",
                shortcode
            )));
        }

        let args = Self::build_args(shortcode, target_dir);
        let output =
            run_output_with_timeout(self.name(), &self.binary_path, args, self.timeout).await?;

        if !output.status.success() {
            return Err(DownloadError::ExecutionFailed(last_error_line(
                &output.stderr,
                self.name(),
            )));
        }

        info!(shortcode, dir = %target_dir.display(), "instaloader download finished");
        Ok(())
    }
}
