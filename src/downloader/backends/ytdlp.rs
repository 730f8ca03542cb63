use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::downloader::errors::DownloadError;
use crate::downloader::models::{DownloadOptions, DownloadedFile};
use crate::downloader::traits::DownloaderBackend;
use crate::downloader::utils::{
    extract_printed_path, find_tool, last_error_line, run_output_with_timeout,
};

/// Generic multi-site backend driving the `yt-dlp` binary
pub struct YtDlpBackend {
    binary_path: PathBuf,
    timeout: Option<Duration>,
}

impl YtDlpBackend {
    pub fn new(binary_path: Option<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            binary_path: binary_path.unwrap_or_else(|| find_tool("yt-dlp")),
            timeout,
        }
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Build command arguments
    fn build_args(url: &str, options: &DownloadOptions) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            options.format.to_string(),
            "--no-playlist".to_string(),
            "-o".to_string(),
            options.output_template.clone(),
            // later WHEN stage, so this does not switch yt-dlp into simulate mode
            "--print".to_string(),
            "after_move:filepath".to_string(),
            // retention ages files by mtime; keep the local write time
            "--no-mtime".to_string(),
        ];

        if options.quiet {
            args.push("--quiet".to_string());
        }
        if options.no_warnings {
            args.push("--no-warnings".to_string());
        }

        args.push("--".to_string());
        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl DownloaderBackend for YtDlpBackend {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
    ) -> Result<DownloadedFile, DownloadError> {
        let args = Self::build_args(url, options);
        let output =
            run_output_with_timeout(self.name(), &self.binary_path, args, self.timeout).await?;

        if !output.status.success() {
            return Err(DownloadError::ExecutionFailed(last_error_line(
                &output.stderr,
                self.name(),
            )));
        }

        let reported_path = extract_printed_path(&output.stdout);
        info!(url, path = ?reported_path, "yt-dlp download finished");
        Ok(DownloadedFile { reported_path })
    }
}
