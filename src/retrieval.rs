//! Retrieval workflow: one backend call per request, output naming, and
//! the Instagram → generic fallback.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{FallbackPolicy, RetrievalConfig};
use crate::dispatch::{classify, Route};
use crate::downloader::{
    DownloadError, DownloadOptions, DownloadResult, DownloaderBackend, PostDownloader,
};

const INSTAGRAM_MESSAGE: &str = "Download completed on the server.";
const INSTAGRAM_DETAILS: &str = "The file was saved in the server's downloads folder.";

/// Why a retrieval did not produce a result
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("Platform not supported natively. Use the external links.")]
    Unsupported,

    #[error(transparent)]
    Download(#[from] DownloadError),
}

pub struct Retriever {
    config: Arc<RetrievalConfig>,
    posts: Arc<dyn PostDownloader>,
    generic: Arc<dyn DownloaderBackend>,
}

impl Retriever {
    pub fn new(
        config: Arc<RetrievalConfig>,
        posts: Arc<dyn PostDownloader>,
        generic: Arc<dyn DownloaderBackend>,
    ) -> Self {
        Self { config, posts, generic }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Classify `url` and run the matching path
    pub async fn retrieve(&self, url: &str) -> Result<DownloadResult, RetrievalError> {
        match classify(url, &self.config.markers) {
            Route::Instagram { shortcode } => self.retrieve_instagram(url, &shortcode).await,
            Route::Generic => Ok(self.retrieve_generic(url).await?),
            Route::Unsupported => Err(RetrievalError::Unsupported),
        }
    }

    async fn retrieve_instagram(
        &self,
        url: &str,
        shortcode: &str,
    ) -> Result<DownloadResult, RetrievalError> {
        let target = self
            .config
            .downloads_dir
            .join(format!("{}_{}", shortcode, short_suffix()));

        let err = match self.posts.download_post(shortcode, &target).await {
            Ok(()) => {
                info!(shortcode, dir = %target.display(), "post saved");
                return Ok(DownloadResult::Acknowledged {
                    message: INSTAGRAM_MESSAGE.to_string(),
                    details: INSTAGRAM_DETAILS.to_string(),
                });
            }
            Err(err) => err,
        };

        let reason = err.blocking_reason();
        let fall_back = match self.config.fallback {
            FallbackPolicy::Always => true,
            FallbackPolicy::RestrictedOnly => reason.allows_fallback(),
        };
        if !fall_back {
            warn!(shortcode, reason = reason.description(), error = %err, "post backend failed");
            return Err(err.into());
        }

        warn!(
            shortcode,
            backend = self.posts.name(),
            reason = reason.description(),
            error = %err,
            "post backend failed, retrying with {}",
            self.generic.name()
        );
        Ok(self.retrieve_generic(url).await?)
    }

    async fn retrieve_generic(&self, url: &str) -> Result<DownloadResult, DownloadError> {
        let id = Uuid::new_v4().simple().to_string();
        let dir = &self.config.downloads_dir;
        let template = dir.join(format!("{}.%(ext)s", id));
        let options = DownloadOptions::new(
            self.config.format_chain.clone(),
            template.to_string_lossy().to_string(),
        );

        let downloaded = self.generic.download(url, &options).await?;
        let path = resolve_downloaded_file(dir, &id, downloaded.reported_path.as_deref()).await?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DownloadError::OutputNotFound(dir.display().to_string()))?;

        info!(url, file = filename, "download ready to serve");
        Ok(DownloadResult::AccessUrl {
            access_url: self.config.access_url(filename),
        })
    }
}

/// First 6 hex chars of a fresh UUID
fn short_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..6].to_string()
}

/// Locate the file a backend produced for `id`.
///
/// The path the tool printed is trusted only if it is a file inside the
/// downloads directory; otherwise the directory is scanned for `<id>.*`.
async fn resolve_downloaded_file(
    dir: &Path,
    id: &str,
    reported: Option<&Path>,
) -> Result<PathBuf, DownloadError> {
    let canonical_dir = tokio::fs::canonicalize(dir).await?;

    if let Some(path) = reported {
        if let Some(found) = confined_file(&canonical_dir, path).await? {
            return Ok(found);
        }
        warn!(path = %path.display(), "ignoring reported path outside downloads dir");
    }

    let prefix = format!("{}.", id);
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let matches = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(&prefix));
        if !matches {
            continue;
        }
        if let Some(found) = confined_file(&canonical_dir, &entry.path()).await? {
            return Ok(found);
        }
    }

    Err(DownloadError::OutputNotFound(dir.display().to_string()))
}

/// Canonical form of `candidate` if it is a regular file under `canonical_dir`
pub(crate) async fn confined_file(
    canonical_dir: &Path,
    candidate: &Path,
) -> Result<Option<PathBuf>, DownloadError> {
    let canonical = match tokio::fs::canonicalize(candidate).await {
        Ok(path) => path,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if !canonical.starts_with(canonical_dir) {
        return Ok(None);
    }

    match tokio::fs::metadata(&canonical).await {
        Ok(meta) if meta.is_file() => Ok(Some(canonical)),
        Ok(_) => Ok(None),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_suffix_is_six_hex_chars() {
        let suffix = short_suffix();
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_resolve_prefers_reported_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("abc.mp4");
        std::fs::write(&file, b"x").unwrap();

        let found = resolve_downloaded_file(dir.path(), "abc", Some(&file)).await.unwrap();
        assert_eq!(found.file_name().unwrap(), "abc.mp4");
    }

    #[tokio::test]
    async fn test_resolve_scans_for_id_prefix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("other.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("abc.webm"), b"x").unwrap();

        let found = resolve_downloaded_file(dir.path(), "abc", None).await.unwrap();
        assert_eq!(found.file_name().unwrap(), "abc.webm");
    }

    #[tokio::test]
    async fn test_resolve_rejects_path_outside_dir() {
        let dir = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let stray = outside.path().join("abc.mp4");
        std::fs::write(&stray, b"x").unwrap();

        let err = resolve_downloaded_file(dir.path(), "abc", Some(&stray))
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::OutputNotFound(_)));
    }
}
