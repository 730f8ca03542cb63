// Error types for downloader backends

use std::time::Duration;

use thiserror::Error;

use super::diagnostics::{diagnose_error, BlockingReason};

#[derive(Debug, Error)]
pub enum DownloadError {
    /// instaloader or yt-dlp could not be started
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// URL the backend cannot work with (e.g. empty shortcode)
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Backend ran past the configured limit and was killed
    #[error("{tool} timed out after {}s", .after.as_secs())]
    Timeout { tool: &'static str, after: Duration },

    /// Backend exited unsuccessfully; carries its last meaningful stderr text
    #[error("{0}")]
    ExecutionFailed(String),

    /// Backend reported success but no output file could be located
    #[error("Downloaded file not found in {0}")]
    OutputNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    /// Classify the failure for fallback decisions.
    ///
    /// Only tool output goes through the text diagnostics; the other
    /// variants already say what went wrong.
    pub fn blocking_reason(&self) -> BlockingReason {
        match self {
            Self::ToolNotFound(_) => BlockingReason::ToolUnavailable,
            Self::InvalidUrl(_) => BlockingReason::UnsupportedUrl,
            Self::Timeout { .. } => BlockingReason::NetworkTimeout,
            Self::Io(_) | Self::OutputNotFound(_) => BlockingReason::Unknown,
            Self::ExecutionFailed(msg) => diagnose_error(msg).unwrap_or(BlockingReason::Unknown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_not_found_is_unavailable() {
        let err = DownloadError::ToolNotFound("instaloader".to_string());
        assert_eq!(err.blocking_reason(), BlockingReason::ToolUnavailable);
    }

    #[test]
    fn test_execution_failure_is_diagnosed() {
        let err = DownloadError::ExecutionFailed(
            "Login required to access this post".to_string(),
        );
        assert_eq!(err.blocking_reason(), BlockingReason::LoginRequired);
    }

    #[test]
    fn test_timeout_display() {
        let err = DownloadError::Timeout {
            tool: "yt-dlp",
            after: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "yt-dlp timed out after 30s");
    }
}
