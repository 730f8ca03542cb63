// Common data models for downloader

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Ordered yt-dlp format preference; the first selector that matches wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatChain(Vec<String>);

impl FormatChain {
    pub fn new<I, S>(selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(selectors.into_iter().map(Into::into).collect())
    }

    /// Parse a `/`-separated selector string such as `best[ext=mp4]/best`
    pub fn parse(spec: &str) -> Self {
        Self::new(
            spec.split('/')
                .map(str::trim)
                .filter(|s| !s.is_empty()),
        )
    }

    pub fn selectors(&self) -> &[String] {
        &self.0
    }
}

impl Default for FormatChain {
    /// Merged mp4 video + m4a audio, else a single mp4 file, else anything
    fn default() -> Self {
        Self::new([
            "bestvideo[ext=mp4]+bestaudio[ext=m4a]",
            "best[ext=mp4]",
            "best",
        ])
    }
}

impl fmt::Display for FormatChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// Download options for the generic backend
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub format: FormatChain,
    /// yt-dlp output template, e.g. `/srv/downloads/<id>.%(ext)s`
    pub output_template: String,
    pub quiet: bool,
    pub no_warnings: bool,
}

impl DownloadOptions {
    pub fn new(format: FormatChain, output_template: impl Into<String>) -> Self {
        Self {
            format,
            output_template: output_template.into(),
            quiet: true,
            no_warnings: true,
        }
    }
}

/// What the generic backend reports after a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    /// Final path as printed by the tool, if it printed one
    pub reported_path: Option<PathBuf>,
}

/// Response payload of a successful retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status")]
pub enum DownloadResult {
    /// Saved on the server, nothing to hand back
    #[serde(rename = "success")]
    Acknowledged { message: String, details: String },

    /// Saved on the server and reachable through the file server
    #[serde(rename = "success_url")]
    AccessUrl { access_url: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_chain_renders_as_ytdlp_selector() {
        assert_eq!(
            FormatChain::default().to_string(),
            "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best"
        );
    }

    #[test]
    fn test_parse_skips_empty_selectors() {
        let chain = FormatChain::parse(" best[ext=mp4] //best/");
        assert_eq!(chain.selectors(), ["best[ext=mp4]", "best"]);
    }

    #[test]
    fn test_result_serialization_shapes() {
        let ack = DownloadResult::Acknowledged {
            message: "m".to_string(),
            details: "d".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&ack).unwrap(),
            serde_json::json!({"status": "success", "message": "m", "details": "d"})
        );

        let url = DownloadResult::AccessUrl {
            access_url: "http://localhost:5000/serve/a.mp4".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&url).unwrap(),
            serde_json::json!({"status": "success_url", "access_url": "http://localhost:5000/serve/a.mp4"})
        );
    }
}
