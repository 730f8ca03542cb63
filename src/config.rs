//! Startup configuration: CLI flags with environment fallbacks, turned into
//! the explicit structs handed to the workflow and the HTTP layer.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::downloader::FormatChain;

/// When the Instagram path hands a failed URL to the generic backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FallbackPolicy {
    /// Only when the failure looks like a restriction or a missing tool
    #[default]
    RestrictedOnly,
    /// On any failure
    Always,
}

/// Substrings that route a URL to a retrieval path
#[derive(Debug, Clone)]
pub struct PlatformMarkers {
    pub instagram: String,
    pub generic: Vec<String>,
}

impl Default for PlatformMarkers {
    fn default() -> Self {
        Self {
            instagram: "instagram.com".to_string(),
            generic: vec![
                "tiktok.com".to_string(),
                "youtube.com".to_string(),
                "youtu.be".to_string(),
            ],
        }
    }
}

/// Everything the retrieval workflow needs, fixed at startup
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    pub downloads_dir: PathBuf,
    /// Prefix of access URLs, without trailing slash
    pub public_base_url: String,
    pub format_chain: FormatChain,
    pub markers: PlatformMarkers,
    pub fallback: FallbackPolicy,
}

impl RetrievalConfig {
    pub fn new(downloads_dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            downloads_dir: downloads_dir.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            format_chain: FormatChain::default(),
            markers: PlatformMarkers::default(),
            fallback: FallbackPolicy::default(),
        }
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_format_chain(mut self, chain: FormatChain) -> Self {
        self.format_chain = chain;
        self
    }

    pub fn access_url(&self, filename: &str) -> String {
        format!("{}/serve/{}", self.public_base_url, filename)
    }
}

/// Time-based eviction of old downloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub max_age: Duration,
    pub sweep_interval: Duration,
}

impl RetentionPolicy {
    pub fn is_enabled(&self) -> bool {
        !self.max_age.is_zero()
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(60 * 60),
            sweep_interval: Duration::from_secs(10 * 60),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "media-grab", version, about = "Fetch social-media videos over HTTP")]
pub struct Cli {
    /// Address to bind
    #[arg(long, env = "MEDIA_GRAB_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "MEDIA_GRAB_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Where downloads are written and served from
    #[arg(long, env = "MEDIA_GRAB_DOWNLOADS_DIR")]
    pub downloads_dir: Option<PathBuf>,

    /// Prefix of returned access URLs [default: http://localhost:<port>]
    #[arg(long, env = "MEDIA_GRAB_PUBLIC_URL")]
    pub public_base_url: Option<String>,

    /// yt-dlp format selector chain, `/`-separated
    #[arg(long, env = "MEDIA_GRAB_FORMAT")]
    pub format: Option<String>,

    #[arg(long, env = "MEDIA_GRAB_YTDLP")]
    pub ytdlp_path: Option<PathBuf>,

    #[arg(long, env = "MEDIA_GRAB_INSTALOADER")]
    pub instaloader_path: Option<PathBuf>,

    #[arg(long, env = "MEDIA_GRAB_FALLBACK", value_enum, default_value_t = FallbackPolicy::RestrictedOnly)]
    pub fallback: FallbackPolicy,

    /// Kill a backend after this many seconds (0 = never)
    #[arg(long, env = "MEDIA_GRAB_BACKEND_TIMEOUT", default_value_t = 900)]
    pub backend_timeout_secs: u64,

    /// Delete downloads older than this many seconds (0 = keep forever)
    #[arg(long, env = "MEDIA_GRAB_RETENTION_SECS", default_value_t = 3600)]
    pub retention_secs: u64,

    #[arg(long, env = "MEDIA_GRAB_SWEEP_INTERVAL_SECS", default_value_t = 600)]
    pub sweep_interval_secs: u64,
}

/// Resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub retrieval: RetrievalConfig,
    pub ytdlp_path: Option<PathBuf>,
    pub instaloader_path: Option<PathBuf>,
    pub backend_timeout: Option<Duration>,
    pub retention: RetentionPolicy,
}

impl ServerConfig {
    pub fn from_cli(cli: Cli) -> Self {
        let downloads_dir = cli
            .downloads_dir
            .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("downloads"));
        let public_base_url = cli
            .public_base_url
            .unwrap_or_else(|| format!("http://localhost:{}", cli.port));

        let mut retrieval =
            RetrievalConfig::new(downloads_dir, public_base_url).with_fallback(cli.fallback);
        if let Some(spec) = cli.format.as_deref() {
            let chain = FormatChain::parse(spec);
            if !chain.selectors().is_empty() {
                retrieval = retrieval.with_format_chain(chain);
            }
        }

        Self {
            host: cli.host,
            port: cli.port,
            retrieval,
            ytdlp_path: cli.ytdlp_path,
            instaloader_path: cli.instaloader_path,
            backend_timeout: (cli.backend_timeout_secs > 0)
                .then(|| Duration::from_secs(cli.backend_timeout_secs)),
            retention: RetentionPolicy {
                max_age: Duration::from_secs(cli.retention_secs),
                sweep_interval: Duration::from_secs(cli.sweep_interval_secs.max(1)),
            },
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
