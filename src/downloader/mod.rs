// Downloader module - wrappers around the external extraction tools

pub mod backends;
pub mod diagnostics;
pub mod errors;
pub mod models;
pub mod traits;
pub mod utils;

pub use backends::{InstaloaderBackend, YtDlpBackend};
pub use diagnostics::{diagnose_error, BlockingReason};
pub use errors::DownloadError;
pub use models::{DownloadOptions, DownloadResult, DownloadedFile, FormatChain};
pub use traits::{DownloaderBackend, PostDownloader};
