// Downloader backends

pub mod instaloader;
pub mod ytdlp;

pub use instaloader::InstaloaderBackend;
pub use ytdlp::YtDlpBackend;
