pub mod config;
pub mod dispatch;
pub mod downloader;
pub mod retention;
pub mod retrieval;
pub mod server;

pub use config::{Cli, FallbackPolicy, RetentionPolicy, RetrievalConfig, ServerConfig};
pub use retrieval::{RetrievalError, Retriever};
pub use server::{router, AppState};
