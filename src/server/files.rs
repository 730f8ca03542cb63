//! `GET /serve/{filename}`: stream a finished download as an attachment.

use std::io::ErrorKind;
use std::path::{Component, Path};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path as UrlPath, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
        HeaderMap, HeaderValue,
    },
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

use super::error::ApiError;
use super::AppState;

pub async fn serve_file(
    State(state): State<Arc<AppState>>,
    UrlPath(filename): UrlPath<String>,
) -> Result<Response, ApiError> {
    if !is_plain_filename(&filename) {
        warn!(filename, "rejected file request");
        return Err(ApiError::bad_request("Invalid filename"));
    }

    let dir = &state.retriever.config().downloads_dir;
    let canonical_dir = tokio::fs::canonicalize(dir)
        .await
        .map_err(|_| ApiError::not_found("File not found"))?;

    let canonical = match tokio::fs::canonicalize(dir.join(&filename)).await {
        Ok(path) => path,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ApiError::not_found("File not found"))
        }
        Err(e) => return Err(ApiError::internal(format!("Cannot resolve file: {}", e))),
    };
    // symlinks pointing out of the downloads dir
    if !canonical.starts_with(&canonical_dir) {
        warn!(filename, "rejected file outside downloads dir");
        return Err(ApiError::bad_request("Invalid filename"));
    }

    let file = match tokio::fs::File::open(&canonical).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ApiError::not_found("File not found"))
        }
        Err(e) => return Err(ApiError::internal(format!("Cannot open file: {}", e))),
    };
    let metadata = file
        .metadata()
        .await
        .map_err(|e| ApiError::internal(format!("Cannot read file metadata: {}", e)))?;
    if !metadata.is_file() {
        return Err(ApiError::not_found("File not found"));
    }

    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static(content_type_for_filename(&filename)),
    );
    headers.insert(CONTENT_LENGTH, HeaderValue::from(metadata.len()));
    headers.insert(
        CONTENT_DISPOSITION,
        HeaderValue::from_str(&build_content_disposition(&filename))
            .map_err(|_| ApiError::internal("Cannot build download header"))?,
    );

    info!(filename, bytes = metadata.len(), "serving file");
    let body = Body::from_stream(ReaderStream::new(file));
    Ok((headers, body).into_response())
}

/// Exactly one normal path component: no separators, no `.`/`..`
fn is_plain_filename(name: &str) -> bool {
    if name.is_empty() || name.contains(|c: char| matches!(c, '/' | '\\' | '\0')) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn content_type_for_filename(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "opus" | "ogg" => "audio/ogg",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

fn build_content_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(filename)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_filename() {
        assert!(is_plain_filename("abc.mp4"));
        assert!(is_plain_filename("..hidden"));
        assert!(!is_plain_filename(""));
        assert!(!is_plain_filename("."));
        assert!(!is_plain_filename(".."));
        assert!(!is_plain_filename("../etc/passwd"));
        assert!(!is_plain_filename("a/b.mp4"));
        assert!(!is_plain_filename("..\\secret"));
        assert!(!is_plain_filename("/etc/passwd"));
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type_for_filename("a.MP4"), "video/mp4");
        assert_eq!(content_type_for_filename("a.webm"), "video/webm");
        assert_eq!(content_type_for_filename("noext"), "application/octet-stream");
    }

    #[test]
    fn test_content_disposition() {
        assert_eq!(
            build_content_disposition("abc.mp4"),
            "attachment; filename=\"abc.mp4\"; filename*=UTF-8''abc.mp4"
        );
        assert_eq!(
            build_content_disposition("clip é.mp4"),
            "attachment; filename=\"clip__.mp4\"; filename*=UTF-8''clip%20%C3%A9.mp4"
        );
    }
}
