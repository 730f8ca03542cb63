// Helper functions for backend implementations

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;
use tracing::debug;

use super::errors::DownloadError;

/// Run a tool to completion, optionally bounded by `limit`.
///
/// stdout and stderr are drained concurrently so a chatty tool never
/// blocks on a full pipe. On timeout the child is killed.
pub async fn run_output_with_timeout(
    tool: &'static str,
    program: &Path,
    args: Vec<String>,
    limit: Option<Duration>,
) -> Result<std::process::Output, DownloadError> {
    debug!(tool, program = %program.display(), args = ?args, "spawning backend");

    let mut child = TokioCommand::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                DownloadError::ToolNotFound(format!("{}: {}", program.display(), e))
            } else {
                DownloadError::Io(e)
            }
        })?;

    let mut stdout_pipe = child.stdout.take().ok_or_else(|| {
        DownloadError::ExecutionFailed(format!("Failed to capture stdout from {}", tool))
    })?;
    let mut stderr_pipe = child.stderr.take().ok_or_else(|| {
        DownloadError::ExecutionFailed(format!("Failed to capture stderr from {}", tool))
    })?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });

    let status = match limit {
        Some(after) => {
            let waited = timeout(after, child.wait()).await;
            match waited {
                Ok(status) => status?,
                Err(_) => {
                    let _ = child.kill().await;
                    stdout_task.abort();
                    stderr_task.abort();
                    return Err(DownloadError::Timeout { tool, after });
                }
            }
        }
        None => child.wait().await?,
    };

    let stdout = join_pipe(stdout_task).await?;
    let stderr = join_pipe(stderr_task).await?;
    Ok(std::process::Output { status, stdout, stderr })
}

async fn join_pipe(
    task: tokio::task::JoinHandle<std::io::Result<Vec<u8>>>,
) -> Result<Vec<u8>, DownloadError> {
    task.await
        .map_err(|e| DownloadError::ExecutionFailed(format!("pipe reader failed: {}", e)))?
        .map_err(DownloadError::Io)
}

/// Locate a tool binary: well-known install paths first, then `$PATH`.
pub fn find_tool(name: &str) -> PathBuf {
    let common_dirs = [
        "/opt/homebrew/bin", // Homebrew on Apple Silicon
        "/usr/local/bin",    // Homebrew on Intel Mac, pip --user installs
        "/usr/bin",          // System installation
    ];

    for dir in common_dirs {
        let candidate = Path::new(dir).join(name);
        if candidate.is_file() {
            return candidate;
        }
    }

    PathBuf::from(name)
}

/// Last non-empty stderr line, which is where both tools put the error
pub fn last_error_line(stderr: &[u8], tool: &str) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .next_back()
        .map(ToString::to_string)
        .unwrap_or_else(|| format!("{} exited without an error message", tool))
}

/// Last non-empty stdout line; yt-dlp prints the final path there
pub fn extract_printed_path(stdout: &[u8]) -> Option<PathBuf> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .next_back()
        .map(PathBuf::from)
}
