//! Time-based eviction of finished downloads.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::RetentionPolicy;

const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub removed_files: usize,
    pub removed_dirs: usize,
    pub failures: usize,
}

impl SweepReport {
    pub fn removed(&self) -> usize {
        self.removed_files + self.removed_dirs
    }
}

/// Remove every entry of `dir` last modified more than `max_age` before `now`.
///
/// Directories (instaloader targets) are removed whole. A missing `dir` is
/// not an error. Per-entry failures are logged and counted.
pub async fn sweep_downloads(dir: &Path, max_age: Duration, now: SystemTime) -> SweepReport {
    let mut report = SweepReport::default();

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(error) => {
            if error.kind() != ErrorKind::NotFound {
                warn!(dir = %dir.display(), %error, "cannot open downloads dir for sweep");
                report.failures += 1;
            }
            return report;
        }
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(error) => {
                warn!(%error, "cannot iterate downloads dir");
                report.failures += 1;
                break;
            }
        };

        let path = entry.path();
        let metadata = match entry.metadata().await {
            Ok(metadata) => metadata,
            Err(error) => {
                warn!(path = %path.display(), %error, "cannot read metadata");
                report.failures += 1;
                continue;
            }
        };

        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or_default();
        if age < max_age {
            continue;
        }

        match remove_entry(&path, metadata.is_dir()).await {
            Ok(()) if metadata.is_dir() => report.removed_dirs += 1,
            Ok(()) => report.removed_files += 1,
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(error) => {
                warn!(path = %path.display(), %error, "cannot remove expired download");
                report.failures += 1;
            }
        }
    }

    report
}

async fn remove_entry(path: &Path, is_dir: bool) -> std::io::Result<()> {
    if is_dir {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    }
}

/// Sweep once now, then every `policy.sweep_interval` (at least one second).
/// Returns `None` when retention is disabled.
pub fn spawn_sweeper(dir: PathBuf, policy: RetentionPolicy) -> Option<JoinHandle<()>> {
    if !policy.is_enabled() {
        info!("retention disabled, downloads are kept forever");
        return None;
    }

    let period = policy.sweep_interval.max(MIN_SWEEP_INTERVAL);
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let report = sweep_downloads(&dir, policy.max_age, SystemTime::now()).await;
            if report.removed() > 0 || report.failures > 0 {
                info!(
                    files = report.removed_files,
                    dirs = report.removed_dirs,
                    failures = report.failures,
                    "retention sweep"
                );
            } else {
                debug!("retention sweep: nothing expired");
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sweep_removes_only_expired_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("old.mp4"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("Cabc_123456")).unwrap();
        std::fs::write(dir.path().join("Cabc_123456").join("Cabc.mp4"), b"x").unwrap();

        // nothing is an hour old yet
        let report = sweep_downloads(dir.path(), Duration::from_secs(3600), SystemTime::now()).await;
        assert_eq!(report.removed(), 0);
        assert!(dir.path().join("old.mp4").exists());

        // two hours from now everything has expired
        let later = SystemTime::now() + Duration::from_secs(2 * 3600);
        let report = sweep_downloads(dir.path(), Duration::from_secs(3600), later).await;
        assert_eq!(report.removed_files, 1);
        assert_eq!(report.removed_dirs, 1);
        assert_eq!(report.failures, 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_sweep_missing_dir_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let report = sweep_downloads(&missing, Duration::from_secs(1), SystemTime::now()).await;
        assert_eq!(report, SweepReport::default());
    }

    #[tokio::test]
    async fn test_disabled_policy_spawns_nothing() {
        let policy = RetentionPolicy {
            max_age: Duration::ZERO,
            sweep_interval: Duration::from_secs(1),
        };
        assert!(spawn_sweeper(PathBuf::from("/tmp"), policy).is_none());
    }

    #[tokio::test]
    async fn test_zero_sweep_interval_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let policy = RetentionPolicy {
            max_age: Duration::from_secs(3600),
            sweep_interval: Duration::ZERO,
        };
        let handle = spawn_sweeper(dir.path().to_path_buf(), policy).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        // a zero period would have panicked the task
        assert!(!handle.is_finished());
        handle.abort();
    }

    #[tokio::test]
    async fn test_upstream_mtime_makes_fresh_file_expire() {
        // yt-dlp without --no-mtime back-dates files to the upstream Last-Modified
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.mp4");
        let file = std::fs::File::create(&path).unwrap();
        let week_ago = SystemTime::now() - Duration::from_secs(7 * 24 * 3600);
        file.set_modified(week_ago).unwrap();
        drop(file);

        let report = sweep_downloads(dir.path(), Duration::from_secs(3600), SystemTime::now()).await;
        assert_eq!(report.removed_files, 1);
        assert!(!path.exists());
    }
}
