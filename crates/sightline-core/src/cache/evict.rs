//! Oldest-file-wins eviction for the image cache.
//!
//! Best-effort, not transactional: per-file deletion failures are logged and
//! skipped, and the pass never raises an error into the save that triggered
//! it.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::config::CacheConfig;

/// A cached file as seen by the eviction scan.
struct ScannedFile {
    path: PathBuf,
    size: u64,
    modified: SystemTime,
}

/// Run the eviction check over both cache directories.
///
/// If total size exceeds the trigger fraction of the budget, deletes files in
/// ascending modified-time order until the total falls below the target
/// fraction.
pub(crate) async fn check(images_dir: &Path, thumbs_dir: &Path, config: &CacheConfig) {
    let mut files = Vec::new();
    for dir in [images_dir, thumbs_dir] {
        scan_dir(dir, &mut files).await;
    }

    let mut total: u64 = files.iter().map(|f| f.size).sum();
    let trigger = (config.max_total_bytes as f64 * config.eviction_trigger_ratio) as u64;
    if total <= trigger {
        return;
    }

    let target = (config.max_total_bytes as f64 * config.eviction_target_ratio) as u64;
    tracing::info!(
        "Cache at {total} bytes exceeds trigger {trigger}, evicting down to {target}"
    );

    // Oldest file wins
    files.sort_by_key(|f| f.modified);
    for file in files {
        if total <= target {
            break;
        }
        match tokio::fs::remove_file(&file.path).await {
            Ok(()) => {
                tracing::debug!("Evicted {:?} ({} bytes)", file.path, file.size);
                total = total.saturating_sub(file.size);
            }
            Err(e) => {
                // Size is not reclaimed for a file we failed to delete
                tracing::warn!("Eviction could not delete {:?}: {e}", file.path);
            }
        }
    }
}

/// Total size in bytes of all files directly under both directories.
pub(crate) async fn total_size(images_dir: &Path, thumbs_dir: &Path) -> u64 {
    let mut files = Vec::new();
    for dir in [images_dir, thumbs_dir] {
        scan_dir(dir, &mut files).await;
    }
    files.iter().map(|f| f.size).sum()
}

/// Collect regular files directly under `dir`. A missing directory is an
/// empty cache, not an error.
async fn scan_dir(dir: &Path, out: &mut Vec<ScannedFile>) {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        out.push(ScannedFile {
            path: entry.path(),
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(max: u64) -> CacheConfig {
        CacheConfig {
            max_total_bytes: max,
            ..CacheConfig::default()
        }
    }

    /// Write `size` bytes and pin the file's mtime for deterministic ordering.
    fn write_file(path: &Path, size: usize, age_secs: u64) {
        std::fs::write(path, vec![0u8; size]).unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(age_secs);
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(mtime).unwrap();
    }

    #[tokio::test]
    async fn test_below_trigger_deletes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("publication_images");
        let thumbs = images.join("thumbnails");
        std::fs::create_dir_all(&thumbs).unwrap();

        write_file(&images.join("img_1_100.jpg"), 300, 10);
        write_file(&thumbs.join("thumb_1_100.jpg"), 100, 10);

        // 400 of 1000 bytes used, trigger is 800
        check(&images, &thumbs, &config(1000)).await;
        assert_eq!(total_size(&images, &thumbs).await, 400);
    }

    #[tokio::test]
    async fn test_eviction_removes_oldest_until_target() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("publication_images");
        let thumbs = images.join("thumbnails");
        std::fs::create_dir_all(&thumbs).unwrap();

        // 850 bytes total, with strictly distinct ages so deletion order
        // is deterministic
        write_file(&thumbs.join("thumb_1_100.jpg"), 150, 40);
        write_file(&images.join("img_1_100.jpg"), 300, 30);
        write_file(&images.join("img_2_200.jpg"), 300, 20);
        write_file(&thumbs.join("thumb_2_200.jpg"), 100, 10);

        // Trigger at 800, target at 600: the oldest file alone (150) leaves
        // 700, so the next oldest (300) goes too, landing at 400
        check(&images, &thumbs, &config(1000)).await;

        assert!(!thumbs.join("thumb_1_100.jpg").exists());
        assert!(!images.join("img_1_100.jpg").exists());
        assert!(images.join("img_2_200.jpg").exists());
        assert!(thumbs.join("thumb_2_200.jpg").exists());
        assert_eq!(total_size(&images, &thumbs).await, 400);
    }

    #[tokio::test]
    async fn test_missing_directories_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("nope");
        let thumbs = images.join("thumbnails");
        assert_eq!(total_size(&images, &thumbs).await, 0);
        // Must not error either
        check(&images, &thumbs, &config(1000)).await;
    }
}
