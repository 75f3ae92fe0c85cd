//! Durable image cache keyed by record identifier.
//!
//! Persists a full-image + thumbnail pair per record, deduplicates concurrent
//! saves for the same key (single-flight), and evicts oldest files once total
//! size exceeds the configured budget.
//!
//! The store is constructed once at startup and shared by reference; the
//! in-flight map is the only shared mutable state.

mod evict;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::types::{CacheEntry, CachedPaths};

/// Directory under the cache root holding full images.
const IMAGES_DIR: &str = "publication_images";

/// Directory under the images directory holding thumbnails.
const THUMBNAILS_DIR: &str = "thumbnails";

/// One in-flight save, shareable between deduplicated callers.
type InFlightSave = Shared<BoxFuture<'static, CacheResult<CacheEntry>>>;

/// Filesystem context a save needs, detached from `&self` so the shared
/// future can be `'static`.
#[derive(Clone)]
struct SaveJob {
    images_dir: PathBuf,
    thumbs_dir: PathBuf,
    config: CacheConfig,
}

/// The image cache store.
pub struct ImageCacheStore {
    images_dir: PathBuf,
    thumbs_dir: PathBuf,
    config: CacheConfig,
    /// At most one in-flight save per record id
    pending: Mutex<HashMap<u64, InFlightSave>>,
}

/// Removes the pending-map entry when the initiating caller finishes,
/// whatever the outcome. Keeps a failed save from deadlocking its key.
struct PendingGuard<'a> {
    pending: &'a Mutex<HashMap<u64, InFlightSave>>,
    record_id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(&self.record_id);
        }
    }
}

impl ImageCacheStore {
    /// Create a store rooted at `cache_root`.
    ///
    /// Directories are created lazily on first save, not here.
    pub fn new(cache_root: impl Into<PathBuf>, config: CacheConfig) -> Self {
        let images_dir = cache_root.into().join(IMAGES_DIR);
        let thumbs_dir = images_dir.join(THUMBNAILS_DIR);
        Self {
            images_dir,
            thumbs_dir,
            config,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Persist a base64-encoded image (optionally with a data-URI prefix)
    /// for a record, returning the resulting entry.
    ///
    /// Decodes the payload and delegates to [`save_bytes`](Self::save_bytes).
    pub async fn save(&self, record_id: u64, encoded_image: &str) -> CacheResult<CacheEntry> {
        let bytes = BASE64
            .decode(strip_data_uri(encoded_image))
            .map_err(|e| CacheError::InvalidImage {
                message: format!("base64 decode failed: {e}"),
            })?;
        self.save_bytes(record_id, bytes).await
    }

    /// Persist raw image bytes for a record, returning the resulting entry.
    ///
    /// Concurrent saves for the same key share one processing pass; a repeat
    /// save for a key whose files are still on disk returns the existing
    /// entry without reprocessing.
    pub async fn save_bytes(&self, record_id: u64, bytes: Vec<u8>) -> CacheResult<CacheEntry> {
        let (flight, is_leader) = {
            let mut pending = self.pending.lock().expect("pending map poisoned");
            match pending.get(&record_id) {
                Some(inflight) => {
                    tracing::debug!("Joining in-flight save for record {record_id}");
                    (inflight.clone(), false)
                }
                None => {
                    let job = SaveJob {
                        images_dir: self.images_dir.clone(),
                        thumbs_dir: self.thumbs_dir.clone(),
                        config: self.config.clone(),
                    };
                    let flight = Self::save_inner(job, record_id, bytes).boxed().shared();
                    pending.insert(record_id, flight.clone());
                    (flight, true)
                }
            }
        };

        if is_leader {
            let _guard = PendingGuard {
                pending: &self.pending,
                record_id,
            };
            flight.await
        } else {
            flight.await
        }
    }

    /// Look up cached paths for a record. Empty result, never an error, on a
    /// miss; returned paths were seen on disk during the scan.
    pub async fn get_paths(&self, record_id: u64) -> CachedPaths {
        CachedPaths {
            full_image_path: find_newest(&self.images_dir, &format!("img_{record_id}_"))
                .await
                .map(|f| f.path),
            thumbnail_path: find_newest(&self.thumbs_dir, &format!("thumb_{record_id}_"))
                .await
                .map(|f| f.path),
        }
    }

    /// Total size in bytes of all cached files.
    pub async fn total_size(&self) -> u64 {
        evict::total_size(&self.images_dir, &self.thumbs_dir).await
    }

    /// Delete every cached file. Per-file failures are logged individually
    /// so one failure does not abort the rest.
    pub async fn clear(&self) {
        for dir in [&self.images_dir, &self.thumbs_dir] {
            let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
                continue;
            };
            while let Ok(Some(entry)) = entries.next_entry().await {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    tracing::warn!("Cache clear could not delete {:?}: {e}", path);
                }
            }
        }
        tracing::info!("Image cache cleared");
    }

    /// The actual save work; runs exactly once per key while in flight.
    async fn save_inner(job: SaveJob, record_id: u64, bytes: Vec<u8>) -> CacheResult<CacheEntry> {
        tokio::fs::create_dir_all(&job.thumbs_dir).await?;

        // Idempotent per key while the files live: a prior entry on disk
        // short-circuits the save
        if let Some(existing) = Self::existing_entry(&job, record_id).await {
            tracing::debug!("Cache hit for record {record_id}, skipping reprocess");
            return Ok(existing);
        }

        let original_size = bytes.len() as u64;

        // Build the thumbnail before writing anything so an undecodable
        // payload leaves no partial entry behind
        let thumb_size = job.config.thumbnail_size;
        let thumb_quality = job.config.thumbnail_quality;
        let full_bytes = bytes.clone();
        let thumb_bytes = tokio::task::spawn_blocking(move || {
            encode_thumbnail(&bytes, thumb_size, thumb_quality)
        })
        .await
        .map_err(|e| CacheError::InvalidImage {
            message: format!("thumbnail task failed: {e}"),
        })??;

        let created_at_ms = now_ms();
        let full_path = job
            .images_dir
            .join(format!("img_{record_id}_{created_at_ms}.jpg"));
        let thumb_path = job
            .thumbs_dir
            .join(format!("thumb_{record_id}_{created_at_ms}.jpg"));

        tokio::fs::write(&full_path, &full_bytes)
            .await
            .map_err(|e| CacheError::WriteFailed {
                path: full_path.clone(),
                message: e.to_string(),
            })?;
        let compressed_size = thumb_bytes.len() as u64;
        tokio::fs::write(&thumb_path, &thumb_bytes)
            .await
            .map_err(|e| CacheError::WriteFailed {
                path: thumb_path.clone(),
                message: e.to_string(),
            })?;

        tracing::debug!(
            "Cached record {record_id}: {original_size} bytes full, {compressed_size} bytes thumb"
        );

        // Synchronous-in-execution eviction check; never fails the save
        evict::check(&job.images_dir, &job.thumbs_dir, &job.config).await;

        Ok(CacheEntry {
            record_id,
            full_image_path: full_path,
            thumbnail_path: thumb_path,
            original_size_bytes: original_size,
            compressed_size_bytes: compressed_size,
            created_at_ms,
        })
    }

    /// Rebuild an entry from files already on disk.
    ///
    /// A partial pair (one of the two files missing, e.g. half-evicted) is
    /// treated as a miss so both returned paths are always verified.
    async fn existing_entry(job: &SaveJob, record_id: u64) -> Option<CacheEntry> {
        let full = find_newest(&job.images_dir, &format!("img_{record_id}_")).await?;
        let thumb = find_newest(&job.thumbs_dir, &format!("thumb_{record_id}_")).await?;
        Some(CacheEntry {
            record_id,
            created_at_ms: full.timestamp,
            original_size_bytes: full.size,
            compressed_size_bytes: thumb.size,
            full_image_path: full.path,
            thumbnail_path: thumb.path,
        })
    }
}

/// A cache file matched by a directory scan.
struct FoundFile {
    path: PathBuf,
    size: u64,
    timestamp: u64,
}

/// Find the newest file in `dir` whose name starts with `prefix`, by the
/// timestamp embedded in the file name.
async fn find_newest(dir: &Path, prefix: &str) -> Option<FoundFile> {
    let mut entries = tokio::fs::read_dir(dir).await.ok()?;
    let mut newest: Option<FoundFile> = None;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.starts_with(prefix) {
            continue;
        }
        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let timestamp = embedded_timestamp(name).unwrap_or(0);
        if newest.as_ref().map_or(true, |f| timestamp > f.timestamp) {
            newest = Some(FoundFile {
                path: entry.path(),
                size: metadata.len(),
                timestamp,
            });
        }
    }
    newest
}

/// Parse the creation timestamp out of `img_<id>_<ts>.jpg` style names.
fn embedded_timestamp(name: &str) -> Option<u64> {
    name.rsplit('_').next()?.trim_end_matches(".jpg").parse().ok()
}

/// Drop a `data:<mime>;base64,` prefix if present.
fn strip_data_uri(encoded: &str) -> &str {
    if encoded.starts_with("data:") {
        match encoded.find("base64,") {
            Some(idx) => &encoded[idx + "base64,".len()..],
            None => encoded,
        }
    } else {
        encoded
    }
}

/// Decode the payload and re-encode a JPEG thumbnail (longest edge
/// `thumb_size`).
fn encode_thumbnail(bytes: &[u8], thumb_size: u32, quality: u8) -> CacheResult<Vec<u8>> {
    let img = image::load_from_memory(bytes).map_err(|e| CacheError::InvalidImage {
        message: e.to_string(),
    })?;
    let thumb = img.thumbnail(thumb_size, thumb_size);

    let mut out = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality);
    thumb
        .to_rgb8()
        .write_with_encoder(encoder)
        .map_err(|e| CacheError::InvalidImage {
            message: format!("thumbnail encode failed: {e}"),
        })?;
    Ok(out)
}

/// Milliseconds since the Unix epoch.
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
