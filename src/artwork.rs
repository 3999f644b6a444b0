use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::player::CurrentMedia;

/// Ephemeral home for downloaded thumbnails.
pub const DEFAULT_CACHE_DIR: &str = "/tmp/medley/media-thumbnails";

/// Shown whenever no valid thumbnail is available.
pub const FALLBACK_ICON: &str = "images/icon.png";

const MAX_CACHED: usize = 50;
const EVICT_BATCH: usize = 35;

/// The interactive path gets one quick shot at the network.
const FAST_TIMEOUT: Duration = Duration::from_millis(300);

/// The detached retry path can afford to be patient.
const SLOW_TIMEOUT: Duration = Duration::from_secs(2);
const SLOW_ATTEMPTS: u32 = 3;

/// Maps a (title, artist) identity to a locally cached image file.
///
/// Lookups never fail: the result is always a path to either a valid image
/// or the fallback icon. Slow or broken networks degrade to the fallback
/// while a detached background thread keeps trying; its work is only
/// observed by a later, independent lookup.
pub struct ThumbnailCache {
    dir: PathBuf,
    fallback: PathBuf,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl ThumbnailCache {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            fallback: PathBuf::from(FALLBACK_ICON),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Deterministic digest of `"{title}-{artist}"`. Order matters: the
    /// key is not symmetric in its arguments.
    pub fn cache_key(title: &str, artist: &str) -> String {
        format!("{:x}", md5::compute(format!("{title}-{artist}")))
    }

    /// Resolve the thumbnail for `media`, fetching on a miss.
    pub fn thumbnail_for(&self, media: &CurrentMedia) -> PathBuf {
        if !self.dir.exists() {
            if let Err(err) = fs::create_dir_all(&self.dir) {
                warn!(dir = %self.dir.display(), %err, "could not create thumbnail cache dir");
                return self.fallback.clone();
            }
        }

        let key = Self::cache_key(&media.title, &media.artist);
        let dest = self.dir.join(format!("{key}.png"));

        if dest.exists() {
            return self.validated(dest);
        }

        self.evict_old();

        let url = media.art_url.as_str();
        if let Some(local) = url.strip_prefix("file://") {
            // Local art is used in place, never copied into the cache.
            let local = PathBuf::from(local);
            if local.exists() {
                return local;
            }
            return self.fallback.clone();
        }

        if url.starts_with("http") {
            match fetch_to(&http_client(FAST_TIMEOUT), url, &dest) {
                Ok(()) => return self.validated(dest),
                Err(err) => {
                    debug!(url, %err, "fast thumbnail fetch failed, retrying in background");
                    let _ = fs::remove_file(&dest);
                    self.fetch_in_background(key, url.to_string(), dest);
                }
            }
        }

        self.fallback.clone()
    }

    /// A well-formed image comes back as-is; anything else (for instance a
    /// partial file from a download still in flight) becomes the fallback.
    fn validated(&self, path: PathBuf) -> PathBuf {
        if image::open(&path).is_ok() {
            path
        } else {
            debug!(path = %path.display(), "cached thumbnail is not a valid image");
            self.fallback.clone()
        }
    }

    /// Coarse batch eviction: once the population passes the cap, drop the
    /// oldest batch by creation time. Not LRU; good enough for a cache that
    /// grows one entry per track change.
    fn evict_old(&self) {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return;
        };

        let mut thumbs: Vec<(SystemTime, PathBuf)> = entries
            .flatten()
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .is_some_and(|extension| extension == "png")
            })
            .filter_map(|entry| {
                let meta = entry.metadata().ok()?;
                let created = meta.created().or_else(|_| meta.modified()).ok()?;
                Some((created, entry.path()))
            })
            .collect();

        if thumbs.len() <= MAX_CACHED {
            return;
        }

        thumbs.sort_by_key(|(created, _)| *created);
        debug!(total = thumbs.len(), "evicting oldest thumbnails");
        for (_, path) in thumbs.iter().take(EVICT_BATCH) {
            let _ = fs::remove_file(path);
        }
    }

    /// Detached fire-and-forget retry. The per-key in-flight set keeps two
    /// rapid identical misses from downloading the same art twice.
    fn fetch_in_background(&self, key: String, url: String, dest: PathBuf) {
        {
            let Ok(mut in_flight) = self.in_flight.lock() else {
                return;
            };
            if !in_flight.insert(key.clone()) {
                debug!(key, "background fetch already in flight");
                return;
            }
        }

        let in_flight = Arc::clone(&self.in_flight);
        thread::spawn(move || {
            let client = http_client(SLOW_TIMEOUT);
            for attempt in 1..=SLOW_ATTEMPTS {
                match fetch_to(&client, &url, &dest) {
                    Ok(()) => {
                        debug!(url, attempt, "background thumbnail fetch succeeded");
                        break;
                    }
                    Err(err) => {
                        warn!(url, attempt, %err, "background thumbnail fetch failed");
                        let _ = fs::remove_file(&dest);
                    }
                }
            }
            if let Ok(mut in_flight) = in_flight.lock() {
                in_flight.remove(&key);
            }
        });
    }
}

fn http_client(timeout: Duration) -> reqwest::blocking::Client {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

/// Stream the response straight into `dest`. Callers remove the file on
/// failure; readers guard against partials with the validity check.
fn fetch_to(client: &reqwest::blocking::Client, url: &str, dest: &Path) -> Result<()> {
    let mut response = client
        .get(url)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .with_context(|| format!("requesting {url}"))?;
    let mut file = fs::File::create(dest)
        .with_context(|| format!("creating {}", dest.display()))?;
    response
        .copy_to(&mut file)
        .with_context(|| format!("writing {}", dest.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::CurrentMedia;

    fn media(art_url: &str, title: &str, artist: &str) -> CurrentMedia {
        CurrentMedia {
            art_url: art_url.to_string(),
            artist: artist.to_string(),
            title: title.to_string(),
            player: "Spotify".to_string(),
            album: None,
            position: None,
        }
    }

    #[test]
    fn cache_key_is_deterministic() {
        let a = ThumbnailCache::cache_key("Let It Be", "Beatles");
        let b = ThumbnailCache::cache_key("Let It Be", "Beatles");
        assert_eq!(a, b);
    }

    #[test]
    fn cache_key_is_order_sensitive() {
        let forward = ThumbnailCache::cache_key("Let It Be", "Beatles");
        let reversed = ThumbnailCache::cache_key("Beatles", "Let It Be");
        assert_ne!(forward, reversed);
    }

    #[test]
    fn local_file_art_is_used_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let art = dir.path().join("cover.png");
        fs::write(&art, b"not read, only located").unwrap();

        let cache = ThumbnailCache::new(dir.path().join("cache"));
        let url = format!("file://{}", art.display());
        let resolved = cache.thumbnail_for(&media(&url, "Song", "Artist"));

        assert_eq!(resolved, art);
    }

    #[test]
    fn missing_local_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ThumbnailCache::new(dir.path().join("cache"));

        let resolved = cache.thumbnail_for(&media("file:///nowhere/cover.png", "Song", "Artist"));
        assert_eq!(resolved, PathBuf::from(FALLBACK_ICON));
    }

    #[test]
    fn corrupt_cached_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ThumbnailCache::new(dir.path().to_path_buf());

        let key = ThumbnailCache::cache_key("Song", "Artist");
        fs::write(dir.path().join(format!("{key}.png")), b"not an image").unwrap();

        let resolved = cache.thumbnail_for(&media("https://example.com/a.png", "Song", "Artist"));
        assert_eq!(resolved, PathBuf::from(FALLBACK_ICON));
    }

    #[test]
    fn zero_byte_cached_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ThumbnailCache::new(dir.path().to_path_buf());

        let key = ThumbnailCache::cache_key("Song", "Artist");
        fs::write(dir.path().join(format!("{key}.png")), b"").unwrap();

        let resolved = cache.thumbnail_for(&media("https://example.com/a.png", "Song", "Artist"));
        assert_eq!(resolved, PathBuf::from(FALLBACK_ICON));
    }

    #[test]
    fn eviction_drops_the_oldest_batch() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ThumbnailCache::new(dir.path().to_path_buf());

        for i in 0..51 {
            fs::write(dir.path().join(format!("old-{i:02}.png")), b"x").unwrap();
        }

        cache.evict_old();

        let remaining = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(remaining, 51 - 35);
    }

    #[test]
    fn eviction_leaves_small_populations_alone() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ThumbnailCache::new(dir.path().to_path_buf());

        for i in 0..50 {
            fs::write(dir.path().join(format!("thumb-{i:02}.png")), b"x").unwrap();
        }

        cache.evict_old();

        let remaining = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(remaining, 50);
    }

    #[test]
    fn eviction_ignores_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ThumbnailCache::new(dir.path().to_path_buf());

        for i in 0..51 {
            fs::write(dir.path().join(format!("thumb-{i:02}.png")), b"x").unwrap();
        }
        fs::write(dir.path().join("notes.txt"), b"keep me").unwrap();

        cache.evict_old();

        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn duplicate_background_fetches_are_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ThumbnailCache::new(dir.path().to_path_buf());

        let key = ThumbnailCache::cache_key("Song", "Artist");
        cache.in_flight.lock().unwrap().insert(key.clone());

        // A second miss for the same key must not spawn another download.
        cache.fetch_in_background(
            key.clone(),
            "http://127.0.0.1:1/unreachable.png".to_string(),
            dir.path().join(format!("{key}.png")),
        );

        assert_eq!(cache.in_flight.lock().unwrap().len(), 1);
    }
}
