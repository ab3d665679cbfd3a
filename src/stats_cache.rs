// Persisted dataset statistics. Computing them scans the whole training set, so
// results are stored under a key derived from everything they depend on.

use crate::all::*;

use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};

pub trait StatsCache {
  fn get(&self, key: &str) -> Option<Vec<u8>>;
  fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;
}

// Unreadable or undecodable entries count as misses.
pub fn load_cached<T: DeserializeOwned>(cache: &dyn StatsCache, key: &str) -> Option<T> {
  let bytes = cache.get(key)?;
  match serde_json::from_slice(&bytes) {
    Ok(value) => Some(value),
    Err(err) => {
      warn!("Ignoring corrupt cache entry {}: {}", key, err);
      None
    },
  }
}

pub fn store_cached<T: Serialize>(cache: &dyn StatsCache, key: &str, value: &T) -> Result<()> {
  let bytes = serde_json::to_vec(value)?;
  cache.put(key, &bytes)
}

// One JSON file per key.
pub struct FileStatsCache {
  dir: PathBuf,
}

impl FileStatsCache {
  pub fn new(dir: &Path) -> FileStatsCache {
    FileStatsCache { dir: dir.to_path_buf() }
  }

  pub fn path(&self, key: &str) -> PathBuf {
    self.dir.join(format!("{}.json", key))
  }
}

impl StatsCache for FileStatsCache {
  fn get(&self, key: &str) -> Option<Vec<u8>> {
    let path = self.path(key);
    match std::fs::read(&path) {
      Ok(bytes) => {
        info!("Loading statistics from cache file {}.", path.display());
        Some(bytes)
      },
      Err(err) => {
        debug!("Cache miss for {}: {}", path.display(), err);
        None
      },
    }
  }

  fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
    std::fs::create_dir_all(&self.dir)
      .context(format!("Failed to create cache directory {}.", self.dir.display()))?;
    let path = self.path(key);
    // Write then rename so a concurrent reader never sees a partial file.
    let tmp = self.dir.join(format!(".{}.{}.tmp", key, std::process::id()));
    std::fs::write(&tmp, bytes)
      .context(format!("Failed to write {}.", tmp.display()))?;
    std::fs::rename(&tmp, &path)
      .context(format!("Failed to move cache file to {}.", path.display()))?;
    info!("Cached statistics to {}.", path.display());
    Ok(())
  }
}

#[derive(Default)]
pub struct MemoryStatsCache {
  entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStatsCache {
  pub fn new() -> MemoryStatsCache {
    MemoryStatsCache::default()
  }

  pub fn len(&self) -> usize {
    self.entries.lock().map(|e| e.len()).unwrap_or(0)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn keys(&self) -> Vec<String> {
    let mut keys: Vec<String> = self.entries.lock()
      .map(|e| e.keys().cloned().collect())
      .unwrap_or_default();
    keys.sort();
    keys
  }
}

impl StatsCache for MemoryStatsCache {
  fn get(&self, key: &str) -> Option<Vec<u8>> {
    self.entries.lock().ok()?.get(key).cloned()
  }

  fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
    let mut entries = self.entries.lock().map_err(|_| anyhow!("Cache lock poisoned."))?;
    entries.insert(key.to_string(), bytes.to_vec());
    Ok(())
  }
}

// Never hits and forgets everything.
pub struct NoStatsCache;

impl StatsCache for NoStatsCache {
  fn get(&self, _key: &str) -> Option<Vec<u8>> {
    None
  }

  fn put(&self, _key: &str, _bytes: &[u8]) -> Result<()> {
    Ok(())
  }
}

// Bump when the layout of a cached value changes.
const POSE_STATS_VERSION: u32 = 1;
const COLOR_STATS_VERSION: u32 = 1;

// SHA-256 over a length-prefixed stream of fields.
pub struct CacheKey {
  kind: &'static str,
  hasher: Sha256,
}

impl CacheKey {
  pub fn new(kind: &'static str, version: u32) -> CacheKey {
    let mut key = CacheKey { kind, hasher: Sha256::new() };
    key.str(kind).u64(version as u64);
    key
  }

  pub fn u64(&mut self, v: u64) -> &mut CacheKey {
    self.hasher.update(v.to_le_bytes());
    self
  }

  pub fn str(&mut self, s: &str) -> &mut CacheKey {
    self.u64(s.len() as u64);
    self.hasher.update(s.as_bytes());
    self
  }

  pub fn f64s<'a>(&mut self, values: impl IntoIterator<Item = &'a f64>) -> &mut CacheKey {
    for v in values {
      self.hasher.update(v.to_le_bytes());
    }
    self
  }

  pub fn usizes(&mut self, values: &[usize]) -> &mut CacheKey {
    self.u64(values.len() as u64);
    for &v in values { self.u64(v as u64); }
    self
  }

  fn cameras(&mut self, cameras: &Cameras, subjects: &[u32]) -> &mut CacheKey {
    for (key, camera) in cameras.iter().filter(|(k, _)| subjects.contains(&k.subject)) {
      self.u64(key.subject as u64).u64(key.id as u64).str(&camera.name);
      self.f64s(camera.rotation.iter())
        .f64s(camera.translation.iter())
        .f64s(camera.model.focal_length.iter())
        .f64s(camera.model.principal_point.iter())
        .f64s(camera.model.radial.iter())
        .f64s(camera.model.tangential.iter());
    }
    self
  }

  fn split(&mut self, subjects: &[u32], actions: &[String]) -> &mut CacheKey {
    let mut subjects = subjects.to_vec();
    subjects.sort();
    self.u64(subjects.len() as u64);
    for s in subjects { self.u64(s as u64); }
    let mut actions = actions.to_vec();
    actions.sort();
    self.u64(actions.len() as u64);
    for a in &actions { self.str(a); }
    self
  }

  pub fn finish(&self) -> String {
    format!("{}-{:x}", self.kind, self.hasher.clone().finalize())
  }
}

// Depends on the training split, the raw pose values, the training cameras and
// the used dimensions.
pub fn pose_stats_key(
  train: &PoseStore,
  cameras: &Cameras,
  subjects: &[u32],
  actions: &[String],
  selector_2d: &DimensionSelector,
  selector_3d: &DimensionSelector,
) -> String {
  let mut key = CacheKey::new("pose-stats", POSE_STATS_VERSION);
  key.split(subjects, actions)
    .usizes(&selector_2d.used)
    .usizes(&selector_3d.used)
    .cameras(cameras, subjects);
  key.u64(train.len() as u64);
  for (pose, meta) in train.poses().iter().zip(train.metas()) {
    key.u64(meta.subject as u64).str(&meta.sequence_id).f64s(pose.iter());
  }
  key.finish()
}

// Depends on which images are read.
pub fn color_stats_key(
  train: &PoseStore,
  cameras: &Cameras,
  subjects: &[u32],
  actions: &[String],
  image_dir: &Path,
) -> String {
  let mut key = CacheKey::new("color-stats", COLOR_STATS_VERSION);
  key.split(subjects, actions)
    .str(&image_dir.to_string_lossy())
    .cameras(cameras, subjects);
  key.u64(train.len() as u64);
  for meta in train.metas() {
    key.u64(meta.subject as u64).str(&meta.sequence_id).u64(meta.frame_index as u64);
  }
  key.finish()
}
