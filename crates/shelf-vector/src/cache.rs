//! File-backed embedding cache keyed by `(embedder_id, content_hash)`.
//!
//! The cache is consulted before calling the embedder and written through on
//! misses, so restarting the application does not re-embed unchanged books.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub content_hash: String,
    pub embedder_id: String,
    pub vector: Vec<f32>,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

impl CacheEntry {
    pub fn new(content_hash: impl Into<String>, embedder_id: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            content_hash: content_hash.into(),
            embedder_id: embedder_id.into(),
            vector,
            created_at: Utc::now().timestamp_millis(),
        }
    }
}

pub fn hash_content(s: &str) -> String {
    blake3::hash(s.as_bytes()).to_hex().to_string()
}

#[derive(Debug)]
pub struct EmbeddingCache {
    path: PathBuf,
    entries: HashMap<(String, String), CacheEntry>,
    dirty: bool,
}

impl EmbeddingCache {
    /// Open the cache at `path`. A missing file is an empty cache; an
    /// unreadable or corrupt one is logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Vec<CacheEntry>>(&raw) {
                Ok(list) => list.into_iter().map(|e| ((e.embedder_id.clone(), e.content_hash.clone()), e)).collect(),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "embedding cache is corrupt, starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "embedding cache unreadable, starting empty");
                HashMap::new()
            }
        };
        debug!(path = %path.display(), entries = entries.len(), "opened embedding cache");
        Self { path, entries, dirty: false }
    }

    pub fn path(&self) -> &Path { &self.path }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    pub fn is_dirty(&self) -> bool { self.dirty }

    /// Cached vector for one content hash, if present with the expected dimension.
    pub fn get(&self, embedder_id: &str, dim: usize, hash: &str) -> Option<&[f32]> {
        self.entries
            .get(&(embedder_id.to_string(), hash.to_string()))
            .map(|e| e.vector.as_slice())
            .filter(|v| v.len() == dim)
    }

    pub fn get_many(&self, embedder_id: &str, dim: usize, hashes: &[String]) -> HashMap<String, Vec<f32>> {
        hashes
            .iter()
            .filter_map(|h| self.get(embedder_id, dim, h).map(|v| (h.clone(), v.to_vec())))
            .collect()
    }

    pub fn put_many(&mut self, entries: impl IntoIterator<Item = CacheEntry>) {
        for e in entries {
            self.entries.insert((e.embedder_id.clone(), e.content_hash.clone()), e);
            self.dirty = true;
        }
    }

    /// Drop every entry whose content hash is not in `live`.
    pub fn retain_hashes(&mut self, live: &HashSet<String>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(_, hash), _| live.contains(hash));
        let removed = before - self.entries.len();
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    /// Write the cache atomically (temp file in the same directory, then rename).
    pub fn save(&mut self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create cache dir {}", dir.display()))?;
        let mut list: Vec<&CacheEntry> = self.entries.values().collect();
        list.sort_by(|a, b| (&a.embedder_id, &a.content_hash).cmp(&(&b.embedder_id, &b.content_hash)));
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        serde_json::to_writer(&mut tmp, &list)?;
        tmp.flush()?;
        tmp.persist(&self.path).with_context(|| format!("Failed to write cache {}", self.path.display()))?;
        self.dirty = false;
        debug!(path = %self.path.display(), entries = list.len(), "saved embedding cache");
        Ok(())
    }
}
