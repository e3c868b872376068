use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use shelf_core::config::Settings;
use shelf_core::error::Error;
use shelf_core::tokenize::Normalizer;
use shelf_core::traits::{DocumentSource, Embedder, LibraryEvent, SearchEngine};
use shelf_core::types::{DocId, Document, ScoredResult, SourceDocument};
use shelf_embed::get_default_embedder;
use shelf_vector::{hash_content, CacheEntry, EmbeddingCache};

use crate::fusion::Ranker;
use crate::snapshot::IndexSnapshot;

/// A document that was left out of a rebuild, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedDocument {
    pub id: DocId,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RebuildReport {
    pub indexed: usize,
    pub skipped: Vec<SkippedDocument>,
    pub cache_hits: usize,
}

struct Built {
    document: Document,
    content_hash: String,
    cache_hit: bool,
    /// Freshly computed embedding, written to the cache once the document is indexed.
    fresh: Option<CacheEntry>,
}

/// The live search index of a library.
///
/// Readers take the current snapshot and query it without holding any lock.
/// Writers are serialized, build the next snapshot beside the current one and
/// swap it in.
pub struct LibraryIndex {
    current: RwLock<Arc<IndexSnapshot>>,
    writer: Mutex<()>,
    normalizer: Normalizer,
    embedder: Box<dyn Embedder>,
    settings: Settings,
    cache: Option<Mutex<EmbeddingCache>>,
}

impl LibraryIndex {
    pub fn new(settings: Settings, embedder: Box<dyn Embedder>) -> Result<Self> {
        settings.validate()?;
        if embedder.dim() != settings.index.dimension {
            return Err(Error::DimensionMismatch { expected: settings.index.dimension, actual: embedder.dim() })
                .context(format!("embedder {} does not match index.dimension", embedder.embedder_id()));
        }
        let snapshot = IndexSnapshot::new(settings.index.dimension, settings.index.metric)?;
        Ok(Self {
            current: RwLock::new(Arc::new(snapshot)),
            writer: Mutex::new(()),
            normalizer: Normalizer::new(settings.index.remove_stopwords),
            embedder,
            settings,
            cache: None,
        })
    }

    /// Index with the embedder named in `settings.index`.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let embedder = get_default_embedder(&settings.index)?;
        Self::new(settings, embedder)
    }

    pub fn with_cache(mut self, cache: EmbeddingCache) -> Self {
        self.cache = Some(Mutex::new(cache));
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.current.read().clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    pub fn is_consistent(&self) -> bool {
        self.snapshot().is_consistent()
    }

    fn swap(&self, next: IndexSnapshot) {
        *self.current.write() = Arc::new(next);
    }

    fn build(&self, src: &SourceDocument) -> Result<Built> {
        let searchable = src.searchable_text();
        let tokens = self.normalizer.normalize(&searchable);
        let content_hash = hash_content(&tokens.join(" "));
        let dim = self.embedder.dim();
        let id = self.embedder.embedder_id();

        let cached = self.cache.as_ref().and_then(|c| c.lock().get(id, dim, &content_hash).map(<[f32]>::to_vec));
        let cache_hit = cached.is_some();
        let embedding = match cached {
            Some(v) => v,
            None => {
                let v = self
                    .embedder
                    .embed_tokens(&tokens)
                    .with_context(|| format!("Failed to embed document {}", src.id))?;
                if v.len() != dim {
                    return Err(Error::DimensionMismatch { expected: dim, actual: v.len() })
                        .with_context(|| format!("Embedder returned a bad vector for document {}", src.id));
                }
                v
            }
        };
        let fresh = match (&self.cache, cache_hit) {
            (Some(_), false) => Some(CacheEntry::new(content_hash.clone(), id, embedding.clone())),
            _ => None,
        };

        let document = Document {
            id: src.id.clone(),
            tokens,
            body: src.text.clone(),
            body_tokens: self.normalizer.count_tokens(&src.text),
            raw_len: searchable.len(),
            embedding,
        };
        Ok(Built { document, content_hash, cache_hit, fresh })
    }

    fn remember(&self, fresh: Option<CacheEntry>) {
        if let (Some(cache), Some(entry)) = (&self.cache, fresh) {
            cache.lock().put_many([entry]);
        }
    }

    /// Index a new or changed document. On error the index is unchanged.
    pub fn on_add(&self, src: &SourceDocument) -> Result<()> {
        let _writer = self.writer.lock();
        let built = self.build(src)?;
        let mut next = IndexSnapshot::clone(&self.snapshot());
        next.insert(built.document).with_context(|| format!("Failed to index document {}", src.id))?;
        self.remember(built.fresh);
        self.swap(next);
        debug!(id = src.id.as_str(), cache_hit = built.cache_hit, "document indexed");
        Ok(())
    }

    /// Drop a document from every sub-index. Returns false, leaving the
    /// snapshot in place, when the id is unknown.
    pub fn on_remove(&self, id: &str) -> bool {
        let _writer = self.writer.lock();
        let current = self.snapshot();
        if !current.contains(id) {
            debug!(id, "remove of unknown document ignored");
            return false;
        }
        let mut next = IndexSnapshot::clone(&current);
        next.remove(id);
        self.swap(next);
        debug!(id, "document removed");
        true
    }

    pub fn apply(&self, event: LibraryEvent) -> Result<()> {
        match event {
            LibraryEvent::Added(doc) => self.on_add(&doc),
            LibraryEvent::Removed(id) => {
                self.on_remove(&id);
                Ok(())
            }
        }
    }

    pub fn rebuild(&self, source: &dyn DocumentSource) -> Result<RebuildReport> {
        self.rebuild_with_progress(source, |_, _| {})
    }

    /// Replace the whole index with the documents of `source`. `progress` is
    /// called with `(done, total)` after each document.
    ///
    /// The source is listed under the writer lock, so adds and removes
    /// either land before the listing or after the swap.
    pub fn rebuild_with_progress(
        &self,
        source: &dyn DocumentSource,
        mut progress: impl FnMut(usize, usize),
    ) -> Result<RebuildReport> {
        let _writer = self.writer.lock();
        let docs = source.list_documents().context("Failed to list library documents")?;
        let mut next = IndexSnapshot::new(self.settings.index.dimension, self.settings.index.metric)?;
        let mut report = RebuildReport::default();
        let mut live = HashSet::new();
        let total = docs.len();

        for (i, doc) in docs.iter().enumerate() {
            let outcome = self.build(doc).and_then(|built| {
                let hit = built.cache_hit;
                let hash = built.content_hash;
                next.insert(built.document)?;
                self.remember(built.fresh);
                live.insert(hash);
                Ok(hit)
            });
            match outcome {
                Ok(hit) => report.cache_hits += usize::from(hit),
                Err(e) => {
                    warn!(id = doc.id.as_str(), error = %format!("{e:#}"), "skipping document");
                    report.skipped.push(SkippedDocument { id: doc.id.clone(), reason: format!("{e:#}") });
                }
            }
            progress(i + 1, total);
        }
        report.indexed = next.len();

        if let Some(cache) = &self.cache {
            let mut cache = cache.lock();
            let pruned = cache.retain_hashes(&live);
            if let Err(e) = cache.save() {
                warn!(path = %cache.path().display(), error = %e, "failed to save embedding cache");
            }
            debug!(pruned, entries = cache.len(), "embedding cache updated");
        }

        self.swap(next);
        info!(
            indexed = report.indexed,
            skipped = report.skipped.len(),
            cache_hits = report.cache_hits,
            "library index rebuilt"
        );
        Ok(report)
    }

    /// Save the embedding cache if it has unsaved entries. Returns whether a
    /// write happened.
    pub fn persist_cache(&self) -> Result<bool> {
        let Some(cache) = &self.cache else { return Ok(false) };
        let mut cache = cache.lock();
        if !cache.is_dirty() {
            return Ok(false);
        }
        cache.save()?;
        Ok(true)
    }

    /// Ranked results for `query` against the current snapshot. `limit` is
    /// clamped to `search.max_limit`.
    pub fn search(&self, query: &str, limit: usize) -> Vec<ScoredResult> {
        let snapshot = self.snapshot();
        Ranker::new(&self.normalizer, self.embedder.as_ref(), &self.settings.search).search(&snapshot, query, limit)
    }

    pub fn search_default(&self, query: &str) -> Vec<ScoredResult> {
        self.search(query, self.settings.search.default_limit)
    }
}

impl SearchEngine for LibraryIndex {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<ScoredResult>> {
        Ok(LibraryIndex::search(self, query, limit))
    }
}
