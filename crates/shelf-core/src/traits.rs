use crate::types::{DocId, ScoredResult, SourceDocument, SourceKind};

/// Maps normalized tokens to a fixed-dimensional vector.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the embedding function (e.g., `hashed-xxh64:d1024`).
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn embed_tokens(&self, tokens: &[String]) -> anyhow::Result<Vec<f32>>;

    fn embed_batch(&self, docs: &[Vec<String>]) -> anyhow::Result<Vec<Vec<f32>>> {
        docs.iter().map(|tokens| self.embed_tokens(tokens)).collect()
    }
}

/// "Score this document against the prepared query", in `[0, 1]`.
pub trait DocumentScorer {
    fn kind(&self) -> SourceKind;
    fn score(&self, id: &str) -> f32;
}

/// The library's authoritative document set, used for full rebuilds.
pub trait DocumentSource {
    fn list_documents(&self) -> anyhow::Result<Vec<SourceDocument>>;
}

/// Change notifications from the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryEvent {
    Added(SourceDocument),
    Removed(DocId),
}

pub trait SearchEngine: Send + Sync {
    fn search(&self, query: &str, limit: usize) -> anyhow::Result<Vec<ScoredResult>>;
}

impl DocumentSource for Vec<SourceDocument> {
    fn list_documents(&self) -> anyhow::Result<Vec<SourceDocument>> {
        Ok(self.clone())
    }
}
