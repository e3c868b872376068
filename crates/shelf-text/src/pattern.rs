use std::collections::BTreeMap;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use shelf_core::traits::DocumentScorer;
use shelf_core::types::{DocId, SourceKind};

use crate::density_score;

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    body: Arc<str>,
    tokens: usize,
}

/// Raw document bodies searched by user patterns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegexCorpus {
    entries: BTreeMap<DocId, Entry>,
}

impl RegexCorpus {
    pub fn new() -> Self { Self::default() }

    /// `tokens` is the normalized token count of `body`, used for length normalization.
    pub fn insert(&mut self, id: impl Into<DocId>, body: &str, tokens: usize) {
        self.entries.insert(id.into(), Entry { body: Arc::from(body), tokens });
    }

    pub fn remove(&mut self, id: &str) -> bool { self.entries.remove(id).is_some() }
    pub fn contains(&self, id: &str) -> bool { self.entries.contains_key(id) }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    pub fn ids(&self) -> impl Iterator<Item = &str> { self.entries.keys().map(String::as_str) }
    pub fn body(&self, id: &str) -> Option<&str> { self.entries.get(id).map(|e| &*e.body) }
}

/// Regex scorer for one query. An empty or invalid pattern disables it.
pub struct RegexScorer<'a> {
    corpus: &'a RegexCorpus,
    pattern: Option<Regex>,
    saturation: f32,
}

impl<'a> RegexScorer<'a> {
    pub fn compile(corpus: &'a RegexCorpus, query: &str, size_limit: usize, saturation: f32) -> Self {
        let query = query.trim();
        let pattern = if query.is_empty() {
            None
        } else {
            match RegexBuilder::new(query).case_insensitive(true).size_limit(size_limit).build() {
                Ok(re) => Some(re),
                Err(e) => {
                    debug!(pattern = query, error = %e, "query is not a usable regex, regex scorer disabled");
                    None
                }
            }
        };
        Self { corpus, pattern, saturation }
    }

    pub fn is_enabled(&self) -> bool {
        self.pattern.is_some()
    }

    /// Non-empty matches of the pattern in the document body.
    pub fn count(&self, id: &str) -> usize {
        match (&self.pattern, self.corpus.entries.get(id)) {
            (Some(re), Some(entry)) => re.find_iter(&entry.body).filter(|m| !m.is_empty()).count(),
            _ => 0,
        }
    }
}

impl DocumentScorer for RegexScorer<'_> {
    fn kind(&self) -> SourceKind {
        SourceKind::Regex
    }

    fn score(&self, id: &str) -> f32 {
        let Some(entry) = self.corpus.entries.get(id) else { return 0.0 };
        density_score(self.count(id), entry.tokens, self.saturation)
    }
}
