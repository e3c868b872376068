use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use shelf_core::traits::DocumentScorer;
use shelf_core::types::{DocId, SourceKind};

use crate::density_score;

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    text: Arc<str>,
    tokens: usize,
    vocabulary: Arc<BTreeSet<String>>,
}

/// Normalized searchable text per document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubstringIndex {
    entries: BTreeMap<DocId, Entry>,
}

impl SubstringIndex {
    pub fn new() -> Self { Self::default() }

    /// `tokens` is the normalized token sequence; it is stored space-joined.
    pub fn insert(&mut self, id: impl Into<DocId>, tokens: &[String]) {
        let entry = Entry {
            text: Arc::from(tokens.join(" ")),
            tokens: tokens.len(),
            vocabulary: Arc::new(tokens.iter().cloned().collect()),
        };
        self.entries.insert(id.into(), entry);
    }

    pub fn remove(&mut self, id: &str) -> bool { self.entries.remove(id).is_some() }
    pub fn contains(&self, id: &str) -> bool { self.entries.contains_key(id) }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    pub fn ids(&self) -> impl Iterator<Item = &str> { self.entries.keys().map(String::as_str) }
    pub fn text(&self, id: &str) -> Option<&str> { self.entries.get(id).map(|e| &*e.text) }

    /// Whether the document contains at least one of `tokens` as a whole token.
    pub fn shares_token(&self, id: &str, tokens: &[String]) -> bool {
        self.entries.get(id).is_some_and(|e| tokens.iter().any(|t| e.vocabulary.contains(t)))
    }

    /// Non-overlapping occurrences of `needle` in the document's normalized text.
    pub fn count(&self, id: &str, needle: &str) -> usize {
        if needle.is_empty() {
            return 0;
        }
        self.entries.get(id).map_or(0, |e| e.text.matches(needle).count())
    }
}

/// Substring scorer prepared for one normalized query.
pub struct SubstringScorer<'a> {
    index: &'a SubstringIndex,
    needle: String,
    saturation: f32,
}

impl<'a> SubstringScorer<'a> {
    pub fn prepare(index: &'a SubstringIndex, normalized_query: &str, saturation: f32) -> Self {
        Self { index, needle: normalized_query.to_string(), saturation }
    }
}

impl DocumentScorer for SubstringScorer<'_> {
    fn kind(&self) -> SourceKind {
        SourceKind::Substring
    }

    fn score(&self, id: &str) -> f32 {
        let Some(entry) = self.index.entries.get(id) else { return 0.0 };
        density_score(self.index.count(id, &self.needle), entry.tokens, self.saturation)
    }
}
