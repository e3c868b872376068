use std::collections::BTreeSet;

use shelf_core::error::Result;
use shelf_core::types::{Document, Metric};
use shelf_text::{RegexCorpus, SubstringIndex};
use shelf_vector::VectorIndex;

/// Consistent, queryable state of the three sub-indices.
///
/// Through `insert`/`remove` an id is either in all three sub-indices or in
/// none. `from_parts` can assemble a partial snapshot; queries against it
/// score the missing terms as 0.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSnapshot {
    substring: SubstringIndex,
    regex: RegexCorpus,
    vectors: VectorIndex,
}

impl IndexSnapshot {
    pub fn new(dim: usize, metric: Metric) -> Result<Self> {
        Ok(Self { substring: SubstringIndex::new(), regex: RegexCorpus::new(), vectors: VectorIndex::new(dim, metric)? })
    }

    pub fn from_parts(substring: SubstringIndex, regex: RegexCorpus, vectors: VectorIndex) -> Self {
        Self { substring, regex, vectors }
    }

    /// Insert or replace a document in every sub-index. The vector is added
    /// first, so a dimension error leaves the snapshot untouched.
    pub fn insert(&mut self, doc: Document) -> Result<()> {
        self.vectors.add(doc.id.clone(), doc.embedding)?;
        self.substring.insert(doc.id.clone(), &doc.tokens);
        self.regex.insert(doc.id, &doc.body, doc.body_tokens);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let in_vectors = self.vectors.remove(id);
        let in_substring = self.substring.remove(id);
        let in_regex = self.regex.remove(id);
        in_vectors || in_substring || in_regex
    }

    pub fn contains(&self, id: &str) -> bool {
        self.substring.contains(id) || self.regex.contains(id) || self.vectors.contains(id)
    }

    /// Every id known to any sub-index, ascending.
    pub fn ids(&self) -> BTreeSet<&str> {
        self.substring.ids().chain(self.regex.ids()).chain(self.vectors.ids()).collect()
    }

    pub fn len(&self) -> usize {
        self.ids().len()
    }

    pub fn is_empty(&self) -> bool {
        self.substring.is_empty() && self.regex.is_empty() && self.vectors.is_empty()
    }

    pub fn is_consistent(&self) -> bool {
        self.substring.ids().eq(self.regex.ids()) && self.substring.ids().eq(self.vectors.ids())
    }

    pub fn substring(&self) -> &SubstringIndex { &self.substring }
    pub fn regex(&self) -> &RegexCorpus { &self.regex }
    pub fn vectors(&self) -> &VectorIndex { &self.vectors }
}
