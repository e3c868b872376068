//! Domain types shared by the scorers, the vector index and the fusion engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type DocId = String;

/// Catalog metadata carried alongside a book's text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookMeta {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
}

/// A library book as handed over by the library collaborator.
///
/// - `id`: unique book identifier (the catalog id as a string)
/// - `text`: the Markdown body
/// - `meta`: title/authors/subjects, folded into the searchable text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceDocument {
    pub id: DocId,
    pub text: String,
    #[serde(default)]
    pub meta: BookMeta,
}

impl SourceDocument {
    pub fn new(id: impl Into<DocId>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), meta: BookMeta::default() }
    }

    pub fn with_meta(mut self, meta: BookMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Title, authors, subjects and body joined by newlines. Empty metadata
    /// fields are skipped so a bare document's searchable text is its body.
    pub fn searchable_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if !self.meta.title.is_empty() {
            parts.push(&self.meta.title);
        }
        parts.extend(self.meta.authors.iter().map(String::as_str));
        parts.extend(self.meta.subjects.iter().map(String::as_str));
        parts.push(&self.text);
        parts.join("\n")
    }
}

/// Indexed form of a book. Built once per add/rebuild and then split across
/// the three sub-indices of a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocId,
    /// Normalized tokens of the searchable text.
    pub tokens: Vec<String>,
    /// Raw Markdown body, matched by the regex scorer.
    pub body: String,
    pub body_tokens: usize,
    /// Byte length of the raw searchable text.
    pub raw_len: usize,
    pub embedding: Vec<f32>,
}

/// Indicates which scorer produced a component score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Substring,
    Regex,
    Vector,
}

/// Distance function used by the vector index.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    Euclidean,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Cosine => f.write_str("cosine"),
            Metric::Euclidean => f.write_str("euclidean"),
        }
    }
}

impl FromStr for Metric {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(Metric::Cosine),
            "euclidean" | "l2" => Ok(Metric::Euclidean),
            other => Err(crate::error::Error::InvalidConfig(format!("unknown metric '{other}'"))),
        }
    }
}

/// Per-scorer scores of one document, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ComponentScores {
    pub substring: f32,
    pub regex: f32,
    pub vector: f32,
}

impl ComponentScores {
    pub fn get(&self, kind: SourceKind) -> f32 {
        match kind {
            SourceKind::Substring => self.substring,
            SourceKind::Regex => self.regex,
            SourceKind::Vector => self.vector,
        }
    }

    pub fn set(&mut self, kind: SourceKind, score: f32) {
        match kind {
            SourceKind::Substring => self.substring = score,
            SourceKind::Regex => self.regex = score,
            SourceKind::Vector => self.vector = score,
        }
    }
}

/// One ranked search result. Recomputed per query, never persisted.
///
/// `rank` is the 1-based position in the returned list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredResult {
    pub id: DocId,
    pub scores: ComponentScores,
    pub combined: f32,
    pub rank: usize,
}
