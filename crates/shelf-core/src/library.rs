//! Reads the converted library from disk: `index.json` plus Markdown books.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::{resolve_with_base, LibrarySettings};
use crate::error::Error;
use crate::traits::DocumentSource;
use crate::types::{BookMeta, DocId, SourceDocument};

/// One record of the library index written by the book processor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryEntry {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: DocId,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    /// Path of the Markdown file, relative to the books directory.
    pub markdown_path: String,
    #[serde(default)]
    pub added_at: Option<String>,
    #[serde(default)]
    pub word_count: u64,
    #[serde(default)]
    pub char_count: u64,
}

impl LibraryEntry {
    pub fn meta(&self) -> BookMeta {
        BookMeta {
            title: self.title.clone(),
            authors: self.authors.clone(),
            subjects: self.subjects.clone(),
            languages: self.languages.clone(),
        }
    }
}

fn id_from_number_or_string<'de, D>(deserializer: D) -> std::result::Result<DocId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Num(u64),
        Str(String),
    }
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Num(n) => n.to_string(),
        RawId::Str(s) => s,
    })
}

/// The books directory of a running application.
#[derive(Debug, Clone)]
pub struct LibraryDir {
    books_dir: PathBuf,
    index_file: PathBuf,
}

impl LibraryDir {
    pub fn new(books_dir: impl Into<PathBuf>) -> Self {
        let books_dir = books_dir.into();
        let index_file = books_dir.join("index.json");
        Self { books_dir, index_file }
    }

    /// Resolve `books_dir` against `base`, and `index_file` against the books directory.
    pub fn from_settings(settings: &LibrarySettings, base: &Path) -> Self {
        let books_dir = resolve_with_base(base, &settings.books_dir);
        let index_file = resolve_with_base(&books_dir, &settings.index_file);
        Self { books_dir, index_file }
    }

    pub fn books_dir(&self) -> &Path {
        &self.books_dir
    }

    pub fn index_file(&self) -> &Path {
        &self.index_file
    }

    pub fn entries(&self) -> Result<Vec<LibraryEntry>> {
        let raw = fs::read_to_string(&self.index_file)
            .with_context(|| format!("Failed to read library index {}", self.index_file.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse library index {}", self.index_file.display()))
    }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
        }
    }

    fn documents_from_index(&self) -> Result<Vec<SourceDocument>> {
        let entries = self.entries()?;
        let mut docs = Vec::with_capacity(entries.len());
        for entry in entries {
            let path = self.books_dir.join(&entry.markdown_path);
            match self.read_file_content(&path) {
                Ok(text) => docs.push(SourceDocument { id: entry.id.clone(), text, meta: entry.meta() }),
                Err(e) => warn!(id = %entry.id, path = %path.display(), error = %e, "skipping unreadable book"),
            }
        }
        Ok(docs)
    }

    fn documents_from_scan(&self) -> Result<Vec<SourceDocument>> {
        let mut docs = Vec::new();
        for path in self.list_markdown_files() {
            let Some(id) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else { continue };
            match self.read_file_content(&path) {
                Ok(text) => docs.push(SourceDocument::new(id, text)),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable book"),
            }
        }
        Ok(docs)
    }

    fn list_markdown_files(&self) -> Vec<PathBuf> {
        let mut md_files = Vec::new();
        for entry in walkdir::WalkDir::new(&self.books_dir).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("md") {
                md_files.push(path.to_path_buf());
            }
        }
        md_files.sort();
        md_files
    }
}

impl DocumentSource for LibraryDir {
    fn list_documents(&self) -> Result<Vec<SourceDocument>> {
        if !self.books_dir.is_dir() {
            return Err(Error::NotFound(format!("books directory {}", self.books_dir.display())).into());
        }
        let docs = if self.index_file.is_file() {
            self.documents_from_index()?
        } else {
            debug!(dir = %self.books_dir.display(), "no library index, scanning for markdown files");
            self.documents_from_scan()?
        };
        debug!(count = docs.len(), "listed library documents");
        Ok(docs)
    }
}
