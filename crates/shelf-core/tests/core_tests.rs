use std::fs;

use tempfile::TempDir;

use shelf_core::config::{Config, FusionWeights, Settings};
use shelf_core::library::LibraryDir;
use shelf_core::tokenize::Normalizer;
use shelf_core::traits::DocumentSource;
use shelf_core::types::{BookMeta, Metric, SourceDocument};

#[test]
fn normalize_lowercases_and_strips_punctuation() {
    let n = Normalizer::default();
    assert_eq!(n.normalize("The Quick, brown FOX!!"), vec!["quick", "brown", "fox"]);
    assert_eq!(n.normalize("  spaced\t\n out  "), vec!["spaced", "out"]);
    assert_eq!(n.normalize("zzz_no_match"), vec!["zzz", "no", "match"]);
    assert!(n.normalize("").is_empty());
    assert!(n.normalize("...!?").is_empty());
}

#[test]
fn normalize_keeps_stopwords_when_disabled() {
    let n = Normalizer::new(false);
    assert_eq!(n.normalize("The fox and the dog"), vec!["the", "fox", "and", "the", "dog"]);
    assert_eq!(Normalizer::default().normalize("The fox and the dog"), vec!["fox", "dog"]);
}

#[test]
fn normalize_is_deterministic_and_unicode_aware() {
    let n = Normalizer::default();
    let text = "Café Éclair — naïve façade; Ürümqi 42";
    let a = n.normalize(text);
    let b = n.normalize(text);
    assert_eq!(a, b);
    assert_eq!(a, vec!["café", "éclair", "naïve", "façade", "ürümqi", "42"]);
    assert_eq!(n.normalize_to_string(text), "café éclair naïve façade ürümqi 42");
}

#[test]
fn searchable_text_folds_metadata() {
    let doc = SourceDocument::new("11", "Down the rabbit hole").with_meta(BookMeta {
        title: "Alice's Adventures in Wonderland".to_string(),
        authors: vec!["Carroll, Lewis".to_string()],
        subjects: vec!["Fantasy".to_string()],
        languages: vec!["en".to_string()],
    });
    let text = doc.searchable_text();
    assert!(text.starts_with("Alice's Adventures in Wonderland\nCarroll, Lewis\nFantasy\n"));
    assert!(text.ends_with("Down the rabbit hole"));
    assert_eq!(SourceDocument::new("1", "body").searchable_text(), "body");
}

#[test]
fn default_settings_are_valid() {
    let settings = Settings::default();
    settings.validate().expect("defaults validate");
    assert!((settings.search.weights.sum() - 1.0).abs() < 1e-6);
    assert_eq!(settings.index.metric, Metric::Cosine);
    assert_eq!(settings.search.default_limit, 50);
}

#[test]
fn settings_reject_bad_weights_and_limits() {
    let mut settings = Settings::default();
    settings.search.weights = FusionWeights { substring: 0.6, regex: 0.3, vector: 0.3 };
    assert!(settings.validate().is_err(), "weights summing to 1.2 are rejected");

    let mut settings = Settings::default();
    settings.search.weights = FusionWeights { substring: 1.2, regex: -0.2, vector: 0.0 };
    assert!(settings.validate().is_err(), "negative weights are rejected");

    let mut settings = Settings::default();
    settings.search.default_limit = 500;
    assert!(settings.validate().is_err(), "default limit above max limit is rejected");

    let mut settings = Settings::default();
    settings.index.dimension = 0;
    assert!(settings.validate().is_err(), "zero dimension is rejected");
}

#[test]
fn config_load_from_merges_toml_over_defaults() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[index]\ndimension = 256\nmetric = \"euclidean\"\n\n[search]\ndefault_limit = 10\n\n[search.weights]\nsubstring = 0.4\nregex = 0.2\nvector = 0.4\n",
    )
    .unwrap();

    let config = Config::load_from(tmp.path()).expect("load");
    let settings = config.settings().expect("settings");
    assert_eq!(settings.index.dimension, 256);
    assert_eq!(settings.index.metric, Metric::Euclidean);
    assert_eq!(settings.search.default_limit, 10);
    assert_eq!(settings.search.max_limit, 200, "unset keys keep defaults");
    assert!((settings.search.weights.vector - 0.4).abs() < 1e-6);
    let dim: usize = config.get("index.dimension").expect("get");
    assert_eq!(dim, 256);
}

#[test]
fn config_load_from_rejects_invalid_weights() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[search.weights]\nsubstring = 0.9\nregex = 0.9\nvector = 0.9\n").unwrap();
    assert!(Config::load_from(tmp.path()).is_err());
}

#[test]
fn library_dir_reads_index_with_numeric_ids() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir_all(dir.join("markdown")).unwrap();
    fs::write(dir.join("markdown/84_frankenstein.md"), "# Frankenstein\n\nYou will rejoice to hear").unwrap();
    fs::write(
        dir.join("index.json"),
        r#"[
          {"id": 84, "title": "Frankenstein", "authors": ["Shelley, Mary"], "subjects": ["Horror"],
           "languages": ["en"], "markdown_path": "markdown/84_frankenstein.md",
           "added_at": "2024-05-01 10:00:00.123456", "word_count": 6, "char_count": 40},
          {"id": "missing", "title": "Ghost", "markdown_path": "markdown/ghost.md"}
        ]"#,
    )
    .unwrap();

    let library = LibraryDir::new(dir);
    let entries = library.entries().expect("entries");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, "84");

    let docs = library.list_documents().expect("documents");
    assert_eq!(docs.len(), 1, "books whose file is missing are skipped");
    assert_eq!(docs[0].id, "84");
    assert_eq!(docs[0].meta.title, "Frankenstein");
    assert_eq!(docs[0].meta.authors, vec!["Shelley, Mary".to_string()]);
    assert!(docs[0].text.contains("rejoice"));
}

#[test]
fn library_dir_scans_markdown_without_index() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir_all(dir.join("nested")).unwrap();
    fs::write(dir.join("b.md"), "bravo").unwrap();
    fs::write(dir.join("nested/a.md"), "alpha").unwrap();
    fs::write(dir.join("notes.txt"), "ignored").unwrap();

    let docs = LibraryDir::new(dir).list_documents().expect("scan");
    let mut ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn library_dir_missing_directory_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let library = LibraryDir::new(tmp.path().join("nope"));
    assert!(library.list_documents().is_err());
}
