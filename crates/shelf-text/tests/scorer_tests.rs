use shelf_core::tokenize::Normalizer;
use shelf_core::traits::DocumentScorer;
use shelf_core::types::SourceKind;
use shelf_text::{RegexCorpus, RegexScorer, SubstringIndex, SubstringScorer};

const SATURATION: f32 = 10.0;
const SIZE_LIMIT: usize = 1 << 20;

fn substring_index(docs: &[(&str, &str)]) -> SubstringIndex {
    let n = Normalizer::default();
    let mut index = SubstringIndex::new();
    for (id, text) in docs {
        index.insert(*id, &n.normalize(text));
    }
    index
}

fn regex_corpus(docs: &[(&str, &str)]) -> RegexCorpus {
    let n = Normalizer::default();
    let mut corpus = RegexCorpus::new();
    for (id, text) in docs {
        corpus.insert(*id, text, n.count_tokens(text));
    }
    corpus
}

#[test]
fn substring_matches_normalized_phrase() {
    let index = substring_index(&[("1", "The QUICK brown fox."), ("2", "A lazy dog sleeps")]);
    let q = Normalizer::default().normalize_to_string("quick, Brown");
    let scorer = SubstringScorer::prepare(&index, &q, SATURATION);
    assert_eq!(scorer.kind(), SourceKind::Substring);
    assert_eq!(scorer.score("1"), 1.0);
    assert_eq!(scorer.score("2"), 0.0);
    assert_eq!(scorer.score("unknown"), 0.0);
}

#[test]
fn substring_empty_query_scores_zero() {
    let index = substring_index(&[("1", "anything at all")]);
    let scorer = SubstringScorer::prepare(&index, "", SATURATION);
    assert_eq!(scorer.score("1"), 0.0);
}

#[test]
fn substring_normalizes_by_length() {
    let filler = "word ".repeat(2_000);
    let long = format!("{filler} whale {filler}");
    let short = "whale whale whale";
    let index = substring_index(&[("long", &long), ("short", short)]);
    let scorer = SubstringScorer::prepare(&index, "whale", SATURATION);
    let s_long = scorer.score("long");
    let s_short = scorer.score("short");
    assert!(s_long > 0.0 && s_long < 0.1, "one hit in ~4000 tokens is sparse: {s_long}");
    assert_eq!(s_short, 1.0);
    assert_eq!(index.count("short", "whale"), 3);
}

#[test]
fn regex_counts_case_insensitive_matches() {
    let corpus = regex_corpus(&[("1", "Whale! whale? WHALE."), ("2", "no such animal here")]);
    let scorer = RegexScorer::compile(&corpus, "wh[a-z]le", SIZE_LIMIT, SATURATION);
    assert!(scorer.is_enabled());
    assert_eq!(scorer.kind(), SourceKind::Regex);
    assert_eq!(scorer.count("1"), 3);
    assert_eq!(scorer.score("1"), 1.0);
    assert_eq!(scorer.score("2"), 0.0);
}

#[test]
fn invalid_regex_degrades_to_zero() {
    let corpus = regex_corpus(&[("1", "an [unclosed bracket")]);
    let scorer = RegexScorer::compile(&corpus, "[unclosed", SIZE_LIMIT, SATURATION);
    assert!(!scorer.is_enabled());
    assert_eq!(scorer.score("1"), 0.0);
}

#[test]
fn empty_or_blank_pattern_is_disabled() {
    let corpus = regex_corpus(&[("1", "text")]);
    assert!(!RegexScorer::compile(&corpus, "", SIZE_LIMIT, SATURATION).is_enabled());
    assert!(!RegexScorer::compile(&corpus, "   ", SIZE_LIMIT, SATURATION).is_enabled());
}

#[test]
fn empty_matches_are_not_counted() {
    let corpus = regex_corpus(&[("1", "bbb"), ("2", "aaa b")]);
    let scorer = RegexScorer::compile(&corpus, "a*", SIZE_LIMIT, SATURATION);
    assert_eq!(scorer.count("1"), 0);
    assert_eq!(scorer.count("2"), 1);
}

#[test]
fn oversized_pattern_degrades_to_zero() {
    let corpus = regex_corpus(&[("1", "aaaa")]);
    let scorer = RegexScorer::compile(&corpus, "(?:a{100}){100}", 1024, SATURATION);
    assert!(!scorer.is_enabled());
    assert_eq!(scorer.score("1"), 0.0);
}

#[test]
fn indices_insert_and_remove() {
    let mut index = substring_index(&[("1", "one"), ("2", "two")]);
    assert!(index.remove("1"));
    assert!(!index.remove("1"));
    assert_eq!(index.ids().collect::<Vec<_>>(), vec!["2"]);
    assert_eq!(index.text("2"), Some("two"));

    let mut corpus = regex_corpus(&[("1", "One")]);
    assert_eq!(corpus.body("1"), Some("One"));
    assert!(corpus.remove("1"));
    assert!(corpus.is_empty());
}

#[test]
fn shared_tokens_are_whole_words() {
    let index = substring_index(&[("1", "The quick brown fox")]);
    let q = |words: &[&str]| words.iter().map(|w| w.to_string()).collect::<Vec<_>>();
    assert!(index.shares_token("1", &q(&["zebra", "fox"])));
    assert!(!index.shares_token("1", &q(&["qui", "the"])));
    assert!(!index.shares_token("1", &[]));
    assert!(!index.shares_token("unknown", &q(&["fox"])));
}
