//! Text normalization shared by every scorer and the embedder.

/// English stopwords dropped by the default normalizer. Kept sorted so lookup
/// is a binary search.
pub const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "can", "could", "did", "do", "does",
    "for", "from", "had", "has", "have", "having", "he", "how", "if", "in", "is", "it", "its",
    "may", "might", "must", "not", "of", "on", "or", "shall", "should", "so", "than", "that",
    "the", "their", "them", "then", "there", "these", "they", "this", "to", "was", "what", "when",
    "where", "which", "who", "whom", "whose", "why", "will", "with", "would",
];

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.binary_search(&token).is_ok()
}

/// Splits text into lowercase alphanumeric tokens.
///
/// Any non-alphanumeric character (whitespace, punctuation, `_`) separates
/// tokens. Output depends only on the input text and `remove_stopwords`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalizer {
    remove_stopwords: bool,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self { remove_stopwords: true }
    }
}

impl Normalizer {
    pub fn new(remove_stopwords: bool) -> Self {
        Self { remove_stopwords }
    }

    pub fn removes_stopwords(&self) -> bool {
        self.remove_stopwords
    }

    pub fn normalize(&self, text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .filter(|t| !(self.remove_stopwords && is_stop_word(t)))
            .collect()
    }

    pub fn normalize_to_string(&self, text: &str) -> String {
        self.normalize(text).join(" ")
    }

    pub fn count_tokens(&self, text: &str) -> usize {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .filter(|t| !(self.remove_stopwords && is_stop_word(&t.to_lowercase())))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_words_are_sorted() {
        let mut sorted = STOP_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOP_WORDS);
    }

    #[test]
    fn count_matches_normalize_len() {
        let n = Normalizer::default();
        let text = "The Quick, brown fox -- jumped_over THE lazy dog!";
        assert_eq!(n.count_tokens(text), n.normalize(text).len());
    }
}
