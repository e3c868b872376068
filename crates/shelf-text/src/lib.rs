pub mod pattern;
pub mod substring;

pub use pattern::{RegexCorpus, RegexScorer};
pub use substring::{SubstringIndex, SubstringScorer};

/// Convert a match count into a length-normalized score in `[0, 1]`.
///
/// `count` matches over `tokens` tokens is a density per 1000 tokens;
/// `saturation` matches per 1000 tokens map to 1.0 and anything denser is capped.
pub fn density_score(count: usize, tokens: usize, saturation: f32) -> f32 {
    if count == 0 {
        return 0.0;
    }
    let per_mille = count as f32 * 1000.0 / tokens.max(1) as f32;
    (per_mille / saturation).min(1.0)
}
