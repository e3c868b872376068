use std::collections::HashMap;

use tracing::{debug, warn};

use shelf_core::config::{FusionWeights, SearchSettings};
use shelf_core::tokenize::Normalizer;
use shelf_core::traits::{DocumentScorer, Embedder};
use shelf_core::types::{ComponentScores, DocId, Metric, ScoredResult, SourceKind};
use shelf_text::{RegexScorer, SubstringScorer};
use shelf_vector::{similarity_from_distance, Neighbor};

use crate::snapshot::IndexSnapshot;

/// A query in the forms each scorer consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    /// Trimmed raw input, used as the regex pattern.
    pub raw: String,
    pub tokens: Vec<String>,
    /// Space-joined tokens, used as the substring needle.
    pub normalized: String,
}

impl QueryPlan {
    pub fn new(query: &str, normalizer: &Normalizer) -> Self {
        let raw = query.trim().to_string();
        let tokens = normalizer.normalize(&raw);
        let normalized = tokens.join(" ");
        Self { raw, tokens, normalized }
    }

    pub fn is_blank(&self) -> bool {
        self.raw.is_empty()
    }
}

/// Similarities of the KNN candidates. Documents outside the candidate set score 0.
#[derive(Debug, Clone, Default)]
pub struct VectorScorer {
    similarities: HashMap<DocId, f32>,
}

impl VectorScorer {
    pub fn from_neighbors(neighbors: &[Neighbor], metric: Metric) -> Self {
        let similarities =
            neighbors.iter().map(|n| (n.id.clone(), similarity_from_distance(metric, n.distance))).collect();
        Self { similarities }
    }

    pub fn disabled() -> Self {
        Self::default()
    }
}

impl DocumentScorer for VectorScorer {
    fn kind(&self) -> SourceKind {
        SourceKind::Vector
    }

    fn score(&self, id: &str) -> f32 {
        self.similarities.get(id).copied().unwrap_or(0.0)
    }
}

/// The three prepared scorers of one query and their blend weights.
pub struct Fusion<'a> {
    scorers: [&'a dyn DocumentScorer; 3],
    weights: FusionWeights,
}

impl<'a> Fusion<'a> {
    pub fn new(
        substring: &'a SubstringScorer<'a>,
        regex: &'a RegexScorer<'a>,
        vector: &'a VectorScorer,
        weights: FusionWeights,
    ) -> Self {
        Self { scorers: [substring, regex, vector], weights }
    }

    pub fn scores(&self, id: &str) -> ComponentScores {
        let mut scores = ComponentScores::default();
        for scorer in self.scorers {
            scores.set(scorer.kind(), scorer.score(id).clamp(0.0, 1.0));
        }
        scores
    }

    pub fn combine(&self, scores: &ComponentScores) -> f32 {
        let w = &self.weights;
        w.substring * scores.substring + w.regex * scores.regex + w.vector * scores.vector
    }
}

/// Runs queries against a snapshot.
pub struct Ranker<'a> {
    normalizer: &'a Normalizer,
    embedder: &'a dyn Embedder,
    settings: &'a SearchSettings,
}

impl<'a> Ranker<'a> {
    pub fn new(normalizer: &'a Normalizer, embedder: &'a dyn Embedder, settings: &'a SearchSettings) -> Self {
        Self { normalizer, embedder, settings }
    }

    /// Score every document of `snapshot`, best first.
    ///
    /// A non-empty query keeps documents scoring above `min_score`; a blank
    /// query keeps everything with a zero vector term, so in id order. Ties are
    /// broken by ascending id, so the output is a pure function of the
    /// snapshot and the arguments.
    pub fn search(&self, snapshot: &IndexSnapshot, query: &str, limit: usize) -> Vec<ScoredResult> {
        let limit = limit.min(self.settings.max_limit);
        if limit == 0 || snapshot.is_empty() {
            return Vec::new();
        }

        let plan = QueryPlan::new(query, self.normalizer);
        let saturation = self.settings.density_per_mille;
        let substring = SubstringScorer::prepare(snapshot.substring(), &plan.normalized, saturation);
        let regex = RegexScorer::compile(snapshot.regex(), &plan.raw, self.settings.regex_size_limit, saturation);
        let vector = self.vector_scorer(snapshot, &plan, limit);
        let fusion = Fusion::new(&substring, &regex, &vector, self.settings.weights);

        let blank = plan.is_blank();
        let mut results: Vec<ScoredResult> = snapshot
            .ids()
            .into_iter()
            .filter_map(|id| {
                let scores = fusion.scores(id);
                let combined = fusion.combine(&scores);
                if !blank && combined <= self.settings.min_score {
                    return None;
                }
                Some(ScoredResult { id: id.to_string(), scores, combined, rank: 0 })
            })
            .collect();

        results.sort_by(|a, b| b.combined.total_cmp(&a.combined).then_with(|| a.id.cmp(&b.id)));
        results.truncate(limit);
        for (i, r) in results.iter_mut().enumerate() {
            r.rank = i + 1;
        }
        debug!(query = plan.raw.as_str(), regex = regex.is_enabled(), hits = results.len(), "search finished");
        results
    }

    /// Similarities of the KNN candidates that share at least one whole token
    /// with the query. Hash collisions alone never earn a vector score.
    fn vector_scorer(&self, snapshot: &IndexSnapshot, plan: &QueryPlan, limit: usize) -> VectorScorer {
        if plan.tokens.is_empty() {
            return VectorScorer::disabled();
        }
        let vectors = snapshot.vectors();
        let k = self.settings.knn_candidates.max(limit).min(vectors.len());
        let query_vec = match self.embedder.embed_tokens(&plan.tokens) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "query embedding failed, vector scores set to 0");
                return VectorScorer::disabled();
            }
        };
        match vectors.knn(&query_vec, k) {
            Ok(mut neighbors) => {
                neighbors.retain(|n| snapshot.substring().shares_token(&n.id, &plan.tokens));
                VectorScorer::from_neighbors(&neighbors, vectors.metric())
            }
            Err(e) => {
                warn!(error = %e, "vector lookup failed, vector scores set to 0");
                VectorScorer::disabled()
            }
        }
    }
}
