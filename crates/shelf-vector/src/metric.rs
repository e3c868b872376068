use shelf_core::types::Metric;

/// Cosine similarity clipped to `[-1, 1]`. A zero-norm operand yields 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0f32;
    let mut na = 0f32;
    let mut nb = 0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    (dot / (na.sqrt() * nb.sqrt())).clamp(-1.0, 1.0)
}

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt()
}

/// Largest distance between two unit vectors.
pub const MAX_EUCLIDEAN_DISTANCE: f32 = 2.0;

fn is_zero(v: &[f32]) -> bool {
    v.iter().all(|x| *x == 0.0)
}

/// Distance under `metric`; cosine distance is `1 - similarity`, in `[0, 2]`.
///
/// A zero vector is unrelated to everything under both metrics: cosine
/// distance 1, euclidean distance `MAX_EUCLIDEAN_DISTANCE`.
pub fn distance(metric: Metric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        Metric::Cosine => 1.0 - cosine_similarity(a, b),
        Metric::Euclidean if is_zero(a) || is_zero(b) => MAX_EUCLIDEAN_DISTANCE,
        Metric::Euclidean => euclidean_distance(a, b),
    }
}

/// Map a distance to a `[0, 1]` score where orthogonal unit vectors score 0
/// and identical vectors score 1.
pub fn similarity_from_distance(metric: Metric, d: f32) -> f32 {
    let normalized = match metric {
        Metric::Cosine => d,
        Metric::Euclidean => d / std::f32::consts::SQRT_2,
    };
    (1.0 - normalized.clamp(0.0, 1.0)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(distance(Metric::Cosine, &[0.0, 0.0], &[0.0, 0.0]), 1.0);
    }

    #[test]
    fn cosine_is_clipped() {
        let v = [1e-20f32, 1e-20];
        let s = cosine_similarity(&v, &v);
        assert!((-1.0..=1.0).contains(&s));
    }

    #[test]
    fn similarity_mapping() {
        assert_eq!(similarity_from_distance(Metric::Cosine, 0.0), 1.0);
        assert_eq!(similarity_from_distance(Metric::Cosine, 1.0), 0.0);
        assert_eq!(similarity_from_distance(Metric::Cosine, 1.7), 0.0);
        assert!((similarity_from_distance(Metric::Cosine, 0.25) - 0.75).abs() < 1e-6);
        let orthogonal = euclidean_distance(&[1.0, 0.0], &[0.0, 1.0]);
        assert!(similarity_from_distance(Metric::Euclidean, orthogonal) < 1e-6);
        assert_eq!(similarity_from_distance(Metric::Euclidean, 0.0), 1.0);
    }

    #[test]
    fn euclidean_zero_vector_scores_zero() {
        let d = distance(Metric::Euclidean, &[0.0, 0.0], &[1.0, 0.0]);
        assert_eq!(d, MAX_EUCLIDEAN_DISTANCE);
        assert_eq!(similarity_from_distance(Metric::Euclidean, d), 0.0);
        assert_eq!(distance(Metric::Euclidean, &[0.0, 0.0], &[0.0, 0.0]), MAX_EUCLIDEAN_DISTANCE);
    }
}
