use shelf_core::error::Error;
use shelf_core::types::Metric;
use shelf_vector::VectorIndex;

fn unit(dim: usize, i: usize) -> Vec<f32> {
    let mut v = vec![0.0; dim];
    v[i] = 1.0;
    v
}

#[test]
fn add_rejects_wrong_dimension_without_corrupting() {
    let mut index = VectorIndex::new(3, Metric::Cosine).expect("index");
    index.add("a", vec![1.0, 0.0, 0.0]).expect("add a");

    let err = index.add("b", vec![1.0, 0.0]).expect_err("short vector");
    assert!(matches!(err, Error::DimensionMismatch { expected: 3, actual: 2 }));
    let err = index.add("a", vec![0.0; 4]).expect_err("long vector replacing a");
    assert!(matches!(err, Error::DimensionMismatch { expected: 3, actual: 4 }));

    assert_eq!(index.len(), 1);
    assert_eq!(index.get("a"), Some(&[1.0, 0.0, 0.0][..]), "existing vector untouched");
    assert!(!index.contains("b"));
}

#[test]
fn add_rejects_non_finite_components() {
    let mut index = VectorIndex::new(2, Metric::Cosine).expect("index");
    assert!(matches!(index.add("nan", vec![f32::NAN, 0.0]), Err(Error::InvalidVector(_))));
    assert!(index.is_empty());
}

#[test]
fn add_replaces_and_remove_is_idempotent() {
    let mut index = VectorIndex::new(2, Metric::Cosine).expect("index");
    index.add("a", unit(2, 0)).expect("add");
    index.add("a", unit(2, 1)).expect("replace");
    assert_eq!(index.len(), 1);
    assert_eq!(index.get("a"), Some(&[0.0, 1.0][..]));

    assert!(index.remove("a"));
    assert!(!index.remove("a"), "second remove is a no-op");
    assert!(!index.remove("never-added"));
    assert!(index.is_empty());
}

#[test]
fn knn_orders_by_distance_then_id() {
    let mut index = VectorIndex::new(2, Metric::Cosine).expect("index");
    index.add("far", vec![-1.0, 0.0]).expect("far");
    index.add("mid", vec![1.0, 1.0]).expect("mid");
    index.add("b-exact", vec![2.0, 0.0]).expect("b-exact");
    index.add("a-exact", vec![1.0, 0.0]).expect("a-exact");

    let hits = index.knn(&[1.0, 0.0], 10).expect("knn");
    let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["a-exact", "b-exact", "mid", "far"]);
    assert!(hits[0].distance.abs() < 1e-6);
    assert!((hits[3].distance - 2.0).abs() < 1e-6);
    for w in hits.windows(2) {
        assert!(w[0].distance <= w[1].distance);
    }
}

#[test]
fn knn_partial_selection_keeps_true_top_k() {
    let dim = 8;
    let mut index = VectorIndex::new(dim, Metric::Cosine).expect("index");
    for i in 0..dim {
        let mut v = unit(dim, i);
        v[0] += 0.1 * i as f32;
        index.add(format!("doc-{i}"), v).expect("add");
    }
    let full = index.knn(&unit(dim, 0), dim).expect("full");
    let top3 = index.knn(&unit(dim, 0), 3).expect("top3");
    assert_eq!(top3.len(), 3);
    assert_eq!(&full[..3], &top3[..]);
}

#[test]
fn knn_edge_cases() {
    let mut index = VectorIndex::new(2, Metric::Cosine).expect("index");
    assert!(index.knn(&[1.0, 0.0], 5).expect("empty index").is_empty());
    index.add("a", vec![1.0, 0.0]).expect("add");
    assert!(index.knn(&[1.0, 0.0], 0).expect("k=0").is_empty());
    assert!(matches!(index.knn(&[1.0], 1), Err(Error::DimensionMismatch { .. })));
}

#[test]
fn zero_query_vector_has_unit_cosine_distance_to_everything() {
    let mut index = VectorIndex::new(3, Metric::Cosine).expect("index");
    index.add("b", unit(3, 1)).expect("b");
    index.add("a", unit(3, 0)).expect("a");
    index.add("zero", vec![0.0; 3]).expect("zero");
    let hits = index.knn(&[0.0; 3], 3).expect("knn");
    assert!(hits.iter().all(|h| (h.distance - 1.0).abs() < 1e-6));
    let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "zero"], "equal distances fall back to id order");
}

#[test]
fn euclidean_metric() {
    let mut index = VectorIndex::new(2, Metric::Euclidean).expect("index");
    index.add("near", vec![3.0, 1.0]).expect("near");
    index.add("far", vec![0.0, 4.0]).expect("far");
    let hits = index.knn(&[3.0, 0.0], 2).expect("knn");
    assert_eq!(hits[0].id, "near");
    assert!((hits[0].distance - 1.0).abs() < 1e-6);
    assert!((hits[1].distance - 5.0).abs() < 1e-6);
}

#[test]
fn euclidean_zero_vector_is_maximally_distant() {
    let mut index = VectorIndex::new(2, Metric::Euclidean).expect("index");
    index.add("zero", vec![0.0, 0.0]).expect("zero");
    index.add("unit", vec![1.0, 0.0]).expect("unit");
    let hits = index.knn(&[0.0, 0.0], 2).expect("knn");
    assert!(hits.iter().all(|h| h.distance == shelf_vector::metric::MAX_EUCLIDEAN_DISTANCE));
    let hits = index.knn(&[1.0, 0.0], 2).expect("knn");
    assert_eq!(hits[0].id, "unit");
    assert_eq!(hits[1].distance, shelf_vector::metric::MAX_EUCLIDEAN_DISTANCE);
}

#[test]
fn zero_dimension_index_is_rejected() {
    assert!(matches!(VectorIndex::new(0, Metric::Cosine), Err(Error::InvalidConfig(_))));
}
