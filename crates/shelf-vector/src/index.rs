use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use shelf_core::error::{Error, Result};
use shelf_core::types::{DocId, Metric};

use crate::metric::distance;

/// One KNN result. Lower `distance` is closer.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub id: DocId,
    pub distance: f32,
}

/// Exact nearest-neighbour index over fixed-dimension vectors.
///
/// Vectors are shared (`Arc`) so cloning the index for a copy-on-write
/// snapshot does not copy vector data.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    dim: usize,
    metric: Metric,
    vectors: BTreeMap<DocId, Arc<[f32]>>,
}

impl VectorIndex {
    pub fn new(dim: usize, metric: Metric) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidConfig("vector dimension must be positive".to_string()));
        }
        Ok(Self { dim, metric, vectors: BTreeMap::new() })
    }

    pub fn dim(&self) -> usize { self.dim }
    pub fn metric(&self) -> Metric { self.metric }
    pub fn len(&self) -> usize { self.vectors.len() }
    pub fn is_empty(&self) -> bool { self.vectors.is_empty() }
    pub fn contains(&self, id: &str) -> bool { self.vectors.contains_key(id) }
    pub fn get(&self, id: &str) -> Option<&[f32]> { self.vectors.get(id).map(|v| &**v) }
    pub fn ids(&self) -> impl Iterator<Item = &str> { self.vectors.keys().map(String::as_str) }

    fn check(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: vector.len() });
        }
        if let Some(pos) = vector.iter().position(|x| !x.is_finite()) {
            return Err(Error::InvalidVector(format!("non-finite component at {pos}")));
        }
        Ok(())
    }

    /// Insert or replace. On error the index is left unchanged.
    pub fn add(&mut self, id: impl Into<DocId>, vector: Vec<f32>) -> Result<()> {
        self.check(&vector)?;
        self.vectors.insert(id.into(), Arc::from(vector));
        Ok(())
    }

    /// Removing an absent id is a silent no-op; returns whether a vector was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        self.vectors.remove(id).is_some()
    }

    /// The `k` closest vectors, ascending by distance, ties broken by id.
    pub fn knn(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.check(query)?;
        if k == 0 || self.vectors.is_empty() {
            return Ok(Vec::new());
        }
        let mut all: Vec<Neighbor> = self
            .vectors
            .iter()
            .map(|(id, v)| Neighbor { id: id.clone(), distance: distance(self.metric, query, v) })
            .collect();
        if k < all.len() {
            all.select_nth_unstable_by(k - 1, by_distance_then_id);
            all.truncate(k);
        }
        all.sort_by(by_distance_then_id);
        Ok(all)
    }
}

fn by_distance_then_id(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance.total_cmp(&b.distance).then_with(|| a.id.cmp(&b.id))
}
