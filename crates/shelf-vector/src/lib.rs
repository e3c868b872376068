//! shelf-vector
//!
//! In-memory vector index with exact KNN by linear scan, the distance
//! metrics it supports, and a JSON-backed embedding cache used to speed up
//! rebuilds.

pub mod cache;
pub mod index;
pub mod metric;

pub use cache::{hash_content, CacheEntry, EmbeddingCache};
pub use index::{Neighbor, VectorIndex};
pub use metric::{cosine_similarity, distance, similarity_from_distance};
