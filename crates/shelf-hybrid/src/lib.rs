//! shelf-hybrid
//!
//! Ties the substring, regex and vector indices into one library index:
//! a copy-on-write [`IndexSnapshot`] kept current by [`LibraryIndex`], and
//! the rank fusion that scores a query against it.

pub mod fusion;
pub mod maintenance;
pub mod snapshot;

pub use fusion::{Fusion, QueryPlan, Ranker, VectorScorer};
pub use maintenance::{LibraryIndex, RebuildReport, SkippedDocument};
pub use snapshot::IndexSnapshot;
