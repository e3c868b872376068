//! shelf-embed
//!
//! Deterministic hashed bag-of-words embeddings. No model files: every token
//! is hashed into one of `D` buckets with a sign, so identical token streams
//! always produce identical vectors and documents sharing vocabulary point in
//! similar directions.

use anyhow::{anyhow, Result};
use std::hash::Hasher;
use twox_hash::XxHash64;

use shelf_core::config::IndexSettings;
use shelf_core::error::Error;
use shelf_core::traits::Embedder;

pub struct HashedEmbedder {
    dim: usize,
    id: String,
}

impl HashedEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidConfig("embedding dimension must be positive".to_string()).into());
        }
        Ok(Self { dim, id: format!("hashed-xxh64:d{dim}") })
    }

    /// Bucket index and sign for one token.
    pub fn feature(&self, token: &str) -> (usize, f32) {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(token.as_bytes());
        let h = hasher.finish();
        let idx = (h % self.dim as u64) as usize;
        let sign = if h >> 63 == 1 { -1.0 } else { 1.0 };
        (idx, sign)
    }
}

impl Embedder for HashedEmbedder {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_tokens(&self, tokens: &[String]) -> Result<Vec<f32>> {
        let mut v = vec![0f32; self.dim];
        for token in tokens {
            let (idx, sign) = self.feature(token);
            v[idx] += sign;
        }
        l2_normalize(&mut v);
        Ok(v)
    }
}

/// Scale `v` to unit length in place. A zero vector is left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

pub fn get_default_embedder(settings: &IndexSettings) -> Result<Box<dyn Embedder>> {
    match settings.embedder.as_str() {
        "hashed" => {
            tracing::debug!(dim = settings.dimension, "using hashed embedder");
            Ok(Box::new(HashedEmbedder::new(settings.dimension)?))
        }
        other => Err(anyhow!(Error::InvalidConfig(format!("unknown embedder '{other}'")))),
    }
}
