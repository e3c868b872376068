//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge serialized defaults + `config.toml` +
//! `config.<env>.toml` + `APP_*` env vars (`__` separates nested keys, e.g.
//! `APP_SEARCH__DEFAULT_LIMIT=20`). Provides helpers to expand `~` and
//! `${VAR}` and to resolve relative paths against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::types::Metric;

pub struct Config {
    figment: Figment,
    env_name: String,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Load `config.toml` and the environment overlay from `dir`.
    pub fn load_from(dir: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file(dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment, env_name };
        config.settings()?;
        Ok(config)
    }

    /// Wrap an already-assembled figment (tests, embedding applications).
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment, env_name: "custom".to_string() }
    }

    pub fn env_name(&self) -> &str {
        &self.env_name
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Typed settings: defaults overlaid with every configured source, then
    /// validated.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(self.figment.clone())
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to extract settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub index: IndexSettings,
    pub search: SearchSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Directory holding `index.json` and the converted Markdown books.
    pub books_dir: String,
    /// Library index file, relative to `books_dir` unless absolute.
    pub index_file: String,
    /// Embedding cache file; caching is off when unset.
    pub cache_file: Option<String>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self { books_dir: "books".to_string(), index_file: "index.json".to_string(), cache_file: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub dimension: usize,
    pub metric: Metric,
    pub remove_stopwords: bool,
    pub embedder: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self { dimension: 1024, metric: Metric::Cosine, remove_stopwords: true, embedder: "hashed".to_string() }
    }
}

/// Blend weights of the three scorers. Must be non-negative and sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionWeights {
    pub substring: f32,
    pub regex: f32,
    pub vector: f32,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self { substring: 0.5, regex: 0.2, vector: 0.3 }
    }
}

impl FusionWeights {
    pub fn sum(&self) -> f32 {
        self.substring + self.regex + self.vector
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub weights: FusionWeights,
    pub default_limit: usize,
    pub max_limit: usize,
    /// Results at or below this combined score are dropped for non-empty queries.
    pub min_score: f32,
    /// Lower bound on the KNN candidate count fed into fusion.
    pub knn_candidates: usize,
    /// Matches per 1000 tokens that saturate a lexical score at 1.0.
    pub density_per_mille: f32,
    /// Compiled-size ceiling for user regex patterns, in bytes.
    pub regex_size_limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            weights: FusionWeights::default(),
            default_limit: 50,
            max_limit: 200,
            min_score: 0.01,
            knn_candidates: 1000,
            density_per_mille: 10.0,
            regex_size_limit: 1 << 20,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> crate::error::Result<()> {
        let w = &self.search.weights;
        if [w.substring, w.regex, w.vector].iter().any(|x| !x.is_finite() || *x < 0.0) {
            return Err(Error::InvalidConfig(format!("fusion weights must be non-negative: {w:?}")));
        }
        if (w.sum() - 1.0).abs() > 1e-4 {
            return Err(Error::InvalidConfig(format!("fusion weights must sum to 1, got {}", w.sum())));
        }
        if self.index.dimension == 0 {
            return Err(Error::InvalidConfig("index.dimension must be positive".to_string()));
        }
        if self.search.max_limit == 0 || self.search.default_limit == 0 || self.search.default_limit > self.search.max_limit {
            return Err(Error::InvalidConfig(format!(
                "search limits out of range: default_limit={} max_limit={}",
                self.search.default_limit, self.search.max_limit
            )));
        }
        if !(self.search.density_per_mille.is_finite() && self.search.density_per_mille > 0.0) {
            return Err(Error::InvalidConfig("search.density_per_mille must be positive".to_string()));
        }
        if !(0.0..1.0).contains(&self.search.min_score) {
            return Err(Error::InvalidConfig(format!("search.min_score must be in [0, 1), got {}", self.search.min_score)));
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
