use crate::semantic;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_ORIGIN: &str = "https://developer.apple.com";
const DEFAULT_SEED: &str = "https://developer.apple.com/documentation/updates/wwdc2025/";

/// URLs matching this pattern are followed during traversal
const DEFAULT_FOLLOW_PATTERN: &str = r"/documentation/|/topics|/wwdc";
/// URLs matching this pattern are never followed (non-textual media)
const DEFAULT_MEDIA_PATTERN: &str = r"/videos|/video/|\.mp4|\.mov|/media/";

const DEFAULT_MAX_DEPTH: u32 = 2;
const DEFAULT_DOC_CAP: usize = 200;
const DEFAULT_REQUEST_DELAY_MS: u64 = 500;

const DEFAULT_BATCH_SIZE: usize = 3;
const DEFAULT_BATCH_DELAY_MS: u64 = 200;
const DEFAULT_TOP_K: usize = 20;

/// Crawl traversal settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Site origin that relative links resolve against
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Seed URLs the crawl starts from
    #[serde(default = "default_seeds")]
    pub seed_urls: Vec<String>,

    /// Link hops permitted from a seed page
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Soft cap on collected documents (best-effort bound)
    #[serde(default = "default_doc_cap")]
    pub doc_cap: usize,

    /// Delay before each page fetch, in milliseconds
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Regex selecting which URLs are traversed
    #[serde(default = "default_follow_pattern")]
    pub follow_pattern: String,

    /// Regex excluding media URLs from traversal
    #[serde(default = "default_media_pattern")]
    pub media_pattern: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            seed_urls: default_seeds(),
            max_depth: DEFAULT_MAX_DEPTH,
            doc_cap: DEFAULT_DOC_CAP,
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
            follow_pattern: default_follow_pattern(),
            media_pattern: default_media_pattern(),
        }
    }
}

fn default_origin() -> String {
    DEFAULT_ORIGIN.to_string()
}

fn default_seeds() -> Vec<String> {
    vec![DEFAULT_SEED.to_string()]
}

fn default_max_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}

fn default_doc_cap() -> usize {
    DEFAULT_DOC_CAP
}

fn default_request_delay_ms() -> u64 {
    DEFAULT_REQUEST_DELAY_MS
}

fn default_follow_pattern() -> String {
    DEFAULT_FOLLOW_PATTERN.to_string()
}

fn default_media_pattern() -> String {
    DEFAULT_MEDIA_PATTERN.to_string()
}

/// Embedding and ranking settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SemanticSearchConfig {
    /// Model name for embeddings (e.g. "bge-small-en-v1.5")
    #[serde(default = "default_model")]
    pub model: String,

    /// Texts embedded per chunk
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pacing delay between chunks, in milliseconds
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Results returned per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for SemanticSearchConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay_ms: DEFAULT_BATCH_DELAY_MS,
            top_k: DEFAULT_TOP_K,
        }
    }
}

fn default_model() -> String {
    semantic::DEFAULT_MODEL.to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_batch_delay_ms() -> u64 {
    DEFAULT_BATCH_DELAY_MS
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub semantic_search: SemanticSearchConfig,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

impl Config {
    fn validate(&self) {
        let crawl = &self.crawl;

        if crawl.max_depth == 0 {
            panic!("crawl.max_depth must be at least 1");
        }

        if crawl.doc_cap == 0 {
            panic!("crawl.doc_cap must be greater than 0");
        }

        if let Err(err) = regex::Regex::new(&crawl.follow_pattern) {
            panic!("crawl.follow_pattern is not a valid regex: {err}");
        }

        if let Err(err) = regex::Regex::new(&crawl.media_pattern) {
            panic!("crawl.media_pattern is not a valid regex: {err}");
        }

        if url::Url::parse(&crawl.origin).is_err() {
            panic!("crawl.origin is not a valid url: {}", crawl.origin);
        }

        let sem = &self.semantic_search;

        if sem.batch_size == 0 {
            panic!("semantic_search.batch_size must be greater than 0");
        }

        if sem.top_k == 0 {
            panic!("semantic_search.top_k must be greater than 0");
        }
    }

    pub fn load() -> Self {
        let base_path = homedir::my_home()
            .ok()
            .flatten()
            .map(|home| home.join(".config").join("docsearch"))
            .unwrap_or_else(|| PathBuf::from("."));

        Self::load_with(&base_path)
    }

    pub fn load_with(base_path: &Path) -> Self {
        let config_path = base_path.join("config.yaml");

        // create new if does not exist
        if !config_path.exists() {
            std::fs::create_dir_all(base_path).expect("failed to create config directory");
            std::fs::write(
                &config_path,
                serde_yml::to_string(&Self::default()).unwrap(),
            )
            .expect("failed to write default config");
        }

        let config_str =
            std::fs::read_to_string(&config_path).expect("config file is not readable");
        let mut config: Self = serde_yml::from_str(&config_str).expect("config is malformed");

        config.base_path = base_path.to_path_buf();

        config.validate();

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config).unwrap() {
            config.save();
        }

        config
    }

    pub fn save(&self) {
        let config_path = self.base_path.join("config.yaml");
        let config_str = serde_yml::to_string(&self).unwrap();
        std::fs::write(config_path, config_str).expect("failed to write config");
    }

    /// Directory the embedding model files are cached in.
    pub fn model_cache_dir(&self) -> PathBuf {
        self.base_path.join("models")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        Config::default().validate();
    }

    #[test]
    #[should_panic(expected = "crawl.max_depth")]
    fn test_zero_depth_rejected() {
        let mut config = Config::default();
        config.crawl.max_depth = 0;
        config.validate();
    }

    #[test]
    #[should_panic(expected = "follow_pattern")]
    fn test_bad_follow_regex_rejected() {
        let mut config = Config::default();
        config.crawl.follow_pattern = "(".to_string();
        config.validate();
    }

    #[test]
    fn test_load_creates_and_reloads() {
        let dir = tempfile::tempdir().unwrap();

        let config = Config::load_with(dir.path());
        assert_eq!(config.crawl.max_depth, DEFAULT_MAX_DEPTH);
        assert!(dir.path().join("config.yaml").exists());

        let reloaded = Config::load_with(dir.path());
        assert_eq!(reloaded.crawl.origin, config.crawl.origin);
        assert_eq!(reloaded.semantic_search.model, config.semantic_search.model);
    }
}
