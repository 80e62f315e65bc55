pub mod prompts;

use serde::{Deserialize, Serialize};

use crate::crawler::CrawlConfig;

pub use prompts::template_for;

fn default_wait_timeout_ms() -> u64 {
    5000
}

fn default_max_links() -> usize {
    3
}

fn default_timeout_seconds() -> u64 {
    30
}

/// A site that markets are generated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    pub id: String,
    pub seed_url: String,
    pub category: String,
    /// Prompt template id; the source id when unset.
    #[serde(default)]
    pub prompt: Option<String>,
    /// Render pages in the shared browser instead of plain HTTP.
    #[serde(default)]
    pub use_javascript: bool,
    #[serde(default)]
    pub wait_selector: Option<String>,
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,
    #[serde(default = "default_max_links")]
    pub max_links_to_scrape: usize,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl DataSource {
    pub fn new(id: &str, seed_url: &str, category: &str) -> Self {
        Self {
            id: id.to_string(),
            seed_url: seed_url.to_string(),
            category: category.to_string(),
            prompt: None,
            use_javascript: false,
            wait_selector: None,
            wait_timeout_ms: default_wait_timeout_ms(),
            max_links_to_scrape: default_max_links(),
            timeout_seconds: default_timeout_seconds(),
        }
    }

    pub fn rendered(mut self, wait_selector: &str, wait_timeout_ms: u64) -> Self {
        self.use_javascript = true;
        self.wait_selector = Some(wait_selector.to_string());
        self.wait_timeout_ms = wait_timeout_ms;
        self
    }

    pub fn prompt_id(&self) -> &str {
        self.prompt.as_deref().unwrap_or(&self.id)
    }

    pub fn prompt_template(&self) -> Option<&'static str> {
        template_for(self.prompt_id())
    }

    pub fn crawl_config(&self) -> CrawlConfig {
        CrawlConfig {
            seed_url: self.seed_url.clone(),
            max_links_to_scrape: self.max_links_to_scrape,
            use_rendered_fetch: self.use_javascript,
            wait_selector: self.wait_selector.clone(),
            wait_timeout_ms: self.wait_timeout_ms,
            timeout_seconds: self.timeout_seconds,
        }
    }
}

pub fn builtin_sources() -> Vec<DataSource> {
    vec![
        DataSource::new("npfl", "https://npfl.ng/fixtures", "sports"),
        DataSource::new("punch", "https://punchng.com/topics/news/", "news").rendered("article", 10_000),
        DataSource::new("bbc", "https://www.bbc.com/news/topics/c50znx8v848t", "news")
            .rendered("article", 10_000),
    ]
}

/// Sources by id, in configuration order.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Vec<DataSource>,
}

impl SourceRegistry {
    pub fn new(sources: Vec<DataSource>) -> Self {
        Self { sources }
    }

    pub fn get(&self, id: &str) -> Option<&DataSource> {
        self.sources.iter().find(|source| source.id == id)
    }

    pub fn all(&self) -> &[DataSource] {
        &self.sources
    }

    pub fn ids(&self) -> Vec<&str> {
        self.sources.iter().map(|source| source.id.as_str()).collect()
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new(builtin_sources())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_sources() {
        let registry = SourceRegistry::default();

        assert_eq!(registry.ids(), vec!["npfl", "punch", "bbc"]);

        let npfl = registry.get("npfl").unwrap();
        assert!(!npfl.use_javascript);
        assert_eq!(npfl.category, "sports");
        assert_eq!(npfl.wait_timeout_ms, 5000);

        let bbc = registry.get("bbc").unwrap();
        assert!(bbc.use_javascript);
        assert_eq!(bbc.wait_selector.as_deref(), Some("article"));
        assert_eq!(bbc.wait_timeout_ms, 10_000);

        assert!(registry.get("reuters").is_none());
    }

    #[test]
    fn test_every_builtin_has_a_prompt() {
        for source in builtin_sources() {
            assert!(source.prompt_template().is_some(), "{} has no prompt", source.id);
        }
    }

    #[test]
    fn test_crawl_config() {
        let punch = builtin_sources().remove(1);

        let config = punch.crawl_config();

        assert_eq!(config.seed_url, "https://punchng.com/topics/news/");
        assert!(config.use_rendered_fetch);
        assert_eq!(config.wait_selector.as_deref(), Some("article"));
        assert_eq!(config.max_links_to_scrape, 3);
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn test_prompt_override() {
        let mut source = DataSource::new("vanguard", "https://www.vanguardngr.com/news/", "news");
        assert!(source.prompt_template().is_none());

        source.prompt = Some("punch".to_string());
        assert_eq!(source.prompt_id(), "punch");
        assert!(source.prompt_template().is_some());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let source: DataSource = toml::from_str(
            r#"
            id = "npfl"
            seed_url = "https://npfl.ng/fixtures"
            category = "sports"
            "#,
        )
        .unwrap();

        assert_eq!(source, builtin_sources().remove(0));
    }
}
