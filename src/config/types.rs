use serde::Deserialize;

/// Main configuration structure for Kumo
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub seeding: SeedingConfig,
    #[serde(rename = "live-search")]
    pub live_search: LiveSearchConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of concurrent page fetches
    #[serde(rename = "max-concurrent-fetches")]
    pub max_concurrent_fetches: u32,

    /// Overall timeout for a single fetch (seconds)
    #[serde(rename = "fetch-timeout-secs")]
    pub fetch_timeout_secs: u64,

    /// Connection timeout for a single fetch (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Whether domain seeds expand subdomains and outbound links by default
    #[serde(rename = "scan-internal-links")]
    pub scan_internal_links: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 8,
            fetch_timeout_secs: 30,
            connect_timeout_secs: 10,
            scan_internal_links: true,
        }
    }
}

/// Seed expansion configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeedingConfig {
    /// Subdomain enumeration command, invoked as `<tool> -d <domain>`
    #[serde(rename = "subdomain-tool")]
    pub subdomain_tool: String,
}

impl Default for SeedingConfig {
    fn default() -> Self {
        Self {
            subdomain_tool: "subfinder".to_string(),
        }
    }
}

/// Live web search configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LiveSearchConfig {
    /// Base URL of the HTML search-results endpoint
    pub endpoint: String,

    /// Maximum result blocks parsed per live search
    #[serde(rename = "max-results")]
    pub max_results: usize,

    /// Timeout for the results-page fetch (seconds)
    #[serde(rename = "fetch-timeout-secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for LiveSearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://html.duckduckgo.com/html".to_string(),
            max_results: 15,
            fetch_timeout_secs: 20,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "./kumo.db".to_string(),
        }
    }
}
