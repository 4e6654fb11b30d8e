use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads, parses, and validates the TOML configuration at `path`.
///
/// Missing sections and fields fall back to their defaults during
/// deserialization; validation runs on the merged result.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Loads a configuration file, falling back to defaults if it does not exist
///
/// A present-but-broken file is still an error; only a missing file is
/// silently replaced by the built-in defaults.
pub fn load_config_or_default(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::debug!(
            "No config file at {}, using built-in defaults",
            path.display()
        );
        return Ok(Config::default());
    }
    load_config(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[crawler]
max-concurrent-fetches = 4
fetch-timeout-secs = 15
connect-timeout-secs = 5
scan-internal-links = false

[seeding]
subdomain-tool = "amass"

[live-search]
endpoint = "https://html.duckduckgo.com/html"
max-results = 20

[output]
database-path = "./test.db"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_concurrent_fetches, 4);
        assert_eq!(config.crawler.fetch_timeout_secs, 15);
        assert!(!config.crawler.scan_internal_links);
        assert_eq!(config.seeding.subdomain_tool, "amass");
        assert_eq!(config.live_search.max_results, 20);
        assert_eq!(config.output.database_path, "./test.db");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config_content = r#"
[output]
database-path = "/tmp/kumo-test.db"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.output.database_path, "/tmp/kumo-test.db");
        assert_eq!(config.crawler.max_concurrent_fetches, 8);
        assert_eq!(config.seeding.subdomain_tool, "subfinder");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/kumo.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = load_config_or_default(Path::new("/nonexistent/kumo.toml")).unwrap();
        assert_eq!(config.crawler.max_concurrent_fetches, 8);
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let config_content = "this is not valid TOML {{{";
        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[crawler]
max-concurrent-fetches = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }
}
