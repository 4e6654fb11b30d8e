use crate::config::types::Config;
use crate::ConfigError;
use url::Url;

/// Validates a parsed configuration
///
/// Checks that numeric limits are sane and that the live-search endpoint
/// is a well-formed absolute URL.
///
/// # Arguments
///
/// * `config` - The configuration to validate
///
/// # Returns
///
/// * `Ok(())` - Configuration is valid
/// * `Err(ConfigError::Validation)` - A setting is out of range or malformed
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.crawler.max_concurrent_fetches == 0 {
        return Err(ConfigError::Validation(
            "crawler.max-concurrent-fetches must be at least 1".to_string(),
        ));
    }

    if config.crawler.fetch_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "crawler.fetch-timeout-secs must be at least 1".to_string(),
        ));
    }

    if config.crawler.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "crawler.connect-timeout-secs must be at least 1".to_string(),
        ));
    }

    if config.seeding.subdomain_tool.trim().is_empty() {
        return Err(ConfigError::Validation(
            "seeding.subdomain-tool must not be empty".to_string(),
        ));
    }

    if config.live_search.max_results == 0 {
        return Err(ConfigError::Validation(
            "live-search.max-results must be at least 1".to_string(),
        ));
    }

    if config.live_search.fetch_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "live-search.fetch-timeout-secs must be at least 1".to_string(),
        ));
    }

    match Url::parse(&config.live_search.endpoint) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => {
            return Err(ConfigError::Validation(format!(
                "live-search.endpoint must be http(s), got scheme '{}'",
                url.scheme()
            )));
        }
        Err(e) => {
            return Err(ConfigError::Validation(format!(
                "live-search.endpoint is not a valid URL: {}",
                e
            )));
        }
    }

    if config.output.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output.database-path must not be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = Config::default();
        config.crawler.max_concurrent_fetches = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.crawler.fetch_timeout_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_subdomain_tool_rejected() {
        let mut config = Config::default();
        config.seeding.subdomain_tool = "  ".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_bad_endpoint_rejected() {
        let mut config = Config::default();
        config.live_search.endpoint = "not a url".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_non_http_endpoint_rejected() {
        let mut config = Config::default();
        config.live_search.endpoint = "ftp://example.com/search".to_string();
        assert!(validate(&config).is_err());
    }
}
