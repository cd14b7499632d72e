use crate::config::types::{Config, HttpConfig, RetryConfig, StoreConfig, UserAgentConfig, WorkerConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_store_config(&config.store)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_http_config(&config.http)?;
    validate_retry_config(&config.retry)?;
    validate_worker_config(&config.worker)?;
    Ok(())
}

/// Validates store configuration
fn validate_store_config(config: &StoreConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.is_empty() || config.crawler_version.contains(char::is_whitespace)
    {
        return Err(ConfigError::Validation(format!(
            "crawler_version must be a single non-empty token, got '{}'",
            config.crawler_version
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

/// Validates HTTP configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.page_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "page_timeout_secs must be >= 1, got {}",
            config.page_timeout_secs
        )));
    }

    if config.robots_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "robots_timeout_secs must be >= 1, got {}",
            config.robots_timeout_secs
        )));
    }

    for ext in &config.document_extensions {
        if !ext.starts_with('.') || ext.len() < 2 || ext.contains('/') {
            return Err(ConfigError::Validation(format!(
                "document extension must look like '.html', got '{}'",
                ext
            )));
        }
    }

    Ok(())
}

/// Validates retry configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    Ok(())
}

/// Validates worker configuration
fn validate_worker_config(config: &WorkerConfig) -> Result<(), ConfigError> {
    if config.report_interval_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "report_interval_secs must be >= 1, got {}",
            config.report_interval_secs
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_crawler_name() {
        let mut config = Config::default();
        config.user_agent.crawler_name = "Map WWW Bot".to_string();
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::Validation(_)
        ));

        config.user_agent.crawler_name = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_contact_url() {
        let mut config = Config::default();
        config.user_agent.contact_url = "not a url".to_string();
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::InvalidUrl(_)
        ));
    }

    #[test]
    fn test_validate_timeouts() {
        let mut config = Config::default();
        config.http.page_timeout_secs = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.http.robots_timeout_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_extensions() {
        let mut config = Config::default();
        config.http.document_extensions = vec!["html".to_string()];
        assert!(validate(&config).is_err());

        config.http.document_extensions = vec![".".to_string()];
        assert!(validate(&config).is_err());

        config.http.document_extensions = vec![".md".to_string()];
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_retry() {
        let mut config = Config::default();
        config.retry.max_attempts = 0;
        assert!(validate(&config).is_err());

        config.retry.max_attempts = 1;
        config.retry.delay_ms = 0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_empty_database_path() {
        let mut config = Config::default();
        config.store.database_path = String::new();
        assert!(validate(&config).is_err());
    }
}
