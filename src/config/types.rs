use serde::Deserialize;
use std::time::Duration;

/// Web document extensions a discovered link's path may end with
pub const DEFAULT_DOCUMENT_EXTENSIONS: &[&str] = &[
    ".html", ".htm", ".php", ".asp", ".aspx", ".jsp", ".cfm", ".shtml", ".xhtml", ".rhtml",
    ".phtml", ".cgi", ".pl",
];

/// Main configuration structure for domain-mapper
///
/// Built once at process start and passed by reference into each component.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
}

/// Shared store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file shared by all workers
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,

    /// How long SQLite waits on a locked database before reporting contention (milliseconds)
    #[serde(rename = "busy-timeout-ms", default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default = "default_contact_url")]
    pub contact_url: String,
}

/// HTTP fetch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Timeout for page fetches (seconds)
    #[serde(rename = "page-timeout-secs", default = "default_timeout_secs")]
    pub page_timeout_secs: u64,

    /// Timeout for robots.txt fetches (seconds)
    #[serde(rename = "robots-timeout-secs", default = "default_timeout_secs")]
    pub robots_timeout_secs: u64,

    /// Extensions accepted at the end of a discovered link's path
    #[serde(rename = "document-extensions", default = "default_document_extensions")]
    pub document_extensions: Vec<String>,
}

/// Store contention retry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per store operation, including the first
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts (milliseconds)
    #[serde(rename = "delay-ms", default = "default_delay_ms")]
    pub delay_ms: u64,
}

/// Worker loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Interval between throughput reports (seconds)
    #[serde(rename = "report-interval-secs", default = "default_report_interval_secs")]
    pub report_interval_secs: u64,
}

impl UserAgentConfig {
    /// Formats the user agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL)`
    pub fn user_agent_string(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

impl HttpConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn robots_timeout(&self) -> Duration {
        Duration::from_secs(self.robots_timeout_secs)
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl WorkerConfig {
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }
}

impl StoreConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: default_contact_url(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            page_timeout_secs: default_timeout_secs(),
            robots_timeout_secs: default_timeout_secs(),
            document_extensions: default_document_extensions(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: default_report_interval_secs(),
        }
    }
}

fn default_database_path() -> String {
    String::from("./domain_graph.db")
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_crawler_name() -> String {
    String::from("MapWWWBot")
}

fn default_crawler_version() -> String {
    String::from("1.0")
}

fn default_contact_url() -> String {
    String::from("http://map-the-internet.theravenhub.com/botinfo")
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_document_extensions() -> Vec<String> {
    DEFAULT_DOCUMENT_EXTENSIONS
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_delay_ms() -> u64 {
    1_000
}

fn default_report_interval_secs() -> u64 {
    600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_user_agent_string() {
        let config = UserAgentConfig::default();
        assert_eq!(
            config.user_agent_string(),
            "MapWWWBot/1.0 (+http://map-the-internet.theravenhub.com/botinfo)"
        );
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.store.database_path, "./domain_graph.db");
        assert_eq!(config.http.page_timeout(), Duration::from_secs(10));
        assert_eq!(config.http.robots_timeout(), Duration::from_secs(10));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.delay(), Duration::from_secs(1));
        assert_eq!(config.worker.report_interval(), Duration::from_secs(600));
        assert_eq!(config.http.document_extensions.len(), 13);
    }
}
