use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub store: StoreConfig,
    pub publisher: PublisherConfig,
    #[serde(default)]
    pub feed: Option<FeedConfig>,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub metrics: Option<MetricsConfig>,
}

/// Spreadsheet holding the URL queue
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Spreadsheet ID (the long key in the sheet URL)
    pub spreadsheet_id: String,
    /// OAuth access token with the spreadsheets scope
    pub access_token: String,
    /// Worksheet (tab) name
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    /// Header of the column holding submitted URLs
    #[serde(default = "default_url_column")]
    pub url_column: String,
    /// Header of the column holding the processing status
    #[serde(default = "default_status_column")]
    pub status_column: String,
    /// Sheets API base URL (overridable for tests)
    #[serde(default = "default_sheets_api_url")]
    pub api_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_sheet_name() -> String {
    "Sheet1".to_string()
}

fn default_url_column() -> String {
    "URL".to_string()
}

fn default_status_column() -> String {
    "Status".to_string()
}

fn default_sheets_api_url() -> String {
    "https://sheets.googleapis.com".to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Available publishing backends
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PublisherBackend {
    StaticSite,
    RestBlog,
    XmlRpcBlog,
}

impl PublisherBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublisherBackend::StaticSite => "static_site",
            PublisherBackend::RestBlog => "rest_blog",
            PublisherBackend::XmlRpcBlog => "xml_rpc_blog",
        }
    }
}

/// Publisher configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PublisherConfig {
    /// Publishing backend type
    pub backend: PublisherBackend,
    /// Static site settings (required when backend = "static_site")
    #[serde(default)]
    pub static_site: Option<StaticSiteConfig>,
    /// REST blog settings (required when backend = "rest_blog")
    #[serde(default)]
    pub rest_blog: Option<RestBlogConfig>,
    /// XML-RPC blog settings (required when backend = "xml_rpc_blog")
    #[serde(default)]
    pub xml_rpc_blog: Option<XmlRpcBlogConfig>,
}

/// Static site in a git checkout, published by pushing to a remote
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaticSiteConfig {
    /// Root of the git working tree (default: current directory)
    #[serde(default = "default_repo_path")]
    pub repo_path: PathBuf,
    /// Public base URL of the site, e.g. "https://user.github.io/repo"
    pub public_base_url: String,
    /// Git remote to push to
    #[serde(default = "default_remote")]
    pub remote: String,
    /// Path to the git executable
    #[serde(default = "default_git_path")]
    pub git_path: PathBuf,
    /// Whether to commit and push after writing files
    #[serde(default = "default_true")]
    pub push: bool,
    /// Timeout for each git command in seconds (default: 120)
    #[serde(default = "default_git_timeout")]
    pub timeout_secs: u32,
}

fn default_repo_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_git_path() -> PathBuf {
    PathBuf::from("git")
}

fn default_true() -> bool {
    true
}

fn default_git_timeout() -> u32 {
    120
}

/// Authentication for REST blog APIs
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum RestAuth {
    Bearer { token: String },
    Basic { username: String, password: String },
}

/// Hosted blog with a JSON REST API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RestBlogConfig {
    /// Endpoint that creates posts, e.g. "https://example.com/wp-json/wp/v2/posts"
    pub api_url: String,
    pub auth: RestAuth,
    /// Post status sent with the request
    #[serde(default = "default_post_status")]
    pub post_status: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_post_status() -> String {
    "publish".to_string()
}

/// Legacy blog exposing the MetaWeblog XML-RPC API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct XmlRpcBlogConfig {
    /// XML-RPC endpoint, e.g. "https://example.com/xmlrpc.php"
    pub endpoint: String,
    #[serde(default = "default_blog_id")]
    pub blog_id: String,
    pub username: String,
    pub password: String,
    /// Public post URL with an `{id}` placeholder
    pub post_url_template: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_blog_id() -> String {
    "1".to_string()
}

/// What to do with the batch when the feed artifact cannot be published
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeedFailurePolicy {
    /// Mark the batch rows as failed and stop
    #[default]
    Abort,
    /// Log and continue without the feed URL
    Skip,
}

/// Secondary RSS feed hosted as a gist
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    /// GitHub token with the gist scope
    pub token: String,
    /// Gist API base URL (overridable for tests)
    #[serde(default = "default_gist_api_url")]
    pub api_url: String,
    /// File name of the feed inside the gist
    #[serde(default = "default_feed_file_name")]
    pub file_name: String,
    /// Channel link written into the feed
    #[serde(default)]
    pub site_url: Option<String>,
    #[serde(default)]
    pub on_failure: FeedFailurePolicy,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_gist_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_feed_file_name() -> String {
    "feed.xml".to_string()
}

/// Crawler ping settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifierConfig {
    /// XML-RPC ping endpoints
    #[serde(default = "default_ping_endpoints")]
    pub endpoints: Vec<String>,
    /// Per-ping timeout in seconds (default: 5)
    #[serde(default = "default_ping_timeout")]
    pub timeout_secs: u32,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            endpoints: default_ping_endpoints(),
            timeout_secs: default_ping_timeout(),
        }
    }
}

fn default_ping_endpoints() -> Vec<String> {
    vec![
        "http://rpc.pingomatic.com/".to_string(),
        "http://rpc.twingly.com/".to_string(),
    ]
}

fn default_ping_timeout() -> u32 {
    5
}

/// Batch sizing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    /// Maximum rows per run (default: 200)
    #[serde(default = "default_batch_size")]
    pub size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            size: default_batch_size(),
        }
    }
}

fn default_batch_size() -> usize {
    200
}

/// Metrics export
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    /// File the Prometheus text exposition is written to after each run
    pub textfile_path: PathBuf,
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub store: SanitizedStoreConfig,
    pub publisher: SanitizedPublisherConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed: Option<SanitizedFeedConfig>,
    pub notifier: NotifierConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedStoreConfig {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub access_token_configured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPublisherConfig {
    pub backend: String,
    /// Where the artifact goes: site URL, API URL or XML-RPC endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub credentials_configured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedFeedConfig {
    pub file_name: String,
    pub on_failure: FeedFailurePolicy,
    pub token_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let publisher = &config.publisher;
        let (target, credentials_configured) = match publisher.backend {
            PublisherBackend::StaticSite => (
                publisher
                    .static_site
                    .as_ref()
                    .map(|s| s.public_base_url.clone()),
                // Pushing relies on the checkout's own git credentials
                true,
            ),
            PublisherBackend::RestBlog => (
                publisher.rest_blog.as_ref().map(|r| r.api_url.clone()),
                publisher
                    .rest_blog
                    .as_ref()
                    .map(|r| match &r.auth {
                        RestAuth::Bearer { token } => !token.is_empty(),
                        RestAuth::Basic { password, .. } => !password.is_empty(),
                    })
                    .unwrap_or(false),
            ),
            PublisherBackend::XmlRpcBlog => (
                publisher.xml_rpc_blog.as_ref().map(|x| x.endpoint.clone()),
                publisher
                    .xml_rpc_blog
                    .as_ref()
                    .map(|x| !x.password.is_empty())
                    .unwrap_or(false),
            ),
        };

        Self {
            store: SanitizedStoreConfig {
                spreadsheet_id: config.store.spreadsheet_id.clone(),
                sheet_name: config.store.sheet_name.clone(),
                access_token_configured: !config.store.access_token.is_empty(),
            },
            publisher: SanitizedPublisherConfig {
                backend: publisher.backend.as_str().to_string(),
                target,
                credentials_configured,
            },
            feed: config.feed.as_ref().map(|f| SanitizedFeedConfig {
                file_name: f.file_name.clone(),
                on_failure: f.on_failure,
                token_configured: !f.token.is_empty(),
            }),
            notifier: config.notifier.clone(),
            batch: config.batch.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[store]
spreadsheet_id = "sheet-123"
access_token = "ya29.token"

[publisher]
backend = "static_site"

[publisher.static_site]
public_base_url = "https://someone.github.io/links"
"#;

    #[test]
    fn test_deserialize_minimal_config() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.store.spreadsheet_id, "sheet-123");
        assert_eq!(config.store.sheet_name, "Sheet1");
        assert_eq!(config.store.url_column, "URL");
        assert_eq!(config.store.status_column, "Status");
        assert_eq!(config.publisher.backend, PublisherBackend::StaticSite);

        let site = config.publisher.static_site.as_ref().unwrap();
        assert_eq!(site.remote, "origin");
        assert_eq!(site.repo_path, PathBuf::from("."));
        assert!(site.push);
    }

    #[test]
    fn test_defaults_for_batch_and_notifier() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.batch.size, 200);
        assert_eq!(config.notifier.timeout_secs, 5);
        assert_eq!(
            config.notifier.endpoints,
            vec!["http://rpc.pingomatic.com/", "http://rpc.twingly.com/"]
        );
        assert!(config.feed.is_none());
        assert!(config.metrics.is_none());
    }

    #[test]
    fn test_deserialize_missing_store_fails() {
        let toml = r#"
[publisher]
backend = "static_site"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_rest_blog_with_basic_auth() {
        let toml = r#"
[store]
spreadsheet_id = "s"
access_token = "t"

[publisher]
backend = "rest_blog"

[publisher.rest_blog]
api_url = "https://blog.example.com/wp-json/wp/v2/posts"

[publisher.rest_blog.auth]
method = "basic"
username = "editor"
password = "app-password"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let blog = config.publisher.rest_blog.as_ref().unwrap();
        assert_eq!(blog.post_status, "publish");
        assert!(matches!(
            &blog.auth,
            RestAuth::Basic { username, .. } if username == "editor"
        ));
    }

    #[test]
    fn test_deserialize_feed_policy() {
        let toml = format!(
            "{}\n[feed]\ntoken = \"ghp\"\non_failure = \"skip\"\n",
            MINIMAL
        );
        let config: Config = toml::from_str(&toml).unwrap();
        let feed = config.feed.unwrap();
        assert_eq!(feed.on_failure, FeedFailurePolicy::Skip);
        assert_eq!(feed.file_name, "feed.xml");
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let toml = format!("{}\n[feed]\ntoken = \"ghp-secret\"\n", MINIMAL);
        let config: Config = toml::from_str(&toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);

        assert!(sanitized.store.access_token_configured);
        assert_eq!(sanitized.publisher.backend, "static_site");
        assert_eq!(
            sanitized.publisher.target.as_deref(),
            Some("https://someone.github.io/links")
        );
        let feed = sanitized.feed.as_ref().unwrap();
        assert!(feed.token_configured);
        assert_eq!(feed.on_failure, FeedFailurePolicy::Abort);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("ya29.token"));
        assert!(!json.contains("ghp-secret"));
    }
}
