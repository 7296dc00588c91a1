use reqwest::Url;

use super::{
    types::{Config, PublisherBackend},
    ConfigError,
};

/// Validate configuration
/// Currently validates:
/// - Batch size is at least 1
/// - Store identity and token are set
/// - The selected publisher backend has its section
/// - Ping endpoints are http(s) URLs
/// - Timeouts are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.batch.size == 0 {
        return Err(invalid("batch.size must be at least 1"));
    }

    // Store validation
    if config.store.spreadsheet_id.trim().is_empty() {
        return Err(invalid("store.spreadsheet_id cannot be empty"));
    }
    if config.store.access_token.trim().is_empty() {
        return Err(invalid("store.access_token cannot be empty"));
    }
    if config.store.url_column == config.store.status_column {
        return Err(invalid(
            "store.url_column and store.status_column must differ",
        ));
    }
    non_zero_timeout("store.timeout_secs", config.store.timeout_secs)?;

    // Publisher validation
    let publisher = &config.publisher;
    match publisher.backend {
        PublisherBackend::StaticSite => {
            let site = publisher
                .static_site
                .as_ref()
                .ok_or_else(|| missing_section("static_site"))?;
            http_url("publisher.static_site.public_base_url", &site.public_base_url)?;
            non_zero_timeout("publisher.static_site.timeout_secs", site.timeout_secs)?;
        }
        PublisherBackend::RestBlog => {
            let blog = publisher
                .rest_blog
                .as_ref()
                .ok_or_else(|| missing_section("rest_blog"))?;
            http_url("publisher.rest_blog.api_url", &blog.api_url)?;
            non_zero_timeout("publisher.rest_blog.timeout_secs", blog.timeout_secs)?;
        }
        PublisherBackend::XmlRpcBlog => {
            let blog = publisher
                .xml_rpc_blog
                .as_ref()
                .ok_or_else(|| missing_section("xml_rpc_blog"))?;
            http_url("publisher.xml_rpc_blog.endpoint", &blog.endpoint)?;
            if !blog.post_url_template.contains("{id}") {
                return Err(invalid(
                    "publisher.xml_rpc_blog.post_url_template must contain {id}",
                ));
            }
            non_zero_timeout("publisher.xml_rpc_blog.timeout_secs", blog.timeout_secs)?;
        }
    }

    // Feed validation
    if let Some(feed) = &config.feed {
        if feed.token.trim().is_empty() {
            return Err(invalid("feed.token cannot be empty"));
        }
        if feed.file_name.trim().is_empty() {
            return Err(invalid("feed.file_name cannot be empty"));
        }
        non_zero_timeout("feed.timeout_secs", feed.timeout_secs)?;
    }

    // Notifier validation
    for endpoint in &config.notifier.endpoints {
        http_url("notifier.endpoints", endpoint)?;
    }
    non_zero_timeout("notifier.timeout_secs", config.notifier.timeout_secs)?;

    Ok(())
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::ValidationError(msg.to_string())
}

fn missing_section(name: &str) -> ConfigError {
    ConfigError::ValidationError(format!(
        "publisher.backend = \"{name}\" requires a [publisher.{name}] section"
    ))
}

fn non_zero_timeout(field: &str, value: u32) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::ValidationError(format!(
            "{field} cannot be 0"
        )));
    }
    Ok(())
}

fn http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::ValidationError(format!("{field}: invalid URL {value:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::ValidationError(format!(
            "{field}: unsupported scheme {other:?} in {value:?}"
        ))),
    }
}
