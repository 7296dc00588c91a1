//! RSS feed publisher hosting the feed document in a public GitHub gist.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::FeedConfig;

use super::render::rss_feed;
use super::{Artifact, PublishError, PublishedArtifact, Publisher};

const NAME: &str = "gist_feed";

#[derive(Debug, Serialize)]
struct CreateGist<'a> {
    description: &'a str,
    public: bool,
    files: HashMap<&'a str, GistContent>,
}

#[derive(Debug, Serialize)]
struct GistContent {
    content: String,
}

#[derive(Debug, Deserialize)]
struct GistResponse {
    html_url: Option<String>,
    #[serde(default)]
    files: HashMap<String, GistFile>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    raw_url: Option<String>,
}

/// Publishes the artifact as an RSS document in a new public gist.
pub struct GistFeedPublisher {
    client: Client,
    config: FeedConfig,
}

impl GistFeedPublisher {
    pub fn new(config: FeedConfig) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent(concat!("linkdigest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PublishError::new(NAME, format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Publisher for GistFeedPublisher {
    fn name(&self) -> &str {
        NAME
    }

    fn failure_label(&self) -> &str {
        "Gist"
    }

    async fn publish(&self, artifact: &Artifact) -> Result<PublishedArtifact, PublishError> {
        let mut files = HashMap::new();
        files.insert(
            self.config.file_name.as_str(),
            GistContent {
                content: rss_feed(artifact, self.config.site_url.as_deref()),
            },
        );
        let body = CreateGist {
            description: &artifact.title,
            public: true,
            files,
        };

        let url = format!("{}/gists", self.config.api_url.trim_end_matches('/'));
        debug!(url = %url, "Creating feed gist");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .json(&body)
            .send()
            .await
            .map_err(|e| PublishError::transport(NAME, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PublishError::http_status(NAME, status, &text));
        }

        let gist: GistResponse = response
            .json()
            .await
            .map_err(|e| PublishError::new(NAME, format!("failed to parse response: {e}")))?;

        let public_url = gist
            .files
            .get(&self.config.file_name)
            .and_then(|f| f.raw_url.clone())
            .or(gist.html_url)
            .ok_or_else(|| PublishError::new(NAME, "response did not include a gist URL"))?;

        info!(url = %public_url, "Feed gist created");
        Ok(PublishedArtifact::new(NAME, public_url))
    }
}
