//! Hosted blog publisher over a JSON REST API (WordPress-style `posts` endpoint).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{RestAuth, RestBlogConfig};

use super::render::link_list;
use super::{Artifact, PublishError, PublishedArtifact, Publisher};

const NAME: &str = "rest_blog";

/// Response fields that may hold the public post URL, in preference order.
const URL_FIELDS: &[&str] = &["link", "url", "URL"];

#[derive(Debug, Serialize)]
struct NewPost<'a> {
    title: &'a str,
    content: String,
    status: &'a str,
}

/// Creates one blog post per artifact.
pub struct RestBlogPublisher {
    client: Client,
    config: RestBlogConfig,
}

impl RestBlogPublisher {
    pub fn new(config: RestBlogConfig) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| PublishError::new(NAME, format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Publisher for RestBlogPublisher {
    fn name(&self) -> &str {
        NAME
    }

    fn failure_label(&self) -> &str {
        "Blog"
    }

    async fn publish(&self, artifact: &Artifact) -> Result<PublishedArtifact, PublishError> {
        let post = NewPost {
            title: &artifact.title,
            content: link_list(artifact),
            status: &self.config.post_status,
        };

        let request = self.client.post(&self.config.api_url).json(&post);
        let request = match &self.config.auth {
            RestAuth::Bearer { token } => request.bearer_auth(token),
            RestAuth::Basic { username, password } => request.basic_auth(username, Some(password)),
        };

        debug!(api = %self.config.api_url, items = artifact.len(), "Creating blog post");
        let response = request
            .send()
            .await
            .map_err(|e| PublishError::transport(NAME, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::http_status(NAME, status, &body));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| PublishError::new(NAME, format!("failed to parse response: {e}")))?;

        let public_url = URL_FIELDS
            .iter()
            .find_map(|field| body.get(*field).and_then(Value::as_str))
            .filter(|url| !url.is_empty())
            .ok_or_else(|| PublishError::new(NAME, "response did not include a post URL"))?;

        info!(url = public_url, "Blog post created");
        Ok(PublishedArtifact::new(NAME, public_url))
    }
}
