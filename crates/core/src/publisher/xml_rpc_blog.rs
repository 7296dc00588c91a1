//! Legacy blog publisher using the MetaWeblog XML-RPC API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::config::XmlRpcBlogConfig;
use crate::xmlrpc::{self, Value};

use super::render::link_list;
use super::{Artifact, PublishError, PublishedArtifact, Publisher};

const NAME: &str = "xml_rpc_blog";

/// Creates posts with `metaWeblog.newPost`.
pub struct XmlRpcBlogPublisher {
    client: Client,
    config: XmlRpcBlogConfig,
}

impl XmlRpcBlogPublisher {
    pub fn new(config: XmlRpcBlogConfig) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| PublishError::new(NAME, format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn new_post_call(&self, artifact: &Artifact) -> String {
        xmlrpc::method_call(
            "metaWeblog.newPost",
            &[
                Value::string(&self.config.blog_id),
                Value::string(&self.config.username),
                Value::string(&self.config.password),
                Value::Struct(vec![
                    ("title".to_string(), Value::string(&artifact.title)),
                    ("description".to_string(), Value::string(link_list(artifact))),
                ]),
                Value::Bool(true),
            ],
        )
    }
}

#[async_trait]
impl Publisher for XmlRpcBlogPublisher {
    fn name(&self) -> &str {
        NAME
    }

    fn failure_label(&self) -> &str {
        "XML-RPC"
    }

    async fn publish(&self, artifact: &Artifact) -> Result<PublishedArtifact, PublishError> {
        debug!(endpoint = %self.config.endpoint, items = artifact.len(), "Calling metaWeblog.newPost");

        let response = self
            .client
            .post(&self.config.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .body(self.new_post_call(artifact))
            .send()
            .await
            .map_err(|e| PublishError::transport(NAME, e))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(PublishError::http_status(NAME, status, &body));
        }

        if let Some(fault) = xmlrpc::fault_string(&body) {
            return Err(PublishError::new(NAME, format!("fault: {fault}")));
        }

        let post_id = xmlrpc::first_scalar(&body)
            .ok_or_else(|| PublishError::new(NAME, "response did not include a post id"))?;
        let public_url = self.config.post_url_template.replace("{id}", &post_id);

        info!(post_id = %post_id, url = %public_url, "Blog post created");
        Ok(PublishedArtifact::new(NAME, public_url))
    }
}
