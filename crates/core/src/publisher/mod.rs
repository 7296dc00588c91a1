//! Publisher module for turning a batch of URLs into a public artifact.
//!
//! Every deployment variant (static site, hosted blog, XML-RPC blog, gist
//! feed) implements the same `Publisher` trait; the orchestrator only ever
//! sees `publish(artifact) -> public_url`.
//!
//! # Example
//!
//! ```ignore
//! use linkdigest_core::publisher::{create_publisher, Artifact};
//!
//! let publisher = create_publisher(&config.publisher)?;
//! let artifact = Artifact::new(vec!["https://example.com".into()], chrono::Utc::now());
//! let published = publisher.publish(&artifact).await?;
//! println!("Published at {}", published.public_url);
//! ```

mod error;
mod gist_feed;
pub mod render;
mod rest_blog;
mod static_site;
mod traits;
mod types;
mod xml_rpc_blog;

pub use error::PublishError;
pub use gist_feed::GistFeedPublisher;
pub use rest_blog::RestBlogPublisher;
pub use static_site::StaticSitePublisher;
pub use traits::Publisher;
pub use types::{Artifact, PublishedArtifact};
pub use xml_rpc_blog::XmlRpcBlogPublisher;

use crate::config::{FeedConfig, PublisherBackend, PublisherConfig};

/// Factory function to create the configured primary publisher
pub fn create_publisher(config: &PublisherConfig) -> Result<Box<dyn Publisher>, PublishError> {
    let missing = |section: &str| {
        PublishError::new(
            config.backend.as_str(),
            format!("[publisher.{section}] must be set for this backend"),
        )
    };

    match config.backend {
        PublisherBackend::StaticSite => {
            let site = config
                .static_site
                .clone()
                .ok_or_else(|| missing("static_site"))?;
            Ok(Box::new(StaticSitePublisher::new(site)))
        }
        PublisherBackend::RestBlog => {
            let blog = config
                .rest_blog
                .clone()
                .ok_or_else(|| missing("rest_blog"))?;
            Ok(Box::new(RestBlogPublisher::new(blog)?))
        }
        PublisherBackend::XmlRpcBlog => {
            let blog = config
                .xml_rpc_blog
                .clone()
                .ok_or_else(|| missing("xml_rpc_blog"))?;
            Ok(Box::new(XmlRpcBlogPublisher::new(blog)?))
        }
    }
}

/// Factory function to create the secondary feed publisher
pub fn create_feed_publisher(config: &FeedConfig) -> Result<Box<dyn Publisher>, PublishError> {
    Ok(Box::new(GistFeedPublisher::new(config.clone())?))
}
