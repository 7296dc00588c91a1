//! Static site publisher: writes a post page into a git checkout and pushes it.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::StaticSiteConfig;

use super::render::{index_entry, insert_index_entry, new_index_page, post_page};
use super::{Artifact, PublishError, PublishedArtifact, Publisher};

const NAME: &str = "static_site";
const POSTS_DIR: &str = "posts";
const INDEX_FILE: &str = "index.html";

/// Publishes artifacts as pages of a static site kept in a git repository
/// (e.g. GitHub Pages).
pub struct StaticSitePublisher {
    config: StaticSiteConfig,
}

impl StaticSitePublisher {
    pub fn new(config: StaticSiteConfig) -> Self {
        Self { config }
    }

    fn posts_dir(&self) -> PathBuf {
        self.config.repo_path.join(POSTS_DIR)
    }

    /// Public URL of a post file.
    pub fn post_url(&self, file_name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.public_base_url.trim_end_matches('/'),
            POSTS_DIR,
            file_name
        )
    }

    /// Writes the post page, picking a free file name if a post with the same
    /// slug already exists. Returns the file name.
    async fn write_post(&self, artifact: &Artifact) -> Result<String, PublishError> {
        let dir = self.posts_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| PublishError::io(NAME, "failed to create posts directory", e))?;

        let mut file_name = format!("{}.html", artifact.slug);
        let mut suffix = 2;
        while path_exists(&dir.join(&file_name)).await {
            file_name = format!("{}-{}.html", artifact.slug, suffix);
            suffix += 1;
        }

        let path = dir.join(&file_name);
        tokio::fs::write(&path, post_page(artifact))
            .await
            .map_err(|e| PublishError::io(NAME, "failed to write post", e))?;
        debug!(path = %path.display(), "Wrote post page");

        Ok(file_name)
    }

    /// Adds the post to the index page, creating the page if needed.
    async fn update_index(&self, file_name: &str, title: &str) -> Result<(), PublishError> {
        let path = self.config.repo_path.join(INDEX_FILE);
        let entry = index_entry(file_name, title);

        let content = if path_exists(&path).await {
            let existing = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| PublishError::io(NAME, "failed to read index", e))?;
            match insert_index_entry(&existing, &entry) {
                Some(updated) => updated,
                None => {
                    warn!(path = %path.display(), "Index page has no <ul>, leaving it unchanged");
                    return Ok(());
                }
            }
        } else {
            new_index_page(&entry)
        };

        tokio::fs::write(&path, content)
            .await
            .map_err(|e| PublishError::io(NAME, "failed to write index", e))
    }

    /// Runs one git command in the checkout, bounded by the configured timeout.
    async fn git(&self, args: &[&str]) -> Result<(), PublishError> {
        let child = Command::new(&self.config.git_path)
            .args(args)
            .current_dir(&self.config.repo_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PublishError::new(
                        NAME,
                        format!("git not found at {}", self.config.git_path.display()),
                    )
                } else {
                    PublishError::io(NAME, "failed to spawn git", e)
                }
            })?;

        let limit = Duration::from_secs(self.config.timeout_secs as u64);
        let output = timeout(limit, child.wait_with_output())
            .await
            .map_err(|_| {
                PublishError::new(
                    NAME,
                    format!("git {} timed out after {}s", args[0], limit.as_secs()),
                )
            })?
            .map_err(|e| PublishError::io(NAME, "git did not finish", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PublishError::new(
                NAME,
                format!(
                    "git {} failed ({}): {}",
                    args[0],
                    output.status,
                    stderr.trim().chars().take(300).collect::<String>()
                ),
            ));
        }

        debug!(command = args[0], "git command succeeded");
        Ok(())
    }

    async fn commit_and_push(&self, post_file: &str, title: &str) -> Result<(), PublishError> {
        let post_path = format!("{POSTS_DIR}/{post_file}");
        self.git(&["add", &post_path, INDEX_FILE]).await?;
        self.git(&["commit", "-m", &format!("Add new link report: {title}")])
            .await?;
        self.git(&["push", &self.config.remote]).await?;
        Ok(())
    }
}

#[async_trait]
impl Publisher for StaticSitePublisher {
    fn name(&self) -> &str {
        NAME
    }

    fn failure_label(&self) -> &str {
        "GitHub Push"
    }

    async fn publish(&self, artifact: &Artifact) -> Result<PublishedArtifact, PublishError> {
        let file_name = self.write_post(artifact).await?;
        self.update_index(&file_name, &artifact.title).await?;

        if self.config.push {
            self.commit_and_push(&file_name, &artifact.title).await?;
            info!(remote = %self.config.remote, file = %file_name, "Pushed new post");
        } else {
            info!(file = %file_name, "Wrote post (push disabled)");
        }

        Ok(PublishedArtifact::new(NAME, self.post_url(&file_name)))
    }
}

async fn path_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
