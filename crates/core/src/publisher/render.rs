//! HTML and RSS rendering for artifacts.
//!
//! Output is deterministic for a given artifact: the only time-varying input
//! is the artifact's own timestamp.

use crate::xmlrpc::escape;

use super::Artifact;

/// The batch URLs as an HTML list, in batch order.
pub fn link_list(artifact: &Artifact) -> String {
    let mut out = String::from("<ul>\n");
    for url in &artifact.items {
        let url = escape(url);
        out.push_str(&format!("      <li><a href=\"{url}\">{url}</a></li>\n"));
    }
    out.push_str("</ul>");
    out
}

/// A standalone post page for the static site.
pub fn post_page(artifact: &Artifact) -> String {
    let title = escape(&artifact.title);
    let mut links = String::new();
    for url in &artifact.items {
        let url = escape(url);
        links.push_str(&format!("      <li><a href=\"{url}\">{url}</a></li>\n"));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
</head>
<body>
    <h1>{title}</h1>
    <p><a href="../index.html">Back to Home</a></p>
    <ul>
{links}    </ul>
</body>
</html>
"#
    )
}

/// List entry linking a post from the index page.
pub fn index_entry(post_file: &str, title: &str) -> String {
    format!(
        "<li><a href=\"posts/{}\">{}</a></li>",
        escape(post_file),
        escape(title)
    )
}

/// A fresh index page holding a single entry.
pub fn new_index_page(entry: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Link Index Hub</title>
</head>
<body>
    <h1>Link Index Reports</h1>
    <ul>
        {entry}
    </ul>
</body>
</html>
"#
    )
}

/// Inserts `entry` right after the first line containing `<ul>`, so the
/// newest post is listed first. Returns `None` if the page has no list.
pub fn insert_index_entry(existing: &str, entry: &str) -> Option<String> {
    let mut out = String::with_capacity(existing.len() + entry.len() + 16);
    let mut inserted = false;

    for line in existing.split_inclusive('\n') {
        out.push_str(line);
        if !inserted && line.contains("<ul>") {
            if !line.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("        ");
            out.push_str(entry);
            out.push('\n');
            inserted = true;
        }
    }

    inserted.then_some(out)
}

/// An RSS 2.0 document with one item per URL.
///
/// `channel_link` falls back to the artifact's permalink, then to the first
/// item.
pub fn rss_feed(artifact: &Artifact, channel_link: Option<&str>) -> String {
    let pub_date = artifact.created_at.to_rfc2822();
    let link = channel_link
        .or(artifact.permalink.as_deref())
        .or(artifact.items.first().map(String::as_str))
        .unwrap_or_default();

    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\">\n<channel>\n");
    out.push_str(&format!("  <title>{}</title>\n", escape(&artifact.title)));
    out.push_str(&format!("  <link>{}</link>\n", escape(link)));
    out.push_str(&format!(
        "  <description>{} new links</description>\n",
        artifact.items.len()
    ));
    out.push_str(&format!("  <lastBuildDate>{pub_date}</lastBuildDate>\n"));

    if let Some(permalink) = &artifact.permalink {
        let permalink = escape(permalink);
        out.push_str(&format!(
            "  <item>\n    <title>{}</title>\n    <link>{permalink}</link>\n    <guid>{permalink}</guid>\n    <pubDate>{pub_date}</pubDate>\n  </item>\n",
            escape(&artifact.title)
        ));
    }

    for url in &artifact.items {
        let url = escape(url);
        out.push_str(&format!(
            "  <item>\n    <title>{url}</title>\n    <link>{url}</link>\n    <guid>{url}</guid>\n    <pubDate>{pub_date}</pubDate>\n  </item>\n"
        ));
    }

    out.push_str("</channel>\n</rss>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn artifact(urls: &[&str]) -> Artifact {
        Artifact::new(
            urls.iter().map(|u| u.to_string()).collect(),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_post_page_lists_urls_in_order() {
        let html = post_page(&artifact(&["http://a", "http://b"]));
        let a = html.find("href=\"http://a\"").unwrap();
        let b = html.find("href=\"http://b\"").unwrap();
        assert!(a < b);
        assert!(html.contains("<title>Link Report: 2024-05-01-120000</title>"));
        assert!(html.contains("../index.html"));
    }

    #[test]
    fn test_urls_are_escaped() {
        let html = link_list(&artifact(&["http://x/?q=<script>&a=1"]));
        assert!(html.contains("http://x/?q=&lt;script&gt;&amp;a=1"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_insert_index_entry_newest_first() {
        let page = new_index_page(&index_entry("old.html", "Old"));
        let updated = insert_index_entry(&page, &index_entry("new.html", "New")).unwrap();

        let new_pos = updated.find("posts/new.html").unwrap();
        let old_pos = updated.find("posts/old.html").unwrap();
        assert!(new_pos < old_pos);
        assert_eq!(updated.matches("<ul>").count(), 1);
    }

    #[test]
    fn test_insert_index_entry_without_list() {
        assert!(insert_index_entry("<html><body></body></html>", "<li/>").is_none());
    }

    #[test]
    fn test_rss_feed_items() {
        let feed = rss_feed(
            &artifact(&["http://a", "http://b"]).with_permalink("https://site/posts/x.html"),
            None,
        );
        assert!(feed.starts_with("<?xml"));
        assert!(feed.contains("<link>https://site/posts/x.html</link>"));
        assert_eq!(feed.matches("<item>").count(), 3);
        assert!(feed.contains("<description>2 new links</description>"));
        assert!(feed.find("<guid>http://a</guid>").unwrap() < feed.find("<guid>http://b</guid>").unwrap());
    }

    #[test]
    fn test_rss_feed_channel_link_override() {
        let feed = rss_feed(&artifact(&["http://a"]), Some("https://hub.example"));
        assert!(feed.contains("<link>https://hub.example</link>"));
    }
}
