//! HTML parser for extracting links
//!
//! Only `<a href>` anchors are considered. Each href is resolved against the
//! page URL and kept if it looks like another HTML document.

use scraper::{Html, Selector};
use std::collections::BTreeSet;
use url::Url;

/// Decides which resolved links are worth queueing
#[derive(Debug, Clone)]
pub struct LinkPolicy {
    /// Lowercase file extensions (with leading dot) accepted as documents
    extensions: Vec<String>,
}

impl LinkPolicy {
    /// Creates a policy accepting the given document extensions
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Checks the path shape of an absolute URL
    ///
    /// Accepted: an empty path, a path ending in `/`, a last segment without
    /// an extension, or a last segment ending in a document extension.
    pub fn accepts_path(&self, url: &Url) -> bool {
        let path = url.path();
        if path.is_empty() || path.ends_with('/') {
            return true;
        }

        let last_segment = path.rsplit('/').next().unwrap_or(path);
        match last_segment.rfind('.') {
            None => true,
            Some(dot) => {
                let extension = last_segment[dot..].to_ascii_lowercase();
                self.extensions.iter().any(|allowed| *allowed == extension)
            }
        }
    }

    /// Checks scheme, host and path shape
    pub fn accepts(&self, url: &Url) -> bool {
        matches!(url.scheme(), "http" | "https")
            && url.host_str().map_or(false, |host| !host.is_empty())
            && self.accepts_path(url)
    }
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_DOCUMENT_EXTENSIONS)
    }
}

/// Extracts the deduplicated set of crawlable links from an HTML document
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The URL the page was requested as
/// * `policy` - Which resolved links to keep
///
/// # Example
///
/// ```
/// use domain_mapper::crawler::{extract_links, LinkPolicy};
/// use url::Url;
///
/// let html = r#"<html><body><a href="/page">Link</a><a href="/logo.png">Logo</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let links = extract_links(html, &base_url, &LinkPolicy::default());
/// assert_eq!(links.len(), 1);
/// assert!(links.contains("https://example.com/page"));
/// ```
pub fn extract_links(html: &str, base_url: &Url, policy: &LinkPolicy) -> BTreeSet<String> {
    let document = Html::parse_document(html);
    let mut links = BTreeSet::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&a_selector) {
        if let Some(href) = element.value().attr("href") {
            if let Some(absolute_url) = resolve_link(href, base_url, policy) {
                links.insert(absolute_url);
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded. Hrefs that cannot be
/// resolved at all are logged.
fn resolve_link(href: &str, base_url: &Url, policy: &LinkPolicy) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if policy.accepts(&absolute_url) => Some(absolute_url.to_string()),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("Dropping malformed link {:?} on {}: {}", href, base_url, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    fn links(html: &str) -> Vec<String> {
        extract_links(html, &base_url(), &LinkPolicy::default())
            .into_iter()
            .collect()
    }

    #[test]
    fn test_extract_absolute_link() {
        let links = links(r#"<html><body><a href="https://other.com/page">Link</a></body></html>"#);
        assert_eq!(links, vec!["https://other.com/page".to_string()]);
    }

    #[test]
    fn test_extract_relative_link() {
        let links = links(r#"<html><body><a href="/other">Link</a></body></html>"#);
        assert_eq!(links, vec!["https://example.com/other".to_string()]);
    }

    #[test]
    fn test_extract_relative_path_link() {
        let links = links(r#"<html><body><a href="other">Link</a></body></html>"#);
        assert_eq!(links, vec!["https://example.com/other".to_string()]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let links = links(
            r#"<a href="/a">1</a><a href="/a">2</a><a href="https://example.com/a">3</a>"#,
        );
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn test_skip_non_http_schemes() {
        let html = r#"
            <a href="javascript:void(0)">js</a>
            <a href="mailto:test@example.com">mail</a>
            <a href="tel:+1234567890">call</a>
            <a href="ftp://example.com/file/">ftp</a>
        "#;
        assert!(links(html).is_empty());
    }

    #[test]
    fn test_skip_fragment_only() {
        let links = links(r##"<html><body><a href="#section">Jump</a></body></html>"##);
        assert!(links.is_empty());
    }

    #[test]
    fn test_document_extensions_accepted() {
        let html = r#"
            <a href="/index.html">a</a>
            <a href="/script.PHP">b</a>
            <a href="/dir/">c</a>
            <a href="/cgi-bin/run.cgi">d</a>
        "#;
        assert_eq!(links(html).len(), 4);
    }

    #[test]
    fn test_other_extensions_rejected() {
        let html = r#"
            <a href="/logo.png">a</a>
            <a href="/paper.pdf">b</a>
            <a href="/style.css">c</a>
            <a href="/archive.tar.gz">d</a>
        "#;
        assert!(links(html).is_empty());
    }

    #[test]
    fn test_query_does_not_affect_path_check() {
        let links = links(r#"<a href="/search?file=x.png">s</a>"#);
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn test_only_anchor_tags() {
        let html = r#"
            <link rel="canonical" href="https://example.com/canonical">
            <img src="https://example.com/img">
            <area href="https://example.com/area">
        "#;
        assert!(links(html).is_empty());
    }

    #[test]
    fn test_custom_policy() {
        let policy = LinkPolicy::new([".txt"]);
        let base = base_url();
        let found = extract_links(
            r#"<a href="/notes.txt">t</a><a href="/page.html">h</a>"#,
            &base,
            &policy,
        );
        assert_eq!(found.len(), 1);
        assert!(found.contains("https://example.com/notes.txt"));
    }

    #[test]
    fn test_accepts_root() {
        let policy = LinkPolicy::default();
        assert!(policy.accepts(&Url::parse("http://b.test").unwrap()));
        assert!(policy.accepts(&Url::parse("http://b.test/page").unwrap()));
    }
}
