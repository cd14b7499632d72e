use crate::UrlError;
use publicsuffix::{List, Psl};
use std::sync::OnceLock;
use url::Url;

/// Mozilla public suffix list, ICANN and private sections
const PUBLIC_SUFFIX_DATA: &str = include_str!("../../data/public_suffix_list.dat");

static PUBLIC_SUFFIXES: OnceLock<Option<List>> = OnceLock::new();

fn public_suffixes() -> Option<&'static List> {
    PUBLIC_SUFFIXES
        .get_or_init(|| {
            PUBLIC_SUFFIX_DATA
                .parse::<List>()
                .map_err(|e| {
                    tracing::warn!(
                        "Public suffix list unusable, falling back to last two labels: {}",
                        e
                    )
                })
                .ok()
        })
        .as_ref()
}

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// The port is not part of the domain. If the URL has no host, it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use domain_mapper::url::extract_domain;
///
/// let url = Url::parse("https://example.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Parses a URL string and returns its domain
pub fn domain_of(url_str: &str) -> Result<String, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    extract_domain(&url).ok_or(UrlError::MissingDomain)
}

/// Collapses a host name to its registrable domain
///
/// Looks the host up in the public suffix list (private entries such as
/// `github.io` included) and keeps one label below the matching suffix.
/// Hosts the list cannot split, such as single labels, fall back to their
/// last two labels. IP addresses are returned unchanged.
///
/// ```
/// use domain_mapper::url::registrable_domain;
///
/// assert_eq!(registrable_domain("blog.example.com"), "example.com");
/// assert_eq!(registrable_domain("news.bbc.co.uk"), "bbc.co.uk");
/// assert_eq!(registrable_domain("alice.github.io"), "alice.github.io");
/// ```
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_lowercase();

    if host.parse::<std::net::IpAddr>().is_ok() {
        return host;
    }

    let listed = public_suffixes()
        .and_then(|list| list.domain(host.as_bytes()))
        .and_then(|domain| std::str::from_utf8(domain.as_bytes()).ok().map(str::to_string));

    listed.unwrap_or_else(|| last_two_labels(&host))
}

fn last_two_labels(host: &str) -> String {
    let labels: Vec<&str> = host.split('.').collect();
    labels[labels.len().saturating_sub(2)..].join(".")
}
