use crate::UrlError;
use url::Url;

/// Normalizes a URL into the canonical form used as the crawl queue key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or not HTTP(S)
/// 2. Remove the query string
/// 3. Remove the fragment
/// 4. If the last path segment has no dot (does not look like a file name),
///    make sure the path ends with a slash
///
/// Scheme and host are kept as parsed (the `url` crate already lowercases
/// the host). The result is stable under repeated normalization.
///
/// # Arguments
///
/// * `url_str` - The absolute URL string to normalize
///
/// # Returns
///
/// * `Ok(String)` - The canonical URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use domain_mapper::url::normalize_url;
///
/// let url = normalize_url("http://example.com/docs?page=2#intro").unwrap();
/// assert_eq!(url, "http://example.com/docs/");
///
/// let url = normalize_url("http://example.com/index.html?x=1").unwrap();
/// assert_eq!(url, "http://example.com/index.html");
/// ```
pub fn normalize_url(url_str: &str) -> Result<String, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    url.set_query(None);
    url.set_fragment(None);

    if needs_trailing_slash(url.path()) {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url.into())
}

/// Returns true when the path's last segment looks like a directory
fn needs_trailing_slash(path: &str) -> bool {
    if path.ends_with('/') {
        return false;
    }

    let last_segment = path.rsplit('/').next().unwrap_or("");
    !last_segment.contains('.')
}
