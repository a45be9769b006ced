use url::Url;

/// Extracts the domain (network location) from a URL
///
/// The host is lowercased and an explicit, non-default port is kept, so
/// `https://Example.com:8443/x` yields `example.com:8443`. Two URLs share a domain
/// for classification purposes exactly when their network locations match.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use press_scout::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/news").unwrap();
/// assert_eq!(extract_domain(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}
