use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors that can occur during URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL points to a private/internal IP address.
    #[error("Private IP address not allowed: {0}")]
    PrivateIp(String),
    /// The URL points to localhost.
    #[error("Localhost not allowed")]
    Localhost,
    /// Plain HTTP to a remote host.
    #[error("Insecure endpoint: HTTPS required (except localhost for testing)")]
    InsecureEndpoint,
}

/// Validate a public http(s) URL, such as the upstream feed or an article
/// link about to be handed to the system browser.
///
/// Rejects non-HTTP(S) schemes, localhost and private IP ranges (RFC 1918,
/// link-local, unique local IPv6).
///
/// # Examples
///
/// ```
/// use scrollfeed::util::validate_url;
///
/// let url = validate_url("https://example.com/story").unwrap();
/// assert_eq!(url.host_str(), Some("example.com"));
///
/// assert!(validate_url("http://localhost/feed").is_err());
/// assert!(validate_url("http://192.168.1.1/feed").is_err());
/// assert!(validate_url("file:///etc/passwd").is_err());
/// ```
pub fn validate_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;
    check_scheme(&url)?;

    if let Some(ip) = host_ip(&url) {
        if ip.is_loopback() {
            return Err(UrlValidationError::Localhost);
        }
        if is_private_ip(&ip) {
            return Err(UrlValidationError::PrivateIp(ip.to_string()));
        }
    } else if url.host_str() == Some("localhost") {
        return Err(UrlValidationError::Localhost);
    }

    Ok(url)
}

/// Validate the translation endpoint.
///
/// HTTPS is required for remote hosts; plain HTTP is accepted only for
/// loopback so the client can be pointed at a local mock.
pub fn validate_endpoint(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;
    check_scheme(&url)?;

    if url.scheme() == "http" {
        let loopback = url.host_str() == Some("localhost")
            || host_ip(&url).is_some_and(|ip| ip.is_loopback());
        if !loopback {
            return Err(UrlValidationError::InsecureEndpoint);
        }
    }

    Ok(url)
}

fn check_scheme(url: &Url) -> Result<(), UrlValidationError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
}

fn host_ip(url: &Url) -> Option<IpAddr> {
    let host = url.host_str()?;
    // Strip brackets from IPv6 addresses for parsing
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    host.parse().ok()
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            ipv4.is_private() || ipv4.is_loopback() || ipv4.is_link_local() || ipv4.is_unspecified()
        }
        IpAddr::V6(ipv6) => {
            if ipv6.is_loopback() || ipv6.is_unspecified() {
                return true;
            }
            let segments = ipv6.segments();
            // Unique Local (fc00::/7)
            let is_unique_local = (segments[0] & 0xfe00) == 0xfc00;
            // Link-Local (fe80::/10)
            let is_link_local = (segments[0] & 0xffc0) == 0xfe80;
            is_unique_local || is_link_local
        }
    }
}
