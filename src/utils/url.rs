// src/utils/url.rs

//! URL and handle manipulation utilities.

use crate::error::{AppError, Result};

/// Derive a local handle from a feed URL.
///
/// The scheme is stripped and path separators become `-`, so the result is
/// a pure function of the URL.
///
/// # Examples
/// ```
/// use syndicate::utils::url::handle_from_url;
///
/// assert_eq!(
///     handle_from_url("https://news.ycombinator.com/rss"),
///     "news.ycombinator.com-rss"
/// );
/// ```
pub fn handle_from_url(url: &str) -> String {
    let without_scheme = match url.find("://") {
        Some(idx) if url.starts_with("http") => &url[idx + 3..],
        _ => url,
    };
    without_scheme.replace('/', "-")
}

/// Split a fully qualified username into handle and host.
///
/// `"@admin"` is local, `"admin@rabble.dev"` and `"admin@http://r.dev"` are
/// remote. Anything with more than one `@` after the leading one, or an empty
/// part, is rejected.
pub fn parse_username(fqu: &str) -> Result<(String, Option<String>)> {
    let invalid = || AppError::validation(format!("Couldn't parse username {fqu}"));

    let trimmed = fqu.trim_start_matches('@');
    let mut parts = trimmed.split('@');
    let handle = parts.next().unwrap_or_default();
    let host = parts.next();
    if parts.next().is_some() || handle.is_empty() {
        return Err(invalid());
    }

    match host {
        None => Ok((handle.to_string(), None)),
        Some(host) => {
            let host = host
                .trim_start_matches("http://")
                .trim_start_matches("https://");
            if host.is_empty() {
                return Err(invalid());
            }
            Ok((handle.to_string(), Some(host.to_string())))
        }
    }
}

/// Add a scheme to a bare host.
///
/// Hosts without a dot are taken to be development hosts (`skinny_1:1916`)
/// and get `http://`; everything else gets `https://`.
pub fn normalise_host(host: &str) -> String {
    if host.is_empty() || host.starts_with("http://") || host.starts_with("https://") {
        return host.to_string();
    }
    if !host.contains('.') {
        return format!("http://{host}");
    }
    format!("https://{host}")
}
