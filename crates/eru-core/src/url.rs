//! Host extraction and normalization
//!
//! Every producer keys its counters by a canonical host: lowercase, with any
//! leading `www.` labels removed. These functions work directly on string
//! slices and never fail; unusable input yields `None`, and
//! [`derive_domain`] falls back to the [`DIRECT_DOMAIN`] sentinel.

use crate::types::SchemeMask;

/// Domain key used when no host can be recovered from an event.
pub const DIRECT_DOMAIN: &str = "direct";

// =============================================================================
// Scheme Extraction
// =============================================================================

/// Fast scheme extraction without URL parsing.
/// Returns None if the input has no `scheme://` prefix, and the empty mask
/// for any scheme other than http(s).
#[inline]
pub fn extract_scheme(url: &str) -> Option<SchemeMask> {
    let end = get_scheme_end(url)?;
    let scheme = &url[..end - 3];

    let mask = if scheme.eq_ignore_ascii_case("https") {
        SchemeMask::HTTPS
    } else if scheme.eq_ignore_ascii_case("http") {
        SchemeMask::HTTP
    } else {
        SchemeMask::empty()
    };
    Some(mask)
}

/// Get the position after "://".
///
/// The scheme must start with a letter and contain only letters, digits,
/// `+`, `-` or `.`, so bare `host:port` strings are not mistaken for URLs.
#[inline]
pub fn get_scheme_end(url: &str) -> Option<usize> {
    let bytes = url.as_bytes();
    let colon_pos = bytes.iter().position(|&b| b == b':')?;

    if colon_pos == 0 || !bytes[0].is_ascii_alphabetic() {
        return None;
    }
    let valid_scheme = bytes[..colon_pos]
        .iter()
        .all(|&b| b.is_ascii_alphanumeric() || b == b'+' || b == b'-' || b == b'.');
    if !valid_scheme {
        return None;
    }

    if bytes.len() > colon_pos + 2 && bytes[colon_pos + 1] == b'/' && bytes[colon_pos + 2] == b'/' {
        return Some(colon_pos + 3);
    }

    None
}

// =============================================================================
// Host Extraction
// =============================================================================

/// Get the start and end positions of the hostname, starting the scan at
/// `authority_start` (just after "://", or 0 for a bare host).
fn host_span(input: &str, authority_start: usize) -> (usize, usize) {
    let bytes = input.as_bytes();

    // Skip userinfo
    let mut host_start = authority_start;
    for i in authority_start..bytes.len() {
        match bytes[i] {
            b'@' => {
                host_start = i + 1;
                break;
            }
            b'/' | b'?' | b'#' => break,
            _ => {}
        }
    }

    // IPv6 literal keeps its colons
    if bytes.get(host_start) == Some(&b'[') {
        if let Some(close) = input[host_start..].find(']') {
            return (host_start, host_start + close + 1);
        }
    }

    let mut host_end = bytes.len();
    for i in host_start..bytes.len() {
        let b = bytes[i];
        if b == b'/' || b == b'?' || b == b'#' || b == b':' || b == b'\\' {
            host_end = i;
            break;
        }
    }

    (host_start, host_end)
}

/// Fast host extraction without allocations.
/// Returns a slice into the original URL, or None when the input is not a
/// `scheme://` URL or has an empty authority.
#[inline]
pub fn extract_host(url: &str) -> Option<&str> {
    let scheme_end = get_scheme_end(url)?;
    let (start, end) = host_span(url, scheme_end);
    let host = &url[start..end];
    if is_usable_host(host) {
        Some(host)
    } else {
        None
    }
}

fn is_usable_host(host: &str) -> bool {
    !host.is_empty() && !host.bytes().any(|b| b.is_ascii_whitespace() || b.is_ascii_control())
}

// =============================================================================
// Normalization
// =============================================================================

/// Remove leading `www.` labels, ignoring ASCII case.
///
/// Repeated prefixes are all removed so normalization stays idempotent.
#[inline]
pub fn strip_www(mut host: &str) -> &str {
    while host.len() > 4 && host.as_bytes()[..4].eq_ignore_ascii_case(b"www.") {
        host = &host[4..];
    }
    host
}

/// Canonical host key from either a full URL or a bare hostname.
///
/// Idempotent: normalizing an already-normalized host returns it unchanged.
pub fn normalize_host(input: &str) -> Option<String> {
    let input = input.trim();
    let host = match get_scheme_end(input) {
        Some(_) => extract_host(input)?,
        None => {
            let (start, end) = host_span(input, 0);
            let host = &input[start..end];
            if !is_usable_host(host) {
                return None;
            }
            host
        }
    };

    let host = host.trim_end_matches('.');
    let host = strip_www(host);
    if host.is_empty() {
        return None;
    }
    Some(host.to_ascii_lowercase())
}

/// Canonical host of a URL; bare strings (such as an opaque `null`
/// initiator) are rejected.
pub fn host_from_url(url: &str) -> Option<String> {
    extract_host(url.trim())?;
    normalize_host(url)
}

/// Derive the counting domain from a primary source (the request initiator)
/// with a secondary fallback (the request URL). Never fails.
pub fn derive_domain(primary: Option<&str>, secondary: Option<&str>) -> String {
    primary
        .filter(|s| !s.is_empty())
        .and_then(host_from_url)
        .or_else(|| secondary.filter(|s| !s.is_empty()).and_then(host_from_url))
        .unwrap_or_else(|| DIRECT_DOMAIN.to_string())
}
