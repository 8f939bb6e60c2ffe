//! HTTP client seam with rate limiting.
//!
//! All outgoing HTTP requests (search calls and image downloads) go through the
//! `HttpClient` trait so that tests can swap in `MockClient`.

mod client;
mod rate_limiter;

pub use client::{
    parse_http_url, HttpClient, MockClient, MockResponse, ReqwestClient, ReqwestClientBuilder,
};
pub use rate_limiter::RateLimiter;

/// Make a string safe to use as part of a file name.
/// e.g., "Acme X100 / Black" -> "Acme-X100-_-Black"
pub fn sanitize_for_filesystem(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else if c == '.' || c == '/' || c.is_whitespace() {
                '-'
            } else {
                '_'
            }
        })
        .take(120) // Leave room for "-<rank>.<ext>"
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_for_filesystem() {
        assert_eq!(sanitize_for_filesystem("acme-x100"), "acme-x100");
        assert_eq!(sanitize_for_filesystem(" Acme X100 "), "Acme-X100");
        assert_eq!(sanitize_for_filesystem("a/b.c?d"), "a-b-c_d");
        assert_eq!(sanitize_for_filesystem(&"x".repeat(500)).len(), 120);
    }
}
