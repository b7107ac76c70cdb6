//! OAuth anti-forgery state: generation and cookie helpers.
//!
//! The state is an opaque 256-bit random value encoded as hex (64 chars).
//! It travels twice: once in the authorization URL (and back in the callback
//! query) and once in the `oauthstate` cookie. The callback only proceeds
//! when both copies are byte-for-byte equal.
//!
//! Cookie format: `oauthstate=<hex>; Path=/; Max-Age=<secs>[; Domain=<d>][; Secure][; HttpOnly]`
//! - `Domain` comes from config; without it the cookie is host-only
//! - `Secure` / `HttpOnly` are off unless enabled in config

use axum::http::header::{InvalidHeaderValue, COOKIE};
use axum::http::{HeaderMap, HeaderValue};

use crate::StateCookieConfig;

/// Cookie name for the OAuth state.
pub const STATE_COOKIE_NAME: &str = "oauthstate";

/// Generate a cryptographically random 256-bit state encoded as hex.
pub fn generate_state() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

fn attributes(config: &StateCookieConfig, max_age_secs: u64) -> String {
    let mut attrs = format!("Path=/; Max-Age={}", max_age_secs);
    if let Some(domain) = config.domain.as_deref().filter(|d| !d.is_empty()) {
        attrs.push_str("; Domain=");
        attrs.push_str(domain);
    }
    if config.secure {
        attrs.push_str("; Secure");
    }
    if config.http_only {
        attrs.push_str("; HttpOnly");
    }
    attrs
}

/// Build the `Set-Cookie` header value carrying `state`.
pub fn build_state_cookie(
    state: &str,
    config: &StateCookieConfig,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let cookie = format!(
        "{}={}; {}",
        STATE_COOKIE_NAME,
        state,
        attributes(config, config.max_age_secs)
    );
    HeaderValue::from_str(&cookie)
}

/// Build a `Set-Cookie` header that deletes the state cookie.
pub fn build_clear_cookie(config: &StateCookieConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let cookie = format!("{}=; {}", STATE_COOKIE_NAME, attributes(config, 0));
    HeaderValue::from_str(&cookie)
}

/// Extract the state from the request's `Cookie` header(s).
pub fn extract_state_from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|header| header.split(';'))
        .find_map(|part| {
            part.trim()
                .strip_prefix(STATE_COOKIE_NAME)
                .and_then(|rest| rest.strip_prefix('='))
                .map(|value| value.trim().to_string())
        })
        .filter(|value| !value.is_empty())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StateCookieConfig {
        StateCookieConfig::default()
    }

    #[test]
    fn test_generate_state_length_and_uniqueness() {
        let s1 = generate_state();
        let s2 = generate_state();
        assert_eq!(s1.len(), 64, "state should be 64 hex chars (256 bits)");
        assert!(s1.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(s1, s2);
    }

    #[test]
    fn test_default_cookie_is_host_only_two_hours() {
        let cookie = build_state_cookie("abc123", &config()).unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "oauthstate=abc123; Path=/; Max-Age=7200"
        );
    }

    #[test]
    fn test_cookie_with_domain_and_flags() {
        let config = StateCookieConfig {
            domain: Some("api.example.com".into()),
            max_age_secs: 600,
            secure: true,
            http_only: true,
        };
        let cookie = build_state_cookie("abc", &config).unwrap();
        let value = cookie.to_str().unwrap();
        assert!(value.starts_with("oauthstate=abc; Path=/; Max-Age=600"));
        assert!(value.contains("; Domain=api.example.com"));
        assert!(value.contains("; Secure"));
        assert!(value.contains("; HttpOnly"));
    }

    #[test]
    fn test_clear_cookie() {
        let cookie = build_clear_cookie(&config()).unwrap();
        assert_eq!(cookie.to_str().unwrap(), "oauthstate=; Path=/; Max-Age=0");
    }

    #[test]
    fn test_extract_state() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; oauthstate=abc123; other=1"),
        );
        assert_eq!(extract_state_from_cookies(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_extract_state_across_multiple_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(COOKIE, HeaderValue::from_static("oauthstate=xyz"));
        assert_eq!(extract_state_from_cookies(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_extract_state_absent_or_empty() {
        let mut headers = HeaderMap::new();
        assert!(extract_state_from_cookies(&headers).is_none());

        headers.insert(COOKIE, HeaderValue::from_static("oauthstate=; x=1"));
        assert!(extract_state_from_cookies(&headers).is_none());

        // A cookie whose name merely starts with the state cookie name is ignored
        headers.insert(COOKIE, HeaderValue::from_static("oauthstate2=abc"));
        assert!(extract_state_from_cookies(&headers).is_none());
    }
}
