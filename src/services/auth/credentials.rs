//! Credential extraction from `Authorization` header / cookie values.
//!
//! Malformed input is never an error: it just means "no credential".

const BEARER_SCHEME: &str = "bearer";

/// `Authorization: Bearer <token>` -> `<token>`.
///
/// The value is trimmed and split on whitespace; exactly two parts are
/// required and the scheme match is case-insensitive.
pub fn bearer_token(header_value: Option<&str>) -> Option<&str> {
    let mut parts = header_value?.split_whitespace();

    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return None;
    }

    Some(token)
}

/// Cookie values carry the raw token as-is (no scheme).
pub fn cookie_token(cookie_value: Option<&str>) -> Option<&str> {
    cookie_value.map(str::trim).filter(|v| !v.is_empty())
}

/// Header first, cookie as fallback.
///
/// A malformed header does not block the cookie: both are independent sources.
pub fn extract_raw_token(
    authorization_header: Option<&str>,
    cookie_value: Option<&str>,
) -> Option<String> {
    bearer_token(authorization_header)
        .or_else(|| cookie_token(cookie_value))
        .map(str::to_string)
}
