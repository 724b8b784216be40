use subtle::ConstantTimeEq;

pub const AUTHORIZATION_HEADER: &str = "authorization";
pub const API_KEY_HEADER: &str = "x-api-key";

const BEARER_PREFIX: &str = "Bearer ";

pub fn bearer(token: &str) -> String {
    format!("{BEARER_PREFIX}{token}")
}

/// Returns the token carried by an `authorization` value, if it uses the
/// bearer scheme.
pub fn strip_bearer(value: &str) -> Option<&str> {
    value.strip_prefix(BEARER_PREFIX)
}

pub fn tokens_match(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}
