use subtle::ConstantTimeEq;

/// Constant-time string comparison for secrets such as API keys
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Check a request's API key against the configured one.
///
/// No configured key means the endpoint is open (local use).
pub fn verify_api_key(expected: Option<&str>, provided: Option<&str>) -> bool {
    match (expected, provided) {
        (None, _) => true,
        (Some(expected), Some(provided)) => constant_time_compare(expected, provided.trim()),
        (Some(_), None) => false,
    }
}
