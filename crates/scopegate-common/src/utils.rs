//! Utility functions for Scopegate

use std::sync::LazyLock;

/// Service names double as storage namespaces (file names, column families)
static SERVICE_NAME_PATTERN: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new("^[a-zA-Z0-9_][a-zA-Z0-9_.-]{0,127}$").expect("Invalid regex pattern")
});

/// Validate a service name
///
/// Allowed characters: alphanumeric, underscore, dot, hyphen. The name must not
/// be empty, start with a dot, or exceed 128 characters.
///
/// # Examples
///
/// ```
/// use scopegate_common::is_valid_service_name;
///
/// assert!(is_valid_service_name("weather"));
/// assert!(is_valid_service_name("chat_gpt-v2.1"));
/// assert!(!is_valid_service_name("../etc"));
/// assert!(!is_valid_service_name(""));
/// ```
pub fn is_valid_service_name(name: &str) -> bool {
    SERVICE_NAME_PATTERN.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_service_names() {
        assert!(is_valid_service_name("weather"));
        assert!(is_valid_service_name("Weather2"));
        assert!(is_valid_service_name("_internal"));
        assert!(is_valid_service_name("music.netease-api"));
    }

    #[test]
    fn test_invalid_service_names() {
        assert!(!is_valid_service_name(""));
        assert!(!is_valid_service_name(".hidden"));
        assert!(!is_valid_service_name("with space"));
        assert!(!is_valid_service_name("a/b"));
        assert!(!is_valid_service_name("a\\b"));
        assert!(!is_valid_service_name(&"x".repeat(129)));
    }
}
