//! Typed environment-variable lookups

use std::str::FromStr;

/// Read `key` and parse it, falling back to `default` when the variable is
/// unset or does not parse.
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, "ignoring unparsable environment value");
                default
            },
        },
        Err(_) => default,
    }
}

/// Read `key` as a non-empty string.
pub fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read `key` as a boolean flag. Accepts `1/0`, `true/false`, `yes/no`, `on/off`.
pub fn env_flag(key: &str, default: bool) -> bool {
    match env_string(key).map(|v| v.to_ascii_lowercase()).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own variable name so parallel tests do not race.

    #[test]
    fn test_env_or_missing_uses_default() {
        assert_eq!(env_or("BRIEF_UTILS_TEST_MISSING_NUMBER", 7_usize), 7);
    }

    #[test]
    fn test_env_string_missing() {
        assert!(env_string("BRIEF_UTILS_TEST_MISSING_STRING").is_none());
    }

    #[test]
    fn test_env_flag_missing_uses_default() {
        assert!(env_flag("BRIEF_UTILS_TEST_MISSING_FLAG", true));
        assert!(!env_flag("BRIEF_UTILS_TEST_MISSING_FLAG", false));
    }
}
