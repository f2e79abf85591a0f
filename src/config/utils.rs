use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Read an environment variable, treating unset and blank values alike.
///
/// Surrounding whitespace is trimmed so that `KEY= value ` in a `.env`
/// file behaves like `KEY=value`.
pub(super) fn env_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Read and parse an environment variable.
///
/// Returns `Ok(None)` when the variable is unset or blank, and an error naming
/// the variable when the value does not parse.
pub(super) fn parse_env<T>(name: &str) -> Result<Option<T>, Box<dyn std::error::Error>>
where
    T: FromStr,
    T::Err: Display,
{
    match env_var(name) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid value for {name} ('{raw}'): {e}").into()),
        None => Ok(None),
    }
}

/// Parse a boolean flag the way operators usually write them.
pub(super) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean environment variable.
pub(super) fn env_bool(name: &str) -> Result<Option<bool>, Box<dyn std::error::Error>> {
    match env_var(name) {
        Some(raw) => parse_bool(&raw)
            .map(Some)
            .ok_or_else(|| format!("Invalid boolean for {name}: '{raw}'").into()),
        None => Ok(None),
    }
}

/// Treat empty strings from YAML as absent.
pub(super) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" yes "), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("alloy".to_string())), Some("alloy".to_string()));
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(None), None);
    }

    #[test]
    #[serial]
    fn test_env_var_blank_is_unset() {
        unsafe {
            env::set_var("RELAY_TEST_BLANK", "   ");
        }
        assert_eq!(env_var("RELAY_TEST_BLANK"), None);
        unsafe {
            env::remove_var("RELAY_TEST_BLANK");
        }
    }

    #[test]
    #[serial]
    fn test_parse_env() {
        unsafe {
            env::set_var("RELAY_TEST_PORT", "8080");
        }
        assert_eq!(parse_env::<u16>("RELAY_TEST_PORT").unwrap(), Some(8080));

        unsafe {
            env::set_var("RELAY_TEST_PORT", "eighty");
        }
        let err = parse_env::<u16>("RELAY_TEST_PORT").unwrap_err();
        assert!(err.to_string().contains("RELAY_TEST_PORT"));

        unsafe {
            env::remove_var("RELAY_TEST_PORT");
        }
        assert_eq!(parse_env::<u16>("RELAY_TEST_PORT").unwrap(), None);
    }

    #[test]
    #[serial]
    fn test_env_bool() {
        unsafe {
            env::set_var("RELAY_TEST_FLAG", "on");
        }
        assert_eq!(env_bool("RELAY_TEST_FLAG").unwrap(), Some(true));

        unsafe {
            env::set_var("RELAY_TEST_FLAG", "sometimes");
        }
        assert!(env_bool("RELAY_TEST_FLAG").is_err());

        unsafe {
            env::remove_var("RELAY_TEST_FLAG");
        }
    }
}
