use std::env;

use time::macros::format_description;
use time::UtcOffset;

use super::types::{ConfigError, Environment};

pub(super) fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

pub(super) fn env_or_default(key: &str, default: &str) -> String {
    env_optional(key).unwrap_or_else(|| default.to_string())
}

pub(super) fn parse_u16(field: &'static str, value: String) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidValue { field, value })
}

pub(super) fn parse_u32(field: &'static str, value: String) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidValue { field, value })
}

pub(super) fn parse_usize(field: &'static str, value: String) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidValue { field, value })
}

/// Accepts `+07:00`, `-05:30`, `+07`, `Z` and `UTC`.
pub(super) fn parse_utc_offset(field: &'static str, value: String) -> Result<UtcOffset, ConfigError> {
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return Ok(UtcOffset::UTC);
    }

    let with_minutes = format_description!("[offset_hour sign:mandatory]:[offset_minute]");
    let hours_only = format_description!("[offset_hour sign:mandatory]");
    UtcOffset::parse(&value, with_minutes)
        .or_else(|_| UtcOffset::parse(&value, hours_only))
        .map_err(|_| ConfigError::InvalidValue { field, value })
}

pub(super) fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES" | "on" | "ON")
}

pub(super) fn parse_environment(value: Option<String>) -> Environment {
    match value.as_deref().map(|item| item.to_lowercase()) {
        Some(ref val) if val == "production" || val == "prod" => Environment::Production,
        Some(ref val) if val == "staging" => Environment::Staging,
        Some(ref val) if val == "test" || val == "testing" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
mod tests {
    use time::macros::offset;

    use super::*;

    #[test]
    fn parse_bool_variants() {
        assert!(parse_bool("1"));
        assert!(parse_bool("true"));
        assert!(parse_bool("TRUE"));
        assert!(parse_bool("yes"));
        assert!(parse_bool("on"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("0"));
    }

    #[test]
    fn parse_environment_variants() {
        assert_eq!(parse_environment(Some("prod".to_string())), Environment::Production);
        assert_eq!(parse_environment(Some("production".to_string())), Environment::Production);
        assert_eq!(parse_environment(Some("staging".to_string())), Environment::Staging);
        assert_eq!(parse_environment(Some("testing".to_string())), Environment::Test);
        assert_eq!(parse_environment(None), Environment::Development);
    }

    #[test]
    fn parse_utc_offset_variants() {
        let parse = |raw: &str| parse_utc_offset("GRADEBOOK_IMPORT_UTC_OFFSET", raw.to_string());

        assert_eq!(parse("+07:00").unwrap(), offset!(+7));
        assert_eq!(parse("-05:30").unwrap(), offset!(-5:30));
        assert_eq!(parse("+07").unwrap(), offset!(+7));
        assert_eq!(parse("UTC").unwrap(), UtcOffset::UTC);
        assert_eq!(parse("z").unwrap(), UtcOffset::UTC);
        assert!(matches!(parse("seven"), Err(ConfigError::InvalidValue { .. })));
        assert!(parse("07:00").is_err());
    }

    #[test]
    fn parse_numbers_report_field() {
        let err = parse_u32("GRADEBOOK_DB_MAX_CONNECTIONS", "many".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "invalid value for GRADEBOOK_DB_MAX_CONNECTIONS: many");
        assert_eq!(parse_usize("GRADEBOOK_IMPORT_MAX_BYTES", "1024".to_string()).unwrap(), 1024);
    }
}
