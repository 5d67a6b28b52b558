//! Unit tests for settings parsing.

use super::*;
use mockable::MockEnv;
use rstest::rstest;
use std::collections::HashMap;

fn mock_env(vars: &[(&str, &str)]) -> MockEnv {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

fn expect_error(result: Result<Settings, SettingsError>, label: &str) -> SettingsError {
    match result {
        Ok(_) => panic!("{label}"),
        Err(error) => error,
    }
}

#[rstest]
fn debug_defaults_apply_when_unset() {
    let settings = Settings::from_env(&mock_env(&[]), BuildMode::Debug).expect("defaults");
    assert_eq!(settings.environment, Environment::Development);
    assert_eq!(settings.trace, TraceSettings::default());
    assert_eq!(settings.timezone, TimeZone::default());
    assert_eq!(settings.timezone.format(), DEFAULT_DATETIME_FORMAT);
    assert_eq!(settings.database_url, None);
    assert_eq!(settings.bind_addr.to_string(), DEFAULT_BIND_ADDR);
}

#[rstest]
fn release_requires_environment() {
    let err = expect_error(
        Settings::from_env(&mock_env(&[]), BuildMode::Release),
        "expected missing ENVIRONMENT to fail",
    );
    assert_eq!(
        err,
        SettingsError::MissingEnv {
            name: ENVIRONMENT_ENV
        }
    );
}

#[rstest]
#[case("dev", Environment::Development)]
#[case("prod", Environment::Production)]
#[case("Dev", Environment::Production)]
#[case("", Environment::Production)]
fn environment_only_dev_is_verbose(#[case] raw: &str, #[case] expected: Environment) {
    let env = mock_env(&[(ENVIRONMENT_ENV, raw)]);
    let settings = Settings::from_env(&env, BuildMode::Release).expect("valid settings");
    assert_eq!(settings.environment, expected);
}

#[rstest]
fn explicit_values_are_used() {
    let env = mock_env(&[
        (ENVIRONMENT_ENV, "prod"),
        (TRACE_HEADER_ENV, "X-Trace"),
        (TRACE_DEFAULT_ENV, "none"),
        (TIMEZONE_ENV, "America/New_York"),
        (DATETIME_FORMAT_ENV, "%d/%m/%Y %H:%M"),
        (DATABASE_URL_ENV, "postgres://localhost/admin"),
        (BIND_ADDR_ENV, "127.0.0.1:9000"),
    ]);
    let settings = Settings::from_env(&env, BuildMode::Release).expect("valid settings");
    assert_eq!(settings.trace.header.as_str(), "x-trace");
    assert_eq!(settings.trace.default_value, "none");
    assert_eq!(settings.timezone.tz(), chrono_tz::America::New_York);
    assert_eq!(settings.timezone.format(), "%d/%m/%Y %H:%M");
    assert_eq!(
        settings.database_url.as_deref(),
        Some("postgres://localhost/admin")
    );
    assert_eq!(settings.bind_addr.port(), 9000);
}

#[rstest]
#[case(TIMEZONE_ENV, "Mars/Base")]
#[case(TRACE_HEADER_ENV, "bad header")]
#[case(BIND_ADDR_ENV, "localhost")]
#[case(DATETIME_FORMAT_ENV, "%Y-%Q")]
fn release_rejects_malformed_values(#[case] name: &'static str, #[case] value: &str) {
    let env = mock_env(&[(ENVIRONMENT_ENV, "prod"), (name, value)]);
    let err = expect_error(
        Settings::from_env(&env, BuildMode::Release),
        "expected malformed value to fail",
    );
    assert!(matches!(err, SettingsError::InvalidEnv { name: n, .. } if n == name));
}

#[rstest]
#[case(TIMEZONE_ENV, "Mars/Base")]
#[case(TRACE_HEADER_ENV, "bad header")]
#[case(BIND_ADDR_ENV, "localhost")]
#[case(DATETIME_FORMAT_ENV, "%Y-%Q")]
fn debug_replaces_malformed_values_with_defaults(#[case] name: &str, #[case] value: &str) {
    let env = mock_env(&[(name, value)]);
    let settings = Settings::from_env(&env, BuildMode::Debug).expect("defaults applied");
    let defaults = Settings::default();
    assert_eq!(settings.timezone, defaults.timezone);
    assert_eq!(settings.trace, defaults.trace);
    assert_eq!(settings.bind_addr, defaults.bind_addr);
}

#[rstest]
fn blank_database_url_selects_fixture_repository() {
    let env = mock_env(&[(DATABASE_URL_ENV, "  ")]);
    let settings = Settings::from_env(&env, BuildMode::Debug).expect("valid settings");
    assert!(settings.database_url.is_none());
}
