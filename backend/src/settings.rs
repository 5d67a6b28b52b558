//! Environment-driven application settings.
//!
//! Every value is read once at startup through [`mockable::Env`] so parsing can
//! be tested in isolation. Debug builds fall back to defaults with a warning;
//! release builds reject missing `ENVIRONMENT` and any malformed value.

use std::net::SocketAddr;

use actix_web::http::header::HeaderName;
use chrono::format::{Item, StrftimeItems};
use mockable::Env;
use tracing::warn;

use crate::domain::timezone::{DEFAULT_DATETIME_FORMAT, DEFAULT_TIMEZONE};
use crate::domain::trace_id::{DEFAULT_TRACE_ID, DEFAULT_TRACE_ID_HEADER};
use crate::domain::{Environment, TimeZone};

pub(crate) const ENVIRONMENT_ENV: &str = "ENVIRONMENT";
pub(crate) const TRACE_HEADER_ENV: &str = "TRACE_ID_REQUEST_HEADER_KEY";
pub(crate) const TRACE_DEFAULT_ENV: &str = "LOG_CID_DEFAULT_VALUE";
pub(crate) const TIMEZONE_ENV: &str = "DATETIME_TIMEZONE";
pub(crate) const DATETIME_FORMAT_ENV: &str = "DATETIME_FORMAT";
pub(crate) const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub(crate) const BIND_ADDR_ENV: &str = "BIND_ADDR";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Build mode for settings validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate defaults and emit warnings for bad values.
    Debug,
    /// Release builds require explicit, valid values.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Errors raised while validating settings.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SettingsError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Where trace identifiers come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceSettings {
    /// Request header carrying the trace identifier; echoed on responses.
    pub header: HeaderName,
    /// Identifier used when the header is absent.
    pub default_value: String,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            header: HeaderName::from_static("x-request-id"),
            default_value: DEFAULT_TRACE_ID.to_owned(),
        }
    }
}

/// Process-wide configuration, read-only after startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub environment: Environment,
    pub trace: TraceSettings,
    pub timezone: TimeZone,
    /// PostgreSQL URL; `None` selects the in-memory repository.
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            trace: TraceSettings::default(),
            timezone: TimeZone::default(),
            database_url: None,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

impl Settings {
    /// Build settings from environment variables and build mode.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use admin_backend::settings::{BuildMode, Settings};
    /// use mockable::MockEnv;
    ///
    /// let mut env = MockEnv::new();
    /// env.expect_string().returning(|name| match name {
    ///     "ENVIRONMENT" => Some("prod".to_owned()),
    ///     "DATETIME_TIMEZONE" => Some("Europe/Paris".to_owned()),
    ///     _ => None,
    /// });
    ///
    /// let settings = Settings::from_env(&env, BuildMode::Release).expect("valid settings");
    /// assert!(!settings.environment.is_dev());
    /// assert_eq!(settings.trace.header.as_str(), "x-request-id");
    /// ```
    pub fn from_env<E: Env>(env: &E, mode: BuildMode) -> Result<Self, SettingsError> {
        let environment = environment_from_env(env, mode)?;
        let header = parse_or_default(
            env,
            mode,
            TRACE_HEADER_ENV,
            DEFAULT_TRACE_ID_HEADER,
            "a valid HTTP header name",
            |raw| HeaderName::from_bytes(raw.trim().as_bytes()).ok(),
        )?;
        let default_value = env
            .string(TRACE_DEFAULT_ENV)
            .unwrap_or_else(|| DEFAULT_TRACE_ID.to_owned());
        let format = parse_or_default(
            env,
            mode,
            DATETIME_FORMAT_ENV,
            DEFAULT_DATETIME_FORMAT,
            "a strftime format",
            |raw| is_valid_format(raw).then(|| raw.to_owned()),
        )?;
        let timezone = parse_or_default(
            env,
            mode,
            TIMEZONE_ENV,
            DEFAULT_TIMEZONE,
            "an IANA time zone name",
            |raw| TimeZone::from_name(raw).ok(),
        )?
        .with_format(format);
        let database_url = env
            .string(DATABASE_URL_ENV)
            .filter(|value| !value.trim().is_empty());
        let bind_addr = parse_or_default(
            env,
            mode,
            BIND_ADDR_ENV,
            DEFAULT_BIND_ADDR,
            "host:port",
            |raw| raw.trim().parse::<SocketAddr>().ok(),
        )?;

        Ok(Self {
            environment,
            trace: TraceSettings {
                header,
                default_value,
            },
            timezone,
            database_url,
            bind_addr,
        })
    }
}

fn is_valid_format(format: &str) -> bool {
    !format.trim().is_empty() && StrftimeItems::new(format).all(|item| item != Item::Error)
}

fn environment_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<Environment, SettingsError> {
    match env.string(ENVIRONMENT_ENV) {
        Some(value) => Ok(Environment::from_name(&value)),
        None if mode.is_debug() => {
            warn!("ENVIRONMENT not set; defaulting to dev");
            Ok(Environment::Development)
        }
        None => Err(SettingsError::MissingEnv {
            name: ENVIRONMENT_ENV,
        }),
    }
}

/// Parse an optional variable, falling back to `default` when unset.
///
/// Malformed values are rejected in release builds and replaced by the
/// default in debug builds.
fn parse_or_default<E, T, P>(
    env: &E,
    mode: BuildMode,
    name: &'static str,
    default: &'static str,
    expected: &'static str,
    parse: P,
) -> Result<T, SettingsError>
where
    E: Env,
    P: Fn(&str) -> Option<T>,
{
    let invalid_default = || SettingsError::InvalidEnv {
        name,
        value: default.to_owned(),
        expected,
    };
    let Some(value) = env.string(name) else {
        return parse(default).ok_or_else(invalid_default);
    };
    if let Some(parsed) = parse(&value) {
        return Ok(parsed);
    }
    if mode.is_debug() {
        warn!(variable = name, value = %value, "invalid setting; using default");
        return parse(default).ok_or_else(invalid_default);
    }
    Err(SettingsError::InvalidEnv {
        name,
        value,
        expected,
    })
}

#[cfg(test)]
mod tests;
