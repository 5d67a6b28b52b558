//! Deployment environment controlling error response verbosity.

use std::fmt;

/// Environment mode read from `ENVIRONMENT`.
///
/// Only the literal `dev` selects [`Environment::Development`]; every other
/// value is treated as production so a typo never leaks failure details.
///
/// # Examples
/// ```
/// use admin_backend::domain::Environment;
///
/// assert!(Environment::from_name("dev").is_dev());
/// assert!(!Environment::from_name("staging").is_dev());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    /// Raw failure details are surfaced to clients.
    Development,
    /// Clients only ever see generic messages for non-application failures.
    Production,
}

impl Environment {
    /// Name that selects development mode.
    pub const DEV_NAME: &'static str = "dev";

    /// Interpret an `ENVIRONMENT` value.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        if name.trim() == Self::DEV_NAME {
            Self::Development
        } else {
            Self::Production
        }
    }

    /// Whether raw failure details may be returned.
    #[must_use]
    pub const fn is_dev(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("dev"),
            Self::Production => f.write_str("prod"),
        }
    }
}
