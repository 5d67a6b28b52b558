//! `sys_user` data model.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length of a user identifier.
pub const USER_ID_MAX: usize = 32;
/// Maximum length of a username.
pub const USERNAME_MAX: usize = 20;
/// Maximum length of an audit (operator) name.
pub const AUDIT_NAME_MAX: usize = 20;
/// Operator recorded when a request names none.
pub const SYSTEM_OPERATOR: &str = "system";

/// Validation errors returned by the `sys_user` newtypes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("user id must not be empty")]
    EmptyId,
    #[error("user id must be at most {max} characters")]
    IdTooLong { max: usize },
    #[error("user id may only contain ASCII letters and digits")]
    InvalidId,
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("username must be at most {max} characters")]
    UsernameTooLong { max: usize },
    #[error("username may only contain letters, numbers, or underscores")]
    UsernameInvalidCharacters,
    #[error("audit name must not be empty")]
    EmptyAuditName,
    #[error("audit name must be at most {max} characters")]
    AuditNameTooLong { max: usize },
}

impl UserValidationError {
    /// Machine-readable validation type used in error envelopes.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::EmptyId | Self::EmptyUsername | Self::EmptyAuditName => "string_too_short",
            Self::IdTooLong { .. } | Self::UsernameTooLong { .. } | Self::AuditNameTooLong { .. } => {
                "string_too_long"
            }
            Self::InvalidId | Self::UsernameInvalidCharacters => "string_pattern_mismatch",
        }
    }
}

/// Primary key of a `sys_user` row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`].
    pub fn new(id: impl Into<String>) -> Result<Self, UserValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.len() > USER_ID_MAX {
            return Err(UserValidationError::IdTooLong { max: USER_ID_MAX });
        }
        if !id.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(UserValidationError::InvalidId);
        }
        Ok(Self(id))
    }

    /// Generate a fresh identifier: a UUID v4 without hyphens.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

static USERNAME_RE: OnceLock<Regex> = OnceLock::new();

fn username_regex() -> &'static Regex {
    USERNAME_RE.get_or_init(|| {
        // Length is enforced separately; this regex constrains allowed characters.
        Regex::new(r"^[\p{L}\p{N}_]+$")
            .unwrap_or_else(|error| panic!("username regex failed to compile: {error}"))
    })
}

/// Login name; indexed but not unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    pub fn new(username: impl Into<String>) -> Result<Self, UserValidationError> {
        let username = username.into();
        if username.is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        if username.chars().count() > USERNAME_MAX {
            return Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        if !username_regex().is_match(&username) {
            return Err(UserValidationError::UsernameInvalidCharacters);
        }
        Ok(Self(username))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Name recorded in the `create_user` / `update_user` audit columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AuditName(String);

impl AuditName {
    pub fn new(name: impl Into<String>) -> Result<Self, UserValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(UserValidationError::EmptyAuditName);
        }
        if name.chars().count() > AUDIT_NAME_MAX {
            return Err(UserValidationError::AuditNameTooLong {
                max: AUDIT_NAME_MAX,
            });
        }
        Ok(Self(name))
    }

    /// Operator used when none is supplied.
    #[must_use]
    pub fn system() -> Self {
        Self(SYSTEM_OPERATOR.to_owned())
    }
}

impl AsRef<str> for AuditName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuditName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<AuditName> for String {
    fn from(value: AuditName) -> Self {
        value.0
    }
}

impl TryFrom<String> for AuditName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A row of the `sys_user` table.
///
/// ## Invariants
/// - `id` is 1-32 ASCII alphanumeric characters.
/// - `update_time` is never earlier than `create_time`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysUser {
    id: UserId,
    username: Username,
    create_user: AuditName,
    update_user: AuditName,
    create_time: DateTime<Utc>,
    update_time: DateTime<Utc>,
}

impl SysUser {
    /// Record a new user created by `operator` at `now`.
    pub fn create(id: UserId, username: Username, operator: AuditName, now: DateTime<Utc>) -> Self {
        Self {
            id,
            username,
            create_user: operator.clone(),
            update_user: operator,
            create_time: now,
            update_time: now,
        }
    }

    /// Rebuild a user from stored columns.
    pub fn restore(
        id: UserId,
        username: Username,
        audit: (AuditName, AuditName),
        create_time: DateTime<Utc>,
        update_time: DateTime<Utc>,
    ) -> Self {
        let (create_user, update_user) = audit;
        Self {
            id,
            username,
            create_user,
            update_user,
            create_time,
            update_time: update_time.max(create_time),
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn create_user(&self) -> &AuditName {
        &self.create_user
    }

    pub fn update_user(&self) -> &AuditName {
        &self.update_user
    }

    pub fn create_time(&self) -> DateTime<Utc> {
        self.create_time
    }

    pub fn update_time(&self) -> DateTime<Utc> {
        self.update_time
    }
}
