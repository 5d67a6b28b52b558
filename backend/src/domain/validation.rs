//! Request validation failures and their client-facing messages.
//!
//! Each [`ValidationError`] mirrors one failed constraint: a machine-readable
//! `type`, the location of the offending value, a message, the raw input and
//! an optional context map used to fill message placeholders.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Environment;

/// Error type emitted when a JSON body cannot be parsed at all.
pub const JSON_INVALID: &str = "json_invalid";

const MESSAGE_PREFIX: &str = "Invalid request parameters";
const JSON_INVALID_MESSAGE: &str = "JSON parsing failed";
const EMPTY_ERRORS_MESSAGE: &str = "request validation failed";

/// One segment of an error location, e.g. `["body", "username"]` or
/// `["body", "tags", 2]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocSegment {
    Index(usize),
    Field(String),
}

impl std::fmt::Display for LocSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Field(name) => f.write_str(name),
        }
    }
}

impl From<&str> for LocSegment {
    fn from(value: &str) -> Self {
        Self::Field(value.to_owned())
    }
}

impl From<String> for LocSegment {
    fn from(value: String) -> Self {
        Self::Field(value)
    }
}

impl From<usize> for LocSegment {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

/// A single failed validation constraint.
///
/// # Examples
/// ```
/// use admin_backend::domain::ValidationError;
/// use serde_json::json;
///
/// let error = ValidationError::new("missing", ["body", "username"], "Field required", json!({}));
/// assert_eq!(error.field(), Some("username".to_owned()));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    #[serde(rename = "type")]
    pub kind: String,
    pub loc: Vec<LocSegment>,
    pub msg: String,
    pub input: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctx: Option<Map<String, Value>>,
}

impl ValidationError {
    pub fn new<L, S>(kind: impl Into<String>, loc: L, msg: impl Into<String>, input: Value) -> Self
    where
        L: IntoIterator<Item = S>,
        S: Into<LocSegment>,
    {
        Self {
            kind: kind.into(),
            loc: loc.into_iter().map(Into::into).collect(),
            msg: msg.into(),
            input,
            ctx: None,
        }
    }

    /// Attach a context value used to format the message template.
    #[must_use]
    pub fn with_ctx(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ctx
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Last location segment, which names the offending field.
    pub fn field(&self) -> Option<String> {
        self.loc.last().map(ToString::to_string)
    }

    /// Replace the message with the configured text for this error type.
    ///
    /// Without context the template is used verbatim; with context its
    /// `{name}` placeholders are filled. A context `error` entry is normalised
    /// to use double quotes. Unmapped types keep their original message.
    #[must_use]
    pub fn localized(mut self) -> Self {
        let Some(template) = custom_validation_message(&self.kind) else {
            return self;
        };
        match self.ctx.as_mut().filter(|ctx| !ctx.is_empty()) {
            None => self.msg = template.to_owned(),
            Some(ctx) => {
                self.msg = format_template(template, ctx);
                if let Some(error) = ctx.get_mut("error") {
                    *error = match error {
                        Value::String(text) => Value::String(text.replace('\'', "\"")),
                        _ => Value::Null,
                    };
                }
            }
        }
        self
    }
}

/// Custom message table keyed by validation error type.
///
/// Returns `None` for types without a custom message; callers keep the
/// original message in that case.
#[must_use]
pub fn custom_validation_message(kind: &str) -> Option<&'static str> {
    let message = match kind {
        "missing" => "field required",
        "extra_forbidden" => "extra fields are not permitted",
        "invalid_type" => "has an invalid type, {error}",
        "json_invalid" => "invalid JSON, {error}",
        "value_error" => "has an invalid value, {error}",
        "string_type" => "must be a string",
        "string_too_short" => "must be at least {min_length} characters",
        "string_too_long" => "must be at most {max_length} characters",
        "string_pattern_mismatch" => "must match the pattern '{pattern}'",
        "int_parsing" => "must be a valid integer",
        "bool_parsing" => "must be a valid boolean",
        "datetime_parsing" => "must be a datetime in the format '{format}', {error}",
        "datetime_nonexistent" => "does not exist in time zone {timezone}",
        _ => return None,
    };
    Some(message)
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER_RE.get_or_init(|| {
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}")
            .unwrap_or_else(|error| panic!("placeholder regex failed to compile: {error}"))
    })
}

/// Fill `{name}` placeholders from `ctx`; unknown names are left untouched.
#[must_use]
pub fn format_template(template: &str, ctx: &Map<String, Value>) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &Captures<'_>| {
            let whole = caps.get(0).map_or("", |m| m.as_str());
            caps.get(1)
                .and_then(|name| ctx.get(name.as_str()))
                .map_or_else(|| whole.to_owned(), display_value)
        })
        .into_owned()
}

/// Render a JSON value the way it appears inside a message.
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Client-facing summary built from the first error.
///
/// Development mode names the field and echoes the input; production mode
/// only exposes the (possibly localised) message.
#[must_use]
pub fn summarize(errors: &[ValidationError], environment: Environment) -> String {
    let message = match errors.first() {
        None => EMPTY_ERRORS_MESSAGE.to_owned(),
        Some(error) if error.kind == JSON_INVALID => JSON_INVALID_MESSAGE.to_owned(),
        Some(error) if environment.is_dev() => format!(
            "{} {}, input: {}",
            error.field().unwrap_or_default(),
            error.msg,
            display_value(&error.input)
        ),
        Some(error) => error.msg.clone(),
    };
    format!("{MESSAGE_PREFIX}: {message}")
}
