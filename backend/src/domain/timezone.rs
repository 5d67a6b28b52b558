//! Timezone helper bound to the configured IANA zone.
//!
//! The zone and the default parse format come from `DATETIME_TIMEZONE` and
//! `DATETIME_FORMAT`. Reading the current time goes through a
//! [`mockable::Clock`] so callers can pin it in tests.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone as _, Utc};
use chrono_tz::Tz;
use mockable::{Clock, DefaultClock};

/// Zone used when none is configured.
pub const DEFAULT_TIMEZONE: &str = "Asia/Shanghai";
/// Format used by [`TimeZone::parse_default`] when none is configured.
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors raised while building zones or parsing datetimes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeZoneError {
    /// The zone name is not in the IANA database.
    #[error("unknown time zone: {name}")]
    UnknownZone { name: String },
    /// The input does not match the format.
    #[error("'{input}' does not match format '{format}': {reason}")]
    Malformed {
        input: String,
        format: String,
        reason: String,
    },
    /// The wall-clock time is skipped by a DST transition in this zone.
    #[error("{input} does not exist in time zone {zone}")]
    Nonexistent { input: String, zone: String },
}

/// Configured zone plus default parse format.
///
/// # Examples
/// ```
/// use admin_backend::domain::TimeZone;
///
/// let tz = TimeZone::from_name("Europe/London").expect("known zone");
/// let local = tz.parse_default("2024-11-22 00:10:22").expect("valid input");
/// assert_eq!(TimeZone::to_utc(&local).to_rfc3339(), "2024-11-22T00:10:22+00:00");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeZone {
    tz: Tz,
    format: String,
}

impl TimeZone {
    /// Wrap a zone with the default parse format.
    #[must_use]
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            format: DEFAULT_DATETIME_FORMAT.to_owned(),
        }
    }

    /// Look up a zone by IANA name.
    pub fn from_name(name: &str) -> Result<Self, TimeZoneError> {
        let tz = name
            .trim()
            .parse::<Tz>()
            .map_err(|_| TimeZoneError::UnknownZone {
                name: name.to_owned(),
            })?;
        Ok(Self::new(tz))
    }

    /// Replace the default parse format.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    /// Current time in the configured zone.
    pub fn now(&self) -> DateTime<Tz> {
        self.now_from(&DefaultClock)
    }

    /// Current time in the configured zone, read from `clock`.
    pub fn now_from<C: Clock + ?Sized>(&self, clock: &C) -> DateTime<Tz> {
        self.to_zone(&clock.utc())
    }

    /// Express `dt` in the configured zone. The instant is unchanged.
    pub fn to_zone<Z: chrono::TimeZone>(&self, dt: &DateTime<Z>) -> DateTime<Tz> {
        dt.with_timezone(&self.tz)
    }

    /// Parse a naive datetime with `format` and attach the configured zone.
    ///
    /// Ambiguous wall-clock times (DST fall-back) resolve to the earlier
    /// instant; skipped times are rejected.
    pub fn parse(&self, input: &str, format: &str) -> Result<DateTime<Tz>, TimeZoneError> {
        let naive = NaiveDateTime::parse_from_str(input, format).map_err(|error| {
            TimeZoneError::Malformed {
                input: input.to_owned(),
                format: format.to_owned(),
                reason: error.to_string(),
            }
        })?;
        self.localize(naive, input)
    }

    /// [`TimeZone::parse`] with the configured default format.
    pub fn parse_default(&self, input: &str) -> Result<DateTime<Tz>, TimeZoneError> {
        self.parse(input, &self.format)
    }

    fn localize(&self, naive: NaiveDateTime, input: &str) -> Result<DateTime<Tz>, TimeZoneError> {
        match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Ok(dt),
            LocalResult::None => Err(TimeZoneError::Nonexistent {
                input: input.to_owned(),
                zone: self.tz.name().to_owned(),
            }),
        }
    }

    /// Express `dt` in UTC.
    pub fn to_utc<Z: chrono::TimeZone>(dt: &DateTime<Z>) -> DateTime<Utc> {
        dt.with_timezone(&Utc)
    }
}

impl Default for TimeZone {
    fn default() -> Self {
        Self::new(chrono_tz::Asia::Shanghai)
    }
}
