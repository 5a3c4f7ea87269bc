//! Alarm entity, inputs and validation.
//!
//! # Responsibility
//! - Define the stored alarm shape (`Alarm`, `AlarmDraft`).
//! - Resolve create input defaults and partial update inputs.
//! - Validate `time`, `snooze_duration` and `repeat_days` before any write.
//!
//! # Invariants
//! - `time` is always the literal `HH:MM` string (24-hour, zero padded).
//! - `snooze_duration` is always within `[1, 60]` minutes.
//! - Every `repeat_days` element is within `[0, 6]` (0 = Sunday).
//! - `repeat_days` order and duplicates are preserved as given.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned identifier. Never reused after deletion.
pub type AlarmId = i64;

pub const DEFAULT_TITLE: &str = "Alarm";
pub const DEFAULT_SOUND: &str = "default";
pub const DEFAULT_SNOOZE_DURATION: u32 = 5;
pub const SNOOZE_DURATION_MIN: i64 = 1;
pub const SNOOZE_DURATION_MAX: i64 = 60;
/// Saturday; Sunday is `0`.
pub const MAX_REPEAT_DAY: i64 = 6;

static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").expect("valid time regex"));

/// Field constraint violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmValidationError {
    /// `time` was not supplied on create.
    MissingTime,
    /// `time` does not match `HH:MM`.
    InvalidTime(String),
    /// `snooze_duration` outside `[1, 60]`.
    SnoozeDurationOutOfRange(i64),
    /// A `repeat_days` element outside `[0, 6]`.
    RepeatDayOutOfRange(i64),
    /// Explicit `null` for a field that cannot be null.
    NullField(&'static str),
}

impl AlarmValidationError {
    /// Name of the offending field, for error details in transport layers.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingTime | Self::InvalidTime(_) => "time",
            Self::SnoozeDurationOutOfRange(_) => "snooze_duration",
            Self::RepeatDayOutOfRange(_) => "repeat_days",
            Self::NullField(field) => field,
        }
    }
}

impl Display for AlarmValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTime => write!(f, "time is required"),
            Self::InvalidTime(value) => {
                write!(f, "time `{value}` must use 24-hour HH:MM format")
            }
            Self::SnoozeDurationOutOfRange(value) => write!(
                f,
                "snooze_duration {value} must be between {SNOOZE_DURATION_MIN} and {SNOOZE_DURATION_MAX}"
            ),
            Self::RepeatDayOutOfRange(value) => {
                write!(f, "repeat day {value} must be between 0 and {MAX_REPEAT_DAY}")
            }
            Self::NullField(field) => write!(f, "{field} cannot be null"),
        }
    }
}

impl Error for AlarmValidationError {}

/// Checks a time-of-day string against the canonical `HH:MM` form.
pub fn validate_time(value: &str) -> Result<(), AlarmValidationError> {
    if TIME_RE.is_match(value) {
        Ok(())
    } else {
        Err(AlarmValidationError::InvalidTime(value.to_string()))
    }
}

/// Checks snooze minutes and narrows them to the stored width.
pub fn validate_snooze_duration(value: i64) -> Result<u32, AlarmValidationError> {
    if !(SNOOZE_DURATION_MIN..=SNOOZE_DURATION_MAX).contains(&value) {
        return Err(AlarmValidationError::SnoozeDurationOutOfRange(value));
    }
    u32::try_from(value).map_err(|_| AlarmValidationError::SnoozeDurationOutOfRange(value))
}

/// Checks every weekday index, keeping order and duplicates.
pub fn validate_repeat_days(days: &[i64]) -> Result<Vec<u8>, AlarmValidationError> {
    days.iter()
        .map(|&day| {
            if (0..=MAX_REPEAT_DAY).contains(&day) {
                u8::try_from(day).map_err(|_| AlarmValidationError::RepeatDayOutOfRange(day))
            } else {
                Err(AlarmValidationError::RepeatDayOutOfRange(day))
            }
        })
        .collect()
}

/// Every alarm field except the identifier, fully resolved.
///
/// This is the unit the store persists on create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmDraft {
    pub title: String,
    /// Literal `HH:MM` string.
    pub time: String,
    pub enabled: bool,
    /// Weekday indexes, 0 = Sunday. Empty means a one-time alarm.
    pub repeat_days: Vec<u8>,
    pub sound: String,
    pub snooze_enabled: bool,
    /// Minutes.
    pub snooze_duration: u32,
    pub vibrate: bool,
}

impl AlarmDraft {
    /// Creates a draft for `time` with every other field at its default.
    pub fn new(time: impl Into<String>) -> Result<Self, AlarmValidationError> {
        let draft = Self {
            title: DEFAULT_TITLE.to_string(),
            time: time.into(),
            enabled: true,
            repeat_days: Vec::new(),
            sound: DEFAULT_SOUND.to_string(),
            snooze_enabled: true,
            snooze_duration: DEFAULT_SNOOZE_DURATION,
            vibrate: true,
        };
        draft.validate()?;
        Ok(draft)
    }

    /// Re-checks stored invariants.
    ///
    /// Fields are public, so stores call this before every write and after
    /// every read.
    pub fn validate(&self) -> Result<(), AlarmValidationError> {
        validate_time(&self.time)?;
        validate_snooze_duration(i64::from(self.snooze_duration))?;
        if let Some(&day) = self
            .repeat_days
            .iter()
            .find(|&&day| i64::from(day) > MAX_REPEAT_DAY)
        {
            return Err(AlarmValidationError::RepeatDayOutOfRange(i64::from(day)));
        }
        Ok(())
    }
}

/// Persisted alarm snapshot.
///
/// Returned by value from every store and service operation; callers never
/// hold a reference into the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    pub id: AlarmId,
    pub title: String,
    pub time: String,
    pub enabled: bool,
    pub repeat_days: Vec<u8>,
    pub sound: String,
    pub snooze_enabled: bool,
    pub snooze_duration: u32,
    pub vibrate: bool,
}

impl Alarm {
    /// Attaches a store-assigned id to a draft.
    pub fn from_draft(id: AlarmId, draft: AlarmDraft) -> Self {
        Self {
            id,
            title: draft.title,
            time: draft.time,
            enabled: draft.enabled,
            repeat_days: draft.repeat_days,
            sound: draft.sound,
            snooze_enabled: draft.snooze_enabled,
            snooze_duration: draft.snooze_duration,
            vibrate: draft.vibrate,
        }
    }

    /// Copies every field except `id`.
    pub fn to_draft(&self) -> AlarmDraft {
        AlarmDraft {
            title: self.title.clone(),
            time: self.time.clone(),
            enabled: self.enabled,
            repeat_days: self.repeat_days.clone(),
            sound: self.sound.clone(),
            snooze_enabled: self.snooze_enabled,
            snooze_duration: self.snooze_duration,
            vibrate: self.vibrate,
        }
    }

    /// Returns whether the alarm fires once instead of on a weekly schedule.
    pub fn is_one_time(&self) -> bool {
        self.repeat_days.is_empty()
    }
}

/// Create request. Omitted fields take their documented defaults.
///
/// `time` is optional here only so that its absence is reported as a
/// validation error rather than a decode failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmCreateInput {
    pub title: Option<String>,
    pub time: Option<String>,
    pub enabled: Option<bool>,
    pub repeat_days: Option<Vec<i64>>,
    pub sound: Option<String>,
    pub snooze_enabled: Option<bool>,
    pub snooze_duration: Option<i64>,
    pub vibrate: Option<bool>,
}

impl AlarmCreateInput {
    /// Create input with only `time` set.
    pub fn at(time: impl Into<String>) -> Self {
        Self {
            time: Some(time.into()),
            ..Self::default()
        }
    }

    /// Validates supplied fields and fills in defaults.
    pub fn into_draft(self) -> Result<AlarmDraft, AlarmValidationError> {
        let time = self.time.ok_or(AlarmValidationError::MissingTime)?;
        validate_time(&time)?;

        let snooze_duration = match self.snooze_duration {
            Some(value) => validate_snooze_duration(value)?,
            None => DEFAULT_SNOOZE_DURATION,
        };
        let repeat_days = match self.repeat_days {
            Some(days) => validate_repeat_days(&days)?,
            None => Vec::new(),
        };

        Ok(AlarmDraft {
            title: self.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            time,
            enabled: self.enabled.unwrap_or(true),
            repeat_days,
            sound: self.sound.unwrap_or_else(|| DEFAULT_SOUND.to_string()),
            snooze_enabled: self.snooze_enabled.unwrap_or(true),
            snooze_duration,
            vibrate: self.vibrate.unwrap_or(true),
        })
    }
}

/// Tri-state field of a partial update.
///
/// Distinguishes a key that was left out (`Absent`) from one explicitly sent
/// as `null` (`Null`). Use with `#[serde(default)]` so missing keys decode to
/// `Absent`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// `Absent -> None`, `Value -> Some`, `Null -> error` for non-nullable
    /// fields.
    fn require(self, field: &'static str) -> Result<Option<T>, AlarmValidationError> {
        match self {
            Self::Absent => Ok(None),
            Self::Null => Err(AlarmValidationError::NullField(field)),
            Self::Value(value) => Ok(Some(value)),
        }
    }
}

impl<T> From<T> for Patch<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(value) => Self::Value(value),
            None => Self::Null,
        })
    }
}

/// Partial update request. Only fields that are not `Absent` change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AlarmUpdateInput {
    pub title: Patch<String>,
    pub time: Patch<String>,
    pub enabled: Patch<bool>,
    pub repeat_days: Patch<Vec<i64>>,
    pub sound: Patch<String>,
    pub snooze_enabled: Patch<bool>,
    pub snooze_duration: Patch<i64>,
    pub vibrate: Patch<bool>,
}

impl AlarmUpdateInput {
    /// Returns whether no field was supplied.
    pub fn is_empty(&self) -> bool {
        self.title.is_absent()
            && self.time.is_absent()
            && self.enabled.is_absent()
            && self.repeat_days.is_absent()
            && self.sound.is_absent()
            && self.snooze_enabled.is_absent()
            && self.snooze_duration.is_absent()
            && self.vibrate.is_absent()
    }

    /// Validates every supplied field without touching storage.
    pub fn validate(self) -> Result<AlarmChanges, AlarmValidationError> {
        let time = self.time.require("time")?;
        if let Some(time) = &time {
            validate_time(time)?;
        }
        let snooze_duration = self
            .snooze_duration
            .require("snooze_duration")?
            .map(validate_snooze_duration)
            .transpose()?;
        let repeat_days = self
            .repeat_days
            .require("repeat_days")?
            .map(|days| validate_repeat_days(&days))
            .transpose()?;

        Ok(AlarmChanges {
            title: self.title.require("title")?,
            time,
            enabled: self.enabled.require("enabled")?,
            repeat_days,
            sound: self.sound.require("sound")?,
            snooze_enabled: self.snooze_enabled.require("snooze_enabled")?,
            snooze_duration,
            vibrate: self.vibrate.require("vibrate")?,
        })
    }
}

/// Validated partial update; `None` means "leave untouched".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlarmChanges {
    pub title: Option<String>,
    pub time: Option<String>,
    pub enabled: Option<bool>,
    pub repeat_days: Option<Vec<u8>>,
    pub sound: Option<String>,
    pub snooze_enabled: Option<bool>,
    pub snooze_duration: Option<u32>,
    pub vibrate: Option<bool>,
}

impl AlarmChanges {
    /// Overwrites only the supplied fields of `draft`.
    pub fn apply_to(self, draft: &mut AlarmDraft) {
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(time) = self.time {
            draft.time = time;
        }
        if let Some(enabled) = self.enabled {
            draft.enabled = enabled;
        }
        if let Some(repeat_days) = self.repeat_days {
            draft.repeat_days = repeat_days;
        }
        if let Some(sound) = self.sound {
            draft.sound = sound;
        }
        if let Some(snooze_enabled) = self.snooze_enabled {
            draft.snooze_enabled = snooze_enabled;
        }
        if let Some(snooze_duration) = self.snooze_duration {
            draft.snooze_duration = snooze_duration;
        }
        if let Some(vibrate) = self.vibrate {
            draft.vibrate = vibrate;
        }
    }
}
