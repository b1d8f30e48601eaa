//! Date and time helpers
//!
//! Branch-local calendar handling and the storage-day computation used
//! when a case is discharged.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const SECONDS_PER_DAY: i64 = 86_400;

/// Timezone wrapper for branch locations
///
/// Wraps chrono_tz::Tz with custom serialization support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone(pub Tz);

impl Serialize for Timezone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.name())
    }
}

impl<'de> Deserialize<'de> for Timezone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<Timezone>().map_err(serde::de::Error::custom)
    }
}

impl FromStr for Timezone {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tz::from_str(s.trim())
            .map(Timezone)
            .map_err(|_| TemporalError::InvalidTimezone(s.to_string()))
    }
}

impl fmt::Display for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.name())
    }
}

impl Timezone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    /// Converts a UTC datetime to the local timezone
    pub fn to_local(&self, utc: DateTime<Utc>) -> DateTime<Tz> {
        utc.with_timezone(&self.0)
    }

    /// The calendar date at the given instant in this timezone
    pub fn date_at(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.to_local(instant).date_naive()
    }

    /// Today's calendar date in this timezone
    pub fn today(&self) -> NaiveDate {
        self.date_at(Utc::now())
    }

    /// Gets the start of day (00:00:00) in this timezone as UTC
    pub fn start_of_day(&self, date: NaiveDate) -> Result<DateTime<Utc>, TemporalError> {
        date.and_hms_opt(0, 0, 0)
            .and_then(|naive| naive.and_local_timezone(self.0).earliest())
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(|| TemporalError::NonexistentLocalTime(date.to_string()))
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self(chrono_tz::Africa::Accra)
    }
}

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Local midnight does not exist on {0}")]
    NonexistentLocalTime(String),

    #[error("Invalid stay: release {released} precedes admission {admitted}")]
    ReleaseBeforeAdmission {
        admitted: String,
        released: String,
    },
}

/// Number of storage days between two calendar dates.
///
/// Both dates are taken at midnight UTC and the absolute difference is
/// rounded up to whole days, so the result is symmetric and zero for the
/// same date.
pub fn storage_days_between(admission: NaiveDate, discharge: NaiveDate) -> u32 {
    let start = admission.and_time(chrono::NaiveTime::MIN).and_utc();
    let end = discharge.and_time(chrono::NaiveTime::MIN).and_utc();
    let seconds = (end - start).num_seconds().abs();
    let days = (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY;
    u32::try_from(days).unwrap_or(u32::MAX)
}

/// The custody window of a case, from admission to (optional) release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayPeriod {
    pub admitted_on: NaiveDate,
    pub released_on: Option<NaiveDate>,
}

impl StayPeriod {
    /// An open stay, still in custody
    pub fn open(admitted_on: NaiveDate) -> Self {
        Self {
            admitted_on,
            released_on: None,
        }
    }

    /// A closed stay. Release may not precede admission.
    pub fn closed(admitted_on: NaiveDate, released_on: NaiveDate) -> Result<Self, TemporalError> {
        if released_on < admitted_on {
            return Err(TemporalError::ReleaseBeforeAdmission {
                admitted: admitted_on.to_string(),
                released: released_on.to_string(),
            });
        }
        Ok(Self {
            admitted_on,
            released_on: Some(released_on),
        })
    }

    pub fn is_open(&self) -> bool {
        self.released_on.is_none()
    }

    /// Storage days up to the release date, or up to `as_of` while open
    pub fn storage_days(&self, as_of: NaiveDate) -> u32 {
        storage_days_between(self.admitted_on, self.released_on.unwrap_or(as_of))
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn any_date() -> impl Strategy<Value = NaiveDate> {
        (0i64..40_000).prop_map(|offset| {
            NaiveDate::from_ymd_opt(1970, 1, 1).unwrap() + chrono::Duration::days(offset)
        })
    }

    proptest! {
        #[test]
        fn storage_days_are_symmetric(a in any_date(), b in any_date()) {
            prop_assert_eq!(storage_days_between(a, b), storage_days_between(b, a));
        }

        #[test]
        fn storage_days_equal_whole_day_difference(a in any_date(), b in any_date()) {
            let expected = (b - a).num_days().unsigned_abs() as u32;
            prop_assert_eq!(storage_days_between(a, b), expected);
        }

        #[test]
        fn storage_days_are_additive_forward(
            a in any_date(),
            gap1 in 0i64..500,
            gap2 in 0i64..500
        ) {
            let b = a + chrono::Duration::days(gap1);
            let c = b + chrono::Duration::days(gap2);
            prop_assert_eq!(
                storage_days_between(a, c),
                storage_days_between(a, b) + storage_days_between(b, c)
            );
        }
    }
}
