//! Durations in the form used by the entity/parameter-value store (e.g. `"1h"`, `"15m"`, `"1D"`).
use anyhow::{Context, Result, bail, ensure};
use chrono::TimeDelta;
use std::fmt;
use std::str::FromStr;

/// The unit of a [`Duration`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DurationUnit {
    /// Seconds (`s`)
    Second,
    /// Minutes (`m`)
    Minute,
    /// Hours (`h`)
    Hour,
    /// Days (`D`)
    Day,
    /// Calendar months (`M`)
    Month,
    /// Calendar years (`Y`)
    Year,
}

impl DurationUnit {
    /// The single-letter symbol used when writing durations
    fn symbol(self) -> &'static str {
        match self {
            Self::Second => "s",
            Self::Minute => "m",
            Self::Hour => "h",
            Self::Day => "D",
            Self::Month => "M",
            Self::Year => "Y",
        }
    }

    /// Parse a unit from either its symbol (case-sensitive) or its name (case-insensitive)
    fn parse(s: &str) -> Option<Self> {
        let unit = match s {
            "s" => Self::Second,
            "m" => Self::Minute,
            "h" => Self::Hour,
            "D" => Self::Day,
            "M" => Self::Month,
            "Y" => Self::Year,
            _ => match s.to_lowercase().trim_end_matches('s') {
                "second" => Self::Second,
                "minute" => Self::Minute,
                "hour" => Self::Hour,
                "day" => Self::Day,
                "month" => Self::Month,
                "year" => Self::Year,
                _ => return None,
            },
        };
        Some(unit)
    }

    /// Length of the unit in seconds, if fixed
    fn seconds(self) -> Option<i64> {
        match self {
            Self::Second => Some(1),
            Self::Minute => Some(60),
            Self::Hour => Some(3600),
            Self::Day => Some(86_400),
            Self::Month | Self::Year => None,
        }
    }
}

/// A length of time, such as the resolution of a time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Duration {
    /// Number of `unit`s
    pub amount: i64,
    /// The unit of time
    pub unit: DurationUnit,
}

impl Duration {
    /// Create a new [`Duration`]
    pub fn new(amount: i64, unit: DurationUnit) -> Self {
        Self { amount, unit }
    }

    /// A duration of the given number of hours
    pub fn hours(amount: i64) -> Self {
        Self::new(amount, DurationUnit::Hour)
    }

    /// The length of the duration as a [`TimeDelta`].
    ///
    /// Months and years have no fixed length, so they give `None`.
    pub fn to_time_delta(self) -> Option<TimeDelta> {
        let seconds = self.unit.seconds()?;
        TimeDelta::try_seconds(self.amount.checked_mul(seconds)?)
    }

    /// The length of the duration in hours, if it has a fixed length
    pub fn to_hours(self) -> Option<f64> {
        self.to_time_delta()
            .map(|delta| delta.num_seconds() as f64 / 3600.0)
    }

    /// Express a [`TimeDelta`] in the largest unit which divides it exactly
    pub fn from_time_delta(delta: TimeDelta) -> Result<Self> {
        ensure!(
            delta.subsec_nanos() == 0,
            "Durations shorter than one second are not supported"
        );
        let seconds = delta.num_seconds();
        let unit = [DurationUnit::Day, DurationUnit::Hour, DurationUnit::Minute]
            .into_iter()
            .find(|unit| unit.seconds().is_some_and(|s| seconds % s == 0))
            .unwrap_or(DurationUnit::Second);
        let amount = seconds / unit.seconds().unwrap_or(1);

        Ok(Self::new(amount, unit))
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.symbol())
    }
}

impl FromStr for Duration {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '-'))
            .with_context(|| format!("Duration '{s}' has no unit"))?;
        let (amount, unit) = s.split_at(split);
        let amount = amount
            .parse()
            .with_context(|| format!("Invalid duration: '{s}'"))?;
        let Some(unit) = DurationUnit::parse(unit.trim()) else {
            bail!("Invalid duration unit in '{s}'");
        };

        Ok(Self::new(amount, unit))
    }
}
