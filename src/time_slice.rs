//! Code for mapping timeslices onto timestamps.
//!
//! OSeMOSYS divides each year into timeslices, whereas INES uses time series indexed by
//! timestamps. A [`TimeSliceMapping`] assigns a timeslice to each timestamp of a representative
//! period so that per-timeslice data can be written out as time series.
use crate::id::define_id_type;
use crate::input::{input_err_msg, read_csv};
use crate::value::{Duration, ParameterValue, parse_datetime};
use anyhow::{Context, Result, bail, ensure};
use chrono::NaiveDateTime;
use itertools::Itertools;
use serde::Deserialize;
use std::path::Path;

define_id_type! {TimeSliceID}

const VARIABLE_RESOLUTION_MSG: &str = "Variable time resolution not supported, please make a \
     timeslice to datetime mapping with only one time resolution (use the lowest common \
     denominator)";

/// A row of a timeslice mapping CSV file
#[derive(Debug, Deserialize)]
struct TimeSliceRow {
    datetime: String,
    timeslice: String,
}

/// Timestamps and the timeslice each one belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSliceMapping {
    /// Timestamps, in increasing order
    pub timestamps: Vec<NaiveDateTime>,
    /// The timeslice of each timestamp
    pub time_slices: Vec<TimeSliceID>,
    /// The length of each step
    pub resolution: Duration,
}

impl TimeSliceMapping {
    /// Read a mapping from a `timeslices_to_time` value.
    ///
    /// The value is a map of timestamps to one-entry maps of timeslice name to step duration.
    pub fn from_value(value: &ParameterValue) -> Result<Self> {
        let map = value
            .as_map()
            .context("timeslices_to_time must be a map of timestamps")?;
        ensure!(!map.is_empty(), "Empty timeslice to datetime mapping");

        let mut timestamps = Vec::with_capacity(map.len());
        let mut time_slices = Vec::with_capacity(map.len());
        let mut resolutions = Vec::with_capacity(map.len());
        for (timestamp, inner) in &map.entries {
            timestamps.push(parse_datetime(&timestamp.to_string())?);
            let (time_slice, duration) = inner
                .as_map()
                .and_then(|inner| inner.entries.first())
                .with_context(|| format!("No timeslice given for {timestamp}"))?;
            time_slices.push(TimeSliceID::from(time_slice.to_string()));
            resolutions.push(read_duration(duration)?);
        }

        // Compare lengths where they are fixed, so that e.g. 1h and 60m match
        ensure!(
            resolutions
                .iter()
                .map(|duration| duration.to_time_delta().ok_or(*duration))
                .all_equal(),
            VARIABLE_RESOLUTION_MSG
        );
        Self::new(timestamps, time_slices, resolutions[0])
    }

    /// Read a mapping from a CSV file with `datetime` and `timeslice` columns.
    ///
    /// The resolution is the step between consecutive rows, which must be uniform.
    pub fn from_csv(file_path: &Path) -> Result<Self> {
        let rows: Vec<TimeSliceRow> = read_csv(file_path)?;
        Self::from_rows(rows).with_context(|| input_err_msg(file_path))
    }

    fn from_rows(rows: Vec<TimeSliceRow>) -> Result<Self> {
        ensure!(
            rows.len() > 1,
            "Cannot determine the time resolution from a single row"
        );

        let mut timestamps = Vec::with_capacity(rows.len());
        let mut time_slices = Vec::with_capacity(rows.len());
        for row in rows {
            timestamps.push(parse_datetime(&row.datetime)?);
            time_slices.push(TimeSliceID::from(row.timeslice));
        }

        let steps: Vec<_> = timestamps.windows(2).map(|w| w[1] - w[0]).collect();
        ensure!(steps.iter().all_equal(), VARIABLE_RESOLUTION_MSG);
        let resolution = Duration::from_time_delta(steps[0])?;
        Self::new(timestamps, time_slices, resolution)
    }

    fn new(
        timestamps: Vec<NaiveDateTime>,
        time_slices: Vec<TimeSliceID>,
        resolution: Duration,
    ) -> Result<Self> {
        ensure!(
            timestamps.windows(2).all(|w| w[0] < w[1]),
            "Timestamps of the timeslice mapping must be increasing"
        );

        Ok(Self {
            timestamps,
            time_slices,
            resolution,
        })
    }

    /// The number of timestamps
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether there are no timestamps
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Iterate over timestamps and their timeslices
    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDateTime, &TimeSliceID)> {
        self.timestamps.iter().zip(&self.time_slices)
    }

    /// The length of a step in hours
    pub fn step_hours(&self) -> Result<f64> {
        self.resolution.to_hours().with_context(|| {
            format!(
                "Time resolution {} does not have a fixed length",
                self.resolution
            )
        })
    }
}

fn read_duration(value: &ParameterValue) -> Result<Duration> {
    match value {
        ParameterValue::Duration(duration) => Ok(*duration),
        ParameterValue::Str(s) => s.parse(),
        other => bail!("Expected a duration, found {}", other.type_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, time_slices_to_time};
    use crate::value::{Map, MapIndex};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_from_value() {
        let value = time_slices_to_time(
            &[
                ("2020-01-01T00:00:00", "NIGHT"),
                ("2020-01-01T12:00:00", "DAY"),
            ],
            12,
        );
        let mapping = TimeSliceMapping::from_value(&value).unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.resolution, Duration::hours(12));
        assert_eq!(mapping.time_slices[1], TimeSliceID::new("DAY"));
        assert_eq!(mapping.step_hours().unwrap(), 12.0);
    }

    /// A `timeslices_to_time` value with one timeslice per timestamp and the given durations
    fn mapping_value(rows: [(&str, &str); 2]) -> ParameterValue {
        Map::new(
            None,
            rows.map(|(timestamp, duration)| {
                let inner = Map::new(
                    None,
                    [(MapIndex::from("S1"), ParameterValue::from(duration))],
                );
                (
                    MapIndex::DateTime(parse_datetime(timestamp).unwrap()),
                    ParameterValue::from(inner),
                )
            }),
        )
        .into()
    }

    #[test]
    fn test_from_value_variable_resolution() {
        let value = mapping_value([
            ("2020-01-01T00:00:00", "1h"),
            ("2020-01-01T01:00:00", "2h"),
        ]);
        assert_error!(
            TimeSliceMapping::from_value(&value),
            VARIABLE_RESOLUTION_MSG
        );
    }

    #[test]
    fn test_from_value_equivalent_resolutions() {
        let value = mapping_value([
            ("2020-01-01T00:00:00", "1h"),
            ("2020-01-01T01:00:00", "60m"),
        ]);
        let mapping = TimeSliceMapping::from_value(&value).unwrap();
        assert_eq!(mapping.resolution, Duration::hours(1));
    }

    #[test]
    fn test_from_value_empty() {
        let value = ParameterValue::from(Map::default());
        assert_error!(
            TimeSliceMapping::from_value(&value),
            "Empty timeslice to datetime mapping"
        );
    }

    #[test]
    fn test_from_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("timeslices.csv");
        fs::write(
            &path,
            "datetime,timeslice\n\
             2020-01-01T00:00:00,NIGHT\n\
             2020-01-01T06:00:00,NIGHT\n\
             2020-01-01T12:00:00,DAY\n\
             2020-01-01T18:00:00,DAY\n",
        )
        .unwrap();

        let mapping = TimeSliceMapping::from_csv(&path).unwrap();
        assert_eq!(mapping.len(), 4);
        assert_eq!(mapping.resolution, Duration::hours(6));
        let time_slices: Vec<_> = mapping.iter().map(|(_, ts)| ts.as_str()).collect();
        assert_eq!(time_slices, ["NIGHT", "NIGHT", "DAY", "DAY"]);
    }

    #[test]
    fn test_from_csv_variable_resolution() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("timeslices.csv");
        fs::write(
            &path,
            "datetime,timeslice\n\
             2020-01-01T00:00:00,NIGHT\n\
             2020-01-01T06:00:00,NIGHT\n\
             2020-01-01T08:00:00,DAY\n",
        )
        .unwrap();

        let err = TimeSliceMapping::from_csv(&path).unwrap_err();
        assert_eq!(err.chain().nth(1).unwrap().to_string(), VARIABLE_RESOLUTION_MSG);
    }
}
