//! Parameter values held by the entity/parameter-value store.
//!
//! Values are either plain scalars or one of the indexed types (arrays, time series and maps,
//! which may be nested). They are encoded as JSON in the same layout the Spine database uses, so
//! that snapshots can be exchanged with other tools.
use anyhow::{Context, Result, bail, ensure};
use chrono::NaiveDateTime;
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Value as Json, json};
use std::fmt;

mod duration;
pub use duration::{Duration, DurationUnit};

/// The format used for writing timestamps
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// The start of fixed-resolution time series which don't specify one
const DEFAULT_TIME_SERIES_START: &str = "0001-01-01T00:00:00";

/// The index name given to maps converted from time series
pub const TIME_INDEX_NAME: &str = "time";

/// Parse a timestamp, accepting ISO 8601 with either `T` or a space as separator, or a bare date
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .with_context(|| format!("Invalid timestamp: '{s}'"))
}

/// Write a timestamp in the store's format
pub fn format_datetime(datetime: &NaiveDateTime) -> String {
    datetime.format(DATETIME_FORMAT).to_string()
}

/// A value attached to an entity for a given parameter and alternative
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    /// A floating-point number
    Float(f64),
    /// A string (also used for categorical "method" values)
    Str(String),
    /// A boolean
    Bool(bool),
    /// A point in time
    DateTime(NaiveDateTime),
    /// A length of time
    Duration(Duration),
    /// A one-dimensional array of scalars
    Array(Vec<ParameterValue>),
    /// Values indexed by timestamps
    TimeSeries(TimeSeries),
    /// Values indexed by arbitrary keys, possibly nested
    Map(Map),
}

/// A key of a [`Map`]
#[derive(Debug, Clone, PartialEq)]
pub enum MapIndex {
    /// A string key (the usual case, e.g. years or timeslice names)
    Str(String),
    /// A numeric key
    Float(f64),
    /// A timestamp key
    DateTime(NaiveDateTime),
    /// A duration key
    Duration(Duration),
}

impl MapIndex {
    /// The name of the index type as used in the JSON encoding
    fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "str",
            Self::Float(_) => "float",
            Self::DateTime(_) => "date_time",
            Self::Duration(_) => "duration",
        }
    }

    fn to_json(&self) -> Json {
        match self {
            Self::Str(s) => json!(s),
            Self::Float(f) => json!(f),
            Self::DateTime(dt) => json!(format_datetime(dt)),
            Self::Duration(d) => json!(d.to_string()),
        }
    }

    fn from_json(index_type: &str, json: &Json) -> Result<Self> {
        Ok(match (index_type, json) {
            ("str", Json::String(s)) => Self::Str(s.clone()),
            // Numeric keys are sometimes stored for string-typed maps (e.g. years)
            ("str", Json::Number(n)) => Self::Str(n.to_string()),
            ("float", Json::Number(n)) => Self::Float(n.as_f64().context("Invalid map key")?),
            ("float", Json::String(s)) => Self::Float(
                s.parse()
                    .with_context(|| format!("Invalid numeric map key: '{s}'"))?,
            ),
            ("date_time", Json::String(s)) => Self::DateTime(parse_datetime(s)?),
            ("duration", Json::String(s)) => Self::Duration(s.parse()?),
            _ => bail!("Invalid map key {json} for index type '{index_type}'"),
        })
    }
}

impl fmt::Display for MapIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::DateTime(dt) => write!(f, "{}", format_datetime(dt)),
            Self::Duration(d) => write!(f, "{d}"),
        }
    }
}

impl From<&str> for MapIndex {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

/// Values indexed by arbitrary keys.
///
/// Entries keep the order in which they were stored.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Map {
    /// Optional name of the index (e.g. `period`)
    pub index_name: Option<String>,
    /// Keys and their values
    pub entries: Vec<(MapIndex, ParameterValue)>,
}

impl Map {
    /// Create a map from keys and values
    pub fn new<I>(index_name: Option<&str>, entries: I) -> Self
    where
        I: IntoIterator<Item = (MapIndex, ParameterValue)>,
    {
        Self {
            index_name: index_name.map(ToString::to_string),
            entries: entries.into_iter().collect(),
        }
    }

    /// Get the value for the key whose string form is `key`
    pub fn get(&self, key: &str) -> Option<&ParameterValue> {
        self.entries
            .iter()
            .find(|(index, _)| index.to_string() == key)
            .map(|(_, value)| value)
    }

    /// Iterate over keys
    pub fn keys(&self) -> impl Iterator<Item = &MapIndex> {
        self.entries.iter().map(|(index, _)| index)
    }

    /// Iterate over values
    pub fn values(&self) -> impl Iterator<Item = &ParameterValue> {
        self.entries.iter().map(|(_, value)| value)
    }

    /// The number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Values indexed by (strictly increasing) timestamps
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    /// Timestamps
    pub indexes: Vec<NaiveDateTime>,
    /// One value per timestamp
    pub values: Vec<f64>,
    /// Whether the series applies to every year
    pub ignore_year: bool,
    /// Whether the series repeats after its last timestamp
    pub repeat: bool,
}

impl TimeSeries {
    /// Create a non-repeating time series
    pub fn new(indexes: Vec<NaiveDateTime>, values: Vec<f64>) -> Result<Self> {
        ensure!(
            indexes.len() == values.len(),
            "Time series has {} timestamps but {} values",
            indexes.len(),
            values.len()
        );
        ensure!(
            indexes.windows(2).all(|w| w[0] < w[1]),
            "Time series timestamps must be strictly increasing"
        );

        Ok(Self {
            indexes,
            values,
            ignore_year: false,
            repeat: false,
        })
    }

    /// Convert into a map indexed by timestamps
    pub fn into_map(self) -> Map {
        Map::new(
            Some(TIME_INDEX_NAME),
            self.indexes
                .into_iter()
                .zip(self.values)
                .map(|(index, value)| (MapIndex::DateTime(index), ParameterValue::Float(value))),
        )
    }

    /// Read the `data` of a time series whose `index` gives a start and resolution
    fn from_fixed_resolution(index: Option<&Json>, data: &[Json]) -> Result<Vec<NaiveDateTime>> {
        let start = index
            .and_then(|index| index.get("start"))
            .and_then(Json::as_str)
            .unwrap_or(DEFAULT_TIME_SERIES_START);
        let start = parse_datetime(start)?;
        let resolution: Duration = index
            .and_then(|index| index.get("resolution"))
            .and_then(Json::as_str)
            .unwrap_or("1h")
            .parse()?;
        let step = resolution
            .to_time_delta()
            .with_context(|| format!("Unsupported time series resolution: {resolution}"))?;

        let mut timestamp = start;
        let mut indexes = Vec::with_capacity(data.len());
        for _ in data {
            indexes.push(timestamp);
            timestamp += step;
        }

        Ok(indexes)
    }
}

/// Read a JSON number (`null` is not allowed)
fn json_to_f64(json: &Json) -> Result<f64> {
    json.as_f64()
        .with_context(|| format!("Expected a number, found {json}"))
}

/// Read the `data` field of an encoded value
fn get_data(obj: &Json) -> Result<&Json> {
    obj.get("data").context("Encoded value has no data field")
}

/// Read `[key, value]` pairs or a `{key: value}` object
fn read_pairs(data: &Json) -> Result<Vec<(Json, &Json)>> {
    match data {
        Json::Array(items) => items
            .iter()
            .map(|item| match item.as_array().map(Vec::as_slice) {
                Some([key, value]) => Ok((key.clone(), value)),
                _ => bail!("Expected a [key, value] pair, found {item}"),
            })
            .collect(),
        Json::Object(obj) => Ok(obj
            .iter()
            .map(|(key, value)| (Json::String(key.clone()), value))
            .collect()),
        _ => bail!("Expected a list of pairs or an object, found {data}"),
    }
}

impl ParameterValue {
    /// A short name for the type of the value
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Bool(_) => "bool",
            Self::DateTime(_) => "date_time",
            Self::Duration(_) => "duration",
            Self::Array(_) => "array",
            Self::TimeSeries(_) => "time_series",
            Self::Map(_) => "map",
        }
    }

    /// The value as a number, if it is one
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// The value as a string, if it is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    /// The value as a map, if it is one
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Whether every number in the value (including nested ones) is finite
    pub fn is_finite(&self) -> bool {
        match self {
            Self::Float(value) => value.is_finite(),
            Self::Array(values) => values.iter().all(Self::is_finite),
            Self::TimeSeries(ts) => ts.values.iter().copied().all(f64::is_finite),
            Self::Map(map) => map.values().all(Self::is_finite),
            _ => true,
        }
    }

    /// Multiply every number in the value (including nested ones) by `factor`
    pub fn scale(&self, factor: f64) -> Self {
        match self {
            Self::Float(value) => Self::Float(value * factor),
            Self::Array(values) => Self::Array(values.iter().map(|v| v.scale(factor)).collect()),
            Self::TimeSeries(ts) => Self::TimeSeries(TimeSeries {
                values: ts.values.iter().map(|v| v * factor).collect(),
                ..ts.clone()
            }),
            Self::Map(map) => Self::Map(Map {
                index_name: map.index_name.clone(),
                entries: map
                    .entries
                    .iter()
                    .map(|(index, value)| (index.clone(), value.scale(factor)))
                    .collect(),
            }),
            other => other.clone(),
        }
    }

    /// Replace time series (including ones nested in maps) with timestamp-indexed maps
    pub fn time_series_to_map(self) -> Self {
        match self {
            Self::TimeSeries(ts) => Self::Map(ts.into_map()),
            Self::Map(map) => Self::Map(Map {
                index_name: map.index_name,
                entries: map
                    .entries
                    .into_iter()
                    .map(|(index, value)| (index, value.time_series_to_map()))
                    .collect(),
            }),
            other => other,
        }
    }

    /// Decode a value from its JSON representation
    pub fn from_json(json: &Json) -> Result<Self> {
        let obj = match json {
            Json::Number(n) => return Ok(Self::Float(n.as_f64().context("Invalid number")?)),
            Json::String(s) => return Ok(Self::Str(s.clone())),
            Json::Bool(b) => return Ok(Self::Bool(*b)),
            Json::Null => bail!("Null parameter values are not supported"),
            Json::Array(_) => {
                bail!("Untyped arrays are not supported; use {{\"type\": \"array\"}}")
            }
            Json::Object(obj) => obj,
        };

        let value_type = obj
            .get("type")
            .and_then(Json::as_str)
            .context("Encoded value has no type")?;
        let value = match value_type {
            "date_time" => {
                let data = get_data(json)?.as_str().context("Invalid date_time data")?;
                Self::DateTime(parse_datetime(data)?)
            }
            "duration" => match get_data(json)? {
                Json::String(s) => Self::Duration(s.parse()?),
                // Bare numbers are minutes
                Json::Number(n) => Self::Duration(Duration::new(
                    n.as_i64().context("Invalid duration")?,
                    DurationUnit::Minute,
                )),
                other => bail!("Invalid duration data: {other}"),
            },
            "array" => {
                let element_type = obj.get("value_type").and_then(Json::as_str).unwrap_or("float");
                let data = get_data(json)?.as_array().context("Array data must be a list")?;
                Self::Array(
                    data.iter()
                        .map(|item| array_element_from_json(element_type, item))
                        .collect::<Result<_>>()?,
                )
            }
            "time_series" => Self::TimeSeries(time_series_from_json(json)?),
            "map" => Self::Map(map_from_json(json)?),
            other => bail!("Unknown value type: {other}"),
        };

        Ok(value)
    }

    /// Encode the value as JSON
    pub fn to_json(&self) -> Json {
        match self {
            Self::Float(value) => json!(value),
            Self::Str(value) => json!(value),
            Self::Bool(value) => json!(value),
            Self::DateTime(dt) => json!({"type": "date_time", "data": format_datetime(dt)}),
            Self::Duration(d) => json!({"type": "duration", "data": d.to_string()}),
            Self::Array(values) => {
                let value_type = values.first().map_or("float", Self::type_name);
                let data: Vec<Json> = values
                    .iter()
                    .map(|value| match value {
                        Self::DateTime(dt) => json!(format_datetime(dt)),
                        Self::Duration(d) => json!(d.to_string()),
                        other => other.to_json(),
                    })
                    .collect();
                json!({"type": "array", "value_type": value_type, "data": data})
            }
            Self::TimeSeries(ts) => {
                let data: Vec<Json> = ts
                    .indexes
                    .iter()
                    .zip(&ts.values)
                    .map(|(index, value)| json!([format_datetime(index), value]))
                    .collect();
                json!({
                    "type": "time_series",
                    "index": {"ignore_year": ts.ignore_year, "repeat": ts.repeat},
                    "data": data,
                })
            }
            Self::Map(map) => {
                let index_type = map.keys().next().map_or("str", MapIndex::type_name);
                let data: Vec<Json> = map
                    .entries
                    .iter()
                    .map(|(index, value)| json!([index.to_json(), value.to_json()]))
                    .collect();
                let mut out = json!({"type": "map", "index_type": index_type, "data": data});
                if let Some(index_name) = &map.index_name {
                    out["index_name"] = json!(index_name);
                }
                out
            }
        }
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<Map> for ParameterValue {
    fn from(value: Map) -> Self {
        Self::Map(value)
    }
}

impl From<TimeSeries> for ParameterValue {
    fn from(value: TimeSeries) -> Self {
        Self::TimeSeries(value)
    }
}

impl From<Duration> for ParameterValue {
    fn from(value: Duration) -> Self {
        Self::Duration(value)
    }
}

fn array_element_from_json(element_type: &str, json: &Json) -> Result<ParameterValue> {
    Ok(match (element_type, json) {
        ("float", _) => ParameterValue::Float(json_to_f64(json)?),
        ("str", Json::String(s)) => ParameterValue::Str(s.clone()),
        ("date_time", Json::String(s)) => ParameterValue::DateTime(parse_datetime(s)?),
        ("duration", Json::String(s)) => ParameterValue::Duration(s.parse()?),
        _ => bail!("Invalid array element {json} for value type '{element_type}'"),
    })
}

fn time_series_from_json(json: &Json) -> Result<TimeSeries> {
    let index = json.get("index");
    let (indexes, values) = match get_data(json)? {
        Json::Array(items) if items.iter().all(Json::is_number) => (
            TimeSeries::from_fixed_resolution(index, items)?,
            items.iter().map(json_to_f64).collect::<Result<_>>()?,
        ),
        data => {
            let pairs = read_pairs(data)?;
            let mut indexes = Vec::with_capacity(pairs.len());
            let mut values = Vec::with_capacity(pairs.len());
            for (key, value) in pairs {
                let key = key.as_str().context("Time series timestamps must be strings")?;
                indexes.push(parse_datetime(key)?);
                values.push(json_to_f64(value)?);
            }
            (indexes, values)
        }
    };

    let flag = |name| {
        index
            .and_then(|index| index.get(name))
            .and_then(Json::as_bool)
            .unwrap_or(false)
    };
    let mut ts = TimeSeries::new(indexes, values)?;
    ts.ignore_year = flag("ignore_year");
    ts.repeat = flag("repeat");

    Ok(ts)
}

fn map_from_json(json: &Json) -> Result<Map> {
    let index_type = json
        .get("index_type")
        .and_then(Json::as_str)
        .unwrap_or("str");
    let index_name = json.get("index_name").and_then(Json::as_str);
    let entries = read_pairs(get_data(json)?)?
        .into_iter()
        .map(|(key, value)| {
            Ok((
                MapIndex::from_json(index_type, &key)?,
                ParameterValue::from_json(value)?,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Map::new(index_name, entries))
}

impl Serialize for ParameterValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // JSON has no encoding for these and would write them as null
        if !self.is_finite() {
            return Err(S::Error::custom("Non-finite numbers cannot be written to JSON"));
        }
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ParameterValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let json = Json::deserialize(deserializer)?;
        Self::from_json(&json).map_err(|err| D::Error::custom(format!("{err:#}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use rstest::rstest;

    fn dt(s: &str) -> NaiveDateTime {
        parse_datetime(s).unwrap()
    }

    #[rstest]
    #[case("2020-01-01T01:00:00", "2020-01-01T01:00:00")]
    #[case("2020-01-01 01:00:00", "2020-01-01T01:00:00")]
    #[case("2020-01-01T01:00", "2020-01-01T01:00:00")]
    #[case("2020-01-01", "2020-01-01T00:00:00")]
    fn test_parse_datetime(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(format_datetime(&parse_datetime(input).unwrap()), expected);
    }

    #[test]
    fn test_parse_datetime_invalid() {
        assert_error!(parse_datetime("yesterday"), "Invalid timestamp: 'yesterday'");
    }

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(
            ParameterValue::from_json(&json!(2.5)).unwrap(),
            ParameterValue::Float(2.5)
        );
        assert_eq!(
            ParameterValue::from_json(&json!("constant_efficiency")).unwrap(),
            ParameterValue::from("constant_efficiency")
        );
        assert_eq!(
            ParameterValue::from_json(&json!({"type": "duration", "data": "1h"})).unwrap(),
            ParameterValue::Duration(Duration::hours(1))
        );
        assert_eq!(
            ParameterValue::from_json(&json!({"type": "duration", "data": 60})).unwrap(),
            ParameterValue::Duration(Duration::new(60, DurationUnit::Minute))
        );
        assert_error!(
            ParameterValue::from_json(&Json::Null),
            "Null parameter values are not supported"
        );
        assert_error!(
            ParameterValue::from_json(&json!({"type": "cube", "data": 1})),
            "Unknown value type: cube"
        );
    }

    #[test]
    fn test_from_json_nested_map() {
        // Mode of operation -> year -> value, as read from OSeMOSYS data
        let json = json!({
            "type": "map",
            "index_type": "str",
            "index_name": "MODE_OF_OPERATION",
            "data": [["1", {"type": "map", "index_type": "str", "data": {"2020": 1.5, "2021": 2.0}}]]
        });
        let value = ParameterValue::from_json(&json).unwrap();
        let outer = value.as_map().unwrap();
        assert_eq!(outer.index_name.as_deref(), Some("MODE_OF_OPERATION"));
        let inner = outer.get("1").unwrap().as_map().unwrap();
        assert_eq!(inner.get("2021"), Some(&ParameterValue::Float(2.0)));
        assert_eq!(inner.len(), 2);
    }

    #[test]
    fn test_map_numeric_keys() {
        let json = json!({"type": "map", "index_type": "float", "data": [[2020.0, 1.0]]});
        let value = ParameterValue::from_json(&json).unwrap();
        assert_eq!(
            value.as_map().unwrap().get("2020"),
            Some(&ParameterValue::Float(1.0))
        );
    }

    #[test]
    fn test_time_series_fixed_resolution() {
        let json = json!({
            "type": "time_series",
            "index": {"start": "2020-01-01T00:00:00", "resolution": "30m", "repeat": true},
            "data": [1.0, 2.0, 3.0]
        });
        let ParameterValue::TimeSeries(ts) = ParameterValue::from_json(&json).unwrap() else {
            panic!("Expected a time series");
        };
        assert_eq!(
            ts.indexes,
            [
                dt("2020-01-01T00:00:00"),
                dt("2020-01-01T00:30:00"),
                dt("2020-01-01T01:00:00")
            ]
        );
        assert_eq!(ts.values, [1.0, 2.0, 3.0]);
        assert!(ts.repeat);
        assert!(!ts.ignore_year);
    }

    #[test]
    fn test_time_series_variable_resolution() {
        let json = json!({
            "type": "time_series",
            "data": {"2020-01-01T00:00:00": 1.0, "2020-01-01T06:00:00": 4.0}
        });
        let ParameterValue::TimeSeries(ts) = ParameterValue::from_json(&json).unwrap() else {
            panic!("Expected a time series");
        };
        assert_eq!(ts.indexes[1], dt("2020-01-01T06:00:00"));
        assert_eq!(ts.values, [1.0, 4.0]);
    }

    #[test]
    fn test_time_series_new_invalid() {
        assert_error!(
            TimeSeries::new(vec![dt("2020-01-01")], vec![]),
            "Time series has 1 timestamps but 0 values"
        );
        assert_error!(
            TimeSeries::new(vec![dt("2020-01-02"), dt("2020-01-01")], vec![1.0, 2.0]),
            "Time series timestamps must be strictly increasing"
        );
    }

    #[test]
    fn test_to_json_map() {
        let map = Map::new(
            Some("period"),
            [
                (MapIndex::from("2020"), ParameterValue::Float(1.0)),
                (MapIndex::from("2030"), ParameterValue::Float(2.0)),
            ],
        );
        assert_eq!(
            ParameterValue::from(map).to_json(),
            json!({
                "type": "map",
                "index_type": "str",
                "index_name": "period",
                "data": [["2020", 1.0], ["2030", 2.0]]
            })
        );
    }

    #[test]
    fn test_to_json_time_series() {
        let ts = TimeSeries::new(
            vec![dt("2020-01-01T00:00:00"), dt("2020-01-01T01:00:00")],
            vec![0.5, 0.25],
        )
        .unwrap();
        let encoded = ParameterValue::from(ts.clone()).to_json();
        assert_eq!(encoded["data"][1], json!(["2020-01-01T01:00:00", 0.25]));
        assert_eq!(
            ParameterValue::from_json(&encoded).unwrap(),
            ParameterValue::TimeSeries(ts)
        );
    }

    #[test]
    fn test_serialize_non_finite() {
        assert_eq!(serde_json::to_string(&ParameterValue::Float(1.5)).unwrap(), "1.5");
        let map = Map::new(
            None,
            [(MapIndex::from("2020"), ParameterValue::Float(f64::INFINITY))],
        );
        assert!(!ParameterValue::from(map.clone()).is_finite());
        assert!(serde_json::to_string(&ParameterValue::from(map)).is_err());
    }

    #[test]
    fn test_scale() {
        let map = Map::new(
            None,
            [(
                MapIndex::from("1"),
                ParameterValue::from(Map::new(
                    None,
                    [(MapIndex::from("2020"), ParameterValue::Float(2.0))],
                )),
            )],
        );
        let scaled = ParameterValue::from(map).scale(3.0);
        let inner = scaled.as_map().unwrap().get("1").unwrap().as_map().unwrap();
        assert_eq!(inner.get("2020"), Some(&ParameterValue::Float(6.0)));
        assert_eq!(
            ParameterValue::from("x").scale(3.0),
            ParameterValue::from("x")
        );
    }

    #[test]
    fn test_time_series_to_map() {
        let ts = TimeSeries::new(vec![dt("2020-01-01")], vec![7.0]).unwrap();
        let map = ParameterValue::from(ts).time_series_to_map();
        let map = map.as_map().unwrap();
        assert_eq!(map.index_name.as_deref(), Some(TIME_INDEX_NAME));
        assert_eq!(
            map.get("2020-01-01T00:00:00"),
            Some(&ParameterValue::Float(7.0))
        );
    }
}
