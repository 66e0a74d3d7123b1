//! Looking up parameter values across alternatives.
//!
//! A parameter is usually only defined in some alternatives. Stages which combine several
//! parameters look each one up in the alternative being written and fall back to the default
//! alternative when it isn't defined there.
use crate::database::{Database, entity_name};
use crate::id::AlternativeID;
use crate::value::{Map, MapIndex, ParameterValue};
use anyhow::{Context, Result, bail, ensure};
use float_cmp::approx_eq;
use indexmap::{IndexMap, IndexSet};
use log::warn;

/// The index name used for year-indexed values in the target database
pub const PERIOD_INDEX_NAME: &str = "period";

/// A value which is either the same for every year or given per year
#[derive(Debug, Clone, PartialEq)]
pub enum AnnualValue {
    /// The same value for all years
    Constant(f64),
    /// A value per year, keyed by the year's name
    ByYear(IndexMap<String, f64>),
}

impl AnnualValue {
    /// Read an annual value from a parameter value.
    ///
    /// Accepts a number, a map of years to numbers, or a map of modes of operation to maps of
    /// years to numbers. In the last case only the first mode of operation is used.
    pub fn from_value(value: &ParameterValue) -> Result<Self> {
        match value {
            ParameterValue::Float(value) => Ok(Self::Constant(*value)),
            ParameterValue::Map(map) => match map.values().next() {
                Some(ParameterValue::Map(inner)) => {
                    if map.len() > 1 {
                        warn!(
                            "Only the first mode of operation ({}) is converted",
                            map.entries[0].0
                        );
                    }
                    Self::from_year_map(inner)
                }
                _ => Self::from_year_map(map),
            },
            other => bail!(
                "Expected a number or a year-indexed map, found {}",
                other.type_name()
            ),
        }
    }

    fn from_year_map(map: &Map) -> Result<Self> {
        let values = map
            .entries
            .iter()
            .map(|(year, value)| {
                let value = value
                    .as_float()
                    .with_context(|| format!("Value for year {year} is not a number"))?;
                Ok((year.to_string(), value))
            })
            .collect::<Result<IndexMap<_, _>>>()?;
        Ok(Self::ByYear(values))
    }

    /// The value for the first year (or the constant value)
    pub fn first(&self) -> Option<f64> {
        match self {
            Self::Constant(value) => Some(*value),
            Self::ByYear(values) => values.values().next().copied(),
        }
    }

    /// Iterate over all the values
    pub fn values(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        match self {
            Self::Constant(value) => Box::new(std::iter::once(*value)),
            Self::ByYear(values) => Box::new(values.values().copied()),
        }
    }

    /// Whether the value is the same in every year
    pub fn is_constant(&self) -> bool {
        let mut values = self.values();
        let Some(first) = values.next() else {
            return true;
        };
        values.all(|value| approx_eq!(f64, value, first))
    }

    /// Whether every value is zero
    pub fn all_zero(&self) -> bool {
        self.values().all(|value| approx_eq!(f64, value, 0.0))
    }

    /// Check that the value is given for either all of `years` or none of them
    pub fn check_complete(&self, years: &[String]) -> Result<()> {
        if let Self::ByYear(values) = self {
            let missing: Vec<_> = years
                .iter()
                .filter(|year| !values.contains_key(year.as_str()))
                .collect();
            ensure!(
                missing.is_empty() || missing.len() == years.len(),
                "Defined for some years but not for {}",
                missing.iter().map(|year| year.as_str()).collect::<Vec<_>>().join(", ")
            );
        }

        Ok(())
    }

    /// Apply `f` to every value
    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        match self {
            Self::Constant(value) => Self::Constant(f(*value)),
            Self::ByYear(values) => Self::ByYear(
                values
                    .iter()
                    .map(|(year, value)| (year.clone(), f(*value)))
                    .collect(),
            ),
        }
    }

    /// Combine with another annual value year by year.
    ///
    /// A constant is combined with every year of the other value. Two per-year values must cover
    /// the same years.
    pub fn zip_with<F: Fn(f64, f64) -> f64>(&self, other: &Self, f: F) -> Result<Self> {
        Ok(match (self, other) {
            (Self::Constant(a), Self::Constant(b)) => Self::Constant(f(*a, *b)),
            (Self::Constant(a), Self::ByYear(_)) => other.map(|b| f(*a, b)),
            (Self::ByYear(_), Self::Constant(b)) => self.map(|a| f(a, *b)),
            (Self::ByYear(a), Self::ByYear(b)) => Self::ByYear(
                a.iter()
                    .map(|(year, a)| {
                        let b = b
                            .get(year)
                            .with_context(|| format!("No value for year {year}"))?;
                        Ok((year.clone(), f(*a, *b)))
                    })
                    .collect::<Result<_>>()?,
            ),
        })
    }

    /// Convert into a parameter value, using a `period`-indexed map for per-year values
    pub fn to_value(&self) -> ParameterValue {
        match self {
            Self::Constant(value) => ParameterValue::Float(*value),
            Self::ByYear(values) => Map::new(
                Some(PERIOD_INDEX_NAME),
                values.iter().map(|(year, value)| {
                    (MapIndex::Str(year.clone()), ParameterValue::Float(*value))
                }),
            )
            .into(),
        }
    }
}

/// The values of one parameter of one entity in each alternative which defines it
#[derive(Debug, Clone, PartialEq)]
pub struct AlternativeValues<T>(IndexMap<AlternativeID, T>);

impl<T> Default for AlternativeValues<T> {
    fn default() -> Self {
        Self(IndexMap::new())
    }
}

impl<T> AlternativeValues<T> {
    /// Look up the value for `alternative`, falling back to `default_alternative`
    pub fn resolve(&self, alternative: &str, default_alternative: &str) -> Option<&T> {
        self.0
            .get(alternative)
            .or_else(|| self.0.get(default_alternative))
    }

    /// The alternatives which define the parameter
    pub fn alternatives(&self) -> impl Iterator<Item = &AlternativeID> {
        self.0.keys()
    }

    /// Whether the parameter is not defined in any alternative
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> FromIterator<(AlternativeID, T)> for AlternativeValues<T> {
    fn from_iter<I: IntoIterator<Item = (AlternativeID, T)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Read a parameter of an entity as annual values for every alternative defining it
pub fn read_annual_values(
    db: &Database,
    class: &str,
    byname: &[String],
    parameter: &str,
) -> Result<AlternativeValues<AnnualValue>> {
    db.parameter_values(class, byname, parameter)
        .map(|(alternative, value)| {
            let value = AnnualValue::from_value(value).with_context(|| {
                format!(
                    "Invalid value for {parameter} of {class} {} in alternative {alternative}",
                    entity_name(byname)
                )
            })?;
            Ok((alternative.clone(), value))
        })
        .collect()
}

/// The alternatives defining any of the given parameters, in order of first appearance
pub fn union_alternatives<'a, T: 'a, I>(values: I) -> IndexSet<AlternativeID>
where
    I: IntoIterator<Item = &'a AlternativeValues<T>>,
{
    values
        .into_iter()
        .flat_map(AlternativeValues::alternatives)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use rstest::rstest;

    fn by_year(values: &[(&str, f64)]) -> AnnualValue {
        AnnualValue::ByYear(
            values
                .iter()
                .map(|(year, value)| ((*year).to_string(), *value))
                .collect(),
        )
    }

    fn year_map(values: &[(&str, f64)]) -> Map {
        Map::new(
            None,
            values
                .iter()
                .map(|(year, value)| (MapIndex::from(*year), ParameterValue::Float(*value))),
        )
    }

    #[test]
    fn test_from_value() {
        assert_eq!(
            AnnualValue::from_value(&ParameterValue::Float(3.0)).unwrap(),
            AnnualValue::Constant(3.0)
        );
        let years = year_map(&[("2020", 1.0), ("2021", 2.0)]);
        assert_eq!(
            AnnualValue::from_value(&years.clone().into()).unwrap(),
            by_year(&[("2020", 1.0), ("2021", 2.0)])
        );

        // Mode of operation -> year
        let modes = Map::new(
            None,
            [
                (MapIndex::from("1"), ParameterValue::from(years)),
                (
                    MapIndex::from("2"),
                    ParameterValue::from(year_map(&[("2020", 9.0)])),
                ),
            ],
        );
        assert_eq!(
            AnnualValue::from_value(&modes.into()).unwrap(),
            by_year(&[("2020", 1.0), ("2021", 2.0)])
        );

        assert_error!(
            AnnualValue::from_value(&ParameterValue::from("x")),
            "Expected a number or a year-indexed map, found str"
        );
    }

    #[rstest]
    #[case(AnnualValue::Constant(1.0), true)]
    #[case(by_year(&[("2020", 1.0), ("2021", 1.0)]), true)]
    #[case(by_year(&[("2020", 1.0), ("2021", 2.0)]), false)]
    #[case(by_year(&[]), true)]
    fn test_is_constant(#[case] value: AnnualValue, #[case] expected: bool) {
        assert_eq!(value.is_constant(), expected);
    }

    #[test]
    fn test_check_complete() {
        let years = ["2020".to_string(), "2021".to_string(), "2022".to_string()];
        assert!(by_year(&[("2020", 1.0), ("2021", 1.0), ("2022", 1.0)])
            .check_complete(&years)
            .is_ok());
        assert!(by_year(&[("2030", 1.0)]).check_complete(&years).is_ok());
        assert!(AnnualValue::Constant(1.0).check_complete(&years).is_ok());
        assert_error!(
            by_year(&[("2020", 1.0)]).check_complete(&years),
            "Defined for some years but not for 2021, 2022"
        );
    }

    #[test]
    fn test_zip_with() {
        let a = by_year(&[("2020", 1.0), ("2021", 2.0)]);
        assert_eq!(
            a.zip_with(&AnnualValue::Constant(2.0), |a, b| a / b).unwrap(),
            by_year(&[("2020", 0.5), ("2021", 1.0)])
        );
        assert_eq!(
            AnnualValue::Constant(4.0)
                .zip_with(&a, |a, b| a / b)
                .unwrap(),
            by_year(&[("2020", 4.0), ("2021", 2.0)])
        );
        assert_error!(
            a.zip_with(&by_year(&[("2020", 1.0)]), |a, b| a * b),
            "No value for year 2021"
        );
    }

    #[test]
    fn test_to_value() {
        assert_eq!(
            AnnualValue::Constant(1.0).to_value(),
            ParameterValue::Float(1.0)
        );
        let value = by_year(&[("2020", 1.0)]).to_value();
        let map = value.as_map().unwrap();
        assert_eq!(map.index_name.as_deref(), Some(PERIOD_INDEX_NAME));
        assert_eq!(map.get("2020"), Some(&ParameterValue::Float(1.0)));
    }

    #[test]
    fn test_resolve() {
        let values: AlternativeValues<f64> =
            [(AlternativeID::from("base"), 1.0), (AlternativeID::from("high"), 2.0)]
                .into_iter()
                .collect();
        assert_eq!(values.resolve("high", "base"), Some(&2.0));
        assert_eq!(values.resolve("low", "base"), Some(&1.0));
        assert_eq!(values.resolve("low", "other"), None);

        let other: AlternativeValues<f64> =
            std::iter::once((AlternativeID::from("low"), 3.0)).collect();
        let alternatives: Vec<_> = union_alternatives([&values, &other])
            .into_iter()
            .map(|alt| alt.to_string())
            .collect();
        assert_eq!(alternatives, ["base", "high", "low"]);
    }
}
