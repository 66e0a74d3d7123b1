//! The conversion configuration: declarative rules saying what to copy from the source database.
//!
//! The rules are read from a TOML file. If the user doesn't supply one, the bundled
//! `config/osemosys_to_ines.toml` is used.
use crate::database::{ByName, entity_name};
use crate::input::{input_err_msg, read_toml};
use anyhow::{Context, Result, ensure};
use float_cmp::approx_eq;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

/// The bundled OSeMOSYS to INES rules
const BUNDLED_CONFIG: &str = include_str!("../config/osemosys_to_ines.toml");

fn default_alternative() -> String {
    "base".to_string()
}

fn default_true() -> bool {
    true
}

fn default_factor() -> f64 {
    1.0
}

/// Which source elements make up each element of a target entity.
///
/// Each inner list holds positions in the source entity's byname, whose names are joined with
/// `__`. For example `[[0, 1], [0, 2]]` turns `REGION__TECHNOLOGY__FUEL` entity `(R1, GAS, ELC)`
/// into the two-dimensional entity `(R1__GAS, R1__ELC)`. Without a mapping, all source names are
/// joined into a single name.
pub type Dimensions = Vec<Vec<usize>>;

/// Build the byname of a target entity from the byname of a source entity
pub fn map_byname(dimensions: Option<&Dimensions>, source: &[String]) -> Result<ByName> {
    let Some(dimensions) = dimensions else {
        return Ok(vec![entity_name(source)]);
    };

    dimensions
        .iter()
        .map(|positions| {
            let names = positions
                .iter()
                .map(|&i| {
                    source.get(i).cloned().with_context(|| {
                        format!("Entity {} has no element {i}", entity_name(source))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(entity_name(&names))
        })
        .collect()
}

/// Copy every entity of a source class into a target class
#[derive(Debug, Deserialize, PartialEq)]
pub struct EntityRule {
    /// Source entity class
    pub source: String,
    /// Target entity class
    pub target: String,
    /// How to build target entity names
    pub dimensions: Option<Dimensions>,
}

/// Copy a numeric parameter, multiplying it by a unit conversion factor
#[derive(Debug, Deserialize, PartialEq)]
pub struct ParameterRule {
    /// Source entity class
    pub source_class: String,
    /// Source parameter
    pub source_parameter: String,
    /// Target entity class
    pub target_class: String,
    /// Target parameter
    pub target_parameter: String,
    /// Unit conversion factor
    #[serde(default = "default_factor")]
    pub factor: f64,
    /// How to build target entity names
    pub dimensions: Option<Dimensions>,
    /// Written in the default alternative for entities with no value in any alternative
    pub default: Option<f64>,
}

/// Translate a categorical parameter through a table of values
#[derive(Debug, Deserialize, PartialEq)]
pub struct MethodRule {
    /// Source entity class
    pub source_class: String,
    /// Source parameter
    pub source_parameter: String,
    /// Target entity class
    pub target_class: String,
    /// Target parameter
    pub target_parameter: String,
    /// How to build target entity names
    pub dimensions: Option<Dimensions>,
    /// Source value -> target value
    pub values: IndexMap<String, String>,
}

/// A constant written by an entity-to-parameter rule
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ConstantValue {
    /// A number
    Float(f64),
    /// A string
    Str(String),
}

/// Write a constant parameter value for every entity of a source class
#[derive(Debug, Deserialize, PartialEq)]
pub struct EntityParameterRule {
    /// Source entity class
    pub source_class: String,
    /// Target entity class
    pub target_class: String,
    /// Target parameter
    pub target_parameter: String,
    /// The value to write
    pub value: ConstantValue,
    /// How to build target entity names
    pub dimensions: Option<Dimensions>,
}

/// The rules for one conversion
#[derive(Debug, Deserialize, PartialEq)]
pub struct ConversionConfig {
    /// The alternative used when a value isn't defined in the alternative being written
    #[serde(default = "default_alternative")]
    pub default_alternative: String,
    /// Whether to write time series as timestamp-indexed maps
    #[serde(default = "default_true")]
    pub time_series_to_map: bool,
    /// Entity classes to copy
    #[serde(default)]
    pub entities: Vec<EntityRule>,
    /// Numeric parameters to copy
    #[serde(default)]
    pub parameters: Vec<ParameterRule>,
    /// Categorical parameters to translate
    #[serde(default)]
    pub methods: Vec<MethodRule>,
    /// Parameters derived from the existence of entities
    #[serde(default)]
    pub entities_to_parameters: Vec<EntityParameterRule>,
}

impl ConversionConfig {
    /// Read a conversion configuration from a TOML file
    pub fn from_path(file_path: &Path) -> Result<Self> {
        let config: Self = read_toml(file_path)?;
        config.validate().with_context(|| input_err_msg(file_path))?;
        Ok(config)
    }

    /// The bundled configuration for converting OSeMOSYS data into INES
    pub fn bundled() -> Result<Self> {
        let config: Self = toml::from_str(BUNDLED_CONFIG).context("Invalid bundled config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            !self.default_alternative.is_empty(),
            "default_alternative cannot be empty"
        );

        for rule in &self.parameters {
            ensure!(
                rule.factor.is_finite() && !approx_eq!(f64, rule.factor, 0.0),
                "Invalid factor for {}.{}: {}",
                rule.source_class,
                rule.source_parameter,
                rule.factor
            );
        }

        let all_dimensions = self
            .entities
            .iter()
            .map(|rule| &rule.dimensions)
            .chain(self.parameters.iter().map(|rule| &rule.dimensions))
            .chain(self.methods.iter().map(|rule| &rule.dimensions))
            .chain(self.entities_to_parameters.iter().map(|rule| &rule.dimensions))
            .flatten();
        for dimensions in all_dimensions {
            ensure!(
                !dimensions.is_empty() && dimensions.iter().all(|d| !d.is_empty()),
                "Dimension mappings cannot be empty"
            );
        }

        Ok(())
    }
}
