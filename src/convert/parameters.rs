//! Copying numeric parameters and translating categorical ones.
use super::{commit_or_log, write_value};
use crate::config::{ConversionConfig, map_byname};
use crate::database::Database;
use crate::parameter::PERIOD_INDEX_NAME;
use crate::value::{Map, MapIndex, ParameterValue};
use anyhow::Result;
use float_cmp::approx_eq;
use log::warn;

/// Whether all keys of a map look like years
fn is_year_indexed(map: &Map) -> bool {
    !map.is_empty()
        && map.keys().all(|key| match key {
            MapIndex::Str(s) => s.len() == 4 && s.parse::<u16>().is_ok(),
            MapIndex::Float(x) => approx_eq!(f64, x.fract(), 0.0) && (1000.0..10000.0).contains(x),
            _ => false,
        })
}

/// Apply a unit conversion factor and convert the value into the target's conventions
fn transform_value(
    value: &ParameterValue,
    factor: f64,
    time_series_to_map: bool,
) -> ParameterValue {
    let mut value = if approx_eq!(f64, factor, 1.0) {
        value.clone()
    } else {
        value.scale(factor)
    };
    if time_series_to_map {
        value = value.time_series_to_map();
    }
    if let ParameterValue::Map(map) = &mut value {
        if map.index_name.is_none() && is_year_indexed(map) {
            map.index_name = Some(PERIOD_INDEX_NAME.to_string());
        }
    }

    value
}

/// Copy the parameters named by the configuration's parameter rules.
///
/// Values are copied in every alternative which defines them. Entities with no value in any
/// alternative get the rule's default, if it has one, in the default alternative.
pub fn transform_parameters(
    source: &Database,
    target: &mut Database,
    config: &ConversionConfig,
) -> Result<()> {
    for rule in &config.parameters {
        for entity in source.entities(&rule.source_class) {
            let byname = map_byname(rule.dimensions.as_ref(), &entity.byname)?;
            let mut found = false;
            for (alternative, value) in
                source.parameter_values(&rule.source_class, &entity.byname, &rule.source_parameter)
            {
                found = true;
                write_value(
                    target,
                    &rule.target_class,
                    &byname,
                    &rule.target_parameter,
                    alternative.as_str(),
                    transform_value(value, rule.factor, config.time_series_to_map),
                );
            }

            if let (false, Some(default)) = (found, rule.default) {
                write_value(
                    target,
                    &rule.target_class,
                    &byname,
                    &rule.target_parameter,
                    &config.default_alternative,
                    ParameterValue::Float(default),
                );
            }
        }
    }

    commit_or_log(target, "Transformed parameters");
    Ok(())
}

/// The key a categorical value is looked up by
fn method_key(value: &ParameterValue) -> Option<String> {
    match value {
        ParameterValue::Str(s) => Some(s.clone()),
        ParameterValue::Float(x) => Some(x.to_string()),
        _ => None,
    }
}

/// Translate the parameters named by the configuration's method rules
pub fn process_methods(
    source: &Database,
    target: &mut Database,
    config: &ConversionConfig,
) -> Result<()> {
    for rule in &config.methods {
        for entity in source.entities(&rule.source_class) {
            let byname = map_byname(rule.dimensions.as_ref(), &entity.byname)?;
            for (alternative, value) in
                source.parameter_values(&rule.source_class, &entity.byname, &rule.source_parameter)
            {
                let Some(key) = method_key(value) else {
                    warn!(
                        "{} of {} is a {}, not a method name; skipped",
                        rule.source_parameter,
                        entity.name,
                        value.type_name()
                    );
                    continue;
                };
                let Some(method) = rule.values.get(&key) else {
                    warn!(
                        "Unknown value '{key}' for {} of {}; skipped",
                        rule.source_parameter, entity.name
                    );
                    continue;
                };

                write_value(
                    target,
                    &rule.target_class,
                    &byname,
                    &rule.target_parameter,
                    alternative.as_str(),
                    ParameterValue::Str(method.clone()),
                );
            }
        }
    }

    commit_or_log(target, "Added methods");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MethodRule, ParameterRule};
    use crate::fixture::{byname, ines_db, osemosys_db, year_map};
    use crate::value::{TimeSeries, parse_datetime};
    use indexmap::IndexMap;
    use rstest::{fixture, rstest};

    #[fixture]
    fn config() -> ConversionConfig {
        let mut config = ConversionConfig::bundled().unwrap();
        config.parameters.clear();
        config.methods.clear();
        config
    }

    fn parameter_rule(source: (&str, &str), target: (&str, &str), factor: f64) -> ParameterRule {
        ParameterRule {
            source_class: source.0.into(),
            source_parameter: source.1.into(),
            target_class: target.0.into(),
            target_parameter: target.1.into(),
            factor,
            dimensions: None,
            default: None,
        }
    }

    fn target(source: &Database, mut ines_db: Database, config: &ConversionConfig) -> Database {
        ines_db.add_alternative("base").unwrap();
        crate::convert::entities::copy_entities(source, &mut ines_db, &config.entities).unwrap();
        ines_db
    }

    #[test]
    fn test_transform_value() {
        let value = transform_value(&year_map(&[("2020", 2.0)]), 0.5, true);
        let map = value.as_map().unwrap();
        assert_eq!(map.index_name.as_deref(), Some(PERIOD_INDEX_NAME));
        assert_eq!(map.get("2020"), Some(&ParameterValue::Float(1.0)));

        let series = TimeSeries::new(
            vec![parse_datetime("2020-01-01T00:00:00").unwrap()],
            vec![1.0],
        )
        .unwrap();
        let value = transform_value(&series.clone().into(), 1.0, true);
        assert_eq!(value, ParameterValue::Map(series.clone().into_map()));
        let value = transform_value(&series.clone().into(), 1.0, false);
        assert_eq!(value, ParameterValue::TimeSeries(series));
    }

    #[rstest]
    fn test_transform_parameters(
        osemosys_db: Database,
        ines_db: Database,
        mut config: ConversionConfig,
    ) {
        config.parameters.push(parameter_rule(
            ("REGION__FUEL", "SpecifiedAnnualDemand"),
            ("node", "flow_annual"),
            10.0,
        ));
        let mut rule = parameter_rule(("REGION", "DiscountRate"), ("set", "discount_rate"), 1.0);
        rule.default = Some(0.05);
        config.parameters.push(rule);

        let mut target = target(&osemosys_db, ines_db, &config);
        transform_parameters(&osemosys_db, &mut target, &config).unwrap();

        let demand = target
            .parameter_value("node", &byname(&["R1__ELC"]), "flow_annual", "base")
            .and_then(ParameterValue::as_map)
            .unwrap();
        assert_eq!(demand.get("2020"), Some(&ParameterValue::Float(10.0)));
        assert_eq!(demand.index_name.as_deref(), Some(PERIOD_INDEX_NAME));

        // No source value for GAS and no default
        assert!(
            target
                .parameter_value("node", &byname(&["R1__GAS"]), "flow_annual", "base")
                .is_none()
        );
        assert_eq!(
            target.parameter_value("set", &byname(&["R1"]), "discount_rate", "base"),
            Some(&ParameterValue::Float(0.05))
        );
    }

    #[rstest]
    fn test_process_methods(
        mut osemosys_db: Database,
        ines_db: Database,
        mut config: ConversionConfig,
    ) {
        osemosys_db.add_entity("REGION", &["R2"]).unwrap();
        osemosys_db
            .add_parameter_value(
                "REGION",
                &byname(&["R1"]),
                "DepreciationMethod",
                "base",
                2.0.into(),
            )
            .unwrap();
        osemosys_db
            .add_parameter_value(
                "REGION",
                &byname(&["R2"]),
                "DepreciationMethod",
                "base",
                3.0.into(),
            )
            .unwrap();
        config.methods.push(MethodRule {
            source_class: "REGION".into(),
            source_parameter: "DepreciationMethod".into(),
            target_class: "set".into(),
            target_parameter: "depreciation_method".into(),
            dimensions: None,
            values: IndexMap::from([
                ("1".to_string(), "sinking_fund".to_string()),
                ("2".to_string(), "straight_line".to_string()),
            ]),
        });

        let mut target = target(&osemosys_db, ines_db, &config);
        process_methods(&osemosys_db, &mut target, &config).unwrap();
        assert_eq!(
            target.parameter_value("set", &byname(&["R1"]), "depreciation_method", "base"),
            Some(&ParameterValue::from("straight_line"))
        );

        // Unknown values are skipped
        assert!(
            target
                .parameter_value("set", &byname(&["R2"]), "depreciation_method", "base")
                .is_none()
        );
    }
}
