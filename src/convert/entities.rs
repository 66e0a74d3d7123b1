//! Copying entities and deriving parameters from them.
use super::{commit_or_log, write_value};
use crate::config::{ConstantValue, ConversionConfig, EntityRule, map_byname};
use crate::database::{Database, entity_name};
use crate::value::ParameterValue;
use anyhow::Result;
use log::warn;

/// Copy the entities of each rule's source class into its target class.
///
/// Entities which already exist in the target are skipped.
pub fn copy_entities(source: &Database, target: &mut Database, rules: &[EntityRule]) -> Result<()> {
    for rule in rules {
        for entity in source.entities(&rule.source) {
            let byname = map_byname(rule.dimensions.as_ref(), &entity.byname)?;
            if let Err(err) = target.ensure_entity(&rule.target, &byname) {
                warn!(
                    "Could not add {} entity {}: {err}",
                    rule.target,
                    entity_name(&byname)
                );
            }
        }
    }

    commit_or_log(target, "Added entities");
    Ok(())
}

/// Write a constant parameter value for each entity of the rules' source classes
pub fn entities_to_parameters(
    source: &Database,
    target: &mut Database,
    config: &ConversionConfig,
) -> Result<()> {
    for rule in &config.entities_to_parameters {
        let value = match &rule.value {
            ConstantValue::Float(value) => ParameterValue::Float(*value),
            ConstantValue::Str(value) => ParameterValue::Str(value.clone()),
        };
        for entity in source.entities(&rule.source_class) {
            let byname = map_byname(rule.dimensions.as_ref(), &entity.byname)?;
            write_value(
                target,
                &rule.target_class,
                &byname,
                &rule.target_parameter,
                &config.default_alternative,
                value.clone(),
            );
        }
    }

    commit_or_log(target, "Added parameters from entities");
    Ok(())
}
