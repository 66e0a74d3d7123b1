//! The conversion pipeline from an OSeMOSYS database into an INES database.
//!
//! The stages run in a fixed order and each one commits its changes to the target, so if a stage
//! fails the target still holds the output of the stages before it.
use crate::config::ConversionConfig;
use crate::database::{Database, PurgeItem, entity_name};
use crate::value::ParameterValue;
use anyhow::{Result, bail};
use log::{info, warn};
use std::path::Path;

pub mod capacity;
pub mod entities;
pub mod parameters;
pub mod timeline;
pub mod timeslice;

/// The class of the entity holding model-wide data in the source database
const MODEL_CLASS: &str = "model";

/// Convert the contents of `source` into `target`.
///
/// # Arguments
///
/// * `source` - The OSeMOSYS database
/// * `target` - The INES database. Its entities, alternatives and parameter values are replaced.
/// * `config` - The conversion rules
/// * `time_slice_csv` - Optional CSV file mapping timestamps to timeslices
pub fn convert(
    source: &Database,
    target: &mut Database,
    config: &ConversionConfig,
    time_slice_csv: Option<&Path>,
) -> Result<()> {
    info!("Purging the target database");
    for item in [
        PurgeItem::ParameterValues,
        PurgeItem::Entities,
        PurgeItem::Alternatives,
    ] {
        target.purge(item);
    }
    commit_or_log(target, "Purged stuff");

    copy_alternatives(source, target, &config.default_alternative)?;

    info!("Copying entities");
    entities::copy_entities(source, target, &config.entities)?;

    info!("Processing timeslice data");
    let model = find_model(source)?;
    let (mapping, mapping_alternative) =
        timeslice::load_mapping(source, &model, time_slice_csv, &config.default_alternative)?;
    timeslice::process_time_slice_data(source, target, &model, &mapping, &mapping_alternative)?;

    info!("Transforming parameters");
    parameters::transform_parameters(source, target, config)?;
    parameters::process_methods(source, target, config)?;
    entities::entities_to_parameters(source, target, config)?;

    info!("Processing capacities");
    capacity::process_capacities(source, target, &config.default_alternative)?;

    info!("Creating the timeline");
    timeline::create_timeline(
        source,
        target,
        &model,
        &mapping,
        &config.default_alternative,
    )?;

    if target.has_uncommitted_changes() {
        commit_or_log(target, "Added parameter values");
    }

    Ok(())
}

/// Copy all alternatives, making sure the default alternative exists in the target
fn copy_alternatives(
    source: &Database,
    target: &mut Database,
    default_alternative: &str,
) -> Result<()> {
    for alternative in source.alternatives() {
        if let Err(err) = target.add_alternative(alternative.as_str()) {
            warn!("{err}");
        }
    }
    if target.commit("Added alternatives").is_err() {
        bail!("No alternatives in the source database, check the path to the source database");
    }

    if !target.alternatives().any(|alt| alt.as_str() == default_alternative) {
        info!("Adding the default alternative {default_alternative}");
        target.add_alternative(default_alternative)?;
        commit_or_log(target, "Added default alternative");
    }

    Ok(())
}

/// Get the name of the one model entity of the source database
fn find_model(source: &Database) -> Result<String> {
    match source.entities(MODEL_CLASS).as_slice() {
        [model] => Ok(model.name.clone()),
        [] => bail!("No model entities in the source database"),
        _ => bail!("The converter does not handle databases with more than one model entity"),
    }
}

/// Commit the target's changes, logging a failure rather than returning it
fn commit_or_log(target: &mut Database, message: &str) {
    if let Err(err) = target.commit(message) {
        warn!("Could not commit '{message}': {err}");
    }
}

/// Write a parameter value to the target, logging a failure rather than returning it.
///
/// Returns whether the value was written.
fn write_value(
    target: &mut Database,
    class: &str,
    byname: &[String],
    parameter: &str,
    alternative: &str,
    value: ParameterValue,
) -> bool {
    match target.add_parameter_value(class, byname, parameter, alternative, value) {
        Ok(()) => true,
        Err(err) => {
            warn!(
                "Could not write {parameter} for {class} {}: {err}",
                entity_name(byname)
            );
            false
        }
    }
}
