//! The system timeline and the solve definition.
use super::{commit_or_log, write_value};
use crate::database::Database;
use crate::time_slice::TimeSliceMapping;
use crate::value::{Map, MapIndex, ParameterValue, TIME_INDEX_NAME};
use anyhow::{Context, Result};
use log::info;

/// Add the `system` entity with its timeline and, if the model has years, the `solve` entity
pub fn create_timeline(
    source: &Database,
    target: &mut Database,
    model: &str,
    mapping: &TimeSliceMapping,
    default_alternative: &str,
) -> Result<()> {
    let model_byname = [model.to_string()];
    target
        .ensure_entity("system", &model_byname)
        .context("Could not add the system entity to the target database")?;

    let step = mapping.step_hours()?;
    let timeline = Map::new(
        Some(TIME_INDEX_NAME),
        mapping
            .timestamps
            .iter()
            .map(|timestamp| (MapIndex::DateTime(*timestamp), ParameterValue::Float(step))),
    );
    write_value(
        target,
        "system",
        &model_byname,
        "timeline",
        default_alternative,
        timeline.into(),
    );

    let years: Vec<_> = source
        .entities("YEAR")
        .iter()
        .map(|entity| ParameterValue::Str(entity.name.clone()))
        .collect();
    if years.is_empty() {
        info!("The source database has no years, so no solve entity was added");
    } else {
        target
            .ensure_entity("solve", &model_byname)
            .context("Could not add the solve entity to the target database")?;
        write_value(
            target,
            "solve",
            &model_byname,
            "period",
            default_alternative,
            ParameterValue::Array(years),
        );
        write_value(
            target,
            "solve",
            &model_byname,
            "solve_mode",
            default_alternative,
            "single_solve".into(),
        );
    }

    commit_or_log(target, "Added timeline");
    Ok(())
}
