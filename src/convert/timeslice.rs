//! Timeslice data: the time resolution and the per-timeslice profiles.
use super::{MODEL_CLASS, commit_or_log, write_value};
use crate::database::Database;
use crate::parameter::AnnualValue;
use crate::time_slice::TimeSliceMapping;
use crate::value::{ParameterValue, TimeSeries};
use anyhow::{Context, Result, bail, ensure};
use indexmap::IndexMap;
use log::info;
use std::path::Path;

/// A per-timeslice source parameter written as a time series.
///
/// Values are divided by the timeslice's year split.
struct Profile {
    source_class: &'static str,
    source_parameter: &'static str,
    target_class: &'static str,
    target_parameter: &'static str,
}

const PROFILES: [Profile; 2] = [
    Profile {
        source_class: "REGION__FUEL",
        source_parameter: "SpecifiedDemandProfile",
        target_class: "node",
        target_parameter: "flow_profile",
    },
    Profile {
        source_class: "REGION__TECHNOLOGY",
        source_parameter: "CapacityFactor",
        target_class: "unit",
        target_parameter: "availability",
    },
];

/// Round to six decimal places
fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// Get the timeslice mapping and the alternative its resolution is written in.
///
/// The mapping is read from `csv_path` if given, otherwise from the model's single
/// `timeslices_to_time` value.
pub fn load_mapping(
    source: &Database,
    model: &str,
    csv_path: Option<&Path>,
    default_alternative: &str,
) -> Result<(TimeSliceMapping, String)> {
    if let Some(csv_path) = csv_path {
        info!("Reading timeslice mapping from {}", csv_path.display());
        let mapping = TimeSliceMapping::from_csv(csv_path)?;
        return Ok((mapping, default_alternative.to_string()));
    }

    let byname = [model.to_string()];
    let values: Vec<_> = source
        .parameter_values(MODEL_CLASS, &byname, "timeslices_to_time")
        .collect();
    match values.as_slice() {
        [(alternative, value)] => {
            let mapping = TimeSliceMapping::from_value(value)
                .with_context(|| format!("Invalid timeslices_to_time for model {model}"))?;
            Ok((mapping, alternative.to_string()))
        }
        [] => bail!(
            "Model {model} has no timeslices_to_time parameter and no timeslice mapping file was \
             given"
        ),
        _ => bail!("Model {model} has more than one timeslices_to_time value"),
    }
}

/// Read a map of timeslice to annual value, taking the first year of each
fn first_year_by_time_slice(value: &ParameterValue) -> Result<IndexMap<String, f64>> {
    let map = value.as_map().context("Expected a map of timeslices")?;
    map.entries
        .iter()
        .map(|(time_slice, value)| {
            let first = AnnualValue::from_value(value)?
                .first()
                .with_context(|| format!("No values for timeslice {time_slice}"))?;
            Ok((time_slice.to_string(), first))
        })
        .collect()
}

/// Add the temporality entity and write demand profiles and availabilities as time series
pub fn process_time_slice_data(
    source: &Database,
    target: &mut Database,
    model: &str,
    mapping: &TimeSliceMapping,
    mapping_alternative: &str,
) -> Result<()> {
    let model_byname = [model.to_string()];
    target
        .ensure_entity("temporality", &model_byname)
        .context("Could not add the temporality entity to the target database")?;
    write_value(
        target,
        "temporality",
        &model_byname,
        "resolution",
        mapping_alternative,
        mapping.resolution.into(),
    );

    let year_splits = source.parameter_values(MODEL_CLASS, &model_byname, "YearSplit");
    for (alternative, year_split) in year_splits {
        let year_split = first_year_by_time_slice(year_split)
            .with_context(|| format!("Invalid YearSplit in alternative {alternative}"))?;

        for profile in &PROFILES {
            for entity in source.entities(profile.source_class) {
                let Some(value) = source.parameter_value(
                    profile.source_class,
                    &entity.byname,
                    profile.source_parameter,
                    alternative.as_str(),
                ) else {
                    continue;
                };
                let by_time_slice = first_year_by_time_slice(value).with_context(|| {
                    format!("Invalid {} of {}", profile.source_parameter, entity.name)
                })?;

                let values = mapping
                    .iter()
                    .map(|(_, time_slice)| {
                        let value = by_time_slice.get(time_slice.as_str()).with_context(|| {
                            format!(
                                "Timeslice {time_slice} missing from {} of {}",
                                profile.source_parameter, entity.name
                            )
                        })?;
                        let split = year_split
                            .get(time_slice.as_str())
                            .with_context(|| format!("No YearSplit for timeslice {time_slice}"))?;
                        ensure!(
                            *split > 0.0,
                            "YearSplit of timeslice {time_slice} is not positive"
                        );
                        Ok(round6(value / split))
                    })
                    .collect::<Result<Vec<_>>>()?;

                let series = TimeSeries::new(mapping.timestamps.clone(), values)?;
                write_value(
                    target,
                    profile.target_class,
                    &[entity.name.clone()],
                    profile.target_parameter,
                    alternative.as_str(),
                    series.into(),
                );
            }
        }
    }

    commit_or_log(target, "Added timeslice data");
    Ok(())
}
