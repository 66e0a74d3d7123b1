//! Fixtures for tests

use crate::database::{ByName, Database};
use crate::value::{Duration, Map, MapIndex, ParameterValue, parse_datetime};
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Make a byname from string slices
pub fn byname(names: &[&str]) -> ByName {
    names.iter().map(|name| (*name).to_string()).collect()
}

/// A map of years to numbers
pub fn year_map(values: &[(&str, f64)]) -> ParameterValue {
    Map::new(
        None,
        values
            .iter()
            .map(|(year, value)| (MapIndex::from(*year), ParameterValue::Float(*value))),
    )
    .into()
}

/// A map with one mode of operation holding a map of years to numbers
pub fn mode_map(values: &[(&str, f64)]) -> ParameterValue {
    Map::new(None, [(MapIndex::from("1"), year_map(values))]).into()
}

/// A map of timeslices to maps of years to numbers
pub fn time_slice_map(values: &[(&str, f64)]) -> ParameterValue {
    Map::new(
        None,
        values.iter().map(|(time_slice, value)| {
            (
                MapIndex::from(*time_slice),
                year_map(&[("2020", *value), ("2021", *value)]),
            )
        }),
    )
    .into()
}

/// Build the model's `timeslices_to_time` value from timestamps and timeslices
pub fn time_slices_to_time(rows: &[(&str, &str)], hours: i64) -> ParameterValue {
    Map::new(
        None,
        rows.iter().map(|(timestamp, time_slice)| {
            let inner = Map::new(
                None,
                [(
                    MapIndex::from(*time_slice),
                    ParameterValue::Duration(Duration::hours(hours)),
                )],
            );
            (
                MapIndex::DateTime(parse_datetime(timestamp).unwrap()),
                inner.into(),
            )
        }),
    )
    .into()
}

fn add_value(
    db: &mut Database,
    class: &str,
    names: &[&str],
    parameter: &str,
    value: ParameterValue,
) {
    db.add_parameter_value(class, &byname(names), parameter, "base", value)
        .unwrap();
}

/// An OSeMOSYS model with a gas power plant, a gas import and electricity demand over two years
/// and two timeslices
#[fixture]
pub fn osemosys_db() -> Database {
    let mut db = Database::new();
    for class in ["model", "REGION", "TECHNOLOGY", "FUEL", "EMISSION", "YEAR"] {
        db.add_entity_class::<&str>(class, &[]).unwrap();
    }
    db.add_entity_class("REGION__FUEL", &["REGION", "FUEL"])
        .unwrap();
    db.add_entity_class("REGION__TECHNOLOGY", &["REGION", "TECHNOLOGY"])
        .unwrap();
    db.add_entity_class("REGION__TECHNOLOGY__FUEL", &["REGION", "TECHNOLOGY", "FUEL"])
        .unwrap();
    db.add_entity_class(
        "REGION__TECHNOLOGY__EMISSION",
        &["REGION", "TECHNOLOGY", "EMISSION"],
    )
    .unwrap();
    db.add_alternative("base").unwrap();

    let entities: [(&str, &[&str]); 15] = [
        ("model", &["utopia"]),
        ("REGION", &["R1"]),
        ("TECHNOLOGY", &["GASPLANT"]),
        ("TECHNOLOGY", &["GASIMPORT"]),
        ("FUEL", &["GAS"]),
        ("FUEL", &["ELC"]),
        ("EMISSION", &["CO2"]),
        ("YEAR", &["2020"]),
        ("YEAR", &["2021"]),
        ("REGION__FUEL", &["R1", "GAS"]),
        ("REGION__FUEL", &["R1", "ELC"]),
        ("REGION__TECHNOLOGY", &["R1", "GASPLANT"]),
        ("REGION__TECHNOLOGY", &["R1", "GASIMPORT"]),
        ("REGION__TECHNOLOGY__FUEL", &["R1", "GASPLANT", "GAS"]),
        ("REGION__TECHNOLOGY__FUEL", &["R1", "GASPLANT", "ELC"]),
    ];
    for (class, names) in entities {
        db.add_entity(class, names).unwrap();
    }
    db.add_entity("REGION__TECHNOLOGY__FUEL", &["R1", "GASIMPORT", "GAS"])
        .unwrap();
    db.add_entity("REGION__TECHNOLOGY__EMISSION", &["R1", "GASPLANT", "CO2"])
        .unwrap();

    add_value(
        &mut db,
        "model",
        &["utopia"],
        "timeslices_to_time",
        time_slices_to_time(
            &[("2020-01-01T00:00:00", "NIGHT"), ("2020-01-01T12:00:00", "DAY")],
            12,
        ),
    );
    add_value(
        &mut db,
        "model",
        &["utopia"],
        "YearSplit",
        time_slice_map(&[("NIGHT", 0.5), ("DAY", 0.5)]),
    );

    add_value(
        &mut db,
        "REGION__FUEL",
        &["R1", "ELC"],
        "SpecifiedAnnualDemand",
        year_map(&[("2020", 1.0), ("2021", 1.1)]),
    );
    add_value(
        &mut db,
        "REGION__FUEL",
        &["R1", "ELC"],
        "SpecifiedDemandProfile",
        time_slice_map(&[("NIGHT", 0.4), ("DAY", 0.6)]),
    );

    let plant = &["R1", "GASPLANT"];
    add_value(
        &mut db,
        "REGION__TECHNOLOGY",
        plant,
        "CapacityFactor",
        time_slice_map(&[("NIGHT", 0.9), ("DAY", 0.8)]),
    );
    add_value(
        &mut db,
        "REGION__TECHNOLOGY",
        plant,
        "ResidualCapacity",
        year_map(&[("2020", 0.5), ("2021", 0.5)]),
    );
    add_value(
        &mut db,
        "REGION__TECHNOLOGY",
        plant,
        "CapitalCost",
        year_map(&[("2020", 1000.0), ("2021", 900.0)]),
    );
    add_value(&mut db, "REGION__TECHNOLOGY", plant, "FixedCost", 20.0.into());
    add_value(
        &mut db,
        "REGION__TECHNOLOGY",
        plant,
        "VariableCost",
        mode_map(&[("2020", 3.0), ("2021", 3.0)]),
    );
    add_value(&mut db, "REGION__TECHNOLOGY", plant, "OperationalLife", 30.0.into());
    add_value(
        &mut db,
        "REGION__TECHNOLOGY__FUEL",
        &["R1", "GASPLANT", "GAS"],
        "InputActivityRatio",
        mode_map(&[("2020", 2.0), ("2021", 2.0)]),
    );
    add_value(
        &mut db,
        "REGION__TECHNOLOGY__FUEL",
        &["R1", "GASPLANT", "ELC"],
        "OutputActivityRatio",
        mode_map(&[("2020", 1.0), ("2021", 1.0)]),
    );
    add_value(
        &mut db,
        "REGION__TECHNOLOGY__EMISSION",
        &["R1", "GASPLANT", "CO2"],
        "EmissionActivityRatio",
        mode_map(&[("2020", 0.05), ("2021", 0.05)]),
    );

    let import = &["R1", "GASIMPORT"];
    add_value(
        &mut db,
        "REGION__TECHNOLOGY__FUEL",
        &["R1", "GASIMPORT", "GAS"],
        "OutputActivityRatio",
        1.0.into(),
    );
    add_value(
        &mut db,
        "REGION__TECHNOLOGY",
        import,
        "VariableCost",
        mode_map(&[("2020", 5.0), ("2021", 5.0)]),
    );

    db.commit("Source data").unwrap();
    db
}

/// An empty INES database
#[fixture]
pub fn ines_db() -> Database {
    Database::ines_template().unwrap()
}
