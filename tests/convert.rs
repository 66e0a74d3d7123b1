//! Integration tests for the `convert` command.
use ines_osemosys::cli::{ConvertOpts, handle_convert_command};
use ines_osemosys::database::Database;
use ines_osemosys::log::is_logger_initialised;
use ines_osemosys::settings::Settings;
use ines_osemosys::value::ParameterValue;
use std::path::PathBuf;
use tempfile::tempdir;

/// Get the path to the demo model's source database.
fn get_source_path() -> PathBuf {
    PathBuf::from("demos/simple/osemosys.json")
}

/// An integration test for the `convert` command.
///
/// The timeslice mapping comes from the model itself. We also check that the logger is
/// initialised after it is run.
#[test]
fn test_handle_convert_command() {
    unsafe { std::env::set_var("INES_OSEMOSYS_LOG_LEVEL", "off") };

    assert!(!is_logger_initialised());

    let dir = tempdir().unwrap();
    let target_path = dir.path().join("ines.json");
    handle_convert_command(
        &get_source_path(),
        &target_path,
        None,
        &ConvertOpts::default(),
        Some(Settings::default()),
    )
    .unwrap();

    assert!(is_logger_initialised());

    let target = Database::from_path(&target_path).unwrap();
    let alternatives: Vec<_> = target.alternatives().map(|alt| alt.as_str()).collect();
    assert_eq!(alternatives, ["base", "high_gas_price"]);

    let units: Vec<_> = target
        .entities("unit")
        .iter()
        .map(|entity| entity.name.clone())
        .collect();
    assert_eq!(units, ["R1__GASIMPORT", "R1__GASPLANT", "R1__SOLARPV"]);

    let model = vec!["simple".to_string()];
    assert!(
        target
            .parameter_value("system", &model, "timeline", "base")
            .is_some()
    );
    assert_eq!(
        target.parameter_value("solve", &model, "solve_mode", "base"),
        Some(&ParameterValue::from("single_solve"))
    );
    assert_eq!(
        target.parameter_value(
            "set",
            &["R1".to_string()],
            "depreciation_method",
            "base"
        ),
        Some(&ParameterValue::from("sinking_fund"))
    );

    // The import's variable cost becomes the price of gas in each alternative
    let gas = vec!["R1__GAS".to_string()];
    for alternative in ["base", "high_gas_price"] {
        assert!(
            target
                .parameter_value("node", &gas, "penalty_upward", alternative)
                .is_some()
        );
    }
}
