use human_panic::{metadata, setup_panic};
use ines_osemosys::ISSUES_URL;
use ines_osemosys::cli::run_cli;
use ines_osemosys::log::is_logger_initialised;
use log::error;

fn main() {
    setup_panic!(metadata!().support(format!("Open an issue on Github: {ISSUES_URL}/new")));

    if let Err(err) = run_cli() {
        if is_logger_initialised() {
            error!("{err:?}");
        } else {
            eprintln!("Error: {err:?}");
        }

        // Terminate program, signalling an error
        std::process::exit(1);
    }
}
