//! The command line interface for the converter.
use crate::config::ConversionConfig;
use crate::convert::convert;
use crate::database::Database;
use crate::log;
use crate::settings::Settings;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod demo;
use demo::DemoSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the converter.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for the convert command
#[derive(Args, Default)]
pub struct ConvertOpts {
    /// CSV file mapping timestamps to timeslices (columns `datetime` and `timeslice`)
    #[arg(long)]
    pub timeslice_csv: Option<PathBuf>,
    /// Directory in which to save log files
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Convert an OSeMOSYS database into an INES database.
    Convert {
        /// Path to the source (OSeMOSYS) database.
        source: PathBuf,
        /// Path to the target (INES) database. Created if it doesn't exist.
        target: PathBuf,
        /// Path to a conversion configuration file. The bundled one is used if omitted.
        config: Option<PathBuf>,
        /// Other convert options
        #[command(flatten)]
        opts: ConvertOpts,
    },
    /// Manage demo models.
    Demo {
        /// The available subcommands for managing demo models.
        #[command(subcommand)]
        subcommand: DemoSubcommands,
    },
    /// Manage the program settings file.
    Settings {
        /// The available subcommands for managing the settings file.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Convert {
                source,
                target,
                config,
                opts,
            } => handle_convert_command(&source, &target, config.as_deref(), &opts, None),
            Self::Demo { subcommand } => subcommand.execute(),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and run the converter
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ ines-osemosys --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Handle the `convert` command.
///
/// The committed contents of the target database are saved even if the conversion fails part-way.
pub fn handle_convert_command(
    source_path: &Path,
    target_path: &Path,
    config_path: Option<&Path>,
    opts: &ConvertOpts,
    settings: Option<Settings>,
) -> Result<()> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    log::init(&settings.log_level, opts.log_dir.as_deref())
        .context("Failed to initialise logging.")?;

    let source = Database::from_path(source_path).context("Failed to load source database.")?;
    info!("Loaded source database from {}", source_path.display());

    let mut target = if target_path.exists() {
        info!("Existing contents of {} will be replaced", target_path.display());
        Database::from_path(target_path).context("Failed to load target database.")?
    } else {
        info!("Creating new INES database at {}", target_path.display());
        Database::ines_template()?
    };

    let config = if let Some(config_path) = config_path {
        info!("Using conversion configuration {}", config_path.display());
        ConversionConfig::from_path(config_path)
            .context("Failed to load conversion configuration.")?
    } else {
        ConversionConfig::bundled()?
    };

    let result = convert(
        &source,
        &mut target,
        &config,
        opts.timeslice_csv.as_deref(),
    );
    if result.is_err() {
        warn!("Conversion failed; saving the stages which completed");
    }
    target
        .save(target_path, settings.pretty_print)
        .with_context(|| format!("Failed to save {}", target_path.display()))?;
    result?;
    info!("Conversion complete!");

    Ok(())
}
