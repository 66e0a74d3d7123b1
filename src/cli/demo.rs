//! The bundled demo models and the CLI commands for working with them.
use super::{ConvertOpts, handle_convert_command};
use crate::settings::Settings;
use anyhow::{Context, Result, bail, ensure};
use clap::Subcommand;
use include_dir::{Dir, DirEntry, include_dir};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// The directory containing the demo models.
static DEMOS_DIR: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/demos");

/// The source database of each demo
const DEMO_SOURCE_FILE_NAME: &str = "osemosys.json";

/// An optional conversion configuration in a demo
const DEMO_CONFIG_FILE_NAME: &str = "config.toml";

/// An optional timeslice mapping in a demo
const DEMO_TIME_SLICE_FILE_NAME: &str = "timeslices.csv";

/// The available subcommands for managing demo models.
#[derive(Subcommand)]
pub enum DemoSubcommands {
    /// List available demos.
    List,
    /// Provide information about the specified demo.
    Info {
        /// The name of the demo.
        name: String,
    },
    /// Extract a demo model to a new directory.
    Extract {
        /// The name of the demo to extract.
        name: String,
        /// The destination folder for the demo.
        new_path: Option<PathBuf>,
    },
    /// Convert a demo model.
    Run {
        /// The name of the demo to convert.
        name: String,
        /// Path to the target (INES) database.
        target: PathBuf,
        /// Directory in which to save log files
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },
}

impl DemoSubcommands {
    /// Execute the supplied demo subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::List => handle_demo_list_command(),
            Self::Info { name } => handle_demo_info_command(&name)?,
            Self::Extract { name, new_path } => {
                handle_demo_extract_command(&name, new_path.as_deref())?;
            }
            Self::Run {
                name,
                target,
                log_dir,
            } => handle_demo_run_command(&name, &target, log_dir, None)?,
        }

        Ok(())
    }
}

/// The names of the bundled demos
pub fn demo_names() -> impl Iterator<Item = &'static str> {
    DEMOS_DIR
        .dirs()
        .filter_map(|dir| dir.path().file_name()?.to_str())
}

/// Handle the `demo list` command.
fn handle_demo_list_command() {
    for name in demo_names() {
        println!("{name}");
    }
}

/// Handle the `demo info` command.
fn handle_demo_info_command(name: &str) -> Result<()> {
    let path: PathBuf = [name, "README.txt"].iter().collect();
    let readme = DEMOS_DIR
        .get_file(path)
        .context("Demo not found.")?
        .contents_utf8()
        .context("README.txt is not UTF-8 encoded")?;

    println!("{readme}");

    Ok(())
}

/// Handle the `demo extract` command
fn handle_demo_extract_command(name: &str, dest: Option<&Path>) -> Result<()> {
    let dest = dest.unwrap_or(Path::new(name));
    extract_demo(name, dest)
}

/// Extract the specified demo to a new directory
pub fn extract_demo(name: &str, new_path: &Path) -> Result<()> {
    let sub_dir = DEMOS_DIR.get_dir(name).context("Demo not found.")?;

    ensure!(
        !new_path.exists(),
        "Destination directory {} already exists",
        new_path.display()
    );

    fs::create_dir(new_path)?;
    for entry in sub_dir.entries() {
        let DirEntry::File(file) = entry else {
            bail!("Subdirectories in demos are not supported");
        };
        let file_name = file
            .path()
            .file_name()
            .context("Demo file has no name")?;
        fs::write(new_path.join(file_name), file.contents())?;
    }

    Ok(())
}

/// Handle the `demo run` command.
///
/// The demo's optional `config.toml` and `timeslices.csv` are used if present.
pub fn handle_demo_run_command(
    name: &str,
    target_path: &Path,
    log_dir: Option<PathBuf>,
    settings: Option<Settings>,
) -> Result<()> {
    let temp_dir = TempDir::new().context("Failed to create temporary directory.")?;
    let demo_path = temp_dir.path().join(name);
    extract_demo(name, &demo_path)?;

    let config_path = demo_path.join(DEMO_CONFIG_FILE_NAME);
    let time_slice_path = demo_path.join(DEMO_TIME_SLICE_FILE_NAME);
    let opts = ConvertOpts {
        timeslice_csv: time_slice_path.is_file().then_some(time_slice_path),
        log_dir,
    };
    handle_convert_command(
        &demo_path.join(DEMO_SOURCE_FILE_NAME),
        target_path,
        config_path.is_file().then_some(config_path.as_path()),
        &opts,
        settings,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::fixture::assert_error;
    use tempfile::tempdir;

    #[test]
    fn test_demo_names() {
        assert!(demo_names().any(|name| name == "simple"));
    }

    #[test]
    fn test_demos_are_valid() {
        for name in demo_names() {
            let path: PathBuf = [name, DEMO_SOURCE_FILE_NAME].iter().collect();
            let file = DEMOS_DIR.get_file(path).unwrap();
            let dir = tempdir().unwrap();
            let file_path = dir.path().join(DEMO_SOURCE_FILE_NAME);
            fs::write(&file_path, file.contents()).unwrap();
            assert!(Database::from_path(&file_path).is_ok(), "Invalid demo {name}");
        }
    }

    #[test]
    fn test_extract_demo() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("simple");
        extract_demo("simple", &dest).unwrap();
        assert!(dest.join(DEMO_SOURCE_FILE_NAME).is_file());
        assert!(dest.join("README.txt").is_file());

        assert_error!(
            extract_demo("simple", &dest),
            format!("Destination directory {} already exists", dest.display())
        );
        assert_error!(
            extract_demo("missing", &dir.path().join("missing")),
            "Demo not found."
        );
    }
}
