//! lawakfs - disguising read-only FUSE overlay
//!
//! Usage:
//!   lawakfs mount <source> <mount_point>  - Mount the overlay
//!   lawakfs check <source>                - Validate and print the configuration
//!   lawakfs unmount <mount_point>         - Unmount the overlay

use clap::{Parser, Subcommand};
use lawakfs::{
    config::{Config, DEFAULT_CONFIG_FILE},
    fs::{LawakFs, LawakFuse},
    Error, Result,
};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lawakfs")]
#[command(author = "lawakfs Contributors")]
#[command(version)]
#[command(about = "Read-only FUSE overlay with hidden extensions, censored text and a time-gated secret file")]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mount the overlay
    Mount {
        /// Directory to present
        source: PathBuf,

        /// Mount point directory
        mount_point: PathBuf,

        /// Allow other users to access the mount
        #[arg(long)]
        allow_other: bool,
    },

    /// Validate the configuration and print it as JSON
    Check {
        /// Directory to present
        source: PathBuf,
    },

    /// Unmount the overlay
    Unmount {
        /// Mount point to unmount
        mount_point: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Setup logging, RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Err(e) = run_command(cli.command, cli.config.as_deref()) {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_command(command: Commands, config_path: Option<&Path>) -> Result<()> {
    match command {
        Commands::Mount {
            source,
            mount_point,
            allow_other,
        } => cmd_mount(config_path, &source, &mount_point, allow_other),

        Commands::Check { source } => cmd_check(config_path, &source),

        Commands::Unmount { mount_point } => cmd_unmount(&mount_point),
    }
}

/// Load the configuration for `source`
///
/// An explicit `--config` must exist. Otherwise `./lawak.conf` and then
/// `<config_dir>/lawakfs/lawak.conf` are tried, falling back to defaults.
fn load_config(config_path: Option<&Path>, source: &Path) -> Result<Config> {
    let config = match config_path {
        Some(path) => Config::load(path)?,
        None => match default_config_path() {
            Some(path) => {
                info!("Loading configuration from {:?}", path);
                Config::load(path)?
            }
            None => {
                warn!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                let mut config = Config::default();
                config.apply_env_overrides();
                config
            }
        },
    };

    let config = config.with_source_root(source)?;
    config.validate()?;

    info!(
        "Configuration loaded ({} filters) secret={:?} hours={:02}-{:02}",
        config.filter_words.len(),
        config.secret_basename,
        config.access_window.start,
        config.access_window.end
    );

    Ok(config)
}

fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("lawakfs").join(DEFAULT_CONFIG_FILE))
        .filter(|path| path.is_file())
}

fn cmd_mount(
    config_path: Option<&Path>,
    source: &Path,
    mount_point: &Path,
    allow_other: bool,
) -> Result<()> {
    let mut config = load_config(config_path, source)?;
    config.mount.mount_point = mount_point.to_path_buf();
    config.mount.allow_other = allow_other;

    if !mount_point.is_dir() {
        return Err(Error::PathNotFound(mount_point.to_string_lossy().to_string()));
    }

    info!("Starting lawakfs over {:?}...", config.source_root);
    info!("Audit log: {:?}", config.log_path);

    let mut options = vec![
        fuser::MountOption::RO,
        fuser::MountOption::FSName(config.mount.fs_name.clone()),
        fuser::MountOption::AutoUnmount,
    ];

    if config.mount.allow_other {
        options.push(fuser::MountOption::AllowOther);
    }

    let fs = LawakFuse::new(LawakFs::new(config)?);

    info!("Mounting at {:?}", mount_point);
    fuser::mount2(fs, mount_point, &options).map_err(Error::Io)?;

    info!("Unmounted {:?}", mount_point);
    Ok(())
}

fn cmd_check(config_path: Option<&Path>, source: &Path) -> Result<()> {
    let config = load_config(config_path, source)?;
    println!("{}", config.to_json_pretty()?);
    Ok(())
}

fn cmd_unmount(mount_point: &Path) -> Result<()> {
    info!("Unmounting {:?}...", mount_point);

    #[cfg(target_os = "linux")]
    let output = std::process::Command::new("fusermount")
        .arg("-u")
        .arg(mount_point)
        .output()?;

    #[cfg(not(target_os = "linux"))]
    let output = std::process::Command::new("umount")
        .arg(mount_point)
        .output()?;

    if output.status.success() {
        info!("Unmounted successfully");
        Ok(())
    } else {
        Err(Error::Internal(format!(
            "Failed to unmount: {}",
            String::from_utf8_lossy(&output.stderr)
        )))
    }
}
