//! `apiscope init` command
//!
//! Writes a default config file.
//!
//! # Usage
//! ```bash
//! apiscope init                    # ./.apiscope/config.toml
//! apiscope init /path/to/project   # /path/to/project/.apiscope/config.toml
//! apiscope init --global           # ~/.apiscope/config.toml
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;

use crate::config::{home_dir, Config, CONFIG_DIR};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    pub path: Option<PathBuf>,

    /// Initialize the global config (~/.apiscope)
    #[arg(long)]
    pub global: bool,

    /// Overwrite an existing config file
    #[arg(short, long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let base_path = if args.global {
        home_dir().unwrap_or_else(|| PathBuf::from("."))
    } else {
        args.path.unwrap_or_else(|| PathBuf::from("."))
    };

    let config_path = init_at(&base_path, args.force)?;

    println!("{} Initialized apiscope config", "✓".green());
    println!("   Config: {}", config_path.display());
    println!("\nNext steps:");
    println!("  apiscope config api.token <TOKEN>");
    println!("  apiscope apis");
    println!("  apiscope console");
    Ok(())
}

/// Write `<base>/.apiscope/config.toml` with default values
fn init_at(base_path: &Path, force: bool) -> Result<PathBuf> {
    let config_path = base_path.join(CONFIG_DIR).join("config.toml");

    if config_path.exists() && !force {
        bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    Config::default().save_to(&config_path)?;
    Ok(config_path)
}
