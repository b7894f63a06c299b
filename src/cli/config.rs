//! `apiscope config` command
//!
//! Get or set configuration values. Edits keep comments and layout of the
//! file (`toml_edit`), and are rejected when the result no longer loads.
//!
//! # Usage
//! ```bash
//! apiscope config                          # Show config file
//! apiscope config api.token                # Get value (file, else default)
//! apiscope config api.token "abc123"       # Set value
//! apiscope config console.syntax python --global
//! apiscope config --path
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use toml_edit::DocumentMut;

use crate::config::{home_dir, Config, CONFIG_DIR};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Config key (e.g., api.token, console.syntax, preview.reveal_step)
    pub key: Option<String>,

    /// Value to set
    pub value: Option<String>,

    /// List all config values
    #[arg(long)]
    pub list: bool,

    /// Edit config file in $EDITOR
    #[arg(short, long)]
    pub edit: bool,

    /// Show config file path
    #[arg(long)]
    pub path: bool,

    /// Use global config (~/.apiscope/config.toml) instead of local
    #[arg(short, long)]
    pub global: bool,
}

fn get_config_path(global: bool) -> PathBuf {
    if global {
        home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
            .join("config.toml")
    } else {
        Config::find_local_config().unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("config.toml"))
    }
}

/// `explicit` is the global `--config` flag; it wins over `--global`.
pub fn run(args: ConfigArgs, explicit: Option<&Path>) -> Result<()> {
    let config_path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| get_config_path(args.global));

    if args.path {
        println!("Global: {}", get_config_path(true).display());
        println!("Local:  {}", get_config_path(false).display());
        println!();
        if config_path.exists() {
            println!("{} Active: {}", "✓".green(), config_path.display());
        } else {
            println!("{} No config file found at {}", "⚠".yellow(), config_path.display());
        }
        return Ok(());
    }

    if args.edit {
        let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

        if !config_path.exists() {
            Config::default().save_to(&config_path)?;
            println!("Created {}", config_path.display());
        }

        std::process::Command::new(&editor)
            .arg(&config_path)
            .status()
            .with_context(|| format!("Failed to open editor: {}", editor))?;
        return Ok(());
    }

    if args.list || (args.key.is_none() && args.value.is_none()) {
        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            println!("Configuration ({}):\n", config_path.display());
            println!("{}", content);
        } else {
            println!("No config file at {}", config_path.display());
            println!();
            println!("Create one with:");
            println!("  apiscope init");
            println!("  apiscope config api.token <TOKEN>");
        }
        return Ok(());
    }

    if let Some(key) = &args.key {
        match &args.value {
            Some(value) => {
                set_config_value(&config_path, key, value)?;
                println!("Set {} = {} (in {})", key, value, config_path.display());
            }
            None => match get_config_value(&config_path, key)? {
                Some(v) => println!("{}", v),
                None => println!("(not set)"),
            },
        }
    }

    Ok(())
}

/// Set a `section.key` value, keeping the rest of the file intact
fn set_config_value(path: &Path, key: &str, val: &str) -> Result<()> {
    let (section, field) = split_key(key)?;

    let content = if path.exists() {
        fs::read_to_string(path)?
    } else {
        String::new()
    };
    let mut doc: DocumentMut = content.parse().context("Failed to parse config.toml")?;

    if doc.get(section).is_none() {
        doc[section] = toml_edit::table();
    }
    doc[section][field] = toml_edit::value(parse_toml_value(val));

    // Numeric-looking strings (e.g. a token) fall back to a string value.
    let mut updated = doc.to_string();
    if toml::from_str::<Config>(&updated).is_err() {
        doc[section][field] = toml_edit::value(val);
        updated = doc.to_string();
    }
    toml::from_str::<Config>(&updated)
        .with_context(|| format!("Invalid value for {}: {}", key, val))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, updated)?;
    Ok(())
}

/// Value from the file, else the effective default
fn get_config_value(path: &Path, key: &str) -> Result<Option<String>> {
    let (section, field) = split_key(key)?;

    let config = if path.exists() {
        Config::load_from(path)?
    } else {
        Config::default()
    };
    let doc = toml::Value::try_from(&config)?;

    Ok(doc.get(section).and_then(|t| t.get(field)).map(|v| match v {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }))
}

fn split_key(key: &str) -> Result<(&str, &str)> {
    match key.split('.').collect::<Vec<_>>().as_slice() {
        [section, field] if !section.is_empty() && !field.is_empty() => Ok((*section, *field)),
        _ => bail!("Invalid key '{}'. Expected section.key (e.g. api.token)", key),
    }
}

/// Parse string value to appropriate TOML type
fn parse_toml_value(s: &str) -> toml_edit::Value {
    if let Ok(b) = s.parse::<bool>() {
        return b.into();
    }
    if let Ok(i) = s.parse::<i64>() {
        return i.into();
    }
    if let Ok(f) = s.parse::<f64>() {
        return f.into();
    }
    s.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");

        set_config_value(&path, "api.token", "abc123")?;
        set_config_value(&path, "preview.reveal_step", "800")?;

        assert_eq!(get_config_value(&path, "api.token")?.as_deref(), Some("abc123"));
        assert_eq!(get_config_value(&path, "preview.reveal_step")?.as_deref(), Some("800"));
        assert_eq!(Config::load_from(&path)?.preview.reveal_step, 800);
        Ok(())
    }

    #[test]
    fn test_get_falls_back_to_default() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        assert_eq!(get_config_value(&path, "api.timeout_secs")?.as_deref(), Some("60"));
        assert_eq!(get_config_value(&path, "console.syntax")?.as_deref(), Some("curl"));
        assert_eq!(get_config_value(&path, "api.base_url")?, None);
        Ok(())
    }

    #[test]
    fn test_set_keeps_comments() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "# my settings\n[console]\nsyntax = \"php\"\n")?;

        set_config_value(&path, "console.syntax", "python")?;
        let content = fs::read_to_string(&path)?;
        assert!(content.starts_with("# my settings"));
        assert!(content.contains("syntax = \"python\""));
        Ok(())
    }

    #[test]
    fn test_invalid_value_is_rejected() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");

        assert!(set_config_value(&path, "console.syntax", "cobol").is_err());
        assert!(set_config_value(&path, "preview.reveal_step", "lots").is_err());
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn test_numeric_token_stays_a_string() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        set_config_value(&path, "api.token", "12345")?;
        assert_eq!(Config::load_from(&path)?.api.token, "12345");
        Ok(())
    }

    #[test]
    fn test_key_shape() {
        assert!(split_key("api.token").is_ok());
        assert!(split_key("token").is_err());
        assert!(split_key("a.b.c").is_err());
        assert!(split_key("api.").is_err());
    }
}
