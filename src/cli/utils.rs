//! CLI utility functions
//!
//! Shared by the commands that work on one endpoint:
//! - endpoint targeting arguments (`--api`, `--endpoint`, `-p name=value`)
//! - opening a [`Session`] from config + arguments

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;

use crate::config::Config;
use crate::core::session::{Session, SessionOptions};
use crate::core::snippet::SnippetSyntax;

/// Loaded config plus global flags
#[derive(Debug, Clone)]
pub struct CliContext {
    pub config: Config,
    pub catalog_path: Option<PathBuf>,
}

impl CliContext {
    pub fn new(config: Config, catalog_path: Option<PathBuf>) -> Self {
        Self {
            config,
            catalog_path,
        }
    }

    /// Open a session for the targeted endpoint with overrides applied
    pub fn session(&self, target: &EndpointArgs) -> Result<Session> {
        let catalog = self.config.load_catalog(self.catalog_path.as_deref())?;
        let console = &self.config.console;

        // A configured default endpoint only applies to the configured default API.
        let (api, endpoint) = match &target.api {
            Some(api) => (Some(api.clone()), target.endpoint.clone()),
            None => (
                console.default_api.clone(),
                target.endpoint.clone().or_else(|| console.default_endpoint.clone()),
            ),
        };

        let mut session = Session::new(
            catalog,
            SessionOptions {
                api,
                endpoint,
                token: target
                    .token
                    .clone()
                    .unwrap_or_else(|| self.config.api.token.clone()),
                syntax: console.syntax,
                preview: self.config.preview.settings(),
            },
        )?;

        for raw in &target.params {
            let (name, value) = parse_assignment(raw)?;
            session.set_param(name, value)?;
        }
        Ok(session)
    }
}

/// Which endpoint a command works on
#[derive(Args, Debug, Clone, Default)]
pub struct EndpointArgs {
    /// API name (default: console.default_api, else the second API)
    #[arg(short, long)]
    pub api: Option<String>,

    /// Endpoint name (default: first endpoint of the API)
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Parameter value, repeatable (e.g. -p ticker=MSFT -p dte=30,45)
    #[arg(short = 'p', long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,

    /// API token (overrides config and APISCOPE_TOKEN)
    #[arg(long)]
    pub token: Option<String>,
}

/// Split `name=value`. The value may be empty or contain `=`.
pub fn parse_assignment(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value)),
        _ => bail!("Invalid parameter '{}'. Expected NAME=VALUE.", raw),
    }
}

/// Label with a required marker
pub fn param_label(name: &str, required: bool) -> String {
    if required {
        format!("{}*", name)
    } else {
        name.to_string()
    }
}

/// Syntax from the flag, else from config
pub fn resolve_syntax(flag: Option<SnippetSyntax>, config: &Config) -> SnippetSyntax {
    flag.unwrap_or(config.console.syntax)
}
