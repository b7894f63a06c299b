//! apiscope CLI - Entry point
//!
//! Usage: apiscope <command> [options]

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use apiscope::cli::utils::CliContext;
use apiscope::cli::{browse, config, console, init, request, Cli, Commands};
use apiscope::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; --verbose only changes the default level
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let context = || -> Result<CliContext> {
        let config = Config::load_with(cli.config.as_deref())?;
        Ok(CliContext::new(config, cli.catalog.clone()))
    };

    match cli.command {
        Commands::Init(args) => init::run(args),
        Commands::Config(args) => config::run(args, cli.config.as_deref()),
        Commands::Apis(args) => browse::run_apis(args, &context()?),
        Commands::Endpoints(args) => browse::run_endpoints(args, &context()?),
        Commands::Show(args) => browse::run_show(args, &context()?),
        Commands::Query(args) => request::run_query(args, &context()?),
        Commands::Snippet(args) => request::run_snippet(args, &context()?),
        Commands::Fields(args) => request::run_fields(args, &context()?),
        Commands::Fetch(args) => request::run_fetch_cmd(args, &context()?).await,
        Commands::Console(args) => console::run(args, &context()?).await,
    }
}
