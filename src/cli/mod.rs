//! CLI module - Command definitions and handlers

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod browse;
pub mod config;
pub mod console;
pub mod init;
pub mod request;
pub mod utils;

/// apiscope - explore the ORATS data API
///
/// Browse the endpoint catalog, build request URLs and code snippets, and
/// preview responses.
#[derive(Parser, Debug)]
#[command(name = "apiscope")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, env = "APISCOPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Catalog JSON file (default: bundled ORATS catalog)
    #[arg(long, global = true, env = "APISCOPE_CATALOG")]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a config file
    Init(init::InitArgs),

    /// List APIs in the catalog
    Apis(browse::ApisArgs),

    /// List endpoints of an API
    Endpoints(browse::EndpointsArgs),

    /// Show the parameters of an endpoint
    Show(browse::ShowArgs),

    /// Print the request URL for an endpoint
    Query(request::QueryArgs),

    /// Print request code for an endpoint
    Snippet(request::SnippetArgs),

    /// Suggest values for an endpoint's `fields` parameter
    Fields(request::FieldsArgs),

    /// Execute a request and preview the response
    Fetch(request::FetchArgs),

    /// Interactive request builder
    Console(console::ConsoleArgs),

    /// Get or set configuration
    Config(config::ConfigArgs),
}
