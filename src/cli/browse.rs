//! `apiscope apis`, `apiscope endpoints` and `apiscope show` commands
//!
//! Browse the endpoint catalog.
//!
//! # Usage
//! ```bash
//! apiscope apis
//! apiscope endpoints --api "Data API (Delayed)"
//! apiscope show --api "Data API (Delayed)" --endpoint Strikes
//! apiscope show -a "Data API (Live)" -e Strikes --format json
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::utils::{param_label, CliContext, EndpointArgs};
use crate::core::catalog::{Api, Endpoint};

#[derive(Args, Debug)]
pub struct ApisArgs {
    /// Output format (pretty, json, compact)
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

#[derive(Tabled)]
struct ApiRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "API")]
    name: String,
    #[tabled(rename = "Endpoints")]
    endpoints: usize,
}

pub fn run_apis(args: ApisArgs, ctx: &CliContext) -> Result<()> {
    let catalog = ctx.config.load_catalog(ctx.catalog_path.as_deref())?;

    match args.format.as_str() {
        "json" => {
            let names: Vec<&str> = catalog.apis.iter().map(|a| a.name.as_str()).collect();
            println!("{}", serde_json::to_string_pretty(&names)?);
        }
        "compact" => {
            for api in &catalog.apis {
                println!("{}\t{}", api.name, api.endpoints.len());
            }
        }
        _ => {
            let rows: Vec<ApiRow> = catalog
                .apis
                .iter()
                .enumerate()
                .map(|(i, api)| ApiRow {
                    index: i + 1,
                    name: api.name.clone(),
                    endpoints: api.endpoints.len(),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
            println!("Base URL: {}", catalog.base_url.cyan());
        }
    }

    Ok(())
}

#[derive(Args, Debug)]
pub struct EndpointsArgs {
    /// API name (default: console.default_api, else the second API)
    #[arg(short, long)]
    pub api: Option<String>,

    /// Output format (pretty, json, compact)
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

#[derive(Tabled)]
struct EndpointRow {
    #[tabled(rename = "Endpoint")]
    name: String,
    #[tabled(rename = "Method")]
    method: String,
    #[tabled(rename = "Output")]
    format: String,
    #[tabled(rename = "Path")]
    path: String,
}

pub fn run_endpoints(args: EndpointsArgs, ctx: &CliContext) -> Result<()> {
    let session = ctx.session(&EndpointArgs {
        api: args.api,
        ..Default::default()
    })?;
    let api = session.selected_api();

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&api.endpoints)?),
        "compact" => {
            for endpoint in &api.endpoints {
                println!("{}\t{}\t{}", endpoint.name, endpoint.output_format, endpoint.path);
            }
        }
        _ => print_endpoints(api),
    }

    Ok(())
}

pub(crate) fn print_endpoints(api: &Api) {
    let rows: Vec<EndpointRow> = api
        .endpoints
        .iter()
        .map(|e| EndpointRow {
            name: e.name.clone(),
            method: e.method.to_string(),
            format: e.output_format.to_string(),
            path: e.path.clone(),
        })
        .collect();

    println!("{}", api.name.cyan().bold());
    println!("{}", Table::new(rows).with(Style::rounded()));
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    #[command(flatten)]
    pub target: EndpointArgs,

    /// Output format (pretty, json)
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

#[derive(Tabled)]
struct ParamRow {
    #[tabled(rename = "Parameter")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Example")]
    placeholder: String,
    #[tabled(rename = "Description")]
    description: String,
}

pub fn run_show(args: ShowArgs, ctx: &CliContext) -> Result<()> {
    let session = ctx.session(&args.target)?;
    let endpoint = session.selected_endpoint();

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(endpoint)?);
        return Ok(());
    }

    print_endpoint(endpoint);
    println!("\n{}", session.query());
    Ok(())
}

pub(crate) fn print_endpoint(endpoint: &Endpoint) {
    println!(
        "{} {} {}",
        endpoint.method.to_string().green().bold(),
        endpoint.name.bold(),
        format!("({})", endpoint.output_format).dimmed()
    );
    println!("{}", endpoint.path);
    if let Some(docs) = &endpoint.docs_url {
        println!("{} {}", "Docs:".dimmed(), docs);
    }

    let rows: Vec<ParamRow> = endpoint
        .parameters
        .iter()
        .map(|p| ParamRow {
            name: param_label(&p.name, p.required),
            value: p.value.clone(),
            placeholder: p.placeholder.clone(),
            description: p.description.clone(),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
    println!("{}", "* required".dimmed());
}
