//! `apiscope query`, `snippet`, `fields` and `fetch` commands
//!
//! Build and execute requests for one endpoint.
//!
//! # Usage
//! ```bash
//! apiscope query -a "Data API (Delayed)" -e Strikes -p ticker=msft -p dte=30,45
//! apiscope snippet -a "Data API (Delayed)" -e Strikes --syntax python
//! apiscope fields -a "Data API (Delayed)" -e Strikes "ticker,trade"
//! apiscope fetch -a "Data API (Delayed)" -e Tickers --full
//! apiscope fetch -e "Strikes Chain"          # CSV, saved to Downloads
//! ```

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;

use super::utils::{resolve_syntax, CliContext, EndpointArgs};
use crate::core::editor::FIELDS;
use crate::core::fetch::{perform_download, run_fetch, Download, FileSaver, HttpFetcher};
use crate::core::preview::{Completion, CsvAction, ResponseState, ERROR_MESSAGE};
use crate::core::session::Session;
use crate::core::snippet::SnippetSyntax;
use crate::remote::{DiskSaver, ReqwestFetcher};

#[derive(Args, Debug)]
pub struct QueryArgs {
    #[command(flatten)]
    pub target: EndpointArgs,
}

pub fn run_query(args: QueryArgs, ctx: &CliContext) -> Result<()> {
    let session = ctx.session(&args.target)?;
    println!("{}", session.query());
    Ok(())
}

#[derive(Args, Debug)]
pub struct SnippetArgs {
    #[command(flatten)]
    pub target: EndpointArgs,

    /// Target syntax (default: console.syntax)
    #[arg(short, long, value_enum)]
    pub syntax: Option<SnippetSyntax>,
}

pub fn run_snippet(args: SnippetArgs, ctx: &CliContext) -> Result<()> {
    let mut session = ctx.session(&args.target)?;
    session.set_syntax(resolve_syntax(args.syntax, &ctx.config));
    println!("{}", session.snippet());
    Ok(())
}

#[derive(Args, Debug)]
pub struct FieldsArgs {
    #[command(flatten)]
    pub target: EndpointArgs,

    /// Current `fields` text; suggestions follow its last comma segment
    #[arg(default_value = "")]
    pub input: String,

    /// Output format (pretty, compact)
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

pub fn run_fields(args: FieldsArgs, ctx: &CliContext) -> Result<()> {
    let session = ctx.session(&args.target)?;
    let endpoint = session.selected_endpoint();

    let has_definitions = endpoint
        .parameter(FIELDS)
        .is_some_and(|p| p.definitions_id.is_some());
    if !has_definitions {
        bail!("Endpoint '{}' has no field definitions", endpoint.name);
    }

    let mut editor = session.editor(FIELDS)?;
    editor.on_value_change(&args.input);

    if editor.suggestions().is_empty() {
        println!("No matching fields.");
        return Ok(());
    }

    for (i, key) in editor.suggestions().iter().enumerate() {
        let description = editor.suggestion_description(i).unwrap_or("");
        if args.format == "compact" {
            println!("{}", key);
        } else {
            println!("{:<20} {}", key.cyan(), description.dimmed());
        }
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    #[command(flatten)]
    pub target: EndpointArgs,

    /// Print the whole JSON body instead of the first window
    #[arg(long)]
    pub full: bool,
}

pub async fn run_fetch_cmd(args: FetchArgs, ctx: &CliContext) -> Result<()> {
    let mut session = ctx.session(&args.target)?;
    let fetcher = ReqwestFetcher::from_config(&ctx.config.api)?;
    let saver = DiskSaver::from_option(ctx.config.preview.download_dir.as_deref());

    eprintln!("{} {}", "GET".green().bold(), session.query());
    match fetch_once(&mut session, &fetcher, &saver).await? {
        Completion::Displayed => {
            if args.full {
                if let ResponseState::Success { body, .. } = session.response() {
                    println!("{}", body);
                }
            } else {
                print_visible(&session);
            }
            Ok(())
        }
        Completion::Failed => bail!("{}", ERROR_MESSAGE),
        Completion::Download(_) | Completion::Discarded => Ok(()),
    }
}

/// Fetch the session's current query and apply the result
pub(crate) async fn fetch_once(
    session: &mut Session,
    fetcher: &dyn HttpFetcher,
    saver: &dyn FileSaver,
) -> Result<Completion> {
    let ticket = session.begin_fetch();
    let outcome = run_fetch(fetcher, &ticket).await;
    let completion = session.complete_fetch(&ticket, outcome);

    if let Completion::Download(action) = &completion {
        report_download(saver, action.clone())?;
    }
    Ok(completion)
}

/// Carry out a CSV download and say where it went
pub(crate) fn report_download(saver: &dyn FileSaver, action: CsvAction) -> Result<()> {
    match perform_download(saver, action)? {
        Download::Saved(path) => println!("{} {}", "Saved".green(), path.display()),
        Download::Opened(url) => println!("{} {}", "Opened".green(), url),
    }
    Ok(())
}

/// Print the revealed part of the response with a hint when more is hidden
pub(crate) fn print_visible(session: &Session) {
    let Some(visible) = session.previewer().visible() else {
        return;
    };
    println!("{}", visible);

    if let ResponseState::Success { body, revealed } = session.response() {
        let hidden = body.chars().count().saturating_sub(*revealed);
        if hidden > 0 {
            println!("{}", format!("… {} more characters", hidden).dimmed());
        }
    }
}
