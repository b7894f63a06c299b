//! `apiscope console` - interactive request builder
//!
//! A line-oriented console over one [`Session`]. Parameter edits go through
//! a single open [`ParameterEditor`], so `fields` suggestions and keyboard
//! navigation behave as in a form.
//!
//! # Usage
//! ```bash
//! apiscope console
//! apiscope console -a "Data API (Delayed)" -e Strikes --syntax python
//! printf 'set ticker msft\nurl\n' | apiscope console   # scripted
//! ```

use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use dialoguer::{Input, Select};
use tokio::task::{JoinError, JoinHandle};

use super::browse::{print_endpoint, print_endpoints};
use super::request::{print_visible, report_download};
use super::utils::{param_label, resolve_syntax, CliContext, EndpointArgs};
use crate::core::editor::{Key, KeyOutcome, ParameterEditor};
use crate::core::fetch::{run_fetch, FileSaver, HttpFetcher};
use crate::core::preview::{Completion, FetchOutcome, FetchTicket, ResponseState, ERROR_MESSAGE};
use crate::core::session::Session;
use crate::core::snippet::SnippetSyntax;
use crate::remote::{DiskSaver, ReqwestFetcher};

#[derive(Args, Debug)]
pub struct ConsoleArgs {
    #[command(flatten)]
    pub target: EndpointArgs,

    /// Initial snippet syntax (default: console.syntax)
    #[arg(short, long, value_enum)]
    pub syntax: Option<SnippetSyntax>,
}

pub async fn run(args: ConsoleArgs, ctx: &CliContext) -> Result<()> {
    let mut session = ctx.session(&args.target)?;
    session.set_syntax(resolve_syntax(args.syntax, &ctx.config));

    let mut console = Console {
        session,
        active: None,
        fetcher: Arc::new(ReqwestFetcher::from_config(&ctx.config.api)?),
        saver: Box::new(DiskSaver::from_option(ctx.config.preview.download_dir.as_deref())),
        in_flight: None,
        interactive: io::stdin().is_terminal(),
    };
    console.run().await
}

// ============== Commands ==============

/// One parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Apis,
    Api(Option<String>),
    Endpoints,
    Endpoint(Option<String>),
    Params,
    Set { param: String, value: String },
    Key { param: String, key: Key },
    Pick { param: String, index: Option<usize> },
    Token(Option<String>),
    Syntax(Option<String>),
    Url,
    Code,
    Preview,
    Fetch,
    More,
    Response,
    Reset,
    Clear,
    Quit,
    Empty,
}

/// Parse a console line. Names may contain spaces; they take the rest of the line.
pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Empty);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let rest_opt = (!rest.is_empty()).then(|| rest.to_string());

    let command = match word.to_ascii_lowercase().as_str() {
        "help" | "h" | "?" => Command::Help,
        "apis" => Command::Apis,
        "api" => Command::Api(rest_opt),
        "endpoints" | "ls" => Command::Endpoints,
        "endpoint" | "ep" => Command::Endpoint(rest_opt),
        "params" => Command::Params,
        "set" => {
            let (param, value) = split_param(rest, "set <param> [value]")?;
            Command::Set {
                param,
                value: value.to_string(),
            }
        }
        "key" => {
            let (param, key) = split_param(rest, "key <param> up|down|tab|enter")?;
            Command::Key {
                param,
                key: key.parse()?,
            }
        }
        "pick" => {
            let (param, index) = split_param(rest, "pick <param> [index]")?;
            let index = match index {
                "" => None,
                raw => match raw.parse::<usize>() {
                    Ok(n) if n > 0 => Some(n - 1),
                    _ => bail!("Invalid suggestion number '{}'", raw),
                },
            };
            Command::Pick { param, index }
        }
        "token" => Command::Token(rest_opt),
        "syntax" | "lang" => Command::Syntax(rest_opt),
        "url" | "query" => Command::Url,
        "code" | "snippet" => Command::Code,
        "preview" => Command::Preview,
        "fetch" | "send" => Command::Fetch,
        "more" => Command::More,
        "response" => Command::Response,
        "reset" => Command::Reset,
        "clear" => Command::Clear,
        "quit" | "exit" | "q" => Command::Quit,
        other => bail!("Unknown command '{}'. Type 'help'.", other),
    };
    Ok(command)
}

fn split_param<'a>(rest: &'a str, usage: &str) -> Result<(String, &'a str)> {
    if rest.is_empty() {
        bail!("Usage: {}", usage);
    }
    Ok(match rest.split_once(char::is_whitespace) {
        Some((param, tail)) => (param.to_string(), tail.trim()),
        None => (rest.to_string(), ""),
    })
}

// ============== Console ==============

pub struct Console {
    session: Session,
    active: Option<ParameterEditor>,
    fetcher: Arc<dyn HttpFetcher>,
    saver: Box<dyn FileSaver>,
    in_flight: Option<InFlight>,
    interactive: bool,
}

/// A fetch running in the background while the console keeps reading
struct InFlight {
    ticket: FetchTicket,
    handle: JoinHandle<FetchOutcome>,
}

/// What woke the console loop
enum Event {
    Line(Result<Option<String>>),
    Fetched(FetchOutcome),
}

/// Whether the loop continues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

impl Console {
    async fn run(&mut self) -> Result<()> {
        if self.interactive {
            self.print_welcome();
        }

        let mut reader: Option<JoinHandle<Result<Option<String>>>> = None;

        loop {
            let interactive = self.interactive;
            let pending = reader
                .get_or_insert_with(|| tokio::task::spawn_blocking(move || read_line(interactive)));

            // Input stays live while a fetch runs, so edits can outdate it.
            let event = match self.in_flight.as_mut() {
                Some(fetch) => tokio::select! {
                    line = &mut *pending => Event::Line(joined(line)),
                    outcome = &mut fetch.handle => Event::Fetched(fetch_result(outcome)),
                },
                None => Event::Line(joined(pending.await)),
            };

            let line = match event {
                Event::Fetched(outcome) => {
                    if let Err(e) = self.finish_fetch(outcome) {
                        eprintln!("{}: {}", "Error".red().bold(), e);
                    }
                    continue;
                }
                Event::Line(line) => {
                    reader = None;
                    match line? {
                        Some(line) => line,
                        None => break,
                    }
                }
            };

            let result = match parse_command(&line) {
                Ok(command) => self.execute(command).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                // A scripted session stops at the first failing line.
                Err(e) if !self.interactive => return Err(e),
                Err(e) => eprintln!("{}: {}", "Error".red().bold(), e),
            }
        }

        self.settle_fetch().await?;
        self.release_editor();
        Ok(())
    }

    fn print_welcome(&self) {
        println!("{}", "apiscope console".green().bold());
        println!("Type {} for commands, {} to leave.", "help".cyan(), "quit".cyan());
        println!();
        self.print_selection();
    }

    async fn execute(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Empty => {}
            Command::Quit => return Ok(Flow::Quit),
            Command::Help => print_help(),
            Command::Clear => ::console::Term::stdout().clear_screen()?,

            Command::Apis => {
                let current = self.session.selection().api;
                for (i, api) in self.session.catalog().apis.iter().enumerate() {
                    let marker = if i == current { "*" } else { " " };
                    println!("{} {}", marker.green(), api.name);
                }
            }
            Command::Api(name) => {
                let name = match name {
                    Some(name) => name,
                    None => self.choose_api()?,
                };
                self.release_editor();
                self.session.select_api(&name)?;
                self.print_selection();
                self.after_change();
            }
            Command::Endpoints => print_endpoints(self.session.selected_api()),
            Command::Endpoint(name) => {
                let name = match name {
                    Some(name) => name,
                    None => self.choose_endpoint()?,
                };
                self.release_editor();
                self.session.select_endpoint(&name)?;
                self.print_selection();
                self.after_change();
            }
            Command::Params => print_endpoint(self.session.selected_endpoint()),

            Command::Set { param, value } => {
                let mut editor = self.take_editor(&param)?;
                let stored = self.session.edit(&mut editor, &value);
                println!("{} = {}", param.cyan(), stored);
                self.print_suggestions(&editor);
                self.active = Some(editor);
                self.after_change();
            }
            Command::Key { param, key } => {
                let mut editor = self.take_editor(&param)?;
                match self.session.press(&mut editor, key) {
                    KeyOutcome::Ignored => println!("{}", "(no change)".dimmed()),
                    KeyOutcome::Focused(_) => self.print_suggestions(&editor),
                    KeyOutcome::Committed { value, blur } => {
                        println!("{} = {}", param.cyan(), value);
                        if !blur {
                            self.print_suggestions(&editor);
                        }
                        self.after_change();
                    }
                    KeyOutcome::Blur => self.after_change(),
                }
                if editor.is_panel_open() {
                    self.active = Some(editor);
                }
            }
            Command::Pick { param, index } => {
                let mut editor = self.take_editor(&param)?;
                let index = match index {
                    Some(index) => Some(index),
                    None => self.choose_suggestion(&editor)?,
                };
                if let Some(value) = index.and_then(|i| self.session.pick(&mut editor, i)) {
                    println!("{} = {}", param.cyan(), value);
                    self.after_change();
                }
                self.active = Some(editor);
            }

            Command::Token(None) => {
                let token = self.session.token();
                println!("{}", if token.is_empty() { "(not set)" } else { token });
            }
            Command::Token(Some(token)) => {
                self.release_editor();
                self.session.set_token(&token);
                println!("{}", "Token updated".green());
                self.after_change();
            }
            Command::Syntax(None) => {
                for syntax in SnippetSyntax::ALL {
                    let marker = if syntax == self.session.syntax() { "*" } else { " " };
                    println!("{} {:<8} {}", marker.green(), syntax.name(), syntax.label());
                }
            }
            Command::Syntax(Some(name)) => {
                self.session.set_syntax(name.parse()?);
                println!("{}", self.session.snippet());
            }

            Command::Url => println!("{}", self.session.query()),
            Command::Code => println!("{}", self.session.snippet()),
            Command::Preview => {
                let open = self.session.toggle_preview();
                println!("Preview {}", if open { "open".green() } else { "closed".yellow() });
                self.after_change();
            }

            Command::Fetch => self.start_fetch(),
            Command::More => self.reveal_more().await,
            Command::Response => match self.session.response() {
                ResponseState::NotFetched => println!("{}", "Not fetched. Type 'fetch'.".dimmed()),
                ResponseState::Fetching => println!("{}", "Fetching...".dimmed()),
                ResponseState::Error => println!("{}", ERROR_MESSAGE.red()),
                ResponseState::Success { .. } => print_visible(&self.session),
            },
            Command::Reset => {
                self.active = None;
                self.session.reset_values();
                println!("{}", "Parameters restored to defaults".green());
                self.after_change();
            }
        }
        Ok(Flow::Continue)
    }

    /// Spawn the request for the current query; a previous one is dropped
    fn start_fetch(&mut self) {
        self.release_editor();
        let ticket = self.session.begin_fetch();
        println!("{} {}", "GET".green().bold(), ticket.query);
        println!("{}", "Fetching...".dimmed());

        if let Some(previous) = self.in_flight.take() {
            previous.handle.abort();
        }
        let fetcher = Arc::clone(&self.fetcher);
        let request = ticket.clone();
        let handle = tokio::spawn(async move { run_fetch(fetcher.as_ref(), &request).await });
        self.in_flight = Some(InFlight { ticket, handle });
    }

    /// Hand a finished fetch to the session and print what it changed
    fn finish_fetch(&mut self, outcome: FetchOutcome) -> Result<Completion> {
        let Some(fetch) = self.in_flight.take() else {
            return Ok(Completion::Discarded);
        };
        let completion = self.session.complete_fetch(&fetch.ticket, outcome);
        match &completion {
            Completion::Displayed => print_visible(&self.session),
            Completion::Failed => println!("{}", ERROR_MESSAGE.red()),
            Completion::Download(action) => report_download(self.saver.as_ref(), action.clone())?,
            Completion::Discarded => {
                println!("{}", "Discarded response for an outdated query".dimmed())
            }
        }
        Ok(completion)
    }

    /// Wait for the fetch in flight, if any
    async fn settle_fetch(&mut self) -> Result<Option<Completion>> {
        let Some(fetch) = self.in_flight.as_mut() else {
            return Ok(None);
        };
        let outcome = fetch_result((&mut fetch.handle).await);
        self.finish_fetch(outcome).map(Some)
    }

    /// Take the editor for `param` out of the console, blurring any other one
    fn take_editor(&mut self, param: &str) -> Result<ParameterEditor> {
        if let Some(editor) = self.active.take() {
            if editor.name() == param {
                return Ok(editor);
            }
            self.active = Some(editor);
            self.release_editor();
        }
        let mut editor = self.session.editor(param)?;
        editor.focus();
        Ok(editor)
    }

    /// Blur and drop the open editor
    fn release_editor(&mut self) {
        if let Some(mut editor) = self.active.take() {
            self.session.blur(&mut editor);
        }
    }

    /// Scroll to the bottom, wait out the debounce window, then reveal
    async fn reveal_more(&mut self) {
        let before = match self.session.response() {
            ResponseState::Success { revealed, .. } => *revealed,
            _ => {
                println!("{}", "Nothing to reveal.".dimmed());
                return;
            }
        };

        self.session.scroll(0, Instant::now());
        let window = self.session.previewer().settings().debounce;
        tokio::time::sleep(window).await;

        if !self.session.tick(Instant::now()) {
            println!("{}", "End of response.".dimmed());
            return;
        }
        if let Some(visible) = self.session.previewer().visible() {
            let delta: String = visible.chars().skip(before).collect();
            println!("{}", delta);
        }
        if !self.session.previewer().has_more() {
            println!("{}", "End of response.".dimmed());
        }
    }

    fn after_change(&self) {
        if self.session.preview_open() {
            println!("{}", self.session.query().cyan());
            println!("{}", format!("--- {} ---", self.session.syntax()).dimmed());
            println!("{}", self.session.snippet());
        }
    }

    fn print_selection(&self) {
        println!(
            "{} / {}",
            self.session.selected_api().name.cyan(),
            self.session.selected_endpoint().name.bold()
        );
        let params: Vec<String> = self
            .session
            .selected_endpoint()
            .parameters
            .iter()
            .map(|p| param_label(&p.name, p.required))
            .collect();
        println!("{} {}", "Parameters:".dimmed(), params.join(", "));
    }

    fn print_suggestions(&self, editor: &ParameterEditor) {
        if !editor.is_panel_open() || editor.suggestions().is_empty() {
            return;
        }
        for (i, key) in editor.suggestions().iter().enumerate() {
            let line = format!("{:>3}. {}", i + 1, key);
            if i == editor.focus_index() {
                let description = editor.suggestion_description(i).unwrap_or("");
                println!("{}  {}", line.green().bold(), description.dimmed());
            } else {
                println!("{}", line);
            }
        }
    }

    fn choose_api(&self) -> Result<String> {
        if !self.interactive {
            bail!("Usage: api <name>");
        }
        let names: Vec<&str> = self.session.catalog().apis.iter().map(|a| a.name.as_str()).collect();
        let index = Select::new()
            .with_prompt("API")
            .items(&names)
            .default(self.session.selection().api)
            .interact()?;
        Ok(names[index].to_string())
    }

    fn choose_endpoint(&self) -> Result<String> {
        if !self.interactive {
            bail!("Usage: endpoint <name>");
        }
        let names: Vec<&str> = self
            .session
            .selected_api()
            .endpoints
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        let index = Select::new()
            .with_prompt("Endpoint")
            .items(&names)
            .default(self.session.selection().endpoint)
            .interact()?;
        Ok(names[index].to_string())
    }

    fn choose_suggestion(&self, editor: &ParameterEditor) -> Result<Option<usize>> {
        if editor.suggestions().is_empty() {
            println!("{}", "No suggestions.".dimmed());
            return Ok(None);
        }
        if !self.interactive {
            bail!("Usage: pick <param> <number>");
        }
        let items: Vec<String> = editor
            .suggestions()
            .iter()
            .enumerate()
            .map(|(i, key)| {
                format!("{:<20} {}", key, editor.suggestion_description(i).unwrap_or(""))
            })
            .collect();
        Ok(Select::new()
            .with_prompt(editor.name())
            .items(&items)
            .default(editor.focus_index())
            .interact_opt()?)
    }
}

/// Read one console line; `None` once input ends
fn read_line(interactive: bool) -> Result<Option<String>> {
    if interactive {
        let line = Input::<String>::new()
            .with_prompt("apiscope")
            .allow_empty(true)
            .interact_text();
        return Ok(line.ok());
    }
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

fn joined(line: Result<Result<Option<String>>, JoinError>) -> Result<Option<String>> {
    line?
}

fn fetch_result(outcome: Result<FetchOutcome, JoinError>) -> FetchOutcome {
    outcome.unwrap_or_else(|e| FetchOutcome::Failed(e.to_string()))
}

fn print_help() {
    let rows = [
        ("apis", "List APIs"),
        ("api [name]", "Select an API"),
        ("endpoints", "List endpoints of the selected API"),
        ("endpoint [name]", "Select an endpoint"),
        ("params", "Show parameters of the selected endpoint"),
        ("set <param> [value]", "Type a parameter value"),
        ("key <param> <key>", "Press up, down, tab or enter in a parameter"),
        ("pick <param> [n]", "Choose a field suggestion"),
        ("token [value]", "Show or set the API token"),
        ("syntax [name]", "List or switch snippet syntax"),
        ("url", "Print the request URL"),
        ("code", "Print the code snippet"),
        ("preview", "Toggle the live preview"),
        ("fetch", "Execute the request"),
        ("more", "Reveal more of the response"),
        ("response", "Print the response panel"),
        ("reset", "Restore parameter defaults"),
        ("clear", "Clear the screen"),
        ("quit", "Leave the console"),
    ];
    for (command, description) in rows {
        println!("  {:<22} {}", command.cyan(), description);
    }
}
