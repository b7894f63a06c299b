//! Response Previewer
//!
//! State machine for the response panel:
//!
//! ```text
//!   NotFetched ──begin_fetch──▶ Fetching ──complete──▶ Success | Error
//!        ▲                                                 │
//!        └──────────── query string changed ───────────────┘
//! ```
//!
//! A fetch is identified by a [`FetchTicket`] carrying the query it was
//! started for. Results whose ticket no longer matches the current query
//! (or a newer fetch) are dropped without touching the state.

use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, info, warn};

use super::catalog::OutputFormat;

/// Shown instead of a body when a fetch failed
pub const ERROR_MESSAGE: &str = "There was an error processing your request. Please check that all \
required parameters are valid, including your token. Please email support@orats.com for any questions.";

/// Tunables of the previewer
#[derive(Debug, Clone)]
pub struct PreviewSettings {
    /// Characters revealed right after a JSON fetch
    pub initial_reveal: usize,
    /// Characters added per scroll-near-bottom signal
    pub reveal_step: usize,
    /// Quiet period before a scroll signal takes effect
    pub debounce: Duration,
    /// Distance from the bottom that counts as "near"
    pub near_bottom: usize,
    /// CSV bodies above this size are opened by URL instead of saved
    pub csv_threshold_bytes: usize,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            initial_reveal: 1000,
            reveal_step: 400,
            debounce: Duration::from_millis(20),
            near_bottom: 1500,
            csv_threshold_bytes: 5_800_000,
        }
    }
}

/// What the response panel shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseState {
    NotFetched,
    Fetching,
    Error,
    Success { body: String, revealed: usize },
}

/// Identifies one fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub query: String,
    pub output_format: OutputFormat,
    pub endpoint_name: String,
    generation: u64,
}

/// Raw result handed back by the fetcher
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Json(Value),
    Blob(Vec<u8>),
    Failed(String),
}

/// What to do with a CSV body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvAction {
    /// Too large to buffer: let the platform download it from the source
    OpenUrl(String),
    /// Save locally under `filename`
    Save { filename: String, bytes: Vec<u8> },
}

/// Effect of completing a fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The ticket was stale; state untouched
    Discarded,
    /// JSON body stored for display
    Displayed,
    /// The fetch failed; state is `Error`
    Failed,
    /// CSV download to perform; state is back to `NotFetched`
    Download(CsvAction),
}

/// Debounce for scroll-driven reveal growth.
///
/// A signal arms the controller; it fires once no further signal arrived
/// for `window`.
#[derive(Debug, Clone)]
pub struct RevealController {
    window: Duration,
    last_trigger: Option<Instant>,
    pending: bool,
}

impl RevealController {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_trigger: None,
            pending: false,
        }
    }

    pub fn trigger(&mut self, now: Instant) {
        self.last_trigger = Some(now);
        self.pending = true;
    }

    /// True once per armed trigger, when the quiet period has elapsed
    pub fn fire_due(&mut self, now: Instant) -> bool {
        match self.last_trigger {
            Some(last) if self.pending && now.saturating_duration_since(last) >= self.window => {
                self.pending = false;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn cancel(&mut self) {
        self.pending = false;
        self.last_trigger = None;
    }
}

/// Response panel state plus the query it belongs to
#[derive(Debug, Clone)]
pub struct Previewer {
    settings: PreviewSettings,
    state: ResponseState,
    query: String,
    generation: u64,
    reveal: RevealController,
}

impl Previewer {
    pub fn new(settings: PreviewSettings) -> Self {
        let reveal = RevealController::new(settings.debounce);
        Self {
            settings,
            state: ResponseState::NotFetched,
            query: String::new(),
            generation: 0,
            reveal,
        }
    }

    pub fn state(&self) -> &ResponseState {
        &self.state
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn settings(&self) -> &PreviewSettings {
        &self.settings
    }

    /// Track the current query. A change resets the panel.
    pub fn sync_query(&mut self, query: &str) -> bool {
        if self.query == query {
            return false;
        }
        self.query = query.to_string();
        self.reset();
        true
    }

    /// Back to `NotFetched`; any in-flight ticket becomes stale
    pub fn reset(&mut self) {
        if self.state != ResponseState::NotFetched {
            debug!("Response panel reset");
        }
        self.state = ResponseState::NotFetched;
        self.generation += 1;
        self.reveal.cancel();
    }

    /// Explicit user action: start fetching the current query
    pub fn begin_fetch(&mut self, output_format: OutputFormat, endpoint_name: &str) -> FetchTicket {
        self.generation += 1;
        self.state = ResponseState::Fetching;
        self.reveal.cancel();
        info!(query = %self.query, format = %output_format, "Fetch started");

        FetchTicket {
            query: self.query.clone(),
            output_format,
            endpoint_name: endpoint_name.to_string(),
            generation: self.generation,
        }
    }

    fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.generation == self.generation
            && ticket.query == self.query
            && self.state == ResponseState::Fetching
    }

    /// Commit a fetch result if its ticket is still current
    pub fn complete(&mut self, ticket: &FetchTicket, outcome: FetchOutcome) -> Completion {
        if !self.is_current(ticket) {
            debug!(query = %ticket.query, "Discarding stale response");
            return Completion::Discarded;
        }

        match (ticket.output_format, outcome) {
            (OutputFormat::Json, FetchOutcome::Json(value)) => {
                match serde_json::to_string_pretty(&value) {
                    Ok(body) => {
                        let revealed = self.settings.initial_reveal.min(body.chars().count());
                        self.state = ResponseState::Success { body, revealed };
                        Completion::Displayed
                    }
                    Err(e) => self.fail(&e.to_string()),
                }
            }
            (OutputFormat::Csv, FetchOutcome::Blob(bytes)) => {
                let action = if bytes.len() > self.settings.csv_threshold_bytes {
                    CsvAction::OpenUrl(ticket.query.clone())
                } else {
                    CsvAction::Save {
                        filename: format!("{}.csv", ticket.endpoint_name),
                        bytes,
                    }
                };
                self.state = ResponseState::NotFetched;
                Completion::Download(action)
            }
            (_, FetchOutcome::Failed(reason)) => self.fail(&reason),
            (format, _) => self.fail(&format!("unexpected body for {} endpoint", format)),
        }
    }

    fn fail(&mut self, reason: &str) -> Completion {
        warn!(query = %self.query, reason, "Fetch failed");
        self.state = ResponseState::Error;
        Completion::Failed
    }

    /// The revealed prefix of a successful body
    pub fn visible(&self) -> Option<&str> {
        match &self.state {
            ResponseState::Success { body, revealed } => {
                let end = body
                    .char_indices()
                    .nth(*revealed)
                    .map(|(i, _)| i)
                    .unwrap_or(body.len());
                Some(&body[..end])
            }
            _ => None,
        }
    }

    /// True while part of a successful body is still hidden
    pub fn has_more(&self) -> bool {
        match &self.state {
            ResponseState::Success { body, revealed } => *revealed < body.chars().count(),
            _ => false,
        }
    }

    /// Scroll position report; arms the reveal debounce when near the bottom
    pub fn on_scroll(&mut self, distance_from_bottom: usize, now: Instant) {
        if matches!(self.state, ResponseState::Success { .. })
            && distance_from_bottom < self.settings.near_bottom
        {
            self.reveal.trigger(now);
        }
    }

    /// Apply a due reveal step. Returns whether the revealed length grew.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.reveal.fire_due(now) {
            return false;
        }
        let step = self.settings.reveal_step;
        match &mut self.state {
            ResponseState::Success { body, revealed } => {
                let total = body.chars().count();
                let before = *revealed;
                *revealed = (*revealed + step).min(total);
                *revealed > before
            }
            _ => false,
        }
    }

    pub fn reveal_pending(&self) -> bool {
        self.reveal.is_pending()
    }
}

impl Default for Previewer {
    fn default() -> Self {
        Self::new(PreviewSettings::default())
    }
}
