//! Session - selection state and the derivation pipeline
//!
//! One explicit state container replaces the ambient globals of a UI:
//! the catalog (with its mutable parameter values), which API/endpoint is
//! selected, the API token, the snippet syntax and the response panel.
//!
//! Every action ends in [`Session::rederive`]:
//!
//! ```text
//! catalog + selection ──build_query_string──▶ query
//!                      query + syntax ──generate_snippet──▶ snippet
//!                      query changed ──▶ previewer reset
//! ```

use std::time::Instant;

use anyhow::{anyhow, Result};
use tracing::{debug, info};

use super::catalog::{Api, Catalog, Endpoint};
use super::editor::{KeyOutcome, Key, ParameterEditor};
use super::preview::{Completion, FetchOutcome, FetchTicket, PreviewSettings, Previewer, ResponseState};
use super::query::{build_query_string, query_param};
use super::snippet::{generate_snippet, SnippetSyntax};

/// Which API and endpoint are shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub api: usize,
    pub endpoint: usize,
}

/// Values derived from the session state; never edited directly
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Derived {
    pub query: String,
    pub snippet: String,
}

/// Options for opening a session
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub api: Option<String>,
    pub endpoint: Option<String>,
    pub token: String,
    pub syntax: SnippetSyntax,
    pub preview: PreviewSettings,
}

/// Application state of the console
#[derive(Debug, Clone)]
pub struct Session {
    catalog: Catalog,
    selection: Selection,
    preview_open: bool,
    api_token: String,
    syntax: SnippetSyntax,
    previewer: Previewer,
    derived: Derived,
}

impl Session {
    pub fn new(catalog: Catalog, options: SessionOptions) -> Result<Self> {
        // Start on the second API when there is one, like the web console.
        let api = match &options.api {
            Some(name) => catalog
                .api_index(name)
                .ok_or_else(|| unknown_api(&catalog, name))?,
            None => usize::from(catalog.apis.len() > 1),
        };
        let endpoint = match &options.endpoint {
            Some(name) => catalog
                .endpoint_index(api, name)
                .ok_or_else(|| unknown_endpoint(&catalog.apis[api], name))?,
            None => 0,
        };

        let mut session = Self {
            catalog,
            selection: Selection { api, endpoint },
            preview_open: false,
            api_token: String::new(),
            syntax: options.syntax,
            previewer: Previewer::new(options.preview),
            derived: Derived::default(),
        };
        session.set_token(&options.token);
        Ok(session)
    }

    // ============== Accessors ==============

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn selected_api(&self) -> &Api {
        &self.catalog.apis[self.selection.api]
    }

    pub fn selected_endpoint(&self) -> &Endpoint {
        &self.selected_api().endpoints[self.selection.endpoint]
    }

    pub fn query(&self) -> &str {
        &self.derived.query
    }

    pub fn snippet(&self) -> &str {
        &self.derived.snippet
    }

    pub fn syntax(&self) -> SnippetSyntax {
        self.syntax
    }

    pub fn token(&self) -> &str {
        &self.api_token
    }

    pub fn preview_open(&self) -> bool {
        self.preview_open
    }

    pub fn previewer(&self) -> &Previewer {
        &self.previewer
    }

    pub fn response(&self) -> &ResponseState {
        self.previewer.state()
    }

    // ============== Selection ==============

    /// Select an API. The current endpoint is kept when the new API has an
    /// endpoint with the same path, otherwise the first endpoint is used.
    pub fn select_api(&mut self, name: &str) -> Result<()> {
        let api = self
            .catalog
            .api_index(name)
            .ok_or_else(|| unknown_api(&self.catalog, name))?;

        let current_path = self.selected_endpoint().path.clone();
        let endpoint = self.catalog.apis[api]
            .endpoints
            .iter()
            .position(|e| e.path == current_path)
            .unwrap_or(0);

        self.selection = Selection { api, endpoint };
        info!(api = %self.selected_api().name, endpoint = %self.selected_endpoint().name, "API selected");
        self.rederive();
        Ok(())
    }

    pub fn select_endpoint(&mut self, name: &str) -> Result<()> {
        let endpoint = self
            .catalog
            .endpoint_index(self.selection.api, name)
            .ok_or_else(|| unknown_endpoint(self.selected_api(), name))?;

        self.selection.endpoint = endpoint;
        info!(endpoint = %self.selected_endpoint().name, "Endpoint selected");
        self.rederive();
        Ok(())
    }

    pub fn toggle_preview(&mut self) -> bool {
        self.preview_open = !self.preview_open;
        self.preview_open
    }

    // ============== Parameters ==============

    /// Open an editor on a parameter of the selected endpoint
    pub fn editor(&self, name: &str) -> Result<ParameterEditor> {
        let endpoint = self.selected_endpoint();
        let param = endpoint.parameter(name).ok_or_else(|| {
            anyhow!(
                "Endpoint '{}' has no parameter '{}'. Valid: {}",
                endpoint.name,
                name,
                endpoint.parameter_names().join(", ")
            )
        })?;

        let definitions = param
            .definitions_id
            .as_deref()
            .and_then(|id| self.catalog.definitions(id));
        Ok(ParameterEditor::new(param, definitions))
    }

    /// Write an editor's value into the catalog and rederive
    pub fn commit_edit(&mut self, parameter: &str, value: &str) {
        let api = self.selected_api().name.clone();
        let endpoint = self.selected_endpoint().name.clone();
        if self.catalog.set_value(&api, &endpoint, parameter, value) {
            debug!(parameter, value, "Parameter updated");
        }
        self.rederive();
    }

    /// Type a new value into a parameter
    pub fn set_param(&mut self, name: &str, value: &str) -> Result<String> {
        let mut editor = self.editor(name)?;
        let stored = editor.on_value_change(value);
        self.commit_edit(name, &stored);
        Ok(stored)
    }

    /// Type into an open editor
    pub fn edit(&mut self, editor: &mut ParameterEditor, value: &str) -> String {
        let stored = editor.on_value_change(value);
        self.commit_edit(editor.name(), &stored);
        stored
    }

    /// Forward a key press to an open editor
    pub fn press(&mut self, editor: &mut ParameterEditor, key: Key) -> KeyOutcome {
        let outcome = editor.on_key(key);
        match &outcome {
            KeyOutcome::Committed { value, blur } => {
                self.commit_edit(editor.name(), value);
                if *blur {
                    self.blur(editor);
                }
            }
            KeyOutcome::Blur => self.blur(editor),
            KeyOutcome::Ignored | KeyOutcome::Focused(_) => {}
        }
        outcome
    }

    /// Commit the suggestion at `index` of an open editor
    pub fn pick(&mut self, editor: &mut ParameterEditor, index: usize) -> Option<String> {
        let value = editor.pick(index)?;
        self.commit_edit(editor.name(), &value);
        Some(value)
    }

    /// An editor lost focus: force-commit its text
    pub fn blur(&mut self, editor: &mut ParameterEditor) {
        let value = editor.blur();
        self.commit_edit(editor.name(), &value);
    }

    /// Change the global API token; mirroring `token` parameters follow it
    pub fn set_token(&mut self, token: &str) {
        self.api_token = token.to_string();
        for param in self.catalog.parameters_mut() {
            if let Some(value) = ParameterEditor::new(param, None).mirror_token(token) {
                param.value = value;
            }
        }
        self.rederive();
    }

    /// Restore every parameter to its default (token mirroring reapplied)
    pub fn reset_values(&mut self) {
        self.catalog.reset_values();
        let token = self.api_token.clone();
        self.set_token(&token);
    }

    pub fn set_syntax(&mut self, syntax: SnippetSyntax) {
        self.syntax = syntax;
        self.rederive();
    }

    // ============== Response ==============

    /// Explicit fetch action for the current query
    pub fn begin_fetch(&mut self) -> FetchTicket {
        if query_param(&self.derived.query, "token").unwrap_or("").is_empty() {
            debug!("No token in query string");
        }
        let endpoint = self.selected_endpoint();
        let (format, name) = (endpoint.output_format, endpoint.name.clone());
        self.previewer.begin_fetch(format, &name)
    }

    pub fn complete_fetch(&mut self, ticket: &FetchTicket, outcome: FetchOutcome) -> Completion {
        self.previewer.complete(ticket, outcome)
    }

    pub fn reset_response(&mut self) {
        self.previewer.reset();
    }

    /// Report the response panel's distance from its bottom
    pub fn scroll(&mut self, distance_from_bottom: usize, now: Instant) {
        self.previewer.on_scroll(distance_from_bottom, now);
    }

    /// Apply a due reveal step
    pub fn tick(&mut self, now: Instant) -> bool {
        self.previewer.tick(now)
    }

    // ============== Pipeline ==============

    /// Recompute query and snippet from scratch
    pub fn rederive(&mut self) {
        let endpoint = self.selected_endpoint();
        let query = build_query_string(&self.catalog.base_url, endpoint);
        let snippet = generate_snippet(self.syntax, &query, endpoint.method);

        if self.previewer.sync_query(&query) {
            debug!(query = %query, "Query changed");
        }
        self.derived = Derived { query, snippet };
    }
}

fn unknown_api(catalog: &Catalog, name: &str) -> anyhow::Error {
    let names: Vec<&str> = catalog.apis.iter().map(|a| a.name.as_str()).collect();
    anyhow!("Unknown API '{}'. Available: {}", name, names.join(", "))
}

fn unknown_endpoint(api: &Api, name: &str) -> anyhow::Error {
    let names: Vec<&str> = api.endpoints.iter().map(|e| e.name.as_str()).collect();
    anyhow!(
        "API '{}' has no endpoint '{}'. Available: {}",
        api.name,
        name,
        names.join(", ")
    )
}
