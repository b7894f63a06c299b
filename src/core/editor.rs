//! Parameter Editor
//!
//! Owns the text of one parameter while it is being edited. Every value it
//! produces is meant to be written straight back into the catalog by the
//! caller (see `Session::commit_edit`); nothing here is debounced.
//!
//! Special parameters:
//! - `ticker`: always uppercased
//! - `token`: mirrors the global API token when its default is `"token"`
//! - `fields`: comma-delimited, with a suggestion panel driven by the keyboard

use std::str::FromStr;

use anyhow::bail;

use super::catalog::{FieldDefinition, Parameter};
use super::suggest::{current_term, replace_last_segment, suggest};

pub const TICKER: &str = "ticker";
pub const TOKEN: &str = "token";
pub const FIELDS: &str = "fields";

/// Keys the editor reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    Enter,
    Tab,
    /// Anything else; never changes editor state
    Other,
}

impl FromStr for Key {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" | "arrowup" => Ok(Key::ArrowUp),
            "down" | "arrowdown" => Ok(Key::ArrowDown),
            "enter" => Ok(Key::Enter),
            "tab" => Ok(Key::Tab),
            "" => bail!("Missing key. Use up, down, tab or enter."),
            _ => Ok(Key::Other),
        }
    }
}

/// Result of a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Nothing changed
    Ignored,
    /// Focus moved over the suggestion list
    Focused(usize),
    /// A suggestion replaced the last segment; `blur` is set for Enter
    Committed { value: String, blur: bool },
    /// The input should lose focus
    Blur,
}

/// Editing state of one parameter
#[derive(Debug, Clone)]
pub struct ParameterEditor {
    name: String,
    default_value: String,
    input: String,
    definitions: Option<Vec<FieldDefinition>>,
    suggestions: Vec<String>,
    focus_index: usize,
    show_suggestions: bool,
}

impl ParameterEditor {
    /// Start editing `param`. `definitions` is the table named by its
    /// `definitions_id`, if any.
    pub fn new(param: &Parameter, definitions: Option<&[FieldDefinition]>) -> Self {
        let mut editor = Self {
            name: param.name.clone(),
            default_value: param.default_value.clone(),
            input: param.value.clone(),
            definitions: definitions.map(|d| d.to_vec()),
            suggestions: Vec::new(),
            focus_index: 0,
            show_suggestions: false,
        };
        editor.refresh_suggestions();
        editor
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn focus_index(&self) -> usize {
        self.focus_index
    }

    pub fn is_panel_open(&self) -> bool {
        self.show_suggestions
    }

    fn is_fields(&self) -> bool {
        self.name == FIELDS && self.definitions.is_some()
    }

    /// Input gained focus
    pub fn focus(&mut self) {
        if self.is_fields() {
            self.focus_index = 0;
            self.show_suggestions = true;
        }
    }

    /// Apply a new input text. Returns the value to store.
    pub fn on_value_change(&mut self, value: &str) -> String {
        self.input = if self.name == TICKER {
            value.to_uppercase()
        } else {
            value.to_string()
        };

        if self.is_fields() {
            self.refresh_suggestions();
        }
        self.input.clone()
    }

    fn refresh_suggestions(&mut self) {
        let Some(table) = &self.definitions else {
            return;
        };
        self.suggestions = suggest(table, current_term(&self.input));
        self.focus_index = self.focus_index.min(self.suggestions.len().saturating_sub(1));
    }

    /// Handle a key press
    pub fn on_key(&mut self, key: Key) -> KeyOutcome {
        if !self.is_fields() {
            return match key {
                Key::Enter => KeyOutcome::Blur,
                _ => KeyOutcome::Ignored,
            };
        }

        match key {
            Key::ArrowDown => {
                if self.focus_index + 1 < self.suggestions.len() {
                    self.focus_index += 1;
                }
                KeyOutcome::Focused(self.focus_index)
            }
            Key::ArrowUp => {
                self.focus_index = self.focus_index.saturating_sub(1);
                KeyOutcome::Focused(self.focus_index)
            }
            Key::Enter | Key::Tab => {
                let Some(choice) = self.suggestions.get(self.focus_index).cloned() else {
                    return KeyOutcome::Ignored;
                };

                let mut joined = replace_last_segment(&self.input, &choice);
                let blur = key == Key::Enter;
                if blur {
                    self.show_suggestions = false;
                } else {
                    joined.push(',');
                }
                self.focus_index = 0;
                let value = self.on_value_change(&joined);
                KeyOutcome::Committed { value, blur }
            }
            Key::Other => KeyOutcome::Ignored,
        }
    }

    /// Commit the suggestion at `index` (pointer selection)
    pub fn pick(&mut self, index: usize) -> Option<String> {
        let choice = self.suggestions.get(index)?.clone();
        let joined = replace_last_segment(&self.input, &choice);
        self.focus_index = 0;
        Some(self.on_value_change(&joined))
    }

    /// Input lost focus: close the panel and return the text to commit
    pub fn blur(&mut self) -> String {
        self.show_suggestions = false;
        self.input.clone()
    }

    /// Follow the global API token. Only a `token` parameter whose document
    /// default is the literal `"token"` mirrors it.
    pub fn mirror_token(&mut self, token: &str) -> Option<String> {
        if self.name == TOKEN && self.default_value == TOKEN {
            Some(self.on_value_change(token))
        } else {
            None
        }
    }

    /// Description of a suggested key
    pub fn suggestion_description(&self, index: usize) -> Option<&str> {
        let key = self.suggestions.get(index)?;
        self.definitions
            .as_ref()?
            .iter()
            .find(|def| &def.key == key)
            .map(|def| def.description.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, value: &str) -> Parameter {
        Parameter {
            name: name.to_string(),
            required: false,
            placeholder: String::new(),
            description: String::new(),
            default_value: value.to_string(),
            value: value.to_string(),
            definitions_id: (name == FIELDS).then(|| "strikes".to_string()),
        }
    }

    fn defs() -> Vec<FieldDefinition> {
        [
            ("ticker", "underlying symbol"),
            ("tradeDate", "trade date"),
            ("expirDate", "expiration date"),
            ("strike", "option strike"),
        ]
        .iter()
        .map(|(k, d)| FieldDefinition {
            key: k.to_string(),
            description: d.to_string(),
        })
        .collect()
    }

    fn fields_editor(value: &str) -> ParameterEditor {
        let table = defs();
        ParameterEditor::new(&param(FIELDS, value), Some(&table))
    }

    #[test]
    fn test_ticker_is_uppercased() {
        let mut editor = ParameterEditor::new(&param(TICKER, "AAPL"), None);
        assert_eq!(editor.on_value_change("aapl"), "AAPL");
        assert_eq!(editor.input(), "AAPL");
    }

    #[test]
    fn test_other_params_are_stored_as_typed() {
        let mut editor = ParameterEditor::new(&param("dte", ""), None);
        assert_eq!(editor.on_value_change("30,45"), "30,45");
    }

    #[test]
    fn test_initial_suggestions_cover_whole_table() {
        let editor = fields_editor("");
        assert_eq!(editor.suggestions().len(), 4);
        assert!(!editor.is_panel_open());
    }

    #[test]
    fn test_suggestions_follow_last_segment() {
        let mut editor = fields_editor("");
        editor.on_value_change("ticker,Date");
        assert_eq!(editor.suggestions(), ["tradeDate", "expirDate"]);

        editor.on_value_change("ticker,option");
        assert_eq!(editor.suggestions(), ["strike"]);
    }

    #[test]
    fn test_arrow_keys_clamp() {
        let mut editor = fields_editor("");
        editor.focus();
        assert_eq!(editor.on_key(Key::ArrowUp), KeyOutcome::Focused(0));
        for _ in 0..10 {
            editor.on_key(Key::ArrowDown);
        }
        assert_eq!(editor.focus_index(), 3);
        assert_eq!(editor.on_key(Key::ArrowUp), KeyOutcome::Focused(2));
    }

    #[test]
    fn test_tab_commits_and_starts_new_segment() {
        let mut editor = fields_editor("");
        editor.focus();
        editor.on_value_change("ticker,tra");
        let outcome = editor.on_key(Key::Tab);

        assert_eq!(
            outcome,
            KeyOutcome::Committed {
                value: "ticker,tradeDate,".to_string(),
                blur: false
            }
        );
        assert!(editor.is_panel_open());
        assert_eq!(editor.focus_index(), 0);
        assert_eq!(editor.suggestions().len(), 4);
    }

    #[test]
    fn test_enter_commits_and_closes_panel() {
        let mut editor = fields_editor("");
        editor.focus();
        editor.on_value_change("exp");
        editor.on_key(Key::ArrowDown);
        let outcome = editor.on_key(Key::Enter);

        assert_eq!(
            outcome,
            KeyOutcome::Committed {
                value: "expirDate".to_string(),
                blur: true
            }
        );
        assert!(!editor.is_panel_open());
        assert_eq!(editor.focus_index(), 0);
    }

    #[test]
    fn test_enter_without_suggestions_is_ignored() {
        let mut editor = fields_editor("");
        editor.on_value_change("zzz");
        assert_eq!(editor.on_key(Key::Enter), KeyOutcome::Ignored);
        assert_eq!(editor.input(), "zzz");
    }

    #[test]
    fn test_enter_blurs_plain_parameter() {
        let mut editor = ParameterEditor::new(&param("dte", ""), None);
        assert_eq!(editor.on_key(Key::Enter), KeyOutcome::Blur);
        assert_eq!(editor.on_key(Key::Tab), KeyOutcome::Ignored);
        assert_eq!(editor.on_key(Key::ArrowDown), KeyOutcome::Ignored);
    }

    #[test]
    fn test_focus_clamps_when_list_shrinks() {
        let mut editor = fields_editor("");
        editor.focus();
        editor.on_key(Key::ArrowDown);
        editor.on_key(Key::ArrowDown);
        editor.on_value_change("strike");
        assert_eq!(editor.focus_index(), 0);
    }

    #[test]
    fn test_blur_closes_panel_and_returns_input() {
        let mut editor = fields_editor("");
        editor.focus();
        editor.on_value_change("ticker,str");
        assert_eq!(editor.blur(), "ticker,str");
        assert!(!editor.is_panel_open());
    }

    #[test]
    fn test_pick_replaces_segment_without_comma() {
        let mut editor = fields_editor("");
        editor.on_value_change("ticker,st");
        assert_eq!(editor.pick(0).as_deref(), Some("ticker,strike"));
        assert_eq!(editor.pick(99), None);
    }

    #[test]
    fn test_token_mirroring_requires_token_default() {
        let mut mirrored = ParameterEditor::new(&param(TOKEN, "token"), None);
        assert_eq!(mirrored.mirror_token("abc").as_deref(), Some("abc"));

        let mut fixed = ParameterEditor::new(&param(TOKEN, "demo"), None);
        assert_eq!(fixed.mirror_token("abc"), None);
        assert_eq!(fixed.input(), "demo");
    }

    #[test]
    fn test_suggestion_description() {
        let editor = fields_editor("");
        assert_eq!(editor.suggestion_description(1), Some("trade date"));
        assert_eq!(editor.suggestion_description(9), None);
    }

    #[test]
    fn test_key_parse() -> anyhow::Result<()> {
        assert_eq!("down".parse::<Key>()?, Key::ArrowDown);
        assert_eq!("Tab".parse::<Key>()?, Key::Tab);
        assert_eq!("esc".parse::<Key>()?, Key::Other);
        assert!("".parse::<Key>().is_err());
        Ok(())
    }

    #[test]
    fn test_other_keys_leave_state_alone() {
        let mut editor = fields_editor("tick");
        editor.focus();
        editor.on_key(Key::ArrowDown);
        let focus = editor.focus_index();

        assert_eq!(editor.on_key(Key::Other), KeyOutcome::Ignored);
        assert_eq!(editor.focus_index(), focus);
        assert_eq!(editor.input(), "tick");
        assert!(editor.is_panel_open());
    }
}
