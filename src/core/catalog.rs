//! Catalog - APIs, endpoints and parameter descriptors
//!
//! The catalog is a read-only JSON document describing every API the console
//! can explore. The only mutable projection is the current `value` of each
//! parameter, written through [`Catalog::set_value`].
//!
//! # Document shape
//! ```text
//! {
//!   "base_url": "https://api.orats.io",
//!   "apis": [ { "name", "endpoints": [ { "name", "method", "output_format",
//!              "path", "docs_url"?, "parameters": [ { "name", "required",
//!              "placeholder", "description", "value", "definitions_id"? } ] } ] } ],
//!   "definitions": { "<id>": [ { "key", "description" } ] }
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Catalog bundled into the binary (ORATS data APIs).
const BUNDLED_CATALOG: &str = include_str!("../../catalog/orats.json");

/// Errors raised while loading or validating a catalog document
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalog document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("catalog declares no APIs")]
    Empty,

    #[error("API '{0}' declares no endpoints")]
    NoEndpoints(String),

    #[error("API name '{0}' is declared more than once")]
    DuplicateApi(String),

    #[error("endpoint '{endpoint}' declares parameter '{parameter}' more than once")]
    DuplicateParameter { endpoint: String, parameter: String },

    #[error("parameter '{parameter}' of endpoint '{endpoint}' references unknown definitions table '{id}'")]
    UnknownDefinitions {
        endpoint: String,
        parameter: String,
        id: String,
    },
}

/// HTTP method of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an endpoint returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// One request input: schema plus its current editable value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub description: String,

    /// Default value as declared in the document
    #[serde(rename = "value", default)]
    pub default_value: String,

    /// Current value; empty means "omit from the query string"
    #[serde(skip)]
    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definitions_id: Option<String>,
}

/// One callable API route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    #[serde(default)]
    pub method: HttpMethod,
    pub output_format: OutputFormat,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl Endpoint {
    /// Find a parameter by name
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Names of all declared parameters, in declaration order
    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }
}

/// A named group of endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Api {
    pub name: String,
    pub endpoints: Vec<Endpoint>,
}

/// Entry of a field definitions table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub key: String,
    pub description: String,
}

/// The whole catalog document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub base_url: String,
    pub apis: Vec<Api>,
    #[serde(default)]
    pub definitions: HashMap<String, Vec<FieldDefinition>>,
}

impl Catalog {
    /// The ORATS catalog shipped with the binary
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json(BUNDLED_CATALOG)
    }

    /// Load a catalog document from disk
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate a catalog document
    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        let mut catalog: Catalog = serde_json::from_str(content)?;
        catalog.validate()?;
        catalog.reset_values();
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.apis.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut api_names = HashSet::new();
        for api in &self.apis {
            if !api_names.insert(api.name.as_str()) {
                return Err(CatalogError::DuplicateApi(api.name.clone()));
            }
            if api.endpoints.is_empty() {
                return Err(CatalogError::NoEndpoints(api.name.clone()));
            }

            for endpoint in &api.endpoints {
                let mut names = HashSet::new();
                for param in &endpoint.parameters {
                    if !names.insert(param.name.as_str()) {
                        return Err(CatalogError::DuplicateParameter {
                            endpoint: endpoint.name.clone(),
                            parameter: param.name.clone(),
                        });
                    }
                    if let Some(id) = &param.definitions_id {
                        if !self.definitions.contains_key(id) {
                            return Err(CatalogError::UnknownDefinitions {
                                endpoint: endpoint.name.clone(),
                                parameter: param.name.clone(),
                                id: id.clone(),
                            });
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Restore every parameter to its document default
    pub fn reset_values(&mut self) {
        for param in self.parameters_mut() {
            param.value = param.default_value.clone();
        }
    }

    /// Index of an API by name (exact match first, then case-insensitive)
    pub fn api_index(&self, name: &str) -> Option<usize> {
        self.apis
            .iter()
            .position(|a| a.name == name)
            .or_else(|| self.apis.iter().position(|a| a.name.eq_ignore_ascii_case(name)))
    }

    pub fn api(&self, name: &str) -> Option<&Api> {
        self.api_index(name).map(|i| &self.apis[i])
    }

    /// Index of an endpoint within an API (exact match first, then case-insensitive)
    pub fn endpoint_index(&self, api: usize, name: &str) -> Option<usize> {
        let endpoints = &self.apis.get(api)?.endpoints;
        endpoints
            .iter()
            .position(|e| e.name == name)
            .or_else(|| endpoints.iter().position(|e| e.name.eq_ignore_ascii_case(name)))
    }

    /// Field definitions table by id
    pub fn definitions(&self, id: &str) -> Option<&[FieldDefinition]> {
        self.definitions.get(id).map(|t| t.as_slice())
    }

    /// Write the current value of one parameter.
    ///
    /// Walks API name → endpoint name → parameter name and stops at the first
    /// match of each. Returns `false` if nothing matched.
    pub fn set_value(&mut self, api: &str, endpoint: &str, parameter: &str, value: &str) -> bool {
        let Some(param) = self
            .apis
            .iter_mut()
            .find(|a| a.name == api)
            .and_then(|a| a.endpoints.iter_mut().find(|e| e.name == endpoint))
            .and_then(|e| e.parameters.iter_mut().find(|p| p.name == parameter))
        else {
            return false;
        };

        param.value = value.to_string();
        true
    }

    /// Mutable access to every parameter in the catalog
    pub fn parameters_mut(&mut self) -> impl Iterator<Item = &mut Parameter> {
        self.apis
            .iter_mut()
            .flat_map(|a| a.endpoints.iter_mut())
            .flat_map(|e| e.parameters.iter_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"{
        "base_url": "https://api.example.com",
        "apis": [
            { "name": "Data", "endpoints": [
                { "name": "Strikes", "method": "GET", "output_format": "json",
                  "path": "/datav2/strikes",
                  "parameters": [
                    { "name": "token", "required": true, "placeholder": "token",
                      "description": "Your API token", "value": "token" },
                    { "name": "fields", "placeholder": "ticker,tradeDate",
                      "description": "The fields to retrieve", "value": "",
                      "definitions_id": "strikes" }
                  ] }
            ] }
        ],
        "definitions": { "strikes": [ { "key": "ticker", "description": "underlying symbol" } ] }
    }"#;

    #[test]
    fn test_bundled_catalog_is_valid() -> anyhow::Result<()> {
        let catalog = Catalog::bundled()?;
        assert_eq!(catalog.apis.len(), 4);
        assert_eq!(catalog.base_url, "https://api.orats.io");

        let live = catalog.api("Intraday Data API (Live)").expect("api");
        assert_eq!(live.endpoints[0].name, "Strikes Chain");
        assert_eq!(live.endpoints[0].output_format, OutputFormat::Csv);
        Ok(())
    }

    #[test]
    fn test_values_start_at_defaults() -> anyhow::Result<()> {
        let catalog = Catalog::from_json(SMALL)?;
        let endpoint = &catalog.apis[0].endpoints[0];
        assert_eq!(endpoint.parameter("token").unwrap().value, "token");
        assert_eq!(endpoint.parameter("fields").unwrap().value, "");
        Ok(())
    }

    #[test]
    fn test_set_value_and_reset() -> anyhow::Result<()> {
        let mut catalog = Catalog::from_json(SMALL)?;
        assert!(catalog.set_value("Data", "Strikes", "fields", "ticker"));
        assert!(!catalog.set_value("Data", "Strikes", "missing", "x"));
        assert_eq!(
            catalog.apis[0].endpoints[0].parameter("fields").unwrap().value,
            "ticker"
        );

        catalog.reset_values();
        assert_eq!(catalog.apis[0].endpoints[0].parameter("fields").unwrap().value, "");
        Ok(())
    }

    #[test]
    fn test_lookup_is_case_insensitive_fallback() -> anyhow::Result<()> {
        let catalog = Catalog::from_json(SMALL)?;
        assert_eq!(catalog.api_index("data"), Some(0));
        assert_eq!(catalog.endpoint_index(0, "STRIKES"), Some(0));
        assert_eq!(catalog.endpoint_index(0, "nope"), None);
        Ok(())
    }

    #[test]
    fn test_rejects_unknown_definitions() {
        let doc = SMALL.replace("\"definitions_id\": \"strikes\"", "\"definitions_id\": \"cores\"");
        let err = Catalog::from_json(&doc).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownDefinitions { .. }));
    }

    #[test]
    fn test_rejects_duplicate_parameter() {
        let doc = SMALL.replace("{ \"name\": \"fields\"", "{ \"name\": \"token\"");
        let err = Catalog::from_json(&doc).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateParameter { .. }));
    }

    #[test]
    fn test_rejects_empty_catalog() {
        let err = Catalog::from_json(r#"{ "base_url": "x", "apis": [] }"#).unwrap_err();
        assert!(matches!(err, CatalogError::Empty));
    }
}
