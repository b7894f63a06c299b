//! Query Builder
//!
//! Derives the canonical request URL of an endpoint from its current
//! parameter values. Values are appended as typed; no percent-encoding.

use super::catalog::Endpoint;

/// Build `base_url + path [+ ?name=value&...]`.
///
/// Parameters are visited in declaration order and skipped when their value
/// is empty. Pure: the result depends only on the arguments.
pub fn build_query_string(base_url: &str, endpoint: &Endpoint) -> String {
    let pairs: Vec<String> = endpoint
        .parameters
        .iter()
        .filter(|p| !p.value.is_empty())
        .map(|p| format!("{}={}", p.name, p.value))
        .collect();

    let mut url = format!("{}{}", base_url, endpoint.path);
    if !pairs.is_empty() {
        url.push('?');
        url.push_str(&pairs.join("&"));
    }
    url
}

/// Value of `name` in the query part of `url`.
///
/// The last occurrence wins. A URL without a query part, or without the
/// key, yields `None`.
pub fn query_param<'a>(url: &'a str, name: &str) -> Option<&'a str> {
    let (_, query) = url.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?;
            (key == name).then(|| parts.next().unwrap_or(""))
        })
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{HttpMethod, OutputFormat, Parameter};

    fn param(name: &str, value: &str) -> Parameter {
        Parameter {
            name: name.to_string(),
            required: false,
            placeholder: String::new(),
            description: String::new(),
            default_value: value.to_string(),
            value: value.to_string(),
            definitions_id: None,
        }
    }

    fn strikes(values: &[(&str, &str)]) -> Endpoint {
        Endpoint {
            name: "Strikes".to_string(),
            method: HttpMethod::Get,
            output_format: OutputFormat::Json,
            path: "/datav2/strikes".to_string(),
            docs_url: None,
            parameters: values.iter().map(|(n, v)| param(n, v)).collect(),
        }
    }

    #[test]
    fn test_omits_empty_values_in_declaration_order() {
        let endpoint = strikes(&[
            ("token", "T1"),
            ("ticker", "AAPL"),
            ("fields", ""),
            ("dte", "30,45"),
            ("delta", ""),
        ]);

        assert_eq!(
            build_query_string("", &endpoint),
            "/datav2/strikes?token=T1&ticker=AAPL&dte=30,45"
        );
    }

    #[test]
    fn test_no_question_mark_without_values() {
        let endpoint = strikes(&[("token", ""), ("ticker", "")]);
        assert_eq!(
            build_query_string("https://api.orats.io", &endpoint),
            "https://api.orats.io/datav2/strikes"
        );
    }

    #[test]
    fn test_builder_is_pure() {
        let endpoint = strikes(&[("token", "T1"), ("ticker", "MSFT")]);
        let first = build_query_string("https://api.orats.io", &endpoint);
        let second = build_query_string("https://api.orats.io", &endpoint);
        assert_eq!(first, second);
    }

    #[test]
    fn test_values_are_not_encoded() {
        let endpoint = strikes(&[("delta", ".30,.45"), ("q", "a b&c")]);
        assert_eq!(
            build_query_string("", &endpoint),
            "/datav2/strikes?delta=.30,.45&q=a b&c"
        );
    }

    #[test]
    fn test_query_param_extraction() {
        let url = "https://api.orats.io/datav2/strikes?token=T1&ticker=AAPL";
        assert_eq!(query_param(url, "token"), Some("T1"));
        assert_eq!(query_param(url, "ticker"), Some("AAPL"));
        assert_eq!(query_param(url, "fields"), None);
        assert_eq!(query_param("https://api.orats.io/datav2/strikes", "token"), None);
        assert_eq!(query_param("/x?token", "token"), Some(""));
    }
}
