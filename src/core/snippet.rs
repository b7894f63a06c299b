//! Snippet Generator
//!
//! Renders request code for a URL in one of the supported target syntaxes.
//! The output is literal text; the templates are byte-exact.

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::catalog::HttpMethod;

/// Target syntax of a generated snippet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum SnippetSyntax {
    /// cURL command line
    #[default]
    #[value(name = "curl")]
    #[serde(rename = "curl")]
    Shell,
    /// Node.js with axios
    #[value(name = "node")]
    #[serde(rename = "node")]
    NodeLike,
    /// PHP with the curl extension
    #[value(name = "php")]
    #[serde(rename = "php")]
    PhpLike,
    /// Python with requests
    #[value(name = "python")]
    #[serde(rename = "python")]
    PythonLike,
    /// R with RCurl
    #[value(name = "r")]
    #[serde(rename = "r")]
    RLike,
}

impl SnippetSyntax {
    pub const ALL: [SnippetSyntax; 5] = [
        SnippetSyntax::Shell,
        SnippetSyntax::NodeLike,
        SnippetSyntax::PhpLike,
        SnippetSyntax::PythonLike,
        SnippetSyntax::RLike,
    ];

    /// Label shown on the syntax tabs
    pub fn label(&self) -> &'static str {
        match self {
            SnippetSyntax::Shell => "cURL",
            SnippetSyntax::NodeLike => "NodeJs",
            SnippetSyntax::PhpLike => "PHP",
            SnippetSyntax::PythonLike => "Python",
            SnippetSyntax::RLike => "R",
        }
    }

    /// Short name accepted on the command line
    pub fn name(&self) -> &'static str {
        match self {
            SnippetSyntax::Shell => "curl",
            SnippetSyntax::NodeLike => "node",
            SnippetSyntax::PhpLike => "php",
            SnippetSyntax::PythonLike => "python",
            SnippetSyntax::RLike => "r",
        }
    }

    /// Highlighting language for the snippet
    pub fn language(&self) -> &'static str {
        match self {
            SnippetSyntax::Shell | SnippetSyntax::NodeLike => "javascript",
            SnippetSyntax::PhpLike => "php",
            SnippetSyntax::PythonLike => "python",
            SnippetSyntax::RLike => "r",
        }
    }
}

impl fmt::Display for SnippetSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SnippetSyntax {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        SnippetSyntax::ALL
            .into_iter()
            .find(|syntax| {
                syntax.name().eq_ignore_ascii_case(s) || syntax.label().eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| anyhow!("Unknown syntax '{}'. Use curl, node, php, python or r.", s))
    }
}

/// Render request code for `url`.
pub fn generate_snippet(syntax: SnippetSyntax, url: &str, method: HttpMethod) -> String {
    let verb = method.as_str();
    let lower = verb.to_ascii_lowercase();

    match syntax {
        SnippetSyntax::Shell => format!("curl --location --request {verb} '{url}'"),
        SnippetSyntax::NodeLike => [
            "var axios = require('axios');\n".to_string(),
            "var config = {\n".to_string(),
            format!("\tmethod: '{lower}',\n"),
            format!("\turl: '{url}',\n"),
            "\theaders: { }".to_string(),
            "};\n".to_string(),
            "axios(config)\n".to_string(),
            "\t.then(function (response) {\n".to_string(),
            "\t\tconsole.log(JSON.stringify(response.data));\n".to_string(),
            "\t})\n".to_string(),
            "\t.catch(function (error) {\n".to_string(),
            "\t\tconsole.log(error);\n".to_string(),
            "\t});".to_string(),
        ]
        .concat(),
        SnippetSyntax::PhpLike => [
            "$curl = curl_init();\n".to_string(),
            "curl_setopt_array($curl, array(\n".to_string(),
            format!("\tCURLOPT_URL => '{url}',\n"),
            "\tCURLOPT_RETURNTRANSFER => true,\n".to_string(),
            "\tCURLOPT_ENCODING => '',\n".to_string(),
            "\tCURLOPT_MAXREDIRS => 10,\n".to_string(),
            "\tCURLOPT_TIMEOUT => 0,\n".to_string(),
            "\tCURLOPT_FOLLOWLOCATION => true,\n".to_string(),
            "\tCURLOPT_HTTP_VERSION => CURL_HTTP_VERSION_1_1,\n".to_string(),
            format!("\tCURLOPT_CUSTOMREQUEST => '{verb}',\n"),
            "));\n".to_string(),
            "$response = curl_exec($curl);\n".to_string(),
            "curl_close($curl);\n".to_string(),
            "echo $response;\n".to_string(),
        ]
        .concat(),
        // The URL is interpolated unquoted; existing snapshots depend on it.
        SnippetSyntax::PythonLike => [
            "import requests\n".to_string(),
            format!("url = {url}\n"),
            "payload={}\n".to_string(),
            "headers={}\n".to_string(),
            format!("response = requests.request(\"{verb}\", url, headers=headers, data=payload)\n"),
            "print(response.text)".to_string(),
        ]
        .concat(),
        SnippetSyntax::RLike => [
            "library(RCurl)\n".to_string(),
            format!("res <- getURL(\"{url}\", .opts=list(followlocation = TRUE))\n"),
            "cat(res)".to_string(),
        ]
        .concat(),
    }
}
