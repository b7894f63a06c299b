//! apiscope - request builder and live preview for the ORATS data API
//!
//! Browse a catalog of endpoints, fill in parameters, and get the request
//! URL plus equivalent code in several languages. Requests can be executed
//! to preview JSON responses or download CSV.
//!
//! # Architecture
//!
//! - **core**: catalog model, query builder, snippet generator, parameter
//!   editor, response previewer and the [`Session`] that ties them together
//! - **remote**: reqwest-backed fetcher and download saver
//! - **config**: layered TOML configuration
//! - **cli**: commands and the interactive console
//!
//! ```no_run
//! use apiscope::{Catalog, Session, SessionOptions, SnippetSyntax};
//!
//! let mut session = Session::new(Catalog::bundled()?, SessionOptions::default())?;
//! session.select_api("Data API (Delayed)")?;
//! session.select_endpoint("Strikes")?;
//! session.set_param("ticker", "msft")?;
//! session.set_syntax(SnippetSyntax::PythonLike);
//! println!("{}\n{}", session.query(), session.snippet());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod remote;

pub use core::catalog::{Api, Catalog, CatalogError, Endpoint, Parameter};
pub use core::editor::{Key, KeyOutcome, ParameterEditor};
pub use core::fetch::{FetchError, FileSaver, HttpFetcher};
pub use core::preview::{Previewer, ResponseState};
pub use core::query::build_query_string;
pub use core::session::{Session, SessionOptions};
pub use core::snippet::{generate_snippet, SnippetSyntax};
pub use remote::{DiskSaver, ReqwestFetcher};
