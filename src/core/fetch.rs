//! Fetch seam
//!
//! The previewer never talks to the network or the filesystem itself. It
//! goes through two narrow capabilities:
//!
//! ```text
//! ┌──────────────┐   HttpFetcher   ┌───────────────────┐
//! │   Session    │ ──────────────▶ │ ReqwestFetcher    │
//! │ (FetchTicket)│   FileSaver     │ DiskSaver         │
//! └──────────────┘ ──────────────▶ └───────────────────┘
//! ```

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use super::catalog::OutputFormat;
use super::preview::{CsvAction, FetchOutcome, FetchTicket};

/// Any reason a fetch did not produce a usable body
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid request URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("server answered {status}")]
    Status { status: u16 },

    #[error("malformed response body: {0}")]
    Body(String),
}

/// Performs GET requests for the previewer
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Fetch and parse a JSON body
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError>;

    /// Fetch a raw body
    async fn fetch_blob(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Persists downloads for the user
pub trait FileSaver {
    /// Save `bytes` as `filename`; returns where it landed
    fn save(&self, bytes: &[u8], filename: &str) -> Result<PathBuf>;

    /// Hand a URL to the platform so it downloads natively
    fn open_url(&self, url: &str) -> Result<()>;
}

/// Where a CSV download went
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Download {
    Saved(PathBuf),
    Opened(String),
}

/// Run the request a ticket describes
pub async fn run_fetch(fetcher: &dyn HttpFetcher, ticket: &FetchTicket) -> FetchOutcome {
    let result = match ticket.output_format {
        OutputFormat::Json => fetcher.fetch_json(&ticket.query).await.map(FetchOutcome::Json),
        OutputFormat::Csv => fetcher.fetch_blob(&ticket.query).await.map(FetchOutcome::Blob),
    };

    result.unwrap_or_else(|e| {
        debug!(error = %e, "Fetch error");
        FetchOutcome::Failed(e.to_string())
    })
}

/// Carry out a CSV download decided by the previewer
pub fn perform_download(saver: &dyn FileSaver, action: CsvAction) -> Result<Download> {
    match action {
        CsvAction::Save { filename, bytes } => {
            let path = saver.save(&bytes, &filename)?;
            info!(path = %path.display(), size = bytes.len(), "CSV saved");
            Ok(Download::Saved(path))
        }
        CsvAction::OpenUrl(url) => {
            saver.open_url(&url)?;
            info!(url = %url, "CSV too large to buffer, opened source URL");
            Ok(Download::Opened(url))
        }
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::testing::{FakeFetcher, FakeSaver};
    use super::*;
    use crate::core::catalog::Catalog;
    use crate::core::preview::{Completion, ResponseState};
    use crate::core::session::{Session, SessionOptions};

    fn session(api: &str, endpoint: &str) -> Result<Session> {
        Session::new(
            Catalog::bundled()?,
            SessionOptions {
                api: Some(api.to_string()),
                endpoint: Some(endpoint.to_string()),
                token: "T1".to_string(),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_json_fetch_end_to_end() -> Result<()> {
        let mut s = session("Data API (Delayed)", "Tickers")?;
        let mut fetcher = FakeFetcher::default();
        fetcher.json.insert(
            s.query().to_string(),
            json!({"data": [{"ticker": "AAPL", "min": "2007-01-03"}]}),
        );

        let ticket = s.begin_fetch();
        let outcome = run_fetch(&fetcher, &ticket).await;
        assert_eq!(s.complete_fetch(&ticket, outcome), Completion::Displayed);
        assert!(s.previewer().visible().unwrap().contains("\"ticker\": \"AAPL\""));
        Ok(())
    }

    #[tokio::test]
    async fn test_http_failure_becomes_error_state() -> Result<()> {
        let mut s = session("Data API (Delayed)", "Tickers")?;
        let fetcher = FakeFetcher::default();

        let ticket = s.begin_fetch();
        let outcome = run_fetch(&fetcher, &ticket).await;
        assert!(matches!(outcome, FetchOutcome::Failed(_)));
        assert_eq!(s.complete_fetch(&ticket, outcome), Completion::Failed);
        assert_eq!(s.response(), &ResponseState::Error);
        Ok(())
    }

    #[tokio::test]
    async fn test_result_for_changed_query_is_dropped() -> Result<()> {
        let mut s = session("Data API (Delayed)", "Tickers")?;
        let mut fetcher = FakeFetcher::default();
        fetcher.json.insert(s.query().to_string(), json!({"data": []}));

        let ticket = s.begin_fetch();
        s.set_param("ticker", "spy")?;
        let outcome = run_fetch(&fetcher, &ticket).await;

        assert_eq!(s.complete_fetch(&ticket, outcome), Completion::Discarded);
        assert_eq!(s.response(), &ResponseState::NotFetched);
        Ok(())
    }

    #[tokio::test]
    async fn test_csv_threshold_routes_download() -> Result<()> {
        let saver = FakeSaver::default();
        let mut s = session("Intraday Data API (Delayed)", "Strikes Chain")?;
        let mut fetcher = FakeFetcher::default();
        fetcher.blobs.insert(s.query().to_string(), vec![b'x'; 1024]);

        let ticket = s.begin_fetch();
        let outcome = run_fetch(&fetcher, &ticket).await;
        let Completion::Download(action) = s.complete_fetch(&ticket, outcome) else {
            panic!("expected a download");
        };
        assert_eq!(
            perform_download(&saver, action)?,
            Download::Saved(PathBuf::from("/downloads/Strikes Chain.csv"))
        );
        assert!(saver.opened.lock().unwrap().is_empty());

        // Same endpoint, body above 5.8 MB.
        let big_url = s.query().to_string();
        fetcher.blobs.insert(big_url.clone(), vec![b'x'; 6_000_000]);
        let ticket = s.begin_fetch();
        let outcome = run_fetch(&fetcher, &ticket).await;
        let Completion::Download(action) = s.complete_fetch(&ticket, outcome) else {
            panic!("expected a download");
        };
        assert_eq!(perform_download(&saver, action)?, Download::Opened(big_url.clone()));
        assert_eq!(saver.opened.lock().unwrap().as_slice(), [big_url]);
        assert_eq!(saver.saved.lock().unwrap().len(), 1);
        Ok(())
    }
}
