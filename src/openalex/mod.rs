//! OpenAlex lookups mapping PMIDs to Microsoft Academic Graph ids.

pub mod enrich;
pub mod types;

pub use enrich::enrich;

use reqwest::Client;
use tracing::debug;

use crate::config::Config;
use types::Work;

#[derive(Debug, thiserror::Error)]
pub enum OpenAlexError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("cannot read table {path}: {source}")]
    Table {
        path: std::path::PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("table {0} has no pmid column")]
    MissingPmidColumn(std::path::PathBuf),

    #[error("cannot write {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// HTTP client for the OpenAlex works API.
///
/// Requests identify the caller with `User-Agent: mailto:<email>`, which puts
/// them in OpenAlex's polite pool.
#[derive(Clone)]
pub struct OpenAlexClient {
    http: Client,
    base_url: String,
    mailto: String,
}

impl OpenAlexClient {
    pub fn new(http: Client, config: &Config) -> Self {
        Self {
            http,
            base_url: config.openalex_base.trim_end_matches('/').to_string(),
            mailto: format!("mailto:{}", config.email),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            mailto: "mailto:test@example.org".to_string(),
        }
    }

    /// The work indexed under `pmid`, or `None` for any non-200 answer.
    ///
    /// `pmid` must be all ASCII digits; anything else is answered with `None`
    /// without a request.
    pub async fn lookup(&self, pmid: &str) -> Result<Option<Work>, OpenAlexError> {
        if pmid.is_empty() || !pmid.bytes().all(|b| b.is_ascii_digit()) {
            debug!(pmid, "not a numeric pmid, skipping lookup");
            return Ok(None);
        }

        let url = format!("{}/works/pmid:{pmid}", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("User-Agent", &self.mailto)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            debug!(pmid, status = %status, "no OpenAlex work");
            return Ok(None);
        }
        Ok(Some(response.json().await?))
    }
}
